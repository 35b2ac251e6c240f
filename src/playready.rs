//! PlayReady key-message envelope parsing.
//!
//! Legacy PlayReady key messages are UTF-16LE XML documents wrapping the
//! SOAP challenge (base64) and the HTTP headers the license server expects:
//!
//! ```xml
//! <PlayReadyKeyMessage type="LicenseAcquisition">
//!   <LicenseAcquisition Version="1">
//!     <Challenge encoding="base64encoded">...</Challenge>
//!     <HttpHeaders>
//!       <HttpHeader><name>Content-Type</name><value>text/xml; charset=utf-8</value></HttpHeader>
//!     </HttpHeaders>
//!   </LicenseAcquisition>
//! </PlayReadyKeyMessage>
//! ```
//!
//! Parsing never fails: headers and challenge are extracted independently
//! and whatever cannot be read is left empty.
use base64::Engine;
use indexmap::IndexMap;

use crate::codec::utf16le_to_string;

/// Contents of a PlayReady key message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayReadyChallenge {
    /// Headers to send with the license request, in document order.
    pub headers: IndexMap<String, String>,
    /// Decoded challenge body (empty when absent or malformed).
    pub challenge: Vec<u8>,
}

/// Parse a UTF-16LE key message.
#[must_use]
pub fn parse_key_message(message: &[u8]) -> PlayReadyChallenge {
    let xml = utf16le_to_string(message);
    parse_key_message_xml(xml.trim_start_matches('\u{feff}'))
}

/// Parse an already decoded key message document.
#[must_use]
pub fn parse_key_message_xml(xml: &str) -> PlayReadyChallenge {
    let doc = match roxmltree::Document::parse(xml) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("PlayReady key message is not valid XML: {}", e);
            return PlayReadyChallenge::default();
        }
    };

    let mut headers = IndexMap::new();
    if let Some(headers_node) = doc
        .descendants()
        .find(|n| n.tag_name().name() == "HttpHeaders")
    {
        let names = headers_node
            .descendants()
            .filter(|n| n.tag_name().name() == "name")
            .map(|n| n.text().unwrap_or_default().trim().to_string());
        let values = headers_node
            .descendants()
            .filter(|n| n.tag_name().name() == "value")
            .map(|n| n.text().unwrap_or_default().trim().to_string());
        for (name, value) in names.zip(values) {
            if !name.is_empty() {
                headers.insert(name, value);
            }
        }
    }

    let challenge = doc
        .descendants()
        .find(|n| n.tag_name().name() == "Challenge")
        .and_then(|n| n.text())
        .map(|text| {
            let compact = text.split_whitespace().collect::<String>();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .unwrap_or_else(|e| {
                    warn!("PlayReady challenge is not valid base64: {}", e);
                    Vec::new()
                })
        })
        .unwrap_or_default();

    PlayReadyChallenge { headers, challenge }
}
