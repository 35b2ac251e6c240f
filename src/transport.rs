//! Request/response transport used for certificate and license fetches.
//!
//! The orchestrator only needs "send these bytes, get bytes back"; callers
//! inject any implementation. `HttpTransport` (feature `http`) is the
//! default one, built on reqwest.
use std::fmt;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::Result;
#[cfg(feature = "http")]
use crate::error::Error;

/// HTTP-like request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// One outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub uri: String,
    pub method: Method,
    pub headers: IndexMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method: Method::Get,
            headers: IndexMap::new(),
            body: None,
        }
    }

    pub fn post(uri: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            uri: uri.into(),
            method: Method::Post,
            headers: IndexMap::new(),
            body: Some(body),
        }
    }

    /// Merge headers; later values replace earlier ones with the same
    /// name, compared case-insensitively.
    pub fn with_headers<'a>(mut self, headers: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (name, value) in headers {
            self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    pub fn header(self, name: &str, value: &str) -> Self {
        let name = name.to_string();
        let value = value.to_string();
        self.with_headers([(&name, &value)])
    }
}

/// Binary request/response transport.
///
/// Failures surface as [`crate::error::Error::Transport`]; the orchestrator
/// passes them through inside the certificate or license error kind.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: TransportRequest) -> Result<Vec<u8>>;
}

/// reqwest-backed transport.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rseme/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: TransportRequest) -> Result<Vec<u8>> {
        debug!("{} {}", request.method, request.uri);
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.uri),
            Method::Post => self.client.post(&request.uri),
        };
        for (name, value) in request.headers.iter() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to contact {}: {}", request.uri, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!("[{}] {}", status, text)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::{Method, TransportRequest};

    #[test]
    fn header_merge_replaces_case_insensitively() {
        let request = TransportRequest::post("https://lic.example", vec![1])
            .header("Content-type", "application/octet-stream")
            .header("content-type", "text/xml")
            .header("X-Token", "abc");

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.headers.len(), 2);
        assert_eq!(
            request.headers.get("content-type").map(String::as_str),
            Some("text/xml")
        );
        assert_eq!(request.headers.get("X-Token").map(String::as_str), Some("abc"));
    }

    #[test]
    fn get_has_no_body() {
        let request = TransportRequest::get("https://cert.example/fps.cer");
        assert_eq!(request.method, Method::Get);
        assert!(request.body.is_none());
        assert_eq!(Method::Get.to_string(), "GET");
    }
}
