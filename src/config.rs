//! Key-system configuration.
//!
//! Configuration maps key-system identifiers to [`KeySystemOptions`], in
//! priority order. It can be built in code (hooks are closures) or loaded
//! from YAML, where a plain string value is shorthand for a license URL:
//!
//! ```yaml
//! key_systems:
//!   com.widevine.alpha: https://license.example.com/wv
//!   com.apple.fps.1_0:
//!     url: https://license.example.com/fps
//!     certificate_uri: https://license.example.com/fps.cer
//! ```
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::adapter::ms::MS_KEY_SYSTEM;
use crate::adapter::webkit::WEBKIT_KEY_SYSTEM;
use crate::error::{Error, Result};

/// Future returned by acquisition hooks.
pub type HookFuture = BoxFuture<'static, Result<Vec<u8>>>;

/// Caller-supplied certificate fetch.
pub type CertificateHook = Arc<dyn Fn(CertificateContext) -> HookFuture + Send + Sync>;

/// Caller-supplied license (or legacy key) fetch.
pub type LicenseHook = Arc<dyn Fn(LicenseContext) -> HookFuture + Send + Sync>;

/// Caller-supplied content id derivation from the decoded init data.
pub type ContentIdHook = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Input of a certificate hook.
#[derive(Debug, Clone)]
pub struct CertificateContext {
    pub key_system: String,
    pub certificate_uri: Option<String>,
}

/// Input of a license or key hook.
#[derive(Debug, Clone)]
pub struct LicenseContext {
    pub key_system: String,
    /// Raw key message from the platform.
    pub message: Vec<u8>,
    /// Content id (WebKit FairPlay only).
    pub content_id: Option<String>,
    /// Destination URL from the key message (MS PlayReady only).
    pub destination_url: Option<String>,
    /// Configured license URL, if any.
    pub url: Option<String>,
}

/// Options for one key system.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeySystemOptions {
    /// License server URL.
    #[serde(alias = "license_uri", alias = "licenseUri")]
    pub url: Option<String>,
    /// Certificate server URL.
    #[serde(alias = "certificateUri")]
    pub certificate_uri: Option<String>,
    /// Extra headers for license requests.
    #[serde(alias = "licenseHeaders")]
    pub license_headers: IndexMap<String, String>,
    /// Extra headers for certificate requests.
    #[serde(alias = "certificateHeaders")]
    pub certificate_headers: IndexMap<String, String>,
    #[serde(alias = "audioContentType")]
    pub audio_content_type: Option<String>,
    #[serde(alias = "audioRobustness")]
    pub audio_robustness: Option<String>,
    #[serde(alias = "videoContentType")]
    pub video_content_type: Option<String>,
    #[serde(alias = "videoRobustness")]
    pub video_robustness: Option<String>,
    /// `required`, `optional` or `not-allowed`.
    #[serde(alias = "persistentState")]
    pub persistent_state: Option<String>,
    /// Init data replacing the need-key payload (MS PlayReady only), base64
    /// in YAML.
    #[serde(deserialize_with = "deserialize_base64_opt")]
    pub pssh: Option<Vec<u8>>,
    #[serde(skip)]
    pub get_certificate: Option<CertificateHook>,
    #[serde(skip)]
    pub get_content_id: Option<ContentIdHook>,
    #[serde(skip)]
    pub get_license: Option<LicenseHook>,
    #[serde(skip)]
    pub get_key: Option<LicenseHook>,
}

impl KeySystemOptions {
    /// Options that only name a license URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn certificate_uri(mut self, uri: impl Into<String>) -> Self {
        self.certificate_uri = Some(uri.into());
        self
    }

    pub fn license_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.license_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_certificate_hook<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(CertificateContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
    {
        self.get_certificate = Some(Arc::new(move |ctx| -> HookFuture { Box::pin(hook(ctx)) }));
        self
    }

    pub fn with_license_hook<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(LicenseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
    {
        self.get_license = Some(Arc::new(move |ctx| -> HookFuture { Box::pin(hook(ctx)) }));
        self
    }

    pub fn with_key_hook<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(LicenseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
    {
        self.get_key = Some(Arc::new(move |ctx| -> HookFuture { Box::pin(hook(ctx)) }));
        self
    }

    pub fn with_content_id_hook(mut self, hook: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.get_content_id = Some(Arc::new(hook));
        self
    }

    /// Whether a license can be fetched without a destination URL from the
    /// platform.
    pub fn has_license_source(&self) -> bool {
        self.url.is_some() || self.get_license.is_some() || self.get_key.is_some()
    }

    pub fn has_certificate_source(&self) -> bool {
        self.certificate_uri.is_some() || self.get_certificate.is_some()
    }
}

impl From<&str> for KeySystemOptions {
    fn from(url: &str) -> Self {
        Self::with_url(url)
    }
}

impl From<String> for KeySystemOptions {
    fn from(url: String) -> Self {
        Self::with_url(url)
    }
}

impl fmt::Debug for KeySystemOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySystemOptions")
            .field("url", &self.url)
            .field("certificate_uri", &self.certificate_uri)
            .field("license_headers", &self.license_headers)
            .field("certificate_headers", &self.certificate_headers)
            .field("audio_content_type", &self.audio_content_type)
            .field("audio_robustness", &self.audio_robustness)
            .field("video_content_type", &self.video_content_type)
            .field("video_robustness", &self.video_robustness)
            .field("persistent_state", &self.persistent_state)
            .field("pssh", &self.pssh.as_ref().map(|p| p.len()))
            .field("get_certificate", &self.get_certificate.is_some())
            .field("get_content_id", &self.get_content_id.is_some())
            .field("get_license", &self.get_license.is_some())
            .field("get_key", &self.get_key.is_some())
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeySystemEntry {
    Url(String),
    Options(KeySystemOptions),
}

impl From<KeySystemEntry> for KeySystemOptions {
    fn from(entry: KeySystemEntry) -> Self {
        match entry {
            KeySystemEntry::Url(url) => KeySystemOptions::with_url(url),
            KeySystemEntry::Options(options) => options,
        }
    }
}

/// Full configuration handed to an orchestrator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmeOptions {
    /// Key systems in priority order.
    #[serde(default, alias = "keySystems", deserialize_with = "deserialize_key_systems")]
    pub key_systems: IndexMap<String, KeySystemOptions>,
}

impl EmeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key system (string values are license URLs).
    pub fn with_key_system(mut self, key_system: impl Into<String>, options: impl Into<KeySystemOptions>) -> Self {
        self.key_systems.insert(key_system.into(), options.into());
        self
    }

    pub fn get(&self, key_system: &str) -> Option<&KeySystemOptions> {
        self.key_systems.get(key_system)
    }

    /// Parse and validate YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let options: EmeOptions = serde_yaml::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    /// Load and validate a YAML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject configurations that could never produce a license.
    ///
    /// Every key system needs a license URL or a hook, except MS PlayReady,
    /// which may use the destination URL carried by its key message. WebKit
    /// FairPlay additionally needs a certificate source.
    pub fn validate(&self) -> Result<()> {
        if self.key_systems.is_empty() {
            return Err(Error::Configuration("No key systems configured".to_string()));
        }

        for (key_system, options) in self.key_systems.iter() {
            if !options.has_license_source() && key_system != MS_KEY_SYSTEM {
                return Err(Error::Configuration(format!(
                    "Key system {} needs a license url or a get_license hook",
                    key_system
                )));
            }
            if key_system == WEBKIT_KEY_SYSTEM && !options.has_certificate_source() {
                return Err(Error::Configuration(format!(
                    "Key system {} needs a certificate_uri or a get_certificate hook",
                    key_system
                )));
            }
        }
        Ok(())
    }
}

fn deserialize_key_systems<'de, D>(deserializer: D) -> std::result::Result<IndexMap<String, KeySystemOptions>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, KeySystemEntry>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}

fn deserialize_base64_opt<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|value| {
            base64::engine::general_purpose::STANDARD
                .decode(value.trim())
                .map_err(serde::de::Error::custom)
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::{EmeOptions, KeySystemOptions};
    use crate::error::ErrorKind;

    #[test]
    fn yaml_shorthand_and_full_entries() {
        let yaml = r#"
key_systems:
  com.widevine.alpha: https://lic.example/wv
  com.apple.fps.1_0:
    licenseUri: https://lic.example/fps
    certificateUri: https://lic.example/fps.cer
    license_headers:
      X-Token: abc
  com.microsoft.playready:
    pssh: AAECAw==
"#;
        let options = EmeOptions::from_yaml_str(yaml).expect("parse config");
        let names = options.key_systems.keys().cloned().collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["com.widevine.alpha", "com.apple.fps.1_0", "com.microsoft.playready"]
        );

        let wv = options.get("com.widevine.alpha").expect("widevine");
        assert_eq!(wv.url.as_deref(), Some("https://lic.example/wv"));

        let fps = options.get("com.apple.fps.1_0").expect("fairplay");
        assert_eq!(fps.url.as_deref(), Some("https://lic.example/fps"));
        assert_eq!(fps.certificate_uri.as_deref(), Some("https://lic.example/fps.cer"));
        assert_eq!(fps.license_headers.get("X-Token").map(String::as_str), Some("abc"));

        let pr = options.get("com.microsoft.playready").expect("playready");
        assert_eq!(pr.pssh.as_deref(), Some(&[0u8, 1, 2, 3][..]));
        assert!(pr.url.is_none());
    }

    #[test]
    fn missing_license_source_is_rejected() {
        let yaml = r#"
keySystems:
  com.widevine.alpha:
    videoRobustness: SW_SECURE_CRYPTO
"#;
        let err = EmeOptions::from_yaml_str(yaml).expect_err("no url should fail");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("com.widevine.alpha"));
    }

    #[test]
    fn fairplay_requires_certificate_source() {
        let options = EmeOptions::new().with_key_system("com.apple.fps.1_0", "https://lic.example/fps");
        let err = options.validate().expect_err("no certificate should fail");
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let options = EmeOptions::new().with_key_system(
            "com.apple.fps.1_0",
            KeySystemOptions::with_url("https://lic.example/fps").certificate_uri("https://lic.example/c"),
        );
        options.validate().expect("valid fairplay config");
    }

    #[test]
    fn empty_configuration_is_rejected() {
        let err = EmeOptions::new().validate().expect_err("empty should fail");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn hook_counts_as_license_source() {
        let options = EmeOptions::new().with_key_system(
            "org.w3.clearkey",
            KeySystemOptions::default().with_license_hook(|_ctx| async { Ok(vec![1]) }),
        );
        options.validate().expect("hook satisfies validation");
    }

    #[test]
    fn bad_pssh_base64_fails_to_parse() {
        let yaml = r#"
key_systems:
  com.microsoft.playready:
    pssh: "!!not base64!!"
"#;
        let err = EmeOptions::from_yaml_str(yaml).expect_err("bad base64");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
