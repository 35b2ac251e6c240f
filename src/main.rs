#![cfg(feature = "cli")]
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use base64::Engine;
use clap::{ArgAction, Parser, Subcommand};
use serde_json::json;

use rseme::adapter::ms::MS_KEY_SYSTEM;
use rseme::adapter::webkit::{concat_init_data_id_and_certificate, default_content_id};
use rseme::codec::utf16le_to_string;
use rseme::config::EmeOptions;
use rseme::events::EventDispatch;
use rseme::license::{LicenseExchange, LicenseRequest, RequestShape};
use rseme::playready::parse_key_message;
use rseme::transport::HttpTransport;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "rseme", version, disable_version_flag = true, about = "rseme CLI")]
struct Cli {
    #[arg(short = 'v', long = "version", action = ArgAction::SetTrue)]
    version: bool,

    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate a key-system configuration file and print it in priority
    /// order.
    CheckConfig { config_path: PathBuf },
    /// Fetch the server certificate configured for a key system.
    Certificate {
        config_path: PathBuf,
        key_system: String,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Exchange a key message for a license using the configured defaults.
    ///
    /// PlayReady messages are treated as key-message envelopes; every other
    /// key system posts the raw message.
    License {
        config_path: PathBuf,
        key_system: String,
        message_path: PathBuf,
        /// Destination URL to fall back on (PlayReady).
        #[arg(long = "destination")]
        destination: Option<String>,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Build a FairPlay session payload from init data and a certificate.
    FairplayPayload {
        #[arg(short = 'i', long = "init")]
        init: PathBuf,
        #[arg(short = 'c', long = "certificate")]
        certificate: PathBuf,
        /// Content id; defaults to the host of the init data URI.
        #[arg(long = "content-id")]
        content_id: Option<String>,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
    /// Decode a PlayReady key message (UTF-16LE XML).
    PlayreadyChallenge { message_path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::fmt().with_max_level(level).init();

    info!("rseme version {}", env!("CARGO_PKG_VERSION"));

    if cli.version {
        return Ok(());
    }

    match cli.command {
        Some(Commands::CheckConfig { config_path }) => run_check_config(&config_path),
        Some(Commands::Certificate {
            config_path,
            key_system,
            output,
        }) => run_certificate(&config_path, &key_system, output.as_deref()),
        Some(Commands::License {
            config_path,
            key_system,
            message_path,
            destination,
            output,
        }) => run_license(
            &config_path,
            &key_system,
            &message_path,
            destination,
            output.as_deref(),
        ),
        Some(Commands::FairplayPayload {
            init,
            certificate,
            content_id,
            output,
        }) => run_fairplay_payload(&init, &certificate, content_id, &output),
        Some(Commands::PlayreadyChallenge { message_path }) => run_playready_challenge(&message_path),
        None => Ok(()),
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

fn exchange() -> anyhow::Result<LicenseExchange> {
    let transport = HttpTransport::new().context("Failed to create HTTP transport")?;
    Ok(LicenseExchange::new(Arc::new(transport), EventDispatch::new()))
}

fn write_or_print(bytes: &[u8], output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Saved {} bytes to {}", bytes.len(), path.display());
        }
        None => println!("{}", base64::engine::general_purpose::STANDARD.encode(bytes)),
    }
    Ok(())
}

fn run_check_config(config_path: &Path) -> anyhow::Result<()> {
    let options = EmeOptions::from_path(config_path).context("Failed to load configuration")?;
    let summary = options
        .key_systems
        .iter()
        .map(|(key_system, ks)| {
            json!({
                "key_system": key_system,
                "url": ks.url,
                "certificate_uri": ks.certificate_uri,
                "license_headers": ks.license_headers,
                "certificate_headers": ks.certificate_headers,
                "video_robustness": ks.video_robustness,
                "audio_robustness": ks.audio_robustness,
                "persistent_state": ks.persistent_state,
                "pssh": ks.pssh.as_ref().map(|p| base64::engine::general_purpose::STANDARD.encode(p)),
            })
        })
        .collect::<Vec<_>>();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!("[+] Configuration is valid ({} key systems)", summary.len());
    Ok(())
}

fn run_certificate(config_path: &Path, key_system: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let options = EmeOptions::from_path(config_path).context("Failed to load configuration")?;
    let ks = options
        .get(key_system)
        .with_context(|| format!("Key system {} is not configured", key_system))?;

    let exchange = exchange()?;
    let certificate = runtime()?
        .block_on(exchange.fetch_certificate(key_system, ks))
        .context("Failed to fetch certificate")?;

    match certificate {
        Some(certificate) => {
            info!("[+] Got {} byte certificate", certificate.len());
            write_or_print(&certificate, output)
        }
        None => anyhow::bail!("Key system {} has no certificate source", key_system),
    }
}

fn run_license(
    config_path: &Path,
    key_system: &str,
    message_path: &Path,
    destination: Option<String>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let options = EmeOptions::from_path(config_path).context("Failed to load configuration")?;
    let ks = options
        .get(key_system)
        .with_context(|| format!("Key system {} is not configured", key_system))?;
    let message = std::fs::read(message_path).context("Failed to read key message")?;

    let shape = if key_system == MS_KEY_SYSTEM {
        RequestShape::PlayReadyEnvelope
    } else {
        RequestShape::OctetStream
    };
    let request = LicenseRequest {
        message,
        content_id: None,
        destination_url: destination,
        shape,
    };

    let exchange = exchange()?;
    let license = runtime()?
        .block_on(exchange.request_license(key_system, ks, request))
        .context("License request failed")?;
    info!("[+] Got {} byte license", license.len());
    write_or_print(&license, output)
}

fn run_fairplay_payload(
    init_path: &Path,
    certificate_path: &Path,
    content_id: Option<String>,
    output: &Path,
) -> anyhow::Result<()> {
    let init = std::fs::read(init_path).context("Failed to read init data")?;
    let certificate = std::fs::read(certificate_path).context("Failed to read certificate")?;
    if certificate.is_empty() {
        anyhow::bail!("Certificate file is empty");
    }

    let content_id = content_id.unwrap_or_else(|| default_content_id(&utf16le_to_string(&init)));
    info!("[+] Content id: {}", content_id);

    let payload = concat_init_data_id_and_certificate(&init, &content_id, &certificate);
    write_or_print(&payload, Some(output))
}

fn run_playready_challenge(message_path: &Path) -> anyhow::Result<()> {
    let message = std::fs::read(message_path).context("Failed to read key message")?;
    let parsed = parse_key_message(&message);
    if parsed.challenge.is_empty() {
        info!("[-] Key message carries no usable challenge");
    }
    let value = json!({
        "headers": parsed.headers,
        "challenge": base64::engine::general_purpose::STANDARD.encode(&parsed.challenge),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
