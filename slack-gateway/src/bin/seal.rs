//! Slack Gateway Seal - encrypt a secrets map for the `kms_data` query parameter.
//!
//! ```text
//! KMS_MASTER_KEY=<hex> slack-gateway-seal --key-id alias/slack SigningSecret=... Token=xoxb-...
//! ```
//!
//! Prints the sealed blob on stdout. Append it to the Slack request URL as
//! `?kms_data=<blob>`.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use slackgate::{encrypt_secrets, Config, LocalKms};

#[derive(Debug, Parser)]
#[command(name = "slack-gateway-seal", about = "Seal Slack secrets into a KMS blob")]
struct Args {
    /// Master key identifier; defaults to KMS_KEY_ID
    #[arg(long)]
    key_id: Option<String>,

    /// Secrets as KEY=VALUE pairs, e.g. SigningSecret=abc Token=xoxb-...
    #[arg(required = true, value_parser = parse_pair)]
    pairs: Vec<(String, String)>,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the blob.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let key_id = args.key_id.unwrap_or(config.kms_key_id);
    let Some(raw_key) = config.kms_master_key else {
        bail!("KMS_MASTER_KEY is not set");
    };
    let kms = LocalKms::from_encoded(&raw_key).context("Invalid KMS_MASTER_KEY")?;

    let params: HashMap<String, String> = args.pairs.into_iter().collect();
    let blob = encrypt_secrets(&kms, &key_id, &params).context("Failed to seal secrets")?;

    info!(key_id = %key_id, secret_count = params.len(), "secrets_sealed");
    println!("{blob}");

    Ok(())
}
