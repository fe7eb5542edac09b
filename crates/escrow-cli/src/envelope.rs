//! # Sign and Verify Subcommands
//!
//! `escrow sign` seals a JSON ticket into a signed envelope and prints the
//! envelope JSON. `escrow verify` opens an envelope, checks the signature,
//! and runs the ticket through a fresh replay guard so an expired ticket is
//! reported as rejected.
//!
//! The secret is read from `--secret-hex` or, preferably, from the
//! environment variable named by `--secret-env`, so it does not appear in
//! shell history.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use escrow_core::EscrowError;
use escrow_crypto::Ed25519KeyPair;
use escrow_guard::{expires_at, ReplayGuard, ReplayVerdict, SignedEnvelope};

use crate::config::CliConfig;
use crate::{read_ticket, resolve_now, EXIT_OK, EXIT_REJECTED};

/// Arguments for `escrow sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// JSON ticket file.
    pub ticket: PathBuf,

    /// Secret as hex: a 32-byte seed or 64-byte expanded secret.
    #[arg(long, conflicts_with = "secret_env")]
    pub secret_hex: Option<String>,

    /// Name of an environment variable holding the secret hex.
    #[arg(long)]
    pub secret_env: Option<String>,

    /// Write the envelope here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `escrow verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Signed envelope JSON file.
    pub envelope: PathBuf,

    /// Evaluate expiry at this Unix time instead of the current time.
    #[arg(long)]
    pub now: Option<i64>,
}

/// Execute `escrow sign`.
pub fn run_sign(args: &SignArgs) -> Result<u8> {
    let keypair = Ed25519KeyPair::from_secret_hex(&resolve_secret(args)?)
        .context("invalid signing secret")?;
    let ticket = read_ticket(&args.ticket)?;
    let envelope = SignedEnvelope::seal_with(&ticket, &keypair)?;
    let json = envelope.to_json()?;

    tracing::info!(signer = %keypair.public_key().short(), "sealed envelope");

    match &args.out {
        Some(path) => std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write envelope: {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(EXIT_OK)
}

/// Execute `escrow verify`.
pub fn run_verify(args: &VerifyArgs, config: &CliConfig) -> Result<u8> {
    let raw = std::fs::read_to_string(&args.envelope)
        .with_context(|| format!("failed to read envelope: {}", args.envelope.display()))?;
    let envelope = SignedEnvelope::from_json(&raw)?;

    let opened = match envelope.open() {
        Ok(opened) => opened,
        Err(EscrowError::SignatureRejected) => {
            println!("REJECTED signature does not verify");
            return Ok(EXIT_REJECTED);
        }
        Err(e) => return Err(e.into()),
    };

    let now = resolve_now(args.now);
    let guard = ReplayGuard::with_config(config.replay.unwrap_or_default());
    let expiry = expires_at(&opened.ticket)?;
    let verdict = guard.check_id(opened.id, expiry, now);

    println!("id:      {}", opened.id);
    println!("signer:  {}", opened.signer);
    println!("expires: {expiry}");
    match verdict {
        ReplayVerdict::Accepted => {
            println!("ACCEPTED");
            Ok(EXIT_OK)
        }
        other => {
            println!("REJECTED {other}");
            Ok(EXIT_REJECTED)
        }
    }
}

fn resolve_secret(args: &SignArgs) -> Result<String> {
    if let Some(hex) = &args.secret_hex {
        return Ok(hex.clone());
    }
    if let Some(var) = &args.secret_env {
        return std::env::var(var)
            .with_context(|| format!("environment variable {var} is not set"));
    }
    bail!("one of --secret-hex or --secret-env is required")
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrow_core::bytes_to_hex;

    const SEED: [u8; 32] = [0x11; 32];

    fn write_ticket(dir: &tempfile::TempDir, expires_at: i64) -> PathBuf {
        let path = dir.path().join("ticket.json");
        let json = format!(r#"{{"deal_id": "D-1", "action": "RELEASE", "expires_at": {expires_at}}}"#);
        std::fs::write(&path, json).unwrap();
        path
    }

    fn sign_to_file(dir: &tempfile::TempDir, expires_at: i64) -> PathBuf {
        let out = dir.path().join("envelope.json");
        let args = SignArgs {
            ticket: write_ticket(dir, expires_at),
            secret_hex: Some(bytes_to_hex(SEED)),
            secret_env: None,
            out: Some(out.clone()),
        };
        assert_eq!(run_sign(&args).unwrap(), EXIT_OK);
        out
    }

    #[test]
    fn sign_then_verify_accepts() {
        let dir = tempfile::tempdir().unwrap();
        let envelope = sign_to_file(&dir, 2_000_000_000);
        let args = VerifyArgs { envelope, now: Some(1_700_000_000) };
        assert_eq!(run_verify(&args, &CliConfig::default()).unwrap(), EXIT_OK);
    }

    #[test]
    fn expired_envelope_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let envelope = sign_to_file(&dir, 100);
        let args = VerifyArgs { envelope, now: Some(101) };
        assert_eq!(run_verify(&args, &CliConfig::default()).unwrap(), EXIT_REJECTED);
    }

    #[test]
    fn tampered_envelope_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = sign_to_file(&dir, 2_000_000_000);
        let mut envelope =
            SignedEnvelope::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
        envelope.pubkey_hex = Ed25519KeyPair::from_seed(&[0x22; 32]).public_key().to_hex();
        std::fs::write(&path, envelope.to_json().unwrap()).unwrap();

        let args = VerifyArgs { envelope: path, now: Some(0) };
        assert_eq!(run_verify(&args, &CliConfig::default()).unwrap(), EXIT_REJECTED);
    }

    #[test]
    fn malformed_envelope_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envelope.json");
        std::fs::write(&path, r#"{"schema": "escrow.v1.SignedResolveTicket"}"#).unwrap();
        let args = VerifyArgs { envelope: path, now: Some(0) };
        assert!(run_verify(&args, &CliConfig::default()).is_err());
    }

    #[test]
    fn sign_requires_a_secret() {
        let dir = tempfile::tempdir().unwrap();
        let args = SignArgs {
            ticket: write_ticket(&dir, 1),
            secret_hex: None,
            secret_env: None,
            out: None,
        };
        assert!(run_sign(&args).is_err());
    }

    #[test]
    fn sign_rejects_short_secret() {
        let dir = tempfile::tempdir().unwrap();
        let args = SignArgs {
            ticket: write_ticket(&dir, 1),
            secret_hex: Some("00".repeat(31)),
            secret_env: None,
            out: None,
        };
        let err = run_sign(&args).unwrap_err();
        assert!(format!("{err:#}").contains("invalid signing secret"));
    }
}
