//! # Quorum Subcommand
//!
//! `escrow quorum` evaluates a set of detached signatures over one ticket
//! against the `quorum` policy in the config file and prints the report as
//! JSON.
//!
//! The signatures file is a JSON array of objects with `pubkey_hex` and
//! `signature_hex`. Signed envelopes carry the same two fields, so an array
//! of envelopes produced by `escrow sign` for the same ticket is accepted
//! as-is.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use escrow_guard::QuorumSignature;

use crate::config::CliConfig;
use crate::{read_ticket, EXIT_OK, EXIT_REJECTED};

/// Arguments for `escrow quorum`.
#[derive(Args, Debug)]
pub struct QuorumArgs {
    /// JSON ticket file.
    pub ticket: PathBuf,

    /// JSON array of `{pubkey_hex, signature_hex}` objects.
    #[arg(long)]
    pub signatures: PathBuf,

    /// Override the policy threshold.
    #[arg(long)]
    pub threshold: Option<usize>,
}

/// Read a signatures file.
pub fn read_signatures(path: &Path) -> Result<Vec<QuorumSignature>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read signatures file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid signatures file: {}", path.display()))
}

/// Execute `escrow quorum`.
pub fn run_quorum(args: &QuorumArgs, config: &CliConfig) -> Result<u8> {
    let mut policy = config.require_quorum()?.clone();
    if let Some(threshold) = args.threshold {
        policy.threshold = threshold;
    }

    let ticket = read_ticket(&args.ticket)?;
    let signatures = read_signatures(&args.signatures)?;
    let report = policy.evaluate(&ticket, &signatures)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.is_met() {
        Ok(EXIT_OK)
    } else {
        tracing::warn!(
            valid = report.valid_count,
            threshold = report.threshold,
            "quorum not met"
        );
        Ok(EXIT_REJECTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrow_core::{encode, TicketValue};
    use escrow_crypto::Ed25519KeyPair;
    use escrow_guard::{QuorumPolicy, SignedEnvelope};

    const TICKET: &str = r#"{"deal_id": "D-7", "action": "REFUND", "expires_at": 2000000000}"#;

    fn keypair(byte: u8) -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed(&[byte; 32])
    }

    fn config(threshold: usize) -> CliConfig {
        CliConfig {
            quorum: Some(QuorumPolicy {
                authorized_keys: (1..=3).map(|b| keypair(b).public_key()).collect(),
                threshold,
            }),
            replay: None,
        }
    }

    fn setup(signers: &[u8]) -> (tempfile::TempDir, QuorumArgs) {
        let dir = tempfile::tempdir().unwrap();
        let ticket_path = dir.path().join("ticket.json");
        std::fs::write(&ticket_path, TICKET).unwrap();

        let ticket = TicketValue::from(serde_json::from_str::<serde_json::Value>(TICKET).unwrap());
        let bytes = encode(&ticket).unwrap();
        let sigs: Vec<QuorumSignature> = signers
            .iter()
            .map(|b| {
                let kp = keypair(*b);
                QuorumSignature::new(kp.public_key(), kp.sign(&bytes))
            })
            .collect();
        let sig_path = dir.path().join("sigs.json");
        std::fs::write(&sig_path, serde_json::to_string(&sigs).unwrap()).unwrap();

        let args = QuorumArgs {
            ticket: ticket_path,
            signatures: sig_path,
            threshold: None,
        };
        (dir, args)
    }

    #[test]
    fn two_of_three_met() {
        let (_dir, args) = setup(&[1, 2]);
        assert_eq!(run_quorum(&args, &config(2)).unwrap(), EXIT_OK);
    }

    #[test]
    fn outsider_does_not_count() {
        let (_dir, args) = setup(&[1, 9]);
        assert_eq!(run_quorum(&args, &config(2)).unwrap(), EXIT_REJECTED);
    }

    #[test]
    fn threshold_override() {
        let (_dir, mut args) = setup(&[1, 2]);
        args.threshold = Some(3);
        assert_eq!(run_quorum(&args, &config(2)).unwrap(), EXIT_REJECTED);
    }

    #[test]
    fn missing_policy_is_an_error() {
        let (_dir, args) = setup(&[1]);
        assert!(run_quorum(&args, &CliConfig::default()).is_err());
    }

    #[test]
    fn envelopes_are_accepted_as_signatures() {
        let (_dir, args) = setup(&[]);
        let ticket = TicketValue::from(serde_json::from_str::<serde_json::Value>(TICKET).unwrap());
        let envelopes: Vec<SignedEnvelope> = [1u8, 3]
            .iter()
            .map(|b| SignedEnvelope::seal_with(&ticket, &keypair(*b)).unwrap())
            .collect();
        std::fs::write(&args.signatures, serde_json::to_string(&envelopes).unwrap()).unwrap();

        assert_eq!(read_signatures(&args.signatures).unwrap().len(), 2);
        assert_eq!(run_quorum(&args, &config(2)).unwrap(), EXIT_OK);
    }
}
