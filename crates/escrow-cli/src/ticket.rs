//! # Encode and Identity Subcommands
//!
//! `escrow encode` prints a ticket's canonical CBOR bytes as lowercase hex.
//! `escrow id` prints its `ticket:v1:` identity, or checks a claimed one.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use escrow_core::{bytes_to_hex, encode, is_deterministic, ticket_id, verify_ticket_id};

use crate::{read_ticket, EXIT_OK, EXIT_REJECTED};

/// Arguments for `escrow encode`.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// JSON ticket file.
    pub ticket: PathBuf,
}

/// Arguments for `escrow id`.
#[derive(Args, Debug)]
pub struct IdArgs {
    /// JSON ticket file.
    pub ticket: PathBuf,

    /// Check that the ticket has this identity instead of printing it.
    #[arg(long)]
    pub expect: Option<String>,
}

/// Execute `escrow encode`.
pub fn run_encode(args: &EncodeArgs) -> Result<u8> {
    let ticket = read_ticket(&args.ticket)?;
    let bytes = encode(&ticket)?;
    tracing::debug!(
        len = bytes.len(),
        deterministic = is_deterministic(&ticket)?,
        "encoded ticket"
    );
    println!("{}", bytes_to_hex(&bytes));
    Ok(EXIT_OK)
}

/// Execute `escrow id`.
pub fn run_id(args: &IdArgs) -> Result<u8> {
    let ticket = read_ticket(&args.ticket)?;
    match &args.expect {
        None => {
            println!("{}", ticket_id(&ticket)?);
            Ok(EXIT_OK)
        }
        Some(claimed) => {
            if verify_ticket_id(&ticket, claimed)? {
                println!("OK {claimed}");
                Ok(EXIT_OK)
            } else {
                println!("MISMATCH expected {claimed}, computed {}", ticket_id(&ticket)?);
                Ok(EXIT_REJECTED)
            }
        }
    }
}
