//! # escrow-cli — CLI Tool for Resolution Tickets
//!
//! Provides the `escrow` command-line interface over JSON ticket files.
//!
//! ## Subcommands
//!
//! - `escrow encode`: Canonical CBOR bytes of a ticket, as hex.
//! - `escrow id`: Content-derived ticket identity.
//! - `escrow sign`: Seal a ticket into a signed envelope.
//! - `escrow verify`: Verify and open a signed envelope.
//! - `escrow quorum`: Evaluate multi-party signatures against a policy.
//!
//! ```bash
//! escrow id ticket.json
//! escrow sign ticket.json --secret-hex "$ARBITER_SEED" > envelope.json
//! escrow verify envelope.json --config escrow.yaml
//! escrow quorum ticket.json --signatures sigs.json --config escrow.yaml
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; ticket semantics live in the library crates.
//! - Handlers return an exit code: `0` accepted, `1` rejected. The binary
//!   exits `2` when a command fails outright (unreadable file, bad input).

pub mod config;
pub mod envelope;
pub mod quorum;
pub mod ticket;

use std::path::Path;

use anyhow::{Context, Result};
use escrow_core::TicketValue;

/// Exit code for an accepted ticket or a successful command.
pub const EXIT_OK: u8 = 0;
/// Exit code for a rejected ticket.
pub const EXIT_REJECTED: u8 = 1;

/// Read a JSON ticket file into a [`TicketValue`].
pub fn read_ticket(path: &Path) -> Result<TicketValue> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ticket file: {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("ticket file is not valid JSON: {}", path.display()))?;
    Ok(TicketValue::from(json))
}

/// Current time in Unix seconds, unless the caller pinned one.
pub fn resolve_now(pinned: Option<i64>) -> i64 {
    pinned.unwrap_or_else(|| chrono::Utc::now().timestamp())
}
