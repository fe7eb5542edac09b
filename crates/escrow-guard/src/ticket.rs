//! # Resolve Tickets
//!
//! A typed carrier for the common resolution-ticket fields, and the one
//! field accessor the guards need (`expires_at`).
//!
//! Shape validation (required fields, action/split consistency, confidence
//! bounds) belongs to the upstream validator. `ResolveTicket` does not
//! validate anything; it only saves callers from building a `TicketValue`
//! map by hand.

use escrow_core::{EscrowError, TicketValue};
use serde::{Deserialize, Serialize};

/// Schema tag carried inside resolution tickets.
pub const RESOLVE_TICKET_SCHEMA: &str = "escrow.v1.ResolveTicket";

/// A resolution ticket with the standard fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveTicket {
    /// Schema tag, normally [`RESOLVE_TICKET_SCHEMA`].
    pub schema: String,
    /// The disputed deal.
    pub deal_id: String,
    /// How the escrow should finalize, e.g. `RELEASE`.
    pub action: String,
    /// Split in basis points.
    pub split_bps: u32,
    /// Content identifier of the arbiter's rationale.
    pub rationale_cid: String,
    /// Arbiter confidence.
    pub confidence: f64,
    /// Issuer nonce.
    pub nonce: u64,
    /// Expiry, Unix seconds.
    pub expires_at: i64,
}

impl ResolveTicket {
    /// The generic value the encoder signs and hashes.
    pub fn to_value(&self) -> TicketValue {
        TicketValue::map([
            ("schema", TicketValue::from(self.schema.as_str())),
            ("deal_id", TicketValue::from(self.deal_id.as_str())),
            ("action", TicketValue::from(self.action.as_str())),
            ("split_bps", TicketValue::from(self.split_bps)),
            ("rationale_cid", TicketValue::from(self.rationale_cid.as_str())),
            ("confidence", TicketValue::from(self.confidence)),
            ("nonce", TicketValue::from(self.nonce)),
            ("expires_at", TicketValue::from(self.expires_at)),
        ])
    }

    /// Read the standard fields back out of a decoded value.
    ///
    /// Extra fields are ignored.
    pub fn from_value(value: &TicketValue) -> Result<Self, EscrowError> {
        Ok(serde_json::from_value(value.to_json()?)?)
    }
}

impl From<&ResolveTicket> for TicketValue {
    fn from(ticket: &ResolveTicket) -> Self {
        ticket.to_value()
    }
}

/// Read `expires_at` (integer Unix seconds) from a ticket.
///
/// # Errors
///
/// [`EscrowError::MissingField`] if absent, [`EscrowError::FieldType`] if it
/// is not an integer that fits in `i64`.
pub fn expires_at(ticket: &TicketValue) -> Result<i64, EscrowError> {
    let field = match ticket.get("expires_at") {
        None | Some(TicketValue::Absent) => return Err(EscrowError::MissingField("expires_at")),
        Some(v) => v,
    };
    field
        .as_integer()
        .and_then(|i| i64::try_from(i).ok())
        .ok_or(EscrowError::FieldType {
            field: "expires_at",
            expected: "an integer number of Unix seconds",
        })
}
