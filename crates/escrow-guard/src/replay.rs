//! # Replay Guard
//!
//! At-most-once acceptance of a ticket identity within one trust domain
//! (typically one escrow process).
//!
//! ## States
//!
//! EMPTY → TRACKING(n) → TRACKING(n + 1) ... (never resets)
//!
//! ## Acceptance Rules
//!
//! 1. `expires_at < now` → rejected as expired, nothing recorded.
//! 2. Identity already recorded → rejected as a replay; the recorded expiry
//!    is left untouched.
//! 3. Otherwise the identity is recorded with its expiry and accepted.
//!
//! `expires_at == now` is still live.
//!
//! ## Pruning
//!
//! Expired entries are dropped once the table grows past
//! [`ReplayGuardConfig::prune_threshold`], or on an explicit
//! [`ReplayGuard::prune`]. Each prune raises the guard's horizon to the `now`
//! it pruned at, and anything expiring before the horizon is rejected as
//! expired from then on, even when a later call passes an earlier `now`. A
//! forgotten identity can therefore never be accepted a second time.
//!
//! ## Concurrency
//!
//! The check-then-insert in rule 2/3 runs under one lock per guard, so two
//! concurrent `accept` calls for the same identity can never both succeed.
//! Guards are independent: two instances never share state.
//!
//! ## Clock
//!
//! `now` is always passed in. The guard never reads a clock, which keeps
//! tests deterministic and lets callers choose their own time source.
//!
//! Protection does not survive a restart. Durable, cross-process replay
//! protection needs an external store.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use escrow_core::{ticket_id, EscrowError, TicketId, TicketValue};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::ticket::expires_at;

/// Tuning for a [`ReplayGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayGuardConfig {
    /// Table size above which an accept opportunistically drops expired
    /// entries.
    pub prune_threshold: usize,
}

impl Default for ReplayGuardConfig {
    fn default() -> Self {
        Self {
            prune_threshold: 1024,
        }
    }
}

/// Why a ticket was or was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayVerdict {
    /// First sighting of a live ticket; now recorded.
    Accepted,
    /// `expires_at` is before `now`.
    Expired,
    /// The identity was accepted earlier.
    Replayed,
}

impl ReplayVerdict {
    /// Whether the ticket may be acted on.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl std::fmt::Display for ReplayVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Accepted => "accepted",
            Self::Expired => "expired",
            Self::Replayed => "replay",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
struct ReplayTable {
    expiries: HashMap<TicketId, i64>,
    /// Size that triggers the next opportunistic prune.
    prune_at: usize,
    /// Highest `now` any prune has used.
    horizon: i64,
}

impl ReplayTable {
    fn is_expired(&self, expires_at: i64, now: i64) -> bool {
        expires_at < now.max(self.horizon)
    }

    fn prune(&mut self, now: i64) -> usize {
        self.horizon = self.horizon.max(now);
        let horizon = self.horizon;
        let before = self.expiries.len();
        self.expiries.retain(|_, expires_at| *expires_at >= horizon);
        before - self.expiries.len()
    }
}

/// Tracks accepted ticket identities and their expiries.
#[derive(Debug)]
pub struct ReplayGuard {
    config: ReplayGuardConfig,
    table: Mutex<ReplayTable>,
}

impl ReplayGuard {
    /// A guard with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ReplayGuardConfig::default())
    }

    /// A guard with explicit tuning.
    pub fn with_config(config: ReplayGuardConfig) -> Self {
        Self {
            config,
            table: Mutex::new(ReplayTable {
                expiries: HashMap::new(),
                prune_at: config.prune_threshold,
                horizon: i64::MIN,
            }),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ReplayGuardConfig {
        &self.config
    }

    /// Accept a ticket at most once, and only while it is live.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::MissingField`] / [`EscrowError::FieldType`] if the
    ///   ticket has no integer `expires_at`.
    /// - [`EscrowError::Encoding`] if the ticket cannot be encoded.
    pub fn accept(&self, ticket: &TicketValue, now: i64) -> Result<bool, EscrowError> {
        Ok(self.check(ticket, now)?.is_accepted())
    }

    /// Like [`accept`](Self::accept), but reports why.
    pub fn check(&self, ticket: &TicketValue, now: i64) -> Result<ReplayVerdict, EscrowError> {
        let expires_at = expires_at(ticket)?;
        let id = ticket_id(ticket)?;
        Ok(self.check_id(id, expires_at, now))
    }

    /// Accept an identity the caller has already computed.
    pub fn accept_id(&self, id: TicketId, expires_at: i64, now: i64) -> bool {
        self.check_id(id, expires_at, now).is_accepted()
    }

    /// Like [`accept_id`](Self::accept_id), but reports why.
    pub fn check_id(&self, id: TicketId, expires_at: i64, now: i64) -> ReplayVerdict {
        let mut table = self.table.lock();
        if table.is_expired(expires_at, now) {
            tracing::warn!(
                ticket_id = %id,
                reason = "expired",
                expires_at,
                now,
                horizon = table.horizon,
                "rejected ticket"
            );
            return ReplayVerdict::Expired;
        }

        match table.expiries.entry(id) {
            Entry::Occupied(_) => {
                tracing::warn!(ticket_id = %id, reason = "replay", "rejected ticket");
                return ReplayVerdict::Replayed;
            }
            Entry::Vacant(slot) => {
                slot.insert(expires_at);
            }
        }

        if table.expiries.len() > table.prune_at {
            let removed = table.prune(now);
            // Next opportunistic prune once the survivors double.
            table.prune_at = self
                .config
                .prune_threshold
                .max(table.expiries.len().saturating_mul(2));
            tracing::debug!(
                removed,
                remaining = table.expiries.len(),
                next_prune_at = table.prune_at,
                "pruned replay table"
            );
        }

        tracing::debug!(ticket_id = %id, expires_at, "accepted ticket");
        ReplayVerdict::Accepted
    }

    /// Drop every entry whose expiry is before `now`, or before an earlier
    /// prune's `now` if that was later. Returns how many were removed.
    pub fn prune(&self, now: i64) -> usize {
        let mut table = self.table.lock();
        let removed = table.prune(now);
        table.prune_at = self.config.prune_threshold;
        removed
    }

    /// Whether an identity is currently recorded.
    pub fn contains(&self, id: &TicketId) -> bool {
        self.table.lock().expiries.contains_key(id)
    }

    /// Number of recorded identities.
    pub fn len(&self) -> usize {
        self.table.lock().expiries.len()
    }

    /// Whether nothing has been recorded (or everything was pruned).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new()
    }
}
