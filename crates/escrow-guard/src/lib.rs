//! # escrow-guard — Ticket Acceptance Guards
//!
//! The stateful and multi-party checks an escrow process applies before it
//! acts on a resolution ticket:
//!
//! - **Replay protection** (`replay`): each ticket identity is accepted at
//!   most once per guard, and expired tickets are refused.
//! - **Quorum verification** (`quorum`): at least `k` distinct authorized
//!   keys must have validly signed the same canonical bytes.
//! - **Signed envelopes** (`envelope`): the JSON wire form that carries
//!   canonical bytes, a detached signature, and the signer key.
//! - **Typed tickets** (`ticket`): the standard resolution fields.
//!
//! ## Acceptance Pipeline
//!
//! ```text
//! SignedEnvelope ──open()──▶ OpenedTicket ──ReplayGuard::accept()──▶ act
//!                                  │
//!                                  └── QuorumPolicy::verify() (multi-arbiter)
//! ```
//!
//! ## Crate Policy
//!
//! - Depends on `escrow-core` and `escrow-crypto` only.
//! - Guards never read a clock; `now` is always a parameter.
//! - No `unsafe` code.

pub mod envelope;
pub mod quorum;
pub mod replay;
pub mod ticket;

pub use envelope::{OpenedTicket, SignedEnvelope, ENVELOPE_SCHEMA};
pub use quorum::{
    evaluate_canonical, evaluate_quorum, verify_quorum, QuorumPolicy, QuorumReport,
    QuorumSignature, SignerOutcome, SignerReport,
};
pub use replay::{ReplayGuard, ReplayGuardConfig, ReplayVerdict};
pub use ticket::{expires_at, ResolveTicket, RESOLVE_TICKET_SCHEMA};
