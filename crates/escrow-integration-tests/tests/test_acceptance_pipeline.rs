//! # Acceptance Pipeline — End to End
//!
//! Issuer seals, escrow program opens, replay guard admits once, and a
//! multi-arbiter panel reaches (or misses) quorum. Uses real Ed25519 and
//! real canonical bytes throughout.

use std::sync::Arc;

use escrow_core::{ticket_id, CanonicalBytes, TicketValue};
use escrow_crypto::Ed25519KeyPair;
use escrow_guard::{
    QuorumPolicy, QuorumSignature, ReplayGuard, ReplayVerdict, SignedEnvelope, SignerOutcome,
};

fn arbiter(byte: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed(&[byte; 32])
}

fn ticket(deal: &str, nonce: u64, expires_at: i64) -> TicketValue {
    TicketValue::map([
        ("schema", TicketValue::from("escrow.v1.ResolveTicket")),
        ("deal_id", TicketValue::from(deal)),
        ("action", TicketValue::from("SPLIT")),
        ("split_bps", TicketValue::from(2500u32)),
        ("nonce", TicketValue::from(nonce)),
        ("expires_at", TicketValue::from(expires_at)),
    ])
}

fn panel() -> QuorumPolicy {
    QuorumPolicy {
        authorized_keys: (1..=3).map(|b| arbiter(b).public_key()).collect(),
        threshold: 2,
    }
}

fn signatures(ticket: &TicketValue, signers: &[u8]) -> Vec<QuorumSignature> {
    signers
        .iter()
        .map(|b| {
            let env = SignedEnvelope::seal_with(ticket, &arbiter(*b)).unwrap();
            QuorumSignature::from_hex(&env.pubkey_hex, &env.signature_hex).unwrap()
        })
        .collect()
}

#[test]
fn single_arbiter_flow() {
    let t = ticket("D-100", 1, 1_000);
    let envelope = SignedEnvelope::seal_with(&t, &arbiter(1)).unwrap();
    let wire = envelope.to_json().unwrap();

    let received = SignedEnvelope::from_json(&wire).unwrap();
    let opened = received.open().unwrap();
    assert_eq!(opened.signer, arbiter(1).public_key());
    assert_eq!(opened.id, ticket_id(&t).unwrap());

    let guard = ReplayGuard::new();
    assert!(guard.accept(&opened.ticket, 900).unwrap());
    assert_eq!(guard.check(&opened.ticket, 901).unwrap(), ReplayVerdict::Replayed);
}

#[test]
fn panel_flow() {
    let t = ticket("D-200", 7, 5_000);
    let policy = panel();

    let report = policy.evaluate(&t, &signatures(&t, &[3, 1])).unwrap();
    assert!(report.is_met());
    assert_eq!(report.valid_count, 2);

    let guard = ReplayGuard::new();
    assert!(guard.accept(&t, 4_000).unwrap());
    assert!(!guard.accept(&t, 4_000).unwrap());
}

#[test]
fn panel_signatures_over_another_ticket_do_not_count() {
    let t = ticket("D-300", 1, 5_000);
    let other = ticket("D-300", 2, 5_000);
    let mut sigs = signatures(&t, &[1]);
    sigs.extend(signatures(&other, &[2]));

    let report = panel().evaluate(&t, &sigs).unwrap();
    assert!(!report.is_met());
    assert_eq!(report.count(SignerOutcome::InvalidSignature), 1);
}

#[test]
fn one_arbiter_signing_twice_is_one_vote() {
    let t = ticket("D-400", 1, 5_000);
    let report = panel().evaluate(&t, &signatures(&t, &[2, 2, 2])).unwrap();
    assert_eq!(report.valid_count, 1);
    assert_eq!(report.count(SignerOutcome::DuplicateSigner), 2);
    assert!(!report.is_met());
}

#[test]
fn outsider_cannot_tip_the_quorum() {
    let t = ticket("D-500", 1, 5_000);
    let report = panel().evaluate(&t, &signatures(&t, &[1, 42])).unwrap();
    assert_eq!(report.count(SignerOutcome::Unauthorized), 1);
    assert!(!report.is_met());
}

#[test]
fn distinct_tickets_are_independent() {
    let guard = ReplayGuard::new();
    for nonce in 0..50u64 {
        assert!(guard.accept(&ticket("D-600", nonce, 10_000), 0).unwrap());
    }
    assert_eq!(guard.len(), 50);
    assert!(!guard.accept(&ticket("D-600", 0, 10_000), 0).unwrap());
}

#[test]
fn guards_do_not_share_state() {
    let t = ticket("D-700", 1, 10_000);
    let a = ReplayGuard::new();
    let b = ReplayGuard::new();
    assert!(a.accept(&t, 0).unwrap());
    assert!(b.accept(&t, 0).unwrap());
}

#[test]
fn shared_guard_admits_exactly_once_across_threads() {
    let guard = Arc::new(ReplayGuard::new());
    let t = ticket("D-800", 1, 10_000);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let guard = Arc::clone(&guard);
            let t = t.clone();
            std::thread::spawn(move || guard.accept(&t, 0).unwrap())
        })
        .collect();
    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(accepted, 1);
}

#[test]
fn opened_canonical_bytes_are_what_was_signed() {
    let t = ticket("D-900", 1, 10_000);
    let opened = SignedEnvelope::seal_with(&t, &arbiter(1))
        .unwrap()
        .open()
        .unwrap();
    assert_eq!(opened.canonical, CanonicalBytes::encode(&t).unwrap());
    assert!(escrow_crypto::verify_canonical(
        &opened.canonical,
        &opened.signature,
        &opened.signer
    ));
}
