//! Cross-crate integration tests for escrow resolution tickets.
//!
//! All tests live under `tests/`. This library is intentionally empty.
