//! Intent Verification Engine.
//!
//! Three passes over a parsed program:
//! - [`fingerprint`] — behavioral fingerprinting of contract bodies,
//! - [`checker`] — consistency rules between declarations and behavior,
//! - [`hasher`] — the cryptographic intent/behavior binding.

pub mod checker;
pub mod fingerprint;
pub mod hasher;

pub use checker::{verify_contract, verify_program, Severity, VerificationResult};
pub use fingerprint::{fingerprint_contract, BehavioralFingerprint};
pub use hasher::{compute_intent_hash, IntentHash, IntentHashComparison};
