//! Intent hashing: the cryptographic binding between a contract's intent
//! declaration and its behavioral fingerprint.
//!
//! If either the intent text or the code's behavior changes, the combined
//! hash changes — semantic drift becomes detectable at compile time and
//! tampering detectable wherever the hash is stored.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ast::ContractDef;
use crate::verify::fingerprint::{fingerprint_contract, BehavioralFingerprint};

/// Lowercase hex SHA-256 of a byte string. The canonical hash function
/// for every commitment in this module.
fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Cryptographic binding of an intent declaration to a behavioral profile.
///
/// `combined_hash = SHA-256(hex(intent_hash) ‖ hex(fingerprint_hash))`,
/// with the concatenation over lowercase-hex ASCII.
///
/// The serialized record is the persisted artifact and must stay
/// byte-stable: fields are declared in sorted key order so the derived
/// serialization is the canonical sorted-key JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentHash {
    pub combined_hash: String,
    pub contract_name: String,
    pub fingerprint_hash: String,
    pub intent_hash: String,
    pub intent_text: String,
}

impl IntentHash {
    /// Compare this hash against another (e.g. a previously stored one).
    pub fn verify_against(&self, other: &IntentHash) -> IntentHashComparison {
        IntentHashComparison {
            contract_name: self.contract_name.clone(),
            intent_changed: self.intent_hash != other.intent_hash,
            behavior_changed: self.fingerprint_hash != other.fingerprint_hash,
            combined_match: self.combined_hash == other.combined_hash,
            old_hash: other.clone(),
            new_hash: self.clone(),
        }
    }
}

/// Result of comparing two [`IntentHash`] values for the same contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentHashComparison {
    pub contract_name: String,
    pub intent_changed: bool,
    pub behavior_changed: bool,
    pub combined_match: bool,
    pub old_hash: IntentHash,
    pub new_hash: IntentHash,
}

impl IntentHashComparison {
    /// True if behavior changed without a corresponding intent update.
    pub fn is_drift(&self) -> bool {
        self.behavior_changed && !self.intent_changed
    }

    /// True if intent and behavior changed together, or neither changed.
    pub fn is_consistent(&self) -> bool {
        self.combined_match || (self.intent_changed && self.behavior_changed)
    }

    pub fn describe(&self) -> String {
        if self.combined_match {
            return format!("contract '{}': no change", self.contract_name);
        }
        if self.is_drift() {
            return format!(
                "contract '{}': SEMANTIC DRIFT DETECTED — \
                 behavior changed but intent declaration was not updated",
                self.contract_name
            );
        }
        if self.intent_changed && !self.behavior_changed {
            return format!(
                "contract '{}': intent updated but behavior unchanged — \
                 verify intent still matches implementation",
                self.contract_name
            );
        }
        format!(
            "contract '{}': both intent and behavior changed — verify consistency",
            self.contract_name
        )
    }
}

/// Compute the intent hash for a contract.
///
/// `intent_text` is the intent declaration text from the file header; pass
/// the empty string when no intent was declared. `fingerprint` may be
/// pre-computed; pass `None` to compute it here.
pub fn compute_intent_hash(
    contract: &ContractDef,
    intent_text: &str,
    fingerprint: Option<&BehavioralFingerprint>,
) -> IntentHash {
    let computed;
    let fp = match fingerprint {
        Some(fp) => fp,
        None => {
            computed = fingerprint_contract(contract);
            &computed
        }
    };

    let intent_hash = sha256_hex(intent_text.as_bytes());
    let fingerprint_hash = sha256_hex(fp.canonical_json().as_bytes());
    let combined_hash = sha256_hex(format!("{}{}", intent_hash, fingerprint_hash).as_bytes());

    IntentHash {
        combined_hash,
        contract_name: contract.name.clone(),
        fingerprint_hash,
        intent_hash,
        intent_text: intent_text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_matches_known_empty_digest() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_hex_is_deterministic() {
        assert_eq!(sha256_hex(b"increment"), sha256_hex(b"increment"));
    }
}
