//! `ScriptValues` — the parameters that uniquely identify one HTLC
//! instance (spec §3).

use bitcoin::absolute::LockTime;
use bitcoin::PublicKey;

use crate::error::SwapError;

/// Selects the hash opcode used by the HTLC's preimage check.
/// A tagged enum rather than a runtime string, per spec §9's Design
/// Notes ("Dual hash algorithms").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Ripemd160,
    Sha256,
}

impl HashAlgorithm {
    /// Expected `secretHash` length for this algorithm (spec §3).
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Ripemd160 => 20,
            HashAlgorithm::Sha256 => 32,
        }
    }
}

/// The parameters that uniquely identify one HTLC instance.
///
/// Immutable once constructed: the derived P2SH address is a pure
/// function of `(ScriptValues, Network)` (spec §3's invariant — two
/// instances with equal fields yield byte-identical redeem scripts and
/// addresses). `ScriptBuilder::build` relies on every field here having
/// already been validated by [`ScriptValues::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptValues {
    secret_hash: Vec<u8>,
    owner_public_key: PublicKey,
    recipient_public_key: PublicKey,
    lock_time: LockTime,
    hash_name: HashAlgorithm,
}

impl ScriptValues {
    /// Validates the invariants spec §3 describes (secret hash length
    /// tied to `hash_name`, public keys compressed) and constructs a
    /// `ScriptValues`. A violation is a bug in the caller, not a
    /// retryable condition — it surfaces as `InvariantViolated` (spec
    /// §7).
    pub fn new(
        secret_hash: Vec<u8>,
        owner_public_key: PublicKey,
        recipient_public_key: PublicKey,
        lock_time: u32,
        hash_name: HashAlgorithm,
    ) -> Result<Self, SwapError> {
        if secret_hash.len() != hash_name.digest_len() {
            return Err(SwapError::InvariantViolated(format!(
                "secretHash must be {} bytes for {:?}, got {}",
                hash_name.digest_len(),
                hash_name,
                secret_hash.len()
            )));
        }
        if !owner_public_key.compressed {
            return Err(SwapError::InvariantViolated(
                "ownerPublicKey must be a compressed SEC point".into(),
            ));
        }
        if !recipient_public_key.compressed {
            return Err(SwapError::InvariantViolated(
                "recipientPublicKey must be a compressed SEC point".into(),
            ));
        }
        Ok(Self {
            secret_hash,
            owner_public_key,
            recipient_public_key,
            lock_time: LockTime::from_consensus(lock_time),
            hash_name,
        })
    }

    pub fn secret_hash(&self) -> &[u8] {
        &self.secret_hash
    }

    pub fn owner_public_key(&self) -> &PublicKey {
        &self.owner_public_key
    }

    pub fn recipient_public_key(&self) -> &PublicKey {
        &self.recipient_public_key
    }

    pub fn lock_time(&self) -> LockTime {
        self.lock_time
    }

    pub fn hash_name(&self) -> HashAlgorithm {
        self.hash_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::{PublicKey as SecpPublicKey, Secp256k1, SecretKey};
    use test_case::test_case;

    fn compressed_pubkey(byte: u8) -> PublicKey {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[byte; 32]).unwrap();
        PublicKey::new(SecpPublicKey::from_secret_key(&secp, &sk))
    }

    #[test_case(HashAlgorithm::Ripemd160, 20, true; "ripemd160 exact length accepted")]
    #[test_case(HashAlgorithm::Ripemd160, 32, false; "ripemd160 sha256-sized hash rejected")]
    #[test_case(HashAlgorithm::Sha256, 32, true; "sha256 exact length accepted")]
    #[test_case(HashAlgorithm::Sha256, 20, false; "sha256 ripemd160-sized hash rejected")]
    fn validates_secret_hash_length_against_hash_name(hash_name: HashAlgorithm, len: usize, should_pass: bool) {
        let result = ScriptValues::new(vec![0u8; len], compressed_pubkey(1), compressed_pubkey(2), 100, hash_name);
        assert_eq!(result.is_ok(), should_pass);
    }

    #[test]
    fn rejects_wrong_length_secret_hash_for_ripemd160() {
        let err = ScriptValues::new(
            vec![0u8; 32],
            compressed_pubkey(1),
            compressed_pubkey(2),
            100,
            HashAlgorithm::Ripemd160,
        )
        .unwrap_err();
        assert!(matches!(err, SwapError::InvariantViolated(_)));
    }

    #[test]
    fn accepts_matching_length_secret_hash() {
        let values = ScriptValues::new(
            vec![0u8; 20],
            compressed_pubkey(1),
            compressed_pubkey(2),
            100,
            HashAlgorithm::Ripemd160,
        )
        .unwrap();
        assert_eq!(values.secret_hash().len(), 20);
    }
}
