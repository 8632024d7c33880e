//! Deterministic compilation of the HTLC redeem script and its P2SH
//! address (spec §4.1).
//!
//! ```text
//! <HASH_OP> <secretHash> OP_EQUALVERIFY
//! <recipientPubKey> OP_EQUAL
//! OP_IF
//!   <recipientPubKey> OP_CHECKSIG
//! OP_ELSE
//!   <lockTime-as-script-number> OP_CHECKLOCKTIMEVERIFY OP_DROP
//!   <ownerPubKey> OP_CHECKSIG
//! OP_ENDIF
//! ```
//!
//! The top-of-stack `OP_EQUALVERIFY` enforces the preimage. The
//! subsequent `<recipientPubKey> OP_EQUAL` compares the second-from-top
//! stack item (the public key supplied in the spending witness) against
//! the recipient's key and branches: equal means a signature from the
//! recipient redeems it now, unequal falls through to the timelocked
//! owner-refund branch.

use bitcoin::opcodes::all::{
    OP_CHECKLOCKTIMEVERIFY, OP_CHECKSIG, OP_DROP, OP_ELSE, OP_ENDIF, OP_EQUAL, OP_EQUALVERIFY,
    OP_IF, OP_RIPEMD160, OP_SHA256,
};
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::{Address, ScriptBuf};

use crate::error::SwapError;
use crate::network::Network;
use crate::script_values::{HashAlgorithm, ScriptValues};

/// Pure compiler from `(ScriptValues, Network)` to the HTLC redeem
/// script and its P2SH wrapping address. Every other component
/// consumes `ScriptBuilder::build`'s output; it performs no I/O.
pub struct ScriptBuilder;

impl ScriptBuilder {
    /// Compiles the redeem script and derives its P2SH address.
    ///
    /// Byte-identical for byte-identical `values` (spec §8's
    /// determinism invariant) because every step here is a pure
    /// function of its inputs — no randomness, no clock, no I/O.
    pub fn build(values: &ScriptValues, network: Network) -> Result<(ScriptBuf, Address), SwapError> {
        let redeem_script = Self::redeem_script(values)?;
        let address = Address::p2sh(&redeem_script, network.to_bitcoin()).map_err(|e| {
            SwapError::InvariantViolated(format!("redeem script cannot be wrapped in P2SH: {e}"))
        })?;
        Ok((redeem_script, address))
    }

    /// Just the redeem script, for callers (e.g. the Redeemer) that
    /// need to push it into a scriptSig rather than derive an address.
    pub fn redeem_script(values: &ScriptValues) -> Result<ScriptBuf, SwapError> {
        let hash_op = match values.hash_name() {
            HashAlgorithm::Ripemd160 => OP_RIPEMD160,
            HashAlgorithm::Sha256 => OP_SHA256,
        };

        let secret_hash_push = push_bytes(values.secret_hash())?;
        let recipient_push = push_bytes(&values.recipient_public_key().to_bytes())?;
        let owner_push = push_bytes(&values.owner_public_key().to_bytes())?;

        let script = Builder::new()
            .push_opcode(hash_op)
            .push_slice(secret_hash_push)
            .push_opcode(OP_EQUALVERIFY)
            .push_slice(recipient_push.clone())
            .push_opcode(OP_EQUAL)
            .push_opcode(OP_IF)
            .push_slice(recipient_push)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ELSE)
            .push_int(values.lock_time().to_consensus_u32() as i64)
            .push_opcode(OP_CHECKLOCKTIMEVERIFY)
            .push_opcode(OP_DROP)
            .push_slice(owner_push)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ENDIF)
            .into_script();

        Ok(script)
    }
}

fn push_bytes(data: &[u8]) -> Result<PushBytesBuf, SwapError> {
    PushBytesBuf::try_from(data.to_vec())
        .map_err(|e| SwapError::InvariantViolated(format!("data too long to push: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::{PublicKey as SecpPublicKey, Secp256k1, SecretKey};
    use bitcoin::PublicKey;

    fn compressed_pubkey(byte: u8) -> PublicKey {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[byte; 32]).unwrap();
        PublicKey::new(SecpPublicKey::from_secret_key(&secp, &sk))
    }

    fn script_num_le(n: i64) -> Vec<u8> {
        if n == 0 {
            return vec![];
        }
        let neg = n < 0;
        let mut absval = n.unsigned_abs();
        let mut out = Vec::new();
        while absval > 0 {
            out.push((absval & 0xff) as u8);
            absval >>= 8;
        }
        if out.last().copied().unwrap_or(0) & 0x80 != 0 {
            out.push(if neg { 0x80 } else { 0x00 });
        } else if neg {
            *out.last_mut().unwrap() |= 0x80;
        }
        out
    }

    fn sample_values(hash_name: HashAlgorithm) -> ScriptValues {
        let secret_hash = vec![0xc0u8; hash_name.digest_len()];
        ScriptValues::new(
            secret_hash,
            compressed_pubkey(0xaa),
            compressed_pubkey(0xbb),
            1_700_000_000,
            hash_name,
        )
        .unwrap()
    }

    #[test]
    fn script_bytes_match_the_documented_opcode_sequence() {
        let values = sample_values(HashAlgorithm::Ripemd160);
        let script = ScriptBuilder::redeem_script(&values).unwrap();
        let bytes = script.to_bytes();

        let mut expected = Vec::new();
        expected.push(0xa6); // OP_RIPEMD160
        expected.push(20);
        expected.extend_from_slice(values.secret_hash());
        expected.push(0x88); // OP_EQUALVERIFY
        expected.push(33);
        expected.extend_from_slice(&values.recipient_public_key().to_bytes());
        expected.push(0x87); // OP_EQUAL
        expected.push(0x63); // OP_IF
        expected.push(33);
        expected.extend_from_slice(&values.recipient_public_key().to_bytes());
        expected.push(0xac); // OP_CHECKSIG
        expected.push(0x67); // OP_ELSE
        let num = script_num_le(1_700_000_000);
        expected.push(num.len() as u8);
        expected.extend_from_slice(&num);
        expected.push(0xb1); // OP_CHECKLOCKTIMEVERIFY
        expected.push(0x75); // OP_DROP
        expected.push(33);
        expected.extend_from_slice(&values.owner_public_key().to_bytes());
        expected.push(0xac); // OP_CHECKSIG
        expected.push(0x68); // OP_ENDIF

        assert_eq!(bytes, expected);
    }

    #[test]
    fn sha256_variant_uses_op_sha256_and_32_byte_hash() {
        let values = sample_values(HashAlgorithm::Sha256);
        let script = ScriptBuilder::redeem_script(&values).unwrap();
        let bytes = script.to_bytes();
        assert_eq!(bytes[0], 0xa8); // OP_SHA256
        assert_eq!(bytes[1], 32);
    }

    #[test]
    fn build_is_deterministic() {
        let values = sample_values(HashAlgorithm::Ripemd160);
        let (script_a, address_a) = ScriptBuilder::build(&values, Network::Testnet).unwrap();
        let (script_b, address_b) = ScriptBuilder::build(&values, Network::Testnet).unwrap();
        assert_eq!(script_a, script_b);
        assert_eq!(address_a, address_b);
    }

    #[test]
    fn equal_script_values_yield_equal_addresses() {
        let v1 = sample_values(HashAlgorithm::Ripemd160);
        let v2 = sample_values(HashAlgorithm::Ripemd160);
        let (script1, addr1) = ScriptBuilder::build(&v1, Network::Mainnet).unwrap();
        let (script2, addr2) = ScriptBuilder::build(&v2, Network::Mainnet).unwrap();
        assert_eq!(script1, script2);
        assert_eq!(addr1, addr2);
    }

    #[test]
    fn testnet_address_uses_testnet_p2sh_prefix() {
        let values = sample_values(HashAlgorithm::Ripemd160);
        let (_, address) = ScriptBuilder::build(&values, Network::Testnet).unwrap();
        // Testnet P2SH addresses (version byte 0xC4) always render with
        // a leading '2' under Base58Check.
        assert!(address.to_string().starts_with('2'));
    }

    #[test]
    fn mainnet_address_uses_mainnet_p2sh_prefix() {
        let values = sample_values(HashAlgorithm::Ripemd160);
        let (_, address) = ScriptBuilder::build(&values, Network::Mainnet).unwrap();
        // Mainnet P2SH addresses (version byte 0x05) always render with
        // a leading '3'.
        assert!(address.to_string().starts_with('3'));
    }
}
