//! Key management (spec §6).
//!
//! `Keyring` is the seam between the HTLC engine and wherever private
//! keys actually live. Two concrete implementations are provided:
//! [`LocalKeyring`] (a bare secp256k1 keypair) and [`MnemonicKeyring`]
//! (BIP-39 mnemonic + BIP-32 derivation path, loaded from TOML — the
//! same shape of configuration the reference wallet used, minus the
//! full wallet/UTXO-tracking machinery this crate doesn't need).

use std::path::Path;

use bip39::Mnemonic;
use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::secp256k1::{Message, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Address, PrivateKey, PublicKey, ScriptBuf, Transaction};
use eyre::{eyre, Result as EyreResult};
use serde::Deserialize;

use crate::error::SwapError;
use crate::network::Network;

/// Signs legacy (non-segwit) inputs and exposes the address/public key
/// the HTLC engine compiles scripts against.
pub trait Keyring: Send + Sync {
    /// The P2PKH address funds are expected to arrive at / be spent
    /// from.
    fn address(&self, network: Network) -> Address;

    /// The compressed public key backing `address`.
    fn public_key(&self) -> PublicKey;

    /// Produces a legacy `SIGHASH_ALL` signature (DER-encoded, with the
    /// sighash type byte appended) for `input_index` of `tx`, sighashing
    /// against `script_pubkey` (the input's previous output's script,
    /// or the HTLC redeem script for a redeeming transaction).
    fn sign_legacy_input(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkey: &ScriptBuf,
    ) -> Result<Vec<u8>, SwapError>;

    /// WIF-encoded private key, for operators exporting backups.
    fn private_key_wif(&self, network: Network) -> String;
}

/// A keyring backed directly by a raw secp256k1 private key.
pub struct LocalKeyring {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl LocalKeyring {
    pub fn new(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::new(secret_key.public_key(&secp));
        Self { secret_key, public_key }
    }

    pub fn from_wif(wif: &str) -> Result<Self, SwapError> {
        let private_key = PrivateKey::from_wif(wif)
            .map_err(|e| SwapError::InvariantViolated(format!("invalid WIF: {e}")))?;
        Ok(Self::new(private_key.inner))
    }
}

impl Keyring for LocalKeyring {
    fn address(&self, network: Network) -> Address {
        Address::p2pkh(self.public_key, network.to_bitcoin())
    }

    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    fn sign_legacy_input(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkey: &ScriptBuf,
    ) -> Result<Vec<u8>, SwapError> {
        sign_legacy_input_with(&self.secret_key, tx, input_index, script_pubkey)
    }

    fn private_key_wif(&self, network: Network) -> String {
        PrivateKey::new(self.secret_key, network.to_bitcoin()).to_wif()
    }
}

/// A keyring derived from a BIP-39 mnemonic, loaded from a TOML file in
/// the same shape the reference wallet configuration used.
#[derive(Debug, Deserialize)]
struct MnemonicConfig {
    keys: MnemonicKeyConfig,
}

#[derive(Debug, Deserialize)]
struct MnemonicKeyConfig {
    mnemonic: String,
    derivation_path: String,
}

pub struct MnemonicKeyring {
    inner: LocalKeyring,
}

impl MnemonicKeyring {
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> EyreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(eyre!("keyring configuration file not found: {}", path.display()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: MnemonicConfig = toml::from_str(&contents)?;
        Self::from_mnemonic(&config.keys.mnemonic, &config.keys.derivation_path)
    }

    pub fn from_mnemonic(mnemonic: &str, derivation_path: &str) -> EyreResult<Self> {
        let mnemonic = Mnemonic::parse(mnemonic)?;
        let seed = mnemonic.to_seed("");
        let root = Xpriv::new_master(bitcoin::NetworkKind::Test, &seed)?;
        let path: DerivationPath = derivation_path
            .parse()
            .map_err(|e| eyre!("invalid derivation path: {e}"))?;
        let secp = Secp256k1::new();
        let derived = root.derive_priv(&secp, &path)?;
        Ok(Self { inner: LocalKeyring::new(derived.private_key) })
    }
}

impl Keyring for MnemonicKeyring {
    fn address(&self, network: Network) -> Address {
        self.inner.address(network)
    }

    fn public_key(&self) -> PublicKey {
        self.inner.public_key()
    }

    fn sign_legacy_input(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkey: &ScriptBuf,
    ) -> Result<Vec<u8>, SwapError> {
        self.inner.sign_legacy_input(tx, input_index, script_pubkey)
    }

    fn private_key_wif(&self, network: Network) -> String {
        self.inner.private_key_wif(network)
    }
}

fn sign_legacy_input_with(
    secret_key: &SecretKey,
    tx: &Transaction,
    input_index: usize,
    script_pubkey: &ScriptBuf,
) -> Result<Vec<u8>, SwapError> {
    let secp = Secp256k1::new();
    let mut cache = SighashCache::new(tx);
    let sighash = cache
        .legacy_signature_hash(input_index, script_pubkey, EcdsaSighashType::All.to_u32())
        .map_err(|e| SwapError::InvariantViolated(format!("sighash computation failed: {e}")))?;
    let message = Message::from_digest_slice(sighash.as_ref())
        .map_err(|e| SwapError::InvariantViolated(format!("invalid sighash digest: {e}")))?;
    let signature = secp.sign_ecdsa(&message, secret_key);
    let mut der = signature.serialize_der().to_vec();
    der.push(EcdsaSighashType::All as u8);
    Ok(der)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyring() -> LocalKeyring {
        LocalKeyring::new(SecretKey::from_slice(&[7u8; 32]).unwrap())
    }

    #[test]
    fn address_and_public_key_are_stable() {
        let keyring = keyring();
        let address_a = keyring.address(Network::Testnet);
        let address_b = keyring.address(Network::Testnet);
        assert_eq!(address_a, address_b);
        assert!(keyring.public_key().compressed);
    }

    #[test]
    fn wif_round_trips_through_from_wif() {
        let keyring = keyring();
        let wif = keyring.private_key_wif(Network::Testnet);
        let restored = LocalKeyring::from_wif(&wif).unwrap();
        assert_eq!(restored.public_key(), keyring.public_key());
    }
}
