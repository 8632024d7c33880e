//! Shared data types crossing the `ChainGateway`/`FeeOracle` boundary
//! (spec §3, §6).

use bitcoin::Txid;
use serde::{Deserialize, Serialize};

/// An unspent output, as reported by a [`crate::chain_gateway::ChainGateway`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unspent {
    pub txid: Txid,
    pub vout: u32,
    pub satoshis: u64,
    /// Absent confirmations means "unconfirmed" for the purposes of
    /// [`crate::confidence::ConfidenceFilter`] — not "unknown".
    pub confirmations: Option<u32>,
}

impl Unspent {
    pub fn is_confirmed(&self) -> bool {
        self.confirmations.unwrap_or(0) > 0
    }
}

/// Metadata about a transaction, as reported by a
/// [`crate::chain_gateway::ChainGateway`]. Optional end-to-end: its
/// absence must not be fatal to confidence estimation (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInfo {
    pub txid: Txid,
    pub sender_address: Option<String>,
    pub fees: Option<u64>,
    pub size: Option<u64>,
    pub confirmations: u32,
}

/// A prior spend of an HTLC address, as reported by the optional
/// withdraw-detector probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRecord {
    pub address: String,
    pub txid: Txid,
}

/// Transaction speed tiers a [`crate::fee_oracle::FeeOracle`] can be
/// asked to quote for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeSpeed {
    Slow,
    Normal,
    Fast,
}

/// The purpose a fee quote is being requested for. The source queries
/// the oracle with `method: "swap"` for every call; spec §9's Open
/// Question is whether this should vary between funding and redeeming.
/// This crate keeps one policy (see DESIGN.md) and exposes it as an
/// explicit enum rather than a free-form string, so new call sites
/// can't silently typo a method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeMethod {
    Swap,
}

/// A fee quote request, mirroring spec §6's
/// `{inSatoshis, speed, address, method, txSize?}`.
#[derive(Debug, Clone)]
pub struct FeeEstimateRequest {
    pub in_satoshis: u64,
    pub speed: FeeSpeed,
    pub address: String,
    pub method: FeeMethod,
    pub tx_size: Option<u64>,
}

/// Dust threshold in satoshis, and the constant fee a
/// [`crate::fee_oracle::DefaultFeeOracle`] returns when no oracle is
/// configured (spec §4.2 — documented as degraded behavior).
pub const DUST_THRESHOLD_SATOSHIS: u64 = 546;

/// Confirmations-matching sequence number the Redeemer uses for its
/// single HTLC input: final, but still CLTV-enforcement-eligible
/// (0xFFFFFFFF would disable `nLockTime` outright). Spec §4.6 step 5.
pub const CLTV_ELIGIBLE_SEQUENCE: u32 = 0xFFFF_FFFE;

/// Satoshis per whole bitcoin, used at the one decimal/integer
/// boundary this crate has (`Funder::fund`'s `amount_btc` parameter).
pub const SATOSHIS_PER_BTC: f64 = 100_000_000.0;
