//! The chain-access boundary (spec §4, §6).
//!
//! `ChainGateway` is the single seam between the HTLC engine and a live
//! Bitcoin-like backend. Three methods are load-bearing for every
//! operation; two are optional capabilities that degrade gracefully
//! when a backend can't offer them — callers branch on `None` rather
//! than relying on an installed no-op to mask the degradation (spec
//! §9, "capability detection").

use async_trait::async_trait;
use bitcoin::{Address, Transaction, Txid};

use crate::error::GatewayError;
use crate::types::{TxInfo, Unspent, WithdrawRecord};

#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Total satoshis held at `address`, summed across all of its
    /// unspent outputs (spec §4.4, §4.6's zero-balance check).
    async fn fetch_balance(&self, address: &Address) -> Result<u64, GatewayError>;

    /// The unspent outputs at `address`, used by [`crate::funder::Funder`]
    /// to select inputs and by [`crate::confidence::ConfidenceFilter`]
    /// to read confirmation counts.
    async fn fetch_unspents(&self, address: &Address) -> Result<Vec<Unspent>, GatewayError>;

    /// Submits `tx` to the network and returns its txid.
    async fn broadcast_tx(&self, tx: &Transaction) -> Result<Txid, GatewayError>;

    /// Metadata for a previously broadcast transaction, used by
    /// [`crate::confidence::ConfidenceFilter`] to weigh an unconfirmed
    /// funding transaction's fee rate, and by
    /// [`crate::redeemer::Redeemer`] to confirm a redeem went through.
    ///
    /// Backends that can't serve this return `Ok(None)`: an absent
    /// `TxInfo` degrades confidence to confirmations-only rather than
    /// failing the call outright.
    async fn fetch_tx_info(&self, _txid: &Txid) -> Result<Option<TxInfo>, GatewayError> {
        Ok(None)
    }

    /// Whether `address` has already been spent from, and by which
    /// transaction — used by [`crate::redeemer::Redeemer`] to treat a
    /// repeat withdraw/refund call as idempotent rather than an error.
    ///
    /// Backends that can't serve this return `Ok(None)`: the Redeemer
    /// then falls through to its normal balance check instead of
    /// short-circuiting on a known prior spend.
    async fn check_withdraw(&self, _address: &Address) -> Result<Option<WithdrawRecord>, GatewayError> {
        Ok(None)
    }
}
