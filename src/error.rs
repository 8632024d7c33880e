//! Error kinds surfaced by the HTLC engine (spec §7).
//!
//! `SwapError` is the crate-wide error returned by every public
//! operation. `GatewayError` is the narrower error type a
//! [`crate::chain_gateway::ChainGateway`] implementation returns; it is
//! folded into `SwapError::Gateway` at each component boundary.

use bitcoin::Txid;
use thiserror::Error;

/// Error returned by a [`crate::chain_gateway::ChainGateway`] or
/// [`crate::fee_oracle::FeeOracle`] implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid txid: {0}")]
    InvalidTxid(String),
    #[error("the funding transaction has not reached its locktime yet")]
    NonFinal,
    #[error(transparent)]
    Other(#[from] eyre::Report),
}

/// Every error this crate's public operations can return.
///
/// Non-retryable kinds (`InsufficientFunds`, `AddressEmpty`,
/// `ScriptMismatch`, `InvariantViolated`) mean the caller must change
/// something before trying again. `TimelockNotMature` and `TxNotFound`
/// are retryable after a delay. `Gateway` carries whatever the
/// transport/backend reported; the core never retries on its own
/// (spec §7).
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("insufficient funds: have {total} sat, need {requested} sat + {fee} sat fee")]
    InsufficientFunds { total: u64, fee: u64, requested: u64 },

    #[error("HTLC address holds zero satoshis")]
    AddressEmpty,

    #[error("timelock has not matured yet, try later")]
    TimelockNotMature,

    #[error("transaction {txid} was broadcast but is not yet observable")]
    TxNotFound { txid: Txid },

    #[error("script mismatch: {0}")]
    ScriptMismatch(String),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("invariant violated: {0}")]
    InvariantViolated(String),
}

impl SwapError {
    /// True when a caller may reasonably retry the same call later
    /// (possibly after the condition the error describes has cleared).
    pub fn is_retryable(&self) -> bool {
        matches!(self, SwapError::TimelockNotMature | SwapError::TxNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, SwapError>;
