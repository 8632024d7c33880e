//! The Bitcoin side of a cross-chain atomic swap engine: constructing,
//! funding, verifying, and redeeming HTLC (hash-time-locked-contract)
//! outputs on a Bitcoin-like UTXO chain.
//!
//! The library is a set of components wired together by the caller,
//! not a standalone service: [`ScriptBuilder`](script_builder::ScriptBuilder)
//! compiles an HTLC's redeem script and P2SH address,
//! [`Funder`](funder::Funder) pays into it,
//! [`ScriptChecker`](script_checker::ScriptChecker) verifies a
//! counterparty's claimed HTLC address before funding it, and
//! [`Redeemer`](redeemer::Redeemer) spends it back out, either by
//! revealing the secret or after its timelock matures. Chain access and
//! fee estimation are injected through the [`ChainGateway`](chain_gateway::ChainGateway)
//! and [`FeeOracle`](fee_oracle::FeeOracle) traits so the core stays
//! testable without a live node.

pub mod chain_gateway;
pub mod confidence;
pub mod config;
pub mod error;
pub mod fee_oracle;
pub mod funder;
pub mod gateway_rpc;
pub mod keyring;
pub mod network;
pub mod redeemer;
pub mod script_builder;
pub mod script_checker;
pub mod script_values;
pub mod types;

pub use chain_gateway::ChainGateway;
pub use confidence::ConfidenceFilter;
pub use config::EngineConfig;
pub use error::{GatewayError, Result, SwapError};
pub use fee_oracle::{DefaultFeeOracle, FeeOracle};
pub use funder::Funder;
pub use keyring::{Keyring, LocalKeyring, MnemonicKeyring};
pub use network::Network;
pub use redeemer::{RedeemMode, RedeemOutcome, Redeemer};
pub use script_builder::ScriptBuilder;
pub use script_checker::{Expected, ScriptChecker};
pub use script_values::{HashAlgorithm, ScriptValues};
pub use types::{FeeEstimateRequest, FeeMethod, FeeSpeed, TxInfo, Unspent, WithdrawRecord};
