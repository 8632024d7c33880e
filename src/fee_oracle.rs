//! Fee estimation (spec §4.2).

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{FeeEstimateRequest, DUST_THRESHOLD_SATOSHIS};

/// Quotes a fee, in satoshis, for a prospective transaction.
///
/// Kept as its own trait rather than folded into [`crate::chain_gateway::ChainGateway`]
/// so a caller can swap fee policy independently of the chain backend —
/// and so [`DefaultFeeOracle`] can stand in as a documented degraded
/// fallback rather than a silent no-op.
#[async_trait]
pub trait FeeOracle: Send + Sync {
    async fn estimate(&self, request: FeeEstimateRequest) -> Result<u64, GatewayError>;
}

/// The fallback oracle used when no oracle is configured: a flat
/// dust-threshold fee (spec §4.2, "Default when no oracle is
/// configured"). Intentionally ignores `speed` and `tx_size` — callers
/// that need a real estimate must configure a real oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFeeOracle;

#[async_trait]
impl FeeOracle for DefaultFeeOracle {
    async fn estimate(&self, _request: FeeEstimateRequest) -> Result<u64, GatewayError> {
        Ok(DUST_THRESHOLD_SATOSHIS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeeSpeed;

    #[tokio::test]
    async fn default_oracle_always_returns_the_dust_threshold() {
        let oracle = DefaultFeeOracle;
        let request = FeeEstimateRequest {
            in_satoshis: 100_000,
            speed: FeeSpeed::Fast,
            address: "2NBFNJTktNa7GZusGbDbGKRZTxdK9VVez3n".into(),
            method: crate::types::FeeMethod::Swap,
            tx_size: Some(250),
        };
        let fee = oracle.estimate(request).await.unwrap();
        assert_eq!(fee, DUST_THRESHOLD_SATOSHIS);
    }
}
