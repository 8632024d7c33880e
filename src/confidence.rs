//! Confidence-weighted acceptance of unconfirmed funding outputs (spec §4.3).

use crate::chain_gateway::ChainGateway;
use crate::error::SwapError;
use crate::fee_oracle::FeeOracle;
use crate::types::{FeeEstimateRequest, FeeMethod, FeeSpeed, Unspent};

/// Computes how much to trust an unconfirmed output without waiting
/// for a confirmation, so a swap can proceed on unconfirmed funding
/// when its fee rate is competitive enough to expect prompt inclusion.
///
/// Algorithm (spec §4.3):
/// 1. Any confirmation at all (`confirmations > 0`) is full confidence.
/// 2. Otherwise, fetch the funding transaction's info. If it carries a
///    fee and a sender address, confidence is `min(1.0, fees / fast_fee)`
///    — the unconfirmed transaction's fee rate relative to a fast-fee
///    quote for the sender's address.
/// 3. If transaction info, its fee, or its sender address is
///    unavailable, confidence is 0 — the engine can't assess
///    double-spend risk and falls back to waiting for a real
///    confirmation.
///
/// Also exposes [`ConfidenceFilter::confident_total`], the filtered sum
/// `ScriptChecker` (§4.4) compares `expectedValue` against: the total
/// satoshis held by UTXOs whose confidence clears a threshold, not the
/// single highest-confidence UTXO.
pub struct ConfidenceFilter;

impl ConfidenceFilter {
    pub async fn confidence(
        unspent: &Unspent,
        gateway: &dyn ChainGateway,
        fee_oracle: &dyn FeeOracle,
    ) -> Result<f64, SwapError> {
        if unspent.is_confirmed() {
            return Ok(1.0);
        }

        let tx_info = gateway.fetch_tx_info(&unspent.txid).await?;
        let Some(tx_info) = tx_info else {
            return Ok(0.0);
        };
        let Some(fees) = tx_info.fees else {
            return Ok(0.0);
        };
        let Some(sender_address) = tx_info.sender_address else {
            return Ok(0.0);
        };

        let fast_fee = fee_oracle
            .estimate(FeeEstimateRequest {
                in_satoshis: unspent.satoshis,
                speed: FeeSpeed::Fast,
                address: sender_address,
                method: FeeMethod::Swap,
                tx_size: tx_info.size,
            })
            .await?;

        if fast_fee == 0 {
            return Ok(0.0);
        }

        Ok((fees as f64 / fast_fee as f64).min(1.0))
    }

    /// Sum of satoshis across `unspents` whose individual confidence is
    /// `≥ threshold` — the `confident-total` §4.4's soundness property
    /// compares `expectedValue` against.
    pub async fn confident_total(
        unspents: &[Unspent],
        threshold: f64,
        gateway: &dyn ChainGateway,
        fee_oracle: &dyn FeeOracle,
    ) -> Result<u64, SwapError> {
        let mut total = 0u64;
        for unspent in unspents {
            let confidence = Self::confidence(unspent, gateway, fee_oracle).await?;
            if confidence >= threshold {
                total += unspent.satoshis;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use async_trait::async_trait;
    use bitcoin::{Address, Transaction, Txid};
    use std::str::FromStr;

    struct MockGateway {
        tx_info: Option<crate::types::TxInfo>,
    }

    #[async_trait]
    impl ChainGateway for MockGateway {
        async fn fetch_balance(&self, _address: &Address) -> Result<u64, GatewayError> {
            Ok(0)
        }
        async fn fetch_unspents(&self, _address: &Address) -> Result<Vec<Unspent>, GatewayError> {
            Ok(vec![])
        }
        async fn broadcast_tx(&self, _tx: &Transaction) -> Result<Txid, GatewayError> {
            unimplemented!()
        }
        async fn fetch_tx_info(&self, _txid: &Txid) -> Result<Option<crate::types::TxInfo>, GatewayError> {
            Ok(self.tx_info.clone())
        }
    }

    struct MockFeeOracle {
        fee: u64,
    }

    #[async_trait]
    impl FeeOracle for MockFeeOracle {
        async fn estimate(&self, _request: FeeEstimateRequest) -> Result<u64, GatewayError> {
            Ok(self.fee)
        }
    }

    fn txid() -> Txid {
        Txid::from_str(&format!("{}{}", "0".repeat(62), "aa")).unwrap()
    }

    #[tokio::test]
    async fn confirmed_output_has_full_confidence() {
        let unspent = Unspent { txid: txid(), vout: 0, satoshis: 10_000, confirmations: Some(1) };
        let gateway = MockGateway { tx_info: None };
        let oracle = MockFeeOracle { fee: 1000 };
        let confidence = ConfidenceFilter::confidence(&unspent, &gateway, &oracle).await.unwrap();
        assert_eq!(confidence, 1.0);
    }

    #[tokio::test]
    async fn unconfirmed_without_tx_info_has_zero_confidence() {
        let unspent = Unspent { txid: txid(), vout: 0, satoshis: 10_000, confirmations: None };
        let gateway = MockGateway { tx_info: None };
        let oracle = MockFeeOracle { fee: 1000 };
        let confidence = ConfidenceFilter::confidence(&unspent, &gateway, &oracle).await.unwrap();
        assert_eq!(confidence, 0.0);
    }

    #[tokio::test]
    async fn unconfirmed_without_sender_address_has_zero_confidence() {
        let unspent = Unspent { txid: txid(), vout: 0, satoshis: 10_000, confirmations: Some(0) };
        let gateway = MockGateway {
            tx_info: Some(crate::types::TxInfo {
                txid: txid(),
                sender_address: None,
                fees: Some(500),
                size: Some(200),
                confirmations: 0,
            }),
        };
        let oracle = MockFeeOracle { fee: 1000 };
        let confidence = ConfidenceFilter::confidence(&unspent, &gateway, &oracle).await.unwrap();
        assert_eq!(confidence, 0.0);
    }

    #[tokio::test]
    async fn unconfirmed_with_competitive_fee_scales_toward_one() {
        let unspent = Unspent { txid: txid(), vout: 0, satoshis: 10_000, confirmations: Some(0) };
        let gateway = MockGateway {
            tx_info: Some(crate::types::TxInfo {
                txid: txid(),
                sender_address: Some("mxxSenderAddressxxxxxxxxxxxxxxxxxxx".into()),
                fees: Some(500),
                size: Some(200),
                confirmations: 0,
            }),
        };
        let oracle = MockFeeOracle { fee: 1000 };
        let confidence = ConfidenceFilter::confidence(&unspent, &gateway, &oracle).await.unwrap();
        assert_eq!(confidence, 0.5);
    }

    #[tokio::test]
    async fn unconfirmed_fee_above_fast_fee_caps_at_one() {
        let unspent = Unspent { txid: txid(), vout: 0, satoshis: 10_000, confirmations: Some(0) };
        let gateway = MockGateway {
            tx_info: Some(crate::types::TxInfo {
                txid: txid(),
                sender_address: Some("mxxSenderAddressxxxxxxxxxxxxxxxxxxx".into()),
                fees: Some(5000),
                size: Some(200),
                confirmations: 0,
            }),
        };
        let oracle = MockFeeOracle { fee: 1000 };
        let confidence = ConfidenceFilter::confidence(&unspent, &gateway, &oracle).await.unwrap();
        assert_eq!(confidence, 1.0);
    }

    #[tokio::test]
    async fn confident_total_sums_only_utxos_clearing_the_threshold() {
        let strong_txid = txid();
        let gateway = MockGateway {
            tx_info: Some(crate::types::TxInfo {
                txid: strong_txid,
                sender_address: Some("mxxSenderAddressxxxxxxxxxxxxxxxxxxx".into()),
                fees: Some(200),
                size: Some(200),
                confirmations: 0,
            }),
        };
        let oracle = MockFeeOracle { fee: 1000 };
        let unspents = vec![
            Unspent { txid: strong_txid, vout: 0, satoshis: 10_000, confirmations: Some(1) },
            Unspent { txid: strong_txid, vout: 1, satoshis: 5_000, confirmations: Some(0) },
        ];
        let total = ConfidenceFilter::confident_total(&unspents, 0.95, &gateway, &oracle).await.unwrap();
        assert_eq!(total, 10_000, "only the confirmed utxo clears a 0.95 threshold");
    }
}
