//! Reference `ChainGateway`/`FeeOracle` backed by a Bitcoin Core node
//! over RPC, modeled on the reference blockchain client's connection
//! setup.

use async_trait::async_trait;
use bitcoincore_rpc::{Auth, Client, RpcApi};
use tracing::{debug, instrument};

use crate::chain_gateway::ChainGateway;
use crate::error::GatewayError;
use crate::fee_oracle::FeeOracle;
use crate::types::{FeeEstimateRequest, TxInfo, Unspent, WithdrawRecord};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8332";

/// Connection parameters for a Bitcoin Core RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self { url: DEFAULT_RPC_URL.to_string(), username: String::new(), password: String::new() }
    }
}

/// A [`ChainGateway`] talking to a real node. Minimum confirmations
/// for `fetch_unspents`/`fetch_balance` is zero — this gateway reports
/// unconfirmed outputs too; it is `ConfidenceFilter`'s job, not this
/// gateway's, to decide how much to trust them.
pub struct RpcChainGateway {
    client: Client,
}

impl RpcChainGateway {
    pub fn connect(config: RpcConfig) -> Result<Self, GatewayError> {
        let auth = Auth::UserPass(config.username, config.password);
        let client = Client::new(&config.url, auth).map_err(|e| GatewayError::Rpc(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChainGateway for RpcChainGateway {
    #[instrument(skip(self))]
    async fn fetch_balance(&self, address: &bitcoin::Address) -> Result<u64, GatewayError> {
        let unspents = self.fetch_unspents(address).await?;
        Ok(unspents.iter().map(|u| u.satoshis).sum())
    }

    #[instrument(skip(self))]
    async fn fetch_unspents(&self, address: &bitcoin::Address) -> Result<Vec<Unspent>, GatewayError> {
        let checked = address
            .clone()
            .require_network(address.network())
            .map_err(|e| GatewayError::InvalidAddress(e.to_string()))?;
        let list_unspent = self
            .client
            .list_unspent(Some(0), None, Some(&[&checked]), None, None)
            .map_err(|e| GatewayError::Rpc(e.to_string()))?;

        Ok(list_unspent
            .into_iter()
            .map(|entry| Unspent {
                txid: entry.txid,
                vout: entry.vout,
                satoshis: entry.amount.to_sat(),
                confirmations: Some(entry.confirmations),
            })
            .collect())
    }

    #[instrument(skip(self, tx))]
    async fn broadcast_tx(&self, tx: &bitcoin::Transaction) -> Result<bitcoin::Txid, GatewayError> {
        debug!(txid = %tx.compute_txid(), "submitting transaction via rpc");
        self.client.send_raw_transaction(tx).map_err(|e| {
            if e.to_string().contains("non-final") {
                GatewayError::NonFinal
            } else {
                GatewayError::Rpc(e.to_string())
            }
        })
    }

    #[instrument(skip(self))]
    async fn fetch_tx_info(&self, txid: &bitcoin::Txid) -> Result<Option<TxInfo>, GatewayError> {
        match self.client.get_transaction(txid, None) {
            Ok(info) => Ok(Some(TxInfo {
                txid: *txid,
                sender_address: None,
                fees: info.fee.map(|a| a.to_sat().unsigned_abs()),
                size: None,
                confirmations: info.info.confirmations.max(0) as u32,
            })),
            Err(_) => Ok(None),
        }
    }

    // Detecting a prior spend needs either a full txindex or
    // scantxoutset, neither of which this client wires up; falls back
    // to the trait's default (`Ok(None)`) so callers treat the
    // capability as absent rather than getting a false negative.
}

#[async_trait]
impl FeeOracle for RpcChainGateway {
    async fn estimate(&self, request: FeeEstimateRequest) -> Result<u64, GatewayError> {
        let target = match request.speed {
            crate::types::FeeSpeed::Fast => 1,
            crate::types::FeeSpeed::Normal => 6,
            crate::types::FeeSpeed::Slow => 24,
        };
        let estimate = self
            .client
            .estimate_smart_fee(target, None)
            .map_err(|e| GatewayError::Rpc(e.to_string()))?;
        let fee_rate_btc_per_kvb = estimate
            .fee_rate
            .ok_or_else(|| GatewayError::Rpc("node has insufficient data for a fee estimate".into()))?;
        let size = request.tx_size.unwrap_or(250);
        let sat_per_kvb = fee_rate_btc_per_kvb.to_sat();
        Ok((sat_per_kvb * size) / 1000)
    }
}
