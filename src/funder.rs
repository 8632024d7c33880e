//! Constructing and broadcasting the funding transaction (spec §4.5).

use bitcoin::absolute::LockTime;
use bitcoin::{Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use tracing::{info, instrument};

use crate::chain_gateway::ChainGateway;
use crate::error::SwapError;
use crate::fee_oracle::FeeOracle;
use crate::keyring::Keyring;
use crate::network::Network;
use crate::types::{FeeEstimateRequest, FeeMethod, FeeSpeed, SATOSHIS_PER_BTC};

/// Builds a transaction moving `amount_btc` from the owner's P2PKH
/// address to the HTLC address, with an unconditional change output
/// back to the owner.
pub struct Funder;

impl Funder {
    /// Spec §4.5's seven steps:
    /// 1. Derive the owner's funding address from `owner_keyring`.
    /// 2. Fetch that address's unspent outputs.
    /// 3. Compute the satoshis to send (`fundValue`) and the fee
    ///    (`feeValue`), failing with [`SwapError::InsufficientFunds`] if
    ///    the available total can't cover both.
    /// 4. Add every fetched UTXO as an input — no coin selection.
    /// 5. Build the HTLC output and an unconditional change output of
    ///    `T − fundValue − feeValue`, where `T` is the sum of every
    ///    fetched UTXO — even a dust-sized change output is still
    ///    emitted, so the owner's remaining balance is never silently
    ///    donated to miners.
    /// 6. Sign every input with `SIGHASH_ALL` against its own P2PKH
    ///    `scriptPubkey`.
    /// 7. Serialize, optionally hand the txid to `on_txid` before
    ///    broadcasting (so a caller can persist it first), then
    ///    broadcast.
    #[instrument(skip(owner_keyring, gateway, fee_oracle, on_txid))]
    #[allow(clippy::too_many_arguments)]
    pub async fn fund(
        owner_keyring: &dyn Keyring,
        htlc_address: &Address,
        amount_btc: f64,
        network: Network,
        gateway: &dyn ChainGateway,
        fee_oracle: &dyn FeeOracle,
        on_txid: Option<&mut dyn FnMut(Txid)>,
    ) -> Result<Txid, SwapError> {
        let owner_address = owner_keyring.address(network);
        let unspents = gateway.fetch_unspents(&owner_address).await?;

        let fund_value = (amount_btc * SATOSHIS_PER_BTC).round() as u64;
        let fee_value = fee_oracle
            .estimate(FeeEstimateRequest {
                in_satoshis: fund_value,
                speed: FeeSpeed::Normal,
                address: htlc_address.to_string(),
                method: FeeMethod::Swap,
                tx_size: None,
            })
            .await
            .map_err(SwapError::Gateway)?;

        let required = fund_value + fee_value;
        let total_available: u64 = unspents.iter().map(|u| u.satoshis).sum();
        if total_available < required {
            return Err(SwapError::InsufficientFunds {
                total: total_available,
                fee: fee_value,
                requested: fund_value,
            });
        }

        let change_value = total_available - required;

        let owner_script_pubkey = owner_address.script_pubkey();
        let inputs: Vec<TxIn> = unspents
            .iter()
            .map(|unspent| TxIn {
                previous_output: OutPoint { txid: unspent.txid, vout: unspent.vout },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect();

        let outputs = vec![
            TxOut { value: Amount::from_sat(fund_value), script_pubkey: htlc_address.script_pubkey() },
            TxOut { value: Amount::from_sat(change_value), script_pubkey: owner_script_pubkey.clone() },
        ];

        let mut tx =
            Transaction { version: bitcoin::transaction::Version::TWO, lock_time: LockTime::ZERO, input: inputs, output: outputs };

        for index in 0..tx.input.len() {
            let signature = owner_keyring.sign_legacy_input(&tx, index, &owner_script_pubkey)?;
            let script_sig = bitcoin::script::Builder::new()
                .push_slice(
                    bitcoin::script::PushBytesBuf::try_from(signature)
                        .map_err(|e| SwapError::InvariantViolated(format!("signature too long: {e}")))?,
                )
                .push_key(&owner_keyring.public_key())
                .into_script();
            tx.input[index].script_sig = script_sig;
        }

        let txid = tx.compute_txid();
        if let Some(callback) = on_txid {
            callback(txid);
        }

        info!(%txid, fund_value, fee_value, change_value, "broadcasting funding transaction");
        gateway.broadcast_tx(&tx).await?;
        Ok(txid)
    }
}
