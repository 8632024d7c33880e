//! Spending an HTLC output, either by revealing the secret (withdraw)
//! or after its timelock matures (refund) — spec §4.6.

use std::time::Duration;

use bitcoin::absolute::LockTime;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use tracing::{info, warn};

use crate::chain_gateway::ChainGateway;
use crate::error::{GatewayError, SwapError};
use crate::fee_oracle::FeeOracle;
use crate::keyring::Keyring;
use crate::network::Network;
use crate::script_builder::ScriptBuilder;
use crate::script_values::ScriptValues;
use crate::types::{FeeEstimateRequest, FeeMethod, FeeSpeed, CLTV_ELIGIBLE_SEQUENCE};

/// Which spending branch of the HTLC redeem script a [`Redeemer`] call
/// takes. Kept as its own enum rather than a bare boolean so a call
/// site reads "withdraw" or "refund", not "true"/"false" — and so a
/// refund's dummy secret is always paired with its own documented
/// variant rather than silently reusing the withdraw path's field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemMode {
    /// Spend via the IF branch: recipient signature + real secret
    /// preimage.
    Withdraw,
    /// Spend via the ELSE branch: owner signature, matured timelock.
    /// The scriptSig still needs a placeholder in the secret's stack
    /// slot — Bitcoin's IF/ELSE evaluates top-down regardless of which
    /// branch executes, so something must occupy that position. It is
    /// never checked on this branch; this crate pushes an explicit,
    /// empty placeholder rather than reusing the withdraw path's secret
    /// field with an implicit "ignored when refunding" meaning.
    Refund,
}

/// Outcome of a [`Redeemer::redeem`] call. `already_withdrawed` is set
/// when the call discovered a prior spend matching the caller's own
/// destination rather than broadcasting a new transaction (spec §8's
/// withdraw-idempotence property, scenario 6) — callers that need to
/// distinguish a fresh broadcast from an idempotent hit must check it
/// rather than assume every returned `txid` is freshly broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemOutcome {
    pub txid: Txid,
    pub already_withdrawed: bool,
}

const REDEEM_CONFIRMATION_WAIT: Duration = Duration::from_secs(10);

pub struct Redeemer;

impl Redeemer {
    /// Spends the HTLC address derived from `values` back to
    /// `destination_keyring`'s address, per spec §4.6:
    /// 1. Derive the HTLC address `A` from `values` (never passed in —
    ///    trusting a caller-supplied address would reopen the same
    ///    soundness gap [`crate::script_checker::ScriptChecker`] exists
    ///    to close).
    /// 2. Fetch `A`'s unspent outputs; `T` is their satoshi sum.
    /// 3. Compute `feeValue` from `fee_oracle`, keyed on `A`.
    /// 4. If `T < feeValue`, the HTLC may already be spent down to
    ///    below what a new transaction could even pay in fees: consult
    ///    the gateway's withdraw detector. A prior spend whose
    ///    recorded destination matches the caller's own destination
    ///    address (case-insensitively) is treated as this same redeem
    ///    having already happened; anything else is `InsufficientFunds`
    ///    (or `AddressEmpty` when `T` is exactly zero).
    /// 5. Set `nLockTime` to the script's lock time for
    ///    [`RedeemMode::Refund`], left at zero for
    ///    [`RedeemMode::Withdraw`] (no timelock applies on that
    ///    branch).
    /// 6. Add every unspent at `A` as an input, sequence
    ///    [`CLTV_ELIGIBLE_SEQUENCE`] so `nLockTime` isn't implicitly
    ///    disabled.
    /// 7. Single output paying `T − feeValue` to the destination.
    /// 8. Sign every input with a legacy sighash over the HTLC redeem
    ///    script, and assemble each input's scriptSig for whichever
    ///    branch `mode` selects.
    /// 9. Broadcast, then wait briefly and confirm the transaction
    ///    becomes observable, translating gateway errors into the
    ///    caller-facing kinds spec §7 describes.
    ///
    /// `secret` is required in both modes: the redeem script's preimage
    /// check (`<HASH_OP> <secretHash> OP_EQUALVERIFY`) runs unconditionally,
    /// before the IF/ELSE branch that picks recipient-vs-owner — a
    /// carried-over limitation of the script this engine compiles (see
    /// DESIGN.md). For [`RedeemMode::Withdraw`] `secret` is the real
    /// preimage; for [`RedeemMode::Refund`] it is a caller-documented
    /// placeholder distinct from the withdraw path's field, never an
    /// implicit reuse of it.
    #[allow(clippy::too_many_arguments)]
    pub async fn redeem(
        values: &ScriptValues,
        destination_keyring: &dyn Keyring,
        secret: &[u8],
        mode: RedeemMode,
        network: Network,
        gateway: &dyn ChainGateway,
        fee_oracle: &dyn FeeOracle,
    ) -> Result<RedeemOutcome, SwapError> {
        let (_, htlc_address) = ScriptBuilder::build(values, network)?;

        let unspents = gateway.fetch_unspents(&htlc_address).await?;
        let total: u64 = unspents.iter().map(|u| u.satoshis).sum();

        let fee_value = fee_oracle
            .estimate(FeeEstimateRequest {
                in_satoshis: total,
                speed: FeeSpeed::Normal,
                address: htlc_address.to_string(),
                method: FeeMethod::Swap,
                tx_size: None,
            })
            .await
            .map_err(SwapError::Gateway)?;

        let destination_address = destination_keyring.address(network);

        if total < fee_value {
            if let Some(record) = gateway.check_withdraw(&htlc_address).await? {
                if record.address.eq_ignore_ascii_case(&destination_address.to_string()) {
                    info!(txid = %record.txid, "htlc already spent to this destination, treating as idempotent");
                    return Ok(RedeemOutcome { txid: record.txid, already_withdrawed: true });
                }
            }
            return Err(if total == 0 {
                SwapError::AddressEmpty
            } else {
                SwapError::InsufficientFunds { total, fee: fee_value, requested: 0 }
            });
        }

        let redeem_script = ScriptBuilder::redeem_script(values)?;

        let lock_time = match mode {
            RedeemMode::Withdraw => LockTime::ZERO,
            RedeemMode::Refund => values.lock_time(),
        };

        let spend_value = total - fee_value;

        let inputs: Vec<TxIn> = unspents
            .iter()
            .map(|unspent| TxIn {
                previous_output: OutPoint { txid: unspent.txid, vout: unspent.vout },
                script_sig: ScriptBuf::new(),
                sequence: Sequence(CLTV_ELIGIBLE_SEQUENCE),
                witness: Witness::new(),
            })
            .collect();

        let mut tx = Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time,
            input: inputs,
            output: vec![TxOut {
                value: Amount::from_sat(spend_value),
                script_pubkey: destination_address.script_pubkey(),
            }],
        };

        // The discriminator picked here is what `<recipientPubKey> OP_EQUAL`
        // compares against: equal selects the IF (recipient/withdraw)
        // branch, unequal falls through to ELSE (owner/refund).
        let discriminator = match mode {
            RedeemMode::Withdraw => values.recipient_public_key().to_bytes(),
            RedeemMode::Refund => values.owner_public_key().to_bytes(),
        };

        for index in 0..tx.input.len() {
            let signature = destination_keyring.sign_legacy_input(&tx, index, &redeem_script)?;
            let script_sig = build_script_sig(&signature, &discriminator, secret, &redeem_script)?;
            tx.input[index].script_sig = script_sig;
        }

        let txid = tx.compute_txid();
        let broadcast_result = gateway.broadcast_tx(&tx).await;
        let txid = match broadcast_result {
            Ok(txid) => txid,
            Err(GatewayError::NonFinal) => return Err(SwapError::TimelockNotMature),
            Err(other) => return Err(SwapError::Gateway(other)),
        };

        tokio::time::sleep(REDEEM_CONFIRMATION_WAIT).await;

        match gateway.fetch_tx_info(&txid).await? {
            Some(_) => Ok(RedeemOutcome { txid, already_withdrawed: false }),
            None => {
                warn!(%txid, "redeem transaction not yet observable after wait");
                Err(SwapError::TxNotFound { txid })
            }
        }
    }
}

/// Assembles the scriptSig for a P2SH redeem. Pushed bottom-to-top:
/// signature (consumed by whichever branch's `OP_CHECKSIG` runs),
/// discriminator (consumed by `<recipientPubKey> OP_EQUAL`'s branch
/// test), secret (consumed by the unconditional `HASH_OP`/`OP_EQUALVERIFY`
/// preimage check) — then the serialized redeem script itself, which
/// P2SH hashes and checks against the output's stored script hash
/// before executing it against this stack.
fn build_script_sig(
    signature: &[u8],
    discriminator: &[u8],
    secret: &[u8],
    redeem_script: &ScriptBuf,
) -> Result<ScriptBuf, SwapError> {
    let push = |data: &[u8]| -> Result<bitcoin::script::PushBytesBuf, SwapError> {
        bitcoin::script::PushBytesBuf::try_from(data.to_vec())
            .map_err(|e| SwapError::InvariantViolated(format!("data too long to push: {e}")))
    };
    let script = bitcoin::script::Builder::new()
        .push_slice(push(signature)?)
        .push_slice(push(discriminator)?)
        .push_slice(push(secret)?)
        .push_slice(push(&redeem_script.to_bytes())?)
        .into_script();
    Ok(script)
}
