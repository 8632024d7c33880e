//! Verifying that a counterparty-supplied set of HTLC terms is safe to
//! fund against (spec §4.4).
//!
//! Four conditions must all hold before a funder commits satoshis to
//! an HTLC a counterparty claims matches a negotiated `expected` deal:
//! 1. `expected.value` must not exceed the HTLC address's total
//!    unspent satoshis — a funder won't be asked to trust a contract
//!    for more than it actually holds.
//! 2. `expected.lockTime` must not exceed the script's own lock time —
//!    the counterparty can't claim a later (more favorable to them)
//!    refund point than the script actually encodes.
//! 3. `expected.recipientPublicKey` must equal the script's recipient
//!    key exactly — the owner and hash algorithm are implicitly
//!    trusted via prior negotiation and aren't re-checked here.
//! 4. `expected.value` must not exceed the *confident* total — the sum
//!    of satoshis held by unspent outputs whose confidence clears the
//!    threshold, not the raw total, so a low-fee unconfirmed decoy
//!    can't inflate what's actually safe to rely on.
//!
//! None of these may be skipped because an I/O call failed; gateway
//! errors propagate rather than being treated as a pass.

use bitcoin::absolute::LockTime;
use bitcoin::PublicKey;

use crate::chain_gateway::ChainGateway;
use crate::confidence::ConfidenceFilter;
use crate::error::SwapError;
use crate::fee_oracle::FeeOracle;
use crate::network::Network;
use crate::script_builder::ScriptBuilder;
use crate::script_values::ScriptValues;

/// The terms a counterparty claims an HTLC was negotiated for,
/// checked against what `values` actually compiles to. Carries no
/// address: the address is always derived from `values`, never taken
/// on the counterparty's word (spec §4.4, §8's soundness property).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected {
    pub value: u64,
    pub lock_time: LockTime,
    pub recipient_public_key: PublicKey,
}

pub struct ScriptChecker;

impl ScriptChecker {
    /// Confirms `values` compiles to an HTLC address that actually
    /// holds `expected.value` (confidently so), whose lock time is no
    /// later than `expected.lockTime`, and whose recipient key matches
    /// `expected.recipientPublicKey`.
    pub async fn check(
        values: &ScriptValues,
        expected: &Expected,
        network: Network,
        gateway: &dyn ChainGateway,
        fee_oracle: &dyn FeeOracle,
        confidence_threshold: f64,
    ) -> Result<(), SwapError> {
        let (_, address) = ScriptBuilder::build(values, network)?;

        let unspents = gateway.fetch_unspents(&address).await?;
        let total: u64 = unspents.iter().map(|u| u.satoshis).sum();

        if expected.value > total {
            return Err(SwapError::ScriptMismatch(format!(
                "expected value {} exceeds total unspent {total} at {address}",
                expected.value
            )));
        }

        if expected.lock_time.to_consensus_u32() > values.lock_time().to_consensus_u32() {
            return Err(SwapError::ScriptMismatch(format!(
                "expected lockTime {:?} exceeds script lockTime {:?}",
                expected.lock_time,
                values.lock_time()
            )));
        }

        if expected.recipient_public_key != *values.recipient_public_key() {
            return Err(SwapError::ScriptMismatch(format!(
                "expected recipientPublicKey {} does not match script recipientPublicKey {}",
                expected.recipient_public_key,
                values.recipient_public_key()
            )));
        }

        let confident_total =
            ConfidenceFilter::confident_total(&unspents, confidence_threshold, gateway, fee_oracle).await?;
        if expected.value > confident_total {
            return Err(SwapError::ScriptMismatch(format!(
                "expected value {} exceeds confident total {confident_total} at {address}",
                expected.value
            )));
        }

        Ok(())
    }
}
