//! The two-variant network parameter set from spec §3.
//!
//! Only mainnet and testnet are exposed at this layer — regtest and
//! signet share testnet's P2SH version byte (0xC4) and consensus rules
//! for script-number encoding, so a caller targeting regtest passes
//! [`Network::Testnet`] (see DESIGN.md, Open Question: regtest mapping).

use bitcoin::Network as BitcoinNetwork;

/// Network parameter set an [`crate::script_values::ScriptValues`]
/// instance is compiled against. Immutable per engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// The `bitcoin` crate network this maps onto, used for address
    /// encoding (P2SH version byte 0x05 mainnet / 0xC4 testnet) and
    /// script-number / CLTV semantics.
    pub fn to_bitcoin(self) -> BitcoinNetwork {
        match self {
            Network::Mainnet => BitcoinNetwork::Bitcoin,
            Network::Testnet => BitcoinNetwork::Testnet,
        }
    }
}

impl From<Network> for BitcoinNetwork {
    fn from(network: Network) -> Self {
        network.to_bitcoin()
    }
}

impl Network {
    /// Recovers a [`Network`] from a `bitcoin::Network`, used where a
    /// call site only has an [`bitcoin::Address`] (which carries its
    /// network) and not an explicit `Network` parameter. Regtest and
    /// signet addresses are treated as testnet (see DESIGN.md, Open
    /// Question: regtest mapping).
    pub fn from_bitcoin(network: BitcoinNetwork) -> Result<Network, crate::error::SwapError> {
        match network {
            BitcoinNetwork::Bitcoin => Ok(Network::Mainnet),
            BitcoinNetwork::Testnet | BitcoinNetwork::Regtest | BitcoinNetwork::Signet => {
                Ok(Network::Testnet)
            }
            other => Err(crate::error::SwapError::InvariantViolated(format!(
                "unsupported bitcoin network: {other:?}"
            ))),
        }
    }
}
