//! Network and client configuration.

use crate::error::StreamError;
use crate::validate::normalize_coin_type;
use std::fmt;
use std::str::FromStr;

/// Coin type of the native (gas) asset.
pub const NATIVE_COIN_TYPE: &str = "0x2::sui::SUI";

/// Move module holding the stream entry points.
pub const STREAM_MODULE: &str = "stream";

/// Supported networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Devnet,
    Testnet,
    Mainnet,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            _ => Err(StreamError::UnsupportedNetwork(s.to_string())),
        }
    }
}

/// Fixed bundle of on-chain locations for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network: Network,
    /// HTTP JSON-RPC endpoint of a full node.
    pub full_node_url: String,
    /// Package holding the stream module.
    pub package_id: String,
    /// Shared global config object (fee recipient, coin configs).
    pub global_config_id: String,
    /// Admin capability required by coin registration and fee updates. Not published;
    /// operators supply it through the client builder.
    pub admin_cap_id: Option<String>,
    /// Shared clock object passed to time-sensitive entry points.
    pub clock_id: String,
    pub native_coin_type: String,
}

impl NetworkConfig {
    /// `<package>::stream::<entry>`.
    pub fn entry_point(&self, entry: &str) -> String {
        format!("{}::{}::{}", self.package_id, STREAM_MODULE, entry)
    }

    /// Fully-qualified type of the stream record object.
    pub fn stream_type(&self) -> String {
        format!("{}::{}::StreamInfo", self.package_id, STREAM_MODULE)
    }

    /// Fully-qualified type of the sender capability (proves the right to pause/resume/extend/close).
    pub fn sender_cap_type(&self) -> String {
        format!("{}::{}::SenderCap", self.package_id, STREAM_MODULE)
    }

    /// Fully-qualified type of the recipient capability (proves the right to redirect).
    pub fn recipient_cap_type(&self) -> String {
        format!("{}::{}::RecipientCap", self.package_id, STREAM_MODULE)
    }

    /// Compares with the address segment normalized, so short and long spellings agree.
    pub fn is_native(&self, coin_type: &str) -> bool {
        normalize_coin_type(coin_type) == normalize_coin_type(&self.native_coin_type)
    }
}

pub fn testnet_config() -> NetworkConfig {
    NetworkConfig {
        network: Network::Testnet,
        full_node_url: "https://fullnode.testnet.sui.io/".to_string(),
        package_id: "0xd4a8b17cbc665b5a92311e14cdb24de7abbfae9d9616babdd5f9f732a2987311"
            .to_string(),
        global_config_id: "0xa1a1eec8f02b609612c7c6ac6dac44f86db9c3b6e65b020c809270fbb0895ab4"
            .to_string(),
        admin_cap_id: None,
        clock_id: "0x6".to_string(),
        native_coin_type: NATIVE_COIN_TYPE.to_string(),
    }
}

/// Returns the bundle for `network`; only testnet is deployed.
pub fn get_config(network: Network) -> Result<NetworkConfig, StreamError> {
    match network {
        Network::Testnet => Ok(testnet_config()),
        other => Err(StreamError::UnsupportedNetwork(other.to_string())),
    }
}

/// Coin enumeration settings.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Max coins requested per page.
    pub page_limit: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { page_limit: 50 }
    }
}
