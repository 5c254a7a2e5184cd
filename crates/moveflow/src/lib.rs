//! Off-chain MoveFlow SDK: accrual, authorization and operation building for payment streams.
//!
//! - **Accrual** ([accrual]): how much of a stream is claimable at an instant, net of fee.
//! - **Lifecycle** ([lifecycle]): Active / Paused / Closed, transition guards, and standalone
//!   authorization predicates ([pauseable], [closeable], [recipient_modifiable]).
//! - **Coin selection** ([coin]): gathers the payer's coins page by page until a target is met.
//! - **StreamClient** ([client]): re-fetches stream state through a [StreamRpc] and builds
//!   [OperationDescriptor]s for an external signer. Nothing here signs or submits.

pub mod accrual;
pub mod client;
pub mod coin;
pub mod config;
pub mod cursor;
pub mod error;
pub mod lifecycle;
pub mod operation;
pub mod record;
pub mod rpc;
pub mod validate;

pub use accrual::{accrue, withdrawable, Accrual};
pub use client::{now_secs, CreateParams, PaginatedCoinConfigs, StreamClient, StreamClientBuilder};
pub use coin::{select_coins, CoinSelection, Funding};
pub use config::{get_config, Network, NetworkConfig, SelectionConfig};
pub use cursor::{Cursor, Page};
pub use error::{StateError, StreamError};
pub use lifecycle::{
    closeable, pauseable, recipient_modifiable, resumable, Action, StreamState, Transition,
};
pub use operation::{Argument, OperationDescriptor, PureValue};
pub use record::{
    Balance, CapabilityRef, CoinConfig, FeatureInfo, FeeInfo, FundUnit, PauseInfo,
    StreamCreationResult, StreamDirection, StreamRecord,
};
pub use rpc::{HttpRpc, StreamRpc};
pub use validate::ValidationError;

/// Amounts are 256-bit to keep `ticks * rate` products exact.
pub use alloy::primitives::U256;
