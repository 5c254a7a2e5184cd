//! Crate error type.

use crate::lifecycle::Action;
use crate::validate::ValidationError;
use alloy::primitives::U256;
use thiserror::Error;

/// Conflicts between a requested transition and the current stream state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("stream {0} is closed")]
    Closed(String),

    #[error("stream {0} is already paused")]
    AlreadyPaused(String),

    #[error("stream {0} is not paused")]
    NotPaused(String),

    #[error("stream {0} is paused")]
    Paused(String),

    #[error("stream {0} has no remaining amount")]
    Exhausted(String),

    #[error("stream {stream} was created without the {feature} feature")]
    FeatureDisabled { stream: String, feature: &'static str },

    #[error("new stop time {requested} must be after current stop time {current}")]
    StopTimeRegression { current: u64, requested: u64 },
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{caller} is not allowed to {action}")]
    Unauthorized { action: Action, caller: String },

    #[error(transparent)]
    State(#[from] StateError),

    #[error("insufficient funds of {coin_type}: need {target}, found {found}")]
    InsufficientFunds {
        coin_type: String,
        target: U256,
        found: U256,
    },

    #[error("insufficient balance of {coin_type}: need {required}, available {available}")]
    InsufficientBalance {
        coin_type: String,
        required: U256,
        available: U256,
    },

    #[error("amount overflow: {0}")]
    Overflow(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("response carries no object changes")]
    MissingObjectChanges,

    #[error("response did not create a {0}")]
    MissingCreatedObject(&'static str),

    #[error("network {0} not supported yet")]
    UnsupportedNetwork(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl StreamError {
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        StreamError::Decode(msg.into())
    }
}
