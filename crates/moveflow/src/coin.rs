//! Coin selection for funding operations.
//!
//! Non-native coins are separate objects on chain: enough of them are gathered (in
//! enumeration order, skipping locked ones) and merged into the first before the amount is
//! split off. The native coin is split straight from the gas coin and never enumerated.

use crate::config::SelectionConfig;
use crate::cursor::Cursor;
use crate::error::StreamError;
use crate::record::{Balance, FundUnit};
use crate::rpc::StreamRpc;
use alloy::primitives::U256;
use serde::Serialize;

/// How the deposit of an operation is sourced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum Funding {
    /// Split `amount` from the payer's gas coin.
    Native { amount: u64 },
    /// Merge `merge` into `primary`, then split `amount` from `primary`.
    Coins {
        primary: String,
        merge: Vec<String>,
        amount: u64,
    },
}

impl Funding {
    pub fn amount(&self) -> u64 {
        match self {
            Funding::Native { amount } | Funding::Coins { amount, .. } => *amount,
        }
    }
}

/// Coins picked to reach a target, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinSelection {
    pub units: Vec<FundUnit>,
    pub total: U256,
}

impl CoinSelection {
    pub fn ids(&self) -> Vec<String> {
        self.units.iter().map(|u| u.id.clone()).collect()
    }

    fn into_funding(self, amount: u64) -> Result<Funding, StreamError> {
        let mut ids = self.units.into_iter().map(|u| u.id);
        let primary = ids
            .next()
            .ok_or_else(|| StreamError::Config("empty coin selection".into()))?;
        Ok(Funding::Coins {
            primary,
            merge: ids.collect(),
            amount,
        })
    }
}

/// Walk the owner's coins page by page until the unlocked total reaches `target`.
///
/// Pages are fetched strictly one after another and enumeration stops at the coin that
/// reaches the target; later pages are never requested.
pub async fn select_coins<R: StreamRpc>(
    rpc: &R,
    owner: &str,
    coin_type: &str,
    target: U256,
    config: &SelectionConfig,
) -> Result<CoinSelection, StreamError> {
    let mut selection = CoinSelection::default();
    if target.is_zero() {
        return Ok(selection);
    }
    let mut cursor = Cursor::start();
    while !cursor.is_exhausted() {
        let page = rpc
            .fetch_fund_units(owner, coin_type, cursor.position(), config.page_limit)
            .await?;
        cursor.advance(&page);
        for unit in page.data {
            if unit.locked || unit.balance.is_zero() {
                continue;
            }
            selection.total = selection
                .total
                .checked_add(unit.balance)
                .ok_or(StreamError::Overflow("coin total"))?;
            selection.units.push(unit);
            if selection.total >= target {
                tracing::debug!(
                    coin_type,
                    coins = selection.units.len(),
                    pages = cursor.pages_fetched(),
                    "coin selection reached target"
                );
                return Ok(selection);
            }
        }
    }
    Err(StreamError::InsufficientFunds {
        coin_type: coin_type.to_string(),
        target,
        found: selection.total,
    })
}

/// Decide how `amount` of `coin_type` is sourced for `owner`.
pub async fn plan_funding<R: StreamRpc>(
    rpc: &R,
    owner: &str,
    coin_type: &str,
    amount: u64,
    native: bool,
    config: &SelectionConfig,
) -> Result<Funding, StreamError> {
    if native {
        return Ok(Funding::Native { amount });
    }
    select_coins(rpc, owner, coin_type, U256::from(amount), config)
        .await?
        .into_funding(amount)
}

/// Affordability check before coin selection.
///
/// The native asset must leave at least one unit behind (`available > amount`); other
/// assets only need `available >= amount`. The asymmetry follows the deployed SDK.
pub fn ensure_affordable(
    balance: &Balance,
    coin_type: &str,
    amount: u64,
    native: bool,
) -> Result<(), StreamError> {
    let available = balance.available();
    let required = U256::from(amount);
    let short = if native {
        available <= required
    } else {
        available < required
    };
    if short {
        return Err(StreamError::InsufficientBalance {
            coin_type: coin_type.to_string(),
            required,
            available,
        });
    }
    Ok(())
}
