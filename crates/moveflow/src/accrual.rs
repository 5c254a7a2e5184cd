//! Withdrawable-amount engine.
//!
//! All amount arithmetic is done in [U256] with an explicit floor at each division:
//! `ticks * rate / 1000`, then `gross * fee_point / 10000`. The order is fixed so results
//! match the on-chain computation bit for bit.

use crate::error::StreamError;
use crate::record::StreamRecord;
use alloy::primitives::U256;

/// Fixed-point scale of `rate_per_interval`.
pub const RATE_SCALE: u64 = 1000;

/// Denominator of `fee_point`.
pub const FEE_DENOMINATOR: u64 = 10_000;

/// Gross and net amounts claimable at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    /// Whole intervals accrued since the last withdrawal (pauses excluded).
    pub ticks: u64,
    pub gross: U256,
    pub fee: U256,
}

impl Accrual {
    pub const NONE: Accrual = Accrual {
        ticks: 0,
        gross: U256::ZERO,
        fee: U256::ZERO,
    };

    pub fn net(&self) -> U256 {
        self.gross - self.fee
    }
}

/// Net amount the recipient can claim at `now` (unix seconds).
pub fn withdrawable(record: &StreamRecord, now: u64) -> U256 {
    accrue(record, now).net()
}

/// Full breakdown behind [withdrawable].
pub fn accrue(record: &StreamRecord, now: u64) -> Accrual {
    if record.closed
        || record.pause_info.paused
        || record.remaining_amount.is_zero()
        || record.interval == 0
    {
        return Accrual::NONE;
    }
    let effective_now = now.min(record.stop_time);
    let elapsed = effective_now
        .saturating_sub(record.last_withdraw_time)
        .saturating_sub(record.pause_info.acc_paused_time);
    let ticks = elapsed / record.interval;
    let gross = U256::from(ticks).saturating_mul(record.rate_per_interval) / U256::from(RATE_SCALE);
    Accrual {
        ticks,
        gross,
        fee: fee_of(gross, record.fee_info.fee_point),
    }
}

/// `floor(gross * fee_point / 10000)`.
pub fn fee_of(gross: U256, fee_point: u8) -> U256 {
    gross.saturating_mul(U256::from(fee_point)) / U256::from(FEE_DENOMINATOR)
}

/// Number of whole intervals in `[start, stop)`; zero for a zero interval.
pub fn total_intervals(start: u64, stop: u64, interval: u64) -> u64 {
    stop.saturating_sub(start).checked_div(interval).unwrap_or(0)
}

/// Scaled rate that spreads `deposit` evenly over the stream:
/// `floor(deposit * 1000 / floor((stop - start) / interval))`.
pub fn rate_per_interval(
    deposit: u64,
    start: u64,
    stop: u64,
    interval: u64,
) -> Result<U256, StreamError> {
    let intervals = total_intervals(start, stop, interval);
    if intervals == 0 {
        return Err(StreamError::Config(format!(
            "duration {}s is shorter than one {}s interval",
            stop.saturating_sub(start),
            interval
        )));
    }
    let scaled = U256::from(deposit)
        .checked_mul(U256::from(RATE_SCALE))
        .ok_or(StreamError::Overflow("deposit * rate scale"))?;
    Ok(scaled / U256::from(intervals))
}

/// Additional deposit required to move `stop_time` to `new_stop_time` at the current rate.
pub fn extension_amount(record: &StreamRecord, new_stop_time: u64) -> Result<U256, StreamError> {
    let added = total_intervals(record.stop_time, new_stop_time, record.interval);
    U256::from(added)
        .checked_mul(record.rate_per_interval)
        .map(|scaled| scaled / U256::from(RATE_SCALE))
        .ok_or(StreamError::Overflow("added intervals * rate"))
}
