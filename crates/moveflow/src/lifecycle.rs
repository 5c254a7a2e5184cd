//! Stream lifecycle: states, transition guards and authorization predicates.
//!
//! Predicates are pure and re-derive eligibility from the record on every call, so UIs can
//! ask "may this caller pause?" without attempting the operation. [authorize] turns the
//! same checks into a typed error; [apply] predicts the post-transition snapshot.

use crate::accrual::accrue;
use crate::error::{StateError, StreamError};
use crate::record::StreamRecord;
use crate::validate::normalize_address;
use alloy::primitives::U256;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Active,
    Paused,
    /// Terminal; supersedes pause.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pause,
    Resume,
    Extend,
    Withdraw,
    SetNewRecipient,
    Close,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::Extend => "extend",
            Action::Withdraw => "withdraw",
            Action::SetNewRecipient => "set a new recipient",
            Action::Close => "close",
        };
        f.write_str(s)
    }
}

/// A requested state change together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Pause,
    Resume,
    Extend { new_stop_time: u64 },
    Withdraw,
    SetNewRecipient { recipient: String },
    Close,
}

impl Transition {
    pub fn action(&self) -> Action {
        match self {
            Transition::Pause => Action::Pause,
            Transition::Resume => Action::Resume,
            Transition::Extend { .. } => Action::Extend,
            Transition::Withdraw => Action::Withdraw,
            Transition::SetNewRecipient { .. } => Action::SetNewRecipient,
            Transition::Close => Action::Close,
        }
    }
}

pub fn state(record: &StreamRecord) -> StreamState {
    if record.closed {
        StreamState::Closed
    } else if record.pause_info.paused {
        StreamState::Paused
    } else {
        StreamState::Active
    }
}

pub fn is_exhausted(record: &StreamRecord) -> bool {
    record.remaining_amount.is_zero()
}

/// Address equality after normalization (`0x2` == `0x00..02`).
pub fn same_address(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}

pub fn is_sender(record: &StreamRecord, caller: &str) -> bool {
    same_address(&record.sender, caller)
}

pub fn is_recipient(record: &StreamRecord, caller: &str) -> bool {
    same_address(&record.recipient, caller)
}

/// Caller may pause right now.
pub fn pauseable(record: &StreamRecord, caller: &str) -> bool {
    !record.closed
        && record.feature_info.pauseable
        && is_sender(record, caller)
        && !record.pause_info.paused
}

/// Caller may resume right now.
pub fn resumable(record: &StreamRecord, caller: &str) -> bool {
    !record.closed
        && record.feature_info.pauseable
        && is_sender(record, caller)
        && record.pause_info.paused
}

pub fn closeable(record: &StreamRecord, caller: &str) -> bool {
    !record.closed && record.feature_info.sender_closeable && is_sender(record, caller)
}

pub fn recipient_modifiable(record: &StreamRecord, caller: &str) -> bool {
    !record.closed && record.feature_info.recipient_modifiable && is_recipient(record, caller)
}

/// Caller may extend (the stop time is checked by [authorize]).
pub fn extendable(record: &StreamRecord, caller: &str) -> bool {
    !record.closed && is_sender(record, caller)
}

/// Withdrawal is permissionless; funds always go to the recipient.
pub fn withdrawal_open(record: &StreamRecord) -> bool {
    !record.closed && !record.pause_info.paused && !is_exhausted(record)
}

/// Check `transition` against `record` for `caller`, reporting the first violated guard.
///
/// Order: terminal state, capability flag, caller role, then transition-specific state.
pub fn authorize(
    record: &StreamRecord,
    transition: &Transition,
    caller: &str,
) -> Result<(), StreamError> {
    if record.closed {
        return Err(StateError::Closed(record.id.clone()).into());
    }
    let unauthorized = || StreamError::Unauthorized {
        action: transition.action(),
        caller: caller.to_string(),
    };
    let disabled = |feature: &'static str| -> StreamError {
        StateError::FeatureDisabled {
            stream: record.id.clone(),
            feature,
        }
        .into()
    };
    match transition {
        Transition::Pause | Transition::Resume => {
            if !record.feature_info.pauseable {
                return Err(disabled("pauseable"));
            }
            if !is_sender(record, caller) {
                return Err(unauthorized());
            }
            match (transition, record.pause_info.paused) {
                (Transition::Pause, true) => Err(StateError::AlreadyPaused(record.id.clone()).into()),
                (Transition::Resume, false) => Err(StateError::NotPaused(record.id.clone()).into()),
                _ => Ok(()),
            }
        }
        Transition::Extend { new_stop_time } => {
            if !is_sender(record, caller) {
                return Err(unauthorized());
            }
            if *new_stop_time <= record.stop_time {
                return Err(StateError::StopTimeRegression {
                    current: record.stop_time,
                    requested: *new_stop_time,
                }
                .into());
            }
            Ok(())
        }
        Transition::Withdraw => {
            if record.pause_info.paused {
                return Err(StateError::Paused(record.id.clone()).into());
            }
            if is_exhausted(record) {
                return Err(StateError::Exhausted(record.id.clone()).into());
            }
            Ok(())
        }
        Transition::SetNewRecipient { .. } => {
            if !record.feature_info.recipient_modifiable {
                return Err(disabled("recipient_modifiable"));
            }
            if !is_recipient(record, caller) {
                return Err(unauthorized());
            }
            Ok(())
        }
        Transition::Close => {
            if !record.feature_info.sender_closeable {
                return Err(disabled("sender_closeable"));
            }
            if !is_sender(record, caller) {
                return Err(unauthorized());
            }
            Ok(())
        }
    }
}

/// Predict the snapshot after `transition` succeeds at `now`.
pub fn apply(
    record: &StreamRecord,
    transition: &Transition,
    caller: &str,
    now: u64,
) -> Result<StreamRecord, StreamError> {
    authorize(record, transition, caller)?;
    let mut next = record.clone();
    match transition {
        Transition::Pause => {
            next.pause_info.paused = true;
            next.pause_info.paused_at = now;
        }
        Transition::Resume => {
            let paused_for = now.saturating_sub(record.pause_info.paused_at);
            next.pause_info.paused = false;
            next.pause_info.acc_paused_time =
                checked_add_secs(record.pause_info.acc_paused_time, paused_for, "paused time")?;
        }
        Transition::Extend { new_stop_time } => {
            let added = crate::accrual::extension_amount(record, *new_stop_time)?;
            next.stop_time = *new_stop_time;
            next.deposit_amount = checked_add(record.deposit_amount, added, "deposit")?;
            next.remaining_amount = checked_add(record.remaining_amount, added, "remaining")?;
            next.balance = checked_add(record.balance, added, "balance")?;
        }
        Transition::Withdraw => {
            let accrual = accrue(record, now);
            let gross = accrual.gross.min(record.remaining_amount);
            next.remaining_amount = record.remaining_amount - gross;
            next.withdrawn_amount = checked_add(record.withdrawn_amount, gross, "withdrawn")?;
            next.balance = record.balance.saturating_sub(gross);
            // Consumed pause time and whole ticks move into last_withdraw_time; the
            // partial tick in progress is kept.
            let accrued_secs = accrual
                .ticks
                .checked_mul(record.interval)
                .ok_or(StreamError::Overflow("ticks * interval"))?;
            next.last_withdraw_time = checked_add_secs(
                checked_add_secs(
                    record.last_withdraw_time,
                    record.pause_info.acc_paused_time,
                    "last withdraw time",
                )?,
                accrued_secs,
                "last withdraw time",
            )?;
            next.pause_info.acc_paused_time = 0;
        }
        Transition::SetNewRecipient { recipient } => {
            next.recipient = recipient.clone();
        }
        Transition::Close => {
            next.closed = true;
        }
    }
    Ok(next)
}

fn checked_add(a: U256, b: U256, what: &'static str) -> Result<U256, StreamError> {
    a.checked_add(b).ok_or(StreamError::Overflow(what))
}

fn checked_add_secs(a: u64, b: u64, what: &'static str) -> Result<u64, StreamError> {
    a.checked_add(b).ok_or(StreamError::Overflow(what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accrual::tests::{record, START};
    use crate::accrual::withdrawable;

    const SENDER: &str = "0xa";
    const RECIPIENT: &str = "0xb";
    const ADMIN: &str = "0xad";

    #[test]
    fn fresh_stream_is_active() {
        let r = record(1_000, 0);
        assert_eq!(state(&r), StreamState::Active);
        assert!(withdrawal_open(&r));
    }

    #[test]
    fn authorization_exclusivity() {
        let r = record(1_000, 0);
        assert!(pauseable(&r, SENDER));
        assert!(closeable(&r, SENDER));
        assert!(extendable(&r, SENDER));
        assert!(!recipient_modifiable(&r, SENDER));

        assert!(recipient_modifiable(&r, RECIPIENT));
        assert!(!pauseable(&r, RECIPIENT));
        assert!(!closeable(&r, RECIPIENT));

        for other in [ADMIN, "0xfee"] {
            assert!(!pauseable(&r, other));
            assert!(!resumable(&r, other));
            assert!(!closeable(&r, other));
            assert!(!recipient_modifiable(&r, other));
            assert!(!extendable(&r, other));
        }
    }

    #[test]
    fn caller_address_is_normalized() {
        let r = record(1_000, 0);
        let long_sender = format!("0x{:0>64}", "A");
        assert!(pauseable(&r, &long_sender));
    }

    #[test]
    fn capability_flags_gate_predicates() {
        let mut r = record(1_000, 0);
        r.feature_info.pauseable = false;
        r.feature_info.sender_closeable = false;
        r.feature_info.recipient_modifiable = false;
        assert!(!pauseable(&r, SENDER));
        assert!(!closeable(&r, SENDER));
        assert!(!recipient_modifiable(&r, RECIPIENT));
        assert!(matches!(
            authorize(&r, &Transition::Close, SENDER),
            Err(StreamError::State(StateError::FeatureDisabled { feature: "sender_closeable", .. }))
        ));
    }

    #[test]
    fn wrong_caller_is_unauthorized() {
        let r = record(1_000, 0);
        match authorize(&r, &Transition::Pause, RECIPIENT) {
            Err(StreamError::Unauthorized { action, caller }) => {
                assert_eq!(action, Action::Pause);
                assert_eq!(caller, RECIPIENT);
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
        assert!(authorize(
            &r,
            &Transition::SetNewRecipient { recipient: "0xc".into() },
            SENDER
        )
        .is_err());
    }

    #[test]
    fn pause_resume_cycle() {
        let r = record(1_000, 0);
        let paused = apply(&r, &Transition::Pause, SENDER, START + 5).unwrap();
        assert_eq!(state(&paused), StreamState::Paused);
        assert_eq!(paused.pause_info.paused_at, START + 5);
        assert!(!pauseable(&paused, SENDER));
        assert!(resumable(&paused, SENDER));
        assert!(matches!(
            apply(&paused, &Transition::Pause, SENDER, START + 6),
            Err(StreamError::State(StateError::AlreadyPaused(_)))
        ));
        assert!(matches!(
            authorize(&paused, &Transition::Withdraw, RECIPIENT),
            Err(StreamError::State(StateError::Paused(_)))
        ));

        let resumed = apply(&paused, &Transition::Resume, SENDER, START + 25).unwrap();
        assert_eq!(resumed.pause_info.acc_paused_time, 20);
        assert_eq!(withdrawable(&resumed, START + 30), U256::from(10u64));
        assert!(matches!(
            apply(&resumed, &Transition::Resume, SENDER, START + 26),
            Err(StreamError::State(StateError::NotPaused(_)))
        ));
    }

    #[test]
    fn extend_requires_later_stop_time() {
        let r = record(1_000, 0);
        match authorize(&r, &Transition::Extend { new_stop_time: r.stop_time }, SENDER) {
            Err(StreamError::State(StateError::StopTimeRegression { current, requested })) => {
                assert_eq!(current, r.stop_time);
                assert_eq!(requested, r.stop_time);
            }
            other => panic!("expected StopTimeRegression, got {:?}", other),
        }
        let extended = apply(
            &r,
            &Transition::Extend { new_stop_time: r.stop_time + 100 },
            SENDER,
            START,
        )
        .unwrap();
        assert_eq!(extended.stop_time, r.stop_time + 100);
        assert_eq!(extended.deposit_amount, r.deposit_amount + U256::from(100u64));
        assert_eq!(extended.remaining_amount, r.remaining_amount + U256::from(100u64));
    }

    #[test]
    fn withdraw_advances_and_resets_pause_time() {
        let mut r = record(1_000, 100);
        r.interval = 10;
        r.pause_info.acc_paused_time = 7;
        // elapsed 55 - 7 = 48 -> 4 ticks, 8s of partial tick carried over
        let after = apply(&r, &Transition::Withdraw, RECIPIENT, START + 55).unwrap();
        assert_eq!(after.withdrawn_amount, U256::from(4u64));
        assert_eq!(after.remaining_amount, r.remaining_amount - U256::from(4u64));
        assert_eq!(after.pause_info.acc_paused_time, 0);
        assert_eq!(after.last_withdraw_time, START + 47);
        assert_eq!(withdrawable(&after, START + 55), U256::ZERO);
        assert_eq!(withdrawable(&after, START + 57), U256::from(1u64));
    }

    #[test]
    fn out_of_range_times_are_overflow_errors() {
        let mut paused = record(1_000, 0);
        paused.pause_info.paused = true;
        paused.pause_info.paused_at = START;
        paused.pause_info.acc_paused_time = u64::MAX - 10;
        assert!(matches!(
            apply(&paused, &Transition::Resume, SENDER, START + 100),
            Err(StreamError::Overflow(_))
        ));

        let mut r = record(1_000, 0);
        r.last_withdraw_time = u64::MAX - 5;
        r.pause_info.acc_paused_time = 10;
        assert!(matches!(
            apply(&r, &Transition::Withdraw, RECIPIENT, START + 100),
            Err(StreamError::Overflow(_))
        ));
    }

    #[test]
    fn close_is_terminal() {
        let r = record(1_000, 0);
        let closed = apply(&r, &Transition::Close, SENDER, START + 10).unwrap();
        assert_eq!(state(&closed), StreamState::Closed);
        assert!(!closed.remaining_amount.is_zero());
        assert_eq!(withdrawable(&closed, START + 1_000_000), U256::ZERO);
        for t in [
            Transition::Pause,
            Transition::Resume,
            Transition::Extend { new_stop_time: r.stop_time + 1 },
            Transition::Withdraw,
            Transition::SetNewRecipient { recipient: "0xc".into() },
            Transition::Close,
        ] {
            assert!(matches!(
                apply(&closed, &t, SENDER, START + 11),
                Err(StreamError::State(StateError::Closed(_)))
            ));
        }
        assert!(!pauseable(&closed, SENDER));
        assert!(!closeable(&closed, SENDER));
        assert!(!recipient_modifiable(&closed, RECIPIENT));
    }

    #[test]
    fn set_new_recipient_moves_capability() {
        let r = record(1_000, 0);
        let moved = apply(
            &r,
            &Transition::SetNewRecipient { recipient: "0xc".into() },
            RECIPIENT,
            START,
        )
        .unwrap();
        assert!(recipient_modifiable(&moved, "0xc"));
        assert!(!recipient_modifiable(&moved, RECIPIENT));
    }
}
