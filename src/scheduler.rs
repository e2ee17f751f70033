//! Wall-clock side of session lifecycles.
//!
//! Each live session owns the `JoinHandle`s to its scheduled tasks, and every
//! terminal transition (resolved, claimed, expired, superseded) aborts them,
//! so no recurring tick outlives its session. The tasks themselves re-check
//! state on wakeup and carry the session id they were armed for, which makes
//! a callback that raced its own abort a harmless no-op.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::state::GameState;
use crate::types::{PlayerId, SessionId};

fn until(deadline: DateTime<Utc>) -> Duration {
    (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO)
}

/// One-shot removal of a personal session at its deadline.
pub(crate) fn spawn_personal_expiry(
    state: Arc<GameState>,
    player: PlayerId,
    session_id: SessionId,
    deadline: DateTime<Utc>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(until(deadline)).await;
        state.expire_personal(&player, &session_id).await;
    })
}

/// Per-second countdown pushed to the live card while the round is open.
pub(crate) fn spawn_competition_ticker(
    state: Arc<GameState>,
    session_id: SessionId,
    deadline: DateTime<Utc>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // An interval fires immediately; swallow the zeroth tick so the
        // first countdown lands a second in.
        tick.tick().await;
        loop {
            tick.tick().await;
            let Some(display) = state.competition_display(&session_id).await else {
                break;
            };
            let seconds_left = (deadline - Utc::now()).num_seconds();
            if seconds_left <= 0 {
                break;
            }
            display.countdown(seconds_left).await;
        }
    })
}

/// Single timed-out transition at the deadline.
pub(crate) fn spawn_competition_expiry(
    state: Arc<GameState>,
    session_id: SessionId,
    deadline: DateTime<Utc>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(until(deadline)).await;
        state.expire_competition(&session_id).await;
    })
}
