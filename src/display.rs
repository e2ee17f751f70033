//! The live competition card, rendered by the chat client.

use async_trait::async_trait;

use crate::types::PlayerId;

/// Terminal state pushed to the card exactly once per round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Won { player: PlayerId, answer: String },
    TimedOut,
}

/// Handle to the externally rendered competition card.
///
/// The engine drives the per-second countdown while the round is open and
/// pushes a single terminal update when it ends; how either is rendered is
/// the chat client's problem.
#[async_trait]
pub trait CompetitionDisplay: Send + Sync {
    async fn countdown(&self, seconds_left: i64);
    async fn finish(&self, outcome: RoundOutcome);
}
