use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use super::{GameError, GameState, PersonalSession};
use crate::matcher;
use crate::scheduler;
use crate::types::{Coaster, CoasterId, Difficulty, PlayerId, SessionId, PERSONAL_THRESHOLD};

/// Outcome of evaluating a guess against the author's personal session.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    Correct {
        answer: String,
        difficulty: Difficulty,
        coaster_id: CoasterId,
    },
    Incorrect,
}

impl GameState {
    /// Open (or replace) a guessing round for one player.
    ///
    /// Last writer wins: a later start silently supersedes the previous round
    /// and cancels its expiry timer, so a fresh `/guess` always resets the
    /// clock with no error.
    pub async fn start_personal(
        self: &Arc<Self>,
        player: &PlayerId,
        coaster: &Coaster,
        duration: StdDuration,
    ) {
        let id: SessionId = ulid::Ulid::new().to_string();
        let deadline =
            Utc::now() + Duration::from_std(duration).unwrap_or_else(|_| Duration::zero());

        let session = PersonalSession {
            id: id.clone(),
            coaster_id: coaster.id,
            target_name: coaster.name.clone(),
            target_alias: coaster.alias.clone(),
            difficulty: coaster.difficulty,
            deadline,
            expiry: Some(scheduler::spawn_personal_expiry(
                Arc::clone(self),
                player.clone(),
                id,
                deadline,
            )),
        };

        let mut sessions = self.sessions.write().await;
        if let Some(old) = sessions.insert(player.clone(), session) {
            if let Some(handle) = old.expiry {
                handle.abort();
            }
            tracing::debug!(player = %player, "superseded an unresolved personal session");
        }
        tracing::info!(player = %player, coaster = %coaster.name, %deadline, "personal round started");
    }

    /// Evaluate a guess against the player's live session.
    ///
    /// Expiry is re-checked here rather than trusted to the timer: a message
    /// landing in the gap between the deadline and the timer callback still
    /// loses, and tears the session down on the spot.
    pub async fn resolve(
        &self,
        player: &PlayerId,
        raw_guess: &str,
        now: DateTime<Utc>,
    ) -> Result<ResolveOutcome, GameError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get(player).ok_or(GameError::SessionMissing)?;

        if now > session.deadline {
            if let Some(old) = sessions.remove(player) {
                if let Some(handle) = old.expiry {
                    handle.abort();
                }
            }
            tracing::debug!(player = %player, "guess arrived after the deadline");
            return Err(GameError::SessionExpired);
        }

        let difficulty = session.difficulty;
        let coaster_id = session.coaster_id;
        let accepted: Vec<&str> = std::iter::once(session.target_name.as_str())
            .chain(session.target_alias.as_deref())
            .collect();
        let found = matcher::match_guess(raw_guess, &accepted, PERSONAL_THRESHOLD);
        drop(accepted);

        match found {
            Some(m) => {
                // The round is spent; tear it down before any award work.
                if let Some(old) = sessions.remove(player) {
                    if let Some(handle) = old.expiry {
                        handle.abort();
                    }
                }
                tracing::info!(player = %player, answer = %m.answer, exact = m.exact, "correct personal guess");
                Ok(ResolveOutcome::Correct {
                    answer: m.answer,
                    difficulty,
                    coaster_id,
                })
            }
            None => Ok(ResolveOutcome::Incorrect),
        }
    }

    /// Remove a player's session without resolving it.
    pub async fn clear_personal(&self, player: &PlayerId) {
        if let Some(session) = self.sessions.write().await.remove(player) {
            if let Some(handle) = session.expiry {
                handle.abort();
            }
        }
    }

    /// Whether the player currently has a live round.
    pub async fn has_personal(&self, player: &PlayerId) -> bool {
        self.sessions.read().await.contains_key(player)
    }

    /// Timer-side removal. Only evicts the exact session the timer was armed
    /// for, so a superseding round is never torn down by a stale callback.
    pub(crate) async fn expire_personal(&self, player: &PlayerId, session_id: &SessionId) {
        let mut sessions = self.sessions.write().await;
        let armed_for = sessions.get(player).map_or(false, |s| &s.id == session_id);
        if armed_for {
            sessions.remove(player);
            tracing::info!(player = %player, "personal round expired unresolved");
        }
    }
}
