use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use super::{CompetitionSession, GameError, GameState};
use crate::display::{CompetitionDisplay, RoundOutcome};
use crate::matcher;
use crate::scheduler;
use crate::types::{Coaster, PlayerId, SessionId, COMPETITION_THRESHOLD};

/// Outcome of evaluating a guess against the live competition.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Won { answer: String },
    NoMatch,
}

impl GameState {
    /// Open the public round.
    ///
    /// Refused with `AlreadyRunning` while a previous round is still live.
    /// A leftover round that has already expired or been claimed only lingers
    /// until its teardown lands, so it is replaced here instead of blocking
    /// the new one.
    pub async fn start_competition(
        self: &Arc<Self>,
        coaster: &Coaster,
        duration: StdDuration,
        display: Arc<dyn CompetitionDisplay>,
    ) -> Result<(), GameError> {
        let now = Utc::now();
        let mut slot = self.competition.lock().await;
        if let Some(existing) = slot.as_ref() {
            if !existing.claimed && now < existing.deadline {
                return Err(GameError::AlreadyRunning);
            }
        }
        let leftover = slot.take();

        let id: SessionId = ulid::Ulid::new().to_string();
        let deadline =
            now + Duration::from_std(duration).unwrap_or_else(|_| Duration::zero());
        let ticker = scheduler::spawn_competition_ticker(Arc::clone(self), id.clone(), deadline);
        let expiry = scheduler::spawn_competition_expiry(Arc::clone(self), id.clone(), deadline);

        *slot = Some(CompetitionSession {
            id,
            target_name: coaster.name.clone(),
            target_alias: coaster.alias.clone(),
            deadline,
            claimed: false,
            display,
            ticker: Some(ticker),
            expiry: Some(expiry),
        });
        drop(slot);

        tracing::info!(coaster = %coaster.name, %deadline, "competition started");

        // The superseded round still owes its terminal card if its own
        // expiry timer lost the race to this start.
        if let Some(mut old) = leftover {
            if let Some(handle) = old.ticker.take() {
                handle.abort();
            }
            if let Some(handle) = old.expiry.take() {
                handle.abort();
            }
            if !old.claimed {
                old.display.finish(RoundOutcome::TimedOut).await;
            }
        }

        Ok(())
    }

    /// Evaluate a guess against the public round.
    ///
    /// The claimed-flag check, the match and the flag flip all happen inside
    /// one critical section with no await point between them: under
    /// concurrent messages exactly one correct guess takes the win, and every
    /// evaluation ordered after it observes `AlreadyClaimed` (or
    /// `NoCompetition` once teardown lands). Reward and display work are
    /// strictly downstream of an already-final decision.
    pub async fn claim(
        &self,
        player: &PlayerId,
        raw_guess: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, GameError> {
        let mut slot = self.competition.lock().await;
        let session = slot.as_mut().ok_or(GameError::NoCompetition)?;

        if session.claimed {
            return Err(GameError::AlreadyClaimed);
        }

        if now > session.deadline {
            // Whoever observes the expiry first performs the single
            // timed-out transition; the timer finding an empty slot no-ops.
            let taken = slot.take();
            drop(slot);
            if let Some(mut old) = taken {
                if let Some(handle) = old.ticker.take() {
                    handle.abort();
                }
                if let Some(handle) = old.expiry.take() {
                    handle.abort();
                }
                tracing::info!("competition expired, observed at claim time");
                old.display.finish(RoundOutcome::TimedOut).await;
            }
            return Err(GameError::CompetitionExpired);
        }

        let accepted: Vec<&str> = std::iter::once(session.target_name.as_str())
            .chain(session.target_alias.as_deref())
            .collect();
        let found = matcher::match_guess(raw_guess, &accepted, COMPETITION_THRESHOLD);
        drop(accepted);

        let Some(m) = found else {
            return Ok(ClaimOutcome::NoMatch);
        };

        // The decision is final from here on.
        session.claimed = true;
        let session_id = session.id.clone();
        let display = Arc::clone(&session.display);
        drop(slot);

        tracing::info!(player = %player, answer = %m.answer, score = m.score, "competition claimed");
        display
            .finish(RoundOutcome::Won {
                player: player.clone(),
                answer: m.answer.clone(),
            })
            .await;
        self.close_competition(&session_id).await;

        Ok(ClaimOutcome::Won { answer: m.answer })
    }

    /// Empty the slot if it still holds the given session, cancelling its
    /// timers.
    pub(crate) async fn close_competition(&self, session_id: &SessionId) {
        let mut slot = self.competition.lock().await;
        if slot.as_ref().map_or(false, |s| &s.id == session_id) {
            if let Some(mut old) = slot.take() {
                if let Some(handle) = old.ticker.take() {
                    handle.abort();
                }
                if let Some(handle) = old.expiry.take() {
                    handle.abort();
                }
            }
        }
    }

    /// Timed-out terminal transition, driven by the expiry timer.
    pub(crate) async fn expire_competition(&self, session_id: &SessionId) {
        let mut slot = self.competition.lock().await;
        let still_live = slot
            .as_ref()
            .map_or(false, |s| &s.id == session_id && !s.claimed);
        if !still_live {
            return;
        }
        let Some(mut session) = slot.take() else {
            return;
        };
        drop(slot);

        if let Some(handle) = session.ticker.take() {
            handle.abort();
        }
        // This IS the expiry task; its handle is left to finish on its own.
        tracing::info!("competition expired with no winner");
        session.display.finish(RoundOutcome::TimedOut).await;
    }

    /// Display handle for the ticker, as long as the round is still open.
    pub(crate) async fn competition_display(
        &self,
        session_id: &SessionId,
    ) -> Option<Arc<dyn CompetitionDisplay>> {
        let slot = self.competition.lock().await;
        slot.as_ref()
            .filter(|s| &s.id == session_id && !s.claimed)
            .map(|s| Arc::clone(&s.display))
    }

    /// Whether a competition round is currently open.
    pub async fn competition_running(&self) -> bool {
        self.competition
            .lock()
            .await
            .as_ref()
            .map_or(false, |s| !s.claimed)
    }
}
