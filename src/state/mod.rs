mod competition;
mod reward;
mod session;

pub use competition::ClaimOutcome;
pub use reward::{badges_for, completion_percent, RewardOutcome, COMPETITION_CREDITS};
pub use session::ResolveOutcome;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::display::CompetitionDisplay;
use crate::store::{ProfileStore, StoreError};
use crate::types::*;

/// Errors from engine operations.
///
/// Only `AlreadyRunning` and `Store` are meant for user-visible notices; the
/// rest are resolved by the message router and never leave the engine.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("no active session for this player")]
    SessionMissing,

    #[error("the session deadline has passed")]
    SessionExpired,

    #[error("no competition is running")]
    NoCompetition,

    #[error("the competition deadline has passed")]
    CompetitionExpired,

    #[error("the competition has already been won")]
    AlreadyClaimed,

    #[error("a competition is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A per-player guessing round.
pub(crate) struct PersonalSession {
    pub(crate) id: SessionId,
    pub(crate) coaster_id: CoasterId,
    pub(crate) target_name: String,
    pub(crate) target_alias: Option<String>,
    pub(crate) difficulty: Difficulty,
    pub(crate) deadline: DateTime<Utc>,
    pub(crate) expiry: Option<JoinHandle<()>>,
}

/// The single public guessing round.
pub(crate) struct CompetitionSession {
    pub(crate) id: SessionId,
    pub(crate) target_name: String,
    pub(crate) target_alias: Option<String>,
    pub(crate) deadline: DateTime<Utc>,
    pub(crate) claimed: bool,
    pub(crate) display: Arc<dyn CompetitionDisplay>,
    pub(crate) ticker: Option<JoinHandle<()>>,
    pub(crate) expiry: Option<JoinHandle<()>>,
}

/// Shared engine state: the per-player session map, the single competition
/// slot and the persistence collaborator.
///
/// There is no ambient global here; callers own an `Arc<GameState>` and tests
/// construct their own cell with whatever store they want to inject.
pub struct GameState {
    pub(crate) sessions: RwLock<HashMap<PlayerId, PersonalSession>>,
    pub(crate) competition: Mutex<Option<CompetitionSession>>,
    pub(crate) store: Arc<dyn ProfileStore>,
}

impl GameState {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            competition: Mutex::new(None),
            store,
        }
    }
}

/// What a routed chat message amounted to.
#[derive(Debug)]
pub enum GuessOutcome {
    CompetitionWon {
        player: PlayerId,
        answer: String,
        reward: RewardOutcome,
    },
    PersonalCorrect {
        player: PlayerId,
        answer: String,
        reward: RewardOutcome,
    },
}

impl GameState {
    /// Entry point for inbound chat messages.
    ///
    /// The competition gets first look, then the author's personal session.
    /// Misses, missing sessions, lost races and expiries all come back as
    /// `Ok(None)`: none of them are the author's problem. The only error that
    /// escapes is a store failure, and by the time it is returned the
    /// in-memory session has already been torn down, so the game loop never
    /// gets stuck on a broken store.
    pub async fn handle_message(
        self: &Arc<Self>,
        author: &PlayerId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<GuessOutcome>, GameError> {
        match self.claim(author, text, now).await {
            Ok(ClaimOutcome::Won { answer }) => {
                let reward = self.award_competition(author).await?;
                return Ok(Some(GuessOutcome::CompetitionWon {
                    player: author.clone(),
                    answer,
                    reward,
                }));
            }
            Ok(ClaimOutcome::NoMatch) => {}
            Err(
                GameError::NoCompetition
                | GameError::CompetitionExpired
                | GameError::AlreadyClaimed,
            ) => {}
            Err(e) => return Err(e),
        }

        match self.resolve(author, text, now).await {
            Ok(ResolveOutcome::Correct {
                answer,
                difficulty,
                coaster_id,
            }) => {
                let reward = self.award_personal(author, difficulty, coaster_id).await?;
                Ok(Some(GuessOutcome::PersonalCorrect {
                    player: author.clone(),
                    answer,
                    reward,
                }))
            }
            Ok(ResolveOutcome::Incorrect) => Ok(None),
            Err(GameError::SessionMissing | GameError::SessionExpired) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::testing::RecordingDisplay;
    use crate::store::InMemoryProfileStore;
    use async_trait::async_trait;
    use std::time::Duration;

    fn coaster(name: &str) -> Coaster {
        Coaster {
            id: 1,
            name: name.to_string(),
            alias: None,
            difficulty: Difficulty::Easy,
            image_url: "https://example.com/ride.jpg".to_string(),
        }
    }

    fn engine() -> (Arc<GameState>, Arc<InMemoryProfileStore>) {
        let store = Arc::new(InMemoryProfileStore::new());
        (Arc::new(GameState::new(store.clone())), store)
    }

    #[tokio::test]
    async fn message_with_no_sessions_is_ignored() {
        let (state, _) = engine();
        let result = state
            .handle_message(&"alice".to_string(), "steel vengeance", Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn personal_win_flows_through_to_the_reward() {
        let (state, store) = engine();
        let alice = "alice".to_string();
        state
            .start_personal(&alice, &coaster("Steel Vengeance"), Duration::from_secs(60))
            .await;

        let outcome = state
            .handle_message(&alice, "steel vengeance", Utc::now())
            .await
            .unwrap()
            .expect("correct guess should win");

        match outcome {
            GuessOutcome::PersonalCorrect { answer, reward, .. } => {
                assert_eq!(answer, "Steel Vengeance");
                assert_eq!(reward.credits_delta, 1);
                assert_eq!(reward.streak, 1);
            }
            other => panic!("expected PersonalCorrect, got {:?}", other),
        }

        let profile = store.get_profile(&alice).await.unwrap().unwrap();
        assert_eq!(profile.credits, 1);
        assert!(profile.collected.contains(&1));
    }

    #[tokio::test]
    async fn competition_gets_first_look_and_personal_round_survives() {
        let (state, _) = engine();
        let alice = "alice".to_string();
        let display = Arc::new(RecordingDisplay::new());

        state
            .start_personal(&alice, &coaster("Steel Vengeance"), Duration::from_secs(60))
            .await;
        state
            .start_competition(
                &coaster("Steel Vengeance"),
                Duration::from_secs(60),
                display.clone(),
            )
            .await
            .unwrap();

        let outcome = state
            .handle_message(&alice, "steel vengeance", Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, GuessOutcome::CompetitionWon { .. }));

        // The personal round was not consumed by the competition win.
        assert!(state.has_personal(&alice).await);
    }

    struct FailingStore;

    #[async_trait]
    impl ProfileStore for FailingStore {
        async fn get_profile(&self, _: &PlayerId) -> Result<Option<Profile>, StoreError> {
            Err(StoreError::Unavailable)
        }
        async fn insert_collected(&self, _: &PlayerId, _: CoasterId) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
        async fn upsert_stats(
            &self,
            _: &PlayerId,
            _: u64,
            _: crate::store::StreakOp,
        ) -> Result<Profile, StoreError> {
            Err(StoreError::Unavailable)
        }
        async fn set_badge_flag(&self, _: &PlayerId, _: BadgeFlag) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    #[tokio::test]
    async fn store_failure_surfaces_but_session_is_still_cleared() {
        let state = Arc::new(GameState::new(Arc::new(FailingStore)));
        let alice = "alice".to_string();
        state
            .start_personal(&alice, &coaster("Steel Vengeance"), Duration::from_secs(60))
            .await;

        let result = state
            .handle_message(&alice, "steel vengeance", Utc::now())
            .await;
        assert!(matches!(result, Err(GameError::Store(_))));

        // No stuck session: the round was spent before the store write.
        assert!(!state.has_personal(&alice).await);
    }
}
