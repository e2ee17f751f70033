//! Persistence boundary for player profiles and collections.
//!
//! The engine never talks to a database directly; it goes through
//! [`ProfileStore`]. The in-memory implementation backs the test suite and
//! doubles as the reference for what the SQL-backed collaborator must do.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::types::{BadgeFlag, CoasterId, PlayerId, Profile};

/// Errors from the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store query failed: {0}")]
    Query(String),

    #[error("store connection unavailable")]
    Unavailable,
}

/// How a stats upsert should treat the player's streak counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOp {
    /// Bump the streak and fold it into `best_streak`.
    Increment,
    /// Leave the streak untouched (competition wins).
    Keep,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, player: &PlayerId) -> Result<Option<Profile>, StoreError>;

    /// Record a coaster as collected. Idempotent: re-collecting the same
    /// coaster never grows the set.
    async fn insert_collected(
        &self,
        player: &PlayerId,
        coaster: CoasterId,
    ) -> Result<(), StoreError>;

    /// Apply a credit delta and streak operation, creating the record if the
    /// player has never played. Returns the updated profile.
    async fn upsert_stats(
        &self,
        player: &PlayerId,
        credits_delta: u64,
        streak: StreakOp,
    ) -> Result<Profile, StoreError>;

    /// Set a sticky badge flag. Setting an already-set flag is a no-op.
    async fn set_badge_flag(&self, player: &PlayerId, flag: BadgeFlag) -> Result<(), StoreError>;
}

/// In-memory [`ProfileStore`] used by tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<PlayerId, Profile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, player: &PlayerId) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(player).cloned())
    }

    async fn insert_collected(
        &self,
        player: &PlayerId,
        coaster: CoasterId,
    ) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        profiles
            .entry(player.clone())
            .or_default()
            .collected
            .insert(coaster);
        Ok(())
    }

    async fn upsert_stats(
        &self,
        player: &PlayerId,
        credits_delta: u64,
        streak: StreakOp,
    ) -> Result<Profile, StoreError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles.entry(player.clone()).or_default();
        profile.credits += credits_delta;
        if streak == StreakOp::Increment {
            profile.streak += 1;
            profile.best_streak = profile.best_streak.max(profile.streak);
        }
        Ok(profile.clone())
    }

    async fn set_badge_flag(&self, player: &PlayerId, flag: BadgeFlag) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles.entry(player.clone()).or_default();
        match flag {
            BadgeFlag::Contributor => profile.contributor = true,
            BadgeFlag::CompetitionWinner => profile.competition_winner = true,
            BadgeFlag::HasCompleted => profile.has_completed = true,
        }
        Ok(())
    }
}
