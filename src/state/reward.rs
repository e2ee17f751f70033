//! Credit, streak and badge resolution for correct guesses.
//!
//! Wrong or missed guesses never reach this module; streaks only go up here.
//! Persistence is delegated to the [`crate::store::ProfileStore`]
//! collaborator, and by the time any of these run the triggering session has
//! already been torn down, so a failing store can never wedge a round.

use super::{GameError, GameState};
use crate::store::StreakOp;
use crate::types::{Badge, BadgeFlag, CoasterId, Difficulty, PlayerId, Profile};

/// Flat credit award for winning the public round.
pub const COMPETITION_CREDITS: u64 = 5;

/// What a correct guess earned, with the post-award stats for the reply card.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardOutcome {
    pub credits_delta: u64,
    pub credits: u64,
    pub streak: u32,
    pub best_streak: u32,
}

impl GameState {
    /// Award a correct personal guess: tier credits, a collection insert
    /// (idempotent) and a streak bump folded into `best_streak`.
    pub async fn award_personal(
        &self,
        player: &PlayerId,
        difficulty: Difficulty,
        coaster: CoasterId,
    ) -> Result<RewardOutcome, GameError> {
        self.store.insert_collected(player, coaster).await?;
        let delta = difficulty.credits();
        let profile = self
            .store
            .upsert_stats(player, delta, StreakOp::Increment)
            .await?;
        Ok(RewardOutcome {
            credits_delta: delta,
            credits: profile.credits,
            streak: profile.streak,
            best_streak: profile.best_streak,
        })
    }

    /// Award the competition win: flat +5 credits plus the sticky winner
    /// badge. The streak is personal-mode territory and stays untouched.
    pub async fn award_competition(&self, player: &PlayerId) -> Result<RewardOutcome, GameError> {
        let profile = self
            .store
            .upsert_stats(player, COMPETITION_CREDITS, StreakOp::Keep)
            .await?;
        self.store
            .set_badge_flag(player, BadgeFlag::CompetitionWinner)
            .await?;
        Ok(RewardOutcome {
            credits_delta: COMPETITION_CREDITS,
            credits: profile.credits,
            streak: profile.streak,
            best_streak: profile.best_streak,
        })
    }

    /// Sticky completion flag: set exactly once when the collection first
    /// reaches 100%. Never revoked, even if the catalog later grows and the
    /// percentage drops again.
    pub async fn note_completion(
        &self,
        player: &PlayerId,
        completion: f64,
    ) -> Result<(), GameError> {
        if completion < 100.0 {
            return Ok(());
        }
        let already = self
            .store
            .get_profile(player)
            .await?
            .map_or(false, |p| p.has_completed);
        if !already {
            self.store
                .set_badge_flag(player, BadgeFlag::HasCompleted)
                .await?;
            tracing::info!(player = %player, "collection completed");
        }
        Ok(())
    }
}

/// Collection completion percentage for a profile view.
pub fn completion_percent(collected: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        collected as f64 / total as f64 * 100.0
    }
}

/// Badges a profile has earned at the given completion percentage.
pub fn badges_for(profile: &Profile, completion: f64) -> Vec<Badge> {
    let mut badges = Vec::new();
    if completion >= 50.0 {
        badges.push(Badge::HalfCompletion);
    }
    if completion >= 100.0 || profile.has_completed {
        badges.push(Badge::FullCompletion);
    }
    if profile.best_streak >= 10 {
        badges.push(Badge::TenStreak);
    }
    if profile.best_streak >= 50 {
        badges.push(Badge::FiftyStreak);
    }
    if profile.contributor {
        badges.push(Badge::Contributor);
    }
    if profile.competition_winner {
        badges.push(Badge::CompetitionWinner);
    }
    if profile.credits >= 10_000 {
        badges.push(Badge::MicroCoaster);
    }
    badges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryProfileStore, ProfileStore};
    use std::sync::Arc;

    fn engine() -> (GameState, Arc<InMemoryProfileStore>) {
        let store = Arc::new(InMemoryProfileStore::new());
        (GameState::new(store.clone()), store)
    }

    #[tokio::test]
    async fn tier_deltas_are_one_two_three() {
        let (state, _) = engine();
        let alice = "alice".to_string();

        let easy = state
            .award_personal(&alice, Difficulty::Easy, 1)
            .await
            .unwrap();
        assert_eq!(easy.credits_delta, 1);
        let medium = state
            .award_personal(&alice, Difficulty::Medium, 2)
            .await
            .unwrap();
        assert_eq!(medium.credits_delta, 2);
        let hard = state
            .award_personal(&alice, Difficulty::Hard, 3)
            .await
            .unwrap();
        assert_eq!(hard.credits_delta, 3);
        assert_eq!(hard.credits, 6);
        assert_eq!(hard.streak, 3);
    }

    #[tokio::test]
    async fn unknown_tier_falls_back_to_easy_credit() {
        let (state, _) = engine();
        let reward = state
            .award_personal(&"alice".to_string(), Difficulty::parse("???"), 1)
            .await
            .unwrap();
        assert_eq!(reward.credits_delta, 1);
    }

    #[tokio::test]
    async fn reguessing_an_owned_coaster_still_pays_out() {
        let (state, store) = engine();
        let alice = "alice".to_string();

        state
            .award_personal(&alice, Difficulty::Easy, 42)
            .await
            .unwrap();
        let second = state
            .award_personal(&alice, Difficulty::Easy, 42)
            .await
            .unwrap();

        // Classic mode: credits and streak keep moving, the collection
        // does not double-count.
        assert_eq!(second.credits, 2);
        assert_eq!(second.streak, 2);
        let profile = store.get_profile(&alice).await.unwrap().unwrap();
        assert_eq!(profile.collected.len(), 1);
    }

    #[tokio::test]
    async fn competition_award_is_flat_five_plus_badge() {
        let (state, store) = engine();
        let alice = "alice".to_string();

        let reward = state.award_competition(&alice).await.unwrap();
        assert_eq!(reward.credits_delta, 5);
        assert_eq!(reward.streak, 0);

        let profile = store.get_profile(&alice).await.unwrap().unwrap();
        assert_eq!(profile.credits, 5);
        assert!(profile.competition_winner);

        // Winning again pays again but the badge stays a single flag.
        let again = state.award_competition(&alice).await.unwrap();
        assert_eq!(again.credits, 10);
        assert!(store
            .get_profile(&alice)
            .await
            .unwrap()
            .unwrap()
            .competition_winner);
    }

    #[tokio::test]
    async fn completion_flag_sets_once_and_sticks() {
        let (state, store) = engine();
        let alice = "alice".to_string();

        state.note_completion(&alice, 99.9).await.unwrap();
        assert!(store.get_profile(&alice).await.unwrap().is_none());

        state.note_completion(&alice, 100.0).await.unwrap();
        assert!(store
            .get_profile(&alice)
            .await
            .unwrap()
            .unwrap()
            .has_completed);

        // Catalog grew, percentage dropped: the flag does not flicker.
        state.note_completion(&alice, 80.0).await.unwrap();
        let profile = store.get_profile(&alice).await.unwrap().unwrap();
        assert!(profile.has_completed);
        assert!(badges_for(&profile, 80.0).contains(&Badge::FullCompletion));
    }

    #[test]
    fn completion_percent_handles_an_empty_catalog() {
        assert_eq!(completion_percent(0, 0), 0.0);
        assert_eq!(completion_percent(5, 10), 50.0);
        assert_eq!(completion_percent(10, 10), 100.0);
    }

    #[test]
    fn badge_thresholds() {
        let mut profile = Profile {
            best_streak: 12,
            credits: 10_000,
            competition_winner: true,
            ..Profile::default()
        };

        let badges = badges_for(&profile, 50.0);
        assert!(badges.contains(&Badge::HalfCompletion));
        assert!(!badges.contains(&Badge::FullCompletion));
        assert!(badges.contains(&Badge::TenStreak));
        assert!(!badges.contains(&Badge::FiftyStreak));
        assert!(badges.contains(&Badge::CompetitionWinner));
        assert!(badges.contains(&Badge::MicroCoaster));

        profile.best_streak = 50;
        let badges = badges_for(&profile, 100.0);
        assert!(badges.contains(&Badge::FullCompletion));
        assert!(badges.contains(&Badge::FiftyStreak));
    }
}
