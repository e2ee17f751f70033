use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type SessionId = String;
pub type CoasterId = u64;

/// Fuzzy-match threshold for personal rounds (single beneficiary, stricter).
pub const PERSONAL_THRESHOLD: f64 = 0.8;

/// Fuzzy-match threshold for the public competition. Looser on purpose: the
/// race rewards being first, so the matcher errs toward not missing a real
/// winner.
pub const COMPETITION_THRESHOLD: f64 = 0.7;

/// Credit reward tier. Parsed from the catalog's free-form difficulty string;
/// anything unrecognized counts as Easy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Easy,
        }
    }

    /// Credits earned for a correct personal guess at this tier.
    pub fn credits(self) -> u64 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }
}

/// A catalog item as handed in by the command layer. The engine only matches
/// against `name`/`alias`; `image_url` is carried for display implementors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coaster {
    pub id: CoasterId,
    pub name: String,
    pub alias: Option<String>,
    pub difficulty: Difficulty,
    pub image_url: String,
}

/// Per-player stats record, owned by the persistent store.
///
/// `best_streak` is monotone; `contributor`, `competition_winner` and
/// `has_completed` are sticky once set. Everything else in [`Badge`] is
/// derived on read rather than stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub credits: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub collected: HashSet<CoasterId>,
    pub contributor: bool,
    pub competition_winner: bool,
    pub has_completed: bool,
}

/// The sticky flags the store persists directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeFlag {
    Contributor,
    CompetitionWinner,
    HasCompleted,
}

/// Badges shown on a profile, derived from thresholds on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    HalfCompletion,
    FullCompletion,
    TenStreak,
    FiftyStreak,
    Contributor,
    CompetitionWinner,
    MicroCoaster,
}
