use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr, VariantArray};

use crate::generator::GeneratorConfig;
use crate::level::{Difficulty, MAX_LEVEL};

/// Running totals across every session, persisted as one blob.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStats {
    /// 1-based level the player is on.
    pub current_level: u32,
    /// Points banked over every solved level.
    pub total_score: u64,
    /// Moves made on the most recently played level.
    pub last_moves: u32,
    /// `completed[n]` is whether level `n + 1` has ever been solved.
    pub completed: Vec<bool>,
    /// Whole seconds spent playing.
    pub play_time_secs: u64,
}

impl Default for GameStats {
    fn default() -> Self {
        Self {
            current_level: 1,
            total_score: 0,
            last_moves: 0,
            completed: vec![false; MAX_LEVEL as usize],
            play_time_secs: 0,
        }
    }
}

impl GameStats {
    /// Whether `level` (1-based) has ever been solved.
    pub fn is_completed(&self, level: u32) -> bool {
        level
            .checked_sub(1)
            .and_then(|index| self.completed.get(index as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Record `level` (1-based) as solved. Level 0 is ignored.
    pub fn mark_completed(&mut self, level: u32) {
        let Some(index) = level.checked_sub(1).map(|index| index as usize) else {
            return;
        };
        if self.completed.len() <= index {
            self.completed.resize(index + 1, false);
        }
        self.completed[index] = true;
    }

    /// How many distinct levels have been solved.
    pub fn completed_count(&self) -> usize {
        self.completed.iter().filter(|done| **done).count()
    }
}

/// Player preferences, persisted as one blob.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Play sound effects.
    pub sound: bool,
    /// Animate rotations and power flow.
    pub animations: bool,
    /// Which level table to play.
    pub difficulty: Difficulty,
    /// Write progress to storage after every accepted move and every finished level.
    pub autosave: bool,
    /// How boards are generated.
    pub generator: GeneratorConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound: true,
            animations: true,
            difficulty: Difficulty::default(),
            autosave: true,
            generator: GeneratorConfig::default(),
        }
    }
}

/// Every achievement there is. The serialized id is the snake_case variant name.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, VariantArray, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Achievement {
    /// Solve any level.
    FirstSpark,
    /// Solve a level within par.
    Efficient,
    /// Solve a level in half of par or fewer moves.
    Surgical,
    /// Reach level 5.
    Halfway,
    /// Solve every level.
    MasterElectrician,
    /// Bank 5000 points.
    HighVoltage,
    /// Play for an hour in total.
    Marathon,
}

impl Achievement {
    /// The stable id stored in saves, e.g. `first_spark`.
    pub fn id(&self) -> &'static str {
        self.into()
    }
}

/// One stored achievement, which may name an achievement this build does not know.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AchievementEntry {
    /// See [`Achievement::id`].
    pub id: String,
    /// Whether it has been earned.
    pub unlocked: bool,
}

/// Unlock state of every achievement, persisted as one blob.
///
/// Entries with ids this build does not know are kept as they are, so nothing is lost when an older build rewrites a newer save.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Achievements {
    entries: Vec<AchievementEntry>,
}

impl Default for Achievements {
    fn default() -> Self {
        Self {
            entries: Achievement::VARIANTS
                .iter()
                .map(|achievement| AchievementEntry { id: achievement.id().to_owned(), unlocked: false })
                .collect(),
        }
    }
}

impl Achievements {
    /// Add a locked entry for every known achievement missing from a loaded list.
    pub fn normalize(mut self) -> Self {
        for achievement in Achievement::VARIANTS {
            if !self.entries.iter().any(|entry| entry.id == achievement.id()) {
                self.entries.push(AchievementEntry { id: achievement.id().to_owned(), unlocked: false });
            }
        }
        self
    }

    /// Every entry, known ids first in declaration order.
    pub fn entries(&self) -> &[AchievementEntry] {
        &self.entries
    }

    /// Whether `achievement` has been earned.
    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.entries.iter().any(|entry| entry.id == achievement.id() && entry.unlocked)
    }

    /// Unlock `achievement`, returning whether it was locked before.
    pub fn unlock(&mut self, achievement: Achievement) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == achievement.id()) {
            Some(entry) if entry.unlocked => false,
            Some(entry) => {
                entry.unlocked = true;
                true
            }
            None => {
                self.entries.push(AchievementEntry { id: achievement.id().to_owned(), unlocked: true });
                true
            }
        }
    }

    /// Every known achievement that has been earned.
    pub fn unlocked(&self) -> impl Iterator<Item = Achievement> + '_ {
        self.entries
            .iter()
            .filter(|entry| entry.unlocked)
            .filter_map(|entry| entry.id.parse().ok())
    }
}
