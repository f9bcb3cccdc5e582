use serde::{Deserialize, Serialize};

use crate::error::ImportFormatError;
use crate::generator::GeneratorConfig;
use crate::level::MAX_LEVEL;
use crate::progress::{Achievements, GameStats, Settings};

/// Format version written by this build.
pub const BUNDLE_VERSION: u32 = 1;

/// Everything a player can carry between installs: statistics, settings and achievements.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SaveBundle {
    /// Format version the bundle was written with.
    pub version: u32,
    /// Statistics at export time.
    pub stats: GameStats,
    /// Settings at export time.
    pub settings: Settings,
    /// Achievements at export time.
    pub achievements: Achievements,
}

impl SaveBundle {
    /// Bundle the given state at [`BUNDLE_VERSION`].
    pub fn new(stats: GameStats, settings: Settings, achievements: Achievements) -> Self {
        Self {
            version: BUNDLE_VERSION,
            stats,
            settings,
            achievements,
        }
    }

    /// Pretty-printed JSON, suitable for a file the player downloads.
    pub fn to_json(&self) -> String {
        // a bundle is plain data with string keys, which always serializes
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Parse and check an exported bundle.
    ///
    /// Rejects anything that is not JSON of this shape, a version newer than [`BUNDLE_VERSION`],
    /// and a current level outside `1..=MAX_LEVEL`. Generator attempts are clamped to [`GeneratorConfig::MAX_ATTEMPTS`].
    pub fn from_json(text: &str) -> Result<Self, ImportFormatError> {
        let bundle: SaveBundle = serde_json::from_str(text)?;

        if bundle.version > BUNDLE_VERSION {
            return Err(ImportFormatError::UnsupportedVersion {
                found: bundle.version,
                supported: BUNDLE_VERSION,
            });
        }

        if !(1..=MAX_LEVEL).contains(&bundle.stats.current_level) {
            return Err(ImportFormatError::Invalid(format!(
                "current level {} is outside 1..={MAX_LEVEL}",
                bundle.stats.current_level
            )));
        }

        let settings = Settings {
            generator: bundle.settings.generator.sanitized(),
            ..bundle.settings
        };

        Ok(Self {
            settings,
            achievements: bundle.achievements.normalize(),
            ..bundle
        })
    }
}
