use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument, warn};

use crate::board::Board;
use crate::connectivity::Connectivity;
use crate::error::{ConfigurationError, ImportFormatError, PersistenceError};
use crate::generator::{self, GeneratorConfig};
use crate::level::{LevelParams, MAX_LEVEL};
use crate::location::Location;
use crate::progress::{Achievement, Achievements, GameStats, Settings};
use crate::shape::Rotation;
use crate::storage::{self, Storage, ACHIEVEMENTS_KEY, SETTINGS_KEY, STATS_KEY};
use crate::transfer::SaveBundle;

const HALFWAY_LEVEL: u32 = 5;
const HIGH_VOLTAGE_SCORE: u64 = 5000;
const MARATHON_SECS: u64 = 60 * 60;

/// What finishing a level earned.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LevelReport {
    /// The level that was solved.
    pub level: u32,
    /// Rotations it took.
    pub moves: u32,
    /// Par for the level.
    pub par: u32,
    /// Whether `moves` was within par.
    pub efficient: bool,
    /// Points added to the total.
    pub score: u64,
    /// Achievements unlocked by this finish, not including ones already held.
    pub unlocked: Vec<Achievement>,
}

/// The result of asking a [`GameSession`] to rotate a cell.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RotateOutcome {
    /// Nothing changed: the cell cannot turn, is off the board, or the level is already solved.
    Ignored,
    /// The cell turned and the level is still unsolved.
    Rotated {
        /// Where the cell now points.
        rotation: Rotation,
    },
    /// The cell turned and that powered every target.
    Solved(LevelReport),
}

/// One player's game: the board being played plus statistics, settings and achievements, and where they are stored.
///
/// The board is owned here alone and replaced wholesale whenever a level starts.
/// Connectivity is recomputed after every accepted rotation.
pub struct GameSession<S: Storage> {
    storage: S,
    rng: StdRng,
    stats: GameStats,
    settings: Settings,
    achievements: Achievements,
    params: LevelParams,
    board: Board,
    connectivity: Connectivity,
    moves: u32,
    finished: bool,
}

impl<S: Storage> GameSession<S> {
    /// Load saved state from `storage` (falling back to defaults) and start the saved current level.
    pub fn new(storage: S) -> Result<Self, ConfigurationError> {
        Self::with_rng(storage, StdRng::from_os_rng())
    }

    /// [`Self::new`] with boards generated from a fixed seed.
    pub fn with_seed(storage: S, seed: u64) -> Result<Self, ConfigurationError> {
        Self::with_rng(storage, StdRng::seed_from_u64(seed))
    }

    /// [`Self::new`] with boards generated from `rng`.
    ///
    /// Stored generator settings that cannot produce the saved level are replaced with the defaults,
    /// so the only error left is one the defaults hit as well.
    pub fn with_rng(storage: S, mut rng: StdRng) -> Result<Self, ConfigurationError> {
        let mut stats: GameStats = storage::load_or_default(&storage, STATS_KEY);
        let mut settings: Settings = storage::load_or_default(&storage, SETTINGS_KEY);
        let achievements = storage::load_or_default::<Achievements>(&storage, ACHIEVEMENTS_KEY).normalize();

        settings.generator = settings.generator.sanitized();
        stats.current_level = stats.current_level.clamp(1, MAX_LEVEL);
        let params = LevelParams::for_level(stats.current_level, settings.difficulty);
        let board = generate_or_fall_back(&mut settings.generator, &params, &mut rng)?;
        let connectivity = board.connectivity();

        info!(level = params.level, size = params.size, "session started");

        Ok(Self {
            storage,
            rng,
            stats,
            settings,
            achievements,
            params,
            board,
            connectivity,
            moves: 0,
            finished: false,
        })
    }

    /// The board in play.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Power on the board as of the last accepted rotation.
    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// The level being played.
    pub fn level(&self) -> u32 {
        self.params.level
    }

    /// Parameters of the level being played.
    pub fn params(&self) -> &LevelParams {
        &self.params
    }

    /// Accepted rotations since the level started.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Par for the level being played.
    pub fn par(&self) -> u32 {
        self.params.par
    }

    /// The current level has been solved; rotations are ignored until another level starts.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Running statistics.
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Achievement unlock state.
    pub fn achievements(&self) -> &Achievements {
        &self.achievements
    }

    /// Where progress is saved.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Throw away the current board and start `level` (clamped to `1..=MAX_LEVEL`) with a fresh one.
    ///
    /// The fresh board is never already solved. Generator settings that cannot produce it are replaced with the defaults;
    /// if the defaults fail too, the current board stays in play.
    #[instrument(skip(self))]
    pub fn start_level(&mut self, level: u32) -> Result<(), ConfigurationError> {
        let params = LevelParams::for_level(level, self.settings.difficulty);
        let board = generate_or_fall_back(&mut self.settings.generator, &params, &mut self.rng)?;
        self.install(params, board);
        self.stats.last_moves = 0;
        info!(level = self.params.level, size = self.params.size, par = self.params.par, "level started");
        Ok(())
    }

    pub(crate) fn install(&mut self, params: LevelParams, board: Board) {
        self.connectivity = board.connectivity();
        self.board = board;
        self.params = params;
        self.moves = 0;
        self.finished = false;
        self.stats.current_level = params.level;
    }

    /// Start the current level again on a fresh board.
    pub fn restart_level(&mut self) -> Result<(), ConfigurationError> {
        self.start_level(self.params.level)
    }

    /// Start the level after this one, or this one again at [`MAX_LEVEL`].
    pub fn next_level(&mut self) -> Result<(), ConfigurationError> {
        self.start_level(self.params.level.saturating_add(1))
    }

    /// Rotate the piece at `location` a quarter turn clockwise and re-check the circuit.
    ///
    /// Refused rotations are not errors here; they come back as [`RotateOutcome::Ignored`] and do not count as moves.
    pub fn rotate(&mut self, location: Location) -> RotateOutcome {
        if self.finished {
            debug!(x = location.0, y = location.1, "level already solved, ignoring rotation");
            return RotateOutcome::Ignored;
        }

        let rotation = match self.board.rotate(location) {
            Ok(rotation) => rotation,
            Err(e) => {
                debug!(error = %e, "rotation ignored");
                return RotateOutcome::Ignored;
            }
        };

        self.moves += 1;
        self.stats.last_moves = self.moves;
        self.connectivity = self.board.connectivity();

        if self.connectivity.is_solved() {
            let report = self.complete_level();
            self.autosave();
            return RotateOutcome::Solved(report);
        }

        self.autosave();
        RotateOutcome::Rotated { rotation }
    }

    fn complete_level(&mut self) -> LevelReport {
        self.finished = true;

        let level = self.params.level;
        let efficient = self.params.is_efficient(self.moves);
        let score = self.params.score(self.moves);

        self.stats.total_score += score;
        self.stats.mark_completed(level);
        self.stats.current_level = (level + 1).min(MAX_LEVEL);

        let mut earned = vec![Achievement::FirstSpark];
        if efficient {
            earned.push(Achievement::Efficient);
        }
        if self.moves * 2 <= self.params.par {
            earned.push(Achievement::Surgical);
        }
        if self.stats.current_level >= HALFWAY_LEVEL {
            earned.push(Achievement::Halfway);
        }
        if (1..=MAX_LEVEL).all(|level| self.stats.is_completed(level)) {
            earned.push(Achievement::MasterElectrician);
        }
        if self.stats.total_score >= HIGH_VOLTAGE_SCORE {
            earned.push(Achievement::HighVoltage);
        }
        if self.stats.play_time_secs >= MARATHON_SECS {
            earned.push(Achievement::Marathon);
        }

        let unlocked: Vec<Achievement> = earned.into_iter()
            .filter(|achievement| self.achievements.unlock(*achievement))
            .collect();

        info!(level, moves = self.moves, par = self.params.par, score, ?unlocked, "level solved");

        LevelReport {
            level,
            moves: self.moves,
            par: self.params.par,
            efficient,
            score,
            unlocked,
        }
    }

    /// A cell worth rotating next on the way to some solution, if the board can still be solved.
    pub fn hint(&self) -> Option<Location> {
        if self.connectivity.is_solved() {
            return None;
        }

        self.board.solution().ok()?.next_move(&self.board)
    }

    /// Add time spent playing to the running total. The caller owns the clock.
    pub fn add_play_time(&mut self, elapsed: Duration) {
        self.stats.play_time_secs = self.stats.play_time_secs.saturating_add(elapsed.as_secs());
        if self.stats.play_time_secs >= MARATHON_SECS && self.achievements.unlock(Achievement::Marathon) {
            info!("marathon achievement unlocked");
        }
    }

    /// Replace the settings. Difficulty and generator changes apply from the next level started.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = Settings {
            generator: settings.generator.sanitized(),
            ..settings
        };
        self.autosave();
    }

    /// Write statistics, settings and achievements to storage.
    pub fn try_save(&mut self) -> Result<(), PersistenceError> {
        storage::store(&mut self.storage, STATS_KEY, &self.stats)?;
        storage::store(&mut self.storage, SETTINGS_KEY, &self.settings)?;
        storage::store(&mut self.storage, ACHIEVEMENTS_KEY, &self.achievements)?;
        Ok(())
    }

    /// [`Self::try_save`], logging instead of returning any failure.
    pub fn save(&mut self) {
        if let Err(e) = self.try_save() {
            warn!(error = %e, "could not save progress");
        }
    }

    fn autosave(&mut self) {
        if self.settings.autosave {
            self.save();
        }
    }

    /// Statistics, settings and achievements as one [`SaveBundle`].
    pub fn bundle(&self) -> SaveBundle {
        SaveBundle::new(self.stats.clone(), self.settings.clone(), self.achievements.clone())
    }

    /// Statistics, settings and achievements as pretty-printed JSON for the player to keep.
    pub fn export_json(&self) -> String {
        self.bundle().to_json()
    }

    /// Replace statistics, settings and achievements with an exported bundle and start its current level.
    ///
    /// Anything wrong with `text` is logged and returned, and leaves the session exactly as it was.
    /// Generator settings that cannot produce the imported level are replaced with the defaults.
    pub fn import_json(&mut self, text: &str) -> Result<(), ImportFormatError> {
        let mut bundle = SaveBundle::from_json(text).inspect_err(|e| {
            warn!(error = %e, "rejected imported save");
        })?;

        let params = LevelParams::for_level(bundle.stats.current_level, bundle.settings.difficulty);
        let board = generate_or_fall_back(&mut bundle.settings.generator, &params, &mut self.rng)
            .map_err(|e| ImportFormatError::Invalid(e.to_string()))
            .inspect_err(|e| {
                warn!(error = %e, "rejected imported save");
            })?;

        self.stats = bundle.stats;
        self.settings = bundle.settings;
        self.achievements = bundle.achievements;
        self.install(params, board);
        info!(level = self.params.level, "imported save");

        self.autosave();
        Ok(())
    }
}

/// Generate a board for `params` with `config`, and if that fails, with the default config instead.
///
/// On fallback `config` is reset to the default so later levels do not fail the same way.
fn generate_or_fall_back(
    config: &mut GeneratorConfig,
    params: &LevelParams,
    rng: &mut StdRng,
) -> Result<Board, ConfigurationError> {
    match generator::generate_level(config, params, rng) {
        Ok(board) => Ok(board),
        Err(e) if *config != GeneratorConfig::default() => {
            warn!(error = %e, level = params.level, "generator settings failed, falling back to defaults");
            *config = GeneratorConfig::default();
            generator::generate_level(config, params, rng)
        }
        Err(e) => Err(e),
    }
}
