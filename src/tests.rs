#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::num::NonZero;

    use itertools::Itertools;
    use strum::VariantArray;

    use crate::builder::{BoardBuilder, BuilderInvalidReason};
    use crate::cell::{Cell, PieceKind};
    use crate::error::InvalidOperation;
    use crate::location::Location;
    use crate::shape::{Direction, Rotation};
    use crate::Board;

    pub(super) fn board(text: &str) -> Board {
        BoardBuilder::from_glyphs(text).build().unwrap()
    }

    fn exits(kind: PieceKind, rotation: Rotation) -> HashSet<Direction> {
        Cell::new(kind, rotation).exits()
    }

    #[test]
    fn display_matches_glyphs() {
        let board = board("S─┐
##│
T─┘");

        assert_eq!(format!("{}", board), "S─┐
##│
T─┘
");
        assert_eq!(board.sources(), &[Location(0, 0)]);
        assert_eq!(board.targets(), &[Location(0, 2)]);
    }

    #[test]
    fn empty_builder() {
        let board = BoardBuilder::with_dims((NonZero::new(3).unwrap(), NonZero::new(2).unwrap()))
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), "...
...
");
        assert_eq!(board.width(), 3);
        assert_eq!(board.height(), 2);
    }

    #[test]
    fn builder_places_pieces() {
        let board = BoardBuilder::square(NonZero::new(3).unwrap())
            .fill(PieceKind::Straight, Rotation::Deg90)
            .add_source(Location(0, 1))
            .add_target(Location(2, 1))
            .place(Location(1, 0), PieceKind::Corner, Rotation::Deg180)
            .place(Location(1, 2), PieceKind::Blocker, Rotation::Deg0)
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), "─┐─
S─T
─#─
");
    }

    #[test]
    fn builder_rejects_out_of_bounds() {
        let mut builder = BoardBuilder::square(NonZero::new(2).unwrap());
        builder.add_source(Location(2, 0));

        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::FeatureOutOfBounds]));
        assert!(builder.build().is_err());
    }

    #[test]
    fn builder_rejects_overlapping_endpoints() {
        let mut builder = BoardBuilder::square(NonZero::new(2).unwrap());
        builder.add_source(Location(1, 1)).add_target(Location(1, 1));

        assert_eq!(builder.build().unwrap_err(), &vec![BuilderInvalidReason::Overlapping]);
    }

    #[test]
    fn builder_rejects_overwriting_endpoint() {
        let mut builder = BoardBuilder::square(NonZero::new(2).unwrap());
        builder.add_target(Location(0, 0)).place(Location(0, 0), PieceKind::Cross, Rotation::Deg0);

        assert_eq!(builder.build().unwrap_err(), &vec![BuilderInvalidReason::EndpointOverwritten]);
    }

    #[test]
    fn builder_stays_invalid() {
        let mut builder = BoardBuilder::square(NonZero::new(2).unwrap());
        builder.add_source(Location(5, 5)).add_source(Location(0, 0));

        // the second call is a no-op once the builder is invalid
        assert_eq!(builder.is_valid().map(Vec::len), Some(1));
    }

    #[test]
    fn unparseable_glyphs() {
        for text in ["", "S?T", "ST\nS", "\n\n"] {
            assert_eq!(
                BoardBuilder::from_glyphs(text).build().unwrap_err(),
                &vec![BuilderInvalidReason::Unparseable],
                "{text:?}"
            );
        }
    }

    #[test]
    fn straight_exits() {
        for rotation in Rotation::VARIANTS {
            let open = exits(PieceKind::Straight, *rotation);
            match rotation {
                Rotation::Deg0 | Rotation::Deg180 => {
                    assert_eq!(open, HashSet::from([Direction::Up, Direction::Down]));
                    assert!(!open.contains(&Direction::Left) && !open.contains(&Direction::Right));
                }
                Rotation::Deg90 | Rotation::Deg270 => {
                    assert_eq!(open, HashSet::from([Direction::Left, Direction::Right]));
                    assert!(!open.contains(&Direction::Up) && !open.contains(&Direction::Down));
                }
            }
        }
    }

    #[test]
    fn corner_cycles_through_four_orientations() {
        let cycle = Rotation::VARIANTS.iter()
            .map(|rotation| exits(PieceKind::Corner, *rotation).into_iter().sorted().collect_vec())
            .collect_vec();

        assert_eq!(cycle, vec![
            vec![Direction::Up, Direction::Right],
            vec![Direction::Right, Direction::Down],
            vec![Direction::Down, Direction::Left],
            vec![Direction::Up, Direction::Left],
        ]);
        assert_eq!(cycle.iter().unique().count(), 4);
        for pair in &cycle {
            assert_eq!(pair.len(), 2);
            assert_ne!(pair[0].invert(), pair[1], "corner exits must be adjacent");
        }
    }

    #[test]
    fn fixed_exit_sets() {
        let all: HashSet<Direction> = Direction::VARIANTS.iter().copied().collect();
        for rotation in Rotation::VARIANTS {
            assert_eq!(exits(PieceKind::Cross, *rotation), all);
            assert_eq!(exits(PieceKind::Source, *rotation), all);
            assert_eq!(exits(PieceKind::Target, *rotation), all);
            assert!(exits(PieceKind::Blocker, *rotation).is_empty());
            assert!(exits(PieceKind::Empty, *rotation).is_empty());
        }
    }

    #[test]
    fn distinct_orientation_counts() {
        let count = |kind| Cell::new(kind, Rotation::Deg0).distinct_orientations().len();
        assert_eq!(count(PieceKind::Straight), 2);
        assert_eq!(count(PieceKind::Corner), 4);
        assert_eq!(count(PieceKind::Cross), 1);
        assert_eq!(count(PieceKind::Blocker), 1);
    }

    #[test]
    fn rotation_wraps_and_converts() {
        assert_eq!(Rotation::Deg270.next(), Rotation::Deg0);
        assert_eq!(Rotation::Deg0.next(), Rotation::Deg90);
        assert_eq!(Rotation::Deg270.degrees(), 270);
        assert_eq!(Rotation::from_quarter_turns(6), Rotation::Deg180);
        assert_eq!(Rotation::Deg90.to_string(), "90°");
        assert_eq!(Direction::Up.rotated(Rotation::Deg270), Direction::Left);
    }

    #[test]
    fn endpoints_never_rotate() {
        let mut board = board("S┼
#T");
        let before = board.clone();

        assert_eq!(
            board.rotate(Location(0, 0)),
            Err(InvalidOperation::Immutable { location: Location(0, 0), kind: PieceKind::Source })
        );
        assert_eq!(
            board.rotate(Location(1, 1)),
            Err(InvalidOperation::Immutable { location: Location(1, 1), kind: PieceKind::Target })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn empty_and_off_board_never_rotate() {
        let mut board = board("S.T");

        assert!(matches!(board.rotate(Location(1, 0)), Err(InvalidOperation::Immutable { .. })));
        assert_eq!(
            board.rotate(Location(3, 0)),
            Err(InvalidOperation::OutOfBounds { location: Location(3, 0) })
        );
        assert_eq!(board.to_string(), "S.T\n");
    }

    #[test]
    fn four_rotations_are_identity() {
        for kind in [PieceKind::Straight, PieceKind::Corner, PieceKind::Cross, PieceKind::Blocker] {
            for rotation in Rotation::VARIANTS {
                let mut board = BoardBuilder::square(NonZero::new(2).unwrap())
                    .place(Location(1, 0), kind, *rotation)
                    .build()
                    .unwrap();
                let before = board.clone();

                let turns = (0..4).map(|_| board.rotate(Location(1, 0)).unwrap()).collect_vec();
                assert_eq!(turns.len(), 4);
                assert_eq!(turns[0], rotation.next());
                assert_eq!(board, before, "{kind:?} at {rotation}");
            }
        }
    }

    mod connectivity {
        use std::num::NonZero;

        use crate::builder::BoardBuilder;
        use crate::location::Location;

        use super::board;

        #[test]
        fn adjacent_endpoints() {
            assert!(board("ST").is_solved());
        }

        #[test]
        fn blocker_between_endpoints() {
            let board = board("S#T");
            let connectivity = board.connectivity();

            assert!(!connectivity.is_solved());
            assert!(connectivity.is_powered(Location(0, 0)));
            assert!(!connectivity.is_powered(Location(2, 0)));
        }

        #[test]
        fn edges_must_be_open_on_both_sides() {
            // the source faces the straight, but the straight runs up and down
            let mut board = board("S│T");
            assert!(!board.is_solved());
            assert!(!board.connectivity().is_connected(Location(1, 0)));

            board.rotate(Location(1, 0)).unwrap();
            assert_eq!(board.to_string(), "S─T\n");
            assert!(board.is_solved());
        }

        #[test]
        fn powered_path() {
            let board = board("S─┐
##│
T─┘");
            let connectivity = board.connectivity();

            assert!(connectivity.is_solved());
            assert_eq!(connectivity.powered().len(), 7);
            assert!(!connectivity.is_powered(Location(0, 1)));
            assert!(!connectivity.is_connected(Location(1, 1)));
            assert_eq!(connectivity.target_progress(), (1, 1));
        }

        #[test]
        fn every_source_feeds_power() {
            let board = board("S─T
###
T─S");
            assert!(board.is_solved());

            let broken = super::board("S─T
###
T│S");
            let connectivity = broken.connectivity();
            assert!(!connectivity.is_solved());
            assert_eq!(connectivity.target_progress(), (1, 2));
        }

        #[test]
        fn connected_but_unpowered() {
            let board = board("S#─┼");
            let connectivity = board.connectivity();

            assert!(connectivity.is_connected(Location(2, 0)));
            assert!(connectivity.is_connected(Location(3, 0)));
            assert!(!connectivity.is_powered(Location(2, 0)));
            // no targets, so nothing is left to power
            assert!(connectivity.is_solved());
        }

        #[test]
        fn no_targets_is_solved() {
            let board = BoardBuilder::square(NonZero::new(2).unwrap()).build().unwrap();
            assert!(board.sources().is_empty());
            assert!(board.is_solved());
        }

        #[test]
        fn target_without_source_is_unsolved() {
            let board = board("┼T");
            assert!(!board.is_solved());
            assert!(board.connectivity().powered().is_empty());
        }

        #[test]
        fn evaluation_is_deterministic() {
            let board = board("S┐└T
┼#│─
┘┌┐T");
            let first = board.connectivity();
            for _ in 0..5 {
                assert_eq!(board.connectivity(), first);
            }
        }
    }

    mod solver {
        use std::num::NonZero;

        use crate::builder::BoardBuilder;
        use crate::location::Location;
        use crate::shape::Rotation;
        use crate::solver::SolverFailure;

        use super::board;

        #[test]
        fn single_turn() {
            let board = board("S│T");
            let solution = board.solution().unwrap();

            assert_eq!(solution.rotation_at(Location(1, 0)), Some(Rotation::Deg90));
            assert_eq!(solution.moves_from(&board), 1);
            assert_eq!(solution.next_move(&board), Some(Location(1, 0)));
        }

        #[test]
        fn staircase_of_corners() {
            let board = board("S┐┐
┐┐┐
┐┐T");
            assert!(!board.is_solved());

            let solved = board.clone().solve().unwrap();
            assert!(solved.is_solved());
            assert_eq!(solved.sources(), board.sources());
            assert_eq!(solved.cell(Location(0, 0)), board.cell(Location(0, 0)));
        }

        #[test]
        fn straights_cannot_turn_corners() {
            let board = board("S││
│││
││T");
            assert_eq!(board.solution(), Err(SolverFailure::Inconsistent));
        }

        #[test]
        fn walled_in_target() {
            assert_eq!(board("S#T").solution(), Err(SolverFailure::Inconsistent));
            assert_eq!(board("S┼┼
┼##
┼#T").solution(), Err(SolverFailure::Inconsistent));
        }

        #[test]
        fn target_without_source() {
            assert_eq!(board("┼T").solution(), Err(SolverFailure::Inconsistent));
        }

        #[test]
        fn nothing_to_power() {
            let board = BoardBuilder::square(NonZero::new(2).unwrap()).build().unwrap();
            let solution = board.solution().unwrap();
            assert_eq!(solution.moves_from(&board), 0);
            assert_eq!(solution.next_move(&board), None);
        }

        #[test]
        fn applied_solution_powers_every_target() {
            let mut board = board("S┐─│T
│┘┐└─
┌─T│┐
T└┘┌┐");
            let solution = board.solution().unwrap();
            board.apply(&solution);

            assert!(board.is_solved());
            assert_eq!(solution.moves_from(&board), 0);
        }

        #[test]
        fn equivalent_straight_needs_no_turn() {
            // a straight at 180 is already vertical
            let board = BoardBuilder::square(NonZero::new(3).unwrap())
                .add_source(Location(1, 0))
                .place(Location(1, 1), crate::PieceKind::Straight, Rotation::Deg180)
                .add_target(Location(1, 2))
                .build()
                .unwrap();

            assert!(board.is_solved());
            assert_eq!(board.solution().unwrap().moves_from(&board), 0);
        }
    }

    mod generator {
        use std::collections::HashSet;

        use rand::rngs::StdRng;
        use rand::SeedableRng;

        use crate::cell::PieceKind;
        use crate::error::ConfigurationError;
        use crate::generator::{generate, generate_level, GeneratorConfig, PieceWeights};
        use crate::level::{Difficulty, LevelParams};
        use crate::shape::Rotation;
        use crate::Board;

        fn count(board: &Board, kind: PieceKind) -> usize {
            board.cells().filter(|(_, cell)| cell.kind == kind).count()
        }

        #[test]
        fn rejects_tiny_grids() {
            let mut rng = StdRng::seed_from_u64(0);
            assert_eq!(
                generate(&GeneratorConfig::default(), 1, 0, 0, &PieceWeights::default(), &mut rng),
                Err(ConfigurationError::GridTooSmall { size: 1 })
            );
        }

        #[test]
        fn rejects_too_many_endpoints() {
            let mut rng = StdRng::seed_from_u64(0);
            assert_eq!(
                generate(&GeneratorConfig::default(), 2, 2, 2, &PieceWeights::default(), &mut rng),
                Err(ConfigurationError::TooManyEndpoints { sources: 2, targets: 2, cells: 4 })
            );
            assert!(generate(&GeneratorConfig::default(), 3, 2, 2, &PieceWeights::default(), &mut rng).is_ok());
        }

        #[test]
        fn endpoints_that_always_touch() {
            // on a 2x2 board the target always sits next to one of two sources
            let mut rng = StdRng::seed_from_u64(0);
            assert_eq!(
                generate(&GeneratorConfig::default(), 2, 2, 1, &PieceWeights::default(), &mut rng),
                Err(ConfigurationError::NoUnsolvedLayout { attempts: 64 })
            );
        }

        #[test]
        fn boards_never_start_solved() {
            for difficulty in [Difficulty::Easy, Difficulty::Normal] {
                let params = LevelParams::for_level(1, difficulty);
                for seed in 0..200 {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let board = generate_level(&GeneratorConfig::default(), &params, &mut rng).unwrap();
                    assert!(!board.is_solved(), "seed {seed} on {difficulty:?}:\n{board}");
                }
            }
        }

        #[test]
        fn attempts_are_bounded() {
            let huge = GeneratorConfig { require_solvable: true, max_attempts: 4_000_000_000 };
            assert_eq!(huge.sanitized().max_attempts, GeneratorConfig::MAX_ATTEMPTS);
            assert!(huge.sanitized().require_solvable);

            let none = GeneratorConfig { require_solvable: false, max_attempts: 0 };
            assert_eq!(none.sanitized().max_attempts, 1);
        }

        #[test]
        fn rejects_zero_weights() {
            let mut rng = StdRng::seed_from_u64(0);
            let weights = PieceWeights { straight: 0, corner: 0, cross: 0, blocker: 0 };
            assert_eq!(
                generate(&GeneratorConfig::default(), 3, 1, 1, &weights, &mut rng),
                Err(ConfigurationError::NoPieceWeights)
            );
        }

        #[test]
        fn placement_invariant() {
            for seed in 0..25 {
                let mut rng = StdRng::seed_from_u64(seed);
                let board = generate(&GeneratorConfig::default(), 5, 2, 3, &PieceWeights::default(), &mut rng).unwrap();

                assert_eq!(board.sources().len(), 2);
                assert_eq!(board.targets().len(), 3);
                let endpoints: HashSet<_> = board.sources().iter().chain(board.targets()).collect();
                assert_eq!(endpoints.len(), 5);

                for location in board.sources() {
                    assert_eq!(board.cell(*location).unwrap().kind, PieceKind::Source);
                    assert_eq!(board.cell(*location).unwrap().rotation, Rotation::Deg0);
                }
                for location in board.targets() {
                    assert_eq!(board.cell(*location).unwrap().kind, PieceKind::Target);
                }
                assert_eq!(count(&board, PieceKind::Source), 2);
                assert_eq!(count(&board, PieceKind::Target), 3);
                assert_eq!(count(&board, PieceKind::Empty), 0);
                assert!(!board.is_solved());
            }
        }

        #[test]
        fn weights_pick_pieces() {
            let mut rng = StdRng::seed_from_u64(3);
            let weights = PieceWeights { straight: 0, corner: 1, cross: 0, blocker: 0 };
            let board = generate(&GeneratorConfig::default(), 4, 1, 1, &weights, &mut rng).unwrap();
            assert_eq!(count(&board, PieceKind::Corner), 14);
        }

        #[test]
        fn seeded_generation_is_deterministic() {
            let params = LevelParams::for_level(6, Difficulty::Normal);
            let a = generate_level(&GeneratorConfig::default(), &params, &mut StdRng::seed_from_u64(42)).unwrap();
            let b = generate_level(&GeneratorConfig::default(), &params, &mut StdRng::seed_from_u64(42)).unwrap();
            assert_eq!(a, b);
        }

        #[test]
        fn no_endpoints_is_solved() {
            let mut rng = StdRng::seed_from_u64(9);
            let board = generate(&GeneratorConfig::default(), 4, 0, 0, &PieceWeights::default(), &mut rng).unwrap();
            assert!(board.is_solved());
        }

        #[test]
        fn require_solvable() {
            let config = GeneratorConfig { require_solvable: true, max_attempts: 64 };
            let weights = PieceWeights { straight: 1, corner: 1, cross: 2, blocker: 0 };
            for seed in 0..5 {
                let mut rng = StdRng::seed_from_u64(seed);
                let board = generate(&config, 4, 1, 2, &weights, &mut rng).unwrap();
                assert!(board.solution().is_ok());
            }
        }

        #[test]
        fn require_solvable_gives_up() {
            // with nothing but blockers a board is either solved already or never will be
            let config = GeneratorConfig { require_solvable: true, max_attempts: 3 };
            let weights = PieceWeights { straight: 0, corner: 0, cross: 0, blocker: 1 };
            let mut rng = StdRng::seed_from_u64(11);

            assert_eq!(
                generate(&config, 5, 1, 3, &weights, &mut rng),
                Err(ConfigurationError::NoSolvableLayout { attempts: 3 })
            );
        }
    }

    mod level {
        use crate::level::{Difficulty, LevelParams, MAX_LEVEL};

        #[test]
        fn clamps_levels() {
            assert_eq!(LevelParams::for_level(0, Difficulty::Normal), LevelParams::for_level(1, Difficulty::Normal));
            assert_eq!(LevelParams::for_level(99, Difficulty::Hard).level, MAX_LEVEL);
        }

        #[test]
        fn every_level_fits() {
            for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
                for level in 1..=MAX_LEVEL {
                    let params = LevelParams::for_level(level, difficulty);
                    assert!(params.size >= 2);
                    assert!(params.sources + params.targets < params.size * params.size);
                    assert!(params.par > 0);
                }
            }
        }

        #[test]
        fn late_levels_are_crowded() {
            let early = LevelParams::for_level(2, Difficulty::Normal);
            let late = LevelParams::for_level(9, Difficulty::Normal);
            assert!(late.weights.blocker > 4 * early.weights.blocker);
            assert!(late.size > early.size);
            assert!(late.targets > early.targets);
        }

        #[test]
        fn scoring() {
            let params = LevelParams::for_level(1, Difficulty::Normal);
            assert_eq!(params.par, 10);
            assert_eq!(params.score(4), 100 + 60);
            assert_eq!(params.score(10), 100);
            assert_eq!(params.score(25), 100);
            assert!(params.is_efficient(10));
            assert!(!params.is_efficient(11));
        }

        #[test]
        fn difficulty_is_lowercase_json() {
            let all = serde_json::to_string(&[Difficulty::Easy, Difficulty::Normal, Difficulty::Hard]).unwrap();
            assert_eq!(all, r#"["easy","normal","hard"]"#);
        }
    }

    mod progress {
        use crate::progress::{Achievement, Achievements, GameStats, Settings};
        use crate::level::Difficulty;

        #[test]
        fn completion_flags() {
            let mut stats = GameStats::default();
            assert_eq!(stats.current_level, 1);
            assert!(!stats.is_completed(3));

            stats.mark_completed(3);
            stats.mark_completed(0);
            assert!(stats.is_completed(3));
            assert!(!stats.is_completed(0));
            assert_eq!(stats.completed_count(), 1);

            stats.mark_completed(14);
            assert!(stats.is_completed(14));
        }

        #[test]
        fn achievement_ids() {
            assert_eq!(Achievement::FirstSpark.id(), "first_spark");
            assert_eq!("master_electrician".parse::<Achievement>(), Ok(Achievement::MasterElectrician));
        }

        #[test]
        fn unlock_once() {
            let mut achievements = Achievements::default();
            assert!(achievements.unlock(Achievement::Efficient));
            assert!(!achievements.unlock(Achievement::Efficient));
            assert!(achievements.is_unlocked(Achievement::Efficient));
            assert_eq!(achievements.unlocked().collect::<Vec<_>>(), vec![Achievement::Efficient]);
        }

        #[test]
        fn achievements_json() {
            let json = serde_json::to_value(Achievements::default()).unwrap();
            let entries = json.as_array().unwrap();
            assert_eq!(entries.len(), 7);
            assert_eq!(entries[0], serde_json::json!({ "id": "first_spark", "unlocked": false }));
        }

        #[test]
        fn normalize_keeps_unknown_and_adds_missing() {
            let loaded: Achievements = serde_json::from_str(
                r#"[{ "id": "from_the_future", "unlocked": true }, { "id": "halfway", "unlocked": true }]"#,
            ).unwrap();
            let achievements = loaded.normalize();

            assert_eq!(achievements.entries().len(), 8);
            assert!(achievements.entries().iter().any(|entry| entry.id == "from_the_future"));
            assert!(achievements.is_unlocked(Achievement::Halfway));
            assert!(!achievements.is_unlocked(Achievement::FirstSpark));
        }

        #[test]
        fn settings_fill_in_defaults() {
            assert_eq!(serde_json::from_str::<Settings>("{}").unwrap(), Settings::default());

            let settings: Settings = serde_json::from_str(
                r#"{ "difficulty": "hard", "sound": false, "generator": { "require_solvable": true } }"#,
            ).unwrap();
            assert_eq!(settings.difficulty, Difficulty::Hard);
            assert!(!settings.sound);
            assert!(settings.animations);
            assert!(settings.generator.require_solvable);
            assert_eq!(settings.generator.max_attempts, 64);
        }
    }

    mod storage {
        use std::fs;

        use crate::error::PersistenceError;
        use crate::progress::GameStats;
        use crate::storage::{load, load_or_default, store, FileStorage, MemoryStorage, Storage, STATS_KEY};

        #[test]
        fn memory_storage() {
            let mut storage = MemoryStorage::default();
            assert_eq!(storage.read("k").unwrap(), None);

            storage.write("k", "v").unwrap();
            assert_eq!(storage.read("k").unwrap(), Some("v".to_string()));

            storage.remove("k").unwrap();
            assert_eq!(storage.read("k").unwrap(), None);
        }

        #[test]
        fn corrupt_blob_falls_back() {
            let mut storage = MemoryStorage::default();
            storage.write(STATS_KEY, "{{{").unwrap();

            assert!(matches!(load::<GameStats>(&storage, STATS_KEY), Err(PersistenceError::Parse { .. })));
            assert_eq!(load_or_default::<GameStats>(&storage, STATS_KEY), GameStats::default());
        }

        #[test]
        fn store_then_load() {
            let mut storage = MemoryStorage::default();
            let stats = GameStats { total_score: 1234, current_level: 4, ..GameStats::default() };

            store(&mut storage, STATS_KEY, &stats).unwrap();
            assert_eq!(load::<GameStats>(&storage, STATS_KEY).unwrap(), Some(stats));
        }

        #[test]
        fn file_storage() {
            let dir = std::env::temp_dir().join(format!("circuitry-file-storage-{}", std::process::id()));
            let mut storage = FileStorage::new(&dir);

            assert_eq!(storage.read(STATS_KEY).unwrap(), None);
            storage.write(STATS_KEY, "{}").unwrap();
            assert!(dir.join("circuitry.stats.json").exists());
            assert_eq!(storage.read(STATS_KEY).unwrap(), Some("{}".to_string()));

            storage.remove(STATS_KEY).unwrap();
            storage.remove(STATS_KEY).unwrap();
            assert_eq!(storage.read(STATS_KEY).unwrap(), None);

            let _ = fs::remove_dir_all(dir);
        }
    }

    mod session {
        use std::time::Duration;

        use crate::error::ImportFormatError;
        use crate::level::{Difficulty, LevelParams, MAX_LEVEL};
        use crate::location::Location;
        use crate::progress::{Achievement, GameStats};
        use crate::session::{GameSession, RotateOutcome};
        use crate::generator::GeneratorConfig;
        use crate::progress::Settings;
        use crate::storage::{load, store, MemoryStorage, Storage, SETTINGS_KEY, STATS_KEY};
        use crate::transfer::SaveBundle;

        use super::board;

        /// Settings whose generator can almost never produce a late hard level.
        fn stubborn_settings() -> Settings {
            Settings {
                difficulty: Difficulty::Hard,
                generator: GeneratorConfig { require_solvable: true, max_attempts: 1 },
                ..Settings::default()
            }
        }

        fn session_with(text: &str) -> GameSession<MemoryStorage> {
            let mut session = GameSession::with_seed(MemoryStorage::default(), 7).unwrap();
            session.install(LevelParams::for_level(1, Difficulty::Normal), board(text));
            session
        }

        #[test]
        fn fresh_session() {
            let session = GameSession::with_seed(MemoryStorage::default(), 1).unwrap();
            assert_eq!(session.level(), 1);
            assert_eq!(session.moves(), 0);
            assert_eq!(session.board().width(), 4);
            assert_eq!(session.board().sources().len(), 1);
            assert_eq!(session.board().targets().len(), 1);
        }

        #[test]
        fn rejected_rotations_do_not_count() {
            let mut session = session_with("S│┼T");

            assert_eq!(session.rotate(Location(0, 0)), RotateOutcome::Ignored);
            assert_eq!(session.rotate(Location(3, 0)), RotateOutcome::Ignored);
            assert_eq!(session.rotate(Location(9, 9)), RotateOutcome::Ignored);
            assert_eq!(session.moves(), 0);

            assert_eq!(session.rotate(Location(2, 0)), RotateOutcome::Rotated { rotation: crate::Rotation::Deg90 });
            assert_eq!(session.moves(), 1);
            assert_eq!(session.stats().last_moves, 1);
        }

        #[test]
        fn solving_a_level() {
            let mut session = session_with("S│T");

            let RotateOutcome::Solved(report) = session.rotate(Location(1, 0)) else {
                panic!("expected the level to be solved");
            };
            assert_eq!(report.level, 1);
            assert_eq!(report.moves, 1);
            assert_eq!(report.par, 10);
            assert!(report.efficient);
            assert_eq!(report.score, 190);
            assert_eq!(report.unlocked, vec![Achievement::FirstSpark, Achievement::Efficient, Achievement::Surgical]);

            assert!(session.is_finished());
            assert!(session.connectivity().is_solved());
            assert_eq!(session.stats().total_score, 190);
            assert_eq!(session.stats().current_level, 2);
            assert!(session.stats().is_completed(1));

            // solved levels take no more moves
            assert_eq!(session.rotate(Location(1, 0)), RotateOutcome::Ignored);
            assert_eq!(session.moves(), 1);
        }

        #[test]
        fn autosave_on_solve() {
            let mut session = session_with("S│T");
            session.rotate(Location(1, 0));

            let stored: GameStats = load(session.storage(), STATS_KEY).unwrap().unwrap();
            assert_eq!(stored.total_score, 190);
            assert_eq!(stored.current_level, 2);
        }

        #[test]
        fn no_autosave_when_disabled() {
            let mut session = session_with("S│┼T");
            let mut settings = session.settings().clone();
            settings.autosave = false;
            session.set_settings(settings);

            session.rotate(Location(2, 0));
            assert_eq!(session.storage().read(STATS_KEY).unwrap(), None);

            session.save();
            assert!(session.storage().read(STATS_KEY).unwrap().is_some());
        }

        #[test]
        fn achievements_unlock_once() {
            let mut session = session_with("S│T");
            session.rotate(Location(1, 0));
            session.install(LevelParams::for_level(1, Difficulty::Normal), board("S│T"));

            let RotateOutcome::Solved(report) = session.rotate(Location(1, 0)) else {
                panic!("expected the level to be solved");
            };
            assert!(report.unlocked.is_empty());
            assert_eq!(session.stats().total_score, 380);
        }

        #[test]
        fn levels_advance_and_reset_moves() {
            let mut session = session_with("S│┼T");
            session.rotate(Location(2, 0));

            session.next_level().unwrap();
            assert_eq!(session.level(), 2);
            assert_eq!(session.moves(), 0);
            assert_eq!(session.stats().last_moves, 0);
            assert!(!session.is_finished());

            session.start_level(MAX_LEVEL).unwrap();
            session.next_level().unwrap();
            assert_eq!(session.level(), MAX_LEVEL);

            session.restart_level().unwrap();
            assert_eq!(session.level(), MAX_LEVEL);
        }

        #[test]
        fn hints_lead_to_a_solution() {
            let mut session = session_with("S│T");
            assert_eq!(session.hint(), Some(Location(1, 0)));

            session.rotate(Location(1, 0));
            assert_eq!(session.hint(), None);
        }

        #[test]
        fn hint_on_unsolvable_board() {
            let session = session_with("S#T");
            assert_eq!(session.hint(), None);
        }

        #[test]
        fn play_time_and_marathon() {
            let mut session = session_with("S│T");
            session.add_play_time(Duration::from_secs(1800));
            assert!(!session.achievements().is_unlocked(Achievement::Marathon));

            session.add_play_time(Duration::from_millis(1_800_500));
            assert_eq!(session.stats().play_time_secs, 3600);
            assert!(session.achievements().is_unlocked(Achievement::Marathon));
        }

        #[test]
        fn progress_survives_reload() {
            let mut session = session_with("S│T");
            session.rotate(Location(1, 0));
            session.add_play_time(Duration::from_secs(42));
            session.save();

            let reloaded = GameSession::with_seed(session.storage().clone(), 3).unwrap();
            assert_eq!(reloaded.stats(), session.stats());
            assert_eq!(reloaded.achievements(), session.achievements());
            assert_eq!(reloaded.level(), 2);
            assert_eq!(reloaded.moves(), 0);
        }

        #[test]
        fn corrupt_storage_loads_defaults() {
            let mut storage = MemoryStorage::default();
            storage.write(STATS_KEY, "{{{").unwrap();
            storage.write(SETTINGS_KEY, "[1, 2]").unwrap();

            let session = GameSession::with_seed(storage, 5).unwrap();
            assert_eq!(session.stats(), &GameStats::default());
            assert_eq!(session.settings(), &crate::Settings::default());
            assert_eq!(session.level(), 1);
        }

        #[test]
        fn malformed_import_changes_nothing() {
            let mut session = session_with("S│T");
            session.rotate(Location(1, 0));
            let before = session.export_json();
            let board_before = session.board().clone();

            assert!(matches!(session.import_json("not json"), Err(ImportFormatError::Malformed(_))));
            assert!(matches!(session.import_json("{}"), Err(ImportFormatError::Malformed(_))));
            assert!(matches!(session.import_json(r#"{ "version": 1 }"#), Err(ImportFormatError::Malformed(_))));

            let mut future = session.bundle();
            future.version = 99;
            assert!(matches!(
                session.import_json(&future.to_json()),
                Err(ImportFormatError::UnsupportedVersion { found: 99, supported: 1 })
            ));

            let mut nowhere = session.bundle();
            nowhere.stats.current_level = 0;
            assert!(matches!(session.import_json(&nowhere.to_json()), Err(ImportFormatError::Invalid(_))));

            assert_eq!(session.export_json(), before);
            assert_eq!(session.board(), &board_before);
            assert!(session.is_finished());
        }

        #[test]
        fn import_replaces_state() {
            let mut source = session_with("S│T");
            source.rotate(Location(1, 0));
            source.add_play_time(Duration::from_secs(90));
            let exported = source.export_json();

            let mut target = GameSession::with_seed(MemoryStorage::default(), 21).unwrap();
            target.import_json(&exported).unwrap();

            assert_eq!(target.stats(), source.stats());
            assert_eq!(target.settings(), source.settings());
            assert_eq!(target.achievements(), source.achievements());
            assert_eq!(target.level(), 2);
            assert_eq!(target.moves(), 0);
            assert!(!target.is_finished());
        }

        #[test]
        fn export_is_pretty_json() {
            let session = session_with("S│T");
            let exported = session.export_json();

            assert!(exported.contains('\n'));
            let bundle = SaveBundle::from_json(&exported).unwrap();
            assert_eq!(bundle.version, 1);
            assert_eq!(&bundle.stats, session.stats());
        }

        #[test]
        fn levels_never_start_solved() {
            for seed in 0..40 {
                let mut session = GameSession::with_seed(MemoryStorage::default(), seed).unwrap();
                assert!(!session.connectivity().is_solved(), "seed {seed}");

                for level in 2..=4 {
                    session.start_level(level).unwrap();
                    assert!(!session.connectivity().is_solved(), "seed {seed}, level {level}");
                    assert!(!session.is_finished());
                }
            }
        }

        #[test]
        fn unusable_stored_generator_falls_back() {
            let mut storage = MemoryStorage::default();
            store(&mut storage, STATS_KEY, &GameStats { current_level: 10, ..GameStats::default() }).unwrap();
            store(&mut storage, SETTINGS_KEY, &stubborn_settings()).unwrap();

            let session = GameSession::with_seed(storage, 7).unwrap();
            assert_eq!(session.level(), 10);
            assert_eq!(session.settings().difficulty, Difficulty::Hard);
            assert_eq!(session.settings().generator, GeneratorConfig::default());
            assert!(!session.connectivity().is_solved());
        }

        #[test]
        fn stored_attempts_are_clamped() {
            let mut storage = MemoryStorage::default();
            storage.write(SETTINGS_KEY, r#"{ "generator": { "max_attempts": 4000000000 } }"#).unwrap();

            let session = GameSession::with_seed(storage, 2).unwrap();
            assert_eq!(session.settings().generator.max_attempts, GeneratorConfig::MAX_ATTEMPTS);
        }

        #[test]
        fn import_with_unusable_generator() {
            let mut source = session_with("S│T");
            source.set_settings(stubborn_settings());
            let mut bundle = source.bundle();
            bundle.stats.current_level = 10;

            let mut target = GameSession::with_seed(MemoryStorage::default(), 4).unwrap();
            target.import_json(&bundle.to_json()).unwrap();

            assert_eq!(target.level(), 10);
            assert_eq!(target.settings().difficulty, Difficulty::Hard);
            assert_eq!(target.settings().generator, GeneratorConfig::default());
        }

        #[test]
        fn imported_attempts_are_clamped() {
            let mut bundle = session_with("S│T").bundle();
            bundle.settings.generator.max_attempts = 4_000_000_000;

            let parsed = SaveBundle::from_json(&bundle.to_json()).unwrap();
            assert_eq!(parsed.settings.generator.max_attempts, GeneratorConfig::MAX_ATTEMPTS);

            let mut target = GameSession::with_seed(MemoryStorage::default(), 4).unwrap();
            target.import_json(&bundle.to_json()).unwrap();
            assert_eq!(target.settings().generator.max_attempts, GeneratorConfig::MAX_ATTEMPTS);
        }
    }
}
