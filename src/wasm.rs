//! Browser bindings, built with the `wasm` feature.

use std::time::Duration;

use js_sys::{Array, Date};
use wasm_bindgen::prelude::*;

use crate::location::Location;
use crate::session::{GameSession, RotateOutcome};
use crate::storage::MemoryStorage;

/// A game session for browser front ends. Progress lives in memory; pair
/// [`export_state`](Self::export_state) and [`import_state`](Self::import_state) with the page's own storage.
#[wasm_bindgen]
pub struct CircuitGame {
    session: GameSession<MemoryStorage>,
    last_tick: f64,
}

#[wasm_bindgen]
impl CircuitGame {
    /// A fresh game at level 1 whose boards come from `seed`.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32) -> Result<CircuitGame, JsError> {
        let session = GameSession::with_seed(MemoryStorage::default(), u64::from(seed))
            .map_err(|e| JsError::new(&e.to_string()))?;

        Ok(Self { session, last_tick: Date::now() })
    }

    fn tick(&mut self) {
        let now = Date::now();
        let elapsed_ms = (now - self.last_tick).max(0.0);
        let whole_secs = (elapsed_ms / 1000.0).floor();
        if whole_secs >= 1.0 {
            self.session.add_play_time(Duration::from_secs(whole_secs as u64));
            self.last_tick += whole_secs * 1000.0;
        }
    }

    /// Turn the piece at `(x, y)`; `true` if it turned.
    pub fn rotate(&mut self, x: usize, y: usize) -> bool {
        self.tick();
        !matches!(self.session.rotate(Location(x, y)), RotateOutcome::Ignored)
    }

    /// Whether every target is powered.
    pub fn solved(&self) -> bool {
        self.session.connectivity().is_solved()
    }

    /// The level being played.
    pub fn level(&self) -> u32 {
        self.session.level()
    }

    /// Moves made on this level.
    pub fn moves(&self) -> u32 {
        self.session.moves()
    }

    /// Par for this level.
    pub fn par(&self) -> u32 {
        self.session.par()
    }

    /// `[x, y]` pairs of every powered cell.
    pub fn powered(&self) -> Array {
        self.session
            .connectivity()
            .powered()
            .iter()
            .map(|location| Array::of2(&JsValue::from(location.0 as u32), &JsValue::from(location.1 as u32)))
            .collect()
    }

    /// `[x, y]` of a cell worth turning next, or `undefined`.
    pub fn hint(&self) -> Option<Array> {
        self.session
            .hint()
            .map(|location| Array::of2(&JsValue::from(location.0 as u32), &JsValue::from(location.1 as u32)))
    }

    /// Clockwise degrees the piece at `(x, y)` is turned, or `undefined` off the board.
    pub fn rotation(&self, x: usize, y: usize) -> Option<u16> {
        self.session.board().cell(Location(x, y)).map(|cell| cell.rotation.degrees())
    }

    /// The board drawn as text, one line per row.
    pub fn render(&self) -> String {
        self.session.board().to_string()
    }

    /// Move on to the next level.
    pub fn next_level(&mut self) -> Result<(), JsError> {
        self.tick();
        self.session.next_level().map_err(|e| JsError::new(&e.to_string()))
    }

    /// Replay this level on a fresh board.
    pub fn restart_level(&mut self) -> Result<(), JsError> {
        self.tick();
        self.session.restart_level().map_err(|e| JsError::new(&e.to_string()))
    }

    /// Progress as JSON for the page to keep.
    pub fn export_state(&mut self) -> String {
        self.tick();
        self.session.export_json()
    }

    /// Replace progress with JSON from [`Self::export_state`]. Rejected input changes nothing.
    pub fn import_state(&mut self, json: &str) -> Result<(), JsError> {
        self.session.import_json(json).map_err(|e| JsError::new(&e.to_string()))
    }
}
