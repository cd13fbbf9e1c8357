//! Dwell board interaction engine.
//!
//! Turns a jittery stream of nose positions and expression scores into a
//! few reliable events: a key press and a held emotion. Everything runs on
//! the caller's clock, so the same code drives the browser through
//! WebAssembly and the unit tests with synthetic timestamps.
//!
//! ## Modules
//! - `pointer`: EMA smoothing and cursor mapping
//! - `target`: hover resolution over the UI's target list
//! - `dwell`: dwell selection state machine
//! - `emotion`: classifier throttle, expression scoring, stabilizer
//! - `compose`: key-value interpreter and word suggestions
//! - `speech`: speak requests and cooldown
//! - `voice`: emotion → voice parameter table
//! - `engine`: the `Board` that owns all of the above
//! - `wasm`: `DwellBoard` bindings for the browser

pub mod compose;
pub mod config;
pub mod dwell;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod pointer;
pub mod speech;
pub mod target;
pub mod voice;
pub mod wasm;

pub use compose::{Command, ComposedText, Dictionary, Interpreter};
pub use config::EngineConfig;
pub use dwell::{DwellEvent, DwellMachine, DwellPhase, DwellSnapshot};
pub use emotion::{Emotion, EmotionSample, EmotionStabilizer, ExpressionScores};
pub use engine::{Board, EmotionUpdate, FrameReport, KeyOutcome};
pub use error::{ClassifierError, ConfigError, EngineError};
pub use pointer::{CursorMapper, CursorState, PointerSmoother, RawPoint, Surface};
pub use speech::{SpeakGate, SpeakOutcome, SpeakRequest, Speaker};
pub use target::{InteractiveTarget, Rect, TargetProvider, TargetResolver};
pub use voice::{FallbackProsody, VoiceParams, VoiceTable};
pub use wasm::DwellBoard;
