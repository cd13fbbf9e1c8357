//! Browser bindings.
//!
//! The page owns the camera, the landmark and expression models, the DOM
//! and audio playback. It calls into [`DwellBoard`] once per tracker frame
//! and around every classifier call; the board calls back into the page
//! through the `onSpeak` function when an utterance should be voiced.

use js_sys::Function;
use tracing::warn;
use wasm_bindgen::prelude::*;

use crate::compose::Dictionary;
use crate::config::EngineConfig;
use crate::emotion::{ClassificationTicket, ExpressionScores};
use crate::engine::Board;
use crate::error::ClassifierError;
use crate::pointer::{RawPoint, Surface};
use crate::speech::{SpeakRequest, Speaker};
use crate::target::InteractiveTarget;

struct JsSpeaker {
    callback: Function,
}

impl Speaker for JsSpeaker {
    fn speak(&mut self, request: &SpeakRequest) {
        let value = match serde_wasm_bindgen::to_value(request) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to serialize speak request");
                return;
            }
        };
        if let Err(err) = self.callback.call1(&JsValue::NULL, &value) {
            warn!(error = ?err, "onSpeak callback threw");
        }
    }
}

#[wasm_bindgen]
pub struct DwellBoard {
    board: Board<JsSpeaker>,
}

#[wasm_bindgen]
impl DwellBoard {
    /// `config` may be `undefined` or any partial `EngineConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, on_speak: Function) -> Result<DwellBoard, JsError> {
        let config: EngineConfig = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let board = Board::new(config, JsSpeaker { callback: on_speak })?;
        Ok(Self { board })
    }

    pub fn start(&mut self, now: f64) {
        self.board.start(now);
    }

    pub fn stop(&mut self) {
        self.board.stop();
    }

    #[wasm_bindgen(js_name = "isTracking")]
    pub fn is_tracking(&self) -> bool {
        self.board.is_tracking()
    }

    /// One tracker frame. Pass `x`/`y` as `undefined` when no face was found.
    /// `targets` is the priority-ordered `InteractiveTarget[]`.
    pub fn frame(
        &mut self,
        now: f64,
        x: Option<f64>,
        y: Option<f64>,
        targets: JsValue,
    ) -> Result<JsValue, JsError> {
        let targets: Vec<InteractiveTarget> = serde_wasm_bindgen::from_value(targets)?;
        let point = x.zip(y).map(|(x, y)| RawPoint::new(x, y));
        let report = self.board.frame(now, point, &targets);
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    #[wasm_bindgen(js_name = "setSurface")]
    pub fn set_surface(&mut self, left: f64, top: f64, width: f64, height: f64) {
        self.board.set_surface(Surface {
            left,
            top,
            width,
            height,
        });
    }

    /// Ticket number, or `undefined` when the classifier should not be called.
    #[wasm_bindgen(js_name = "beginClassification")]
    pub fn begin_classification(&mut self, now: f64) -> Option<u32> {
        self.board
            .begin_classification(now)
            .ok()
            .map(ClassificationTicket::id)
    }

    /// `scores` is the classifier's expression map, or `null` for no face.
    #[wasm_bindgen(js_name = "completeClassification")]
    pub fn complete_classification(
        &mut self,
        ticket: u32,
        scores: JsValue,
        now: f64,
    ) -> Result<JsValue, JsError> {
        let scores: Option<ExpressionScores> = if scores.is_undefined() || scores.is_null() {
            None
        } else {
            Some(serde_wasm_bindgen::from_value(scores)?)
        };
        let update =
            self.board
                .complete_classification(ClassificationTicket::from_id(ticket), Ok(scores), now);
        Ok(serde_wasm_bindgen::to_value(&update)?)
    }

    #[wasm_bindgen(js_name = "failClassification")]
    pub fn fail_classification(
        &mut self,
        ticket: u32,
        message: String,
        now: f64,
    ) -> Result<JsValue, JsError> {
        let update = self.board.complete_classification(
            ClassificationTicket::from_id(ticket),
            Err(ClassifierError::Failed(message)),
            now,
        );
        Ok(serde_wasm_bindgen::to_value(&update)?)
    }

    /// Dwell-free input path, e.g. a physical keyboard.
    #[wasm_bindgen(js_name = "pressKey")]
    pub fn press_key(&mut self, value: &str, now: f64) -> Result<JsValue, JsError> {
        let outcome = self.board.press(value, now);
        Ok(serde_wasm_bindgen::to_value(&outcome)?)
    }

    #[wasm_bindgen(js_name = "setDictionary")]
    pub fn set_dictionary(&mut self, words: Vec<String>) {
        self.board.set_dictionary(Dictionary::new(words));
    }

    pub fn text(&self) -> String {
        self.board.text().to_string()
    }

    pub fn suggestion(&self) -> Option<String> {
        self.board.suggestion().map(str::to_string)
    }

    pub fn emotion(&self) -> String {
        self.board.emotion().current.to_string()
    }

    #[wasm_bindgen(js_name = "emotionConfidence")]
    pub fn emotion_confidence(&self) -> f64 {
        self.board.emotion().confidence
    }
}
