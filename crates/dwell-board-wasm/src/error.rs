//! Engine error types.
//!
//! Only construction can fail. Classifier faults are reported by the host
//! as [`ClassifierError`] and absorbed by the throttle, which turns them
//! into a fallback sample.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be in {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("stabilizer recent window ({window}) must not exceed buffer capacity ({capacity})")]
    RecentWindowTooLarge { window: usize, capacity: usize },
    #[error("stabilizer recent agreement ({agreeing}) must be in 2..={window}")]
    RecentAgreementOutOfRange { agreeing: usize, window: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("expression model is not loaded")]
    ModelUnavailable,
    #[error("video frame is not ready")]
    FrameNotReady,
    #[error("classifier failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),
}
