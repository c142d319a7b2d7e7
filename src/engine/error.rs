//! Error types for the quiz engine

use thiserror::Error;

use crate::catalog::QuestionId;

/// Refusals from the progress tracker.
///
/// Selectors never fail: an exhausted pool is an empty quiz. These errors only
/// guard access to steps and sessions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// An earlier step has not been cleared often enough
    #[error("Step {step} is locked: step {blocking} cleared {completed} of {required} times")]
    StepLocked {
        /// Step that was requested
        step: usize,
        /// First earlier step below the threshold
        blocking: usize,
        /// Completions of the blocking step
        completed: u32,
        /// Completions needed to unlock
        required: u32,
    },

    /// Step index outside `1..=n_steps`
    #[error("Step {step} does not exist (topic has {n_steps} steps)")]
    StepOutOfRange {
        /// Step that was requested
        step: usize,
        /// Configured number of steps
        n_steps: usize,
    },

    /// The learner has no lives left for progression quizzes
    #[error("No lives left. Take a recovery quiz to earn one back")]
    NoLivesLeft,

    /// Topic not present in the catalog
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// No quiz in progress, or the quiz already ended
    #[error("No quiz in progress")]
    NoActiveSession,

    /// A session refers to a question missing from the catalog
    #[error("Question {0} is not in the catalog")]
    UnknownQuestion(QuestionId),
}

impl EngineError {
    /// Check if the learner can fix this by playing (recovering lives or clearing steps)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::StepLocked { .. } | EngineError::NoLivesLeft)
    }
}
