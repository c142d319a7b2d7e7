//! Quiz composition and progress tracking
//!
//! Every selector is a pure function of tally rows and an RNG; the tracker is
//! the only part that talks to storage.

pub mod brushup;
pub mod difficulty;
pub mod error;
pub mod partition;
pub mod recovery;
pub mod score;
pub mod selector;
pub mod tracker;

pub use brushup::{brushup_availability, select_brushup};
pub use difficulty::{ability, baseline, difficulty, row_difficulty};
pub use error::EngineError;
pub use partition::{StepPlan, StepSeed, partition};
pub use recovery::select_recovery;
pub use score::{Standing, course_score, leaderboard, topic_score, visible_topics};
pub use selector::{RaceParams, rank_by_race, select, select_review};
pub use tracker::{
    AnswerOutcome, ProgressStore, QuizSession, SessionMode, SessionState, StepStatus, Tracker,
    TrackerRules,
};
