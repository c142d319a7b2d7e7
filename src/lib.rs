//! quizpath - adaptive quizzes with step progression and lives
//!
//! quizpath splits each topic of a question catalog into steps, picks the
//! questions that best match a learner's ability, and keeps score of lives
//! lost on mistakes and won back through recovery quizzes.

pub mod app;
pub mod catalog;
pub mod config;
pub mod engine;

pub use app::App;
pub use config::CourseConfig;
