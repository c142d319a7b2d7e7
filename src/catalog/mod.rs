//! Question catalog
//!
//! Typed questions grouped by topic, answer tallies joined against them, and
//! answer grading.

pub mod category;
pub mod grading;
pub mod model;
pub mod storage;

pub use category::strip_common_prefix;
pub use grading::Grade;
pub use model::{
    Answer, AnswerTally, Catalog, Question, QuestionId, QuestionType, TallyRow, Topic,
    rows_in_topic,
};
pub use storage::{load_catalog, save_catalog};
