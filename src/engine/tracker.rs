//! Progress and lives tracking
//!
//! A quiz session walks through its question list one answer at a time. Step
//! sessions count completions when they reach the end; recovery sessions give
//! back a life after enough correct answers. Lives drop on mistakes everywhere
//! except recovery and brush-up.
//!
//! Persistence goes through [`ProgressStore`]. A store instance covers one
//! course, so the lives counter is keyed by learner alone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::EngineError;
use crate::catalog::{AnswerTally, QuestionId};

/// Storage collaborator for counters and the answer log.
///
/// Life updates are single calls so an implementation can apply them
/// atomically.
pub trait ProgressStore {
    /// Current lives, 0 for unknown learners
    fn lives(&self, learner: &str) -> u32;

    /// Remove one life, never below 0. Returns the new count
    fn decrement_life(&mut self, learner: &str) -> u32;

    /// Add one life, never above `max`. Returns the new count
    fn increment_life(&mut self, learner: &str, max: u32) -> u32;

    /// Times the learner finished a step (1-indexed)
    fn completions(&self, learner: &str, topic: &str, step: usize) -> u32;

    /// Count one more completion of a step. Returns the new count
    fn increment_completion(&mut self, learner: &str, topic: &str, step: usize) -> u32;

    /// Append an answer event
    fn record_answer(&mut self, learner: &str, question: QuestionId, correct: bool);

    /// Aggregate the learner's answer log
    fn tallies(&self, learner: &str) -> HashMap<QuestionId, AnswerTally>;
}

/// Tracker knobs, taken from the course configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerRules {
    /// Steps per topic
    pub n_steps: usize,
    /// Completions of a step needed before the next one opens
    pub n_quiz_by_step: u32,
    /// Upper bound for lives
    pub initial_life_number: u32,
    /// Correct answers that earn a life back during recovery
    pub n_questions_for_recover: u32,
}

/// What kind of quiz a session is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SessionMode {
    /// Progression step of a topic (1-indexed)
    Step { topic: String, step: usize },
    /// Life recovery, counting correct answers so far
    Recovery { correct: u32 },
    /// Voluntary review at a difficulty level
    BrushUp { level: usize },
    /// Every question of one topic
    Review { topic: String },
}

impl SessionMode {
    /// Short label for messages
    pub fn label(&self) -> String {
        match self {
            Self::Step { topic, step } => format!("{topic} / step {step}"),
            Self::Recovery { .. } => "recovery".to_string(),
            Self::BrushUp { level } => format!("brush-up level {level}"),
            Self::Review { topic } => format!("{topic} / review"),
        }
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

/// A quiz being played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    /// Learner playing
    pub learner: String,
    /// Quiz kind
    pub mode: SessionMode,
    /// Question ids in play order
    pub questions: Vec<QuestionId>,
    /// Index of the next question to answer
    pub position: usize,
    /// Set once the session has ended
    #[serde(default)]
    pub finished: bool,
}

impl QuizSession {
    /// Assign a question list to a learner
    pub fn new(learner: impl Into<String>, mode: SessionMode, questions: Vec<QuestionId>) -> Self {
        let finished = questions.is_empty();
        Self { learner: learner.into(), mode, questions, position: 0, finished }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        if self.finished {
            SessionState::Completed
        } else if self.position == 0 {
            SessionState::NotStarted
        } else {
            SessionState::InProgress
        }
    }

    /// Question awaiting an answer
    pub fn current(&self) -> Option<QuestionId> {
        if self.finished { None } else { self.questions.get(self.position).copied() }
    }

    /// Questions left, including the current one
    pub fn remaining(&self) -> usize {
        if self.finished { 0 } else { self.questions.len().saturating_sub(self.position) }
    }
}

/// What happened after one answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Question that was answered
    pub question: QuestionId,
    /// Whether the answer was right
    pub correct: bool,
    /// Lives after the answer
    pub lives: u32,
    /// A life was earned back
    pub recovered: bool,
    /// The session is over
    pub finished: bool,
    /// New completion count when a step session just ended
    pub step_completions: Option<u32>,
}

impl AnswerOutcome {
    /// The learner just ran out of lives
    pub fn lives_exhausted(&self) -> bool {
        !self.correct && self.lives == 0
    }
}

/// Access to one step as seen by a learner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Earlier steps still need clearing
    Locked,
    /// Playable, cleared this many times so far
    Open { completions: u32 },
    /// Cleared at least the required number of times
    Cleared { completions: u32 },
}

/// Applies answers and access rules against a store
#[derive(Debug, Clone, Copy)]
pub struct Tracker {
    rules: TrackerRules,
}

impl Tracker {
    /// Create a tracker for a course's rules
    pub fn new(rules: TrackerRules) -> Self {
        Self { rules }
    }

    /// Rules in effect
    pub fn rules(&self) -> &TrackerRules {
        &self.rules
    }

    /// Status of a step (1-indexed) for a learner
    pub fn step_status(
        &self,
        store: &impl ProgressStore,
        learner: &str,
        topic: &str,
        step: usize,
    ) -> StepStatus {
        if self.first_blocking_step(store, learner, topic, step).is_some() {
            return StepStatus::Locked;
        }
        let completions = store.completions(learner, topic, step);
        if completions >= self.rules.n_quiz_by_step {
            StepStatus::Cleared { completions }
        } else {
            StepStatus::Open { completions }
        }
    }

    /// Check a learner may start a quiz for `step` of `topic`
    pub fn check_step_access(
        &self,
        store: &impl ProgressStore,
        learner: &str,
        topic: &str,
        step: usize,
    ) -> Result<(), EngineError> {
        if step == 0 || step > self.rules.n_steps {
            return Err(EngineError::StepOutOfRange { step, n_steps: self.rules.n_steps });
        }
        if store.lives(learner) == 0 {
            tracing::warn!(learner, topic, step, "step refused: no lives");
            return Err(EngineError::NoLivesLeft);
        }
        if let Some((blocking, completed)) = self.first_blocking_step(store, learner, topic, step) {
            tracing::warn!(learner, topic, step, blocking, "step refused: locked");
            return Err(EngineError::StepLocked {
                step,
                blocking,
                completed,
                required: self.rules.n_quiz_by_step,
            });
        }
        Ok(())
    }

    fn first_blocking_step(
        &self,
        store: &impl ProgressStore,
        learner: &str,
        topic: &str,
        step: usize,
    ) -> Option<(usize, u32)> {
        (1..step)
            .map(|earlier| (earlier, store.completions(learner, topic, earlier)))
            .find(|&(_, completed)| completed < self.rules.n_quiz_by_step)
    }

    /// Apply one answer to the session's current question
    pub fn answer(
        &self,
        session: &mut QuizSession,
        store: &mut impl ProgressStore,
        correct: bool,
    ) -> Result<AnswerOutcome, EngineError> {
        let question = session.current().ok_or(EngineError::NoActiveSession)?;
        let learner = session.learner.clone();

        let mut recovered = false;
        let lives = match &mut session.mode {
            SessionMode::Recovery { correct: count } => {
                if correct {
                    *count += 1;
                }
                if *count >= self.rules.n_questions_for_recover {
                    recovered = true;
                    let lives = store.increment_life(&learner, self.rules.initial_life_number);
                    tracing::info!(learner = %learner, lives, "life recovered");
                    lives
                } else {
                    store.lives(&learner)
                }
            }
            SessionMode::BrushUp { .. } => {
                store.record_answer(&learner, question, correct);
                store.lives(&learner)
            }
            SessionMode::Step { .. } | SessionMode::Review { .. } => {
                store.record_answer(&learner, question, correct);
                if correct {
                    store.lives(&learner)
                } else {
                    let lives = store.decrement_life(&learner);
                    tracing::info!(learner = %learner, lives, "life lost");
                    lives
                }
            }
        };

        session.position += 1;
        let mut step_completions = None;
        if recovered {
            session.finished = true;
        } else if session.position >= session.questions.len() {
            session.finished = true;
            if let SessionMode::Step { topic, step } = &session.mode {
                let count = store.increment_completion(&learner, topic, *step);
                tracing::info!(learner = %learner, topic = %topic, step, count, "step completed");
                step_completions = Some(count);
            }
        }

        Ok(AnswerOutcome {
            question,
            correct,
            lives,
            recovered,
            finished: session.finished,
            step_completions,
        })
    }
}
