//! Progress persistence for one course

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::{AnswerTally, QuestionId};
use crate::engine::ProgressStore;

/// One submitted answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub question_id: QuestionId,
    pub correct: bool,
}

/// Everything learners have done in a course
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressFile {
    /// Lives per learner; presence means enrolled
    #[serde(default)]
    pub lives: BTreeMap<String, u32>,

    /// Completions per learner, topic and step
    #[serde(default)]
    pub steps: BTreeMap<String, BTreeMap<String, BTreeMap<usize, u32>>>,

    /// Answer log per learner, oldest first
    #[serde(default)]
    pub answers: BTreeMap<String, Vec<AnswerEvent>>,

    /// Questions each learner saved for later
    #[serde(default)]
    pub bookmarks: BTreeMap<String, BTreeSet<QuestionId>>,
}

impl ProgressFile {
    /// Load progress from a file, empty if it does not exist yet
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read progress from {:?}", path))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse progress {:?}", path))
        } else {
            Ok(Self::default())
        }
    }

    /// Save progress to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize progress")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write progress to {:?}", path))?;

        Ok(())
    }

    /// Register a learner with a starting number of lives.
    ///
    /// Returns false, leaving lives untouched, if they were already enrolled.
    pub fn enroll(&mut self, learner: &str, lives: u32) -> bool {
        if self.lives.contains_key(learner) {
            return false;
        }
        self.lives.insert(learner.to_string(), lives);
        tracing::info!(learner, lives, "learner enrolled");
        true
    }

    /// Whether the learner is enrolled
    pub fn is_enrolled(&self, learner: &str) -> bool {
        self.lives.contains_key(learner)
    }

    /// Enrolled learners, sorted by name
    pub fn learners(&self) -> Vec<&str> {
        self.lives.keys().map(String::as_str).collect()
    }

    /// Save a question for later; false if it was already saved
    pub fn bookmark(&mut self, learner: &str, question: QuestionId) -> bool {
        self.bookmarks.entry(learner.to_string()).or_default().insert(question)
    }

    /// Forget a saved question; false if it was not saved
    pub fn unbookmark(&mut self, learner: &str, question: QuestionId) -> bool {
        let Some(saved) = self.bookmarks.get_mut(learner) else {
            return false;
        };
        let removed = saved.remove(&question);
        if saved.is_empty() {
            self.bookmarks.remove(learner);
        }
        removed
    }

    /// Saved questions of a learner, by id
    pub fn bookmarks(&self, learner: &str) -> Vec<QuestionId> {
        self.bookmarks
            .get(learner)
            .map(|saved| saved.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Drop every saved question of a learner. Returns how many were dropped
    pub fn reset_bookmarks(&mut self, learner: &str) -> usize {
        self.bookmarks.remove(learner).map_or(0, |saved| saved.len())
    }
}

impl ProgressStore for ProgressFile {
    fn lives(&self, learner: &str) -> u32 {
        self.lives.get(learner).copied().unwrap_or(0)
    }

    fn decrement_life(&mut self, learner: &str) -> u32 {
        let lives = self.lives.entry(learner.to_string()).or_insert(0);
        *lives = lives.saturating_sub(1);
        *lives
    }

    fn increment_life(&mut self, learner: &str, max: u32) -> u32 {
        let lives = self.lives.entry(learner.to_string()).or_insert(0);
        *lives = lives.saturating_add(1).min(max);
        *lives
    }

    fn completions(&self, learner: &str, topic: &str, step: usize) -> u32 {
        self.steps
            .get(learner)
            .and_then(|topics| topics.get(topic))
            .and_then(|steps| steps.get(&step))
            .copied()
            .unwrap_or(0)
    }

    fn increment_completion(&mut self, learner: &str, topic: &str, step: usize) -> u32 {
        let count = self
            .steps
            .entry(learner.to_string())
            .or_default()
            .entry(topic.to_string())
            .or_default()
            .entry(step)
            .or_insert(0);
        *count += 1;
        *count
    }

    fn record_answer(&mut self, learner: &str, question: QuestionId, correct: bool) {
        self.answers
            .entry(learner.to_string())
            .or_default()
            .push(AnswerEvent { question_id: question, correct });
    }

    fn tallies(&self, learner: &str) -> HashMap<QuestionId, AnswerTally> {
        let mut tallies: HashMap<QuestionId, AnswerTally> = HashMap::new();
        for event in self.answers.get(learner).into_iter().flatten() {
            tallies.entry(event.question_id).or_default().record(event.correct);
        }
        tallies
    }
}
