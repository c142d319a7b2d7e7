//! Course configuration for quizpath

pub mod progress;
pub mod session;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::catalog::QuestionType;
use crate::engine::{RaceParams, TrackerRules};

pub use progress::ProgressFile;
pub use session::SessionFile;

/// Per-course settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseConfig {
    /// Display name of the quiz
    pub quiz_name: String,

    /// Lives a learner starts with, also the cap for recovery
    pub initial_life_number: u32,

    /// Questions per adaptive quiz
    #[serde(alias = "n_questions_per_step")]
    pub n_questions: usize,

    /// Question kinds accepted when loading a catalog
    pub question_types: Vec<QuestionType>,

    /// Topics left out of listings and scores
    pub topics_to_hide: Vec<String>,

    /// Steps per topic
    pub n_steps: usize,

    /// Completions of a step needed to unlock the next one
    pub n_quiz_by_step: u32,

    /// Display names for the steps
    pub step_names: Vec<String>,

    /// Correct answers needed to win back a life
    pub n_questions_for_recover: u32,

    /// Topics feeding recovery quizzes; empty means every visible topic
    pub recover_topics: Vec<String>,

    /// Oversampling factors offered for brush-up
    pub brush_up_levels: Vec<usize>,

    /// Display names for the brush-up levels
    pub brush_up_level_names: Vec<String>,

    /// Questions per brush-up quiz
    pub n_questions_by_brush_up: usize,

    /// Start multiplier for the selection race
    pub boost_factor: f64,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            quiz_name: "quizpath".to_string(),
            initial_life_number: 5,
            n_questions: 10,
            question_types: vec![
                QuestionType::TrueFalse,
                QuestionType::MultiChoice,
                QuestionType::ShortAnswer,
                QuestionType::Numerical,
            ],
            topics_to_hide: Vec::new(),
            n_steps: 3,
            n_quiz_by_step: 4,
            step_names: vec!["STEP #1".into(), "STEP #2".into(), "STEP #3".into()],
            n_questions_for_recover: 5,
            recover_topics: Vec::new(),
            brush_up_levels: vec![1, 2, 4],
            brush_up_level_names: vec!["Easy".into(), "Medium".into(), "Hard".into()],
            n_questions_by_brush_up: 5,
            boost_factor: 1.2,
        }
    }
}

impl CourseConfig {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load configuration from a file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {:?}", path))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "quizpath").context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "quizpath").context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Name shown for a step (1-indexed)
    pub fn step_name(&self, step: usize) -> String {
        step.checked_sub(1)
            .and_then(|i| self.step_names.get(i))
            .cloned()
            .unwrap_or_else(|| format!("STEP #{step}"))
    }

    /// Name shown for a brush-up level index
    pub fn brush_up_level_name(&self, index: usize) -> String {
        self.brush_up_level_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("Level {}", index + 1))
    }

    /// Tracker rules for this course
    pub fn tracker_rules(&self) -> TrackerRules {
        TrackerRules {
            n_steps: self.n_steps,
            n_quiz_by_step: self.n_quiz_by_step,
            initial_life_number: self.initial_life_number,
            n_questions_for_recover: self.n_questions_for_recover,
        }
    }

    /// Selection race settings for this course
    pub fn race_params(&self) -> RaceParams {
        RaceParams::with_boost(self.boost_factor)
    }
}

/// Progress file for a course inside a data directory
pub fn progress_path(data_dir: &Path, course: &str) -> PathBuf {
    data_dir.join(course).join("progress.json")
}

/// Session file for a course inside a data directory
pub fn session_path(data_dir: &Path, course: &str) -> PathBuf {
    data_dir.join(course).join("session.json")
}
