//! Session state persistence
//!
//! Keeps each learner's running quiz between invocations so they can answer
//! one question at a time.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::QuizSession;

/// Running quizzes, at most one per learner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(default)]
    pub sessions: BTreeMap<String, QuizSession>,
}

impl SessionFile {
    /// Load sessions from a file, empty if it does not exist yet
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read session from {:?}", path))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse session {:?}", path))
        } else {
            Ok(Self::default())
        }
    }

    /// Save sessions to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize session")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write session to {:?}", path))?;

        Ok(())
    }

    /// Start a session, replacing any running one for the same learner
    pub fn start(&mut self, session: QuizSession) {
        if let Some(old) = self.sessions.insert(session.learner.clone(), session) {
            if !old.finished {
                tracing::debug!(learner = %old.learner, mode = %old.mode.label(), "quiz abandoned");
            }
        }
    }

    /// Session for a learner (if any)
    pub fn get(&self, learner: &str) -> Option<&QuizSession> {
        self.sessions.get(learner)
    }

    /// Mutable session for a learner (if any)
    pub fn get_mut(&mut self, learner: &str) -> Option<&mut QuizSession> {
        self.sessions.get_mut(learner)
    }

    /// Drop a learner's session
    pub fn clear(&mut self, learner: &str) {
        self.sessions.remove(learner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SessionMode;

    fn review(learner: &str) -> QuizSession {
        QuizSession::new(learner, SessionMode::Review { topic: "cells".into() }, vec![1, 2, 3])
    }

    #[test]
    fn session_default_is_empty() {
        let sessions = SessionFile::default();
        assert!(sessions.sessions.is_empty());
        assert!(sessions.get("ada").is_none());
    }

    #[test]
    fn start_replaces_previous_quiz() {
        let mut sessions = SessionFile::default();
        sessions.start(review("ada"));
        sessions.start(QuizSession::new("ada", SessionMode::BrushUp { level: 2 }, vec![9]));

        assert_eq!(sessions.sessions.len(), 1);
        assert_eq!(sessions.get("ada").unwrap().questions, vec![9]);

        sessions.clear("ada");
        assert!(sessions.get("ada").is_none());
    }

    #[test]
    fn session_deserializes() {
        let json = r#"{
            "sessions": {
                "ada": {
                    "learner": "ada",
                    "mode": { "mode": "step", "topic": "cells", "step": 2 },
                    "questions": [4, 8, 15],
                    "position": 1
                }
            }
        }"#;

        let sessions: SessionFile = serde_json::from_str(json).unwrap();
        let session = sessions.get("ada").unwrap();
        assert_eq!(session.mode, SessionMode::Step { topic: "cells".into(), step: 2 });
        assert_eq!(session.current(), Some(8));
        assert!(!session.finished);
    }

    #[test]
    fn sessions_round_trip_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut sessions = SessionFile::default();
        sessions.start(review("ada"));
        sessions.get_mut("ada").unwrap().position = 2;
        sessions.save_to(&path).unwrap();

        assert_eq!(SessionFile::load_from(&path).unwrap(), sessions);
    }
}
