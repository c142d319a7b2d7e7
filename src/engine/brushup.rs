//! Brush-up quizzes
//!
//! A voluntary review of questions the learner has already tried. The level
//! widens the net: `n * level` candidates are drawn at random and only the
//! hardest `n` survive, so higher levels concentrate harder material.

use rand::Rng;
use rand::seq::SliceRandom;

use super::difficulty::row_difficulty;
use crate::catalog::{QuestionId, TallyRow};

/// Draw a brush-up quiz, hardest question first.
///
/// Candidates are attempted questions outside `recovery_topics`. When fewer
/// than `n * level` exist the oversample shrinks to the pool and `n` shrinks in
/// proportion (keeping at least one). An empty result means brush-up is not
/// available at this level.
pub fn select_brushup<R: Rng + ?Sized>(
    rows: &[TallyRow],
    recovery_topics: &[String],
    n_questions: usize,
    level: usize,
    rng: &mut R,
) -> Vec<QuestionId> {
    let candidates: Vec<&TallyRow> = rows
        .iter()
        .filter(|r| r.is_attempted() && !recovery_topics.contains(&r.topic))
        .collect();

    let wanted = n_questions.saturating_mul(level);
    if candidates.is_empty() || wanted == 0 {
        return Vec::new();
    }

    let oversample = wanted.min(candidates.len());
    let keep = if oversample < wanted {
        (n_questions.saturating_mul(oversample) / wanted).max(1)
    } else {
        n_questions
    };

    let mut drawn: Vec<(f64, QuestionId)> = candidates
        .choose_multiple(rng, oversample)
        .map(|row| (row_difficulty(row), row.question_id))
        .collect();
    drawn.sort_by(|a, b| b.0.total_cmp(&a.0));
    drawn.truncate(keep);

    tracing::debug!(level, candidates = candidates.len(), oversample, keep, "brush-up drawn");
    drawn.into_iter().map(|(_, id)| id).collect()
}

/// Which configured levels can currently produce a brush-up quiz
pub fn brushup_availability(
    rows: &[TallyRow],
    recovery_topics: &[String],
    n_questions: usize,
    levels: &[usize],
) -> Vec<bool> {
    let has_candidates =
        rows.iter().any(|r| r.is_attempted() && !recovery_topics.contains(&r.topic));
    levels.iter().map(|&level| has_candidates && n_questions.saturating_mul(level) > 0).collect()
}
