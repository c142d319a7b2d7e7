//! Life-recovery quizzes
//!
//! Half the quiz revisits questions the learner has already answered right,
//! the rest comes from the designated recovery topics.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::{QuestionId, TallyRow};

/// Draw a recovery quiz of up to `n_questions` distinct ids, shuffled.
///
/// `floor(n/2)` come from questions with at least one correct answer (any
/// topic), the remainder from `recovery_topics`, or from the whole catalog when
/// that list is empty. A thin pool hands its slots to the other; the result
/// has `min(n, available)` ids.
pub fn select_recovery<R: Rng + ?Sized>(
    rows: &[TallyRow],
    recovery_topics: &[String],
    n_questions: usize,
    rng: &mut R,
) -> Vec<QuestionId> {
    let review_pool: Vec<QuestionId> =
        rows.iter().filter(|r| r.n_ok > 0).map(|r| r.question_id).collect();

    let in_recovery_topics =
        |row: &TallyRow| recovery_topics.is_empty() || recovery_topics.contains(&row.topic);

    let review_target = n_questions / 2;
    let mut picked: Vec<QuestionId> =
        review_pool.choose_multiple(rng, review_target).copied().collect();
    let mut taken: HashSet<QuestionId> = picked.iter().copied().collect();

    let recovery_pool: Vec<QuestionId> = rows
        .iter()
        .filter(|r| in_recovery_topics(r) && !taken.contains(&r.question_id))
        .map(|r| r.question_id)
        .collect();
    let recovery_target = n_questions - picked.len();
    let from_recovery: Vec<QuestionId> =
        recovery_pool.choose_multiple(rng, recovery_target).copied().collect();
    taken.extend(from_recovery.iter().copied());
    picked.extend(from_recovery);

    // Recovery topics ran dry: fill the gap with more already-mastered questions
    if picked.len() < n_questions {
        let leftovers: Vec<QuestionId> =
            review_pool.iter().copied().filter(|id| !taken.contains(id)).collect();
        let missing = n_questions - picked.len();
        picked.extend(leftovers.choose_multiple(rng, missing).copied());
    }

    picked.shuffle(rng);
    tracing::debug!(
        requested = n_questions,
        selected = picked.len(),
        review_pool = review_pool.len(),
        "recovery quiz drawn"
    );
    picked
}
