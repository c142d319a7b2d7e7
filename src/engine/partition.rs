//! Step partitioning
//!
//! A topic's questions are split into ordered, disjoint steps. The split is a
//! pure function of the learner/topic seed, so it never needs storing: the
//! same learner sees the same steps for as long as the pool is unchanged.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::{QuestionId, TallyRow, rows_in_topic};

/// 128-bit seed identifying one learner's partition of one topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepSeed(pub u128);

impl StepSeed {
    /// Derive the seed from the UTF-8 concatenation of learner and topic
    pub fn derive(learner: &str, topic: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(learner.as_bytes());
        hasher.update(topic.as_bytes());
        let digest = hasher.finalize();

        let mut head = [0u8; 16];
        head.copy_from_slice(&digest[..16]);
        Self(u128::from_be_bytes(head))
    }

    /// Deterministic generator for this seed
    fn rng(self) -> ChaCha20Rng {
        let mut key = [0u8; 32];
        key[..16].copy_from_slice(&self.0.to_be_bytes());
        ChaCha20Rng::from_seed(key)
    }
}

/// The steps of one topic for one learner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPlan {
    /// Question ids per step, in permutation order
    pub chunks: Vec<Vec<QuestionId>>,
    /// Questions to ask per step quiz, never more than the smallest step holds
    pub quiz_size: usize,
}

impl StepPlan {
    /// Number of steps
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Question ids of a step (1-indexed)
    pub fn step(&self, step: usize) -> Option<&[QuestionId]> {
        step.checked_sub(1).and_then(|i| self.chunks.get(i)).map(Vec::as_slice)
    }

    /// Questions to ask for a step (1-indexed).
    ///
    /// Follows `quiz_size`, except that a non-empty step always asks at least
    /// one question so topics with fewer questions than steps can progress.
    pub fn step_quiz_size(&self, step: usize) -> usize {
        let available = self.step(step).map_or(0, <[QuestionId]>::len);
        self.quiz_size.max(1).min(available)
    }

    /// Tally rows of a step (1-indexed), in chunk order
    pub fn step_rows(&self, step: usize, rows: &[TallyRow]) -> Vec<TallyRow> {
        let Some(ids) = self.step(step) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| rows.iter().find(|r| r.question_id == *id))
            .cloned()
            .collect()
    }
}

/// Split a topic's questions into `n_steps` balanced chunks.
///
/// Rows outside `topic` are ignored. Chunk sizes differ by at most one, the
/// first `N mod n_steps` chunks taking the extra question. An empty topic
/// yields `n_steps` empty chunks and a zero quiz size.
pub fn partition(
    rows: &[TallyRow],
    topic: &str,
    n_steps: usize,
    max_quiz_size: usize,
    seed: StepSeed,
) -> StepPlan {
    let ids: Vec<QuestionId> =
        rows_in_topic(rows, topic).into_iter().map(|r| r.question_id).collect();

    if n_steps == 0 {
        return StepPlan::default();
    }

    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.shuffle(&mut seed.rng());

    let base = ids.len() / n_steps;
    let remainder = ids.len() % n_steps;

    let mut chunks = Vec::with_capacity(n_steps);
    let mut cursor = 0;
    for i in 0..n_steps {
        let size = base + usize::from(i < remainder);
        chunks.push(order[cursor..cursor + size].iter().map(|&idx| ids[idx]).collect());
        cursor += size;
    }

    let quiz_size = max_quiz_size.min(base);
    tracing::debug!(topic, n_steps, questions = ids.len(), quiz_size, "topic partitioned");

    StepPlan { chunks, quiz_size }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuestionType;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn rows(topic: &str, ids: impl IntoIterator<Item = QuestionId>) -> Vec<TallyRow> {
        ids.into_iter()
            .map(|id| TallyRow {
                question_id: id,
                topic: topic.into(),
                kind: QuestionType::MultiChoice,
                question_name: format!("q{id}"),
                n_ok: 0,
                n_no: 0,
            })
            .collect()
    }

    #[test]
    fn ten_questions_three_steps() {
        let pool = rows("cells", 1..=10);
        let seed = StepSeed::derive("giacomo", "cells");
        let plan = partition(&pool, "cells", 3, 10, seed);

        let mut sizes: Vec<usize> = plan.chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 3, 4]);
        assert_eq!(plan.quiz_size, 3);

        let again = partition(&pool, "cells", 3, 10, StepSeed::derive("giacomo", "cells"));
        assert_eq!(plan, again);
    }

    #[test]
    fn seed_depends_on_learner_and_topic() {
        let a = StepSeed::derive("giacomo", "cells");
        assert_eq!(a, StepSeed::derive("giacomo", "cells"));
        assert_ne!(a, StepSeed::derive("umberto", "cells"));
        assert_ne!(a, StepSeed::derive("giacomo", "protists"));
    }

    #[test]
    fn other_topics_are_ignored() {
        let mut pool = rows("cells", 1..=4);
        pool.extend(rows("protists", 100..=110));
        let plan = partition(&pool, "cells", 2, 10, StepSeed(7));
        let mut all: Vec<QuestionId> = plan.chunks.concat();
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4]);
    }

    #[test]
    fn quiz_size_is_capped_by_config() {
        let pool = rows("cells", 1..=40);
        let plan = partition(&pool, "cells", 2, 10, StepSeed(1));
        assert_eq!(plan.quiz_size, 10);
    }

    #[test]
    fn empty_topic_and_zero_steps_do_not_panic() {
        let plan = partition(&[], "cells", 3, 10, StepSeed(1));
        assert_eq!(plan.chunks, vec![Vec::<QuestionId>::new(); 3]);
        assert_eq!(plan.quiz_size, 0);

        let plan = partition(&rows("cells", 1..=5), "cells", 0, 10, StepSeed(1));
        assert!(plan.is_empty());
    }

    #[test]
    fn step_rows_follow_chunk_order() {
        let pool = rows("cells", 1..=6);
        let plan = partition(&pool, "cells", 2, 3, StepSeed(42));
        let step_rows = plan.step_rows(2, &pool);
        let ids: Vec<QuestionId> = step_rows.iter().map(|r| r.question_id).collect();
        assert_eq!(Some(ids.as_slice()), plan.step(2));
        assert!(plan.step(0).is_none());
        assert!(plan.step(3).is_none());
    }

    #[test]
    fn small_topics_still_ask_one_question_per_filled_step() {
        let plan = partition(&rows("cells", 1..=2), "cells", 3, 10, StepSeed(5));
        assert_eq!(plan.quiz_size, 0);
        assert_eq!(plan.step_quiz_size(1), 1);
        assert_eq!(plan.step_quiz_size(2), 1);
        assert_eq!(plan.step_quiz_size(3), 0);
        assert_eq!(plan.step_quiz_size(4), 0);

        let plan = partition(&rows("cells", 1..=10), "cells", 3, 10, StepSeed(5));
        assert_eq!(plan.step_quiz_size(1), 3);
    }

    proptest! {
        #[test]
        fn partition_is_complete_and_balanced(
            n_questions in 0u64..200,
            n_steps in 1usize..12,
            seed in any::<u128>(),
        ) {
            let pool = rows("t", 0..n_questions);
            let plan = partition(&pool, "t", n_steps, 10, StepSeed(seed));

            prop_assert_eq!(plan.len(), n_steps);

            let mut all: Vec<QuestionId> = plan.chunks.concat();
            all.sort_unstable();
            let expected: Vec<QuestionId> = (0..n_questions).collect();
            prop_assert_eq!(all, expected);

            let sizes: Vec<usize> = plan.chunks.iter().map(Vec::len).collect();
            let min = sizes.iter().copied().min().unwrap_or(0);
            let max = sizes.iter().copied().max().unwrap_or(0);
            prop_assert!(max - min <= 1);
        }

        #[test]
        fn partition_is_reproducible(
            learner in "[a-z]{1,12}",
            topic in "[a-z ]{1,12}",
            n_steps in 1usize..6,
        ) {
            let pool = rows(&topic, 0..30);
            let first = partition(&pool, &topic, n_steps, 10, StepSeed::derive(&learner, &topic));
            let second = partition(&pool, &topic, n_steps, 10, StepSeed::derive(&learner, &topic));
            prop_assert_eq!(first, second);
        }
    }
}
