//! Adaptive selection
//!
//! Candidates are ranked with a first-passage race: a noisy random walk starts
//! near the learner's ability and we count how long it takes to cross each
//! question's difficulty. Questions close to the learner's level are reached
//! first; ones far above or below drift to the back.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::difficulty::{ability, row_difficulty};
use crate::catalog::{QuestionId, TallyRow, rows_in_topic};

/// Race tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceParams {
    /// Multiplier on ability for the walk's start; above 1 favours harder material
    pub boost_factor: f64,
    /// Standard deviation of the per-step noise
    pub noise_sd: f64,
    /// Steps before a walk counts as never crossing
    pub horizon: usize,
}

impl Default for RaceParams {
    fn default() -> Self {
        Self { boost_factor: 1.2, noise_sd: 0.15, horizon: 1000 }
    }
}

impl RaceParams {
    /// Default race with a custom boost
    pub fn with_boost(boost_factor: f64) -> Self {
        Self { boost_factor, ..Self::default() }
    }
}

/// Steps until a walk from `start` first crosses `target`.
///
/// Crosses upwards when it starts below the target, downwards otherwise.
/// Returns the horizon if it never does.
pub fn first_passage_time<R: Rng + ?Sized>(
    start: f64,
    target: f64,
    noise: &Normal<f64>,
    horizon: usize,
    rng: &mut R,
) -> usize {
    let rising = start < target;
    let mut position = start;
    for step in 1..=horizon {
        position += noise.sample(rng);
        let crossed = if rising { position >= target } else { position <= target };
        if crossed {
            return step;
        }
    }
    horizon
}

/// Rank every candidate by crossing time, ties kept in pool order
pub fn rank_by_race<R: Rng + ?Sized>(
    rows: &[TallyRow],
    params: &RaceParams,
    rng: &mut R,
) -> Vec<QuestionId> {
    let noise = match Normal::new(0.0, params.noise_sd) {
        Ok(noise) => noise,
        Err(err) => {
            tracing::warn!(noise_sd = params.noise_sd, %err, "invalid race noise, keeping pool order");
            return rows.iter().map(|r| r.question_id).collect();
        }
    };

    let start = ability(rows) * params.boost_factor;

    let mut timed: Vec<(usize, QuestionId)> = rows
        .iter()
        .map(|row| {
            let time =
                first_passage_time(start, row_difficulty(row), &noise, params.horizon, rng);
            (time, row.question_id)
        })
        .collect();
    timed.sort_by_key(|&(time, _)| time);

    tracing::debug!(candidates = rows.len(), start, "race ranked");
    timed.into_iter().map(|(_, id)| id).collect()
}

/// Draw the `n_questions` best-matched questions from a candidate pool.
///
/// An empty pool gives an empty quiz; asking for more than the pool holds
/// returns the whole ranked pool.
pub fn select<R: Rng + ?Sized>(
    rows: &[TallyRow],
    n_questions: usize,
    params: &RaceParams,
    rng: &mut R,
) -> Vec<QuestionId> {
    let mut ranked = rank_by_race(rows, params, rng);
    ranked.truncate(n_questions);
    ranked
}

/// Every question of a topic, in catalog order
pub fn select_review(rows: &[TallyRow], topic: &str) -> Vec<QuestionId> {
    rows_in_topic(rows, topic).into_iter().map(|r| r.question_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuestionType;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn row(id: QuestionId, kind: QuestionType, n_ok: u32, n_no: u32) -> TallyRow {
        TallyRow {
            question_id: id,
            topic: "cells".into(),
            kind,
            question_name: format!("q{id}"),
            n_ok,
            n_no,
        }
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert!(select(&[], 5, &RaceParams::default(), &mut rng).is_empty());
    }

    #[test]
    fn oversized_request_returns_whole_pool() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let pool: Vec<TallyRow> =
            (1..=4).map(|id| row(id, QuestionType::MultiChoice, 0, 0)).collect();
        let mut picked = select(&pool, 10, &RaceParams::default(), &mut rng);
        picked.sort_unstable();
        assert_eq!(picked, vec![1, 2, 3, 4]);
    }

    #[test]
    fn selection_is_bounded_and_unique() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let pool: Vec<TallyRow> =
            (1..=20).map(|id| row(id, QuestionType::ShortAnswer, id as u32 % 3, 1)).collect();
        let mut picked = select(&pool, 7, &RaceParams::default(), &mut rng);
        assert_eq!(picked.len(), 7);
        picked.sort_unstable();
        picked.dedup();
        assert_eq!(picked.len(), 7);
    }

    #[test]
    fn seeded_generator_fixes_the_ranking() {
        let pool: Vec<TallyRow> = (1..=12)
            .map(|id| row(id, QuestionType::MultiChoice, id as u32 % 4, (id as u32 + 1) % 3))
            .collect();
        let a = rank_by_race(&pool, &RaceParams::default(), &mut ChaCha20Rng::seed_from_u64(9));
        let b = rank_by_race(&pool, &RaceParams::default(), &mut ChaCha20Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn tiny_noise_never_reaches_a_distant_target() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let noise = Normal::new(0.0, 1e-9).unwrap();
        assert_eq!(first_passage_time(0.5, 0.5 + 1e-3, &noise, 10, &mut rng), 10);
        assert_eq!(first_passage_time(0.5, 0.5 - 1.0, &noise, 10, &mut rng), 10);
    }

    #[test]
    fn passage_never_exceeds_horizon() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let noise = Normal::new(0.0, 0.15).unwrap();
        for _ in 0..50 {
            let t = first_passage_time(0.0, 5.0, &noise, 100, &mut rng);
            assert!((1..=100).contains(&t));
        }
    }

    #[test]
    fn close_questions_surface_before_distant_ones() {
        // A learner with no history starts the walk at 0; the easy question
        // (0.10) should usually be reached before the distant one.
        let easy = row(1, QuestionType::TrueFalse, 0, 0);
        let hard = row(2, QuestionType::ShortAnswer, 0, 200);
        let pool = vec![hard, easy];

        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let mut easy_first = 0;
        for _ in 0..200 {
            if rank_by_race(&pool, &RaceParams::default(), &mut rng)[0] == 1 {
                easy_first += 1;
            }
        }
        assert!(easy_first > 120, "easy question first only {easy_first} times");
    }

    #[test]
    fn invalid_noise_keeps_pool_order() {
        let pool: Vec<TallyRow> =
            (1..=3).map(|id| row(id, QuestionType::MultiChoice, 0, 0)).collect();
        let params = RaceParams { noise_sd: -1.0, ..RaceParams::default() };
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        assert_eq!(rank_by_race(&pool, &params, &mut rng), vec![1, 2, 3]);
    }

    #[test]
    fn review_takes_whole_topic_in_order() {
        let mut pool: Vec<TallyRow> =
            (1..=3).map(|id| row(id, QuestionType::MultiChoice, 0, 0)).collect();
        pool[1].topic = "protists".into();
        assert_eq!(select_review(&pool, "cells"), vec![1, 3]);
        assert!(select_review(&pool, "missing").is_empty());
    }
}
