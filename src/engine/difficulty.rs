//! Difficulty and ability scores
//!
//! Both are heuristic scalars in `[0, 1]`, recomputed from answer counts on
//! every selection call.

use crate::catalog::{QuestionType, TallyRow};

/// Difficulty of a question nobody has answered yet.
///
/// Binary choice is easiest to guess, free entry hardest.
pub fn baseline(kind: QuestionType) -> f64 {
    match kind {
        QuestionType::TrueFalse => 0.10,
        QuestionType::MultiChoice => 0.25,
        QuestionType::ShortAnswer | QuestionType::Numerical => 0.40,
    }
}

/// Difficulty of a question given its answer counts.
///
/// Shrinks the empirical error rate towards the type baseline: with `t`
/// attempts the baseline weighs `1 / (t + 1)`, so heavily answered questions
/// are judged by their record.
pub fn difficulty(kind: QuestionType, n_ok: u32, n_no: u32) -> f64 {
    let base = baseline(kind);
    let total = f64::from(n_ok) + f64::from(n_no);
    if total == 0.0 {
        return base;
    }
    let error_rate = f64::from(n_no) / total;
    total * error_rate / (total + 1.0) + base / (total + 1.0)
}

/// Difficulty of a tally row
pub fn row_difficulty(row: &TallyRow) -> f64 {
    difficulty(row.kind, row.n_ok, row.n_no)
}

/// Learner ability over a set of rows (normally one topic).
///
/// Sums the success ratio of every attempted question and divides by the
/// number of rows, attempted or not. Unattempted questions count as zero, so a
/// learner only looks strong after covering most of the topic.
pub fn ability<'a, I>(rows: I) -> f64
where
    I: IntoIterator<Item = &'a TallyRow>,
{
    let mut count = 0usize;
    let mut ratio_sum = 0.0;
    for row in rows {
        count += 1;
        if row.is_attempted() {
            ratio_sum += f64::from(row.n_ok) / (f64::from(row.n_ok) + f64::from(row.n_no));
        }
    }
    if count == 0 {
        return 0.0;
    }
    ratio_sum / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(kind: QuestionType, n_ok: u32, n_no: u32) -> TallyRow {
        TallyRow {
            question_id: 0,
            topic: "t".into(),
            kind,
            question_name: "q".into(),
            n_ok,
            n_no,
        }
    }

    fn any_kind() -> impl Strategy<Value = QuestionType> {
        prop_oneof![
            Just(QuestionType::TrueFalse),
            Just(QuestionType::MultiChoice),
            Just(QuestionType::ShortAnswer),
            Just(QuestionType::Numerical),
        ]
    }

    #[test]
    fn unattempted_returns_baseline_exactly() {
        assert_eq!(difficulty(QuestionType::TrueFalse, 0, 0), 0.10);
        assert_eq!(difficulty(QuestionType::MultiChoice, 0, 0), 0.25);
        assert_eq!(difficulty(QuestionType::ShortAnswer, 0, 0), 0.40);
        assert_eq!(difficulty(QuestionType::Numerical, 0, 0), 0.40);
    }

    #[test]
    fn multichoice_three_right_one_wrong() {
        let score = difficulty(QuestionType::MultiChoice, 3, 1);
        assert!((score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn many_attempts_converge_to_error_rate() {
        let score = difficulty(QuestionType::TrueFalse, 1_000_000, 1_000_000);
        assert!((score - 0.5).abs() < 1e-5);
    }

    #[test]
    fn ability_divides_by_all_rows() {
        let rows = vec![
            row(QuestionType::TrueFalse, 2, 0),
            row(QuestionType::TrueFalse, 1, 1),
            row(QuestionType::TrueFalse, 0, 0),
            row(QuestionType::TrueFalse, 0, 0),
        ];
        // (1.0 + 0.5) / 4, not / 2
        assert!((ability(&rows) - 0.375).abs() < 1e-12);
    }

    #[test]
    fn ability_of_empty_pool_is_zero() {
        let rows: Vec<TallyRow> = Vec::new();
        assert_eq!(ability(&rows), 0.0);
    }

    proptest! {
        #[test]
        fn difficulty_stays_in_unit_interval(
            kind in any_kind(),
            n_ok in 0u32..100_000,
            n_no in 0u32..100_000,
        ) {
            let score = difficulty(kind, n_ok, n_no);
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn ability_never_drops_when_a_correct_answer_is_added(
            counts in prop::collection::vec((0u32..50, 0u32..50), 1..20),
            pick in any::<prop::sample::Index>(),
        ) {
            let rows: Vec<TallyRow> =
                counts.iter().map(|&(ok, no)| row(QuestionType::MultiChoice, ok, no)).collect();
            let before = ability(&rows);

            let mut improved = rows.clone();
            let i = pick.index(improved.len());
            improved[i].n_ok += 1;
            let after = ability(&improved);

            prop_assert!(after + 1e-12 >= before);
            prop_assert!((0.0..=1.0).contains(&after));
        }
    }
}
