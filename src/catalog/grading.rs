//! Answer grading
//!
//! Compares a learner's raw input against a question's full-credit answers.

use regex::Regex;

use super::model::{Question, QuestionType};

/// Tolerance for numeric answers
const NUMERIC_TOLERANCE: f64 = 1e-9;

/// Expected answer that accepts any input
const WILDCARD: &str = "*";

/// Outcome of grading one answer
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    /// Did the input match a full-credit answer?
    pub correct: bool,
    /// Feedback of the answer the input matched, if any
    pub feedback: Option<String>,
    /// Full-credit answers, for display after a mistake
    pub expected: Vec<String>,
}

impl Question {
    /// Grade a learner's input
    pub fn grade(&self, input: &str) -> Grade {
        let expected: Vec<String> =
            self.answers.iter().filter(|a| a.is_correct()).map(|a| a.text.clone()).collect();

        let matched = self.answers.iter().find(|a| answer_matches(self.kind, input, &a.text));

        let correct = matched.is_some_and(|a| a.is_correct());
        let feedback = matched.and_then(|a| a.feedback.clone()).filter(|f| !f.trim().is_empty());

        Grade { correct, feedback, expected }
    }
}

/// Does `input` match the catalog answer `expected` for this question kind?
fn answer_matches(kind: QuestionType, input: &str, expected: &str) -> bool {
    if expected.trim() == WILDCARD {
        return true;
    }
    match kind {
        QuestionType::Numerical => match (parse_number(input), parse_number(expected)) {
            (Some(a), Some(b)) => (a - b).abs() <= NUMERIC_TOLERANCE,
            _ => false,
        },
        _ => glob_matches(&normalize(expected), &normalize(input)),
    }
}

/// Whole-string match where each `*` in `pattern` stands for any run of characters
fn glob_matches(pattern: &str, text: &str) -> bool {
    if !pattern.contains(WILDCARD) {
        return pattern == text;
    }
    let body = regex::escape(pattern).replace(r"\*", ".*");
    match Regex::new(&format!("^(?s:{body})$")) {
        Ok(re) => re.is_match(text),
        Err(err) => {
            tracing::warn!(pattern, %err, "unusable answer pattern");
            false
        }
    }
}

/// Lowercase and collapse runs of whitespace
fn normalize(text: &str) -> String {
    text.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}

/// Parse a number, accepting a comma as decimal separator
fn parse_number(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::Answer;

    fn question(kind: QuestionType, answers: &[(&str, f64, Option<&str>)]) -> Question {
        Question {
            id: 1,
            topic: "t".into(),
            kind,
            name: "q".into(),
            text: String::new(),
            answers: answers
                .iter()
                .map(|(text, fraction, feedback)| Answer {
                    text: (*text).into(),
                    fraction: *fraction,
                    feedback: feedback.map(Into::into),
                })
                .collect(),
        }
    }

    #[test]
    fn truefalse_matches_case_insensitively() {
        let q = question(
            QuestionType::TrueFalse,
            &[("true", 100.0, Some("Right")), ("false", 0.0, Some("Nope"))],
        );
        let grade = q.grade("TRUE");
        assert!(grade.correct);
        assert_eq!(grade.feedback.as_deref(), Some("Right"));

        let grade = q.grade("false");
        assert!(!grade.correct);
        assert_eq!(grade.feedback.as_deref(), Some("Nope"));
        assert_eq!(grade.expected, vec!["true".to_string()]);
    }

    #[test]
    fn shortanswer_collapses_whitespace() {
        let q = question(QuestionType::ShortAnswer, &[("cell  membrane", 100.0, None)]);
        assert!(q.grade("  Cell membrane ").correct);
        assert!(!q.grade("cell wall").correct);
    }

    #[test]
    fn numerical_accepts_comma_decimal() {
        let q = question(QuestionType::Numerical, &[("3.5", 100.0, None)]);
        assert!(q.grade("3,5").correct);
        assert!(q.grade("3.50").correct);
        assert!(!q.grade("3.6").correct);
        assert!(!q.grade("three").correct);
    }

    #[test]
    fn wildcard_accepts_anything() {
        let q = question(QuestionType::ShortAnswer, &[("*", 100.0, None)]);
        assert!(q.grade("whatever").correct);
    }

    #[test]
    fn wildcard_inside_an_answer_matches_any_run() {
        let q = question(QuestionType::ShortAnswer, &[("mitocondri*", 100.0, None)]);
        assert!(q.grade("mitocondrio").correct);
        assert!(q.grade("Mitocondria").correct);
        assert!(q.grade("mitocondri").correct);
        assert!(!q.grade("ribosoma").correct);

        let q = question(QuestionType::ShortAnswer, &[("cell * wall", 100.0, None)]);
        assert!(q.grade("cell plant wall").correct);
        assert!(!q.grade("cell wall membrane").correct);
    }

    #[test]
    fn regex_characters_in_answers_are_literal() {
        let q = question(QuestionType::ShortAnswer, &[("a+b (c)*", 100.0, None)]);
        assert!(q.grade("A+B (c) and more").correct);
        assert!(!q.grade("aab c").correct);
    }

    #[test]
    fn partial_credit_is_not_correct() {
        let q = question(QuestionType::MultiChoice, &[("a", 100.0, None), ("b", 50.0, None)]);
        assert!(!q.grade("b").correct);
        assert!(q.grade("a").correct);
    }
}
