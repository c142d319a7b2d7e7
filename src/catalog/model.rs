//! Question catalog model
//!
//! Questions arrive from the question-bank importer already grouped into flat
//! topics. The engine only ever reads them; answer history is joined in as
//! [`TallyRow`]s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Question identifier, unique within a course
pub type QuestionId = u64;

/// Kind of question, which drives the difficulty baseline and grading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Binary choice
    TrueFalse,
    /// Pick one of several options
    MultiChoice,
    /// Free text entry
    ShortAnswer,
    /// Free numeric entry
    Numerical,
}

impl QuestionType {
    /// Name used in catalog files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrueFalse => "truefalse",
            Self::MultiChoice => "multichoice",
            Self::ShortAnswer => "shortanswer",
            Self::Numerical => "numerical",
        }
    }

    /// Whether the learner picks from the listed answers
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::TrueFalse | Self::MultiChoice)
    }
}

/// One possible answer to a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text
    pub text: String,
    /// Percent credit (100 = correct)
    pub fraction: f64,
    /// Feedback shown when this answer is given
    #[serde(default)]
    pub feedback: Option<String>,
}

impl Answer {
    /// Whether this answer earns full credit
    pub fn is_correct(&self) -> bool {
        self.fraction >= 100.0
    }
}

/// A question as produced by the importer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within the course
    pub id: QuestionId,
    /// Topic the question belongs to (filled from the enclosing topic on load)
    #[serde(default)]
    pub topic: String,
    /// Question kind
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Label, unique within a topic
    pub name: String,
    /// Question stem
    #[serde(default)]
    pub text: String,
    /// Possible answers in catalog order
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// A named group of questions, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic name
    pub name: String,
    /// Questions in this topic
    pub questions: Vec<Question>,
}

/// The full question catalog of a course
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Topics in display order
    pub topics: Vec<Topic>,
}

impl Catalog {
    /// Build a catalog, stamping each question with its topic name
    pub fn new(mut topics: Vec<Topic>) -> Self {
        for topic in &mut topics {
            for question in &mut topic.questions {
                question.topic.clone_from(&topic.name);
            }
        }
        Self { topics }
    }

    /// Topic names in catalog order
    pub fn topic_names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.name.as_str()).collect()
    }

    /// Find a topic by name
    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.name == name)
    }

    /// Iterate over every question in catalog order
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.topics.iter().flat_map(|t| t.questions.iter())
    }

    /// Total question count
    pub fn question_count(&self) -> usize {
        self.topics.iter().map(|t| t.questions.len()).sum()
    }

    /// Find a question by id
    pub fn find(&self, id: QuestionId) -> Option<&Question> {
        self.questions().find(|q| q.id == id)
    }

    /// Keep only questions of the given kinds
    pub fn with_types(mut self, kinds: &[QuestionType]) -> Self {
        for topic in &mut self.topics {
            topic.questions.retain(|q| kinds.contains(&q.kind));
        }
        self
    }

    /// Join the catalog against a learner's tallies.
    ///
    /// Every question produces a row; unattempted ones carry zero counts.
    pub fn tally_rows(&self, tallies: &HashMap<QuestionId, AnswerTally>) -> Vec<TallyRow> {
        self.questions()
            .map(|q| {
                let tally = tallies.get(&q.id).copied().unwrap_or_default();
                TallyRow {
                    question_id: q.id,
                    topic: q.topic.clone(),
                    kind: q.kind,
                    question_name: q.name.clone(),
                    n_ok: tally.n_ok,
                    n_no: tally.n_no,
                }
            })
            .collect()
    }
}

/// Aggregated answers of one learner on one question
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerTally {
    /// Correct submissions
    pub n_ok: u32,
    /// Incorrect submissions
    pub n_no: u32,
}

impl AnswerTally {
    /// Count one more answer
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.n_ok = self.n_ok.saturating_add(1);
        } else {
            self.n_no = self.n_no.saturating_add(1);
        }
    }
}

/// A catalog question joined with one learner's answer counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyRow {
    pub question_id: QuestionId,
    pub topic: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub question_name: String,
    pub n_ok: u32,
    pub n_no: u32,
}

impl TallyRow {
    /// Total submissions
    pub fn attempts(&self) -> u32 {
        self.n_ok.saturating_add(self.n_no)
    }

    /// Has the learner answered this question at least once?
    pub fn is_attempted(&self) -> bool {
        self.attempts() > 0
    }
}

/// Rows belonging to one topic, in supplied order
pub fn rows_in_topic<'a>(rows: &'a [TallyRow], topic: &str) -> Vec<&'a TallyRow> {
    rows.iter().filter(|r| r.topic == topic).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: QuestionId, kind: QuestionType) -> Question {
        Question {
            id,
            topic: String::new(),
            kind,
            name: format!("q{id}"),
            text: String::new(),
            answers: Vec::new(),
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog::new(vec![
            Topic {
                name: "cells".into(),
                questions: vec![
                    question(1, QuestionType::TrueFalse),
                    question(2, QuestionType::MultiChoice),
                ],
            },
            Topic { name: "protists".into(), questions: vec![question(3, QuestionType::Numerical)] },
        ])
    }

    #[test]
    fn new_stamps_topic_on_questions() {
        let catalog = sample_catalog();
        assert_eq!(catalog.find(3).map(|q| q.topic.as_str()), Some("protists"));
        assert_eq!(catalog.question_count(), 3);
        assert_eq!(catalog.topic_names(), vec!["cells", "protists"]);
    }

    #[test]
    fn tally_rows_left_join_zero_fills() {
        let catalog = sample_catalog();
        let mut tallies = HashMap::new();
        tallies.insert(2, AnswerTally { n_ok: 3, n_no: 1 });

        let rows = catalog.tally_rows(&tallies);
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].n_ok, rows[0].n_no), (0, 0));
        assert_eq!((rows[1].n_ok, rows[1].n_no), (3, 1));
        assert!(rows[1].is_attempted());
        assert!(!rows[2].is_attempted());
    }

    #[test]
    fn extreme_tallies_saturate() {
        let mut tally = AnswerTally { n_ok: u32::MAX, n_no: u32::MAX };
        tally.record(true);
        tally.record(false);
        assert_eq!(tally, AnswerTally { n_ok: u32::MAX, n_no: u32::MAX });

        let rows = sample_catalog().tally_rows(&HashMap::from([(1, tally)]));
        assert_eq!(rows[0].attempts(), u32::MAX);
        assert!(rows[0].is_attempted());
    }

    #[test]
    fn with_types_drops_other_kinds() {
        let catalog = sample_catalog().with_types(&[QuestionType::TrueFalse]);
        assert_eq!(catalog.question_count(), 1);
        assert!(catalog.topic("protists").is_some_and(|t| t.questions.is_empty()));
    }

    #[test]
    fn question_type_uses_lowercase_names() {
        let json = serde_json::to_string(&QuestionType::ShortAnswer).unwrap();
        assert_eq!(json, "\"shortanswer\"");
        let kind: QuestionType = serde_json::from_str("\"truefalse\"").unwrap();
        assert_eq!(kind, QuestionType::TrueFalse);
        assert_eq!(kind.as_str(), "truefalse");
    }

    #[test]
    fn tally_record_counts_both_outcomes() {
        let mut tally = AnswerTally::default();
        tally.record(true);
        tally.record(false);
        tally.record(false);
        assert_eq!(tally, AnswerTally { n_ok: 1, n_no: 2 });
    }
}
