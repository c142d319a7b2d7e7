//! Topic scores and course ranking

use serde::{Deserialize, Serialize};

use super::difficulty::ability;
use crate::catalog::{Catalog, TallyRow, rows_in_topic};

/// Round to three decimals for display
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A learner's score on one topic: their ability over the topic's questions
pub fn topic_score(rows: &[TallyRow], topic: &str) -> f64 {
    round3(ability(rows_in_topic(rows, topic)))
}

/// Mean topic score over the given topics, 0.0 when there are none
pub fn course_score(rows: &[TallyRow], topics: &[String]) -> f64 {
    if topics.is_empty() {
        return 0.0;
    }
    let total: f64 = topics.iter().map(|t| topic_score(rows, t)).sum();
    round3(total / topics.len() as f64)
}

/// Catalog topics minus the hidden ones, in catalog order
pub fn visible_topics(catalog: &Catalog, topics_to_hide: &[String]) -> Vec<String> {
    catalog
        .topic_names()
        .into_iter()
        .filter(|name| !topics_to_hide.iter().any(|hidden| hidden == name))
        .map(str::to_string)
        .collect()
}

/// One line of the course ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub learner: String,
    pub score: f64,
}

/// Sort learners by score, best first, ties by name
pub fn leaderboard<I>(entries: I) -> Vec<Standing>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut standings: Vec<Standing> =
        entries.into_iter().map(|(learner, score)| Standing { learner, score }).collect();
    standings.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.learner.cmp(&b.learner)));
    standings
}
