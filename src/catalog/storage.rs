//! Catalog loading
//!
//! Reads the JSON catalog written by the question-bank importer.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::category::strip_common_prefix;
use super::model::Catalog;

/// Load a catalog from a JSON file.
///
/// Topic names are normalized by dropping the category prefix they all share.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog from {:?}", path))?;
    let raw: Catalog = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse catalog {:?}", path))?;

    let catalog = normalize(raw);
    warn_on_duplicate_ids(&catalog);

    tracing::debug!(
        topics = catalog.topics.len(),
        questions = catalog.question_count(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Save a catalog as pretty JSON
pub fn save_catalog(catalog: &Catalog, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create catalog directory {:?}", parent))?;
    }

    let contents =
        serde_json::to_string_pretty(catalog).with_context(|| "Failed to serialize catalog")?;

    fs::write(path, contents).with_context(|| format!("Failed to write catalog to {:?}", path))?;

    Ok(())
}

fn normalize(mut raw: Catalog) -> Catalog {
    let names: Vec<String> = raw.topics.iter().map(|t| t.name.clone()).collect();
    for (topic, name) in raw.topics.iter_mut().zip(strip_common_prefix(&names)) {
        topic.name = name;
    }
    Catalog::new(raw.topics)
}

fn warn_on_duplicate_ids(catalog: &Catalog) {
    let mut seen = HashSet::new();
    for question in catalog.questions() {
        if !seen.insert(question.id) {
            tracing::warn!(id = question.id, topic = %question.topic, "duplicate question id");
        }
    }
}
