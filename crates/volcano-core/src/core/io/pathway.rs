use crate::core::models::pathway::{PathwayError, ReactionNetwork, ReactionPathway, ReactionStep};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Per-reaction key holding free-text metadata instead of a step.
pub const COMMENT_KEY: &str = "comment";

#[derive(Debug, Error)]
pub enum PathwayLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Reaction '{reaction}' has step key '{key}', which is not a non-negative integer")]
    InvalidStepKey { reaction: String, key: String },
    #[error("Reaction '{reaction}', step '{key}' is malformed: {source}")]
    InvalidStep {
        reaction: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Pathway(#[from] PathwayError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    reactants: BTreeMap<String, f64>,
    products: BTreeMap<String, f64>,
}

/// Reads a reaction-pathway document from disk.
pub fn load_reaction_pathway(path: &Path) -> Result<ReactionNetwork, PathwayLoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| PathwayLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let network = parse_reaction_pathway(&content)?;
    debug!("Loaded {} reaction(s) from {:?}", network.len(), path);
    Ok(network)
}

/// Parses `{reaction: {step: {"reactants": {..}, "products": {..}}, "comment": ..}}`.
///
/// The optional `comment` entry of each reaction is kept as metadata and never parsed as a
/// step. Species labels are resolved into [`Species`](crate::core::models::species::Species)
/// variants here, once.
pub fn parse_reaction_pathway(content: &str) -> Result<ReactionNetwork, PathwayLoadError> {
    let document: BTreeMap<String, BTreeMap<String, Value>> = serde_json::from_str(content)?;

    let mut network = ReactionNetwork::new();
    for (reaction, mut entries) in document {
        let comment = entries.remove(COMMENT_KEY).map(|value| match value {
            Value::String(text) => text,
            other => other.to_string(),
        });

        let mut steps = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let index: usize = key
                .trim()
                .parse()
                .map_err(|_| PathwayLoadError::InvalidStepKey {
                    reaction: reaction.clone(),
                    key: key.clone(),
                })?;
            let raw: RawStep =
                serde_json::from_value(value).map_err(|source| PathwayLoadError::InvalidStep {
                    reaction: reaction.clone(),
                    key: key.clone(),
                    source,
                })?;
            steps.push(ReactionStep::from_labels(
                &reaction,
                index,
                raw.reactants.iter().map(|(label, count)| (label.as_str(), *count)),
                raw.products.iter().map(|(label, count)| (label.as_str(), *count)),
            )?);
        }

        network.insert(ReactionPathway::new(reaction, comment, steps)?);
    }
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::species::Species;
    use std::fs;
    use tempfile::tempdir;

    const CO2RR: &str = r#"{
        "CO2RR_CO": {
            "comment": "CO2 to CO via COOH",
            "2": {"reactants": {"*COOH": 1, "PEP": 1}, "products": {"*CO": 1, "H2O_l": 1}},
            "1": {"reactants": {"*": 1, "CO2_g": 1, "PEP": 1}, "products": {"*COOH": 1}},
            "10": {"reactants": {"*CO": 1}, "products": {"*": 1, "CO_g": 1}}
        }
    }"#;

    #[test]
    fn parses_steps_in_numeric_order_and_keeps_comment() {
        let network = parse_reaction_pathway(CO2RR).unwrap();
        let pathway = network.get("CO2RR_CO").unwrap();

        assert_eq!(pathway.step_indices(), vec![1, 2, 10]);
        assert_eq!(pathway.comment(), Some("CO2 to CO via COOH"));

        let first = &pathway.steps()[0];
        assert_eq!(first.reactants.get(&Species::CleanSite), Some(&1.0));
        assert_eq!(first.reactants.get(&Species::Free("CO2".to_string())), Some(&1.0));
        assert_eq!(
            first.products.get(&Species::Adsorbed("COOH".to_string())),
            Some(&1.0)
        );
    }

    #[test]
    fn reaction_without_comment_is_accepted() {
        let network = parse_reaction_pathway(
            r#"{"HER": {"1": {"reactants": {"*": 1, "PEP": 1}, "products": {"*H": 1}}}}"#,
        )
        .unwrap();
        assert_eq!(network.get("HER").unwrap().comment(), None);
    }

    #[test]
    fn non_integer_step_key_is_rejected() {
        let result = parse_reaction_pathway(
            r#"{"HER": {"first": {"reactants": {"*": 1}, "products": {"*H": 1}}}}"#,
        );
        assert!(matches!(
            result,
            Err(PathwayLoadError::InvalidStepKey { ref key, .. }) if key == "first"
        ));
    }

    #[test]
    fn step_missing_products_is_rejected() {
        let result = parse_reaction_pathway(r#"{"HER": {"1": {"reactants": {"*": 1}}}}"#);
        assert!(matches!(result, Err(PathwayLoadError::InvalidStep { .. })));
    }

    #[test]
    fn reaction_with_only_a_comment_has_no_steps() {
        let result = parse_reaction_pathway(r#"{"HER": {"comment": "empty"}}"#);
        assert!(matches!(
            result,
            Err(PathwayLoadError::Pathway(PathwayError::NoSteps { .. }))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            parse_reaction_pathway("{not json"),
            Err(PathwayLoadError::Json(_))
        ));
    }

    #[test]
    fn load_reads_from_disk_and_reports_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reactions.json");
        fs::write(&path, CO2RR).unwrap();
        assert_eq!(load_reaction_pathway(&path).unwrap().len(), 1);

        let missing = load_reaction_pathway(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(PathwayLoadError::Io { .. })));
    }
}
