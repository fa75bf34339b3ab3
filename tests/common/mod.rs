//! Shared test helpers for findmerge integration tests.
//!
//! Raw record builders plus a scripted decision port, so tests can drive the
//! engine without a terminal.

use findmerge::ports::{Choice, DecisionPort};

/// A raw finding record in the input document shape.
///
/// Fields not overridden by the caller carry benign defaults that parse
/// cleanly against the default configuration.
pub fn raw_finding(id: i64, title: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "severity": "High",
        "cvss_score": 7.5,
        "cvss_vector": "CVSS:3.1/AV:N/AC:L",
        "finding_type": "Web Application",
        "title": title,
        "description": "user controlled input reaches an interpreter",
        "impact": "unauthorised data access",
        "mitigation": "validate and encode all input",
        "replication_steps": null,
        "host_detection_techniques": null,
        "network_detection_techniques": null,
        "references": null,
        "finding_guidance": null,
        "tags": ["web"],
        "extra_fields": {}
    })
}

/// Decision port that replays a fixed script of choices and edits.
///
/// Panics when the engine asks for more decisions than scripted, or when a
/// scripted choice is not among the offered options.
pub struct ScriptedPort {
    choices: Vec<Choice>,
    edits: Vec<String>,
}

impl ScriptedPort {
    pub fn new(choices: Vec<Choice>) -> Self {
        Self {
            choices,
            edits: Vec::new(),
        }
    }

    pub fn with_edits(choices: Vec<Choice>, edits: Vec<&str>) -> Self {
        Self {
            choices,
            edits: edits.into_iter().map(str::to_owned).collect(),
        }
    }

    /// True when every scripted choice and edit was consumed.
    pub fn exhausted(&self) -> bool {
        self.choices.is_empty() && self.edits.is_empty()
    }
}

impl DecisionPort for ScriptedPort {
    fn ask(&mut self, prompt: &str, options: &[Choice], _default: Option<Choice>) -> Choice {
        assert!(!self.choices.is_empty(), "unexpected ask: {prompt}");
        let choice = self.choices.remove(0);
        assert!(
            options.contains(&choice),
            "scripted choice {choice:?} not offered for: {prompt}"
        );
        choice
    }

    fn edit(&mut self, _seed: &str) -> String {
        assert!(!self.edits.is_empty(), "unexpected edit");
        self.edits.remove(0)
    }
}
