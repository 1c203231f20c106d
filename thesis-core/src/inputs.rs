//! Kickoff inputs and prompt interpolation

use serde::{Deserialize, Serialize};

use crate::DEFAULT_TOP_K;

/// Inputs handed to the crew at kickoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInputs {
    /// Field of interest (e.g. "Machine Learning")
    pub field: String,
    /// Country or city to search in
    pub location: String,
    /// Number of ranked matches to return
    pub top_k: usize,
}

impl Default for SearchInputs {
    fn default() -> Self {
        Self {
            field: "Machine Learning".to_string(),
            location: "Finland".to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl SearchInputs {
    pub fn new(field: &str, location: &str, top_k: usize) -> Self {
        Self {
            field: field.to_string(),
            location: location.to_string(),
            top_k,
        }
    }

    /// Replace `{field}`, `{location}` and `{top_k}` in a template.
    ///
    /// Any other brace-delimited text is left alone, so prompts may carry
    /// literal JSON examples.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{field}", &self.field)
            .replace("{location}", &self.location)
            .replace("{top_k}", &self.top_k.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_known_placeholders() {
        let inputs = SearchInputs::new("Robotics", "Sweden", 3);
        let rendered = inputs.render("Find {top_k} {field} theses in {location}.");
        assert_eq!(rendered, "Find 3 Robotics theses in Sweden.");
    }

    #[test]
    fn test_render_keeps_json_braces() {
        let inputs = SearchInputs::default();
        let rendered = inputs.render(r#"Return [{"rank": 1, "title": "..."}] for {field}"#);
        assert!(rendered.contains(r#"{"rank": 1, "title": "..."}"#));
        assert!(rendered.ends_with("Machine Learning"));
    }
}
