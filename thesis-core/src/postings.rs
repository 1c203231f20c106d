//! Typed stage results for the search and resume stages

use serde::{Deserialize, Serialize};

/// A thesis or internship posting found on the web
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    #[serde(default, alias = "company", alias = "institution")]
    pub company_or_institution: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub deadline: Option<String>,
}

/// Structured view of the candidate's resume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl ResumeProfile {
    /// True when the LLM gave back nothing usable
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, |n| n.trim().is_empty())
            && self.skills.is_empty()
            && self.education.is_empty()
            && self.experience.is_empty()
            && self.projects.is_empty()
            && self.languages.is_empty()
            && self.summary.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_aliases() {
        let posting: JobPosting = serde_json::from_str(
            r#"{"title": "Thesis on LLM eval", "company": "Acme Oy", "url": "https://acme.fi/jobs/1"}"#,
        )
        .unwrap();
        assert_eq!(posting.company_or_institution, "Acme Oy");
        assert!(posting.requirements.is_empty());
    }

    #[test]
    fn test_resume_profile_empty() {
        let profile: ResumeProfile = serde_json::from_str("{}").unwrap();
        assert!(profile.is_empty());

        let profile: ResumeProfile =
            serde_json::from_str(r#"{"skills": ["Rust", "PyTorch"]}"#).unwrap();
        assert!(!profile.is_empty());
    }

    #[test]
    fn test_resume_profile_with_only_side_fields_is_not_empty() {
        let profile: ResumeProfile =
            serde_json::from_str(r#"{"projects": ["Thesis crawler"], "languages": ["Finnish"]}"#).unwrap();
        assert!(!profile.is_empty());

        let profile: ResumeProfile = serde_json::from_str(r#"{"name": "Aino Virtanen"}"#).unwrap();
        assert!(!profile.is_empty());

        let profile: ResumeProfile = serde_json::from_str(r#"{"name": "  ", "skills": []}"#).unwrap();
        assert!(profile.is_empty());
    }
}
