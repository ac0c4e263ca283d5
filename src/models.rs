//! Records passed between the pipeline stages.
//!
//! Per-item results are sum types: a success payload or an [`ErrorRecord`],
//! never both. Both serialize untagged, so the JSON form is either the full
//! object or `{"error": "..."}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Message recorded when no story could be produced.
pub const STORY_FAILURE: &str = "Failed to generate story";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorRecord {
    pub error: String,
}

impl ErrorRecord {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Structural content pulled from one web page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageContent {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_headers: Vec<String>,
    pub h2_headers: Vec<String>,
    pub paragraphs: Vec<String>,
    pub domain: String,
}

impl PageContent {
    /// Flattens the page into the text block handed to the model.
    pub fn combined_text(&self) -> String {
        let headers: Vec<&str> = self
            .h1_headers
            .iter()
            .chain(self.h2_headers.iter())
            .map(String::as_str)
            .collect();

        format!(
            "Title: {}\nDescription: {}\nHeaders:\n{}\nContent:\n{}",
            self.title.as_deref().unwrap_or_default(),
            self.meta_description.as_deref().unwrap_or_default(),
            headers.join("\n"),
            self.paragraphs.join("\n"),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageRecord {
    Failed(ErrorRecord),
    Extracted(PageContent),
}

/// Extraction output keyed by URL.
pub type ContentMap = BTreeMap<String, PageRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryResult {
    pub narration: String,
    pub caption: String,
    #[serde(deserialize_with = "hashtags_from_string_or_list")]
    pub hashtags: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoryOutcome {
    Failed(ErrorRecord),
    Story(StoryResult),
}

impl StoryOutcome {
    pub fn story(&self) -> Option<&StoryResult> {
        match self {
            StoryOutcome::Story(story) => Some(story),
            StoryOutcome::Failed(_) => None,
        }
    }
}

/// Generator output keyed by URL.
pub type StoryMap = BTreeMap<String, StoryOutcome>;

/// Search step artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSearchRecord {
    pub query: String,
    pub timestamp: String,
    pub urls: Vec<String>,
}

// Models sometimes answer with a JSON array of tags.
fn hashtags_from_string_or_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Hashtags {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Hashtags::deserialize(deserializer)? {
        Hashtags::Joined(tags) => tags,
        Hashtags::List(tags) => tags.join(" "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> PageContent {
        PageContent {
            title: Some("ताज महल".to_string()),
            meta_description: None,
            h1_headers: vec!["Taj Mahal".to_string()],
            h2_headers: vec!["History".to_string(), "Architecture".to_string()],
            paragraphs: vec!["Built by Shah Jahan.".to_string()],
            domain: "en.wikipedia.org".to_string(),
        }
    }

    #[test]
    fn page_record_serializes_all_six_fields() {
        let value = serde_json::to_value(PageRecord::Extracted(page())).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 6);
        assert_eq!(object["meta_description"], json!(null));
        assert!(object.get("error").is_none());
    }

    #[test]
    fn error_record_is_a_single_field() {
        let value = serde_json::to_value(PageRecord::Failed(ErrorRecord::new("timeout"))).unwrap();
        assert_eq!(value, json!({"error": "timeout"}));
    }

    #[test]
    fn content_map_survives_json_with_non_ascii() {
        let mut map = ContentMap::new();
        map.insert("https://en.wikipedia.org/wiki/Taj_Mahal".into(), PageRecord::Extracted(page()));
        map.insert("https://bad.example".into(), PageRecord::Failed(ErrorRecord::new("404 Not Found")));

        let text = serde_json::to_string_pretty(&map).unwrap();
        assert!(text.contains("ताज महल"));
        let back: ContentMap = serde_json::from_str(&text).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn mixed_record_is_rejected() {
        let mixed = json!({"error": "x", "title": null, "meta_description": null,
            "h1_headers": [], "h2_headers": [], "paragraphs": [], "domain": "a"});
        assert!(serde_json::from_value::<PageRecord>(mixed).is_err());
    }

    #[test]
    fn combined_text_joins_headers_in_order() {
        let text = page().combined_text();
        assert_eq!(
            text,
            "Title: ताज महल\nDescription: \nHeaders:\nTaj Mahal\nHistory\nArchitecture\nContent:\nBuilt by Shah Jahan."
        );
    }

    #[test]
    fn hashtags_accept_a_list() {
        let story: StoryResult = serde_json::from_value(json!({
            "narration": "n", "caption": "c", "hashtags": ["#TravelIndia", "#TajMahal"]
        }))
        .unwrap();
        assert_eq!(story.hashtags, "#TravelIndia #TajMahal");
    }

    #[test]
    fn story_requires_all_fields() {
        let partial = json!({"narration": "n", "caption": "c"});
        assert!(serde_json::from_value::<StoryResult>(partial).is_err());
    }
}
