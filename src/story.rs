//! Narrative generator: turns extracted page content into short reel stories.

use std::path::Path;

use tracing::{info, warn};

use crate::artifacts::{self, NARROW_INDENT};
use crate::config::LlmConfig;
use crate::llm::ChatClient;
use crate::models::{
    ContentMap, ErrorRecord, PageRecord, StoryMap, StoryOutcome, StoryResult, STORY_FAILURE,
};
use crate::tokens::{count_or_zero, counter_for_model, fit_to_budget, TokenCounter};

const SYSTEM_PROMPT: &str = "You are an expert story writer. Generate a story about the place and return the response as a JSON object with 'narration', 'caption', and 'hashtags' fields.";

const JSON_REMINDER: &str = "Please return the response in JSON format.";

/// Builds the reel-story instruction for `location` around `data`.
pub fn story_prompt(location: &str, data: &str, language: &str) -> String {
    let mut prompt = String::with_capacity(data.len() + 1400);
    prompt.push_str(&format!(
        "Based on the following information about {location}, create a short, engaging story script for an Instagram Reel (30-60 seconds). \
The story should be vivid, emotional, and culturally resonant, capturing the essence of the location for a travel audience. \
Focus on sensory details (sights, sounds, feelings) and a narrative arc that inspires viewers to visit or connect with the place. \
Output in {language}.\n\nData: "
    ));
    prompt.push_str(data);
    prompt.push_str(&format!(
        r##"

Format:
{{
    "narration": "The story text, concise and rhythmic, suitable for voice-over in a 30-60 second reel",
    "caption": "A short, catchy caption for the reel",
    "hashtags": "Relevant hashtags (e.g., #TravelIndia, #{location})"
}}

Instructions:
1. Keep the narration vivid, emotional, and under 100 words for brevity.
2. Highlight cultural, historical, or natural elements of {location}.
3. Ensure the caption is engaging and encourages interaction (e.g., 'Have you visited?').
4. Include 4-6 hashtags relevant to travel and the location.
5. If data is limited, use general knowledge about {location} to enrich the story.
"##
    ));
    prompt
}

/// Parses the model reply. Anything that is not a complete story is `None`.
pub fn parse_story(reply: &str) -> Option<StoryResult> {
    match serde_json::from_str::<StoryResult>(reply) {
        Ok(story) => Some(story),
        Err(e) => {
            warn!("Error parsing JSON response: {}", e);
            None
        }
    }
}

/// Human-readable rendering of the successful stories.
pub fn render_report(stories: &StoryMap) -> String {
    let mut report = String::new();
    for (location, outcome) in stories {
        let Some(story) = outcome.story() else {
            continue;
        };
        report.push_str(&format!("Location: {}\n", location));
        report.push_str(&"-".repeat(50));
        report.push('\n');
        report.push_str(&format!("Narration:\n{}\n\n", story.narration));
        report.push_str(&format!("Caption:\n{}\n\n", story.caption));
        report.push_str(&format!("Hashtags:\n{}\n", story.hashtags));
        report.push_str(&"=".repeat(50));
        report.push_str("\n\n");
    }
    report
}

pub struct StoryGenerator {
    chat: ChatClient,
    counter: Box<dyn TokenCounter>,
    language: String,
    max_prompt_tokens: usize,
}

impl StoryGenerator {
    pub fn new(config: &LlmConfig) -> Self {
        Self::with_counter(config, counter_for_model(&config.model))
    }

    pub fn with_counter(config: &LlmConfig, counter: Box<dyn TokenCounter>) -> Self {
        Self {
            chat: ChatClient::new(config),
            counter,
            language: config.story_language.clone(),
            max_prompt_tokens: config.max_prompt_tokens,
        }
    }

    /// Generates one story per extracted page, keyed by URL, and writes the
    /// JSON and text artifacts. Extraction errors are carried through; a page
    /// whose generation fails gets a [`STORY_FAILURE`] record.
    pub async fn generate(&self, query: &str, content: &ContentMap, output: &Path) -> crate::error::Result<StoryMap> {
        if let Some(parent) = output.parent() {
            artifacts::ensure_dir(parent).await?;
        }

        info!("Processing {} websites...", content.len());
        let mut stories = StoryMap::new();

        for (url, record) in content {
            info!("Processing: {}", url);
            let outcome = match record {
                PageRecord::Failed(failure) => {
                    info!("Skipping due to previous error: {}", failure.error);
                    StoryOutcome::Failed(failure.clone())
                }
                PageRecord::Extracted(page) => match self.write_story(query, &page.combined_text()).await {
                    Some(story) => StoryOutcome::Story(story),
                    None => StoryOutcome::Failed(ErrorRecord::new(STORY_FAILURE)),
                },
            };
            stories.insert(url.clone(), outcome);
        }

        if stories.is_empty() {
            warn!("No content to write a story from for: {}", query);
            stories.insert(query.to_string(), StoryOutcome::Failed(ErrorRecord::new(STORY_FAILURE)));
        }

        artifacts::write_json(output, &stories, NARROW_INDENT).await?;
        let report = artifacts::report_path(output);
        artifacts::write_text(&report, &render_report(&stories)).await?;

        info!("Processing complete. Results saved to {} and {}", output.display(), report.display());
        Ok(stories)
    }

    /// Builds a prompt that fits the token budget, shrinking `content` if needed.
    pub fn budgeted_prompt(&self, location: &str, content: &str) -> String {
        let prompt = story_prompt(location, content, &self.language);
        let tokens = count_or_zero(self.counter.as_ref(), &prompt);

        if tokens <= self.max_prompt_tokens {
            return prompt;
        }

        warn!("Content too long ({} tokens). Truncating...", tokens);
        let truncated = fit_to_budget(self.counter.as_ref(), content, tokens, self.max_prompt_tokens);
        story_prompt(location, truncated, &self.language)
    }

    async fn write_story(&self, location: &str, content: &str) -> Option<StoryResult> {
        let prompt = self.budgeted_prompt(location, content);
        let user = format!("{}\n{}", prompt, JSON_REMINDER);

        match self.chat.complete_json(SYSTEM_PROMPT, &user).await {
            Ok(reply) => parse_story(&reply),
            Err(e) => {
                warn!("Error in story generation: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{BpeCounter, TokenizerError, DEFAULT_MAX_PROMPT_TOKENS};

    struct BrokenCounter;

    impl TokenCounter for BrokenCounter {
        fn count(&self, _text: &str) -> Result<usize, TokenizerError> {
            Err(TokenizerError("unknown model".into()))
        }
    }

    fn llm_config(max_prompt_tokens: usize) -> LlmConfig {
        LlmConfig {
            api_key: "sk-test".into(),
            base_url: "http://127.0.0.1:9".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.1,
            story_language: "Hindi".into(),
            max_prompt_tokens,
        }
    }

    fn story(n: &str) -> StoryResult {
        StoryResult {
            narration: format!("narration {}", n),
            caption: format!("caption {}", n),
            hashtags: "#TravelIndia #TajMahal".into(),
        }
    }

    #[test]
    fn prompt_embeds_data_and_requirements() {
        let prompt = story_prompt("Taj Mahal", "Title: Taj Mahal\nContent:\nमकबरा", "Hindi");
        assert!(prompt.contains("Data: Title: Taj Mahal\nContent:\nमकबरा"));
        assert!(prompt.contains("Output in Hindi."));
        assert!(prompt.contains("\"narration\""));
        assert!(prompt.contains("\"caption\""));
        assert!(prompt.contains("#Taj Mahal"));
        assert!(prompt.contains("4-6 hashtags"));
        assert!(prompt.contains("under 100 words"));
    }

    #[test]
    fn short_prompt_is_not_truncated() {
        let generator = StoryGenerator::new(&llm_config(DEFAULT_MAX_PROMPT_TOKENS));
        let prompt = generator.budgeted_prompt("Agra", "a modest amount of content");
        assert_eq!(prompt, story_prompt("Agra", "a modest amount of content", "Hindi"));
    }

    #[test]
    fn long_hindi_prompt_is_truncated_to_budget() {
        let generator = StoryGenerator::new(&llm_config(1_000));
        let content = "ताज महल आगरा में यमुना नदी के किनारे स्थित एक सफ़ेद संगमरमर का मकबरा है। ".repeat(200);

        let encoder = BpeCounter::for_model("gpt-4o-mini").unwrap();
        assert!(encoder.count(&content).unwrap() > 1_000);

        let prompt = generator.budgeted_prompt("Agra", &content);
        let data_start = prompt.find("Data: ").unwrap() + "Data: ".len();
        let data_end = prompt.find("\n\nFormat:").unwrap();
        let data = &prompt[data_start..data_end];

        assert!(data.len() < content.len());
        assert!(content.starts_with(data));
        assert!(encoder.count(data).unwrap() <= 1_000);
    }

    #[test]
    fn tokenizer_failure_skips_truncation() {
        let generator = StoryGenerator::with_counter(&llm_config(10), Box::new(BrokenCounter));
        let content = "x".repeat(500);
        assert_eq!(generator.budgeted_prompt("Agra", &content), story_prompt("Agra", &content, "Hindi"));
    }

    #[test]
    fn invalid_json_reply_is_no_story() {
        assert_eq!(parse_story("Here is your story: once upon a time"), None);
        assert_eq!(parse_story(r#"{"narration": "only this"}"#), None);
    }

    #[test]
    fn valid_reply_is_a_story() {
        let reply = r##"{"narration": "संगमरमर की कहानी", "caption": "Have you visited?", "hashtags": "#TajMahal #Agra"}"##;
        let story = parse_story(reply).unwrap();
        assert_eq!(story.narration, "संगमरमर की कहानी");
        assert_eq!(story.hashtags, "#TajMahal #Agra");
    }

    #[test]
    fn report_skips_error_entries() {
        let mut stories = StoryMap::new();
        stories.insert("https://a.example/".into(), StoryOutcome::Story(story("a")));
        stories.insert("https://b.example/".into(), StoryOutcome::Failed(ErrorRecord::new(STORY_FAILURE)));

        let report = render_report(&stories);
        let expected = format!(
            "Location: https://a.example/\n{}\nNarration:\nnarration a\n\nCaption:\ncaption a\n\nHashtags:\n#TravelIndia #TajMahal\n{}\n\n",
            "-".repeat(50),
            "=".repeat(50)
        );
        assert_eq!(report, expected);
    }

    #[tokio::test]
    async fn unreachable_model_yields_error_records() {
        let dir = tempfile::tempdir().unwrap();
        let generator = StoryGenerator::new(&llm_config(DEFAULT_MAX_PROMPT_TOKENS));

        let mut content = ContentMap::new();
        content.insert(
            "https://a.example/".into(),
            PageRecord::Extracted(crate::models::PageContent {
                title: Some("A".into()),
                meta_description: None,
                h1_headers: vec![],
                h2_headers: vec![],
                paragraphs: vec!["text".into()],
                domain: "a.example".into(),
            }),
        );

        let stories = generator
            .generate("Agra", &content, &dir.path().join("story.json"))
            .await
            .unwrap();

        assert_eq!(
            stories["https://a.example/"],
            StoryOutcome::Failed(ErrorRecord::new(STORY_FAILURE))
        );
        assert!(dir.path().join("story.txt").exists());
    }
}
