#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use serde_json::{json, Value};
use story_writer::config::Config;

pub const TAJ_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Taj Mahal - Wikipedia</title>
    <meta name="description" content="ताज महल is an ivory-white marble mausoleum in Agra">
  </head>
  <body>
    <h1>Taj Mahal</h1>
    <h2>History</h2>
    <p>The tomb was commissioned in 1631 by Shah Jahan.</p>
    <h2>Architecture</h2>
    <p>The white domed marble mausoleum is the centrepiece.</p>
  </body>
</html>"#;

pub const AGRA_PAGE: &str = r#"<html><head><title>Agra Fort</title></head>
<body><h1>Agra Fort</h1><p>A red sandstone fortress on the Yamuna.</p></body></html>"#;

/// Config pointing every outbound call at `server_uri`, with no delays.
pub fn test_config(server_uri: &str, data_dir: &Path) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("OPENAI_BASE_URL", format!("{}/v1", server_uri)),
        ("SEARCH_ENDPOINT", format!("{}/html/", server_uri)),
        ("SEARCH_DELAY", "0".to_string()),
        ("FETCH_DELAY", "0".to_string()),
        ("FETCH_TIMEOUT", "5".to_string()),
        ("SEARCH_TIMEOUT", "5".to_string()),
        ("DATA_DIR", data_dir.display().to_string()),
    ]);
    Config::from_lookup(move |key| vars.get(key).cloned()).expect("test config should load")
}

/// DuckDuckGo-style result page linking to `urls`.
pub fn search_page(urls: &[String]) -> String {
    let results: String = urls
        .iter()
        .map(|url| format!(r#"<div class="result"><a class="result__a" href="{}">result</a></div>"#, url))
        .collect();
    format!("<html><body>{}</body></html>", results)
}

/// Chat completions body whose first choice carries `content`.
pub fn chat_reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

pub fn story_json(place: &str) -> String {
    json!({
        "narration": format!("सफ़ेद संगमरमर, {} की कहानी", place),
        "caption": format!("Have you visited {}?", place),
        "hashtags": format!("#TravelIndia #{} #Agra #Heritage", place.replace(' ', ""))
    })
    .to_string()
}
