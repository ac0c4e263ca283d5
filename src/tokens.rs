//! Prompt token budgeting.

use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Context ceiling for the default model.
pub const DEFAULT_MAX_PROMPT_TOKENS: usize = 128_000;

#[derive(Debug, thiserror::Error)]
#[error("tokenizer failed: {0}")]
pub struct TokenizerError(pub String);

pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> Result<usize, TokenizerError>;
}

/// Byte-pair encoder matching the OpenAI model family.
pub struct BpeCounter {
    bpe: CoreBPE,
}

impl BpeCounter {
    /// `o200k_base` for the gpt-4o / o-series models, `cl100k_base` otherwise.
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        let model = model.to_ascii_lowercase();
        let uses_o200k = ["gpt-4o", "gpt-4.1", "gpt-5", "o1", "o3", "o4"]
            .iter()
            .any(|prefix| model.starts_with(prefix));

        let bpe = if uses_o200k {
            tiktoken_rs::o200k_base()
        } else {
            tiktoken_rs::cl100k_base()
        }
        .map_err(|e| TokenizerError(e.to_string()))?;

        Ok(Self { bpe })
    }
}

impl TokenCounter for BpeCounter {
    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(self.bpe.encode_with_special_tokens(text).len())
    }
}

/// Roughly four characters per token. Only used when no encoder loads.
#[derive(Debug, Default, Clone, Copy)]
pub struct EstimatingCounter;

impl TokenCounter for EstimatingCounter {
    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(text.chars().count().div_ceil(4))
    }
}

/// Picks the encoder for `model`, falling back to the estimate.
pub fn counter_for_model(model: &str) -> Box<dyn TokenCounter> {
    match BpeCounter::for_model(model) {
        Ok(counter) => Box::new(counter),
        Err(e) => {
            warn!("Falling back to estimated token counts for {}: {}", model, e);
            Box::new(EstimatingCounter)
        }
    }
}

/// Counts tokens, treating a tokenizer failure as zero.
pub fn count_or_zero(counter: &dyn TokenCounter, text: &str) -> usize {
    counter.count(text).unwrap_or_else(|e| {
        warn!("Error counting tokens: {}", e);
        0
    })
}

/// Cuts `content` in proportion to how far `prompt_tokens` overshoots
/// `ceiling`. Content within budget is returned unchanged.
pub fn truncate_to_budget(content: &str, prompt_tokens: usize, ceiling: usize) -> &str {
    if prompt_tokens <= ceiling {
        return content;
    }

    let chars = content.chars().count();
    let keep = (chars as u128 * ceiling as u128 / prompt_tokens as u128) as usize;

    match content.char_indices().nth(keep) {
        Some((byte_index, _)) => &content[..byte_index],
        None => content,
    }
}

/// Proportional cut, repeated until `counter` agrees the content fits.
/// Token density varies along real text, so one cut is not always enough.
pub fn fit_to_budget<'a>(
    counter: &dyn TokenCounter,
    content: &'a str,
    prompt_tokens: usize,
    ceiling: usize,
) -> &'a str {
    let mut fitted = truncate_to_budget(content, prompt_tokens, ceiling);
    loop {
        let tokens = count_or_zero(counter, fitted);
        if tokens <= ceiling {
            return fitted;
        }
        // Each pass keeps strictly fewer chars since tokens > ceiling.
        fitted = truncate_to_budget(fitted, tokens, ceiling);
    }
}
