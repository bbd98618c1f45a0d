use anyhow::{bail, Result};
use text_splitter::{ChunkConfig, TextSplitter};
use tokenizers::tokenizer::Tokenizer;

/// Splits `text` into chunks of at most `max_tokens` tokens, as counted by
/// the model's own tokenizer. Whitespace-only input yields no chunks.
pub fn split(text: &str, tokenizer: &Tokenizer, max_tokens: usize) -> Result<Vec<String>> {
    if max_tokens == 0 {
        bail!("chunks must hold at least one token");
    }
    let splitter = TextSplitter::new(ChunkConfig::new(max_tokens).with_sizer(tokenizer));
    Ok(splitter
        .chunks(text)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(str::to_string)
        .collect())
}
