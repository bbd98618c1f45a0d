use anyhow::Result;
use camembert_embed::settings::Settings;
use camembert_embed::{Camembert, ModelArgs, SentenceEmbedder, TokenizerArgs};
use serde::Serialize;
use std::io::{self, BufRead, Write};

#[derive(Serialize)]
struct EmbeddingLine<'a> {
    text: &'a str,
    embedding: Vec<f32>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env()?;
    let model: Camembert = Camembert::new(
        &settings.model,
        settings.max_seq_length,
        settings.do_lower_case,
        ModelArgs::default(),
        TokenizerArgs::default(),
    )?;
    tracing::info!(
        "model '{}' ready: dimension {}, max_seq_length {}",
        settings.model,
        model.get_word_embedding_dimension(),
        model.max_seq_length()
    );

    if let Some(save_to) = &settings.save_to {
        model.save(save_to)?;
    }

    let mut texts: Vec<String> = std::env::args().skip(1).collect();
    if texts.is_empty() {
        texts = io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<String>>>()?
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect();
    }

    let embedder = SentenceEmbedder::new(model, settings.pooling, settings.normalize);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for text in &texts {
        let embedding = embedder.embed_document(text)?;
        serde_json::to_writer(&mut out, &EmbeddingLine { text, embedding })?;
        writeln!(out)?;
    }
    Ok(())
}
