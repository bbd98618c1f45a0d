use anyhow::{bail, Result};
use ndarray::Axis;

use crate::camembert::Camembert;
use crate::embedding_model_factory::OnnxEncoder;
use crate::encoder::Encoder;
use crate::features::SentenceFeatures;
use crate::pooling::Pooling;
use crate::splitter;
use crate::vector_mean;

/// Sentence embeddings from a [`Camembert`] adapter followed by pooling.
pub struct SentenceEmbedder<E: Encoder = OnnxEncoder> {
    model: Camembert<E>,
    pooling: Pooling,
    normalize: bool,
}

impl<E: Encoder> SentenceEmbedder<E> {
    pub fn new(model: Camembert<E>, pooling: Pooling, normalize: bool) -> Self {
        Self {
            model,
            pooling,
            normalize,
        }
    }

    pub fn model(&self) -> &Camembert<E> {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.model.get_word_embedding_dimension()
    }

    /// One embedding per sentence, in input order.
    pub fn encode(&self, sentences: &[&str]) -> Result<Vec<Vec<f32>>> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        let tokenized = sentences
            .iter()
            .map(|s| self.model.tokenize(s))
            .collect::<Result<Vec<_>>>()?;
        let longest = tokenized.iter().map(Vec::len).max().unwrap_or(0);
        let batch: Vec<SentenceFeatures> = tokenized
            .iter()
            .map(|tokens| self.model.get_sentence_features(tokens, longest))
            .collect();

        let output = self.model.forward(SentenceFeatures::collate(&batch)?)?;
        let mut pooled = self.pooling.pool(&output);
        if self.normalize {
            for mut row in pooled.axis_iter_mut(Axis(0)) {
                let norm = row.dot(&row).sqrt().max(1e-12);
                row.mapv_inplace(|v| v / norm);
            }
        }
        Ok(pooled.outer_iter().map(|row| row.to_vec()).collect())
    }

    /// Embeds text of any length: chunks of at most `max_seq_length` tokens
    /// are embedded separately and averaged, weighted by chunk length.
    pub fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        let chunks = splitter::split(text, self.model.tokenizer(), self.model.max_seq_length())?;
        if chunks.is_empty() {
            bail!("nothing to embed");
        }
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = self.encode(&refs)?;
        let weights: Vec<f32> = chunks.iter().map(|s| s.len() as f32).collect();
        vector_mean::mean(embeddings, weights)
    }
}
