use anyhow::{bail, Result};
use ndarray::{concatenate, Array2, Array3, Array4, ArrayView2, Axis};

/// Model inputs, `[batch, seq]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceFeatures {
    pub input_ids: Array2<i64>,
    pub attention_mask: Array2<i64>,
}

impl SentenceFeatures {
    pub fn batch_size(&self) -> usize {
        self.input_ids.nrows()
    }

    pub fn seq_len(&self) -> usize {
        self.input_ids.ncols()
    }

    /// Stacks same-length features into one batch.
    pub fn collate(batch: &[SentenceFeatures]) -> Result<SentenceFeatures> {
        if batch.is_empty() {
            bail!("cannot collate an empty batch");
        }
        let ids: Vec<ArrayView2<i64>> = batch.iter().map(|f| f.input_ids.view()).collect();
        let masks: Vec<ArrayView2<i64>> = batch.iter().map(|f| f.attention_mask.view()).collect();
        Ok(SentenceFeatures {
            input_ids: concatenate(Axis(0), &ids)?,
            attention_mask: concatenate(Axis(0), &masks)?,
        })
    }
}

/// Output of the adapter's forward pass.
#[derive(Debug, Clone)]
pub struct TokenEmbeddings {
    pub input_ids: Array2<i64>,
    pub attention_mask: Array2<i64>,
    /// `[batch, seq, hidden]`
    pub token_embeddings: Array3<f32>,
    /// `[batch, hidden]`, the vector at sequence position 0.
    pub cls_token_embeddings: Array2<f32>,
    /// `[layers, batch, seq, hidden]`, present only when the encoder emits hidden states.
    pub all_layer_embeddings: Option<Array4<f32>>,
}
