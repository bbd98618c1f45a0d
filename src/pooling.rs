use anyhow::{bail, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::features::TokenEmbeddings;

/// How token embeddings are reduced to one vector per sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pooling {
    Cls,
    #[default]
    Mean,
    Max,
}

impl FromStr for Pooling {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cls" => Ok(Pooling::Cls),
            "mean" => Ok(Pooling::Mean),
            "max" => Ok(Pooling::Max),
            other => bail!("unknown pooling '{}', expected cls, mean or max", other),
        }
    }
}

impl Pooling {
    /// `[batch, hidden]` sentence embeddings. Padding positions are ignored.
    pub fn pool(&self, features: &TokenEmbeddings) -> Array2<f32> {
        match self {
            Pooling::Cls => features.cls_token_embeddings.clone(),
            Pooling::Mean => mean_pooling(features),
            Pooling::Max => max_pooling(features),
        }
    }
}

fn mask(features: &TokenEmbeddings) -> Array2<f32> {
    features.attention_mask.mapv(|m| m as f32)
}

fn mean_pooling(features: &TokenEmbeddings) -> Array2<f32> {
    let mask = mask(features).insert_axis(Axis(2));
    let summed = (&features.token_embeddings * &mask).sum_axis(Axis(1));
    let counts = mask.sum_axis(Axis(1)).mapv(|c| c.max(1e-9));
    summed / counts
}

fn max_pooling(features: &TokenEmbeddings) -> Array2<f32> {
    let mask = mask(features);
    let (batch, _, hidden) = features.token_embeddings.dim();
    let mut pooled = Array2::from_elem((batch, hidden), f32::MIN);
    for (b, sentence) in features.token_embeddings.outer_iter().enumerate() {
        for (t, token) in sentence.outer_iter().enumerate() {
            if mask[[b, t]] == 0.0 {
                continue;
            }
            let mut row = pooled.row_mut(b);
            row.zip_mut_with(&token, |acc, &v| *acc = acc.max(v));
        }
    }
    pooled
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn features() -> TokenEmbeddings {
        // one sentence, three positions, the last one padding
        let token_embeddings: Array3<f32> =
            array![[[1.0, 4.0], [3.0, 2.0], [100.0, 100.0]]];
        TokenEmbeddings {
            input_ids: array![[0, 7, 1]],
            attention_mask: array![[1, 1, 0]],
            cls_token_embeddings: token_embeddings.index_axis(Axis(1), 0).to_owned(),
            token_embeddings,
            all_layer_embeddings: None,
        }
    }

    #[test]
    fn mean_ignores_padding() {
        assert_eq!(Pooling::Mean.pool(&features()), array![[2.0f32, 3.0]]);
    }

    #[test]
    fn max_ignores_padding() {
        assert_eq!(Pooling::Max.pool(&features()), array![[3.0f32, 4.0]]);
    }

    #[test]
    fn cls_is_the_first_position() {
        assert_eq!(Pooling::Cls.pool(&features()), array![[1.0f32, 4.0]]);
    }

    #[test]
    fn parses_names() {
        assert_eq!("MEAN".parse::<Pooling>().unwrap(), Pooling::Mean);
        assert!("sum".parse::<Pooling>().is_err());
    }
}
