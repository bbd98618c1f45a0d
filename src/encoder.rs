//! The pretrained encoder as seen by the adapter.

use anyhow::Result;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::camembert::ModelArgs;
use crate::features::SentenceFeatures;

pub const ENCODER_CONFIG_FILE_NAME: &str = "config.json";

/// The encoder's `config.json`. Keys the adapter does not use are kept in
/// `extra` so that saving writes them back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub hidden_size: usize,
    #[serde(default)]
    pub output_hidden_states: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_position_embeddings: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EncoderConfig {
    pub fn new(hidden_size: usize) -> Self {
        Self {
            hidden_size,
            output_hidden_states: false,
            max_position_embeddings: None,
            extra: Map::new(),
        }
    }

    pub fn from_dir(model_dir: &Path) -> Result<Self> {
        let contents = fs::read_to_string(model_dir.join(ENCODER_CONFIG_FILE_NAME))?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, output_path: &Path) -> Result<()> {
        fs::write(
            output_path.join(ENCODER_CONFIG_FILE_NAME),
            serde_json::to_string_pretty(self)?,
        )?;
        Ok(())
    }
}

/// A pretrained transformer encoder.
///
/// `forward` returns the encoder's outputs in order: element 0 holds the last
/// hidden state `[batch, seq, hidden]`, and when `output_hidden_states` is set
/// element 2 holds every layer's hidden state `[layers, batch, seq, hidden]`.
pub trait Encoder {
    fn from_pretrained(model_dir: &Path, args: &ModelArgs) -> Result<Self>
    where
        Self: Sized;

    fn config(&self) -> &EncoderConfig;

    fn forward(&self, features: &SentenceFeatures) -> Result<Vec<ArrayD<f32>>>;

    fn save_pretrained(&self, output_path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_config_keys_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(ENCODER_CONFIG_FILE_NAME),
            r#"{"hidden_size": 768, "model_type": "camembert", "num_hidden_layers": 12}"#,
        )
        .unwrap();

        let config = EncoderConfig::from_dir(dir.path()).unwrap();
        assert_eq!(config.hidden_size, 768);
        assert!(!config.output_hidden_states);
        assert_eq!(config.extra["model_type"], "camembert");

        let out = tempfile::tempdir().unwrap();
        config.save(out.path()).unwrap();
        assert_eq!(EncoderConfig::from_dir(out.path()).unwrap(), config);
    }
}
