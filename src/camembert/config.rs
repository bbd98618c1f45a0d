use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The adapter's own persisted settings, stored next to the encoder and
/// tokenizer files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CamembertConfig {
    pub max_seq_length: usize,
    pub do_lower_case: Option<bool>,
}

impl CamembertConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Options forwarded to the encoder loader.
#[derive(Debug, Clone, Default)]
pub struct ModelArgs {
    /// Overrides `output_hidden_states` from the encoder's `config.json`.
    pub output_hidden_states: Option<bool>,
    /// ONNX graph path relative to the model directory.
    pub onnx_file: Option<String>,
    pub intra_threads: Option<usize>,
    /// Hub revision used when the model is fetched by name.
    pub revision: Option<String>,
}

/// Options forwarded to the tokenizer loader.
#[derive(Debug, Clone, Default)]
pub struct TokenizerArgs {
    /// Tokenizer file relative to the model directory, `tokenizer.json` if unset.
    pub tokenizer_file: Option<String>,
    pub do_lower_case: Option<bool>,
    pub cls_token: Option<String>,
    pub sep_token: Option<String>,
    pub pad_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_is_two_space_indented_with_exactly_two_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = CamembertConfig {
            max_seq_length: 128,
            do_lower_case: None,
        };
        config.write(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            "{\n  \"max_seq_length\": 128,\n  \"do_lower_case\": null\n}"
        );
        assert_eq!(CamembertConfig::read(&path).unwrap(), config);
    }

    #[test]
    fn malformed_sidecar_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ \"max_seq_length\": ").unwrap();
        assert!(CamembertConfig::read(&path).is_err());
        assert!(CamembertConfig::read(&dir.path().join("missing.json")).is_err());
    }
}
