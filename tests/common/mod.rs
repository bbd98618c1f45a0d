#![allow(dead_code)]

use anyhow::Result;
use camembert_embed::{Camembert, Encoder, EncoderConfig, ModelArgs, SentenceFeatures, TokenizerArgs};
use ndarray::{stack, Array2, Array3, ArrayD, Axis};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const HIDDEN_SIZE: usize = 4;
pub const LAYERS: usize = 2;

/// Encoder whose hidden state at `[b, t, h]` is `input_ids[b, t] + h`.
pub struct MockEncoder {
    config: EncoderConfig,
}

impl MockEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }
}

impl Encoder for MockEncoder {
    fn from_pretrained(model_dir: &Path, args: &ModelArgs) -> Result<Self> {
        let mut config = EncoderConfig::from_dir(model_dir)?;
        if let Some(output_hidden_states) = args.output_hidden_states {
            config.output_hidden_states = output_hidden_states;
        }
        Ok(Self { config })
    }

    fn config(&self) -> &EncoderConfig {
        &self.config
    }

    fn forward(&self, features: &SentenceFeatures) -> Result<Vec<ArrayD<f32>>> {
        let (batch, seq) = features.input_ids.dim();
        let hidden = self.config.hidden_size;
        let last = Array3::from_shape_fn((batch, seq, hidden), |(b, t, h)| {
            features.input_ids[[b, t]] as f32 + h as f32
        });
        let pooled = Array2::<f32>::zeros((batch, hidden));
        let mut outputs = vec![last.clone().into_dyn(), pooled.into_dyn()];
        if self.config.output_hidden_states {
            let layers = vec![last.view(); LAYERS];
            outputs.push(stack(Axis(0), &layers)?.into_dyn());
        }
        Ok(outputs)
    }

    fn save_pretrained(&self, output_path: &Path) -> Result<()> {
        fs::create_dir_all(output_path)?;
        self.config.save(output_path)
    }
}

pub const TOKENIZER_JSON: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [
    {"id": 0, "content": "<s>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 1, "content": "<pad>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 2, "content": "</s>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 3, "content": "<unk>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
  ],
  "normalizer": null,
  "pre_tokenizer": {"type": "Whitespace"},
  "post_processor": null,
  "decoder": null,
  "model": {
    "type": "WordLevel",
    "vocab": {
      "<s>": 0, "<pad>": 1, "</s>": 2, "<unk>": 3,
      "bonjour": 4, "le": 5, "monde": 6, "chat": 7, "dort": 8, ".": 9
    },
    "unk_token": "<unk>"
  }
}"#;

pub fn model_dir() -> TempDir {
    model_dir_with_tokenizer(TOKENIZER_JSON)
}

/// Same vocabulary with `<s>`/`</s>` renamed to `[CLS]`/`[SEP]`.
pub fn renamed_special_tokens_json() -> String {
    TOKENIZER_JSON
        .replace("\"<s>\"", "\"[CLS]\"")
        .replace("\"</s>\"", "\"[SEP]\"")
}

pub fn model_dir_with_tokenizer(tokenizer_json: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.json"),
        format!(r#"{{"hidden_size": {}, "model_type": "camembert"}}"#, HIDDEN_SIZE),
    )
    .unwrap();
    fs::write(dir.path().join("tokenizer.json"), tokenizer_json).unwrap();
    dir
}

pub fn adapter(
    dir: &TempDir,
    max_seq_length: Option<usize>,
    do_lower_case: Option<bool>,
) -> Camembert<MockEncoder> {
    Camembert::new(
        dir.path().to_str().unwrap(),
        max_seq_length,
        do_lower_case,
        ModelArgs::default(),
        TokenizerArgs::default(),
    )
    .unwrap()
}
