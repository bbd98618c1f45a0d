use anyhow::{anyhow, bail, Result};
use ndarray::{Array1, Axis, Ix3, Ix4};
use std::fs;
use std::path::Path;
use tokenizers::tokenizer::Tokenizer;

use super::config::{CamembertConfig, ModelArgs, TokenizerArgs};
use super::{CONFIG_FILE_NAME, DEFAULT_MAX_SEQ_LENGTH, MAX_SEQ_LENGTH_LIMIT, SPECIAL_TOKEN_SLOTS};
use crate::embedding_model_factory::OnnxEncoder;
use crate::encoder::Encoder;
use crate::features::{SentenceFeatures, TokenEmbeddings};
use crate::model_files;
use crate::tokenizer_factory::{self, SpecialTokenIds, SpecialTokensMap};

/// CamemBERT model to generate token embeddings.
///
/// Each token is mapped to an output vector from the encoder.
pub struct Camembert<E: Encoder = OnnxEncoder> {
    max_seq_length: usize,
    do_lower_case: Option<bool>,
    encoder: E,
    tokenizer: Tokenizer,
    special_tokens_map: SpecialTokensMap,
    special_tokens: SpecialTokenIds,
}

/// Caps `max_seq_length` at what the positional embeddings allow.
pub fn clamp_max_seq_length(max_seq_length: usize) -> usize {
    if max_seq_length > MAX_SEQ_LENGTH_LIMIT {
        tracing::warn!(
            "CamemBERT only allows a max_seq_length of {} ({} with special tokens). Value will be set to {}",
            MAX_SEQ_LENGTH_LIMIT,
            MAX_SEQ_LENGTH_LIMIT + SPECIAL_TOKEN_SLOTS,
            MAX_SEQ_LENGTH_LIMIT
        );
        return MAX_SEQ_LENGTH_LIMIT;
    }
    max_seq_length
}

impl<E: Encoder> Camembert<E> {
    pub fn new(
        model_name_or_path: &str,
        max_seq_length: Option<usize>,
        do_lower_case: Option<bool>,
        model_args: ModelArgs,
        mut tokenizer_args: TokenizerArgs,
    ) -> Result<Self> {
        if do_lower_case.is_some() {
            tokenizer_args.do_lower_case = do_lower_case;
        }
        let model_dir =
            model_files::resolve_model_dir(model_name_or_path, &model_args, &tokenizer_args)?;
        let encoder = E::from_pretrained(&model_dir, &model_args)?;
        let tokenizer = tokenizer_factory::get_tokenizer(&model_dir, &tokenizer_args)?;
        let special_tokens_map = tokenizer_factory::special_tokens_map(&model_dir, &tokenizer_args)?;
        Self::from_parts(
            encoder,
            tokenizer,
            max_seq_length.unwrap_or(DEFAULT_MAX_SEQ_LENGTH),
            tokenizer_args.do_lower_case,
            special_tokens_map,
        )
    }

    /// Wraps an already loaded encoder and tokenizer. A `do_lower_case`
    /// override is written into the tokenizer's normalizer, so it is saved
    /// along with the tokenizer.
    pub fn from_parts(
        encoder: E,
        mut tokenizer: Tokenizer,
        max_seq_length: usize,
        do_lower_case: Option<bool>,
        special_tokens_map: SpecialTokensMap,
    ) -> Result<Self> {
        if max_seq_length == 0 {
            bail!("max_seq_length must be positive");
        }
        if let Some(do_lower_case) = do_lower_case {
            tokenizer_factory::apply_lower_case(&mut tokenizer, do_lower_case)?;
        }
        let special_tokens = tokenizer_factory::special_token_ids(&tokenizer, &special_tokens_map)?;
        Ok(Self {
            max_seq_length: clamp_max_seq_length(max_seq_length),
            do_lower_case,
            encoder,
            tokenizer,
            special_tokens_map,
            special_tokens,
        })
    }

    pub fn load(input_path: &Path) -> Result<Self> {
        let config = CamembertConfig::read(&input_path.join(CONFIG_FILE_NAME))?;
        let model_name_or_path = input_path
            .to_str()
            .ok_or_else(|| anyhow!("model path {} is not valid UTF-8", input_path.display()))?;
        Self::new(
            model_name_or_path,
            Some(config.max_seq_length),
            config.do_lower_case,
            ModelArgs::default(),
            TokenizerArgs::default(),
        )
    }

    pub fn max_seq_length(&self) -> usize {
        self.max_seq_length
    }

    pub fn do_lower_case(&self) -> Option<bool> {
        self.do_lower_case
    }

    pub fn cls_token_id(&self) -> u32 {
        self.special_tokens.cls
    }

    pub fn sep_token_id(&self) -> u32 {
        self.special_tokens.sep
    }

    pub fn special_tokens_map(&self) -> &SpecialTokensMap {
        &self.special_tokens_map
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Returns token_embeddings, cls_token_embeddings and, when the encoder
    /// emits them, all_layer_embeddings.
    pub fn forward(&self, features: SentenceFeatures) -> Result<TokenEmbeddings> {
        let mut output_states = self.encoder.forward(&features)?.into_iter();
        let token_embeddings = output_states
            .next()
            .ok_or_else(|| anyhow!("encoder returned no outputs"))?
            .into_dimensionality::<Ix3>()?;
        // CLS token is first token
        let cls_token_embeddings = token_embeddings.index_axis(Axis(1), 0).to_owned();

        let all_layer_embeddings = if self.encoder.config().output_hidden_states {
            let hidden_states = output_states
                .nth(1)
                .ok_or_else(|| anyhow!("encoder returned no hidden states"))?;
            Some(hidden_states.into_dimensionality::<Ix4>()?)
        } else {
            None
        };
        tracing::debug!(
            "forward: token_embeddings {:?}, hidden states {}",
            token_embeddings.shape(),
            all_layer_embeddings.is_some()
        );

        Ok(TokenEmbeddings {
            input_ids: features.input_ids,
            attention_mask: features.attention_mask,
            token_embeddings,
            cls_token_embeddings,
            all_layer_embeddings,
        })
    }

    pub fn get_word_embedding_dimension(&self) -> usize {
        self.encoder.config().hidden_size
    }

    /// Tokenizes a text and maps tokens to token-ids
    pub fn tokenize(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(anyhow::Error::msg)?;
        Ok(encoding.get_ids().to_vec())
    }

    /// Convert a tokenized sentence into model input ids and attention mask.
    ///
    /// The sequence is always `min(pad_seq_length, max_seq_length) + 3` long:
    /// `<s>`, the (possibly truncated) tokens, `</s>`, then padding.
    pub fn get_sentence_features(&self, tokens: &[u32], pad_seq_length: usize) -> SentenceFeatures {
        let pad_seq_length = pad_seq_length.min(self.max_seq_length) + SPECIAL_TOKEN_SLOTS;
        let content = &tokens[..tokens.len().min(pad_seq_length - 2)];

        let mut input_ids = Vec::with_capacity(pad_seq_length);
        input_ids.push(self.special_tokens.cls as i64);
        input_ids.extend(content.iter().map(|&id| id as i64));
        input_ids.push(self.special_tokens.sep as i64);

        let mut attention_mask = vec![1i64; input_ids.len()];
        attention_mask.resize(pad_seq_length, 0);
        input_ids.resize(pad_seq_length, self.special_tokens.pad as i64);

        SentenceFeatures {
            input_ids: Array1::from(input_ids).insert_axis(Axis(0)),
            attention_mask: Array1::from(attention_mask).insert_axis(Axis(0)),
        }
    }

    pub fn get_config_dict(&self) -> CamembertConfig {
        CamembertConfig {
            max_seq_length: self.max_seq_length,
            do_lower_case: self.do_lower_case,
        }
    }

    pub fn save(&self, output_path: &Path) -> Result<()> {
        fs::create_dir_all(output_path)?;
        self.encoder.save_pretrained(output_path)?;
        tokenizer_factory::save_tokenizer(&self.tokenizer, &self.special_tokens_map, output_path)?;
        self.get_config_dict()
            .write(&output_path.join(CONFIG_FILE_NAME))?;
        tracing::info!("saved CamemBERT adapter to {}", output_path.display());
        Ok(())
    }
}
