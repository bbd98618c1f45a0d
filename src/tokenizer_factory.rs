use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tokenizers::normalizers::{Lowercase, NormalizerWrapper, Sequence};
use tokenizers::tokenizer::{NormalizedString, Normalizer, Tokenizer};

use crate::camembert::{TokenizerArgs, CLS_TOKEN, PAD_TOKEN, SEP_TOKEN};

pub const TOKENIZER_FILE_NAME: &str = "tokenizer.json";
pub const SPECIAL_TOKENS_MAP_FILE_NAME: &str = "special_tokens_map.json";

/// Names of the tokens the adapter inserts around every sentence, persisted
/// as `special_tokens_map.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialTokensMap {
    pub cls_token: String,
    pub sep_token: String,
    pub pad_token: String,
}

impl Default for SpecialTokensMap {
    fn default() -> Self {
        Self {
            cls_token: CLS_TOKEN.to_string(),
            sep_token: SEP_TOKEN.to_string(),
            pad_token: PAD_TOKEN.to_string(),
        }
    }
}

/// Entries are either plain strings or added-token objects with a `content` field.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenEntry {
    Plain(String),
    Added { content: String },
}

impl TokenEntry {
    fn into_content(self) -> String {
        match self {
            TokenEntry::Plain(content) | TokenEntry::Added { content } => content,
        }
    }
}

#[derive(Deserialize)]
struct SpecialTokensFile {
    cls_token: Option<TokenEntry>,
    sep_token: Option<TokenEntry>,
    pad_token: Option<TokenEntry>,
}

/// Ids of the tokens the adapter inserts around every sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokenIds {
    pub cls: u32,
    pub sep: u32,
    pub pad: u32,
}

pub fn get_tokenizer(model_dir: &Path, args: &TokenizerArgs) -> Result<Tokenizer> {
    let file = args.tokenizer_file.as_deref().unwrap_or(TOKENIZER_FILE_NAME);
    let mut tokenizer = Tokenizer::from_file(model_dir.join(file)).map_err(anyhow::Error::msg)?;
    // The adapter adds special tokens and pads on its own.
    tokenizer
        .with_truncation(None)
        .map_err(anyhow::Error::msg)?
        .with_padding(None);
    Ok(tokenizer)
}

/// Explicit arguments win over `special_tokens_map.json`, which wins over the
/// CamemBERT defaults.
pub fn special_tokens_map(model_dir: &Path, args: &TokenizerArgs) -> Result<SpecialTokensMap> {
    let path = model_dir.join(SPECIAL_TOKENS_MAP_FILE_NAME);
    let saved = if path.is_file() {
        Some(serde_json::from_str::<SpecialTokensFile>(&fs::read_to_string(&path)?)?)
    } else {
        None
    };
    let (cls, sep, pad) = match saved {
        Some(file) => (file.cls_token, file.sep_token, file.pad_token),
        None => (None, None, None),
    };
    let pick = |arg: &Option<String>, saved: Option<TokenEntry>, default: &str| {
        arg.clone()
            .or_else(|| saved.map(TokenEntry::into_content))
            .unwrap_or_else(|| default.to_string())
    };
    Ok(SpecialTokensMap {
        cls_token: pick(&args.cls_token, cls, CLS_TOKEN),
        sep_token: pick(&args.sep_token, sep, SEP_TOKEN),
        pad_token: pick(&args.pad_token, pad, PAD_TOKEN),
    })
}

pub fn special_token_ids(tokenizer: &Tokenizer, tokens: &SpecialTokensMap) -> Result<SpecialTokenIds> {
    let lookup = |token: &str| {
        tokenizer
            .token_to_id(token)
            .ok_or_else(|| anyhow!("special token {token:?} is not in the tokenizer vocabulary"))
    };
    Ok(SpecialTokenIds {
        cls: lookup(&tokens.cls_token)?,
        sep: lookup(&tokens.sep_token)?,
        pad: lookup(&tokens.pad_token)?,
    })
}

pub fn save_tokenizer(
    tokenizer: &Tokenizer,
    tokens: &SpecialTokensMap,
    output_path: &Path,
) -> Result<()> {
    tokenizer
        .save(output_path.join(TOKENIZER_FILE_NAME), true)
        .map_err(anyhow::Error::msg)?;
    fs::write(
        output_path.join(SPECIAL_TOKENS_MAP_FILE_NAME),
        serde_json::to_string_pretty(tokens)?,
    )?;
    Ok(())
}

/// Switches lower-casing on or off in the tokenizer's own normalizer.
pub fn apply_lower_case(tokenizer: &mut Tokenizer, do_lower_case: bool) -> Result<()> {
    let normalizer = with_lower_case(tokenizer.get_normalizer().cloned(), do_lower_case)?;
    tokenizer.with_normalizer(normalizer);
    Ok(())
}

fn lower_cases(normalizer: &NormalizerWrapper) -> Result<bool> {
    let mut sample = NormalizedString::from("CamemBERT");
    normalizer.normalize(&mut sample).map_err(anyhow::Error::msg)?;
    Ok(!sample.get().chars().any(char::is_uppercase))
}

fn is_lowercase(step: &Value) -> bool {
    step.get("type").and_then(Value::as_str) == Some("Lowercase")
}

/// Drops trailing `Lowercase` steps from a normalizer sequence.
fn without_trailing_lowercase(sequence: NormalizerWrapper) -> Result<Option<NormalizerWrapper>> {
    let mut json = serde_json::to_value(&sequence)?;
    let Some(steps) = json.get_mut("normalizers").and_then(Value::as_array_mut) else {
        return Ok(Some(sequence));
    };
    while steps.last().is_some_and(is_lowercase) {
        steps.pop();
    }
    let normalizer = match steps.len() {
        0 => None,
        1 => Some(serde_json::from_value(steps.remove(0))?),
        _ => Some(serde_json::from_value(json)?),
    };
    Ok(normalizer)
}

fn with_lower_case(
    normalizer: Option<NormalizerWrapper>,
    do_lower_case: bool,
) -> Result<Option<NormalizerWrapper>> {
    let normalizer = match (normalizer, do_lower_case) {
        (None, true) => Some(Lowercase.into()),
        (Some(NormalizerWrapper::Lowercase(_)), false) => None,
        (Some(sequence @ NormalizerWrapper::Sequence(_)), false) => {
            without_trailing_lowercase(sequence)?
        }
        (Some(existing), true) if !lower_cases(&existing)? => {
            Some(Sequence::new(vec![existing, Lowercase.into()]).into())
        }
        (existing, _) => existing,
    };
    Ok(normalizer)
}
