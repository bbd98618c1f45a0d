//! Runtime configuration for the `camembert-embed` binary, read from the
//! environment (and a `.env` file when present).

use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::pooling::Pooling;

pub const MODEL_VAR: &str = "CAMEMBERT_MODEL";
pub const MAX_SEQ_LENGTH_VAR: &str = "CAMEMBERT_MAX_SEQ_LENGTH";
pub const DO_LOWER_CASE_VAR: &str = "CAMEMBERT_DO_LOWER_CASE";
pub const POOLING_VAR: &str = "CAMEMBERT_POOLING";
pub const NORMALIZE_VAR: &str = "CAMEMBERT_NORMALIZE";
pub const SAVE_TO_VAR: &str = "CAMEMBERT_SAVE_TO";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub max_seq_length: Option<usize>,
    pub do_lower_case: Option<bool>,
    pub pooling: Pooling,
    pub normalize: bool,
    pub save_to: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let model = lookup(MODEL_VAR).ok_or_else(|| anyhow!("{} is not set", MODEL_VAR))?;
        Ok(Self {
            model,
            max_seq_length: parse(&lookup, MAX_SEQ_LENGTH_VAR)?,
            do_lower_case: parse(&lookup, DO_LOWER_CASE_VAR)?,
            pooling: parse(&lookup, POOLING_VAR)?.unwrap_or_default(),
            normalize: parse(&lookup, NORMALIZE_VAR)?.unwrap_or(false),
            save_to: lookup(SAVE_TO_VAR).map(PathBuf::from),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow!("{}", e))
                .with_context(|| format!("invalid {}={:?}", key, raw))
        })
        .transpose()
}
