//! Resolves a model identifier to a local directory.
//!
//! An existing directory is used as-is. Anything else is treated as a
//! Hugging Face Hub repository id when the `hub` feature is enabled.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::camembert::{ModelArgs, TokenizerArgs};

pub const DEFAULT_REVISION: &str = "main";

/// ONNX graph locations tried in order when `ModelArgs::onnx_file` is unset.
pub const ONNX_CANDIDATES: [&str; 2] = ["model.onnx", "onnx/model.onnx"];

pub fn resolve_model_dir(
    model_name_or_path: &str,
    model_args: &ModelArgs,
    tokenizer_args: &TokenizerArgs,
) -> Result<PathBuf> {
    let path = Path::new(model_name_or_path);
    if path.is_dir() {
        return Ok(path.to_path_buf());
    }
    download_from_hub(model_name_or_path, model_args, tokenizer_args)
}

/// Finds the ONNX graph inside an already resolved model directory.
pub fn onnx_path(model_dir: &Path, model_args: &ModelArgs) -> Result<PathBuf> {
    if let Some(file) = &model_args.onnx_file {
        return Ok(model_dir.join(file));
    }
    ONNX_CANDIDATES
        .iter()
        .map(|candidate| model_dir.join(candidate))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no ONNX model found in {} (tried {})",
                model_dir.display(),
                ONNX_CANDIDATES.join(", ")
            )
        })
}

/// Returns the first candidate `fetch` succeeds on. When all fail, the
/// error of the last attempt is kept as the cause.
#[cfg_attr(not(feature = "hub"), allow(dead_code))]
fn fetch_first<T, E>(candidates: &[&str], mut fetch: impl FnMut(&str) -> Result<T, E>) -> Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let mut last_error = None;
    for &candidate in candidates {
        match fetch(candidate) {
            Ok(found) => return Ok(found),
            Err(err) => {
                last_error = Some(anyhow::Error::new(err).context(format!("fetching {}", candidate)))
            }
        }
    }
    let err = last_error.unwrap_or_else(|| anyhow::anyhow!("no candidates to fetch"));
    Err(err.context(format!("tried {}", candidates.join(", "))))
}

#[cfg(feature = "hub")]
fn download_from_hub(
    model_id: &str,
    model_args: &ModelArgs,
    tokenizer_args: &TokenizerArgs,
) -> Result<PathBuf> {
    use crate::encoder::ENCODER_CONFIG_FILE_NAME;
    use crate::tokenizer_factory::TOKENIZER_FILE_NAME;
    use hf_hub::api::sync::Api;
    use hf_hub::{Repo, RepoType};

    let revision = model_args
        .revision
        .clone()
        .unwrap_or_else(|| DEFAULT_REVISION.to_string());
    tracing::info!("fetching '{}' ({}) from the Hugging Face Hub", model_id, revision);

    let api = Api::new()?;
    let repo = api.repo(Repo::with_revision(model_id.to_string(), RepoType::Model, revision));

    let config = repo.get(ENCODER_CONFIG_FILE_NAME)?;
    repo.get(tokenizer_args.tokenizer_file.as_deref().unwrap_or(TOKENIZER_FILE_NAME))?;
    match &model_args.onnx_file {
        Some(file) => {
            repo.get(file)?;
        }
        None => {
            fetch_first(&ONNX_CANDIDATES, |candidate| repo.get(candidate))
                .with_context(|| format!("'{}' has no ONNX model", model_id))?;
        }
    }

    // Every file lands in the same snapshot directory.
    config
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("unexpected hub cache path {}", config.display()))
}

#[cfg(not(feature = "hub"))]
fn download_from_hub(
    model_id: &str,
    _model_args: &ModelArgs,
    _tokenizer_args: &TokenizerArgs,
) -> Result<PathBuf> {
    anyhow::bail!(
        "'{}' is not a directory and the `hub` feature is disabled",
        model_id
    )
}
