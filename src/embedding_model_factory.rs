use anyhow::{bail, Result};
use ndarray::{stack, Array2, ArrayD, ArrayViewD, Axis};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::fs;
use std::path::{Path, PathBuf};

use crate::camembert::ModelArgs;
use crate::encoder::{Encoder, EncoderConfig};
use crate::features::SentenceFeatures;
use crate::model_files;

pub const ONNX_FILE_NAME: &str = "model.onnx";

/// CamemBERT encoder exported to ONNX and run with ONNX Runtime.
pub struct OnnxEncoder {
    session: Session,
    config: EncoderConfig,
    onnx_path: PathBuf,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl OnnxEncoder {
    pub fn onnx_path(&self) -> &Path {
        &self.onnx_path
    }

    fn input_tensor(&self, name: &str, features: &SentenceFeatures) -> Result<Tensor<i64>> {
        let array = match name {
            "input_ids" => features.input_ids.clone(),
            "attention_mask" => features.attention_mask.clone(),
            // CamemBERT has a single segment.
            "token_type_ids" => Array2::zeros(features.input_ids.raw_dim()),
            other => bail!("encoder expects an unsupported input '{}'", other),
        };
        Ok(Tensor::from_array(array)?)
    }
}

impl Encoder for OnnxEncoder {
    fn from_pretrained(model_dir: &Path, args: &ModelArgs) -> Result<Self> {
        let mut config = EncoderConfig::from_dir(model_dir)?;
        if let Some(output_hidden_states) = args.output_hidden_states {
            config.output_hidden_states = output_hidden_states;
        }

        let onnx_path = model_files::onnx_path(model_dir, args)?;
        let mut builder =
            Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
        if let Some(threads) = args.intra_threads {
            builder = builder.with_intra_threads(threads)?;
        }
        let session = builder.commit_from_file(&onnx_path)?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if config.output_hidden_states && output_names.len() < 3 {
            tracing::warn!(
                "output_hidden_states is set but {} only has {} outputs",
                onnx_path.display(),
                output_names.len()
            );
        }
        tracing::info!(
            "loaded encoder {} (hidden size {}, inputs {:?})",
            onnx_path.display(),
            config.hidden_size,
            input_names
        );

        Ok(Self {
            session,
            config,
            onnx_path,
            input_names,
            output_names,
        })
    }

    fn config(&self) -> &EncoderConfig {
        &self.config
    }

    fn forward(&self, features: &SentenceFeatures) -> Result<Vec<ArrayD<f32>>> {
        let inputs = self
            .input_names
            .iter()
            .map(|name| Ok((name.clone(), self.input_tensor(name, features)?)))
            .collect::<Result<Vec<(String, Tensor<i64>)>>>()?;

        let outputs = self.session.run(inputs)?;
        let mut arrays = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let view: ArrayViewD<f32> = outputs[name.as_str()].try_extract_tensor::<f32>()?;
            arrays.push(view.to_owned());
        }
        stack_hidden_states(arrays)
    }

    fn save_pretrained(&self, output_path: &Path) -> Result<()> {
        fs::create_dir_all(output_path)?;
        self.config.save(output_path)?;

        let target = output_path.join(ONNX_FILE_NAME);
        let same_file = match (fs::canonicalize(&self.onnx_path), fs::canonicalize(&target)) {
            (Ok(source), Ok(target)) => source == target,
            _ => false,
        };
        if !same_file {
            fs::copy(&self.onnx_path, &target)?;
        }
        Ok(())
    }
}

/// Graphs exported with hidden states emit one output per layer after the
/// pooler output. Folds them into a single `[layers, batch, seq, hidden]`
/// array at index 2.
fn stack_hidden_states(mut outputs: Vec<ArrayD<f32>>) -> Result<Vec<ArrayD<f32>>> {
    if outputs.len() <= 3 {
        return Ok(outputs);
    }
    let layers = outputs.split_off(2);
    let views: Vec<ArrayViewD<f32>> = layers.iter().map(|layer| layer.view()).collect();
    outputs.push(stack(Axis(0), &views)?);
    Ok(outputs)
}
