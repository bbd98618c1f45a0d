use anyhow::{bail, Result};
use ndarray::{Array, Array2, Axis};
use ndarray_stats::SummaryStatisticsExt;

/// Weighted mean of equally sized embeddings.
pub fn mean(embeddings: Vec<Vec<f32>>, weights: Vec<f32>) -> Result<Vec<f32>> {
    let num_embeddings = embeddings.len();
    if num_embeddings == 0 {
        bail!("cannot average zero embeddings");
    }
    let embedding_dim = embeddings[0].len();
    let flat_embeddings: Vec<f32> = embeddings.into_iter().flatten().collect();
    let array = Array2::from_shape_vec((num_embeddings, embedding_dim), flat_embeddings)?;

    let weights = Array::from_vec(weights);
    let mean_embedding = array.weighted_mean_axis(Axis(0), &weights)?;

    let (v, _) = mean_embedding.into_raw_vec_and_offset();
    Ok(v)
}
