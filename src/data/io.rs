//! Tensor persistence
//!
//! Feature and label rasters are stored one tensor per file in SafeTensors
//! format under the key `"data"`, always 4-D `[N, C, H, W]` f32.

use crate::{Error, Result};
use ndarray::Array4;
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use std::path::Path;

const TENSOR_KEY: &str = "data";

/// Write a tensor to `path` in SafeTensors format.
pub fn save_tensor(path: impl AsRef<Path>, tensor: &Array4<f32>) -> Result<()> {
    let standard = tensor.as_standard_layout();
    let values = standard
        .as_slice()
        .ok_or_else(|| Error::Serialization("tensor is not contiguous".to_string()))?;
    let bytes: Vec<u8> = bytemuck::cast_slice(values).to_vec();

    let view = TensorView::new(Dtype::F32, tensor.shape().to_vec(), &bytes)
        .map_err(|e| Error::Serialization(format!("SafeTensors view failed: {e}")))?;
    let payload = safetensors::serialize([(TENSOR_KEY, view)], &None)
        .map_err(|e| Error::Serialization(format!("SafeTensors serialization failed: {e}")))?;

    std::fs::write(path, payload)?;
    Ok(())
}

/// Read a tensor previously written by [`save_tensor`].
pub fn load_tensor(path: impl AsRef<Path>) -> Result<Array4<f32>> {
    let data = std::fs::read(path.as_ref())?;
    let tensors = SafeTensors::deserialize(&data)
        .map_err(|e| Error::Serialization(format!("SafeTensors parsing failed: {e}")))?;
    let view = tensors
        .tensor(TENSOR_KEY)
        .map_err(|e| Error::Serialization(format!("missing tensor {TENSOR_KEY:?}: {e}")))?;

    if view.dtype() != Dtype::F32 {
        return Err(Error::Serialization(format!(
            "expected f32 tensor, got {:?}",
            view.dtype()
        )));
    }
    let shape = view.shape();
    if shape.len() != 4 {
        return Err(Error::Serialization(format!(
            "expected 4-D tensor, got shape {shape:?}"
        )));
    }

    let values: Vec<f32> = bytemuck::cast_slice(view.data()).to_vec();
    Array4::from_shape_vec((shape[0], shape[1], shape[2], shape[3]), values)
        .map_err(|e| Error::Serialization(format!("tensor reshape failed: {e}")))
}

/// Load a persisted feature/label tensor pair.
pub fn load_data(
    features_path: impl AsRef<Path>,
    target_path: impl AsRef<Path>,
) -> Result<(Array4<f32>, Array4<f32>)> {
    let features = load_tensor(features_path)?;
    let targets = load_tensor(target_path)?;
    Ok((features, targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use tempfile::tempdir;

    #[test]
    fn test_tensor_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("features.safetensors");

        let tensor = Array4::from_shape_fn((2, 3, 4, 5), |(n, c, h, w)| {
            (n * 1000 + c * 100 + h * 10 + w) as f32
        });
        save_tensor(&path, &tensor).unwrap();
        let restored = load_tensor(&path).unwrap();
        assert_eq!(tensor, restored);
    }

    #[test]
    fn test_load_data_pair() {
        let dir = tempdir().unwrap();
        let fpath = dir.path().join("x.safetensors");
        let tpath = dir.path().join("y.safetensors");

        let features = Array4::from_elem((3, 2, 4, 4), 0.5);
        let targets = Array4::from_elem((3, 1, 4, 4), 1.0);
        save_tensor(&fpath, &features).unwrap();
        save_tensor(&tpath, &targets).unwrap();

        let (x, y) = load_data(&fpath, &tpath).unwrap();
        assert_eq!(x, features);
        assert_eq!(y, targets);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let err = load_tensor(dir.path().join("absent.safetensors")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_corrupt_file_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.safetensors");
        std::fs::write(&path, b"not a safetensors payload").unwrap();
        let err = load_tensor(&path).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
