use std::{fs, path::Path};

use ndarray::{ErrorKind, ShapeError};
use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// A named, flattened tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

/// A snapshot of a model's parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub tensors: Vec<Tensor>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tensor, failing if `values` doesn't fill `shape`.
    pub fn push(&mut self, name: &str, shape: &[usize], values: &[f32]) -> Result<()> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(MlErr::SizeMismatch {
                what: "tensor values",
                got: values.len(),
                expected,
            });
        }

        self.tensors.push(Tensor {
            name: name.to_string(),
            shape: shape.to_vec(),
            values: values.to_vec(),
        });

        Ok(())
    }

    /// Splits the flat `params` into consecutive tensors, one per `(name, shape)` of `layout`.
    pub fn from_params(layout: &[(&str, Vec<usize>)], params: &[f32]) -> Result<Self> {
        let expected = layout_len(layout);
        if params.len() != expected {
            return Err(MlErr::SizeMismatch {
                what: "parameters",
                got: params.len(),
                expected,
            });
        }

        let mut checkpoint = Self::new();
        let mut rest = params;

        for (name, shape) in layout {
            let (values, tail) = rest.split_at(shape.iter().product());
            checkpoint.push(name, shape, values)?;
            rest = tail;
        }

        Ok(checkpoint)
    }

    /// Concatenates the tensors named by `layout`, in order, into a flat parameter buffer. Every
    /// tensor must have the shape `layout` gives it.
    pub fn params(&self, layout: &[(&str, Vec<usize>)]) -> Result<Vec<f32>> {
        let mut params = Vec::with_capacity(layout_len(layout));

        for (name, shape) in layout {
            let tensor = self.tensor(name)?;
            if tensor.shape != *shape {
                return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
            }

            params.extend_from_slice(&tensor.values);
        }

        Ok(params)
    }

    pub fn tensor(&self, name: &str) -> Result<&Tensor> {
        self.tensors
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| MlErr::MissingTensor(name.to_string()))
    }

    /// Writes the checkpoint to `path`, creating its parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let checkpoint: Self = serde_json::from_str(&content)?;

        for tensor in &checkpoint.tensors {
            let expected: usize = tensor.shape.iter().product();
            if tensor.values.len() != expected {
                return Err(MlErr::SizeMismatch {
                    what: "tensor values",
                    got: tensor.values.len(),
                    expected,
                });
            }
        }

        Ok(checkpoint)
    }
}

fn layout_len(layout: &[(&str, Vec<usize>)]) -> usize {
    layout.iter().map(|(_, shape)| shape.iter().product::<usize>()).sum()
}
