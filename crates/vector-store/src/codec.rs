use crate::error::{Result, VectorStoreError};

/// Dimension of the embedding column in the original deployments.
pub const DEFAULT_DIMENSION: usize = 1536;

/// Normalizes embeddings to a fixed dimension and converts between the
/// in-memory `Vec<f32>` form and the bracketed storage literal.
#[derive(Debug, Clone, Copy)]
pub struct VectorCodec {
    dimension: usize,
}

impl VectorCodec {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Coerces any input to exactly the configured dimension: long vectors are
    /// truncated, short ones zero-padded, and a missing vector becomes the
    /// all-zero sentinel. Search treats the sentinel as "no embedding".
    pub fn normalize(&self, vector: Option<&[f32]>) -> Vec<f32> {
        let Some(vector) = vector else {
            return vec![0.0; self.dimension];
        };

        match vector.len().cmp(&self.dimension) {
            std::cmp::Ordering::Equal => vector.to_vec(),
            std::cmp::Ordering::Greater => {
                log::warn!(
                    "truncating vector of length {} to dimension {}",
                    vector.len(),
                    self.dimension
                );
                vector[..self.dimension].to_vec()
            }
            std::cmp::Ordering::Less => {
                log::warn!(
                    "zero-padding vector of length {} to dimension {}",
                    vector.len(),
                    self.dimension
                );
                let mut padded = vector.to_vec();
                padded.resize(self.dimension, 0.0);
                padded
            }
        }
    }

    /// Storage literal: `[v0,v1,...]`, the form the vector column accepts.
    pub fn encode(&self, vector: &[f32]) -> Result<String> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        let joined: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
        Ok(format!("[{}]", joined.join(",")))
    }

    pub fn decode(&self, literal: &str) -> Result<Vec<f32>> {
        let inner = literal
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| {
                VectorStoreError::Decode(format!("missing brackets in '{literal}'"))
            })?;

        let values = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner
                .split(',')
                .map(|part| {
                    part.trim()
                        .parse::<f32>()
                        .map_err(|e| VectorStoreError::Decode(format!("'{part}': {e}")))
                })
                .collect::<Result<Vec<f32>>>()?
        };

        if values.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: values.len(),
            });
        }
        Ok(values)
    }

    /// True for the all-zero sentinel written for turns without an embedding.
    pub fn is_null_sentinel(vector: &[f32]) -> bool {
        vector.iter().all(|v| *v == 0.0)
    }
}

impl Default for VectorCodec {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}
