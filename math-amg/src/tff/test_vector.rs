//! Test vectors for the filtering conditions

use crate::error::{AmgError, Result};
use crate::traits::ComplexField;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Vector the filtered Schur complements must reproduce exactly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestVector {
    /// `Π_d sin(f π (x_d + 1) / (n_d + 1))`
    Sine {
        /// Frequency `f`; 1 is the smoothest mode
        frequency: f64,
    },

    /// All ones
    Constant,
}

impl Default for TestVector {
    fn default() -> Self {
        TestVector::Sine { frequency: 1.0 }
    }
}

impl TestVector {
    pub fn validate(&self) -> Result<()> {
        match *self {
            TestVector::Sine { frequency } if !(frequency.is_finite() && frequency > 0.0) => {
                Err(AmgError::InvalidParameter {
                    name: "frequency",
                    value: frequency,
                    reason: "must be finite and positive",
                })
            }
            _ => Ok(()),
        }
    }

    /// Evaluate on a block with extents `dims` (x fastest)
    pub fn evaluate<T: ComplexField>(&self, dims: &[usize]) -> Array1<T> {
        let len: usize = dims.iter().product();
        match *self {
            TestVector::Constant => Array1::from_elem(len, T::one()),
            TestVector::Sine { frequency } => {
                let factors: Vec<Vec<f64>> = dims
                    .iter()
                    .map(|&n| {
                        (0..n)
                            .map(|x| (frequency * PI * (x + 1) as f64 / (n + 1) as f64).sin())
                            .collect()
                    })
                    .collect();

                Array1::from_shape_fn(len, |mut idx| {
                    let mut value = 1.0;
                    for (factor, &n) in factors.iter().zip(dims) {
                        value *= factor[idx % n];
                        idx /= n;
                    }
                    T::from_f64(value)
                })
            }
        }
    }
}
