use super::tensor::Tensor;
use crate::error::{NetworkError, Result};

/// Clip bound keeping cross-entropy logs and gradients finite.
const EPSILON: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Loss {
    MeanSquaredError,
    CrossEntropy,
}

impl Loss {
    fn check_lengths(predicted: &Tensor, actual: &Tensor) -> Result<()> {
        if predicted.len() != actual.len() {
            return Err(NetworkError::ShapeMismatch(format!(
                "prediction has {} values but target has {}",
                predicted.len(),
                actual.len()
            )));
        }
        Ok(())
    }

    fn clip(p: f64) -> f64 {
        p.clamp(EPSILON, 1.0 - EPSILON)
    }

    pub fn compute(&self, predicted: &Tensor, actual: &Tensor) -> Result<f64> {
        Self::check_lengths(predicted, actual)?;
        let n = predicted.len();
        if n == 0 {
            return Ok(0.0);
        }

        let value = match self {
            // L = sum((p - a)^2) / n
            Loss::MeanSquaredError => {
                let total: f64 = predicted
                    .data()
                    .iter()
                    .zip(actual.data().iter())
                    .map(|(&p, &a)| (p - a) * (p - a))
                    .sum();
                total / n as f64
            }
            // L = -sum(a * ln(clip(p)))
            Loss::CrossEntropy => predicted
                .data()
                .iter()
                .zip(actual.data().iter())
                .map(|(&p, &a)| -a * Self::clip(p).ln())
                .sum(),
        };
        Ok(value)
    }

    /// Gradient of the loss with respect to each predicted value, shaped
    /// like the prediction.
    pub fn gradient(&self, predicted: &Tensor, actual: &Tensor) -> Result<Tensor> {
        Self::check_lengths(predicted, actual)?;
        let n = predicted.len();

        let data: Vec<f64> = match self {
            Loss::MeanSquaredError => predicted
                .data()
                .iter()
                .zip(actual.data().iter())
                .map(|(&p, &a)| 2.0 * (p - a) / n as f64)
                .collect(),
            Loss::CrossEntropy => predicted
                .data()
                .iter()
                .zip(actual.data().iter())
                .map(|(&p, &a)| -a / Self::clip(p))
                .collect(),
        };
        Tensor::from_vec(data, predicted.shape())
    }
}
