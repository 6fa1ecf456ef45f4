pub mod activation;
pub mod layer;
pub mod loss;
pub mod optimizer;
pub mod tensor;

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::{NetworkError, Result};
use layer::Layer;
use loss::Loss;
use optimizer::Optimizer;
use tensor::Tensor;

/// A feedforward network: an append-only stack of layers trained against
/// one loss with one optimizer. Cloning yields a fully independent copy,
/// parameters and optimizer state included.
#[derive(Clone, Debug)]
pub struct NeuralNetwork {
    layers: Vec<Layer>,
    loss: Loss,
    optimizer: Optimizer,
    loss_history: Vec<f64>,
    rng: StdRng,
}

impl NeuralNetwork {
    pub fn new(loss: Loss, optimizer: impl Into<Optimizer>) -> Self {
        Self {
            layers: Vec::new(),
            loss,
            optimizer: optimizer.into(),
            loss_history: Vec::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Like `new`, but epoch shuffling is driven by a fixed seed.
    pub fn with_seed(loss: Loss, optimizer: impl Into<Optimizer>, seed: u64) -> Self {
        Self {
            layers: Vec::new(),
            loss,
            optimizer: optimizer.into(),
            loss_history: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Mean loss per epoch, appended by `train`.
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    /// Appends a layer. The new layer must consume exactly as many values
    /// as the current last layer produces.
    pub fn add_layer(&mut self, layer: impl Into<Layer>) -> Result<()> {
        let layer = layer.into();
        if let Some(last) = self.layers.last() {
            if last.output_len() != layer.input_len() {
                return Err(NetworkError::ShapeMismatch(format!(
                    "layer expects {} input values but the previous layer produces {}",
                    layer.input_len(),
                    last.output_len()
                )));
            }
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Runs the input through every layer. An empty network returns the
    /// input unchanged.
    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let mut output = input.clone();
        for layer in &mut self.layers {
            output = layer.forward(&output)?;
        }
        Ok(output)
    }

    /// Chains the loss gradient backwards through every layer, accumulating
    /// parameter gradients, and returns the gradient with respect to the
    /// network input.
    pub fn backward(&mut self, upstream: &Tensor) -> Result<Tensor> {
        if let Some(last) = self.layers.last() {
            if upstream.len() != last.output_len() {
                return Err(NetworkError::ShapeMismatch(format!(
                    "backward expects {} gradient values, got {}",
                    last.output_len(),
                    upstream.len()
                )));
            }
        }

        let mut gradient = upstream.clone();
        for layer in self.layers.iter_mut().rev() {
            gradient = layer.backward(&gradient)?;
        }
        Ok(gradient)
    }

    fn train_sample(&mut self, input: &Tensor, target: &Tensor) -> Result<f64> {
        let prediction = self.forward(input)?;
        let loss = self.loss.compute(&prediction, target)?;
        let gradient = self.loss.gradient(&prediction, target)?;
        self.backward(&gradient)?;
        Ok(loss)
    }

    fn apply_updates(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            self.optimizer.update_layer(i, layer);
        }
    }

    /// Runs one optimization step over a batch and returns its mean loss.
    /// Gradients from every sample accumulate before the single update, with
    /// no batch-size scaling: a larger batch takes a proportionally larger
    /// step, so learning rates are coupled to the batch size in use.
    pub fn train_batch(&mut self, inputs: &[Tensor], targets: &[Tensor]) -> Result<f64> {
        if inputs.len() != targets.len() {
            return Err(NetworkError::ShapeMismatch(format!(
                "batch has {} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        if inputs.is_empty() {
            return Err(NetworkError::InvalidArgument(
                "training batch is empty".to_string(),
            ));
        }

        let mut total_loss = 0.0;
        for (input, target) in inputs.iter().zip(targets.iter()) {
            total_loss += self.train_sample(input, target)?;
        }
        self.apply_updates();
        Ok(total_loss / inputs.len() as f64)
    }

    /// Trains for `epochs` passes over the data, reshuffling every epoch and
    /// stepping once per batch. The final batch of an epoch may be short.
    /// Each epoch's mean loss is printed and recorded in the loss history.
    pub fn train(
        &mut self,
        inputs: &[Tensor],
        targets: &[Tensor],
        epochs: usize,
        batch_size: usize,
    ) -> Result<()> {
        if inputs.len() != targets.len() {
            return Err(NetworkError::ShapeMismatch(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        if inputs.is_empty() {
            return Err(NetworkError::InvalidArgument(
                "training set is empty".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(NetworkError::InvalidArgument(
                "batch size must be at least 1".to_string(),
            ));
        }

        let mut indices: Vec<usize> = (0..inputs.len()).collect();
        for epoch in 0..epochs {
            indices.shuffle(&mut self.rng);

            let mut total_loss = 0.0;
            let mut num_batches = 0;
            for chunk in indices.chunks(batch_size) {
                let mut batch_loss = 0.0;
                for &i in chunk {
                    batch_loss += self.train_sample(&inputs[i], &targets[i])?;
                }
                self.apply_updates();

                total_loss += batch_loss / chunk.len() as f64;
                num_batches += 1;
            }

            let epoch_loss = total_loss / num_batches as f64;
            self.loss_history.push(epoch_loss);
            println!("Epoch: {}, Loss: {}", epoch + 1, epoch_loss);
        }
        Ok(())
    }

    /// Forward passes without any training bookkeeping.
    pub fn predict(&mut self, inputs: &[Tensor]) -> Result<Vec<Tensor>> {
        inputs.iter().map(|input| self.forward(input)).collect()
    }
}
