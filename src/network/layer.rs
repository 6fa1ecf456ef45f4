use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use super::activation::Activation;
use super::tensor::Tensor;
use crate::error::{NetworkError, Result};

/// The layer kinds a network can hold. Dense and Convolutional carry
/// trainable weights and biases plus gradient buffers of the same shape;
/// Pooling has no parameters. Gradients accumulate across backward calls
/// until an optimizer consumes and zeroes them.
#[derive(Clone, Debug)]
pub enum Layer {
    Dense(DenseLayer),
    Convolutional(ConvolutionalLayer),
    Pooling(PoolingLayer),
}

/// Mutable view of one layer's parameters and gradient buffers, handed to
/// the optimizer.
pub(crate) struct LayerParams<'a> {
    pub weights: &'a mut Tensor,
    pub biases: &'a mut Tensor,
    pub grad_weights: &'a mut Tensor,
    pub grad_biases: &'a mut Tensor,
}

impl Layer {
    /// Runs the layer on any tensor holding exactly `input_len` values,
    /// read in row-major order. Caches the pass for the next backward.
    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        match self {
            Layer::Dense(l) => l.forward(input),
            Layer::Convolutional(l) => l.forward(input),
            Layer::Pooling(l) => l.forward(input),
        }
    }

    /// Folds an upstream gradient through the cached forward pass,
    /// accumulating parameter gradients, and returns the gradient with
    /// respect to the input in the exact shape the input had.
    pub fn backward(&mut self, upstream: &Tensor) -> Result<Tensor> {
        match self {
            Layer::Dense(l) => l.backward(upstream),
            Layer::Convolutional(l) => l.backward(upstream),
            Layer::Pooling(l) => l.backward(upstream),
        }
    }

    pub fn input_len(&self) -> usize {
        match self {
            Layer::Dense(l) => l.input_len(),
            Layer::Convolutional(l) => l.input_len(),
            Layer::Pooling(l) => l.input_len(),
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            Layer::Dense(l) => l.output_len(),
            Layer::Convolutional(l) => l.output_len(),
            Layer::Pooling(l) => l.output_len(),
        }
    }

    pub fn output_shape(&self) -> (usize, usize, usize) {
        match self {
            Layer::Dense(l) => l.output_shape(),
            Layer::Convolutional(l) => l.output_shape(),
            Layer::Pooling(l) => l.output_shape(),
        }
    }

    pub fn weights(&self) -> Option<&Tensor> {
        match self {
            Layer::Dense(l) => Some(&l.weights),
            Layer::Convolutional(l) => Some(&l.weights),
            Layer::Pooling(_) => None,
        }
    }

    pub fn biases(&self) -> Option<&Tensor> {
        match self {
            Layer::Dense(l) => Some(&l.biases),
            Layer::Convolutional(l) => Some(&l.biases),
            Layer::Pooling(_) => None,
        }
    }

    pub fn grad_weights(&self) -> Option<&Tensor> {
        match self {
            Layer::Dense(l) => Some(&l.grad_weights),
            Layer::Convolutional(l) => Some(&l.grad_weights),
            Layer::Pooling(_) => None,
        }
    }

    pub fn grad_biases(&self) -> Option<&Tensor> {
        match self {
            Layer::Dense(l) => Some(&l.grad_biases),
            Layer::Convolutional(l) => Some(&l.grad_biases),
            Layer::Pooling(_) => None,
        }
    }

    pub(crate) fn params_mut(&mut self) -> Option<LayerParams<'_>> {
        match self {
            Layer::Dense(l) => Some(LayerParams {
                weights: &mut l.weights,
                biases: &mut l.biases,
                grad_weights: &mut l.grad_weights,
                grad_biases: &mut l.grad_biases,
            }),
            Layer::Convolutional(l) => Some(LayerParams {
                weights: &mut l.weights,
                biases: &mut l.biases,
                grad_weights: &mut l.grad_weights,
                grad_biases: &mut l.grad_biases,
            }),
            Layer::Pooling(_) => None,
        }
    }
}

impl From<DenseLayer> for Layer {
    fn from(layer: DenseLayer) -> Self {
        Layer::Dense(layer)
    }
}

impl From<ConvolutionalLayer> for Layer {
    fn from(layer: ConvolutionalLayer) -> Self {
        Layer::Convolutional(layer)
    }
}

impl From<PoolingLayer> for Layer {
    fn from(layer: PoolingLayer) -> Self {
        Layer::Pooling(layer)
    }
}

// dense layer

#[derive(Clone, Debug)]
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    activation: Option<Activation>,
    weights: Tensor,      // (input_size, output_size, 1)
    biases: Tensor,       // (1, output_size, 1)
    grad_weights: Tensor,
    grad_biases: Tensor,
    cache: Option<(Tensor, Tensor)>, // (input as received, activated output)
}

impl DenseLayer {
    pub fn new(
        input_size: usize,
        output_size: usize,
        activation: Option<Activation>,
    ) -> Result<Self> {
        Self::init(input_size, output_size, activation, &mut rand::rng())
    }

    pub fn with_seed(
        input_size: usize,
        output_size: usize,
        activation: Option<Activation>,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::init(input_size, output_size, activation, &mut rng)
    }

    fn init(
        input_size: usize,
        output_size: usize,
        activation: Option<Activation>,
        rng: &mut impl rand::Rng,
    ) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(NetworkError::InvalidArgument(format!(
                "dense layer sizes must be nonzero, got {}x{}",
                input_size, output_size
            )));
        }

        let std_dev = (2.0 / (input_size + output_size) as f64).sqrt();
        Ok(Self {
            input_size,
            output_size,
            activation,
            weights: Tensor::gaussian(input_size, output_size, 1, std_dev, rng),
            biases: Tensor::zeros(1, output_size, 1),
            grad_weights: Tensor::zeros(input_size, output_size, 1),
            grad_biases: Tensor::zeros(1, output_size, 1),
            cache: None,
        })
    }

    pub fn input_len(&self) -> usize {
        self.input_size
    }

    pub fn output_len(&self) -> usize {
        self.output_size
    }

    pub fn output_shape(&self) -> (usize, usize, usize) {
        (1, self.output_size, 1)
    }

    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    pub fn biases(&self) -> &Tensor {
        &self.biases
    }

    pub fn grad_weights(&self) -> &Tensor {
        &self.grad_weights
    }

    pub fn grad_biases(&self) -> &Tensor {
        &self.grad_biases
    }

    pub fn set_weights(&mut self, weights: Tensor) -> Result<()> {
        if weights.shape() != self.weights.shape() {
            return Err(NetworkError::ShapeMismatch(format!(
                "dense weights are {:?}, got {:?}",
                self.weights.shape(),
                weights.shape()
            )));
        }
        self.weights = weights;
        Ok(())
    }

    pub fn set_biases(&mut self, biases: Tensor) -> Result<()> {
        if biases.shape() != self.biases.shape() {
            return Err(NetworkError::ShapeMismatch(format!(
                "dense biases are {:?}, got {:?}",
                self.biases.shape(),
                biases.shape()
            )));
        }
        self.biases = biases;
        Ok(())
    }

    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        if input.len() != self.input_size {
            return Err(NetworkError::ShapeMismatch(format!(
                "dense layer expects {} input values, got {}",
                self.input_size,
                input.len()
            )));
        }

        let x = input.data();
        let w = self.weights.data();
        let b = self.biases.data();
        let output_size = self.output_size;

        let mut out = vec![0.0; output_size];
        out.par_iter_mut().enumerate().for_each(|(j, o)| {
            let mut sum = b[j];
            for i in 0..x.len() {
                sum += x[i] * w[i * output_size + j];
            }
            *o = sum;
        });

        if let Some(act) = &self.activation {
            act.apply_slice(&mut out);
        }

        let output = Tensor::from_vec(out, (1, output_size, 1))?;
        self.cache = Some((input.clone(), output.clone()));
        Ok(output)
    }

    pub fn backward(&mut self, upstream: &Tensor) -> Result<Tensor> {
        // reject a malformed gradient before consuming the cached pass
        if upstream.len() != self.output_size {
            return Err(NetworkError::ShapeMismatch(format!(
                "dense backward expects {} gradient values, got {}",
                self.output_size,
                upstream.len()
            )));
        }

        let (input, output) = self.cache.take().ok_or_else(|| {
            NetworkError::OperationOrder(
                "dense backward requires a completed forward pass".to_string(),
            )
        })?;

        let delta = match &self.activation {
            Some(act) => act.backward_slice(output.data(), upstream.data()),
            None => upstream.data().to_vec(),
        };

        let x = input.data();
        let output_size = self.output_size;

        let gw = self.grad_weights.data_mut();
        for i in 0..x.len() {
            for j in 0..output_size {
                gw[i * output_size + j] += x[i] * delta[j];
            }
        }

        let gb = self.grad_biases.data_mut();
        for j in 0..output_size {
            gb[j] += delta[j];
        }

        let w = self.weights.data();
        let mut dx = vec![0.0; x.len()];
        for i in 0..x.len() {
            let mut sum = 0.0;
            for j in 0..output_size {
                sum += w[i * output_size + j] * delta[j];
            }
            dx[i] = sum;
        }

        Tensor::from_vec(dx, input.shape())
    }
}

// convolutional layer

#[derive(Clone, Debug)]
pub struct ConvolutionalLayer {
    input_height: usize,
    input_width: usize,
    input_depth: usize,
    filter_size: usize,
    num_filters: usize,
    stride: usize,
    padding: usize,
    output_height: usize,
    output_width: usize,
    activation: Option<Activation>,
    weights: Tensor,      // (filter_size, filter_size, num_filters * input_depth)
    biases: Tensor,       // (1, num_filters, 1)
    grad_weights: Tensor,
    grad_biases: Tensor,
    cache: Option<(Tensor, Tensor)>,
}

impl ConvolutionalLayer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input_height: usize,
        input_width: usize,
        input_depth: usize,
        filter_size: usize,
        num_filters: usize,
        stride: usize,
        padding: usize,
        activation: Option<Activation>,
    ) -> Result<Self> {
        Self::init(
            input_height,
            input_width,
            input_depth,
            filter_size,
            num_filters,
            stride,
            padding,
            activation,
            &mut rand::rng(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_seed(
        input_height: usize,
        input_width: usize,
        input_depth: usize,
        filter_size: usize,
        num_filters: usize,
        stride: usize,
        padding: usize,
        activation: Option<Activation>,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::init(
            input_height,
            input_width,
            input_depth,
            filter_size,
            num_filters,
            stride,
            padding,
            activation,
            &mut rng,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn init(
        input_height: usize,
        input_width: usize,
        input_depth: usize,
        filter_size: usize,
        num_filters: usize,
        stride: usize,
        padding: usize,
        activation: Option<Activation>,
        rng: &mut impl rand::Rng,
    ) -> Result<Self> {
        if input_height == 0
            || input_width == 0
            || input_depth == 0
            || filter_size == 0
            || num_filters == 0
        {
            return Err(NetworkError::InvalidArgument(
                "convolutional layer dimensions must be nonzero".to_string(),
            ));
        }
        if stride == 0 {
            return Err(NetworkError::InvalidArgument(
                "convolutional stride must be at least 1".to_string(),
            ));
        }
        if filter_size > input_height + 2 * padding || filter_size > input_width + 2 * padding {
            return Err(NetworkError::InvalidArgument(format!(
                "filter size {} does not fit a {}x{} input with padding {}",
                filter_size, input_height, input_width, padding
            )));
        }
        if let Some(act) = &activation {
            if !act.is_elementwise() {
                return Err(NetworkError::InvalidArgument(
                    "softmax cannot be applied across a spatial feature map".to_string(),
                ));
            }
        }

        let span_h = input_height + 2 * padding - filter_size;
        let span_w = input_width + 2 * padding - filter_size;
        let output_height = span_h / stride + 1;
        let output_width = span_w / stride + 1;
        if span_h % stride != 0 || span_w % stride != 0 {
            // the dropped trailing positions may be padding rather than input
            eprintln!(
                "convolution stride {} leaves a partial window: {} row(s) and {} column(s) of the padded input are never visited",
                stride,
                span_h % stride,
                span_w % stride
            );
        }

        let fan_in = filter_size * filter_size * input_depth;
        let fan_out = filter_size * filter_size * num_filters;
        let std_dev = (2.0 / (fan_in + fan_out) as f64).sqrt();
        let kernel_depth = num_filters * input_depth;

        Ok(Self {
            input_height,
            input_width,
            input_depth,
            filter_size,
            num_filters,
            stride,
            padding,
            output_height,
            output_width,
            activation,
            weights: Tensor::gaussian(filter_size, filter_size, kernel_depth, std_dev, rng),
            biases: Tensor::zeros(1, num_filters, 1),
            grad_weights: Tensor::zeros(filter_size, filter_size, kernel_depth),
            grad_biases: Tensor::zeros(1, num_filters, 1),
            cache: None,
        })
    }

    pub fn input_len(&self) -> usize {
        self.input_height * self.input_width * self.input_depth
    }

    pub fn output_len(&self) -> usize {
        self.output_height * self.output_width * self.num_filters
    }

    pub fn output_shape(&self) -> (usize, usize, usize) {
        (self.output_height, self.output_width, self.num_filters)
    }

    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    pub fn biases(&self) -> &Tensor {
        &self.biases
    }

    pub fn grad_weights(&self) -> &Tensor {
        &self.grad_weights
    }

    pub fn grad_biases(&self) -> &Tensor {
        &self.grad_biases
    }

    pub fn set_weights(&mut self, weights: Tensor) -> Result<()> {
        if weights.shape() != self.weights.shape() {
            return Err(NetworkError::ShapeMismatch(format!(
                "convolutional weights are {:?}, got {:?}",
                self.weights.shape(),
                weights.shape()
            )));
        }
        self.weights = weights;
        Ok(())
    }

    pub fn set_biases(&mut self, biases: Tensor) -> Result<()> {
        if biases.shape() != self.biases.shape() {
            return Err(NetworkError::ShapeMismatch(format!(
                "convolutional biases are {:?}, got {:?}",
                self.biases.shape(),
                biases.shape()
            )));
        }
        self.biases = biases;
        Ok(())
    }

    fn in_idx(&self, iy: usize, ix: usize, d: usize) -> usize {
        (iy * self.input_width + ix) * self.input_depth + d
    }

    // kernel layout: axis 2 interleaves filters and input channels as
    // filter * input_depth + channel
    fn w_idx(&self, ky: usize, kx: usize, f: usize, d: usize) -> usize {
        (ky * self.filter_size + kx) * (self.num_filters * self.input_depth)
            + f * self.input_depth
            + d
    }

    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        if input.len() != self.input_len() {
            return Err(NetworkError::ShapeMismatch(format!(
                "convolutional layer expects {}x{}x{} input ({} values), got {}",
                self.input_height,
                self.input_width,
                self.input_depth,
                self.input_len(),
                input.len()
            )));
        }

        let x = input.data();
        let w = self.weights.data();
        let b = self.biases.data();
        let num_filters = self.num_filters;
        let row_len = self.output_width * num_filters;

        let mut out = vec![0.0; self.output_len()];
        out.par_chunks_mut(row_len).enumerate().for_each(|(oy, row)| {
            for ox in 0..self.output_width {
                for f in 0..num_filters {
                    let mut sum = b[f];
                    for ky in 0..self.filter_size {
                        // padded coordinates; taps outside the input read zero
                        let py = oy * self.stride + ky;
                        if py < self.padding || py >= self.input_height + self.padding {
                            continue;
                        }
                        let iy = py - self.padding;
                        for kx in 0..self.filter_size {
                            let px = ox * self.stride + kx;
                            if px < self.padding || px >= self.input_width + self.padding {
                                continue;
                            }
                            let ix = px - self.padding;
                            for d in 0..self.input_depth {
                                sum += x[self.in_idx(iy, ix, d)] * w[self.w_idx(ky, kx, f, d)];
                            }
                        }
                    }
                    row[ox * num_filters + f] = sum;
                }
            }
        });

        if let Some(act) = &self.activation {
            act.apply_slice(&mut out);
        }

        let output = Tensor::from_vec(out, self.output_shape())?;
        self.cache = Some((input.clone(), output.clone()));
        Ok(output)
    }

    pub fn backward(&mut self, upstream: &Tensor) -> Result<Tensor> {
        if upstream.len() != self.output_len() {
            return Err(NetworkError::ShapeMismatch(format!(
                "convolutional backward expects {} gradient values, got {}",
                self.output_len(),
                upstream.len()
            )));
        }

        let (input, output) = self.cache.take().ok_or_else(|| {
            NetworkError::OperationOrder(
                "convolutional backward requires a completed forward pass".to_string(),
            )
        })?;

        let delta = match &self.activation {
            Some(act) => act.backward_slice(output.data(), upstream.data()),
            None => upstream.data().to_vec(),
        };

        let x = input.data();
        let mut dx = vec![0.0; x.len()];

        let (input_height, input_width, input_depth) =
            (self.input_height, self.input_width, self.input_depth);
        let (filter_size, num_filters) = (self.filter_size, self.num_filters);
        let (stride, padding) = (self.stride, self.padding);
        let kernel_depth = num_filters * input_depth;

        // the same kernel weight serves every output position, so its
        // gradient sums contributions from all of them
        let w = self.weights.data();
        let gw = self.grad_weights.data_mut();
        let gb = self.grad_biases.data_mut();

        for oy in 0..self.output_height {
            for ox in 0..self.output_width {
                for f in 0..num_filters {
                    let d_val = delta[(oy * self.output_width + ox) * num_filters + f];
                    gb[f] += d_val;
                    for ky in 0..filter_size {
                        let py = oy * stride + ky;
                        if py < padding || py >= input_height + padding {
                            continue;
                        }
                        let iy = py - padding;
                        for kx in 0..filter_size {
                            let px = ox * stride + kx;
                            if px < padding || px >= input_width + padding {
                                continue;
                            }
                            let ix = px - padding;
                            for d in 0..input_depth {
                                let xi = (iy * input_width + ix) * input_depth + d;
                                let wi = (ky * filter_size + kx) * kernel_depth
                                    + f * input_depth
                                    + d;
                                gw[wi] += x[xi] * d_val;
                                dx[xi] += w[wi] * d_val;
                            }
                        }
                    }
                }
            }
        }

        Tensor::from_vec(dx, input.shape())
    }
}

// pooling layer

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolMode {
    Max,
    Average,
}

#[derive(Clone, Debug)]
pub struct PoolingLayer {
    input_height: usize,
    input_width: usize,
    input_depth: usize,
    pool_size: usize,
    stride: usize,
    mode: PoolMode,
    output_height: usize,
    output_width: usize,
    // received input plus, in max mode, the flat index of each window winner
    cache: Option<(Tensor, Vec<usize>)>,
}

impl PoolingLayer {
    pub fn new(
        input_height: usize,
        input_width: usize,
        input_depth: usize,
        pool_size: usize,
        stride: usize,
        mode: PoolMode,
    ) -> Result<Self> {
        if input_height == 0 || input_width == 0 || input_depth == 0 || pool_size == 0 {
            return Err(NetworkError::InvalidArgument(
                "pooling layer dimensions must be nonzero".to_string(),
            ));
        }
        if stride == 0 {
            return Err(NetworkError::InvalidArgument(
                "pooling stride must be at least 1".to_string(),
            ));
        }
        if pool_size > input_height || pool_size > input_width {
            return Err(NetworkError::InvalidArgument(format!(
                "pool size {} does not fit a {}x{} input",
                pool_size, input_height, input_width
            )));
        }

        let span_h = input_height - pool_size;
        let span_w = input_width - pool_size;
        let output_height = span_h / stride + 1;
        let output_width = span_w / stride + 1;
        if span_h % stride != 0 || span_w % stride != 0 {
            eprintln!(
                "pooling stride {} leaves a partial window: {} row(s) and {} column(s) of input are never visited",
                stride,
                span_h % stride,
                span_w % stride
            );
        }

        Ok(Self {
            input_height,
            input_width,
            input_depth,
            pool_size,
            stride,
            mode,
            output_height,
            output_width,
            cache: None,
        })
    }

    pub fn input_len(&self) -> usize {
        self.input_height * self.input_width * self.input_depth
    }

    pub fn output_len(&self) -> usize {
        self.output_height * self.output_width * self.input_depth
    }

    pub fn output_shape(&self) -> (usize, usize, usize) {
        (self.output_height, self.output_width, self.input_depth)
    }

    pub fn mode(&self) -> PoolMode {
        self.mode
    }

    fn in_idx(&self, iy: usize, ix: usize, d: usize) -> usize {
        (iy * self.input_width + ix) * self.input_depth + d
    }

    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        if input.len() != self.input_len() {
            return Err(NetworkError::ShapeMismatch(format!(
                "pooling layer expects {}x{}x{} input ({} values), got {}",
                self.input_height,
                self.input_width,
                self.input_depth,
                self.input_len(),
                input.len()
            )));
        }

        let x = input.data();
        let window_area = (self.pool_size * self.pool_size) as f64;
        let mut out = vec![0.0; self.output_len()];
        let mut max_indices = Vec::new();
        if self.mode == PoolMode::Max {
            max_indices = vec![0; self.output_len()];
        }

        for oy in 0..self.output_height {
            for ox in 0..self.output_width {
                for d in 0..self.input_depth {
                    let o = (oy * self.output_width + ox) * self.input_depth + d;
                    match self.mode {
                        PoolMode::Max => {
                            let mut best = f64::NEG_INFINITY;
                            let mut best_idx = self.in_idx(oy * self.stride, ox * self.stride, d);
                            for ky in 0..self.pool_size {
                                for kx in 0..self.pool_size {
                                    let idx = self
                                        .in_idx(oy * self.stride + ky, ox * self.stride + kx, d);
                                    if x[idx] > best {
                                        best = x[idx];
                                        best_idx = idx;
                                    }
                                }
                            }
                            out[o] = best;
                            max_indices[o] = best_idx;
                        }
                        PoolMode::Average => {
                            let mut sum = 0.0;
                            for ky in 0..self.pool_size {
                                for kx in 0..self.pool_size {
                                    sum += x[self
                                        .in_idx(oy * self.stride + ky, ox * self.stride + kx, d)];
                                }
                            }
                            out[o] = sum / window_area;
                        }
                    }
                }
            }
        }

        self.cache = Some((input.clone(), max_indices));
        Tensor::from_vec(out, self.output_shape())
    }

    pub fn backward(&mut self, upstream: &Tensor) -> Result<Tensor> {
        if upstream.len() != self.output_len() {
            return Err(NetworkError::ShapeMismatch(format!(
                "pooling backward expects {} gradient values, got {}",
                self.output_len(),
                upstream.len()
            )));
        }

        let (input, max_indices) = self.cache.take().ok_or_else(|| {
            NetworkError::OperationOrder(
                "pooling backward requires a completed forward pass".to_string(),
            )
        })?;

        let up = upstream.data();
        let window_area = (self.pool_size * self.pool_size) as f64;
        let mut dx = vec![0.0; input.len()];

        match self.mode {
            // the full gradient of each cell flows to the input that won;
            // overlapping windows deposit additively
            PoolMode::Max => {
                for (o, &idx) in max_indices.iter().enumerate() {
                    dx[idx] += up[o];
                }
            }
            PoolMode::Average => {
                for oy in 0..self.output_height {
                    for ox in 0..self.output_width {
                        for d in 0..self.input_depth {
                            let share = up[(oy * self.output_width + ox) * self.input_depth + d]
                                / window_area;
                            for ky in 0..self.pool_size {
                                for kx in 0..self.pool_size {
                                    dx[self.in_idx(
                                        oy * self.stride + ky,
                                        ox * self.stride + kx,
                                        d,
                                    )] += share;
                                }
                            }
                        }
                    }
                }
            }
        }

        Tensor::from_vec(dx, input.shape())
    }
}
