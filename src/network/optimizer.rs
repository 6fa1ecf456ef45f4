use super::layer::{Layer, LayerParams};
use super::tensor::Tensor;

/// Gradient descent rules. An optimizer consumes a layer's accumulated
/// gradients: it steps the parameters and zeroes the gradient buffers.
#[derive(Clone, Debug)]
pub enum Optimizer {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer {
    /// Steps one layer. `layer_index` is the layer's position in its
    /// network and keys any per-layer optimizer state. Layers without
    /// parameters are left untouched.
    pub fn update_layer(&mut self, layer_index: usize, layer: &mut Layer) {
        let Some(params) = layer.params_mut() else {
            return;
        };
        match self {
            Optimizer::SGD(sgd) => sgd.apply(params),
            Optimizer::Adam(adam) => adam.apply(layer_index, params),
        }
    }
}

impl From<SGD> for Optimizer {
    fn from(sgd: SGD) -> Self {
        Optimizer::SGD(sgd)
    }
}

impl From<Adam> for Optimizer {
    fn from(adam: Adam) -> Self {
        Optimizer::Adam(adam)
    }
}

// stochastic gradient descent

#[derive(Clone, Debug)]
pub struct SGD {
    learning_rate: f64,
}

impl SGD {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    fn apply(&self, params: LayerParams<'_>) {
        Self::step_tensor(self.learning_rate, params.weights, params.grad_weights);
        Self::step_tensor(self.learning_rate, params.biases, params.grad_biases);
    }

    fn step_tensor(learning_rate: f64, param: &mut Tensor, grad: &mut Tensor) {
        for (p, g) in param
            .data_mut()
            .iter_mut()
            .zip(grad.data_mut().iter_mut())
        {
            *p -= learning_rate * *g;
            *g = 0.0;
        }
    }
}

// adam

#[derive(Clone, Debug)]
struct AdamState {
    m_weights: Tensor,
    v_weights: Tensor,
    m_biases: Tensor,
    v_biases: Tensor,
    t: usize,
}

#[derive(Clone, Debug)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    decay_rate: f64,
    // moment state per layer position, created on first contact
    states: Vec<Option<AdamState>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            decay_rate: 0.0,
            states: Vec::new(),
        }
    }

    pub fn betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Multiplicative learning rate decay: step t uses lr * (1 - d)^t.
    pub fn decay_rate(mut self, decay_rate: f64) -> Self {
        self.decay_rate = decay_rate;
        self
    }

    fn apply(&mut self, layer_index: usize, params: LayerParams<'_>) {
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let (learning_rate, decay_rate) = (self.learning_rate, self.decay_rate);

        if self.states.len() <= layer_index {
            self.states.resize_with(layer_index + 1, || None);
        }
        let state = self.states[layer_index].get_or_insert_with(|| {
            let (w0, w1, w2) = params.weights.shape();
            let (b0, b1, b2) = params.biases.shape();
            AdamState {
                m_weights: Tensor::zeros(w0, w1, w2),
                v_weights: Tensor::zeros(w0, w1, w2),
                m_biases: Tensor::zeros(b0, b1, b2),
                v_biases: Tensor::zeros(b0, b1, b2),
                t: 0,
            }
        });

        state.t += 1;
        let lr_t = learning_rate * (1.0 - decay_rate).powi(state.t as i32);
        let bias_correction1 = 1.0 - beta1.powi(state.t as i32);
        let bias_correction2 = 1.0 - beta2.powi(state.t as i32);

        step_tensor(
            lr_t,
            beta1,
            beta2,
            epsilon,
            bias_correction1,
            bias_correction2,
            params.weights,
            params.grad_weights,
            &mut state.m_weights,
            &mut state.v_weights,
        );
        step_tensor(
            lr_t,
            beta1,
            beta2,
            epsilon,
            bias_correction1,
            bias_correction2,
            params.biases,
            params.grad_biases,
            &mut state.m_biases,
            &mut state.v_biases,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn step_tensor(
    lr_t: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    bias_correction1: f64,
    bias_correction2: f64,
    param: &mut Tensor,
    grad: &mut Tensor,
    m: &mut Tensor,
    v: &mut Tensor,
) {
    let m = m.data_mut();
    let v = v.data_mut();
    for (i, (p, g)) in param
        .data_mut()
        .iter_mut()
        .zip(grad.data_mut().iter_mut())
        .enumerate()
    {
        m[i] = beta1 * m[i] + (1.0 - beta1) * *g;
        v[i] = beta2 * v[i] + (1.0 - beta2) * *g * *g;
        let m_hat = m[i] / bias_correction1;
        let v_hat = v[i] / bias_correction2;
        *p -= lr_t * m_hat / (v_hat.sqrt() + epsilon);
        *g = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::layer::{DenseLayer, PoolMode, PoolingLayer};

    fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
        assert!((a - b).abs() < tolerance, "mismatch: {} vs {}", a, b);
    }

    // 1x1 dense layer with a known weight and an accumulated gradient
    fn dense_with_grad(weight: f64, grad: f64) -> Layer {
        let mut dense = DenseLayer::with_seed(1, 1, None, 0).unwrap();
        dense
            .set_weights(Tensor::from_vec(vec![weight], (1, 1, 1)).unwrap())
            .unwrap();
        let mut layer: Layer = dense.into();

        let input = Tensor::from_vec(vec![1.0], (1, 1, 1)).unwrap();
        layer.forward(&input).unwrap();
        let upstream = Tensor::from_vec(vec![grad], (1, 1, 1)).unwrap();
        layer.backward(&upstream).unwrap();
        layer
    }

    fn weight_of(layer: &Layer) -> f64 {
        layer.weights().unwrap().data()[0]
    }

    #[test]
    fn test_sgd_steps_and_zeroes() {
        let mut layer = dense_with_grad(1.0, 4.0);
        let mut optimizer: Optimizer = SGD::new(0.1).into();

        optimizer.update_layer(0, &mut layer);

        assert_approx_eq(weight_of(&layer), 1.0 - 0.1 * 4.0, 1e-12);
        assert_approx_eq(layer.biases().unwrap().data()[0], -0.4, 1e-12);
        assert_eq!(layer.grad_weights().unwrap().data()[0], 0.0);
        assert_eq!(layer.grad_biases().unwrap().data()[0], 0.0);
    }

    #[test]
    fn test_sgd_skips_parameterless_layers() {
        let mut layer: Layer = PoolingLayer::new(2, 2, 1, 2, 2, PoolMode::Max)
            .unwrap()
            .into();
        let mut optimizer: Optimizer = SGD::new(0.1).into();
        optimizer.update_layer(0, &mut layer);
    }

    #[test]
    fn test_adam_first_step_magnitude_is_learning_rate() {
        // after bias correction, m_hat / sqrt(v_hat) is 1 on the first step
        // whatever the gradient's scale
        for grad in [10.0, 0.1] {
            let mut layer = dense_with_grad(1.0, grad);
            let mut optimizer: Optimizer = Adam::new(0.01).into();

            optimizer.update_layer(0, &mut layer);

            let step = 1.0 - weight_of(&layer);
            assert_approx_eq(step, 0.01, 1e-6);
        }
    }

    #[test]
    fn test_adam_zeroes_gradients() {
        let mut layer = dense_with_grad(1.0, 5.0);
        let mut optimizer: Optimizer = Adam::new(0.01).into();

        optimizer.update_layer(0, &mut layer);

        assert_eq!(layer.grad_weights().unwrap().data()[0], 0.0);
        assert_eq!(layer.grad_biases().unwrap().data()[0], 0.0);
    }

    #[test]
    fn test_adam_decay_shrinks_steps() {
        let mut layer = dense_with_grad(1.0, 3.0);
        let mut optimizer: Optimizer = Adam::new(0.01).decay_rate(0.5).into();

        optimizer.update_layer(0, &mut layer);

        // first step uses lr * (1 - 0.5)^1
        let step = 1.0 - weight_of(&layer);
        assert_approx_eq(step, 0.005, 1e-6);
    }

    #[test]
    fn test_adam_keeps_state_per_layer_index() {
        let mut first = dense_with_grad(1.0, 2.0);
        let mut fourth = dense_with_grad(1.0, 8.0);
        let mut optimizer: Optimizer = Adam::new(0.01).into();

        // sparse indices get independent, lazily created state
        optimizer.update_layer(0, &mut first);
        optimizer.update_layer(3, &mut fourth);

        assert_approx_eq(1.0 - weight_of(&first), 0.01, 1e-6);
        assert_approx_eq(1.0 - weight_of(&fourth), 0.01, 1e-6);
    }

    #[test]
    fn test_adam_consecutive_steps_advance_timestep() {
        let mut layer = dense_with_grad(1.0, 2.0);
        let mut optimizer: Optimizer = Adam::new(0.01).into();
        optimizer.update_layer(0, &mut layer);
        let after_first = weight_of(&layer);

        // accumulate a fresh gradient and step again from the same state
        let input = Tensor::from_vec(vec![1.0], (1, 1, 1)).unwrap();
        layer.forward(&input).unwrap();
        let upstream = Tensor::from_vec(vec![2.0], (1, 1, 1)).unwrap();
        layer.backward(&upstream).unwrap();
        optimizer.update_layer(0, &mut layer);

        let second_step = after_first - weight_of(&layer);
        assert!(second_step > 0.0);
        assert!(second_step < 0.02);
    }

    #[test]
    fn test_adam_builder_overrides() {
        // beta1 = 0 makes the first moment the raw gradient; the step is
        // still lr on the first update
        let mut layer = dense_with_grad(1.0, 6.0);
        let mut optimizer: Optimizer = Adam::new(0.02).betas(0.0, 0.999).epsilon(1e-10).into();

        optimizer.update_layer(0, &mut layer);
        assert_approx_eq(1.0 - weight_of(&layer), 0.02, 1e-6);
    }
}
