/// Slope applied to negative inputs by the leaky ReLU.
const LEAKY_SLOPE: f64 = 0.01;

/// Activations whose derivative depends only on the single output value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Elementwise {
    Identity,
    Sigmoid,
    Tanh,
    Relu,
    LeakyRelu,
    Elu,
}

impl Elementwise {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Elementwise::Identity => x,
            Elementwise::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Elementwise::Tanh => x.tanh(),
            Elementwise::Relu => x.max(0.0),
            Elementwise::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_SLOPE * x
                }
            }
            Elementwise::Elu => {
                if x > 0.0 {
                    x
                } else {
                    x.exp() - 1.0
                }
            }
        }
    }

    /// Derivative expressed in terms of the forward output y, so layers can
    /// backpropagate from their cached output without recomputing the
    /// pre-activation.
    pub fn derivative(&self, y: f64) -> f64 {
        match self {
            Elementwise::Identity => 1.0,
            Elementwise::Sigmoid => y * (1.0 - y),
            Elementwise::Tanh => 1.0 - y * y,
            Elementwise::Relu => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Elementwise::LeakyRelu => {
                if y > 0.0 {
                    1.0
                } else {
                    LEAKY_SLOPE
                }
            }
            Elementwise::Elu => {
                if y > 0.0 {
                    1.0
                } else {
                    y + 1.0
                }
            }
        }
    }
}

/// An activation attached to a layer output. Elementwise variants map each
/// value independently; Softmax normalizes the whole output vector and
/// backpropagates through its full Jacobian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Elementwise(Elementwise),
    Softmax,
}

impl Activation {
    pub fn identity() -> Self {
        Activation::Elementwise(Elementwise::Identity)
    }

    pub fn sigmoid() -> Self {
        Activation::Elementwise(Elementwise::Sigmoid)
    }

    pub fn tanh() -> Self {
        Activation::Elementwise(Elementwise::Tanh)
    }

    pub fn relu() -> Self {
        Activation::Elementwise(Elementwise::Relu)
    }

    pub fn leaky_relu() -> Self {
        Activation::Elementwise(Elementwise::LeakyRelu)
    }

    pub fn elu() -> Self {
        Activation::Elementwise(Elementwise::Elu)
    }

    pub fn softmax() -> Self {
        Activation::Softmax
    }

    pub fn is_elementwise(&self) -> bool {
        matches!(self, Activation::Elementwise(_))
    }

    /// Applies the activation in place over a layer's pre-activation values.
    pub fn apply_slice(&self, values: &mut [f64]) {
        match self {
            Activation::Elementwise(f) => {
                for v in values.iter_mut() {
                    *v = f.apply(*v);
                }
            }
            Activation::Softmax => {
                let max_val = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                let mut sum = 0.0;
                for v in values.iter_mut() {
                    *v = (*v - max_val).exp();
                    sum += *v;
                }
                for v in values.iter_mut() {
                    *v /= sum;
                }
            }
        }
    }

    /// Converts an upstream gradient dL/dy into dL/dz given the forward
    /// output y. Softmax applies dz_i = y_i * (g_i - sum_j g_j * y_j).
    pub fn backward_slice(&self, output: &[f64], upstream: &[f64]) -> Vec<f64> {
        match self {
            Activation::Elementwise(f) => output
                .iter()
                .zip(upstream.iter())
                .map(|(&y, &g)| g * f.derivative(y))
                .collect(),
            Activation::Softmax => {
                let dot: f64 = upstream
                    .iter()
                    .zip(output.iter())
                    .map(|(&g, &y)| g * y)
                    .sum();
                output
                    .iter()
                    .zip(upstream.iter())
                    .map(|(&y, &g)| y * (g - dot))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
    }

    fn assert_vec_approx_eq(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len(), "vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < 1e-9, "mismatch at index {}: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn test_identity() {
        assert_approx_eq(Elementwise::Identity.apply(-3.5), -3.5);
        assert_approx_eq(Elementwise::Identity.derivative(-3.5), 1.0);
    }

    #[test]
    fn test_sigmoid() {
        assert_approx_eq(Elementwise::Sigmoid.apply(0.0), 0.5);
        let y = Elementwise::Sigmoid.apply(1.0);
        assert_approx_eq(y, 0.7310585786300049);
        // derivative at the output: y * (1 - y)
        assert_approx_eq(Elementwise::Sigmoid.derivative(y), 0.19661193324148185);
    }

    #[test]
    fn test_tanh() {
        let y = Elementwise::Tanh.apply(0.5);
        assert_approx_eq(y, 0.46211715726000974);
        assert_approx_eq(Elementwise::Tanh.derivative(y), 0.7864477329659274);
    }

    #[test]
    fn test_relu() {
        assert_approx_eq(Elementwise::Relu.apply(-2.0), 0.0);
        assert_approx_eq(Elementwise::Relu.apply(3.0), 3.0);
        assert_approx_eq(Elementwise::Relu.derivative(3.0), 1.0);
        assert_approx_eq(Elementwise::Relu.derivative(0.0), 0.0);
    }

    #[test]
    fn test_leaky_relu() {
        assert_approx_eq(Elementwise::LeakyRelu.apply(-2.0), -0.02);
        assert_approx_eq(Elementwise::LeakyRelu.apply(3.0), 3.0);
        assert_approx_eq(Elementwise::LeakyRelu.derivative(3.0), 1.0);
        assert_approx_eq(Elementwise::LeakyRelu.derivative(-0.02), 0.01);
    }

    #[test]
    fn test_elu() {
        let y = Elementwise::Elu.apply(-1.0);
        assert_approx_eq(y, -0.6321205588285577);
        // for negative outputs the slope is y + 1 = e^x
        assert_approx_eq(Elementwise::Elu.derivative(y), 0.36787944117144233);
        assert_approx_eq(Elementwise::Elu.apply(2.0), 2.0);
        assert_approx_eq(Elementwise::Elu.derivative(2.0), 1.0);
    }

    #[test]
    fn test_softmax_forward() {
        let mut values = vec![0.0, 1.0, 2.0];
        Activation::softmax().apply_slice(&mut values);

        // e^0/sum, e^1/sum, e^2/sum with sum = e^0 + e^1 + e^2
        let expected = vec![
            0.09003057317038046,
            0.24472847105479764,
            0.6652409557748219,
        ];
        assert_vec_approx_eq(&values, &expected);

        let sum: f64 = values.iter().sum();
        assert_approx_eq(sum, 1.0);
    }

    #[test]
    fn test_softmax_large_inputs_stay_finite() {
        let mut values = vec![1000.0, 1001.0, 999.0];
        Activation::softmax().apply_slice(&mut values);

        assert!(values.iter().all(|v| v.is_finite()));
        let sum: f64 = values.iter().sum();
        assert_approx_eq(sum, 1.0);
    }

    #[test]
    fn test_softmax_backward_constant_upstream_is_zero() {
        // a constant upstream gradient cancels through the Jacobian
        let mut output = vec![3.0, 1.0, -1.0, 0.5];
        Activation::softmax().apply_slice(&mut output);
        let grad = Activation::softmax().backward_slice(&output, &[2.0, 2.0, 2.0, 2.0]);
        assert_vec_approx_eq(&grad, &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_softmax_backward_jacobian() {
        let mut output = vec![1.0, 2.0];
        Activation::softmax().apply_slice(&mut output);
        let (y0, y1) = (output[0], output[1]);

        let grad = Activation::softmax().backward_slice(&output, &[1.0, 0.0]);
        // dz_0 = y0 * (1 - y0), dz_1 = y1 * (0 - y0)
        assert_approx_eq(grad[0], y0 * (1.0 - y0));
        assert_approx_eq(grad[1], -y1 * y0);
    }

    #[test]
    fn test_elementwise_backward_slice() {
        let output = vec![0.5, 0.0, 2.0];
        let grad = Activation::relu().backward_slice(&output, &[1.0, 1.0, 3.0]);
        assert_vec_approx_eq(&grad, &[1.0, 0.0, 3.0]);
    }
}
