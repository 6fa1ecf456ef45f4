use rand::Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

use crate::error::{NetworkError, Result};

/// Dense rank-3 buffer of f64 values, row-major with axis 0 outermost.
/// Cloning copies the data; two tensors never alias.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    shape: (usize, usize, usize),
    data: Vec<f64>,
}

impl Tensor {
    pub fn zeros(d0: usize, d1: usize, d2: usize) -> Self {
        Self {
            shape: (d0, d1, d2),
            data: vec![0.0; d0 * d1 * d2],
        }
    }

    pub fn from_vec(data: Vec<f64>, shape: (usize, usize, usize)) -> Result<Self> {
        let expected = shape.0 * shape.1 * shape.2;
        if data.len() != expected {
            return Err(NetworkError::ShapeMismatch(format!(
                "{} values cannot fill shape {:?} ({} slots)",
                data.len(),
                shape,
                expected
            )));
        }
        Ok(Self { shape, data })
    }

    /// Zero-mean normal samples, used for weight initialization.
    pub fn gaussian(d0: usize, d1: usize, d2: usize, std_dev: f64, rng: &mut impl Rng) -> Self {
        let normal = Normal::new(0.0, std_dev).unwrap();
        let data = (0..d0 * d1 * d2).map(|_| normal.sample(rng)).collect();
        Self {
            shape: (d0, d1, d2),
            data,
        }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.shape.1 + j) * self.shape.2 + k
    }

    fn check_bounds(&self, i: usize, j: usize, k: usize) -> Result<()> {
        let (d0, d1, d2) = self.shape;
        if i >= d0 || j >= d1 || k >= d2 {
            return Err(NetworkError::InvalidArgument(format!(
                "index ({}, {}, {}) out of bounds for shape {:?}",
                i, j, k, self.shape
            )));
        }
        Ok(())
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> Result<f64> {
        self.check_bounds(i, j, k)?;
        Ok(self.data[self.index(i, j, k)])
    }

    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) -> Result<()> {
        self.check_bounds(i, j, k)?;
        let idx = self.index(i, j, k);
        self.data[idx] = value;
        Ok(())
    }

    fn check_same_shape(&self, other: &Tensor, op: &str) -> Result<()> {
        if self.shape != other.shape {
            return Err(NetworkError::ShapeMismatch(format!(
                "elementwise {} requires equal shapes, got {:?} and {:?}",
                op, self.shape, other.shape
            )));
        }
        Ok(())
    }

    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        self.check_same_shape(other, "add")?;
        let data = self
            .data
            .par_iter()
            .zip(other.data.par_iter())
            .map(|(&a, &b)| a + b)
            .collect();
        Ok(Self {
            shape: self.shape,
            data,
        })
    }

    pub fn mul(&self, other: &Tensor) -> Result<Tensor> {
        self.check_same_shape(other, "mul")?;
        let data = self
            .data
            .par_iter()
            .zip(other.data.par_iter())
            .map(|(&a, &b)| a * b)
            .collect();
        Ok(Self {
            shape: self.shape,
            data,
        })
    }

    pub fn scale(&self, factor: f64) -> Tensor {
        let data = self.data.par_iter().map(|&x| x * factor).collect();
        Self {
            shape: self.shape,
            data,
        }
    }

    /// Swaps the first two axes into a freshly allocated buffer.
    pub fn transpose(&self) -> Tensor {
        let (d0, d1, d2) = self.shape;
        let mut data = vec![0.0; self.data.len()];
        for i in 0..d0 {
            for j in 0..d1 {
                for k in 0..d2 {
                    data[(j * d0 + i) * d2 + k] = self.data[(i * d1 + j) * d2 + k];
                }
            }
        }
        Self {
            shape: (d1, d0, d2),
            data,
        }
    }

    /// Reinterprets the buffer under a new shape with the same element count.
    pub fn reshape(&self, shape: (usize, usize, usize)) -> Result<Tensor> {
        let expected = shape.0 * shape.1 * shape.2;
        if self.data.len() != expected {
            return Err(NetworkError::ShapeMismatch(format!(
                "cannot reshape {:?} ({} values) into {:?} ({} slots)",
                self.shape,
                self.data.len(),
                shape,
                expected
            )));
        }
        Ok(Self {
            shape,
            data: self.data.clone(),
        })
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.sum() / self.data.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assert_vec_approx_eq(a: &[f64], b: &[f64]) {
        let tolerance = 1e-9;
        assert_eq!(a.len(), b.len(), "vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < tolerance, "mismatch at index {}: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(2, 3, 1);
        assert_eq!(t.shape(), (2, 3, 1));
        assert_eq!(t.data(), vec![0.0; 6]);
    }

    #[test]
    fn test_from_vec() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (3, 2, 1)).unwrap();
        assert_eq!(t.data(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_from_vec_wrong_len() {
        let result = Tensor::from_vec(vec![1.0, 2.0, 3.0], (2, 2, 1));
        assert!(matches!(result, Err(NetworkError::ShapeMismatch(_))));
    }

    #[test]
    fn test_gaussian_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let t = Tensor::gaussian(4, 3, 2, 1.0, &mut rng);
        assert_eq!(t.len(), 24);
        assert!(t.data().iter().any(|&x| x != 0.0));
    }

    #[test]
    fn test_get_set() {
        let mut t = Tensor::zeros(2, 2, 2);
        t.set(1, 0, 1, 5.5).unwrap();
        assert_eq!(t.get(1, 0, 1).unwrap(), 5.5);
        assert_eq!(t.get(0, 0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let t = Tensor::zeros(2, 2, 2);
        assert!(matches!(t.get(2, 0, 0), Err(NetworkError::InvalidArgument(_))));
        assert!(matches!(t.get(0, 2, 0), Err(NetworkError::InvalidArgument(_))));
        assert!(matches!(t.get(0, 0, 2), Err(NetworkError::InvalidArgument(_))));
    }

    #[test]
    fn test_add_matches_indexwise_loop() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3, 1)).unwrap();
        let b = Tensor::from_vec(vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0], (2, 3, 1)).unwrap();
        let c = a.add(&b).unwrap();

        for i in 0..2 {
            for j in 0..3 {
                let expected = a.get(i, j, 0).unwrap() + b.get(i, j, 0).unwrap();
                assert_eq!(c.get(i, j, 0).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_add_shape_mismatch() {
        let a = Tensor::zeros(2, 3, 1);
        let b = Tensor::zeros(3, 2, 1);
        assert!(matches!(a.add(&b), Err(NetworkError::ShapeMismatch(_))));
    }

    #[test]
    fn test_mul_elementwise() {
        let a = Tensor::from_vec(vec![1.0, 2.0, -3.0], (1, 3, 1)).unwrap();
        let b = Tensor::from_vec(vec![4.0, 5.0, 6.0], (1, 3, 1)).unwrap();
        let c = a.mul(&b).unwrap();
        assert_vec_approx_eq(c.data(), &[4.0, 10.0, -18.0]);
    }

    #[test]
    fn test_scale() {
        let t = Tensor::from_vec(vec![1.0, -2.0, 3.0], (1, 3, 1)).unwrap();
        let s = t.scale(2.0);
        assert_vec_approx_eq(s.data(), &[2.0, -4.0, 6.0]);
    }

    #[test]
    fn test_transpose_values() {
        // [[1, 2, 3], [4, 5, 6]] -> [[1, 4], [2, 5], [3, 6]]
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3, 1)).unwrap();
        let tt = t.transpose();

        assert_eq!(tt.shape(), (3, 2, 1));
        assert_vec_approx_eq(tt.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_transpose_is_independent_copy() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], (2, 2, 1)).unwrap();
        let mut tt = t.transpose();
        tt.set(0, 0, 0, 99.0).unwrap();
        assert_eq!(t.get(0, 0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_clone_is_deep() {
        let t = Tensor::from_vec(vec![1.0, 2.0], (1, 2, 1)).unwrap();
        let mut c = t.clone();
        c.set(0, 0, 0, 42.0).unwrap();
        assert_eq!(t.get(0, 0, 0).unwrap(), 1.0);
        assert_eq!(c.get(0, 0, 0).unwrap(), 42.0);
    }

    #[test]
    fn test_reshape_preserves_row_major_order() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3, 1)).unwrap();
        let flat = t.reshape((6, 1, 1)).unwrap();
        assert_vec_approx_eq(flat.data(), t.data());

        let back = flat.reshape((2, 3, 1)).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_reshape_wrong_count() {
        let t = Tensor::zeros(2, 3, 1);
        assert!(matches!(t.reshape((4, 1, 1)), Err(NetworkError::ShapeMismatch(_))));
    }

    #[test]
    fn test_sum_and_mean() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], (2, 2, 1)).unwrap();
        assert_eq!(t.sum(), 10.0);
        assert_eq!(t.mean(), 2.5);
    }

    #[test]
    fn test_mean_empty() {
        let t = Tensor::zeros(0, 3, 1);
        assert_eq!(t.mean(), 0.0);
    }
}
