pub mod error;
pub mod network;

pub use error::{NetworkError, Result};
pub use network::tensor::Tensor;
pub use network::activation::Activation;
pub use network::layer::{
    Layer,
    DenseLayer,
    ConvolutionalLayer,
    PoolingLayer,
    PoolMode,
};
pub use network::loss::Loss;
pub use network::optimizer::{
    Optimizer,
    SGD,
    Adam,
};
pub use network::NeuralNetwork;

pub mod agent;

pub use agent::replaybuffer::{ReplayBuffer, Experience};
