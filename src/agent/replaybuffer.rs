use std::collections::VecDeque;

use crate::network::tensor::Tensor;

/// One observed transition.
#[derive(Clone, Debug)]
pub struct Experience {
    pub state: Tensor,
    pub action: usize,
    pub reward: f64,
    pub next_state: Tensor,
    pub done: bool,
}

/// Bounded FIFO store of past transitions. Pushing at capacity evicts the
/// oldest entry.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Experience>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, experience: Experience) {
        self.buffer.push_back(experience);
        if self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.buffer.iter()
    }

    /// Draws `batch_size` distinct experiences at random, or None if the
    /// buffer does not hold that many yet.
    pub fn sample(&self, batch_size: usize, rng: &mut impl rand::Rng) -> Option<Vec<Experience>> {
        if self.buffer.len() < batch_size {
            return None;
        }

        let indices = rand::seq::index::sample(rng, self.buffer.len(), batch_size);
        Some(
            indices
                .iter()
                .filter_map(|index| self.buffer.get(index).cloned())
                .collect(),
        )
    }
}
