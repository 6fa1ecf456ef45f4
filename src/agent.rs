pub mod replaybuffer;

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::{NetworkError, Result};
use crate::network::{
    NeuralNetwork, activation::Activation, layer::DenseLayer, loss::Loss, optimizer::SGD,
    tensor::Tensor,
};
use replaybuffer::{Experience, ReplayBuffer};

const HIDDEN_SIZE: usize = 64;
const BUFFER_CAPACITY: usize = 10000;

/// An epsilon-greedy learner built on two networks: a policy network
/// scoring each action and a value network estimating the worth of a
/// state. It consumes only the engine's public training API; environments
/// live with the caller, which drives the select / observe / learn cycle.
pub struct Agent {
    policy: NeuralNetwork,
    value: NeuralNetwork,
    replay_buffer: ReplayBuffer,
    rng: StdRng,

    action_count: usize,
    batch_size: usize,
    discount_factor: f64,
    epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
}

impl Agent {
    pub fn new(state_size: usize, action_count: usize) -> Result<Self> {
        Self::with_seed(state_size, action_count, rand::rng().random())
    }

    pub fn with_seed(state_size: usize, action_count: usize, seed: u64) -> Result<Self> {
        if state_size == 0 || action_count == 0 {
            return Err(NetworkError::InvalidArgument(format!(
                "agent needs nonzero state and action sizes, got {} and {}",
                state_size, action_count
            )));
        }

        let mut master = StdRng::seed_from_u64(seed);
        let policy = Self::build_network(state_size, action_count, master.random())?;
        let value = Self::build_network(state_size, 1, master.random())?;

        Ok(Self {
            policy,
            value,
            replay_buffer: ReplayBuffer::new(BUFFER_CAPACITY),
            rng: StdRng::seed_from_u64(master.random()),
            action_count,
            batch_size: 32,
            discount_factor: 0.99,
            epsilon: 1.0,
            epsilon_decay: 0.995,
            min_epsilon: 0.01,
        })
    }

    fn build_network(input_size: usize, output_size: usize, seed: u64) -> Result<NeuralNetwork> {
        let mut network = NeuralNetwork::with_seed(Loss::MeanSquaredError, SGD::new(0.001), seed);
        network.add_layer(DenseLayer::with_seed(
            input_size,
            HIDDEN_SIZE,
            Some(Activation::relu()),
            seed,
        )?)?;
        network.add_layer(DenseLayer::with_seed(
            HIDDEN_SIZE,
            output_size,
            None,
            seed.wrapping_add(1),
        )?)?;
        Ok(network)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn experience_count(&self) -> usize {
        self.replay_buffer.len()
    }

    /// Epsilon-greedy: explore with a random action, otherwise exploit the
    /// policy network's best score.
    pub fn select_action(&mut self, state: &Tensor) -> Result<usize> {
        if self.rng.random::<f64>() < self.epsilon {
            Ok(self.rng.random_range(0..self.action_count))
        } else {
            self.greedy_action(state)
        }
    }

    /// The policy network's highest scored action, no exploration.
    pub fn greedy_action(&mut self, state: &Tensor) -> Result<usize> {
        let scores = self.policy.forward(state)?;
        Ok(argmax(scores.data()))
    }

    /// Records a transition for later replay.
    pub fn observe(
        &mut self,
        state: Tensor,
        action: usize,
        reward: f64,
        next_state: Tensor,
        done: bool,
    ) -> Result<()> {
        if action >= self.action_count {
            return Err(NetworkError::InvalidArgument(format!(
                "action {} is out of range for {} actions",
                action, self.action_count
            )));
        }
        self.replay_buffer.push(Experience {
            state,
            action,
            reward,
            next_state,
            done,
        });
        Ok(())
    }

    /// Replays one sampled batch: the value network learns bootstrap
    /// targets r + gamma * value(next), and the policy network learns its
    /// own scores with the taken action's slot replaced by that target.
    /// Does nothing until the buffer holds a full batch.
    pub fn learn(&mut self) -> Result<()> {
        let Some(batch) = self.replay_buffer.sample(self.batch_size, &mut self.rng) else {
            return Ok(());
        };

        let mut states = Vec::with_capacity(batch.len());
        let mut value_targets = Vec::with_capacity(batch.len());
        let mut policy_targets = Vec::with_capacity(batch.len());

        for experience in &batch {
            let bootstrap = if experience.done {
                0.0
            } else {
                self.value.forward(&experience.next_state)?.data()[0]
            };
            let target = experience.reward + self.discount_factor * bootstrap;

            value_targets.push(Tensor::from_vec(vec![target], (1, 1, 1))?);

            let mut scores = self.policy.forward(&experience.state)?;
            scores.set(0, experience.action, 0, target)?;
            policy_targets.push(scores);

            states.push(experience.state.clone());
        }

        self.value.train_batch(&states, &value_targets)?;
        self.policy.train_batch(&states, &policy_targets)?;

        if self.epsilon > self.min_epsilon {
            self.epsilon *= self.epsilon_decay;
        }
        Ok(())
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(values: &[f64]) -> Tensor {
        Tensor::from_vec(values.to_vec(), (1, values.len(), 1)).unwrap()
    }

    #[test]
    fn test_new_validates_sizes() {
        assert!(matches!(
            Agent::with_seed(0, 2, 1),
            Err(NetworkError::InvalidArgument(_))
        ));
        assert!(matches!(
            Agent::with_seed(4, 0, 1),
            Err(NetworkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_greedy_action_is_deterministic_under_seed() {
        let mut first = Agent::with_seed(4, 3, 9).unwrap();
        let mut second = Agent::with_seed(4, 3, 9).unwrap();
        let s = state(&[0.1, -0.2, 0.3, 0.4]);

        let a = first.greedy_action(&s).unwrap();
        let b = second.greedy_action(&s).unwrap();
        assert_eq!(a, b);
        assert!(a < 3);
    }

    #[test]
    fn test_select_action_stays_in_range_while_exploring() {
        // epsilon starts at 1.0, so every selection is exploratory
        let mut agent = Agent::with_seed(2, 4, 5).unwrap();
        let s = state(&[0.0, 1.0]);
        for _ in 0..20 {
            assert!(agent.select_action(&s).unwrap() < 4);
        }
    }

    #[test]
    fn test_observe_validates_action() {
        let mut agent = Agent::with_seed(2, 2, 5).unwrap();
        let result = agent.observe(state(&[0.0, 0.0]), 2, 1.0, state(&[0.0, 0.0]), false);
        assert!(matches!(result, Err(NetworkError::InvalidArgument(_))));
        assert_eq!(agent.experience_count(), 0);
    }

    #[test]
    fn test_learn_waits_for_a_full_batch() {
        let mut agent = Agent::with_seed(2, 2, 5).unwrap();
        for i in 0..3 {
            agent
                .observe(state(&[i as f64, 0.0]), 0, 1.0, state(&[i as f64 + 1.0, 0.0]), false)
                .unwrap();
        }

        agent.learn().unwrap();
        // no training happened, so epsilon has not decayed
        assert_eq!(agent.epsilon(), 1.0);
    }

    #[test]
    fn test_learn_trains_and_decays_epsilon() {
        let mut agent = Agent::with_seed(2, 2, 5).unwrap();
        for i in 0..40 {
            let done = i % 10 == 9;
            agent
                .observe(
                    state(&[i as f64 / 40.0, 0.5]),
                    i % 2,
                    if done { 1.0 } else { -0.1 },
                    state(&[(i + 1) as f64 / 40.0, 0.5]),
                    done,
                )
                .unwrap();
        }

        agent.learn().unwrap();
        assert!(agent.epsilon() < 1.0);
        assert_eq!(agent.experience_count(), 40);
    }
}
