use neurite::agent::Agent;
use neurite::{Result, Tensor};

const CORRIDOR_LEN: usize = 9;
const MAX_STEPS: usize = 60;

/// A one-dimensional walk. The agent starts in the middle of the corridor
/// with a pit at the left end and a goal at the right end. Each step it
/// moves one cell left or right until it reaches an end or runs out of
/// steps.
struct Corridor {
    position: usize,
    steps: usize,
}

impl Corridor {
    fn new() -> Self {
        Self {
            position: CORRIDOR_LEN / 2,
            steps: 0,
        }
    }

    fn reset(&mut self) -> Result<Tensor> {
        self.position = CORRIDOR_LEN / 2;
        self.steps = 0;
        self.state()
    }

    /// One-hot encoding of the current cell.
    fn state(&self) -> Result<Tensor> {
        let mut cells = vec![0.0; CORRIDOR_LEN];
        cells[self.position] = 1.0;
        Tensor::from_vec(cells, (1, CORRIDOR_LEN, 1))
    }

    /// Applies an action (0 = left, 1 = right) and returns
    /// (reward, next_state, done).
    fn step(&mut self, action: usize) -> Result<(f64, Tensor, bool)> {
        self.steps += 1;
        if action == 0 {
            self.position = self.position.saturating_sub(1);
        } else {
            self.position = (self.position + 1).min(CORRIDOR_LEN - 1);
        }

        let (reward, done) = if self.position == CORRIDOR_LEN - 1 {
            (1.0, true)
        } else if self.position == 0 {
            (-1.0, true)
        } else {
            (-0.01, self.steps >= MAX_STEPS)
        };

        Ok((reward, self.state()?, done))
    }
}

fn main() -> Result<()> {
    println!("initializing corridor walk and RL agent...");

    let mut env = Corridor::new();
    let mut agent = Agent::new(CORRIDOR_LEN, 2)?;

    let num_episodes = 100;
    println!("starting training for {} episodes...", num_episodes);

    for episode in 0..num_episodes {
        let mut state = env.reset()?;
        let mut total_reward = 0.0;
        let mut done = false;

        while !done {
            let action = agent.select_action(&state)?;
            let (reward, next_state, d) = env.step(action)?;
            done = d;
            total_reward += reward;
            agent.observe(state, action, reward, next_state.clone(), done)?;
            state = next_state;

            agent.learn()?;
        }

        println!(
            "Episode: {}, Total Reward: {}, Epsilon: {:.4}",
            episode + 1,
            total_reward,
            agent.epsilon()
        );
    }

    println!("\ntraining finished.");

    Ok(())
}
