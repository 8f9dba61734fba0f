//! Vectorized environment driver
//!
//! Presents `N` independent environment instances as one batched
//! environment. Each instance lives on its own worker thread and is owned
//! by that thread exclusively; the driver talks to every worker over a
//! dedicated request/reply channel pair, so environment dynamics never
//! serialize on the training thread.
//!
//! `step` is a synchronous barrier: it fans one action out per worker, then
//! blocks until every worker has replied, so per-step latency is bounded by
//! the slowest instance. Workers auto-reset a finished environment and hand
//! back the fresh initial observation in place of the terminal one, which
//! keeps every slot of the batch populated on every call while still
//! reporting `done = true` for the terminating step.
//!
//! A worker that errors or dies fails the whole batched call; the barrier
//! never hangs on a missing reply. Dropping the driver shuts down and joins
//! all workers, which covers early exits and error paths.
//!
//! # Example
//!
//! ```no_run
//! use advantage_rl::env::{cartpole::CartPole, vector::ParallelEnv};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut penv = ParallelEnv::new(4, CartPole::new)?;
//! let observations = penv.reset()?;
//!
//! let (next_observations, rewards, dones) = penv.step(&[0, 1, 0, 1])?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};

use crate::env::Environment;

enum Request {
    Reset,
    Step(i64),
}

enum Reply {
    Reset(Vec<f32>),
    Step { observation: Vec<f32>, reward: f32, done: bool },
}

struct Worker {
    request_tx: Option<Sender<Request>>,
    reply_rx: Receiver<Result<Reply>>,
    handle: Option<JoinHandle<()>>,
}

/// A batch of environment instances stepped in lockstep
pub struct ParallelEnv {
    workers: Vec<Worker>,
    closed: bool,
}

impl ParallelEnv {
    /// Spawn `num_envs` worker threads, each constructing and owning one
    /// environment built by `factory`
    pub fn new<E, F>(num_envs: usize, factory: F) -> Result<Self>
    where
        E: Environment<Observation = Vec<f32>, Action = i64> + 'static,
        F: Fn() -> E + Send + Sync + 'static,
    {
        if num_envs == 0 {
            bail!("num_envs must be positive");
        }

        let factory = Arc::new(factory);
        let mut workers = Vec::with_capacity(num_envs);
        for slot in 0..num_envs {
            let factory = Arc::clone(&factory);
            let (request_tx, request_rx) = bounded::<Request>(1);
            let (reply_tx, reply_rx) = bounded::<Result<Reply>>(1);

            let handle = std::thread::Builder::new()
                .name(format!("env-worker-{}", slot))
                .spawn(move || worker_loop(factory, request_rx, reply_tx))
                .with_context(|| format!("failed to spawn environment worker {}", slot))?;

            workers.push(Worker { request_tx: Some(request_tx), reply_rx, handle: Some(handle) });
        }

        Ok(Self { workers, closed: false })
    }

    /// Number of environment instances in the batch
    pub fn num_envs(&self) -> usize {
        self.workers.len()
    }

    /// Reset every instance and return the initial `N × state_dim` batch
    pub fn reset(&mut self) -> Result<Vec<Vec<f32>>> {
        self.ensure_open()?;

        for (slot, worker) in self.workers.iter().enumerate() {
            worker.send(Request::Reset, slot)?;
        }

        let mut observations = Vec::with_capacity(self.workers.len());
        for (slot, worker) in self.workers.iter().enumerate() {
            match worker.recv(slot)? {
                Reply::Reset(observation) => observations.push(observation),
                Reply::Step { .. } => bail!("environment worker {} replied out of order", slot),
            }
        }
        Ok(observations)
    }

    /// Apply action `i` to environment `i` and wait for the whole batch
    ///
    /// Returns `(next_observations, rewards, dones)`. A slot whose episode
    /// just ended reports its true terminal reward with `done = true`, and
    /// its next observation is already the freshly reset one.
    pub fn step(&mut self, actions: &[i64]) -> Result<(Vec<Vec<f32>>, Vec<f32>, Vec<bool>)> {
        self.ensure_open()?;
        if actions.len() != self.workers.len() {
            bail!("got {} actions for {} environments", actions.len(), self.workers.len());
        }

        for (slot, (worker, &action)) in self.workers.iter().zip(actions).enumerate() {
            worker.send(Request::Step(action), slot)?;
        }

        let mut observations = Vec::with_capacity(self.workers.len());
        let mut rewards = Vec::with_capacity(self.workers.len());
        let mut dones = Vec::with_capacity(self.workers.len());
        for (slot, worker) in self.workers.iter().enumerate() {
            match worker.recv(slot)? {
                Reply::Step { observation, reward, done } => {
                    observations.push(observation);
                    rewards.push(reward);
                    dones.push(done);
                }
                Reply::Reset(_) => bail!("environment worker {} replied out of order", slot),
            }
        }
        Ok((observations, rewards, dones))
    }

    /// Shut down and join every worker
    ///
    /// Idempotent. Afterwards `reset` and `step` return errors.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // Dropping a request sender ends that worker's receive loop.
        for worker in &mut self.workers {
            worker.request_tx.take();
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            bail!("environment batch has been closed");
        }
        Ok(())
    }
}

impl Drop for ParallelEnv {
    fn drop(&mut self) {
        self.close();
    }
}

impl Worker {
    fn send(&self, request: Request, slot: usize) -> Result<()> {
        let tx = self
            .request_tx
            .as_ref()
            .ok_or_else(|| anyhow!("environment worker {} already shut down", slot))?;
        tx.send(request)
            .map_err(|_| anyhow!("environment worker {} exited before the request", slot))
    }

    fn recv(&self, slot: usize) -> Result<Reply> {
        match self.reply_rx.recv() {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(e.context(format!("environment {} failed", slot))),
            Err(_) => bail!("environment worker {} died mid-request", slot),
        }
    }
}

fn worker_loop<E, F>(factory: Arc<F>, request_rx: Receiver<Request>, reply_tx: Sender<Result<Reply>>)
where
    E: Environment<Observation = Vec<f32>, Action = i64>,
    F: Fn() -> E,
{
    let mut env = (*factory)();

    while let Ok(request) = request_rx.recv() {
        let reply = match request {
            Request::Reset => env.reset().map(Reply::Reset),
            Request::Step(action) => env.step(action).and_then(|result| {
                let done = result.done();
                let observation = if done { env.reset()? } else { result.observation };
                Ok(Reply::Step { observation, reward: result.reward, done })
            }),
        };

        if reply_tx.send(reply).is_err() {
            // Driver side went away; nothing left to report to.
            break;
        }
    }
}
