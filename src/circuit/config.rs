use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::CircuitError;
use crate::encryption::{DEFAULT_TWEAK_SIZE, MultiKeyEncryptionScheme};

/// How the gates of one level are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parallelism {
    /// Gates one after another in topological order.
    #[default]
    Sequential,
    /// All gates of a level on a rayon pool, joined before the next level.
    /// `None` uses one thread per logical CPU.
    Levels { threads: Option<usize> },
}

/// Shared by garbler, evaluator and verifier of the same circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub parallelism: Parallelism,
    /// Tweak width in bytes; must equal the scheme's.
    pub tweak_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallelism: Parallelism::Sequential,
            tweak_size: DEFAULT_TWEAK_SIZE,
        }
    }
}

impl Config {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn levels(threads: Option<usize>) -> Self {
        Self {
            parallelism: Parallelism::Levels { threads },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tweak_size(mut self, tweak_size: usize) -> Self {
        self.tweak_size = tweak_size;
        self
    }

    pub(crate) fn check_scheme<E: MultiKeyEncryptionScheme>(
        &self,
        scheme: &E,
    ) -> Result<(), CircuitError> {
        if self.tweak_size != scheme.tweak_size() {
            return Err(CircuitError::TweakSizeMismatch {
                configured: self.tweak_size,
                scheme: scheme.tweak_size(),
            });
        }
        Ok(())
    }

    pub(crate) fn executor(&self) -> Result<Executor, CircuitError> {
        match self.parallelism {
            Parallelism::Sequential => Ok(Executor::Sequential),
            Parallelism::Levels { threads: Some(0) } => Err(CircuitError::ZeroThreads),
            Parallelism::Levels { threads } => {
                let mut builder = ThreadPoolBuilder::new()
                    .thread_name(|i| format!("garbled-gates-{i}"));
                if let Some(n) = threads {
                    builder = builder.num_threads(n);
                }
                let pool = builder
                    .build()
                    .map_err(|err| CircuitError::ThreadPool(err.to_string()))?;
                debug!(threads = pool.current_num_threads(), "level thread pool ready");
                Ok(Executor::Pool(pool))
            }
        }
    }
}

/// Runs the gates of one level.
#[derive(Debug)]
pub(crate) enum Executor {
    Sequential,
    Pool(ThreadPool),
}

impl Executor {
    /// Apply `f` to every item of one level, results in item order.
    pub(crate) fn map_level<I, T, E, F>(&self, items: &[I], f: F) -> Result<Vec<T>, E>
    where
        I: Sync,
        T: Send,
        E: Send,
        F: Fn(&I) -> Result<T, E> + Sync + Send,
    {
        match self {
            Executor::Sequential => items.iter().map(f).collect(),
            Executor::Pool(pool) => pool.install(|| items.par_iter().map(f).collect()),
        }
    }
}
