//! Off-task execution of simulations.
//!
//! A simulation is CPU-bound and runs to completion once started, so the
//! worker hands it to tokio's blocking pool and the caller's task only awaits
//! the join handle. Requests share no state: each gets its own generator.

use super::{
    SimulationLimits, SimulationRequest, SimulationResult, VarError, compute_var_with_limits,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;

/// Multiplier spreading consecutive request numbers across the seed space.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Errors returned by [`VarWorker::submit`]
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The computation never produced a value (panicked or cancelled)
    #[error("Computation failed: {0}")]
    Transport(String),

    /// The engine rejected the request
    #[error(transparent)]
    Engine(#[from] VarError),
}

/// Runs [`SimulationRequest`]s on the blocking thread pool.
///
/// With a base seed, the n-th submitted request is seeded from the base seed
/// and n, so a sequence of submissions is reproducible. Without one every
/// request draws its seed from the operating system.
#[derive(Debug, Default)]
pub struct VarWorker {
    seed: Option<u64>,
    submitted: AtomicU64,
    limits: SimulationLimits,
}

impl VarWorker {
    /// Create a worker with an optional base seed.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Replace the default resource limits.
    pub const fn with_limits(mut self, limits: SimulationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The limits every request is validated against
    pub const fn limits(&self) -> &SimulationLimits {
        &self.limits
    }

    /// Compute one request off the calling task.
    pub async fn submit(
        &self,
        request: SimulationRequest,
    ) -> Result<SimulationResult, WorkerError> {
        let n = self.submitted.fetch_add(1, Ordering::Relaxed);
        let mut rng = match self.seed {
            Some(base) => StdRng::seed_from_u64(base.wrapping_add(n.wrapping_mul(SEED_STRIDE))),
            None => StdRng::from_entropy(),
        };
        let limits = self.limits;

        debug!(request = n, method = %request.method, "submitting simulation");
        let result = tokio::task::spawn_blocking(move || {
            compute_var_with_limits(&request, &limits, &mut rng)
        })
        .await
        .map_err(|e| WorkerError::Transport(e.to_string()))?;

        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimulationMethod;

    fn request(method: SimulationMethod) -> SimulationRequest {
        let returns = vec![0.01, -0.012, 0.004, 0.02, -0.018, 0.007, -0.003, 0.011];
        SimulationRequest::new(returns, 0.95, 5, 2_000, method, true)
    }

    #[tokio::test]
    async fn test_submit_returns_result() {
        let worker = VarWorker::new(Some(42));
        let result = worker.submit(request(SimulationMethod::Normal)).await.unwrap();
        assert!(result.var > 0.0);
        assert_eq!(result.mu, Some(0.0));
    }

    #[tokio::test]
    async fn test_seeded_workers_reproduce_sequences() {
        let a = VarWorker::new(Some(7));
        let b = VarWorker::new(Some(7));

        let a1 = a.submit(request(SimulationMethod::Bootstrap)).await.unwrap();
        let a2 = a.submit(request(SimulationMethod::Bootstrap)).await.unwrap();
        let b1 = b.submit(request(SimulationMethod::Bootstrap)).await.unwrap();
        let b2 = b.submit(request(SimulationMethod::Bootstrap)).await.unwrap();

        assert_eq!(a1, b1);
        assert_eq!(a2, b2);
    }

    #[tokio::test]
    async fn test_engine_errors_are_not_transport_errors() {
        let worker = VarWorker::new(None);
        let err = worker
            .submit(request(SimulationMethod::StudentT))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Engine(VarError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_limits_apply_to_submissions() {
        let worker = VarWorker::new(Some(1)).with_limits(SimulationLimits {
            max_simulations: 10,
            ..SimulationLimits::default()
        });
        assert!(worker.submit(request(SimulationMethod::Normal)).await.is_err());
    }
}
