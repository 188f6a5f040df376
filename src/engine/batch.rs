//! Per-persona fan-out with bounded concurrency and isolated failures.
//!
//! [`run_batch`] spawns one task per persona on a [`JoinSet`]; each task
//! waits on a [`Semaphore`] permit before doing any work, so at most `limit`
//! personas are in flight. Results are collected in completion order. A task
//! that fails or panics is logged with its persona id and contributes no
//! record; the batch itself never fails.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::persona::PersonaProfile;

/// A persona whose task did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Persona identifier.
    pub persona_id: String,
    /// Rendered error.
    pub error: String,
}

/// Everything a batch produced.
#[derive(Debug, Clone)]
pub struct BatchOutcome<R> {
    /// Successful records, in completion order.
    pub records: Vec<R>,
    /// Failed personas, in completion order.
    pub failures: Vec<TaskFailure>,
}

impl<R> BatchOutcome<R> {
    fn with_capacity(n: usize) -> Self {
        Self {
            records: Vec::with_capacity(n),
            failures: Vec::new(),
        }
    }

    /// Number of personas attempted.
    pub fn attempted(&self) -> usize {
        self.records.len().saturating_add(self.failures.len())
    }

    fn absorb(&mut self, persona_id: String, result: Result<R, String>) {
        match result {
            Ok(record) => self.records.push(record),
            Err(error) => {
                warn!(persona_id = %persona_id, error = %error, "persona task failed");
                self.failures.push(TaskFailure { persona_id, error });
            }
        }
    }
}

/// Run `task` once per persona with at most `limit` tasks in flight.
///
/// A `limit` of zero is treated as one.
pub async fn run_batch<R, E, F, Fut>(
    personas: Vec<PersonaProfile>,
    limit: usize,
    task: F,
) -> BatchOutcome<R>
where
    R: Send + 'static,
    E: Display + Send + 'static,
    F: Fn(PersonaProfile) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let total = personas.len();
    let gate = Arc::new(Semaphore::new(limit.max(1)));
    let task = Arc::new(task);
    let mut set = JoinSet::new();

    for persona in personas {
        let gate = Arc::clone(&gate);
        let task = Arc::clone(&task);
        set.spawn(async move {
            let persona_id = persona.id.clone();
            let result = match gate.acquire_owned().await {
                // The inner spawn turns a panic into a JoinError that still
                // knows which persona it belonged to.
                Ok(_permit) => match tokio::spawn(task(persona)).await {
                    Ok(Ok(record)) => Ok(record),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(join_err) => Err(format!("persona task aborted: {join_err}")),
                },
                Err(_) => Err("admission gate closed".to_owned()),
            };
            (persona_id, result)
        });
    }

    let mut outcome = BatchOutcome::with_capacity(total);
    let mut completed: usize = 0;
    while let Some(joined) = set.join_next().await {
        completed = completed.saturating_add(1);
        match joined {
            Ok((persona_id, result)) => outcome.absorb(persona_id, result),
            Err(join_err) => error!(error = %join_err, "batch worker aborted"),
        }
        info!(completed, total, "persona finished");
    }

    outcome
}

/// Run `task` once per persona, strictly one at a time and in input order.
pub async fn run_sequential<R, E, F, Fut>(personas: Vec<PersonaProfile>, task: F) -> BatchOutcome<R>
where
    E: Display,
    F: Fn(PersonaProfile) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let total = personas.len();
    let mut outcome = BatchOutcome::with_capacity(total);

    for (index, persona) in personas.into_iter().enumerate() {
        let persona_id = persona.id.clone();
        let result = task(persona).await.map_err(|e| e.to_string());
        outcome.absorb(persona_id, result);
        info!(completed = index.saturating_add(1), total, "persona finished");
    }

    outcome
}
