//! Per-project outbox lanes for background remote work.
//!
//! Every project identifier gets its own queue drained by a dedicated
//! worker task, so remote operations for one project are strictly ordered
//! while different projects sync concurrently. Transient failures retry
//! with linear backoff up to a bounded attempt count; permanent failures
//! are logged and dropped, leaving local state untouched.

use log::{debug, error};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Notify};

use async_trait::async_trait;

/// A unit of background remote work, addressed by project identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncJob {
    /// Push the project's current local state to the remote store.
    Push { project_id: String },
    /// Best-effort remote delete of an already locally-removed project.
    DeleteRemote { project_id: String },
}

impl SyncJob {
    fn describe(&self) -> String {
        match self {
            SyncJob::Push { project_id } => format!("push {project_id}"),
            SyncJob::DeleteRemote { project_id } => format!("remote delete {project_id}"),
        }
    }
}

/// Job failure classification: transient failures re-enter the retry
/// loop, fatal ones do not.
#[derive(Debug)]
pub enum JobError {
    Transient(anyhow::Error),
    Fatal(anyhow::Error),
}

impl JobError {
    fn inner(&self) -> &anyhow::Error {
        match self {
            JobError::Transient(e) | JobError::Fatal(e) => e,
        }
    }
}

/// Executes jobs on behalf of the outbox. Implemented by the sync core.
///
/// A successful execution may report that the project was re-keyed by
/// identity reconciliation; the worker then moves its lane so subsequent
/// enqueues under the new identifier keep the same ordering guarantee.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn execute(&self, job: &SyncJob) -> Result<Option<Rekey>, JobError>;
}

/// An identifier rewrite performed while executing a job.
#[derive(Clone, Debug)]
pub struct Rekey {
    pub old_id: String,
    pub new_id: String,
}

/// Retry policy for a lane: bounded attempts, linear backoff.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: std::time::Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::constants::SYNC_RETRY_MAX_ATTEMPTS,
            backoff: std::time::Duration::from_millis(crate::constants::SYNC_RETRY_BACKOFF_MS),
        }
    }
}

struct Shared {
    lanes: Mutex<HashMap<String, mpsc::UnboundedSender<SyncJob>>>,
    pending: AtomicUsize,
    drained: Notify,
}

/// The outbox: one worker lane per project identifier.
pub struct Outbox {
    handler: Arc<dyn JobHandler>,
    retry: RetryPolicy,
    shared: Arc<Shared>,
}

impl Outbox {
    pub fn new(handler: Arc<dyn JobHandler>, retry: RetryPolicy) -> Self {
        Self {
            handler,
            retry,
            shared: Arc::new(Shared {
                lanes: Mutex::new(HashMap::new()),
                pending: AtomicUsize::new(0),
                drained: Notify::new(),
            }),
        }
    }

    /// Enqueue a job on the lane for `project_id`, spawning the lane's
    /// worker on first use. Never blocks on the work itself.
    pub async fn enqueue(&self, project_id: &str, job: SyncJob) {
        let sender = {
            let mut lanes = self.shared.lanes.lock().await;
            match lanes.get(project_id) {
                // A lane whose worker exited is replaced.
                Some(sender) if !sender.is_closed() => sender.clone(),
                _ => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    self.spawn_worker(rx);
                    lanes.insert(project_id.to_string(), tx.clone());
                    tx
                }
            }
        };

        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(job).is_err() {
            // Worker died between the check and the send; keep the pending
            // counter honest.
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            self.shared.drained.notify_waiters();
        }
    }

    fn spawn_worker(&self, mut rx: mpsc::UnboundedReceiver<SyncJob>) {
        let handler = Arc::clone(&self.handler);
        let shared = Arc::clone(&self.shared);
        let retry = self.retry;

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let mut attempt = 1u32;
                loop {
                    match handler.execute(&job).await {
                        Ok(rekey) => {
                            if let Some(rekey) = rekey {
                                let mut lanes = shared.lanes.lock().await;
                                if let Some(sender) = lanes.remove(&rekey.old_id) {
                                    lanes.insert(rekey.new_id.clone(), sender);
                                }
                            }
                            break;
                        }
                        Err(JobError::Transient(_)) if attempt < retry.max_attempts => {
                            debug!(
                                "Sync job '{}' failed transiently (attempt {attempt}), retrying",
                                job.describe()
                            );
                            tokio::time::sleep(retry.backoff * attempt).await;
                            attempt += 1;
                        }
                        Err(e) => {
                            error!(
                                "Sync job '{}' failed after {attempt} attempt(s): {}",
                                job.describe(),
                                e.inner()
                            );
                            break;
                        }
                    }
                }
                shared.pending.fetch_sub(1, Ordering::SeqCst);
                shared.drained.notify_waiters();
            }
        });
    }

    /// Number of jobs enqueued but not yet finished.
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Wait until every lane has drained.
    pub async fn flush(&self) {
        loop {
            let notified = self.shared.drained.notified();
            if self.shared.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}
