//! Fire-and-forget rule runs
//!
//! The run itself is blocking store I/O, so it goes to the blocking pool; a
//! supervising task logs how it ended.

use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{ExecuteRequest, ExecutionSummary, RuleExecutor};
use crate::error::Error;
use crate::store::LedgerStore;

impl<S: LedgerStore + 'static> RuleExecutor<S> {
    /// Start a run in the background
    ///
    /// Must be called from within a tokio runtime. The handle resolves to the
    /// summary, or `None` if the run failed; callers are free to drop it.
    pub fn spawn_execute_rules(
        &self,
        user_id: i64,
        request: ExecuteRequest,
    ) -> JoinHandle<Option<ExecutionSummary>> {
        let executor = self.clone();

        tokio::spawn(async move {
            let outcome =
                tokio::task::spawn_blocking(move || executor.execute_rules(user_id, &request))
                    .await
                    .map_err(|e| Error::Task(e.to_string()))
                    .and_then(|result| result);

            match outcome {
                Ok(summary) => {
                    info!(
                        "Background rule run for user {} finished: {} of {} transactions modified",
                        user_id,
                        summary.modified.len(),
                        summary.processed_txns
                    );
                    Some(summary)
                }
                Err(e) => {
                    error!("Background rule run for user {} failed: {}", user_id, e);
                    None
                }
            }
        })
    }
}
