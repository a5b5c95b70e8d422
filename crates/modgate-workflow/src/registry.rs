//! In-memory execution registry.
//!
//! Running executions are always kept. Finished ones are archived up to a
//! retention limit, evicting the oldest finished entry first.

use std::collections::{HashMap, VecDeque};

use tokio::sync::{Notify, RwLock};

use crate::execution::{ExecutionId, ExecutionStatus, WorkflowExecution};

#[derive(Default)]
struct RegistryInner {
    executions: HashMap<ExecutionId, WorkflowExecution>,
    finished: VecDeque<ExecutionId>,
}

pub struct ExecutionRegistry {
    inner: RwLock<RegistryInner>,
    retention: usize,
    finished_notify: Notify,
}

impl ExecutionRegistry {
    pub fn new(retention: usize) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            retention,
            finished_notify: Notify::new(),
        }
    }

    pub async fn insert(&self, execution: WorkflowExecution) {
        let mut inner = self.inner.write().await;
        inner
            .executions
            .insert(execution.execution_id.clone(), execution);
    }

    /// Apply `f` to a running execution. Terminal executions are left untouched.
    pub async fn update<F>(&self, id: &ExecutionId, f: F)
    where
        F: FnOnce(&mut WorkflowExecution),
    {
        let mut inner = self.inner.write().await;
        if let Some(execution) = inner.executions.get_mut(id) {
            if !execution.status.is_terminal() {
                f(execution);
            }
        }
    }

    /// Apply the terminal update `f` once and archive the execution.
    pub async fn finish<F>(&self, id: &ExecutionId, f: F)
    where
        F: FnOnce(&mut WorkflowExecution),
    {
        {
            let mut inner = self.inner.write().await;
            let Some(execution) = inner.executions.get_mut(id) else {
                return;
            };
            if execution.status.is_terminal() {
                return;
            }
            f(execution);
            inner.finished.push_back(id.clone());
            self.evict(&mut inner);
        }
        self.finished_notify.notify_waiters();
    }

    /// Fail every running execution with `error` and return their ids.
    pub async fn fail_running(&self, error: &str) -> Vec<ExecutionId> {
        let failed: Vec<ExecutionId> = {
            let mut inner = self.inner.write().await;
            let ids: Vec<ExecutionId> = inner
                .executions
                .values()
                .filter(|e| !e.status.is_terminal())
                .map(|e| e.execution_id.clone())
                .collect();
            for id in &ids {
                if let Some(execution) = inner.executions.get_mut(id) {
                    execution.fail(ExecutionStatus::Failed, error.to_string());
                }
                inner.finished.push_back(id.clone());
            }
            self.evict(&mut inner);
            ids
        };
        if !failed.is_empty() {
            self.finished_notify.notify_waiters();
        }
        failed
    }

    fn evict(&self, inner: &mut RegistryInner) {
        while inner.finished.len() > self.retention {
            if let Some(evicted) = inner.finished.pop_front() {
                inner.executions.remove(&evicted);
            }
        }
    }

    pub async fn get(&self, id: &ExecutionId) -> Option<WorkflowExecution> {
        self.inner.read().await.executions.get(id).cloned()
    }

    pub async fn running_count(&self) -> usize {
        self.inner
            .read()
            .await
            .executions
            .values()
            .filter(|e| !e.status.is_terminal())
            .count()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.executions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Wait until the execution is terminal. `None` if it is unknown or was evicted.
    pub async fn wait_finished(&self, id: &ExecutionId) -> Option<WorkflowExecution> {
        loop {
            let notified = self.finished_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.get(id).await {
                Some(execution) if execution.status.is_terminal() => return Some(execution),
                Some(_) => {}
                None => return None,
            }
            notified.await;
        }
    }

    /// Wait until no execution is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.finished_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.running_count().await == 0 {
                return;
            }
            notified.await;
        }
    }
}
