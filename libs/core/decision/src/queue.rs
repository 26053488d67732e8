//! C8: an insertion-ordered in-flight task registry. A plain `Vec` behind a
//! reader-writer lock is sufficient — reads are always a full enumeration.

use capfox_domain_models::PendingTask;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct PendingQueue {
    tasks: RwLock<Vec<PendingTask>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self { tasks: RwLock::new(Vec::new()) }
    }

    pub async fn add(&self, task: PendingTask) {
        self.tasks.write().await.push(task);
    }

    /// Removes the first task matching `task_name`. No error if absent.
    pub async fn remove_by_name(&self, task_name: &str) -> Option<PendingTask> {
        let mut tasks = self.tasks.write().await;
        let position = tasks.iter().position(|t| t.task_name == task_name)?;
        Some(tasks.remove(position))
    }

    pub async fn snapshot(&self) -> Vec<PendingTask> {
        self.tasks.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capfox_domain_models::SystemState;
    use chrono::Utc;

    fn task(name: &str) -> PendingTask {
        PendingTask {
            id: format!("{name}_1"),
            task_name: name.to_string(),
            complexity: 1,
            started_at: Utc::now(),
            baseline_state: SystemState::empty(),
            predicted_impact: None,
        }
    }

    #[tokio::test]
    async fn remove_by_name_removes_first_match_only() {
        let queue = PendingQueue::new();
        queue.add(task("encode")).await;
        queue.add(task("encode")).await;
        let removed = queue.remove_by_name("encode").await;
        assert!(removed.is_some());
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn remove_absent_task_is_a_no_op() {
        let queue = PendingQueue::new();
        assert!(queue.remove_by_name("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn snapshot_is_independent_of_subsequent_mutation() {
        let queue = PendingQueue::new();
        queue.add(task("a")).await;
        let snapshot = queue.snapshot().await;
        queue.add(task("b")).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(queue.len().await, 2);
    }
}
