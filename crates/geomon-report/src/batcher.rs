// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debounced task coalescing.
//!
//! A [`Batcher`] holds at most one pending task. Submitting a new task
//! while one is waiting out its delay supersedes the waiting task, so a
//! burst of submissions collapses into a single execution of the most
//! recent one after the configured delay. Supersession only covers the
//! delay window: a task that has already started executing always runs
//! to completion.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

pub struct Batcher {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Batcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedules `task` to run after the delay. Each submission bumps the
    /// generation; a task re-checks it after its sleep and yields to any
    /// later submission. That check is the last cancellation point: once a
    /// task passes it, nothing aborts it mid-execution.
    pub fn submit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if latest.load(Ordering::SeqCst) != generation {
                debug!("pending task superseded during its delay window");
                return;
            }
            task.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn burst_of_submissions_runs_only_the_last_task() {
        let batcher = Batcher::new(Duration::from_millis(100));
        let executed = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5u32 {
            let executed = Arc::clone(&executed);
            batcher.submit(async move {
                executed.lock().await.push(i);
            });
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*executed.lock().await, vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_submissions_run_exactly_one_task() {
        let batcher = Arc::new(Batcher::new(Duration::from_millis(50)));
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let batcher = Arc::clone(&batcher);
            let runs = Arc::clone(&runs);
            handles.push(tokio::spawn(async move {
                batcher.submit(async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                });
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn task_runs_after_the_configured_delay() {
        let batcher = Batcher::new(Duration::from_millis(100));
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        batcher.submit(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn executing_task_survives_a_later_submission() {
        let batcher = Batcher::new(Duration::from_millis(20));
        let completed = Arc::new(Mutex::new(Vec::new()));

        // First task takes 300ms once it starts executing.
        let log = Arc::clone(&completed);
        batcher.submit(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            log.lock().await.push("slow");
        });

        // Let the first task pass its delay and start executing, then
        // submit another.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let log = Arc::clone(&completed);
        batcher.submit(async move {
            log.lock().await.push("late");
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        let completed = completed.lock().await;
        assert!(completed.contains(&"slow"), "in-flight task must complete");
        assert!(completed.contains(&"late"));
    }
}
