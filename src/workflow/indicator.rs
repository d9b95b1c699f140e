use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Cosmetic "in progress" ticker cycling through a ring of text frames.
///
/// At most one tick task exists at a time. `start` while running and `stop`
/// while stopped are both no-ops.
#[derive(Debug)]
pub struct LoadingIndicator {
    runtime: Handle,
    interval: Duration,
    frames: Arc<[String]>,
    position: Arc<AtomicUsize>,
    task: Option<JoinHandle<()>>,
}

impl LoadingIndicator {
    pub fn new(runtime: Handle, interval: Duration, frames: Vec<String>) -> Self {
        let frames: Arc<[String]> = if frames.is_empty() {
            Arc::from(vec!["Loading".to_string()])
        } else {
            Arc::from(frames)
        };

        Self {
            runtime,
            interval,
            frames,
            position: Arc::new(AtomicUsize::new(0)),
            task: None,
        }
    }

    /// Returns `false` if a tick was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }

        self.position.store(0, Ordering::Relaxed);

        let position = Arc::clone(&self.position);
        let len = self.frames.len();
        let interval = self.interval;
        self.task = Some(self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let next = (position.load(Ordering::Relaxed) + 1) % len;
                position.store(next, Ordering::Relaxed);
            }
        }));
        true
    }

    /// Returns `false` if nothing was running.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn frame(&self) -> &str {
        &self.frames[self.position.load(Ordering::Relaxed) % self.frames.len()]
    }
}

impl Drop for LoadingIndicator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(400);

    fn indicator() -> LoadingIndicator {
        LoadingIndicator::new(
            Handle::current(),
            TICK,
            ["Loading", "Loading.", "Loading..", "Loading..."]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn advances_one_frame_per_interval_and_wraps() {
        let mut ind = indicator();
        assert!(ind.start());
        assert_eq!(ind.frame(), "Loading");

        tokio::time::sleep(TICK * 3 + TICK / 2).await;
        assert_eq!(ind.frame(), "Loading...");

        tokio::time::sleep(TICK).await;
        assert_eq!(ind.frame(), "Loading");
        ind.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_keeps_a_single_tick() {
        let mut ind = indicator();
        assert!(ind.start());
        assert!(!ind.start());

        // Two tickers would have moved two frames here.
        tokio::time::sleep(TICK + TICK / 2).await;
        assert_eq!(ind.frame(), "Loading.");
        ind.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_freezes_the_frame() {
        let mut ind = indicator();
        assert!(!ind.stop());

        ind.start();
        tokio::time::sleep(TICK + TICK / 2).await;
        assert!(ind.stop());
        assert!(!ind.stop());
        assert!(!ind.is_running());

        let frozen = ind.frame().to_string();
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(ind.frame(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_begins_at_first_frame() {
        let mut ind = indicator();
        ind.start();
        tokio::time::sleep(TICK * 2 + TICK / 2).await;
        ind.stop();
        assert_eq!(ind.frame(), "Loading..");

        ind.start();
        assert_eq!(ind.frame(), "Loading");
        ind.stop();
    }
}
