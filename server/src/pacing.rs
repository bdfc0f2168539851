//! Waiting out the remainder of a send interval
//!
//! Coarse timers can be tens of milliseconds late on some platforms, which is
//! far too coarse for a 1 kHz stream. The busy-poll strategy instead yields to
//! the scheduler and re-checks the clock until the deadline passes. Both
//! strategies yield, so other connections keep making progress.

use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitStrategy {
    /// Sleep on the runtime timer until the deadline
    Sleep,
    /// Yield repeatedly and re-check the clock
    #[default]
    BusyPoll,
}

impl std::str::FromStr for WaitStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sleep" => Ok(WaitStrategy::Sleep),
            "busy-poll" | "busy_poll" | "busy" => Ok(WaitStrategy::BusyPoll),
            _ => anyhow::bail!("Invalid wait strategy: {}", s),
        }
    }
}

impl WaitStrategy {
    /// Return once `deadline` has passed.
    pub async fn wait_until(self, deadline: Instant) {
        match self {
            WaitStrategy::Sleep => {
                tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
            }
            WaitStrategy::BusyPoll => loop {
                tokio::task::yield_now().await;
                if Instant::now() >= deadline {
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_wait_strategy_from_str() {
        assert_eq!("sleep".parse::<WaitStrategy>().unwrap(), WaitStrategy::Sleep);
        assert_eq!(
            "busy-poll".parse::<WaitStrategy>().unwrap(),
            WaitStrategy::BusyPoll
        );
        assert!("spin".parse::<WaitStrategy>().is_err());
    }

    #[tokio::test]
    async fn test_both_strategies_reach_deadline() {
        for strategy in [WaitStrategy::Sleep, WaitStrategy::BusyPoll] {
            let start = Instant::now();
            strategy.wait_until(start + Duration::from_millis(5)).await;
            assert!(start.elapsed() >= Duration::from_millis(5), "{:?}", strategy);
        }
    }

    #[tokio::test]
    async fn test_past_deadline_returns_promptly() {
        let start = Instant::now();
        WaitStrategy::BusyPoll.wait_until(start).await;
        WaitStrategy::Sleep.wait_until(start).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_busy_poll_lets_other_tasks_run() {
        // Single-threaded runtime: the spawned task only runs if the wait yields.
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let _handle = tokio::spawn(async move {
            flag.store(true, Ordering::SeqCst);
        });

        WaitStrategy::BusyPoll
            .wait_until(Instant::now() + Duration::from_millis(10))
            .await;
        assert!(ran.load(Ordering::SeqCst));
    }
}
