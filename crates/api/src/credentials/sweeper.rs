//! Periodic eviction of dead credentials.
//!
//! Expiry is enforced at verify/resend time whether or not this has run.
//! The sweeper only bounds memory held by abandoned signups.

use std::{sync::Arc, time::Duration};

use tokio::{sync::oneshot, task::JoinHandle, time::MissedTickBehavior};

use super::service::CredentialService;

/// Shortest period a sweeper runs at; tokio intervals panic on zero.
pub const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

pub struct Sweeper;

impl Sweeper {
    /// Start sweeping both stores every `period`. The first sweep runs one
    /// full period after start. Periods below [`MIN_SWEEP_PERIOD`] are
    /// raised to it.
    pub fn spawn(service: Arc<CredentialService>, period: Duration) -> SweeperHandle {
        let period = period.max(MIN_SWEEP_PERIOD);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match service.sweep().await {
                            Ok(report) => tracing::debug!(
                                tokens = report.tokens,
                                codes = report.codes,
                                removed = report.total(),
                                "credential sweep finished"
                            ),
                            Err(e) => tracing::error!(error = %e, "credential sweep failed"),
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }

            tracing::info!("credential sweeper stopped");
        });

        tracing::info!(period_secs = period.as_secs(), "credential sweeper started");

        SweeperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Owned handle to a running sweeper. Dropping it without calling
/// `shutdown` also stops the task, since the shutdown channel closes.
pub struct SweeperHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());

        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "credential sweeper task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialKind, ExpiryPolicy, ManualClock};
    use crate::stores::Stores;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn evicts_expired_credentials_on_schedule() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = Arc::new(
            CredentialService::new(Stores::in_memory(), ExpiryPolicy::default())
                .with_clock(clock.clone()),
        );
        for i in 0..10 {
            service
                .issue(&format!("user{}@x.com", i), CredentialKind::Code, json!({}))
                .await
                .unwrap();
        }
        clock.advance(chrono::Duration::minutes(11));

        let handle = Sweeper::spawn(service.clone(), Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(service.sizes().await.unwrap().codes, 10);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(service.sizes().await.unwrap().codes, 0);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn leaves_live_credentials_alone() {
        let service = Arc::new(CredentialService::new(
            Stores::in_memory(),
            ExpiryPolicy::default(),
        ));
        service
            .issue("a@x.com", CredentialKind::Token, json!({}))
            .await
            .unwrap();

        let handle = Sweeper::spawn(service.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(service.sizes().await.unwrap().tokens, 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_is_raised_to_the_minimum() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = Arc::new(
            CredentialService::new(Stores::in_memory(), ExpiryPolicy::default())
                .with_clock(clock.clone()),
        );
        service
            .issue("a@x.com", CredentialKind::Code, json!({}))
            .await
            .unwrap();
        clock.advance(chrono::Duration::minutes(11));

        let handle = Sweeper::spawn(service.clone(), Duration::ZERO);
        tokio::time::sleep(MIN_SWEEP_PERIOD + Duration::from_millis(10)).await;

        assert_eq!(service.sizes().await.unwrap().codes, 0);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_the_task() {
        let service = Arc::new(CredentialService::new(
            Stores::in_memory(),
            ExpiryPolicy::default(),
        ));

        let handle = Sweeper::spawn(service, Duration::from_secs(3600));

        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .expect("sweeper did not stop");
    }
}
