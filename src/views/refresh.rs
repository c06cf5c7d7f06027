//! # Auto-refresco de listados
//!
//! Tarea periódica que emite un aviso por canal cada `interval`. La vista
//! que la posee recarga al recibirlo. La tarea se cancela con `stop()`, al
//! soltar el [`AutoRefresh`] o cuando el receptor se cierra.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct AutoRefresh {
    token: CancellationToken,
    handle: JoinHandle<()>,
    interval: Duration,
}

impl AutoRefresh {
    /// Inicia el temporizador; el primer aviso llega tras un intervalo completo
    ///
    /// Los avisos no se acumulan: si la vista aún no consume el anterior, el
    /// nuevo se descarta.
    pub fn start(interval: Duration) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        tracing::debug!("Auto-refresh cancelled");
                        return;
                    }
                    _ = ticker.tick() => {
                        match tx.try_send(()) {
                            Ok(()) | Err(TrySendError::Full(())) => {}
                            Err(TrySendError::Closed(())) => {
                                tracing::debug!("Auto-refresh receiver dropped, stopping");
                                return;
                            }
                        }
                    }
                }
            }
        });

        tracing::debug!(interval_secs = interval.as_secs(), "Auto-refresh started");
        (
            Self {
                token,
                handle,
                interval,
            },
            rx,
        )
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test(start_paused = true)]
    async fn emits_ticks_at_interval() {
        let (refresh, mut rx) = AutoRefresh::start(Duration::from_secs(30));
        assert_err!(rx.try_recv());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(rx.recv().await.is_some());
        assert!(refresh.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_closes_the_channel() {
        let (refresh, mut rx) = AutoRefresh::start(Duration::from_secs(5));
        refresh.stop();
        assert!(rx.recv().await.is_none());
        assert!(!refresh.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_the_task() {
        let (refresh, mut rx) = AutoRefresh::start(Duration::from_secs(5));
        drop(refresh);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unconsumed_ticks_do_not_pile_up() {
        let (_refresh, mut rx) = AutoRefresh::start(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_ok!(rx.try_recv());
        assert_err!(rx.try_recv());
    }
}
