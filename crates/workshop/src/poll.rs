//! Drives pending service calls to completion.

use std::time::Duration;

use moduploader_protocol::ResultCode;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::WorkshopError;
use crate::service::{Pending, WorkshopService};
use crate::types::Phase;

/// How a pending call is waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between two pumps of the callback queue.
    pub interval: Duration,
    /// Ceiling for a single call. `None` waits until the service answers.
    pub timeout: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: moduploader_protocol::constants::DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Pumps `service` until `pending` resolves.
///
/// `on_tick` runs after every pump that did not complete the call. The outer
/// `Result` carries local failures (cancel, timeout, dropped call), the inner
/// one the service's answer.
pub(crate) async fn wait_for<T>(
    service: &dyn WorkshopService,
    mut pending: Pending<T>,
    settings: &PollSettings,
    phase: Phase,
    cancel: &CancellationToken,
    mut on_tick: impl FnMut(),
) -> Result<Result<T, ResultCode>, WorkshopError> {
    let deadline = settings.timeout.map(|t| Instant::now() + t);

    loop {
        if cancel.is_cancelled() {
            return Err(WorkshopError::Cancelled { phase });
        }

        service.run_callbacks();

        match pending.try_recv() {
            Ok(result) => return Ok(result),
            Err(TryRecvError::Closed) => return Err(WorkshopError::Disconnected { phase }),
            Err(TryRecvError::Empty) => {}
        }

        on_tick();

        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            return Err(WorkshopError::Timeout {
                phase,
                after: settings.timeout.unwrap_or_default(),
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(WorkshopError::Cancelled { phase }),
            _ = tokio::time::sleep(settings.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::service::{pending, ready};
    use crate::testing::FakeService;

    #[tokio::test(start_paused = true)]
    async fn resolved_call_returns_without_ticking() {
        let service = FakeService::new();
        let ticks = Cell::new(0);
        let result = wait_for(
            &service,
            ready(Ok(7u32)),
            &PollSettings::default(),
            Phase::Create,
            &CancellationToken::new(),
            || ticks.set(ticks.get() + 1),
        )
        .await
        .unwrap();
        assert_eq!(result, Ok(7));
        assert_eq!(ticks.get(), 0);
        assert_eq!(service.pumps(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sender_is_disconnected() {
        let service = FakeService::new();
        let (tx, rx) = pending::<u32>();
        drop(tx);
        let err = wait_for(
            &service,
            rx,
            &PollSettings::default(),
            Phase::Upload,
            &CancellationToken::new(),
            || {},
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkshopError::Disconnected { phase: Phase::Upload }));
    }

    #[tokio::test(start_paused = true)]
    async fn never_answered_call_times_out() {
        let service = FakeService::new();
        let (_tx, rx) = pending::<u32>();
        let settings = PollSettings {
            interval: Duration::from_millis(50),
            timeout: Some(Duration::from_secs(1)),
        };
        let err = wait_for(
            &service,
            rx,
            &settings,
            Phase::Create,
            &CancellationToken::new(),
            || {},
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            WorkshopError::Timeout { phase: Phase::Create, after } if after == Duration::from_secs(1)
        ));
        assert!(service.pumps() >= 20);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_stops_polling() {
        let service = FakeService::new();
        let (_tx, rx) = pending::<u32>();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = wait_for(
            &service,
            rx,
            &PollSettings::default(),
            Phase::Upload,
            &cancel,
            || {},
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkshopError::Cancelled { phase: Phase::Upload }));
        assert_eq!(service.pumps(), 0);
    }
}
