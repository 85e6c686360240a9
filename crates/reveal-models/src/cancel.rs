//! Cooperative cancellation helpers.
//!
//! Every awaited leaf operation is raced against the attempt's
//! [`CancellationToken`]. When the token wins, the caller receives
//! [`Aborted`] instead of a business error, so cancellation can never be
//! mistaken for a failure.

use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Marker returned when an operation was abandoned because its token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Operation aborted")]
pub struct Aborted;

/// Run `future` until it completes or `token` is cancelled.
///
/// An already-cancelled token aborts without polling the future.
pub async fn run_until_cancelled<F, T>(token: &CancellationToken, future: F) -> Result<T, Aborted>
where
    F: Future<Output = T>,
{
    if token.is_cancelled() {
        return Err(Aborted);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Aborted),
        output = future => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_completes_when_not_cancelled() {
        let token = CancellationToken::new();
        let result = run_until_cancelled(&token, async { 7 }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_skips_future() {
        let token = CancellationToken::new();
        token.cancel();
        let polled = std::sync::atomic::AtomicBool::new(false);
        let result = run_until_cancelled(&token, async {
            polled.store(true, std::sync::atomic::Ordering::SeqCst);
        })
        .await;
        assert_eq!(result, Err(Aborted));
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_future() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });

        let result = run_until_cancelled(&token, std::future::pending::<()>()).await;
        assert_eq!(result, Err(Aborted));
    }
}
