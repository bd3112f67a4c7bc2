#![cfg(feature = "tokio-runtime")]

use crashmap::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Async helpers around the controller, run on a Tokio runtime
#[cfg(test)]
mod settle_timer_tests {
    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let source = Arc::clone(&fired);
        (fired, move || Arc::clone(&source))
    }

    /// The callback fires once the settle delay has elapsed
    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (fired, handle) = counter();
        let mut timer = SettleTimer::new(Duration::from_millis(500));

        let count = handle();
        timer.schedule(move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending());
    }

    /// A burst of gestures yields a single settled callback
    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_debounces() {
        let (fired, handle) = counter();
        let mut timer = SettleTimer::new(Duration::from_millis(500));

        for _ in 0..5 {
            let count = handle();
            timer.schedule(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    /// Cancelling or dropping the timer discards the pending callback
    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop() {
        let (fired, handle) = counter();

        let mut cancelled = SettleTimer::new(Duration::from_millis(300));
        let count = handle();
        cancelled.schedule(move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        cancelled.cancel();
        assert!(!cancelled.is_pending());

        {
            let mut dropped = SettleTimer::new(Duration::from_millis(300));
            let count = handle();
            dropped.schedule(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    fn shared_view(size: Point, retry: RetryConfig) -> SharedMapView<HeadlessSurface> {
        let config = MapViewConfig {
            retry,
            ..MapViewConfig::default()
        };
        let controller = MapViewController::new(
            HeadlessSurface::new(size),
            config,
            Arc::new(SystemClock),
        )
        .unwrap();
        SharedMapView::new(controller)
    }

    /// A widget with a size attaches on the first try
    #[tokio::test]
    async fn test_init_with_retry_attaches() {
        let view = shared_view(Point::new(640.0, 480.0), RetryConfig::default());

        init_with_retry(&view).await.unwrap();

        assert!(view.with(|controller| controller.is_attached()));
        assert_eq!(view.with(|controller| controller.init_attempts()), 1);
    }

    /// A widget that never gets a size gives up with `WidgetUnavailable`
    #[tokio::test]
    async fn test_init_with_retry_gives_up() {
        let retry = RetryConfig {
            max_retries: 2,
            retry_delay_ms: 10,
            exponential_backoff: true,
            max_delay_ms: 20,
        };
        let view = shared_view(Point::new(0.0, 0.0), retry);

        let err = init_with_retry(&view).await.unwrap_err();

        assert!(matches!(err, MapError::WidgetUnavailable { attempts: 3, .. }));
        assert!(matches!(view.status(), MapStatus::Failed { .. }));
    }
}
