//! Minimum perceived latency for mutating operations

use std::future::Future;
use std::time::Duration;

/// Default floor applied to create/update/delete/status operations
pub const DEFAULT_MIN_LATENCY: Duration = Duration::from_millis(1500);

/// Run `fut` and resolve only after `max(actual latency, floor)`
///
/// Only successes are held back. An error is returned as soon as `fut`
/// fails, without waiting out the rest of the floor.
pub async fn with_min_latency<F, T, E>(fut: F, floor: Duration) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    if floor.is_zero() {
        return fut.await;
    }
    let floor = async {
        tokio::time::sleep(floor).await;
        Ok(())
    };
    let (output, ()) = tokio::try_join!(fut, floor)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_fast_operation_waits_for_floor() {
        let start = Instant::now();
        let value: Result<i32, ()> = with_min_latency(async { Ok(7) }, Duration::from_millis(1500)).await;
        assert_eq!(value, Ok(7));
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_operation_is_not_extended() {
        let start = Instant::now();
        let slow = async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok::<_, ()>("done")
        };
        let value = with_min_latency(slow, Duration::from_millis(1500)).await;
        assert_eq!(value, Ok("done"));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_return_immediately() {
        let start = Instant::now();
        let result: Result<(), &str> =
            with_min_latency(async { Err("boom") }, Duration::from_millis(1500)).await;
        assert_eq!(result, Err("boom"));
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_failure_is_not_extended() {
        let start = Instant::now();
        let failing = async {
            tokio::time::sleep(Duration::from_millis(400)).await;
            Err::<(), _>("late")
        };
        let result = with_min_latency(failing, Duration::from_millis(1500)).await;
        assert_eq!(result, Err("late"));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(400));
        assert!(elapsed < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_zero_floor_is_passthrough() {
        let value: Result<i32, ()> = with_min_latency(async { Ok(1) }, Duration::ZERO).await;
        assert_eq!(value, Ok(1));
    }
}
