//! Deadlines for storage operations.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::{MatchmakingError, MatchmakingResult};

/// Default timeout for single queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for event transactions, including the wait for the event lock (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a storage future, failing with `Timeout` once `duration` elapses
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> MatchmakingResult<T>
where
    F: Future<Output = MatchmakingResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => {
            log::error!("Storage operation timed out after {:?}", duration);
            Err(MatchmakingError::Timeout(duration))
        }
    }
}
