//! Cooperative cancellation of store round trips

use crate::error::ToolError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run `operation` unless `cancel` fires first
///
/// An already-cancelled token wins without polling the operation, so a
/// cancelled call never reaches the store.
pub(crate) async fn cancellable<T, E, F>(cancel: &CancellationToken, operation: F) -> Result<T, ToolError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ToolError>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ToolError::Cancelled),
        result = operation => result.map_err(Into::into),
    }
}
