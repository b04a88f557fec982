use crate::error::SourceError;
use crate::metrics::Sample;
use std::future::Future;

pub mod mock;
pub mod sth;

/// Supplies the recent window of distance samples for the monitored device.
///
/// Implementations own transport, timeouts and payload validation; anything
/// that cannot be turned into a well-formed [`Sample`] is reported as an error
/// instead of being passed on.
pub trait SampleSource: Send + Sync {
    fn fetch_samples(&self) -> impl Future<Output = Result<Vec<Sample>, SourceError>> + Send;
}
