use crate::error::SourceError;
use crate::metrics::Sample;
use crate::source::SampleSource;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub enum MockFetch {
    Samples(Vec<Sample>),
    TransportFailure,
    Malformed,
    Empty,
}

impl MockFetch {
    fn into_result(self) -> Result<Vec<Sample>, SourceError> {
        match self {
            MockFetch::Samples(samples) => Ok(samples),
            MockFetch::TransportFailure => {
                Err(SourceError::Transport("mock connection refused".to_string()))
            }
            MockFetch::Malformed => Err(SourceError::Malformed("mock bad payload".to_string())),
            MockFetch::Empty => Err(SourceError::EmptyResult {
                entity_id: "mock".to_string(),
            }),
        }
    }
}

/// Replays a scripted list of fetch outcomes, one per call. Once the script
/// runs out every further call reports an empty result.
#[derive(Debug)]
pub struct MockSampleSource {
    script: Mutex<VecDeque<MockFetch>>,
    calls: AtomicUsize,
}

impl MockSampleSource {
    pub fn new(script: Vec<MockFetch>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_fetch(&self) -> Result<Vec<Sample>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .map_err(|_| SourceError::Transport("mock script lock poisoned".to_string()))?
            .pop_front()
            .unwrap_or(MockFetch::Empty);
        next.into_result()
    }
}

impl SampleSource for MockSampleSource {
    async fn fetch_samples(&self) -> Result<Vec<Sample>, SourceError> {
        self.next_fetch()
    }
}
