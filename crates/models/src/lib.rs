//! Client seams for the external model services the pipeline collaborates
//! with: the speech-to-text engine that produces the input segments and the
//! LLM grader that consumes the finished transcript as plain text.
//!
//! Both are held behind [`ClientCell`], which makes the lifecycle explicit
//! (uninitialized, loading, ready) instead of hiding the model in a
//! process-wide global. A ready client is shared immutably, so concurrent
//! diarization jobs can read it without coordination.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use callsift_transcript::Segment;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("client not ready")]
    NotReady,
    #[error("client already initialized")]
    AlreadyInitialized,
    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Speech-to-text collaborator producing time-aligned segments.
pub trait SpeechToText: Send + Sync {
    fn name(&self) -> &str;
    fn transcribe(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<Segment>>;
}

/// Grading collaborator consuming the speaker-labeled plain-text transcript.
pub trait TranscriptGrader: Send + Sync {
    fn name(&self) -> &str;
    fn grade(&self, transcript_text: &str) -> Result<GradeSummary>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeSummary {
    pub grade_percentage: f32,
    pub total_questions: usize,
    pub questions_asked_correctly: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Loading,
    Ready,
}

const STATE_UNINITIALIZED: u8 = 0;
const STATE_LOADING: u8 = 1;
const STATE_READY: u8 = 2;

/// Holder for an explicitly-initialized client.
///
/// Exactly one caller wins the transition to `Loading`; a failed load
/// returns the cell to `Uninitialized` so initialization can be retried,
/// while a second attempt during or after a successful load is an
/// [`ModelError::AlreadyInitialized`] error. `get` never blocks.
pub struct ClientCell<T> {
    state: AtomicU8,
    value: OnceLock<T>,
}

impl<T> ClientCell<T> {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_UNINITIALIZED),
            value: OnceLock::new(),
        }
    }

    pub fn state(&self) -> ClientState {
        match self.state.load(Ordering::Acquire) {
            STATE_LOADING => ClientState::Loading,
            STATE_READY => ClientState::Ready,
            _ => ClientState::Uninitialized,
        }
    }

    /// Load the client, moving `Uninitialized -> Loading -> Ready`.
    pub fn initialize<F>(&self, load: F) -> Result<&T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.state
            .compare_exchange(
                STATE_UNINITIALIZED,
                STATE_LOADING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| ModelError::AlreadyInitialized)?;

        match load() {
            Ok(client) => {
                let slot = self.value.get_or_init(|| client);
                self.state.store(STATE_READY, Ordering::Release);
                tracing::info!("client initialized");
                Ok(slot)
            }
            Err(e) => {
                self.state.store(STATE_UNINITIALIZED, Ordering::Release);
                tracing::warn!("client initialization failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn get(&self) -> Result<&T> {
        self.value.get().ok_or(ModelError::NotReady)
    }
}

impl<T> Default for ClientCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTranscriber;

    impl SpeechToText for FakeTranscriber {
        fn name(&self) -> &str {
            "fake"
        }

        fn transcribe(&self, _samples: &[f32], _sample_rate: u32) -> Result<Vec<Segment>> {
            Ok(vec![Segment::new(0.0, 1.0, "hello")])
        }
    }

    #[test]
    fn test_get_before_initialize_fails() {
        let cell: ClientCell<u32> = ClientCell::new();
        assert_eq!(cell.state(), ClientState::Uninitialized);
        assert!(matches!(cell.get(), Err(ModelError::NotReady)));
    }

    #[test]
    fn test_initialize_then_get() {
        let cell: ClientCell<Box<dyn SpeechToText>> = ClientCell::new();
        let client = cell
            .initialize(|| Ok(Box::new(FakeTranscriber) as Box<dyn SpeechToText>))
            .unwrap();
        assert_eq!(client.name(), "fake");
        assert_eq!(cell.state(), ClientState::Ready);

        let segments = cell.get().unwrap().transcribe(&[0.0], 16000).unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_second_initialize_rejected() {
        let cell: ClientCell<u32> = ClientCell::new();
        cell.initialize(|| Ok(7)).unwrap();
        let err = cell.initialize(|| Ok(8)).unwrap_err();
        assert!(matches!(err, ModelError::AlreadyInitialized));
        assert_eq!(*cell.get().unwrap(), 7);
    }

    #[test]
    fn test_failed_load_can_retry() {
        let cell: ClientCell<u32> = ClientCell::new();
        let err = cell
            .initialize(|| Err(ModelError::Backend("connection refused".into())))
            .unwrap_err();
        assert!(matches!(err, ModelError::Backend(_)));
        assert_eq!(cell.state(), ClientState::Uninitialized);

        cell.initialize(|| Ok(3)).unwrap();
        assert_eq!(*cell.get().unwrap(), 3);
    }

    #[test]
    fn test_ready_client_shared_across_threads() {
        let cell: ClientCell<Box<dyn SpeechToText>> = ClientCell::new();
        cell.initialize(|| Ok(Box::new(FakeTranscriber) as Box<dyn SpeechToText>))
            .unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let client = cell.get().unwrap();
                    assert!(client.transcribe(&[0.0; 8], 8000).is_ok());
                });
            }
        });
    }
}
