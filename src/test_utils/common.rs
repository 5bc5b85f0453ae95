use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::OutputSink;
use crate::SinkError;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// One call that reached the sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    /// `None` for queued calls
    pub interrupt: Option<bool>,
}

/// Output sink that remembers what it was asked to say. Clones share state, so
/// a test keeps one clone and hands the other to the announcer.
#[derive(Clone, Default)]
pub struct RecordingSink {
    utterances: Arc<Mutex<Vec<Utterance>>>,
    silences: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(
        &self,
        available: bool,
    ) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Make every call fail with a backend error (nothing is recorded).
    pub fn set_failing(
        &self,
        failing: bool,
    ) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn utterances(&self) -> Vec<Utterance> {
        self.utterances.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.utterances().into_iter().map(|u| u.text).collect()
    }

    pub fn silences(&self) -> usize {
        self.silences.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.utterances.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn record(
        &self,
        text: &str,
        interrupt: Option<bool>,
    ) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Backend("recording sink set to fail".into()));
        }
        self.utterances.lock().unwrap_or_else(|e| e.into_inner()).push(Utterance {
            text: text.to_string(),
            interrupt,
        });
        Ok(())
    }
}

impl OutputSink for RecordingSink {
    fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    fn say(
        &self,
        text: &str,
        interrupt: bool,
    ) -> Result<(), SinkError> {
        self.record(text, Some(interrupt))
    }

    fn say_queued(
        &self,
        text: &str,
    ) -> Result<(), SinkError> {
        self.record(text, None)
    }

    fn silence(&self) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable);
        }
        self.silences.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
