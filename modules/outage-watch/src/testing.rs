//! Test doubles for the scheduler's collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use pge_outage_client::FetchResult;
use serde_json::Value;

use crate::error::NotifyError;
use crate::journal::{Journal, LogLevel};
use crate::notify::{Notification, NotifyBackend};
use crate::source::OutageSource;

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum MockReply {
    /// A real HTTP response; the body is decoded the way the client does.
    Response { status: u16, text: String },
    /// Full control over both bodies.
    Bodies {
        json: Option<Value>,
        text: Option<String>,
    },
    TransportError(String),
}

/// Replays queued replies, then repeats the fallback forever.
pub struct MockSource {
    queue: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new(fallback: MockReply) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_body(text: &str) -> Self {
        Self::new(MockReply::Response {
            status: 200,
            text: text.to_string(),
        })
    }

    pub fn then(self, reply: MockReply) -> Self {
        self.queue.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutageSource for MockSource {
    async fn fetch(
        &self,
        now: NaiveDateTime,
        city_sym: &str,
        _lookback_days: u32,
        _timeout: Duration,
    ) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let url = format!("https://mock.test/api/power-outage?citySym={city_sym}");
        match reply {
            MockReply::Response { status, text } => FetchResult::response(url, status, text, now),
            MockReply::Bodies { json, text } => FetchResult {
                url,
                status_code: Some(200),
                json_body: json,
                text_body: text,
                error: None,
                requested_at: now,
            },
            MockReply::TransportError(e) => FetchResult::transport_error(url, e, now),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryJournal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Fetch { url: String, failed: bool },
    Message { level: LogLevel, text: String },
}

#[derive(Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<JournalEntry>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                JournalEntry::Message { level: l, text } if l == level => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn fetches(&self) -> usize {
        self.entries()
            .iter()
            .filter(|e| matches!(e, JournalEntry::Fetch { .. }))
            .count()
    }
}

#[async_trait]
impl Journal for MemoryJournal {
    async fn record_fetch(&self, result: &FetchResult) {
        self.entries.lock().unwrap().push(JournalEntry::Fetch {
            url: result.url.clone(),
            failed: result.is_failure(),
        });
    }

    async fn record_message(&self, _at: NaiveDateTime, level: LogLevel, message: &str) {
        self.entries.lock().unwrap().push(JournalEntry::Message {
            level,
            text: message.to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Keeps every notification it is asked to send. Can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail_with: Option<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifyBackend for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        match &self.fail_with {
            Some(reason) => Err(NotifyError::Other(reason.clone())),
            None => Ok(()),
        }
    }

    fn recipients(&self) -> Vec<String> {
        vec!["test@example.test".to_string()]
    }
}
