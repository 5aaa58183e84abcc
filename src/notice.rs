//! Transient user-facing notices.
//!
//! Producers hold a cheap [`Notifier`]; the UI owns a [`NoticeBoard`] that
//! pulls from the paired receiver and drops each notice once its TTL passes.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Notices queued but not yet picked up. Further notices are dropped (they
/// are still logged) until the board catches up.
pub const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub ttl: Duration,
}

pub type NoticeReceiver = mpsc::Receiver<Notice>;

#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notice>,
}

impl Notifier {
    pub fn channel() -> (Self, NoticeReceiver) {
        let (tx, rx) = mpsc::channel(NOTICE_CAPACITY);
        (Self { tx }, rx)
    }

    pub fn notify(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::error!(notice = %message),
            Severity::Warning => tracing::warn!(notice = %message),
            Severity::Info | Severity::Success => tracing::info!(notice = %message),
        }

        let notice = Notice {
            severity,
            message,
            ttl: NOTICE_TTL,
        };
        if let Err(mpsc::error::TrySendError::Full(dropped)) = self.tx.try_send(notice) {
            tracing::debug!(notice = %dropped.message, "Notice queue full, dropping");
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(Severity::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Severity::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Severity::Error, message);
    }
}

/// Drain everything currently queued without waiting.
pub fn drain(rx: &mut NoticeReceiver) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}

/// The notices currently on screen, oldest first.
pub struct NoticeBoard {
    rx: NoticeReceiver,
    shown: VecDeque<(Instant, Notice)>,
}

impl NoticeBoard {
    pub fn new(rx: NoticeReceiver) -> Self {
        Self {
            rx,
            shown: VecDeque::new(),
        }
    }

    /// Pick up new notices and dismiss expired ones.
    pub fn refresh(&mut self) {
        let now = Instant::now();
        for notice in drain(&mut self.rx) {
            self.shown.push_back((now, notice));
        }
        self.shown
            .retain(|(shown_at, notice)| now.duration_since(*shown_at) < notice.ttl);
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notice> {
        self.shown.iter().map(|(_, notice)| notice)
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }
}
