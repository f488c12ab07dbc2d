use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum NoticeLevel {
    Info,
    Error,
}

#[derive(Clone, Debug)]
pub(super) struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    created: Instant,
}

/// User-facing messages shown in the top bar. Info notices fade out on their
/// own, errors stay until dismissed.
#[derive(Default)]
pub(super) struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message.into(), NoticeLevel::Info, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message.into(), NoticeLevel::Error, Instant::now());
    }

    fn push(&mut self, message: String, level: NoticeLevel, created: Instant) {
        self.items.push(Notice {
            message,
            level,
            created,
        });
    }

    pub fn items(&self) -> &[Notice] {
        &self.items
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    /// Drops info notices older than `ttl`. Returns whether any info notice
    /// is still counting down, so the caller can schedule a repaint.
    pub fn expire(&mut self, now: Instant, ttl: Duration) -> bool {
        self.items.retain(|n| {
            n.level == NoticeLevel::Error || now.saturating_duration_since(n.created) < ttl
        });
        self.items.iter().any(|n| n.level == NoticeLevel::Info)
    }
}
