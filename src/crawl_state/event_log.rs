//! Append-only crawl log with staged navigation attempts
//!
//! A manual click is registered as an attempt before the click happens. While
//! the attempt is open, top-frame document requests are buffered instead of
//! appended, so the navigation entry always lands ahead of the requests it
//! caused. Commit appends the navigation and flushes the buffer in arrival
//! order; rollback throws both away.

use chrono::Utc;

use super::errors::StateError;
use crate::crawl_events::{CrawlEvent, FrameKey, NavigationRecord, RequestRecord};
use crate::utils::{domain_of, is_http_url};

/// The staged navigation protocol, one attempt at a time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NavigationTransaction {
    #[default]
    NoActiveAttempt,
    ActiveAttempt {
        frame_id: FrameKey,
        expected_url: String,
        started_at: i64,
        queued: Vec<RequestRecord>,
    },
}

impl NavigationTransaction {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::ActiveAttempt { .. })
    }
}

/// What `EventLog::record_request` did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Not an HTTP(S) URL; dropped
    Ignored,
    /// Buffered behind the open navigation attempt
    Queued,
    Appended,
}

#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<CrawlEvent>,
    transaction: NavigationTransaction,
    last_timestamp: i64,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch milliseconds, never smaller than the previous stamp
    fn stamp(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last_timestamp = self.last_timestamp.max(now);
        self.last_timestamp
    }

    fn append_request(&mut self, record: RequestRecord) {
        let timestamp = self.stamp();
        let domain = domain_of(&record.url);
        self.events.push(CrawlEvent::Request {
            timestamp,
            frame_id: record.frame_id,
            url: record.url,
            is_i_frame: record.is_iframe,
            is_redirect_continuation: record.is_redirect_continuation,
            domain,
        });
    }

    fn append_navigation(&mut self, frame_id: FrameKey, requested_url: String, resolved_url: Option<String>) {
        let timestamp = self.stamp();
        let domain = domain_of(&requested_url);
        self.events.push(CrawlEvent::Navigation {
            timestamp,
            frame_id,
            requested_url,
            resolved_url,
            domain,
        });
    }

    /// Log a document request, or buffer it if it belongs to the top frame
    /// while an attempt is open
    pub fn record_request(&mut self, record: RequestRecord) -> RecordOutcome {
        if !is_http_url(&record.url) {
            return RecordOutcome::Ignored;
        }

        if let NavigationTransaction::ActiveAttempt { queued, .. } = &mut self.transaction
            && !record.is_iframe
        {
            queued.push(record);
            return RecordOutcome::Queued;
        }

        self.append_request(record);
        RecordOutcome::Appended
    }

    /// Open a navigation attempt
    ///
    /// # Errors
    /// `StateError::AttemptAlreadyActive` if an attempt is already open; the
    /// open attempt is left untouched.
    pub fn register_attempt(&mut self, record: NavigationRecord) -> Result<(), StateError> {
        if let NavigationTransaction::ActiveAttempt { expected_url, .. } = &self.transaction {
            return Err(StateError::AttemptAlreadyActive {
                open_url: expected_url.clone(),
                new_url: record.url,
            });
        }
        let started_at = self.stamp();
        self.transaction = NavigationTransaction::ActiveAttempt {
            frame_id: record.frame_id,
            expected_url: record.url,
            started_at,
            queued: Vec::new(),
        };
        Ok(())
    }

    /// Close the open attempt, append its navigation and flush the buffer
    ///
    /// `resolved_url` is where the frame actually ended up; it is recorded
    /// only when it is an HTTP(S) URL that differs from the URL the attempt
    /// expected, so browser error pages never show up as a destination.
    /// Returns false
    /// when no attempt was open.
    pub fn commit_attempt(&mut self, resolved_url: Option<&str>) -> bool {
        let NavigationTransaction::ActiveAttempt {
            frame_id,
            expected_url,
            queued,
            ..
        } = std::mem::take(&mut self.transaction)
        else {
            return false;
        };

        let resolved_url = resolved_url
            .filter(|resolved| is_http_url(resolved) && *resolved != expected_url)
            .map(str::to_string);
        self.append_navigation(frame_id, expected_url, resolved_url);
        for record in queued {
            self.append_request(record);
        }
        true
    }

    /// Discard the open attempt and everything it buffered.
    /// Returns the number of buffered records dropped, `None` if nothing was open.
    pub fn rollback_attempt(&mut self) -> Option<usize> {
        match std::mem::take(&mut self.transaction) {
            NavigationTransaction::ActiveAttempt { queued, .. } => Some(queued.len()),
            NavigationTransaction::NoActiveAttempt => None,
        }
    }

    /// Append a navigation that was not staged (seed visit, merged tab)
    pub fn push_navigation(&mut self, record: NavigationRecord) {
        self.append_navigation(record.frame_id, record.url, None);
    }

    #[must_use]
    pub fn transaction(&self) -> &NavigationTransaction {
        &self.transaction
    }

    #[must_use]
    pub fn events(&self) -> &[CrawlEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(url: &str) -> RequestRecord {
        RequestRecord {
            url: url.to_string(),
            frame_id: 1,
            is_iframe: false,
            is_redirect_continuation: false,
        }
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let mut log = EventLog::new();
        log.last_timestamp = i64::MAX - 1;
        log.record_request(top("https://a.example/"));
        log.record_request(top("https://b.example/"));
        let stamps: Vec<i64> = log.events().iter().map(CrawlEvent::timestamp).collect();
        assert_eq!(stamps, vec![i64::MAX - 1, i64::MAX - 1]);
    }

    #[test]
    fn resolved_url_only_recorded_when_different() {
        let mut log = EventLog::new();
        let nav = |url: &str| NavigationRecord {
            frame_id: 1,
            url: url.to_string(),
        };

        log.register_attempt(nav("https://a.example/")).expect("open");
        assert!(log.commit_attempt(Some("https://a.example/")));
        log.register_attempt(nav("https://b.example/")).expect("open");
        assert!(log.commit_attempt(Some("https://c.example/landing")));

        let resolved: Vec<Option<String>> = log
            .events()
            .iter()
            .map(|event| match event {
                CrawlEvent::Navigation { resolved_url, .. } => resolved_url.clone(),
                CrawlEvent::Request { .. } => None,
            })
            .collect();
        assert_eq!(resolved, vec![None, Some("https://c.example/landing".to_string())]);
    }
}
