//! Non-blocking failure notices
//!
//! A failed action is reported by name only. Error details go to the log.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The action failed and nothing was changed
    Failed,
    /// The server rejected the action because the data was stale
    Stale,
    /// Applied locally but not saved; the next reload may undo it
    NotSaved,
}

/// A transient message naming the action that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionNotice {
    pub action: String,
    pub kind: NoticeKind,
    pub raised_at: DateTime<Utc>,
}

impl ActionNotice {
    pub fn failed(action: impl Into<String>) -> Self {
        Self::new(action, NoticeKind::Failed)
    }

    pub fn not_saved(action: impl Into<String>) -> Self {
        Self::new(action, NoticeKind::NotSaved)
    }

    /// Build the notice for a failed call, logging what went wrong
    pub fn for_error(action: impl Into<String>, err: &ClientError) -> Self {
        let action = action.into();
        tracing::warn!(action = %action, error = %err, "Action failed");
        let kind = match err {
            ClientError::Conflict(_) => NoticeKind::Stale,
            _ => NoticeKind::Failed,
        };
        Self::new(action, kind)
    }

    fn new(action: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            action: action.into(),
            kind,
            raised_at: Utc::now(),
        }
    }
}

impl fmt::Display for ActionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoticeKind::Failed => write!(f, "Failed to {}", self.action),
            NoticeKind::Stale => write!(
                f,
                "Could not {}: the record changed, reload and try again",
                self.action
            ),
            NoticeKind::NotSaved => write!(f, "{}: change not saved", self.action),
        }
    }
}

/// Bounded queue of notices waiting to be shown
#[derive(Debug)]
pub struct NoticeBoard {
    notices: VecDeque<ActionNotice>,
    capacity: usize,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::with_capacity(20)
    }
}

impl NoticeBoard {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            notices: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Oldest notices drop off once the board is full
    pub fn push(&mut self, notice: ActionNotice) {
        if self.notices.len() == self.capacity {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    /// Run `call`, raising a notice named `action` if it fails
    pub async fn track<T, F>(&mut self, action: &str, call: F) -> Option<T>
    where
        F: std::future::Future<Output = Result<T, ClientError>>,
    {
        match call.await {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(ActionNotice::for_error(action, &err));
                None
            }
        }
    }

    pub fn drain(&mut self) -> Vec<ActionNotice> {
        self.notices.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_hides_error_detail() {
        let err = ClientError::Unexpected {
            status: 500,
            message: "relation \"grns\" does not exist".to_string(),
        };
        let notice = ActionNotice::for_error("complete GRN", &err);
        assert_eq!(notice.to_string(), "Failed to complete GRN");
        assert!(!notice.to_string().contains("relation"));
    }

    #[test]
    fn test_conflict_is_reported_as_stale() {
        let notice = ActionNotice::for_error("assign picker", &ClientError::Conflict("v3".to_string()));
        assert_eq!(notice.kind, NoticeKind::Stale);
    }

    #[test]
    fn test_board_drops_oldest() {
        let mut board = NoticeBoard::with_capacity(2);
        board.push(ActionNotice::failed("a"));
        board.push(ActionNotice::failed("b"));
        board.push(ActionNotice::failed("c"));
        let actions: Vec<_> = board.drain().into_iter().map(|n| n.action).collect();
        assert_eq!(actions, vec!["b", "c"]);
        assert!(board.is_empty());
    }

    #[test]
    fn test_track_records_failure() {
        let mut board = NoticeBoard::default();
        let result: Option<()> = tokio_test::block_on(board.track("start GRN", async {
            Err(ClientError::NotFound("GRN".to_string()))
        }));
        assert!(result.is_none());
        assert_eq!(board.len(), 1);
    }
}
