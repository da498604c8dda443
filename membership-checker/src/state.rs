//! Chain state: `Init -> Checking(0) -> ... -> Checking(n) -> Finalized`.
//!
//! A [`CheckState`] carries everything needed to resume the chain, so each step can be queued
//! instead of called recursively. [`CheckState::finish`] consumes the state, so a chain cannot be
//! finalized twice.

use std::fmt;
use std::sync::Arc;

use gate_core::{ChatRef, CheckOutcome, UserId};

use crate::report::DebugReport;
use crate::request::CheckRequest;

/// Id of one `check` call, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckId(pub u64);

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "check-{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct CheckState {
    id: CheckId,
    request: Arc<CheckRequest>,
    current_index: usize,
    missing: Vec<ChatRef>,
    pub(crate) report: Option<DebugReport>,
}

/// A finished chain: the outcome and the continuation it selects (if one is set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalized {
    pub id: CheckId,
    pub outcome: CheckOutcome,
    pub continuation: Option<String>,
}

impl CheckState {
    pub fn new(id: CheckId, request: CheckRequest) -> Self {
        let report = request.debug.then(DebugReport::default);
        Self {
            id,
            request: Arc::new(request),
            current_index: 0,
            missing: Vec::new(),
            report,
        }
    }

    pub fn id(&self) -> CheckId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.request.user_id
    }

    pub fn request(&self) -> &CheckRequest {
        &self.request
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn missing(&self) -> &[ChatRef] {
        &self.missing
    }

    /// The chat the next step looks up, or `None` once every chat was evaluated.
    pub fn current_chat(&self) -> Option<&ChatRef> {
        self.request.chats.get(self.current_index)
    }

    pub fn is_finished(&self) -> bool {
        self.current_index >= self.request.chats.len()
    }

    /// Records the result for the current chat and moves the cursor. No-op once finished.
    pub fn advance(&mut self, joined: bool) {
        let Some(chat) = self.current_chat().cloned() else {
            return;
        };
        if !joined {
            self.missing.push(chat);
        }
        self.current_index += 1;
    }

    /// Ends the chain. `on_all_joined` is selected iff nothing is missing.
    pub fn finish(self) -> Finalized {
        let joined = self.missing.is_empty();
        let continuation = if joined {
            self.request.on_all_joined.clone()
        } else {
            self.request.on_any_missing.clone()
        };
        Finalized {
            id: self.id,
            outcome: CheckOutcome::new(self.request.user_id, self.missing),
            continuation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(name: &str) -> ChatRef {
        ChatRef::Username(name.to_string())
    }

    fn request(chats: &[&str]) -> CheckRequest {
        CheckRequest {
            chats: chats.iter().map(|c| chat(c)).collect(),
            user_id: UserId(1),
            on_all_joined: Some("X".to_string()),
            on_any_missing: Some("Y".to_string()),
            debug: false,
        }
    }

    #[test]
    fn test_advance_walks_chats_in_order() {
        let mut state = CheckState::new(CheckId(1), request(&["a", "b", "c"]));
        assert_eq!(state.current_chat(), Some(&chat("a")));

        state.advance(true);
        assert_eq!(state.current_chat(), Some(&chat("b")));
        state.advance(false);
        state.advance(false);

        assert!(state.is_finished());
        assert_eq!(state.current_index(), 3);
        assert_eq!(state.missing(), &[chat("b"), chat("c")]);
    }

    #[test]
    fn test_advance_never_passes_the_end() {
        let mut state = CheckState::new(CheckId(1), request(&["a"]));
        state.advance(false);
        state.advance(false);
        state.advance(true);

        assert_eq!(state.current_index(), 1);
        assert_eq!(state.missing(), &[chat("a")]);
    }

    #[test]
    fn test_finish_selects_continuation() {
        let mut all_joined = CheckState::new(CheckId(1), request(&["a", "b"]));
        all_joined.advance(true);
        all_joined.advance(true);
        let finalized = all_joined.finish();
        assert_eq!(finalized.continuation.as_deref(), Some("X"));
        assert_eq!(finalized.outcome, CheckOutcome::new(UserId(1), Vec::new()));

        let mut some_missing = CheckState::new(CheckId(2), request(&["a", "b"]));
        some_missing.advance(true);
        some_missing.advance(false);
        let finalized = some_missing.finish();
        assert_eq!(finalized.continuation.as_deref(), Some("Y"));
        assert!(!finalized.outcome.joined);
        assert_eq!(finalized.outcome.missing, vec![chat("b")]);
    }

    #[test]
    fn test_debug_request_carries_report() {
        let mut req = request(&["a"]);
        assert!(CheckState::new(CheckId(1), req.clone()).report.is_none());
        req.debug = true;
        assert!(CheckState::new(CheckId(1), req).report.is_some());
    }

    #[test]
    fn test_check_id_display() {
        assert_eq!(CheckId(12).to_string(), "check-12");
    }
}
