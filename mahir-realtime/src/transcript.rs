//! Transcript reconciliation.
//!
//! The server streams transcript fragments for both sides of the
//! conversation. Fragments accumulate until the model finishes its turn,
//! at which point both accumulators are committed as one history entry.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One committed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// What the user said.
    pub user: String,
    /// What the tutor said.
    pub tutor: String,
}

/// A point-in-time view of the transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptSnapshot {
    /// User speech accumulated since the last commit.
    pub partial_input: String,
    /// Tutor speech accumulated since the last commit.
    pub partial_output: String,
    /// Committed turns, oldest first.
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Default)]
struct TranscriptState {
    partial_input: String,
    partial_output: String,
    history: Vec<ConversationTurn>,
}

/// Accumulates transcript fragments and commits them on turn boundaries.
#[derive(Debug, Default)]
pub struct TranscriptReconciler {
    state: Mutex<TranscriptState>,
}

impl TranscriptReconciler {
    /// Create an empty reconciler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment of user speech.
    pub fn append_input(&self, text: &str) {
        self.state.lock().partial_input.push_str(text);
    }

    /// Append a fragment of tutor speech.
    pub fn append_output(&self, text: &str) {
        self.state.lock().partial_output.push_str(text);
    }

    /// Commit the accumulated fragments as one turn. A boundary with
    /// nothing accumulated on either side commits nothing, which makes
    /// repeated boundaries harmless.
    pub fn commit_turn(&self) -> Option<ConversationTurn> {
        let mut state = self.state.lock();
        if state.partial_input.is_empty() && state.partial_output.is_empty() {
            return None;
        }
        let turn = ConversationTurn {
            user: std::mem::take(&mut state.partial_input),
            tutor: std::mem::take(&mut state.partial_output),
        };
        state.history.push(turn.clone());
        tracing::debug!(turns = state.history.len(), "committed conversation turn");
        Some(turn)
    }

    /// Clear partials and history for a fresh session.
    pub fn reset(&self) {
        *self.state.lock() = TranscriptState::default();
    }

    /// Current partials and history.
    pub fn snapshot(&self) -> TranscriptSnapshot {
        let state = self.state.lock();
        TranscriptSnapshot {
            partial_input: state.partial_input.clone(),
            partial_output: state.partial_output.clone(),
            history: state.history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_accumulate_in_order() {
        let transcript = TranscriptReconciler::new();
        transcript.append_input("السلام ");
        transcript.append_input("عليكم");
        transcript.append_output("وعليكم السلام");

        let snapshot = transcript.snapshot();
        assert_eq!(snapshot.partial_input, "السلام عليكم");
        assert_eq!(snapshot.partial_output, "وعليكم السلام");
        assert!(snapshot.history.is_empty());
    }

    #[test]
    fn commit_moves_partials_to_history() {
        let transcript = TranscriptReconciler::new();
        transcript.append_input("سلام");
        transcript.append_output("وعليكم");

        let turn = transcript.commit_turn().unwrap();
        assert_eq!(turn.user, "سلام");
        assert_eq!(turn.tutor, "وعليكم");

        let snapshot = transcript.snapshot();
        assert!(snapshot.partial_input.is_empty());
        assert!(snapshot.partial_output.is_empty());
        assert_eq!(snapshot.history, vec![turn]);
    }

    #[test]
    fn empty_boundary_commits_nothing() {
        let transcript = TranscriptReconciler::new();
        assert!(transcript.commit_turn().is_none());

        transcript.append_input("مرحبا");
        transcript.commit_turn().unwrap();
        // A second boundary with nothing new is a no-op.
        assert!(transcript.commit_turn().is_none());
        assert_eq!(transcript.snapshot().history.len(), 1);
    }

    #[test]
    fn one_sided_turn_still_commits() {
        let transcript = TranscriptReconciler::new();
        transcript.append_output("أهلاً وسهلاً");
        let turn = transcript.commit_turn().unwrap();
        assert!(turn.user.is_empty());
        assert_eq!(turn.tutor, "أهلاً وسهلاً");
    }

    #[test]
    fn reset_clears_everything() {
        let transcript = TranscriptReconciler::new();
        transcript.append_input("a");
        transcript.commit_turn();
        transcript.append_output("b");

        transcript.reset();
        assert_eq!(transcript.snapshot(), TranscriptSnapshot::default());
    }
}
