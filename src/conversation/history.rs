//! Conversation history store.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Author of a stored turn. System messages are never stored in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One role-tagged message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// Hidden turns feed model context but are never shown in the transcript.
    #[serde(default)]
    pub hidden: bool,
}

/// Whether a summarization cycle is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummarizationStatus {
    #[default]
    Idle,
    Summarizing,
}

/// A user/assistant exchange taken out of history, waiting to be summarized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSummary {
    pub user: ConversationTurn,
    pub assistant: Option<ConversationTurn>,
}

impl PendingSummary {
    /// The request sent to the model-summary service for this exchange.
    pub fn prompt(&self) -> String {
        format!(
            "Summarize the following user and assistant exchange for future context. \
             Focus on the key question, answer, and learning points.\n\n\
             USER: {}\nASSISTANT: {}",
            self.user.content,
            self.assistant
                .as_ref()
                .map(|t| t.content.as_str())
                .unwrap_or("")
        )
    }
}

/// Ordered turn log plus the running summary of turns removed from it.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    turns: Vec<ConversationTurn>,
    running_summary: String,
    status: SummarizationStatus,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a visible turn. Absent content is stored as an empty string.
    pub fn append(&mut self, role: Role, content: impl Into<Option<String>>) {
        self.push(role, content.into(), false);
    }

    /// Append a hidden turn. Absent content is stored as an empty string.
    pub fn append_hidden(&mut self, role: Role, content: impl Into<Option<String>>) {
        self.push(role, content.into(), true);
    }

    fn push(&mut self, role: Role, content: Option<String>, hidden: bool) {
        let content = content.unwrap_or_default();
        debug!(%role, hidden, chars = content.len(), "turn appended");
        self.turns.push(ConversationTurn {
            role,
            content,
            hidden,
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn user_turn_count(&self) -> usize {
        self.turns.iter().filter(|t| t.role == Role::User).count()
    }

    pub fn running_summary(&self) -> &str {
        &self.running_summary
    }

    pub fn status(&self) -> SummarizationStatus {
        self.status
    }

    /// Reset the session: no turns, no summary, status idle.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.running_summary.clear();
        self.status = SummarizationStatus::Idle;
    }

    /// True when more than `max_user_turns` user turns are stored and no
    /// summarization is running.
    pub fn needs_summarization(&self, max_user_turns: usize) -> bool {
        self.status == SummarizationStatus::Idle && self.user_turn_count() > max_user_turns
    }

    /// Remove the oldest user turn and its reply, and mark summarization as
    /// running.
    ///
    /// The reply is the first assistant turn after the user turn and before the
    /// next user turn. Returns `None` while another cycle is running or when
    /// fewer than two user turns exist: the newest request always stays.
    pub fn begin_summarization(&mut self) -> Option<PendingSummary> {
        if self.status == SummarizationStatus::Summarizing {
            return None;
        }

        let user_idx = self.turns.iter().position(|t| t.role == Role::User)?;
        let newest_user_idx = self.turns.iter().rposition(|t| t.role == Role::User)?;
        if user_idx == newest_user_idx {
            debug!("only the newest user turn remains; nothing to summarize");
            return None;
        }
        let assistant_idx = self.turns[user_idx + 1..]
            .iter()
            .take_while(|t| t.role != Role::User)
            .position(|t| t.role == Role::Assistant)
            .map(|offset| user_idx + 1 + offset);

        // Assistant first: it sits after the user turn, so the user index stays valid.
        let assistant = assistant_idx.map(|idx| self.turns.remove(idx));
        let user = self.turns.remove(user_idx);

        self.status = SummarizationStatus::Summarizing;
        debug!(
            paired = assistant.is_some(),
            remaining = self.turns.len(),
            "summarization started"
        );
        Some(PendingSummary { user, assistant })
    }

    /// Fold a summary into the running summary and return to idle.
    ///
    /// Empty summaries (a failed summarization call) leave the running summary
    /// untouched.
    pub fn finish_summarization(&mut self, summary: &str) {
        let summary = summary.trim();
        if !summary.is_empty() {
            if !self.running_summary.is_empty() {
                self.running_summary.push('\n');
            }
            self.running_summary.push_str(summary);
        }
        self.status = SummarizationStatus::Idle;
        debug!(
            summary_chars = self.running_summary.len(),
            "summarization finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(turns: &[(Role, &str)]) -> ConversationState {
        let mut state = ConversationState::new();
        for (role, content) in turns {
            state.append(*role, content.to_string());
        }
        state
    }

    #[test]
    fn append_keeps_order_and_coerces_missing_content() {
        let mut state = ConversationState::new();
        state.append(Role::User, "first".to_string());
        state.append(Role::Assistant, None::<String>);
        state.append_hidden(Role::User, "hint request".to_string());

        let turns = state.turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "first");
        assert_eq!(turns[1].content, "");
        assert_eq!(turns[1].role, Role::Assistant);
        assert!(turns[2].hidden);
        assert!(!turns[0].hidden);
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = state_with(&[(Role::User, "a"), (Role::Assistant, "b"), (Role::User, "c")]);
        let _ = state.begin_summarization();
        state.finish_summarization("summary");
        state.append(Role::User, "d".to_string());
        let _ = state.begin_summarization();
        assert_eq!(state.status(), SummarizationStatus::Summarizing);

        state.clear();
        assert!(state.is_empty());
        assert!(state.running_summary().is_empty());
        assert_eq!(state.status(), SummarizationStatus::Idle);
    }

    #[test]
    fn needs_summarization_only_above_threshold_and_idle() {
        let mut state = state_with(&[
            (Role::User, "1"),
            (Role::User, "2"),
            (Role::User, "3"),
        ]);
        assert!(!state.needs_summarization(3));

        state.append(Role::User, "4".to_string());
        assert!(state.needs_summarization(3));

        let _ = state.begin_summarization();
        state.append(Role::User, "5".to_string());
        assert!(!state.needs_summarization(3));
    }

    #[test]
    fn begin_removes_oldest_user_turn_and_its_reply() {
        let mut state = state_with(&[
            (Role::User, "q1"),
            (Role::Assistant, "a1"),
            (Role::User, "q2"),
            (Role::Assistant, "a2"),
        ]);

        let pending = state.begin_summarization().unwrap();
        assert_eq!(pending.user.content, "q1");
        assert_eq!(pending.assistant.as_ref().unwrap().content, "a1");
        assert_eq!(state.turns().len(), 2);
        assert_eq!(state.turns()[0].content, "q2");
        assert_eq!(state.status(), SummarizationStatus::Summarizing);
    }

    #[test]
    fn reply_pairing_stops_at_next_user_turn() {
        let mut state = state_with(&[
            (Role::User, "q1"),
            (Role::User, "q2"),
            (Role::Assistant, "a2"),
        ]);

        let pending = state.begin_summarization().unwrap();
        assert_eq!(pending.user.content, "q1");
        assert!(pending.assistant.is_none());
        assert_eq!(
            state.turns().iter().map(|t| t.content.as_str()).collect::<Vec<_>>(),
            vec!["q2", "a2"]
        );
    }

    #[test]
    fn leading_assistant_turn_is_not_paired() {
        let mut state = state_with(&[
            (Role::Assistant, "greeting"),
            (Role::User, "q1"),
            (Role::Assistant, "a1"),
            (Role::User, "q2"),
        ]);

        let pending = state.begin_summarization().unwrap();
        assert_eq!(pending.user.content, "q1");
        assert_eq!(pending.assistant.unwrap().content, "a1");
        assert_eq!(
            state.turns().iter().map(|t| t.content.as_str()).collect::<Vec<_>>(),
            vec!["greeting", "q2"]
        );
    }

    #[test]
    fn newest_user_turn_is_never_summarized() {
        let mut state = state_with(&[
            (Role::User, "q1"),
            (Role::Assistant, "a1"),
        ]);
        assert!(state.needs_summarization(0));
        assert!(state.begin_summarization().is_none());
        assert_eq!(state.len(), 2);
        assert_eq!(state.status(), SummarizationStatus::Idle);
    }

    #[test]
    fn second_begin_while_summarizing_is_a_noop() {
        let mut state = state_with(&[(Role::User, "q1"), (Role::User, "q2")]);
        assert!(state.begin_summarization().is_some());
        assert!(state.begin_summarization().is_none());
        assert_eq!(state.turns().len(), 1);
    }

    #[test]
    fn begin_without_user_turns_returns_none() {
        let mut state = state_with(&[(Role::Assistant, "hello")]);
        assert!(state.begin_summarization().is_none());
        assert_eq!(state.status(), SummarizationStatus::Idle);
    }

    #[test]
    fn finish_joins_summaries_with_newlines() {
        let mut state = state_with(&[(Role::User, "q1"), (Role::User, "q2"), (Role::User, "q3")]);
        let _ = state.begin_summarization();
        state.finish_summarization("first");
        let _ = state.begin_summarization();
        state.finish_summarization("second");

        assert_eq!(state.running_summary(), "first\nsecond");
        assert_eq!(state.status(), SummarizationStatus::Idle);
    }

    #[test]
    fn empty_summary_returns_to_idle_without_touching_summary() {
        let mut state = state_with(&[(Role::User, "q1"), (Role::User, "q2")]);
        let _ = state.begin_summarization();
        state.finish_summarization("   ");
        assert!(state.running_summary().is_empty());
        assert_eq!(state.status(), SummarizationStatus::Idle);
    }

    #[test]
    fn pending_prompt_includes_both_sides() {
        let pending = PendingSummary {
            user: ConversationTurn {
                role: Role::User,
                content: "How do I start?".into(),
                hidden: false,
            },
            assistant: None,
        };
        let prompt = pending.prompt();
        assert!(prompt.contains("key question, answer, and learning points"));
        assert!(prompt.contains("USER: How do I start?"));
        assert!(prompt.ends_with("ASSISTANT: "));
    }
}
