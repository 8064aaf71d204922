//! Summarization policy: compress the oldest exchange once history grows.

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::history::ConversationState;
use crate::model::{GenerationParams, ModelService, collect_summary};

/// Default number of user turns tolerated before the oldest is compressed.
pub const DEFAULT_MAX_USER_TURNS: usize = 3;

/// Decides when the oldest user/assistant exchange is folded into the running
/// summary, and performs the fold.
#[derive(Debug, Clone)]
pub struct SummarizationPolicy {
    max_user_turns: usize,
    params: GenerationParams,
}

impl Default for SummarizationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_USER_TURNS, GenerationParams::summary())
    }
}

impl SummarizationPolicy {
    pub fn new(max_user_turns: usize, params: GenerationParams) -> Self {
        Self {
            max_user_turns,
            params,
        }
    }

    pub fn max_user_turns(&self) -> usize {
        self.max_user_turns
    }

    /// Run one compression cycle if the trigger holds.
    ///
    /// The state lock is released while the model call is awaited; the
    /// `Summarizing` status keeps a concurrent trigger from starting a second
    /// cycle. Returns true when a cycle ran.
    pub async fn apply(&self, state: &Mutex<ConversationState>, model: &dyn ModelService) -> bool {
        let pending = {
            let mut guard = state.lock().await;
            if !guard.needs_summarization(self.max_user_turns) {
                debug!(
                    user_turns = guard.user_turn_count(),
                    status = ?guard.status(),
                    "summarization not triggered"
                );
                return false;
            }
            match guard.begin_summarization() {
                Some(pending) => pending,
                None => return false,
            }
        };

        let summary = collect_summary(model, &pending.prompt(), &self.params).await;

        let mut guard = state.lock().await;
        guard.finish_summarization(&summary);
        info!(
            remaining_turns = guard.len(),
            summary_chars = guard.running_summary().len(),
            "compressed oldest exchange"
        );
        true
    }
}
