//! Prompt assembly: persona block, carried summary, bounded recent history.

use chrono::NaiveDate;
use tracing::debug;

use super::history::{ConversationTurn, Role};
use crate::model::{ChatMessage, GenerationParams, ModelService, collect_summary};
use crate::problem::Problem;

/// Default number of most recent turns sent verbatim.
pub const DEFAULT_RECENT_WINDOW: usize = 6;

/// Build the persona/instructions block for `problem`.
pub fn persona_prompt(problem: &Problem, running_summary: &str, today: NaiveDate) -> String {
    let mut prompt = format!(
        "# CONTEXT\n\
         You are an expert software engineer and computer science educator specializing in \
         algorithms and data structures. You are helping a student work through the following \
         LeetCode-style coding problem:\n\n\
         {} ({}):\n{}",
        problem.title,
        problem.difficulty.to_uppercase(),
        problem.description
    );

    if !running_summary.is_empty() {
        prompt.push_str("\n\n# SUMMARIZED PREVIOUS HISTORY\n");
        prompt.push_str(running_summary);
    }

    prompt.push_str(
        "\n\n# OBJECTIVE\n\
         Guide the student through the problem-solving process. Favor learning and skill \
         development over handing out answers.\n\n\
         # STYLE\n\
         Be clear, structured and educational. Explain step by step, name the relevant \
         computer science principles, and keep any example code clean and commented.\n\n\
         # TONE\n\
         Supportive, patient and encouraging. Treat mistakes as learning opportunities.\n\n\
         # AUDIENCE\n\
         A programmer who may not know every algorithm or data structure yet and learns best \
         through guided discovery.\n\n\
         # RESPONSE FORMAT\n\
         - Hints guide thinking without revealing the full solution\n\
         - Approaches cover reasoning, candidate algorithms and time/space complexity\n\
         - Code explanations go line by line and suggest improvements\n\
         - Optimization help covers theoretical and practical improvements\n\
         - Always use markdown, with syntax-highlighted code blocks\n",
    );
    prompt.push_str(&format!("\nToday is {}.", today.format("%Y-%m-%d")));
    prompt
}

fn to_message(turn: &ConversationTurn) -> ChatMessage {
    match turn.role {
        Role::User => ChatMessage::user(turn.content.clone()),
        Role::Assistant => ChatMessage::assistant(turn.content.clone()),
    }
}

/// Builds the message list for each outgoing model request.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    recent_window: usize,
    summary_params: GenerationParams,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_WINDOW, GenerationParams::summary())
    }
}

impl PromptAssembler {
    pub fn new(recent_window: usize, summary_params: GenerationParams) -> Self {
        Self {
            recent_window,
            summary_params,
        }
    }

    /// Assemble the request.
    ///
    /// Up to `recent_window` turns are sent verbatim after the persona block.
    /// Beyond that, everything older is replaced by a freshly generated summary
    /// message and only the last `recent_window` turns follow it.
    pub async fn assemble(
        &self,
        turns: &[ConversationTurn],
        running_summary: &str,
        problem: &Problem,
        today: NaiveDate,
        model: &dyn ModelService,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(persona_prompt(
            problem,
            running_summary,
            today,
        ))];

        if turns.len() <= self.recent_window {
            debug!(turns = turns.len(), "sending full history");
            messages.extend(turns.iter().map(to_message));
            return messages;
        }

        let split = turns.len() - self.recent_window;
        let (older, recent) = turns.split_at(split);
        let transcript = older
            .iter()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n");
        let summary = collect_summary(model, &transcript, &self.summary_params).await;
        debug!(
            summarized = older.len(),
            kept = recent.len(),
            "windowed history"
        );

        messages.push(ChatMessage::system(format!(
            "Summary of earlier conversation: {}",
            summary
        )));
        messages.extend(recent.iter().map(to_message));
        messages
    }
}
