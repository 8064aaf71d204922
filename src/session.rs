//! Tutor session: the single owner of conversation state, hint progression,
//! the active problem, and the visible transcript.

use anyhow::{Result, anyhow};
use tracing::info;

use crate::conversation::templates::{approach_request, explain_request, optimize_request};
use crate::conversation::{
    ChatCoordinator, HintCounter, SendOutcome, Transcript, TranscriptEvent, TranscriptSink,
};
use crate::problem::Problem;

/// Forwards events to the display while recording the visible transcript.
struct Tee<'a> {
    transcript: &'a mut Transcript,
    display: &'a mut dyn TranscriptSink,
}

impl TranscriptSink for Tee<'_> {
    fn publish(&mut self, event: TranscriptEvent) {
        self.transcript.publish(event.clone());
        self.display.publish(event);
    }
}

pub struct TutorSession {
    coordinator: ChatCoordinator,
    hints: HintCounter,
    problem: Option<Problem>,
    transcript: Transcript,
}

impl TutorSession {
    pub fn new(coordinator: ChatCoordinator) -> Self {
        Self {
            coordinator,
            hints: HintCounter::new(),
            problem: None,
            transcript: Transcript::new(),
        }
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn hint_count(&self) -> u32 {
        self.hints.count()
    }

    pub fn coordinator(&self) -> &ChatCoordinator {
        &self.coordinator
    }

    /// Make `problem` the active one. The hint counter always restarts;
    /// switching to a different problem also starts a fresh conversation.
    pub async fn select_problem(&mut self, problem: Problem) {
        let changed = self.problem.as_ref().is_none_or(|p| p.id != problem.id);
        if changed && self.problem.is_some() {
            self.coordinator.clear().await;
            self.transcript.clear();
        }
        info!(problem_id = %problem.id, title = %problem.title, "problem selected");
        self.hints.reset();
        self.problem = Some(problem);
    }

    /// Clear the conversation, the transcript and the hint counter.
    pub async fn reset(&mut self) {
        self.coordinator.clear().await;
        self.transcript.clear();
        self.hints.reset();
    }

    /// A visible free-form message.
    pub async fn ask(
        &mut self,
        text: &str,
        display: &mut dyn TranscriptSink,
    ) -> Result<SendOutcome> {
        self.dispatch(text, false, display).await
    }

    /// The next progressive hint.
    pub async fn hint(&mut self, display: &mut dyn TranscriptSink) -> Result<SendOutcome> {
        self.require_problem()?;
        let request = self.hints.next_request();
        self.dispatch(&request, true, display).await
    }

    pub async fn approach(&mut self, display: &mut dyn TranscriptSink) -> Result<SendOutcome> {
        self.dispatch(&approach_request(), true, display).await
    }

    pub async fn explain(
        &mut self,
        code: &str,
        display: &mut dyn TranscriptSink,
    ) -> Result<SendOutcome> {
        self.dispatch(&explain_request(code), true, display).await
    }

    pub async fn optimize(
        &mut self,
        code: &str,
        display: &mut dyn TranscriptSink,
    ) -> Result<SendOutcome> {
        self.dispatch(&optimize_request(code), true, display).await
    }

    fn require_problem(&self) -> Result<()> {
        match self.problem {
            Some(_) => Ok(()),
            None => Err(anyhow!("No problem selected")),
        }
    }

    async fn dispatch(
        &mut self,
        request: &str,
        hidden: bool,
        display: &mut dyn TranscriptSink,
    ) -> Result<SendOutcome> {
        let problem = self
            .problem
            .as_ref()
            .ok_or_else(|| anyhow!("No problem selected"))?;
        let mut tee = Tee {
            transcript: &mut self.transcript,
            display,
        };
        Ok(self.coordinator.send(request, hidden, problem, &mut tee).await)
    }
}
