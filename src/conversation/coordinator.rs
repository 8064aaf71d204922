//! Streaming response coordinator.
//!
//! One [`ChatCoordinator::send`] runs the whole turn pipeline: append the
//! request, run the summarization policy, assemble the prompt, stream the
//! model reply to a [`TranscriptSink`], and commit the final text to history.
//! A second `send` while one is in flight is rejected with a visible notice.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::history::{ConversationState, Role};
use super::policy::SummarizationPolicy;
use super::prompt::PromptAssembler;
use crate::model::{GenerationParams, ModelService, StreamItem};
use crate::problem::Problem;
use crate::util::BusyFlag;

/// Notice published when `send` is called while a response is streaming.
pub const BUSY_NOTICE: &str = "A response is already being generated; wait for it to finish.";

/// What the coordinator hands to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// A visible user request was accepted.
    UserMessage(String),
    /// The reply so far, republished after every fragment.
    Delta { text_so_far: String },
    /// The reply was committed to history.
    Finished { text: String, hidden: bool },
    /// A system-role notice (faults, rejections).
    Notice(String),
}

/// Consumer of transcript events.
pub trait TranscriptSink: Send {
    fn publish(&mut self, event: TranscriptEvent);
}

/// Author of a visible transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// The visible transcript: user messages, non-hidden replies and notices.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn push(&mut self, speaker: Speaker, text: String) {
        self.entries.push(TranscriptEntry { speaker, text });
    }
}

impl TranscriptSink for Transcript {
    fn publish(&mut self, event: TranscriptEvent) {
        match event {
            TranscriptEvent::UserMessage(text) => self.push(Speaker::User, text),
            TranscriptEvent::Finished {
                text,
                hidden: false,
            } => self.push(Speaker::Assistant, text),
            TranscriptEvent::Notice(text) => self.push(Speaker::System, text),
            TranscriptEvent::Finished { hidden: true, .. } | TranscriptEvent::Delta { .. } => {}
        }
    }
}

/// How a `send` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank request; nothing happened.
    Ignored,
    /// Another response was in flight.
    Rejected,
    /// The reply was committed as an assistant turn.
    Completed(String),
    /// The model call failed; a notice was published.
    Faulted(String),
}

/// Owns the conversation state and drives one model call at a time.
pub struct ChatCoordinator {
    model: Arc<dyn ModelService>,
    state: Mutex<ConversationState>,
    policy: SummarizationPolicy,
    assembler: PromptAssembler,
    chat_params: GenerationParams,
    in_flight: BusyFlag,
}

impl ChatCoordinator {
    pub fn new(model: Arc<dyn ModelService>) -> Self {
        Self::with_settings(
            model,
            SummarizationPolicy::default(),
            PromptAssembler::default(),
            GenerationParams::chat(),
        )
    }

    pub fn with_settings(
        model: Arc<dyn ModelService>,
        policy: SummarizationPolicy,
        assembler: PromptAssembler,
        chat_params: GenerationParams,
    ) -> Self {
        Self {
            model,
            state: Mutex::new(ConversationState::new()),
            policy,
            assembler,
            chat_params,
            in_flight: BusyFlag::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// A copy of the current conversation state.
    pub async fn snapshot(&self) -> ConversationState {
        self.state.lock().await.clone()
    }

    /// Forget all turns and the running summary.
    pub async fn clear(&self) {
        self.state.lock().await.clear();
        info!("conversation cleared");
    }

    /// Send `request` about `problem` and stream the reply into `sink`.
    ///
    /// Hidden requests and their replies are stored like any other turn but
    /// are never published as transcript entries; their deltas are still
    /// published for live display.
    pub async fn send(
        &self,
        request: &str,
        hidden: bool,
        problem: &Problem,
        sink: &mut dyn TranscriptSink,
    ) -> SendOutcome {
        if request.trim().is_empty() {
            debug!("blank request ignored");
            return SendOutcome::Ignored;
        }

        let Some(_guard) = self.in_flight.try_acquire() else {
            warn!("request rejected: response already in flight");
            sink.publish(TranscriptEvent::Notice(BUSY_NOTICE.to_string()));
            return SendOutcome::Rejected;
        };

        {
            let mut state = self.state.lock().await;
            if hidden {
                state.append_hidden(Role::User, request.to_string());
            } else {
                state.append(Role::User, request.to_string());
            }
        }
        if !hidden {
            sink.publish(TranscriptEvent::UserMessage(request.to_string()));
        }

        self.policy.apply(&self.state, self.model.as_ref()).await;

        let (turns, running_summary) = {
            let state = self.state.lock().await;
            (state.turns().to_vec(), state.running_summary().to_string())
        };
        let messages = self
            .assembler
            .assemble(
                &turns,
                &running_summary,
                problem,
                Local::now().date_naive(),
                self.model.as_ref(),
            )
            .await;
        debug!(messages = messages.len(), hidden, "prompt assembled");

        let mut stream = match self.model.open_stream(&messages, &self.chat_params).await {
            Ok(stream) => stream,
            Err(e) => return self.fault(e.to_string(), sink),
        };

        let mut text = String::new();
        loop {
            match stream.next().await {
                StreamItem::Fragment(fragment) => {
                    text.push_str(&fragment);
                    sink.publish(TranscriptEvent::Delta {
                        text_so_far: text.clone(),
                    });
                }
                StreamItem::Completed => break,
                StreamItem::Fault(e) => return self.fault(e.to_string(), sink),
            }
        }

        {
            let mut state = self.state.lock().await;
            if hidden {
                state.append_hidden(Role::Assistant, text.clone());
            } else {
                state.append(Role::Assistant, text.clone());
            }
        }
        info!(chars = text.len(), hidden, "response committed");
        sink.publish(TranscriptEvent::Finished {
            text: text.clone(),
            hidden,
        });
        SendOutcome::Completed(text)
    }

    fn fault(&self, message: String, sink: &mut dyn TranscriptSink) -> SendOutcome {
        warn!(error = %message, "response generation failed");
        let notice = format!("Sorry, there was an error generating a response: {}", message);
        sink.publish(TranscriptEvent::Notice(notice.clone()));
        SendOutcome::Faulted(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ModelError;
    use crate::model::testing::{Reply, ScriptedModel};
    use crate::model::{ChatMessage, MessageRole, StreamHandle, StreamSender};
    use async_trait::async_trait;

    fn problem() -> Problem {
        Problem {
            id: "1".into(),
            title: "Two Sum".into(),
            difficulty: "Easy".into(),
            description: "Find two numbers.".into(),
            examples: vec![],
            related_topics: vec![],
        }
    }

    fn coordinator(replies: Vec<Reply>) -> (Arc<ScriptedModel>, ChatCoordinator) {
        let model = Arc::new(ScriptedModel::new(replies));
        let coordinator = ChatCoordinator::new(model.clone());
        (model, coordinator)
    }

    #[derive(Default)]
    struct Recorder(Vec<TranscriptEvent>);

    impl TranscriptSink for Recorder {
        fn publish(&mut self, event: TranscriptEvent) {
            self.0.push(event);
        }
    }

    #[tokio::test]
    async fn visible_request_streams_and_commits() {
        let (model, coordinator) = coordinator(vec![Reply::Fragments(vec!["Use ", "a map."])]);
        let mut events = Recorder::default();

        let outcome = coordinator
            .send("How do I start?", false, &problem(), &mut events)
            .await;

        assert_eq!(outcome, SendOutcome::Completed("Use a map.".into()));
        assert_eq!(
            events.0,
            vec![
                TranscriptEvent::UserMessage("How do I start?".into()),
                TranscriptEvent::Delta {
                    text_so_far: "Use ".into()
                },
                TranscriptEvent::Delta {
                    text_so_far: "Use a map.".into()
                },
                TranscriptEvent::Finished {
                    text: "Use a map.".into(),
                    hidden: false
                },
            ]
        );

        let state = coordinator.snapshot().await;
        assert_eq!(state.len(), 2);
        assert_eq!(state.turns()[1].content, "Use a map.");

        let (messages, params) = model.call(0);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1], ChatMessage::user("How do I start?"));
        assert_eq!(params, GenerationParams::chat());
        assert!(!coordinator.is_busy());
    }

    #[tokio::test]
    async fn hidden_request_updates_history_but_not_transcript() {
        let (_model, coordinator) = coordinator(vec![Reply::Fragments(vec!["Hint 1: think."])]);
        let mut transcript = Transcript::new();

        let outcome = coordinator
            .send("Give me a hint", true, &problem(), &mut transcript)
            .await;

        assert!(matches!(outcome, SendOutcome::Completed(_)));
        assert!(transcript.is_empty());

        let state = coordinator.snapshot().await;
        assert_eq!(state.len(), 2);
        assert!(state.turns().iter().all(|t| t.hidden));
        assert_eq!(state.turns()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn hidden_reply_is_context_for_the_next_request() {
        let (model, coordinator) = coordinator(vec![
            Reply::Fragments(vec!["Hint 1: sort first."]),
            Reply::Fragments(vec!["Sure."]),
        ]);
        let mut transcript = Transcript::new();

        coordinator
            .send("hint please", true, &problem(), &mut transcript)
            .await;
        coordinator
            .send("Why sort?", false, &problem(), &mut transcript)
            .await;

        let (messages, _) = model.call(1);
        assert!(
            messages
                .iter()
                .any(|m| m.content == "Hint 1: sort first.")
        );
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.entries()[0].speaker, Speaker::User);
        assert_eq!(transcript.entries()[1].text, "Sure.");
    }

    #[tokio::test]
    async fn mid_stream_fault_commits_notice_only() {
        let (_model, coordinator) = coordinator(vec![Reply::FaultAfter(vec!["partial"])]);
        let mut transcript = Transcript::new();

        let outcome = coordinator
            .send("Question", false, &problem(), &mut transcript)
            .await;

        let SendOutcome::Faulted(notice) = outcome else {
            panic!("expected fault");
        };
        assert!(notice.starts_with("Sorry, there was an error generating a response:"));
        assert!(notice.contains("connection reset"));

        let state = coordinator.snapshot().await;
        assert_eq!(state.len(), 1);
        assert_eq!(state.turns()[0].role, Role::User);

        let last = transcript.entries().last().unwrap();
        assert_eq!(last.speaker, Speaker::System);
        assert!(!coordinator.is_busy());
    }

    #[tokio::test]
    async fn refused_call_is_reported_as_notice() {
        let (_model, coordinator) = coordinator(vec![Reply::Refuse]);
        let mut transcript = Transcript::new();

        let outcome = coordinator
            .send("Question", false, &problem(), &mut transcript)
            .await;

        assert!(matches!(outcome, SendOutcome::Faulted(n) if n.contains("model not loaded")));
        assert_eq!(transcript.len(), 2);
    }

    #[tokio::test]
    async fn blank_request_is_ignored() {
        let (model, coordinator) = coordinator(vec![]);
        let mut transcript = Transcript::new();

        let outcome = coordinator.send("   ", false, &problem(), &mut transcript).await;

        assert_eq!(outcome, SendOutcome::Ignored);
        assert!(coordinator.snapshot().await.is_empty());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn fourth_user_turn_triggers_summarization_before_prompt() {
        let (model, coordinator) = coordinator(vec![
            Reply::Fragments(vec!["a1"]),
            Reply::Fragments(vec!["a2"]),
            Reply::Fragments(vec!["a3"]),
            Reply::Fragments(vec!["Asked q1."]),
            Reply::Fragments(vec!["a4"]),
        ]);
        let mut transcript = Transcript::new();

        for q in ["q1", "q2", "q3", "q4"] {
            coordinator.send(q, false, &problem(), &mut transcript).await;
        }

        let state = coordinator.snapshot().await;
        assert_eq!(state.user_turn_count(), 3);
        assert_eq!(state.running_summary(), "Asked q1.");
        assert_eq!(state.turns()[0].content, "q2");

        // Summary call precedes the main call, and the main prompt carries it.
        assert_eq!(model.call_count(), 5);
        let (summary_call, params) = model.call(3);
        assert!(summary_call[1].content.contains("USER: q1"));
        assert_eq!(params, GenerationParams::summary());
        let (main_call, _) = model.call(4);
        assert!(main_call[0].content.contains("Asked q1."));
    }

    #[tokio::test]
    async fn zero_threshold_still_sends_the_newest_request() {
        let model = Arc::new(ScriptedModel::new(vec![
            Reply::Fragments(vec!["a1"]),
            Reply::Fragments(vec!["Asked a first question."]),
            Reply::Fragments(vec!["a2"]),
        ]));
        let coordinator = ChatCoordinator::with_settings(
            model.clone(),
            SummarizationPolicy::new(0, GenerationParams::summary()),
            PromptAssembler::default(),
            GenerationParams::chat(),
        );
        let mut transcript = Transcript::new();

        coordinator
            .send("my question", false, &problem(), &mut transcript)
            .await;
        assert_eq!(model.call_count(), 1);
        let (main_call, _) = model.call(0);
        assert_eq!(main_call.last(), Some(&ChatMessage::user("my question")));

        coordinator
            .send("follow up", false, &problem(), &mut transcript)
            .await;
        assert_eq!(model.call_count(), 3);
        let (main_call, _) = model.call(2);
        assert_eq!(main_call.last(), Some(&ChatMessage::user("follow up")));
        assert!(main_call[0].content.contains("Asked a first question."));

        let state = coordinator.snapshot().await;
        assert_eq!(state.user_turn_count(), 1);
        assert_eq!(state.turns()[0].content, "follow up");
    }

    #[tokio::test]
    async fn clear_resets_history() {
        let (_model, coordinator) = coordinator(vec![]);
        let mut transcript = Transcript::new();
        coordinator.send("hello", false, &problem(), &mut transcript).await;

        coordinator.clear().await;
        assert!(coordinator.snapshot().await.is_empty());
    }

    /// Hands out a stream whose sender the test controls.
    struct HeldModel {
        sender: std::sync::Mutex<Option<StreamSender>>,
        opened: tokio::sync::Notify,
    }

    #[async_trait]
    impl ModelService for HeldModel {
        async fn open_stream(
            &self,
            _messages: &[ChatMessage],
            _params: &GenerationParams,
        ) -> Result<StreamHandle, ModelError> {
            let (sender, handle) = StreamHandle::channel();
            *self.sender.lock().unwrap() = Some(sender);
            self.opened.notify_one();
            Ok(handle)
        }
    }

    #[tokio::test]
    async fn overlapping_send_is_rejected_with_notice() {
        let model = Arc::new(HeldModel {
            sender: std::sync::Mutex::new(None),
            opened: tokio::sync::Notify::new(),
        });
        let coordinator = Arc::new(ChatCoordinator::new(model.clone()));

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                let mut transcript = Transcript::new();
                coordinator
                    .send("first", false, &problem(), &mut transcript)
                    .await
            })
        };
        model.opened.notified().await;
        assert!(coordinator.is_busy());

        let mut events = Recorder::default();
        let second = coordinator
            .send("second", false, &problem(), &mut events)
            .await;
        assert_eq!(second, SendOutcome::Rejected);
        assert_eq!(events.0, vec![TranscriptEvent::Notice(BUSY_NOTICE.into())]);

        let sender = model.sender.lock().unwrap().take().unwrap();
        sender.fragment("done");
        sender.complete();

        assert_eq!(
            first.await.unwrap(),
            SendOutcome::Completed("done".into())
        );
        assert!(!coordinator.is_busy());
        assert_eq!(coordinator.snapshot().await.user_turn_count(), 1);
    }
}
