//! Conversation context management.
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`history`] | Ordered turn log, running summary, summarization status |
//! | [`policy`] | Folds the oldest exchange into the running summary |
//! | [`prompt`] | Persona block plus bounded recent history |
//! | [`coordinator`] | One streamed model call at a time, committed to history |
//! | [`templates`] | Progressive hints and canned tutor requests |

pub mod coordinator;
pub mod history;
pub mod policy;
pub mod prompt;
pub mod templates;

pub use coordinator::{
    BUSY_NOTICE, ChatCoordinator, SendOutcome, Speaker, Transcript, TranscriptEntry,
    TranscriptEvent, TranscriptSink,
};
pub use history::{ConversationState, ConversationTurn, Role, SummarizationStatus};
pub use policy::SummarizationPolicy;
pub use prompt::PromptAssembler;
pub use templates::HintCounter;
