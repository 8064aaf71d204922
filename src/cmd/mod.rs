//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled   |
//! |-------------|--------------------|
//! | `problems`  | `Problems`         |
//! | `chat`      | `Chat`             |
//! | `run`       | `Run`, `Submit`    |
//! | `progress`  | `Progress`         |
//! | `config`    | `Config`           |

pub mod chat;
pub mod config;
pub mod problems;
pub mod progress;
pub mod run;

pub use chat::cmd_chat;
pub use config::cmd_config;
pub use problems::cmd_problems;
pub use progress::cmd_progress;
pub use run::cmd_run;
