pub mod codeteach_config;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod harness;
pub mod model;
pub mod problem;
pub mod progress;
pub mod session;
pub mod ui;
pub mod util;
