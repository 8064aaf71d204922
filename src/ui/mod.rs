pub mod chat;
pub mod icons;
pub mod report;

pub use chat::ConsoleRenderer;
