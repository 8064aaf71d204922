//! Shared UI icons.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("\u{2705} ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("\u{274c} ", "[FAIL]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("\u{2728} ", "*");
pub static WARN: Emoji<'_, '_> = Emoji("\u{26a0}\u{fe0f}  ", "[!]");

// Conversation
pub static TUTOR: Emoji<'_, '_> = Emoji("\u{1f393} ", "tutor>");
pub static HINT: Emoji<'_, '_> = Emoji("\u{1f4a1} ", "[hint]");
pub static CODE: Emoji<'_, '_> = Emoji("\u{1f4dd} ", "[code]");
