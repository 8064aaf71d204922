//! Canned tutor requests: progressive hints, approach, explain, optimize.

const HINT_1: &str = "Give me a basic conceptual hint about how to approach this problem. \
    Label it as 'Hint 1' and keep it high-level without specific implementation details.";

const HINT_2: &str = "Give me a more specific hint building on Hint 1, focusing on the key \
    data structure or algorithm to use. Label it as 'Hint 2'.";

const HINT_3: &str = "Give me a detailed hint about the implementation approach, but still \
    without giving away the complete solution. Label it as 'Hint 3'.";

const APPROACH: &str = "What's a good approach to solve this problem? Explain the strategy \
    but don't give me the full code.";

const NO_CODE_TO_EXPLAIN: &str = "# No code to explain";
const NO_CODE_TO_OPTIMIZE: &str = "# No code to optimize";

/// Per-problem count of hint requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HintCounter {
    count: u32,
}

impl HintCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Count one more hint request and return the request text for its tier.
    pub fn next_request(&mut self) -> String {
        self.count += 1;
        hint_request(self.count)
    }

    /// Back to zero; called whenever the active problem changes.
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// The hint request for tier `tier` (1-based).
pub fn hint_request(tier: u32) -> String {
    match tier {
        0 | 1 => HINT_1.to_string(),
        2 => HINT_2.to_string(),
        3 => HINT_3.to_string(),
        n => format!(
            "Give me hint number {}, focusing on optimization or edge cases we haven't covered \
             yet. Make it build upon previous hints.",
            n
        ),
    }
}

pub fn approach_request() -> String {
    APPROACH.to_string()
}

fn code_or(code: &str, placeholder: &'static str) -> String {
    if code.trim().is_empty() {
        placeholder.to_string()
    } else {
        code.to_string()
    }
}

pub fn explain_request(code: &str) -> String {
    format!(
        "Can you explain what this code does and if it correctly solves the problem?\n\n```python\n{}\n```",
        code_or(code, NO_CODE_TO_EXPLAIN)
    )
}

pub fn optimize_request(code: &str) -> String {
    format!(
        "Can you help me optimize this code for better time/space complexity?\n\n```\n{}\n```",
        code_or(code, NO_CODE_TO_OPTIMIZE)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_three_tiers_are_labeled() {
        let mut counter = HintCounter::new();
        assert!(counter.next_request().contains("'Hint 1'"));
        assert!(counter.next_request().contains("'Hint 2'"));
        assert!(counter.next_request().contains("'Hint 3'"));
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn later_tiers_reference_their_number() {
        let mut counter = HintCounter::new();
        for _ in 0..3 {
            counter.next_request();
        }
        let fourth = counter.next_request();
        assert!(fourth.contains("hint number 4"));
        assert!(fourth.contains("edge cases"));
        assert!(hint_request(9).contains("hint number 9"));
    }

    #[test]
    fn reset_returns_to_tier_one() {
        let mut counter = HintCounter::new();
        counter.next_request();
        counter.next_request();
        counter.reset();
        assert_eq!(counter.count(), 0);
        assert!(counter.next_request().contains("'Hint 1'"));
    }

    #[test]
    fn explain_and_optimize_fence_the_code() {
        let code = "def two_sum(nums, target):\n    pass";
        let explain = explain_request(code);
        assert!(explain.contains("```python\ndef two_sum"));
        assert!(explain.ends_with("pass\n```"));

        let optimize = optimize_request(code);
        assert!(optimize.contains("time/space complexity"));
        assert!(optimize.contains("```\ndef two_sum"));
    }

    #[test]
    fn empty_editor_uses_placeholders() {
        assert!(explain_request("").contains("# No code to explain"));
        assert!(optimize_request("  \n").contains("# No code to optimize"));
    }

    #[test]
    fn approach_asks_for_strategy_only() {
        assert!(approach_request().contains("don't give me the full code"));
    }
}
