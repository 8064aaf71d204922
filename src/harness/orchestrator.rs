//! Test harness orchestrator: `run` checks the first example, `submit` checks
//! all of them and reports the verdict to the completion tracker.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::comparator::{candidate_line, compare};
use super::interpreter::Interpreter;
use super::invocation::synthesize;
use super::parser::parse_assignments;
use crate::errors::HarnessError;
use crate::problem::{Example, Problem};
use crate::progress::CompletionTracker;
use crate::util::BusyFlag;

pub const SUCCESS_NOTICE: &str = "All test cases passed! Problem marked as completed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HarnessMode {
    Run,
    Submit,
}

impl std::fmt::Display for HarnessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessMode::Run => write!(f, "run"),
            HarnessMode::Submit => write!(f, "submit"),
        }
    }
}

/// Verdict for one example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub pass: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessReport {
    pub mode: HarnessMode,
    pub outcomes: Vec<TestOutcome>,
    /// True only when there is at least one outcome and every outcome passed.
    pub passed: bool,
    pub notice: Option<String>,
}

impl HarnessReport {
    fn new(mode: HarnessMode, outcomes: Vec<TestOutcome>) -> Self {
        let passed = !outcomes.is_empty() && outcomes.iter().all(|o| o.pass);
        Self {
            mode,
            outcomes,
            passed,
            notice: None,
        }
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.pass).count()
    }
}

/// Drives examples through the interpreter, one at a time.
pub struct TestHarness {
    interpreter: Arc<dyn Interpreter>,
    retries: u32,
    running: BusyFlag,
}

impl TestHarness {
    pub fn new(interpreter: Arc<dyn Interpreter>, retries: u32) -> Self {
        Self {
            interpreter,
            retries,
            running: BusyFlag::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_busy()
    }

    /// Check `code` against the first example only.
    ///
    /// Without examples the code runs as-is and its output becomes the
    /// report's notice.
    pub async fn run(&self, problem: &Problem, code: &str) -> Result<HarnessReport, HarnessError> {
        let _guard = self.running.try_acquire().ok_or(HarnessError::Busy)?;

        let Some(example) = problem.examples.first() else {
            info!(problem_id = %problem.id, "no examples; running code as-is");
            let output = self.execute_isolated(code).await;
            let mut report = HarnessReport::new(HarnessMode::Run, Vec::new());
            report.notice = Some(output);
            return Ok(report);
        };

        let outcome = self.check_example(problem, code, example).await;
        Ok(HarnessReport::new(HarnessMode::Run, vec![outcome]))
    }

    /// Check `code` against every example and report to `tracker`.
    ///
    /// Every example runs regardless of earlier failures. The submission is
    /// always recorded; the problem is marked completed only if all passed.
    pub async fn submit(
        &self,
        problem: &Problem,
        code: &str,
        tracker: &mut dyn CompletionTracker,
    ) -> Result<HarnessReport, HarnessError> {
        let _guard = self.running.try_acquire().ok_or(HarnessError::Busy)?;

        if problem.examples.is_empty() {
            return Err(HarnessError::NoExamples);
        }

        let mut outcomes = Vec::with_capacity(problem.examples.len());
        for example in &problem.examples {
            outcomes.push(self.check_example(problem, code, example).await);
        }
        let mut report = HarnessReport::new(HarnessMode::Submit, outcomes);
        info!(
            problem_id = %problem.id,
            passed = report.passed_count(),
            total = report.outcomes.len(),
            "submission checked"
        );

        if let Err(e) = tracker.record_submission(&problem.id, code, report.passed) {
            warn!(error = %e, "failed to record submission");
        }
        if report.passed {
            if let Err(e) = tracker.mark_completed(&problem.id) {
                warn!(error = %e, "failed to mark problem completed");
            }
            report.notice = Some(SUCCESS_NOTICE.to_string());
        } else {
            report.notice = Some(format!(
                "{}/{} test cases passed.",
                report.passed_count(),
                report.outcomes.len()
            ));
        }
        Ok(report)
    }

    async fn check_example(&self, problem: &Problem, code: &str, example: &Example) -> TestOutcome {
        let assignments = match parse_assignments(&example.input) {
            Ok(assignments) => assignments,
            Err(e) => {
                warn!(input = %example.input, error = %e, "bad example format");
                return TestOutcome {
                    input: example.input.clone(),
                    expected: example.output.clone(),
                    actual: format!("Bad example format: {}", e),
                    pass: false,
                };
            }
        };

        let program = synthesize(code, &problem.title, &assignments);
        let output = self.execute_isolated(&program).await;
        let pass = compare(self.interpreter.as_ref(), &output, &example.output).await;
        let actual = candidate_line(&output);
        debug!(input = %example.input, %actual, pass, "example checked");

        TestOutcome {
            input: example.input.clone(),
            expected: example.output.clone(),
            actual,
            pass,
        }
    }

    /// Reset, then execute. Transport failures are retried after another
    /// reset; a persistent one becomes the output text.
    async fn execute_isolated(&self, program: &str) -> String {
        let mut attempt = 0;
        loop {
            if let Err(e) = self.interpreter.reset().await {
                warn!(error = %e, "interpreter reset failed");
            }
            match self.interpreter.execute(program).await {
                Ok(execution) => return execution.output_text(),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(error = %e, attempt, "interpreter unavailable; retrying");
                }
                Err(e) => return format!("Error: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::interpreter::{PythonInterpreter, interpreter_available};
    use crate::harness::testing::{ScriptedInterpreter, Step};

    #[derive(Default)]
    struct RecordingTracker {
        submissions: Vec<(String, String, bool)>,
        completed: Vec<String>,
    }

    impl CompletionTracker for RecordingTracker {
        fn record_submission(
            &mut self,
            problem_id: &str,
            code: &str,
            passed: bool,
        ) -> anyhow::Result<()> {
            self.submissions
                .push((problem_id.to_string(), code.to_string(), passed));
            Ok(())
        }

        fn mark_completed(&mut self, problem_id: &str) -> anyhow::Result<()> {
            self.completed.push(problem_id.to_string());
            Ok(())
        }
    }

    fn two_sum(examples: &[(&str, &str)]) -> Problem {
        Problem {
            id: "1".into(),
            title: "Two Sum".into(),
            difficulty: "Easy".into(),
            description: String::new(),
            examples: examples.iter().map(|(i, o)| Example::new(*i, *o)).collect(),
            related_topics: vec![],
        }
    }

    const CODE: &str = "def two_sum(nums, target):\n    return [0, 1]\n";

    #[tokio::test]
    async fn run_checks_only_the_first_example() {
        let interpreter = Arc::new(ScriptedInterpreter::new(vec![
            Step::Out("[0, 1]\n"),
            Step::Out("True\n"),
        ]));
        let harness = TestHarness::new(interpreter.clone(), 1);
        let problem = two_sum(&[
            ("nums = [2,7,11,15], target = 9", "[0,1]"),
            ("nums = [3,2,4], target = 6", "[1,2]"),
        ]);

        let report = harness.run(&problem, CODE).await.unwrap();

        assert_eq!(report.mode, HarnessMode::Run);
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.passed);
        assert_eq!(report.outcomes[0].actual, "[0, 1]");
        assert_eq!(interpreter.programs().len(), 2);
        assert!(interpreter.programs()[0].contains("nums = [2,7,11,15]"));
        assert!(!harness.is_running());
    }

    #[tokio::test]
    async fn submit_runs_every_example_without_short_circuit() {
        let interpreter = Arc::new(ScriptedInterpreter::new(vec![
            Step::Out("[0, 1]"),
            Step::Out("True"),
            Step::Out("[0, 1]"),
            Step::Out("False"),
            Step::Out("[0, 1]"),
            Step::Out("True"),
        ]));
        let harness = TestHarness::new(interpreter, 0);
        let problem = two_sum(&[
            ("nums = [2,7,11,15], target = 9", "[0,1]"),
            ("nums = [3,2,4], target = 6", "[1,2]"),
            ("nums = [3,3], target = 6", "[0,1]"),
        ]);
        let mut tracker = RecordingTracker::default();

        let report = harness.submit(&problem, CODE, &mut tracker).await.unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.passed_count(), 2);
        assert!(!report.passed);
        assert!(!report.outcomes[1].pass);
        assert_eq!(report.notice.as_deref(), Some("2/3 test cases passed."));
        assert_eq!(tracker.submissions, vec![("1".into(), CODE.into(), false)]);
        assert!(tracker.completed.is_empty());
    }

    #[tokio::test]
    async fn passing_submit_marks_completed() {
        let interpreter = Arc::new(ScriptedInterpreter::new(vec![
            Step::Out("[0, 1]"),
            Step::Out("True"),
        ]));
        let harness = TestHarness::new(interpreter, 0);
        let problem = two_sum(&[("nums = [2,7,11,15], target = 9", "[0,1]")]);
        let mut tracker = RecordingTracker::default();

        let report = harness.submit(&problem, CODE, &mut tracker).await.unwrap();

        assert!(report.passed);
        assert_eq!(report.notice.as_deref(), Some(SUCCESS_NOTICE));
        assert_eq!(tracker.completed, vec!["1".to_string()]);
        assert!(tracker.submissions[0].2);
    }

    #[tokio::test]
    async fn each_example_starts_from_a_reset() {
        let interpreter = Arc::new(ScriptedInterpreter::new(vec![]));
        let harness = TestHarness::new(interpreter.clone(), 0);
        let problem = two_sum(&[("a = 1", "1"), ("a = 2", "2")]);

        harness
            .submit(&problem, CODE, &mut RecordingTracker::default())
            .await
            .unwrap();

        assert_eq!(interpreter.resets(), 2);
    }

    #[tokio::test]
    async fn bad_example_format_skips_the_interpreter() {
        let interpreter = Arc::new(ScriptedInterpreter::new(vec![]));
        let harness = TestHarness::new(interpreter.clone(), 0);
        let problem = two_sum(&[("nums = [2,7, target = 9", "[0,1]")]);

        let report = harness.run(&problem, CODE).await.unwrap();

        assert!(!report.passed);
        assert!(report.outcomes[0].actual.starts_with("Bad example format:"));
        assert!(interpreter.programs().is_empty());
    }

    #[tokio::test]
    async fn runtime_fault_is_an_ordinary_failure() {
        let interpreter = Arc::new(ScriptedInterpreter::new(vec![
            Step::Crash("ZeroDivisionError: division by zero"),
            Step::Out("__codeteach_incomparable__"),
        ]));
        let harness = TestHarness::new(interpreter, 0);
        let problem = two_sum(&[("nums = [1], target = 1", "[0,0]")]);

        let report = harness.run(&problem, CODE).await.unwrap();

        assert!(!report.passed);
        assert_eq!(
            report.outcomes[0].actual,
            "ZeroDivisionError: division by zero"
        );
    }

    #[tokio::test]
    async fn transport_failure_is_retried_after_reset() {
        let interpreter = Arc::new(ScriptedInterpreter::new(vec![
            Step::Down,
            Step::Out("[0, 1]"),
            Step::Out("True"),
        ]));
        let harness = TestHarness::new(interpreter.clone(), 1);
        let problem = two_sum(&[("nums = [2,7,11,15], target = 9", "[0,1]")]);

        let report = harness.run(&problem, CODE).await.unwrap();

        assert!(report.passed);
        assert_eq!(interpreter.resets(), 2);
    }

    #[tokio::test]
    async fn persistent_transport_failure_becomes_output() {
        let interpreter = Arc::new(ScriptedInterpreter::unavailable());
        let harness = TestHarness::new(interpreter, 2);
        let problem = two_sum(&[("nums = [2,7,11,15], target = 9", "[0,1]")]);

        let report = harness.run(&problem, CODE).await.unwrap();

        assert!(!report.passed);
        assert!(report.outcomes[0].actual.starts_with("Error: Interpreter could not be started"));
    }

    #[tokio::test]
    async fn run_without_examples_executes_code_as_is() {
        let interpreter = Arc::new(ScriptedInterpreter::new(vec![Step::Out("hello\n")]));
        let harness = TestHarness::new(interpreter.clone(), 0);
        let problem = two_sum(&[]);

        let report = harness.run(&problem, "print('hello')").await.unwrap();

        assert!(report.outcomes.is_empty());
        assert!(!report.passed);
        assert_eq!(report.notice.as_deref(), Some("hello\n"));
        assert_eq!(interpreter.programs(), vec!["print('hello')".to_string()]);
    }

    #[tokio::test]
    async fn submit_without_examples_is_an_error() {
        let harness = TestHarness::new(Arc::new(ScriptedInterpreter::new(vec![])), 0);
        let mut tracker = RecordingTracker::default();

        let err = harness
            .submit(&two_sum(&[]), CODE, &mut tracker)
            .await
            .unwrap_err();

        assert!(matches!(err, HarnessError::NoExamples));
        assert!(tracker.submissions.is_empty());
    }

    #[tokio::test]
    async fn python_end_to_end_two_sum() {
        if !interpreter_available("python3").await {
            eprintln!("python3 not on PATH; skipping");
            return;
        }
        let harness = TestHarness::new(Arc::new(PythonInterpreter::default()), 0);
        let problem = two_sum(&[
            ("nums = [2,7,11,15], target = 9", "[0,1]"),
            ("nums = [3,2,4], target = 6", "[1,2]"),
            ("nums = [3,3], target = 6", "[0,1]"),
        ]);
        let code = "class Solution:\n    def twoSum(self, nums, target):\n        seen = {}\n        for i, n in enumerate(nums):\n            if target - n in seen:\n                return [seen[target - n], i]\n            seen[n] = i\n";
        let mut tracker = RecordingTracker::default();

        let report = harness.submit(&problem, code, &mut tracker).await.unwrap();

        assert!(report.passed, "{:?}", report.outcomes);
        assert_eq!(report.outcomes[1].actual, "[1, 2]");
        assert_eq!(tracker.completed, vec!["1".to_string()]);

        let broken = "def two_sum(nums, target):\n    return nums[99]\n";
        let report = harness.run(&problem, broken).await.unwrap();
        assert!(!report.passed);
        assert_eq!(report.outcomes[0].actual, "Error: IndexError: list index out of range");
    }
}
