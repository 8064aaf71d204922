//! Example-driven code execution harness.
//!
//! A `run`/`submit` flows through [`orchestrator::TestHarness`]:
//! example input → [`parser`] → [`invocation`] → [`interpreter`] →
//! [`comparator`] → [`orchestrator::HarnessReport`].

pub mod comparator;
pub mod interpreter;
pub mod invocation;
pub mod orchestrator;
pub mod parser;

pub use interpreter::{Execution, Interpreter, PythonInterpreter};
pub use orchestrator::{HarnessMode, HarnessReport, TestHarness, TestOutcome};
