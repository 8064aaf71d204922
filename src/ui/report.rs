//! Plain-text rendering of harness reports, problem lists and progress.

use console::style;

use crate::harness::{HarnessMode, HarnessReport, TestOutcome};
use crate::problem::Problem;
use crate::progress::ProgressStore;
use crate::ui::icons::{CHECK, CROSS, SPARKLE};

fn difficulty_label(difficulty: &str) -> String {
    match difficulty.to_lowercase().as_str() {
        "easy" => style(difficulty).green().to_string(),
        "medium" => style(difficulty).yellow().to_string(),
        "hard" => style(difficulty).red().to_string(),
        _ => difficulty.to_string(),
    }
}

pub fn format_outcome(index: usize, outcome: &TestOutcome) -> String {
    let (icon, verdict) = if outcome.pass {
        (CHECK, style("passed").green())
    } else {
        (CROSS, style("failed").red())
    };
    format!(
        "{}Test case {} {}\n    Input:    {}\n    Expected: {}\n    Actual:   {}",
        icon,
        index + 1,
        verdict,
        outcome.input,
        outcome.expected,
        outcome.actual
    )
}

pub fn format_report(report: &HarnessReport) -> String {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .enumerate()
        .map(|(i, o)| format_outcome(i, o))
        .collect();

    match (report.mode, &report.notice) {
        (HarnessMode::Run, Some(output)) if report.outcomes.is_empty() => {
            lines.push(format!(
                "{}\n{}",
                style("No test cases available; program output:").dim(),
                output.trim_end()
            ));
        }
        (HarnessMode::Submit, Some(notice)) if report.passed => {
            lines.push(format!("{}{}", SPARKLE, style(notice).green().bold()));
        }
        (_, Some(notice)) => lines.push(notice.clone()),
        (_, None) => {}
    }
    lines.join("\n")
}

pub fn format_problem_line(problem: &Problem, completed: bool) -> String {
    let mark = if completed { CHECK.to_string() } else { "   ".to_string() };
    format!(
        "{}{:>5}  {}  [{}]",
        mark,
        problem.id,
        problem.title,
        difficulty_label(&problem.difficulty)
    )
}

pub fn format_progress(store: &ProgressStore, total_problems: Option<usize>) -> String {
    let mut lines = vec![match total_problems {
        Some(total) => format!("Completed: {}/{}", store.completed_count(), total),
        None => format!("Completed: {}", store.completed_count()),
    }];
    lines.push(format!("Attempted: {}", store.attempted_count()));
    if let Some(last) = store.last_access() {
        lines.push(format!(
            "Last activity: {}",
            last.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    lines.join("\n")
}
