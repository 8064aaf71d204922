//! Code execution against a problem's examples: `codeteach run` and
//! `codeteach submit`.

use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tracing::info;

use codeteach::config::Config;
use codeteach::errors::HarnessError;
use codeteach::harness::HarnessMode;
use codeteach::ui::icons::WARN;
use codeteach::ui::report::format_report;

pub async fn cmd_run(config: &Config, problem_id: &str, file: &Path, mode: HarnessMode) -> Result<()> {
    let catalog = config.load_catalog()?;
    let problem = catalog
        .get(problem_id)
        .ok_or_else(|| anyhow!("Problem '{}' not found in catalog", problem_id))?;
    let code = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let harness = config.harness();
    println!();
    println!("{} {}: {}", mode, problem.id, problem.title);
    println!();

    let report = match mode {
        HarnessMode::Run => harness.run(problem, &code).await,
        HarnessMode::Submit => {
            let mut store = config.progress_store();
            harness.submit(problem, &code, &mut store).await
        }
    };

    let report = match report {
        Ok(report) => report,
        Err(HarnessError::NoExamples) => {
            println!("{}No test cases available for this problem.", WARN);
            println!();
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        problem_id = %problem.id,
        %mode,
        passed = report.passed,
        passed_count = report.passed_count(),
        total = report.outcomes.len(),
        "harness finished"
    );
    println!("{}", format_report(&report));
    println!();
    Ok(())
}
