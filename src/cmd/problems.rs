//! Catalog listing: `codeteach problems`.

use anyhow::Result;
use console::style;

use codeteach::config::Config;
use codeteach::ui::report::format_problem_line;

pub fn cmd_problems(config: &Config, difficulty: Option<&str>, topic: Option<&str>) -> Result<()> {
    let catalog = config.load_catalog()?;
    let store = config.progress_store();
    let problems = catalog.filter(difficulty, topic);

    println!();
    if problems.is_empty() {
        println!("No problems match the given filters.");
        println!();
        return Ok(());
    }

    for problem in &problems {
        println!(
            "{}",
            format_problem_line(problem, store.is_completed(&problem.id))
        );
    }
    println!();
    println!(
        "{} of {} problems shown, {} completed",
        problems.len(),
        catalog.len(),
        store.completed_count()
    );

    let topics = catalog.topics();
    if !topics.is_empty() {
        println!("{} {}", style("Topics:").dim(), topics.join(", "));
    }
    println!();
    Ok(())
}
