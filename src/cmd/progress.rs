//! Progress summary: `codeteach progress`.

use anyhow::Result;

use codeteach::config::Config;
use codeteach::ui::report::{format_problem_line, format_progress};

pub fn cmd_progress(config: &Config) -> Result<()> {
    let store = config.progress_store();
    // The catalog is optional here; progress is still readable without it.
    let catalog = config.load_catalog().ok();

    println!();
    println!("Progress");
    println!("========");
    println!();
    println!("{}", format_progress(&store, catalog.as_ref().map(|c| c.len())));

    if let Some(catalog) = &catalog {
        let completed: Vec<_> = catalog
            .problems()
            .iter()
            .filter(|p| store.is_completed(&p.id))
            .collect();
        if !completed.is_empty() {
            println!();
            for problem in completed {
                println!("{}", format_problem_line(problem, true));
            }
        }
    }
    println!();
    Ok(())
}
