//! Interactive tutoring loop: `codeteach chat`.

use anyhow::{Context, Result, anyhow};
use console::style;
use dialoguer::Input;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use codeteach::config::Config;
use codeteach::conversation::SendOutcome;
use codeteach::session::TutorSession;
use codeteach::ui::ConsoleRenderer;
use codeteach::ui::icons::{CODE, HINT, WARN};

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatCommand {
    Ask(String),
    Hint,
    Approach,
    Explain(String),
    Optimize(String),
    Reset,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_line(line: &str) -> ChatCommand {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ChatCommand::Ask(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "hint" => ChatCommand::Hint,
        "approach" => ChatCommand::Approach,
        "explain" => ChatCommand::Explain(arg.to_string()),
        "optimize" => ChatCommand::Optimize(arg.to_string()),
        "reset" => ChatCommand::Reset,
        "help" => ChatCommand::Help,
        "quit" | "exit" => ChatCommand::Quit,
        other => ChatCommand::Unknown(other.to_string()),
    }
}

fn read_code(path: &str) -> Result<String> {
    if path.is_empty() {
        return Err(anyhow!("Expected a file path, e.g. /explain solution.py"));
    }
    std::fs::read_to_string(Path::new(path)).with_context(|| format!("Failed to read {}", path))
}

/// Read the file for `/explain` or `/optimize`, reporting failures inline.
fn load_for_review(path: &str, renderer: &mut ConsoleRenderer) -> Option<String> {
    match read_code(path) {
        Ok(code) => {
            println!("{}{}", CODE, style(path).dim());
            renderer.waiting("reading your code");
            Some(code)
        }
        Err(e) => {
            println!("{}{:#}", WARN, e);
            None
        }
    }
}

fn print_help() {
    println!("  {}            ask anything about the problem", style("<text>").cyan());
    println!("  {}            next progressive hint", style("/hint").cyan());
    println!("  {}        outline a solution strategy", style("/approach").cyan());
    println!("  {}  walk through your code", style("/explain <file>").cyan());
    println!("  {} suggest complexity improvements", style("/optimize <file>").cyan());
    println!("  {}           start the conversation over", style("/reset").cyan());
    println!("  {}            leave", style("/quit").cyan());
    println!();
}

pub async fn cmd_chat(config: &Config, problem_id: &str) -> Result<()> {
    let catalog = config.load_catalog()?;
    let problem = catalog
        .get(problem_id)
        .ok_or_else(|| anyhow!("Problem '{}' not found in catalog", problem_id))?
        .clone();

    let model = Arc::new(config.model_client());
    let mut session = TutorSession::new(config.coordinator(model));
    let mut renderer = ConsoleRenderer::new(config.verbose);

    println!();
    println!(
        "{} {}",
        style(format!("{}. {}", problem.id, problem.title)).bold(),
        style(format!("[{}]", problem.difficulty)).dim()
    );
    println!();
    println!("{}", problem.description.trim());
    println!();
    print_help();

    session.select_problem(problem).await;

    loop {
        let line: String = match Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                // EOF or a closed terminal ends the session.
                debug!(error = %e, "input closed");
                break;
            }
        };

        let outcome = match parse_line(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Quit => break,
            ChatCommand::Help => {
                print_help();
                continue;
            }
            ChatCommand::Reset => {
                session.reset().await;
                println!("{}", style("Conversation cleared.").dim());
                println!();
                continue;
            }
            ChatCommand::Unknown(name) => {
                println!("{}Unknown command '/{}'. Try /help.", WARN, name);
                continue;
            }
            ChatCommand::Ask(text) => {
                renderer.waiting("thinking");
                session.ask(&text, &mut renderer).await
            }
            ChatCommand::Hint => {
                println!("{}{}", HINT, style(format!("Hint {}", session.hint_count() + 1)).dim());
                renderer.waiting("thinking");
                session.hint(&mut renderer).await
            }
            ChatCommand::Approach => {
                renderer.waiting("thinking");
                session.approach(&mut renderer).await
            }
            ChatCommand::Explain(path) => {
                let Some(code) = load_for_review(&path, &mut renderer) else {
                    continue;
                };
                session.explain(&code, &mut renderer).await
            }
            ChatCommand::Optimize(path) => {
                let Some(code) = load_for_review(&path, &mut renderer) else {
                    continue;
                };
                session.optimize(&code, &mut renderer).await
            }
        };

        match outcome {
            Ok(SendOutcome::Faulted(e)) => warn!(error = %e, "reply failed"),
            Ok(_) => {}
            Err(e) => println!("{}{:#}", WARN, e),
        }
    }

    println!("{}", style("Goodbye.").dim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            parse_line("  why is this O(n)?  "),
            ChatCommand::Ask("why is this O(n)?".to_string())
        );
        assert_eq!(parse_line("   "), ChatCommand::Empty);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(parse_line("/hint"), ChatCommand::Hint);
        assert_eq!(parse_line("/approach"), ChatCommand::Approach);
        assert_eq!(parse_line("/reset"), ChatCommand::Reset);
        assert_eq!(parse_line("/quit"), ChatCommand::Quit);
        assert_eq!(parse_line("/exit"), ChatCommand::Quit);
        assert_eq!(
            parse_line("/explain  sol.py "),
            ChatCommand::Explain("sol.py".to_string())
        );
        assert_eq!(
            parse_line("/optimize"),
            ChatCommand::Optimize(String::new())
        );
        assert_eq!(
            parse_line("/dance"),
            ChatCommand::Unknown("dance".to_string())
        );
    }

    #[test]
    fn read_code_requires_a_path() {
        assert!(read_code("").is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sol.py");
        std::fs::write(&path, "def f(): pass\n").unwrap();
        assert_eq!(read_code(path.to_str().unwrap()).unwrap(), "def f(): pass\n");
    }
}
