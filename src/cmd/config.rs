//! Configuration view and validation commands: `codeteach config`.

use anyhow::Result;

use codeteach::codeteach_config::{CONFIG_DIR, CONFIG_FILE, CodeteachConfig, CodeteachToml};

use super::super::ConfigCommands;

fn print_toml(toml: &CodeteachToml) {
    println!("[model]");
    println!("  endpoint = \"{}\"", toml.model.endpoint);
    println!("  name = \"{}\"", toml.model.name);
    println!("  api_key_env = \"{}\"", toml.model.api_key_env);
    println!(
        "  chat = {{ temperature = {}, max_tokens = {} }}",
        toml.model.chat.temperature, toml.model.chat.max_tokens
    );
    println!(
        "  summary = {{ temperature = {}, max_tokens = {} }}",
        toml.model.summary.temperature, toml.model.summary.max_tokens
    );
    println!();

    println!("[conversation]");
    println!(
        "  summarize_after_user_turns = {}",
        toml.conversation.summarize_after_user_turns
    );
    println!("  recent_window = {}", toml.conversation.recent_window);
    println!();

    println!("[harness]");
    println!("  python_cmd = \"{}\"", toml.harness.python_cmd);
    println!("  retries = {}", toml.harness.retries);
    println!();

    println!("[storage]");
    println!("  problems_file = \"{}\"", toml.storage.problems_file.display());
    println!("  progress_file = \"{}\"", toml.storage.progress_file.display());
    println!();
}

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    let config_dir = project_dir.join(CONFIG_DIR);
    let config_path = config_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Codeteach Configuration");
            println!("=======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
                println!();
                print_toml(&CodeteachToml::load(&config_path)?);
            } else {
                println!("No codeteach.toml found at {}", config_path.display());
                println!();
                println!("Using default configuration:");
                println!();
                print_toml(&CodeteachToml::default());
                println!("Run 'codeteach config init' to create a codeteach.toml file.");
                println!();
            }

            // Show effective values (including env overrides)
            println!("Effective values (with env overrides):");
            let config = CodeteachConfig::new(project_dir.to_path_buf())?;
            println!("  model endpoint = \"{}\"", config.model_endpoint());
            println!("  model name = \"{}\"", config.model_name());
            println!("  python_cmd = \"{}\"", config.python_cmd());
            println!(
                "  api key = {}",
                if config.api_key().is_some() { "set" } else { "not set" }
            );
            println!("  problems file = {}", config.problems_file().display());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No codeteach.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = CodeteachToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("codeteach.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !config_dir.exists() {
                std::fs::create_dir_all(&config_dir)?;
            }

            let toml = CodeteachToml::default();
            toml.save(&config_path)?;

            println!("Created codeteach.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [model] endpoint, name, api_key_env, chat and summary sampling");
            println!("  - [conversation] summarize_after_user_turns, recent_window");
            println!("  - [harness] python_cmd, retries");
            println!("  - [storage] problems_file, progress_file");
            println!();
        }
    }

    Ok(())
}
