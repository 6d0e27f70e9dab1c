//! Configuration view and initialization commands: `kanban config`.

use anyhow::Result;

use kanban::config::{KanbanToml, Settings};

use super::super::ConfigCommands;

pub fn cmd_config(settings: &Settings, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = Settings::project_config_path(&settings.project_dir);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Kanban Configuration");
            println!("====================");
            println!();
            match &settings.source {
                Some(path) => println!("Config file: {}", path.display()),
                None => {
                    println!("No kanban.toml found, using defaults.");
                    println!("Run 'kanban config init' to create one.");
                }
            }
            println!();
            println!("Effective values (with env/CLI overrides):");
            println!();
            print!("{}", settings.redacted_toml()?);
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("kanban.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            KanbanToml::default().save(&config_path)?;

            println!("Created kanban.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [api] base_url, token, timeout_secs");
            println!("  - [reorder] cross_scope_numbering, reject_out_of_range");
            println!("  - [logging] level, format, dir");
            println!();
        }
    }

    Ok(())
}
