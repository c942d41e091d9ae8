use crate::config::SessionArgs;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use scribe_editor::Command;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Fixture file: markup with `[` and `]` selection markers
    pub file: PathBuf,

    /// Command as JSON, e.g. '{"type":"SplitBlock"}' (repeatable)
    #[arg(short, long = "command", required = true)]
    pub commands: Vec<String>,

    #[command(flatten)]
    pub session: SessionArgs,
}

pub fn run(args: RunArgs, cwd: &Path) -> Result<()> {
    let commands = args
        .commands
        .iter()
        .map(|raw| {
            serde_json::from_str::<Command>(raw).with_context(|| format!("Invalid command: {}", raw))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut editor = args.session.open(&args.file, cwd)?;
    for (index, command) in commands.iter().enumerate() {
        if let Err(err) = editor.execute(command) {
            if !args.session.json {
                eprintln!("  {} {} - {}", "✗".red(), command.name(), err.to_string().red());
            }
            return Err(anyhow!("Command #{} ({}) failed: {}", index + 1, command.name(), err));
        }
        if !args.session.json {
            eprintln!("  {} {}", "✓".green(), command.name());
        }
    }
    info!(commands = commands.len(), "commands applied");

    args.session.print(&editor)
}
