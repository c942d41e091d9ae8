use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use scribe_editor::EditorConfig;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CheckConfigArgs {
    /// Config file to validate
    pub path: PathBuf,
}

pub fn check_config(args: CheckConfigArgs) -> Result<()> {
    if !args.path.exists() {
        return Err(anyhow!("Config file does not exist: {}", args.path.display()));
    }
    let source = fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let config = EditorConfig::from_json_str(&source)?;
    config.validate()?;

    println!("{} {}", "✓".green(), args.path.display());
    println!("  baseContainer:     {}", config.base_container);
    println!("  allowInlineAtRoot: {}", config.allow_inline_at_root);
    println!("  historyMaxLevels:  {}", config.history_max_levels);
    Ok(())
}
