use crate::config::SessionArgs;
use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Fixture file to normalize
    pub file: PathBuf,

    #[command(flatten)]
    pub session: SessionArgs,
}

/// Opening a fixture already runs every normalize handler
pub fn normalize(args: NormalizeArgs, cwd: &Path) -> Result<()> {
    let editor = args.session.open(&args.file, cwd)?;
    args.session.print(&editor)
}
