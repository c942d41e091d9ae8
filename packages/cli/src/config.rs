use anyhow::{Context, Result};
use clap::Args;
use scribe_editor::{Editor, EditorBuilder, EditorConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::{Path, PathBuf};

/// Options shared by every command that opens a fixture
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Config file (defaults to scribe.config.json in the current directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the resulting tree as JSON
    #[arg(long)]
    pub json: bool,
}

impl SessionArgs {
    pub fn load_config(&self, cwd: &Path) -> Result<EditorConfig> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| cwd.join(DEFAULT_CONFIG_NAME));
        EditorConfig::load(&path).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Build an editor over the content of `file`
    pub fn open(&self, file: &Path, cwd: &Path) -> Result<Editor> {
        let config = self.load_config(cwd)?;
        let source = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let editor = EditorBuilder::new()
            .config(config)
            .content(source.trim_end())
            .build()
            .with_context(|| format!("Failed to open {}", file.display()))?;
        Ok(editor)
    }

    pub fn print(&self, editor: &Editor) -> Result<()> {
        if self.json {
            let output = serde_json::json!({
                "markup": editor.markup_with_selection(),
                "content": editor.content(),
                "tree": editor.snapshot(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", editor.markup_with_selection());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session(config: Option<PathBuf>) -> SessionArgs {
        SessionArgs {
            config,
            json: false,
        }
    }

    #[test]
    fn test_missing_default_config_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = session(None).load_config(temp_dir.path()).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_open_fixture() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("fixture.html");
        fs::write(&file, "<p>a[]b</p>\n").unwrap();

        let editor = session(None).open(&file, temp_dir.path()).unwrap();
        assert_eq!(editor.markup_with_selection(), "<p>a[]b</p>");
    }

    #[test]
    fn test_open_with_explicit_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("custom.json");
        fs::write(&config, r#"{ "baseContainer": "DIV" }"#).unwrap();
        let file = temp_dir.path().join("fixture.html");
        fs::write(&file, "<div>x[]</div>").unwrap();

        let editor = session(Some(config)).open(&file, temp_dir.path()).unwrap();
        assert_eq!(editor.base_container().tag().node_name(), "DIV");
        assert_eq!(
            editor.markup_with_selection(),
            "<div class=\"o-paragraph\">x[]</div>"
        );
    }

    #[test]
    fn test_invalid_config_fails_open() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "baseContainer": "SPAN" }"#,
        )
        .unwrap();
        let file = temp_dir.path().join("fixture.html");
        fs::write(&file, "<p>a</p>").unwrap();
        assert!(session(None).open(&file, temp_dir.path()).is_err());
    }
}
