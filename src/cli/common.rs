//! Common utilities shared across CLI commands.

use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Read a snippet from `path`, or from stdin when `path` is `-`.
pub fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read source from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Write a rendered document to `output`, or to stdout.
pub fn write_document(output: Option<&Path>, html: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{html}")?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Display name of a source path for status lines.
pub fn display_name(path: &Path) -> String {
    if path == Path::new("-") {
        return "<stdin>".to_owned();
    }
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
