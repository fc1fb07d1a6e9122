//! Script output
//!
//! Writes a generated script, one terminated statement per line.

use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::error::Result;
use crate::schema::generator::MigrationScript;

/// Write the script to the configured file and return the path written
pub fn write_script(script: &MigrationScript, config: &OutputConfig) -> Result<PathBuf> {
    let path = script_path(config);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(&path)?);
    write_to(script, &mut writer)?;
    writer.flush()?;

    tracing::info!(path = %path.display(), statements = script.len(), "Wrote migration script");
    Ok(path)
}

/// Write the script to any sink, e.g. stdout
pub fn write_to<W: Write>(script: &MigrationScript, writer: &mut W) -> Result<()> {
    for statement in script.lines() {
        writeln!(writer, "{}", statement)?;
    }
    Ok(())
}

/// Resolve the output path, prefixing the file name with a timestamp when asked
pub fn script_path(config: &OutputConfig) -> PathBuf {
    let path = Path::new(&config.path);
    if !config.timestamped {
        return path.to_path_buf();
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "update_script.sql".to_string());

    path.with_file_name(format!("{}_{}", generate_script_id(), file_name))
}

/// Script ID based on the current UTC time
fn generate_script_id() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn script() -> MigrationScript {
        MigrationScript {
            statements: vec![
                "START TRANSACTION;".to_string(),
                "DROP TABLE `legacy`;".to_string(),
                "COMMIT;".to_string(),
            ],
        }
    }

    #[test]
    fn writes_one_statement_per_line() {
        let dir = tempdir().unwrap();
        let config = OutputConfig {
            path: dir.path().join("nested/update_script.sql").display().to_string(),
            timestamped: false,
        };

        let path = write_script(&script(), &config).unwrap();

        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "START TRANSACTION;\nDROP TABLE `legacy`;\nCOMMIT;\n"
        );
    }

    #[test]
    fn timestamped_path_keeps_directory_and_name() {
        let config = OutputConfig {
            path: "scripts/update_script.sql".to_string(),
            timestamped: true,
        };

        let path = script_path(&config);

        assert_eq!(path.parent(), Some(Path::new("scripts")));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_update_script.sql"));
        assert_eq!(name.len(), "20240101120000_update_script.sql".len());
    }

    #[test]
    fn write_to_accepts_any_sink() {
        let mut buffer = Vec::new();

        write_to(&script(), &mut buffer).unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 3);
    }
}
