use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FILE_PREFIX: &str = "trade-import";
pub const LATEST_FILE_NAME: &str = "trade-import-latest.sql";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub sql_file: PathBuf,
    pub latest_link: PathBuf,
}

/// Writes `contents` to `<dir>/trade-import-<timestamp>.sql` and points the latest alias at it
pub fn write_backup<Tz>(dir: &Path, contents: &str, now: &DateTime<Tz>) -> io::Result<BackupArtifact>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    fs::create_dir_all(dir)?;

    let file_name = format!("{}-{}.sql", FILE_PREFIX, now.format("%Y%m%d_%H%M%S"));
    let sql_file = dir.join(&file_name);
    fs::write(&sql_file, contents)?;
    info!(path = %sql_file.display(), bytes = contents.len(), "SQL script written");

    let latest_link = dir.join(LATEST_FILE_NAME);
    refresh_latest_link(&latest_link, Path::new(&file_name))?;
    info!(link = %latest_link.display(), target = %file_name, "Latest alias refreshed");

    Ok(BackupArtifact { sql_file, latest_link })
}

// symlink_metadata sees the link itself, so dangling links are removed too
fn refresh_latest_link(link: &Path, target: &Path) -> io::Result<()> {
    if fs::symlink_metadata(link).is_ok() {
        debug!(link = %link.display(), "Removing previous latest alias");
        fs::remove_file(link)?;
    }
    create_symlink(target, link)
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// First `max_lines` lines of a script, for the console preview
pub fn preview(contents: &str, max_lines: usize) -> String {
    contents.lines().take(max_lines).collect::<Vec<_>>().join("\n")
}
