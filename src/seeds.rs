use crate::error::Result;
use crate::normalize::TargetUrl;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Reads the newline-delimited seed list. Blank lines are ignored;
/// lines that do not parse as absolute URLs are skipped with a warning
/// rather than poisoning the whole run.
pub async fn load(path: &Path) -> Result<Vec<TargetUrl>> {
    let content = fs::read_to_string(path).await?;
    let mut targets = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match TargetUrl::parse(line) {
            Ok(target) => targets.push(target),
            Err(e) => log::warn!("Skipping seed line {line:?}: {e}"),
        }
    }
    Ok(targets)
}

fn backup_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    name.into()
}

/// Writes the seed file, keeping the previous content in `<file>.bak`.
/// A missing original just means there is nothing to back up.
pub async fn save_with_backup(path: &Path, content: &str) -> Result<()> {
    match fs::copy(path, backup_path(path)).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::write(path, content).await?;
    Ok(())
}

/// Restores the seed file from its `.bak` copy.
pub async fn revert(path: &Path) -> Result<()> {
    fs::copy(backup_path(path), path).await?;
    Ok(())
}
