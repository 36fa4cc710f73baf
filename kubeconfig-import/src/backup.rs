use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use console::style;
use log::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Snapshot {
    Present(Vec<u8>),
    /// The file did not exist when the backup was taken.
    Absent,
}

/// The raw contents of a kubeconfig, captured before anything touches it.
#[derive(Debug, Clone)]
pub struct Backup {
    path: PathBuf,
    snapshot: Snapshot,
}

impl Backup {
    pub fn capture(path: &Path) -> Result<Self> {
        let snapshot = match fs::read(path) {
            Ok(data) => Snapshot::Present(data),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Snapshot::Absent,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading kubeconfig: {}", path.display()))
            }
        };
        match &snapshot {
            Snapshot::Present(data) => {
                debug!("backed up {} bytes of {}", data.len(), path.display())
            }
            Snapshot::Absent => debug!("{} does not exist yet", path.display()),
        }
        Ok(Self {
            path: path.to_path_buf(),
            snapshot,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot to `<path>_<timestamp>` and returns where it went.
    /// Nothing is written when the file was absent.
    pub fn save_copy(&self) -> Result<Option<PathBuf>> {
        let data = match &self.snapshot {
            Snapshot::Present(data) => data,
            Snapshot::Absent => return Ok(None),
        };
        let now = Local::now().format("%Y%m%dT%H%M%S");
        let mut copy = self.path.clone().into_os_string();
        copy.push(format!("_{now}"));
        let copy = PathBuf::from(copy);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&copy)
            .and_then(|mut f| f.write_all(data))
            .with_context(|| format!("writing backup copy: {}", copy.display()))?;
        Ok(Some(copy))
    }

    /// Puts the file back exactly as it was captured.
    pub fn restore(&self) -> Result<()> {
        match &self.snapshot {
            Snapshot::Present(data) => {
                let mut file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&self.path)
                    .with_context(|| format!("opening kubeconfig: {}", self.path.display()))?;
                file.write_all(data)
                    .with_context(|| format!("writing kubeconfig: {}", self.path.display()))?;
            }
            Snapshot::Absent => match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("removing kubeconfig: {}", self.path.display())
                    })
                }
            },
        }
        Ok(())
    }
}

/// Restores its backup when dropped, unless [`RollbackGuard::commit`] was called first.
#[derive(Debug)]
pub struct RollbackGuard {
    backup: Option<Backup>,
}

impl RollbackGuard {
    pub fn new(backup: Backup) -> Self {
        Self {
            backup: Some(backup),
        }
    }

    pub fn commit(mut self) {
        self.backup = None;
    }
}

impl Drop for RollbackGuard {
    fn drop(&mut self) {
        if let Some(backup) = self.backup.take() {
            println!("{}", style(">> Rollback").red());
            if let Err(err) = backup.restore() {
                error!("error on rollback: {:#}", err);
            }
        }
    }
}
