/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{remove_file, File},
    os::unix::fs::MetadataExt,
    path::{Path, PathBuf},
};

use crate::{err, impl_error, ErrorGeneric, ErrorTrait, Result};

#[derive(Debug)]
pub enum LockError {
    Locked(String),
    NotAcquired,
}

impl Display for LockError {
    fn fmt(&self, fmter: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Locked(lock) => write!(fmter, "Lock file is present: '{}'", lock),
            Self::NotAcquired => write!(fmter, "Lock not acquired"),
        }
    }
}

impl_error!(LockError);

/// Advisory, ctime-stamped lock scoped to a single instance directory
/// (`<instance>/.lock`), serializing `edit` against `run` startup per
/// the concurrency model.
pub struct Lock {
    lock: PathBuf,
    time: i64,
}

impl Lock {
    pub fn new(instance_dir: &Path) -> Self {
        Self {
            lock: instance_dir.join(".lock"),
            time: 0,
        }
    }

    pub fn lock(mut self) -> Result<Self> {
        if self.exists() {
            err!(LockError::Locked(self.lock.display().to_string()))?
        }

        File::create(&self.lock).prepend(|| format!("Failed to create lock file '{}'", self.lock.display()))?;
        self.time = self
            .lock
            .metadata()
            .prepend(|| format!("Failed to acquire metadata on lock file '{}'", self.lock.display()))?
            .ctime();
        Ok(self)
    }

    pub fn assert(&self) -> Result<()> {
        if !self.exists()
            || self
                .lock
                .metadata()
                .prepend(|| format!("Failed to acquire metadata on lock file '{}'", self.lock.display()))?
                .ctime()
                != self.time
        {
            err!(LockError::NotAcquired)?
        }

        Ok(())
    }

    pub fn unlock(&self) -> Result<()> {
        if !self.exists() {
            return Ok(());
        }

        Ok(remove_file(&self.lock).prepend(|| format!("Failed to remove lock file '{}'", self.lock.display()))?)
    }

    pub fn exists(&self) -> bool {
        self.lock.exists()
    }
}
