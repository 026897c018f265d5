//! Current-user session.
//!
//! The acting user is whoever is named in the configuration file. A
//! [`Session`] carries that configuration through command execution and
//! writes it back when the user changes, so nothing else needs to touch
//! the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::{GatorError, Result};

/// Configuration plus the identity of the acting user.
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    path: Option<PathBuf>,
}

impl Session {
    /// A session whose changes are saved to `path`.
    pub fn persistent(config: Config, path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            path: Some(path.into()),
        }
    }

    /// A session that is never written to disk.
    pub fn ephemeral(config: Config) -> Self {
        Self { config, path: None }
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Where changes are saved, if anywhere.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Name of the current user, or `None` if nobody is logged in.
    pub fn current_user_name(&self) -> Option<&str> {
        let name = self.config.current_user_name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Make `name` the current user and persist the change.
    ///
    /// Only `current_user_name` is written back. The file is re-read first
    /// so environment overrides applied to the in-memory configuration
    /// never reach the disk.
    pub fn set_current_user(&mut self, name: &str) -> Result<()> {
        self.config.current_user_name = name.to_string();
        if let Some(path) = &self.path {
            let mut on_disk = match Config::load(path) {
                Ok(config) => config,
                Err(GatorError::Io(e)) if e.kind() == ErrorKind::NotFound => Config::default(),
                Err(e) => return Err(e),
            };
            on_disk.current_user_name = name.to_string();
            on_disk.save(path)?;
            debug!(path = %path.display(), user = name, "Saved current user");
        }
        Ok(())
    }
}
