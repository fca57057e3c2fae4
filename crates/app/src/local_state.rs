use std::{fs, io::ErrorKind, path::PathBuf};

use engine::Session;
use tracing::warn;

use crate::error::Result;

/// JSON file holding the last signed-in session between two invocations.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The saved session, if any.
    ///
    /// A file that does not decode is reported and ignored: it gets replaced
    /// or removed by the next [`SessionFile::store`].
    pub fn load(&self) -> Result<Option<Session>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!("ignoring unreadable session file {}: {err}", self.path.display());
                Ok(None)
            }
        }
    }

    /// Write `session`, or remove the file when there is none.
    pub fn store(&self, session: Option<&Session>) -> Result<()> {
        let Some(session) = session else {
            return match fs::remove_file(&self.path) {
                Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
                _ => Ok(()),
            };
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }
}
