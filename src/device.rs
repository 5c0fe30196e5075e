use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;

/// Opaque token identifying this installation to the remote task API.
///
/// Generated once and reused. It stands in for an account but carries no
/// authority of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn generate() -> Self {
        DeviceId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads the persisted identifier, if one has been created.
    pub fn load(path: &Path) -> Result<Option<DeviceId>> {
        match fs::read_to_string(path) {
            Ok(s) => {
                let s = s.trim();
                Ok((!s.is_empty()).then(|| DeviceId(s.to_owned())))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the persisted identifier, generating and saving one first if needed.
    pub fn load_or_create(path: &Path) -> Result<DeviceId> {
        if let Some(id) = Self::load(path)? {
            return Ok(id);
        }
        let id = Self::generate();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, &id.0)?;
        info!(path = %path.display(), "created device identifier");
        Ok(id)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        DeviceId(s)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the path of the `device_id` file, stored next to the tasks file.
pub fn device_path(db_path: &Path) -> PathBuf {
    let mut p = db_path.to_path_buf();
    p.pop();
    p.push("device_id");
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_or_create_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device_id");
        assert_eq!(DeviceId::load(&path).unwrap(), None);

        let first = DeviceId::load_or_create(&path).unwrap();
        let second = DeviceId::load_or_create(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(DeviceId::load(&path).unwrap(), Some(first));
    }

    #[test]
    fn device_file_sits_next_to_db() {
        let p = device_path(Path::new("/data/daywise/tasks.json"));
        assert_eq!(p, PathBuf::from("/data/daywise/device_id"));
    }
}
