use crate::error::PersistError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";
const CANVAS_FILE: &str = "canvas.png";
const DATA_DIR_ENV: &str = "PIXELPAD_DATA_DIR";

/// Saved session state as read back from disk.
#[derive(Debug, Default, PartialEq)]
pub struct StoredState {
    pub settings_json: Option<String>,
    pub canvas_png: Option<Vec<u8>>,
}

impl StoredState {
    pub fn is_empty(&self) -> bool {
        self.settings_json.is_none() && self.canvas_png.is_none()
    }
}

/// Directory holding `settings.json` and `canvas.png`.
#[derive(Clone, Debug)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$PIXELPAD_DATA_DIR`, or `.pixelpad` in the working directory.
    pub fn default_dir() -> PathBuf {
        match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(".pixelpad"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read whatever was saved; missing files are not an error.
    pub fn load(&self) -> Result<StoredState, PersistError> {
        Ok(StoredState {
            settings_json: read_optional(&self.dir.join(SETTINGS_FILE))?
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
            canvas_png: read_optional(&self.dir.join(CANVAS_FILE))?,
        })
    }

    pub fn save(&self, settings_json: &str, canvas_png: &[u8]) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(SETTINGS_FILE), settings_json)?;
        fs::write(self.dir.join(CANVAS_FILE), canvas_png)?;
        log::debug!("saved session to {}", self.dir.display());
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, PersistError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pixelpad-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_files_load_as_empty() {
        let storage = Storage::new(scratch_dir("empty"));
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = scratch_dir("roundtrip");
        let storage = Storage::new(&dir);
        storage.save("{\"brush_size\": 3}", &[1, 2, 3]).unwrap();
        let state = storage.load().unwrap();
        assert_eq!(state.settings_json.as_deref(), Some("{\"brush_size\": 3}"));
        assert_eq!(state.canvas_png, Some(vec![1, 2, 3]));
        let _ = fs::remove_dir_all(dir);
    }
}
