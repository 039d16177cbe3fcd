use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectNameError {
    #[error("failed to read object name file: {0}")]
    Io(#[from] io::Error),
}

/// Translation table from 16-bit object IDs to human-readable names,
/// loaded from an optional side file of `<decimal id>,<name>` lines.
///
/// The file is loaded once at session start; its absence is not an error
/// and IDs simply render numerically.
#[derive(Debug, Default)]
pub struct ObjectNameTable {
    names: HashMap<u16, String>,
}

impl ObjectNameTable {
    pub fn new() -> Self {
        ObjectNameTable::default()
    }

    pub fn insert(&mut self, id: u16, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Load `<decimal id>,<name>` pairs, one per line. Blank lines and
    /// lines starting with `#` are skipped; malformed lines are logged and
    /// skipped rather than failing the load.
    pub fn load_from_file(path: &Path) -> Result<Self, ObjectNameError> {
        let contents = fs::read_to_string(path)?;
        let mut table = ObjectNameTable::new();
        for (lineno, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((id_part, name_part)) = line.split_once(',') else {
                warn!("{}:{}: no comma separator, skipping", path.display(), lineno + 1);
                continue;
            };
            match id_part.trim().parse::<u16>() {
                Ok(id) => {
                    table.names.insert(id, name_part.trim().to_string());
                }
                Err(_) => {
                    warn!(
                        "{}:{}: bad object id {:?}, skipping",
                        path.display(),
                        lineno + 1,
                        id_part
                    );
                }
            }
        }
        debug!("loaded {} object names from {}", table.names.len(), path.display());
        Ok(table)
    }

    /// Render an object ID: the null sentinel 0xFFFF is "No object", known
    /// IDs use their loaded name, everything else falls back to hex.
    pub fn render(&self, id: u16) -> String {
        if id == 0xFFFF {
            return "No object".to_string();
        }
        match self.names.get(&id) {
            Some(name) => name.clone(),
            None => format!("Object ID 0x{:04X}", id),
        }
    }
}
