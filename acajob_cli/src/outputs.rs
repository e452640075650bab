use std::{collections::BTreeMap, fs::OpenOptions, io::Write, path::PathBuf};

use super::Result;

/// Step outputs handed back to the calling pipeline
///
/// Values are appended as `name=value` lines to the runner's output file
/// (when there is one) and kept in memory for callers of the library.
#[derive(Debug, Default)]
pub struct Outputs {
    file: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl Outputs {
    pub fn new(file: Option<PathBuf>) -> Outputs {
        Outputs {
            file,
            values: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        info!("Output {}={}", name, value);
        if let Some(pth) = &self.file {
            let mut f = OpenOptions::new().create(true).append(true).open(pth)?;
            writeln!(f, "{}={}", name, value)?;
        }
        self.values.insert(name.into(), value.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}
