use crate::{MetadataError, Project, Test, Tools, Wave};
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const METADATA_FILE: &str = "Tbrun.toml";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    #[serde(default)]
    pub project: Project,
    #[serde(default)]
    pub tools: Tools,
    #[serde(default)]
    pub test: Test,
    #[serde(default)]
    pub wave: Wave,
    #[serde(skip)]
    pub metadata_path: PathBuf,
}

impl Metadata {
    pub fn search_from_current() -> Result<PathBuf, MetadataError> {
        Metadata::search_from(env::current_dir()?)
    }

    pub fn search_from<T: AsRef<Path>>(from: T) -> Result<PathBuf, MetadataError> {
        for path in from.as_ref().ancestors() {
            let path = path.join(METADATA_FILE);
            if path.is_file() {
                return Ok(path);
            }
        }

        Err(MetadataError::FileNotFound)
    }

    pub fn load<T: AsRef<Path>>(path: T) -> Result<Self, MetadataError> {
        let path = path.as_ref().canonicalize()?;
        let text = std::fs::read_to_string(&path)?;
        let mut metadata: Metadata = Self::from_str(&text)?;
        metadata.metadata_path = path;
        metadata.check()?;
        debug!("Loaded metadata ({})", metadata.metadata_path.to_string_lossy());
        Ok(metadata)
    }

    /// Loads the nearest `Tbrun.toml`, or built-in defaults rooted at the current directory.
    pub fn load_or_default() -> Result<Self, MetadataError> {
        match Metadata::search_from_current() {
            Ok(path) => Metadata::load(path),
            Err(MetadataError::FileNotFound) => {
                debug!("{METADATA_FILE} is not found, using defaults");
                Ok(Metadata {
                    metadata_path: env::current_dir()?.join(METADATA_FILE),
                    ..Default::default()
                })
            }
            Err(x) => Err(x),
        }
    }

    pub fn check(&self) -> Result<(), MetadataError> {
        if self.tools.vsim.is_empty() {
            return Err(MetadataError::EmptyCommand("vsim".to_string()));
        }
        if self.tools.vlog.is_empty() {
            return Err(MetadataError::EmptyCommand("vlog".to_string()));
        }
        if self.tools.linter.is_empty() {
            return Err(MetadataError::EmptyCommand("linter".to_string()));
        }
        if self.tools.assembler.is_empty() {
            return Err(MetadataError::EmptyCommand("assembler".to_string()));
        }
        for (name, value) in self.test.timeouts() {
            if value == Some(0) {
                return Err(MetadataError::InvalidTimeout(name.to_string()));
            }
        }
        Ok(())
    }

    /// Directory relative tool paths are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        match self.metadata_path.parent() {
            Some(x) if !x.as_os_str().is_empty() => x.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn jobs(&self) -> usize {
        if self.test.jobs == 0 {
            std::thread::available_parallelism()
                .map(|x| x.get())
                .unwrap_or(1)
        } else {
            self.test.jobs
        }
    }
}

impl FromStr for Metadata {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let metadata: Metadata = toml::from_str(s)?;
        Ok(metadata)
    }
}
