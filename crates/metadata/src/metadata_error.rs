use miette::{self, Diagnostic};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum MetadataError {
    #[diagnostic(code(MetadataError::FileIO), help(""))]
    #[error("file I/O error")]
    FileIO(#[from] std::io::Error),

    #[diagnostic(code(MetadataError::FileNotFound), help(""))]
    #[error("Tbrun.toml is not found")]
    FileNotFound,

    #[diagnostic(code(MetadataError::Deserialize), help(""))]
    #[error("toml load failed")]
    Deserialize(#[from] toml::de::Error),

    #[diagnostic(
        code(MetadataError::EmptyCommand),
        help("specify at least the executable, e.g. [\"perl\", \"Scripts/assembler.pl\"]")
    )]
    #[error("command of \"tools.{0}\" is empty")]
    EmptyCommand(String),

    #[diagnostic(code(MetadataError::InvalidTimeout), help("timeouts are seconds greater than 0"))]
    #[error("timeout \"test.{0}\" is invalid")]
    InvalidTimeout(String),
}
