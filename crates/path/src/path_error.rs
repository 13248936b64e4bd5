use miette::{self, Diagnostic};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PathError {
    #[diagnostic(code(PathError::FileIO), help(""))]
    #[error("file I/O error")]
    FileIO(#[from] std::io::Error),

    #[diagnostic(
        code(PathError::AreaNotFound),
        help("pass a directory containing \"designs\" and \"tests\"")
    )]
    #[error("directory \"{}\" does not exist", .0.to_string_lossy())]
    AreaNotFound(PathBuf),
}
