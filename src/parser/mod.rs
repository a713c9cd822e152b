// Parser module for turning Python source into a syntax tree

pub mod ast;
mod python;

pub use ast::*;
pub use python::SourceParser;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// A source file read from disk
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    /// Read a file as UTF-8 text
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    /// Name of the directory containing this file
    pub fn dir_name(&self) -> String {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}
