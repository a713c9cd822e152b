//! Djangoscope - Extract Django models and URL routes from a codebase
//!
//! Scans `models.py` and `urls.py` files, recognises model classes and route
//! registrations purely by the shape of their syntax tree, and reports them
//! without executing any of the scanned code.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;

// Re-export main types
pub use analysis::{
    AnalysisReport, FieldDeclaration, FileDiscovery, ManagerDeclaration, ModelExtractor,
    ModelRecord, ProjectAnalyzer, Relation, RelationKind, RouteExtractor, RouteFile,
    RoutePattern,
};
pub use config::Config;
pub use error::{Error, Result};
pub use output::{render_json, render_text};
pub use parser::{SourceFile, SourceParser};
