// Analysis module: discover model and route files, extract, aggregate

pub mod discovery;
pub mod models;
pub mod report;
pub mod routes;

pub use discovery::*;
pub use models::*;
pub use report::*;
pub use routes::{namespace, url_params, RouteExtractor};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::{Module, SourceFile, SourceParser};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Orchestrates discovery, parsing and extraction for a whole project
pub struct ProjectAnalyzer {
    config: Config,
    models: ModelExtractor,
    routes: RouteExtractor,
    verbose: bool,
}

impl ProjectAnalyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        // Fail early if the grammar cannot be loaded at all
        SourceParser::new()?;

        Ok(Self {
            models: ModelExtractor::new(&config.models),
            routes: RouteExtractor::new(&config.routes),
            config,
            verbose: false,
        })
    }

    /// Show a progress bar while extracting
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Analyze the project rooted at `root`
    pub fn analyze(&self, root: &Path) -> Result<AnalysisReport> {
        let root = resolve_root(root)?;
        let mut report = AnalysisReport::new();

        // Models
        let model_files = self.discover(&root, &self.config.discovery.model_file, &mut report);
        let extracted = self.extract_all(&model_files, |file, module| {
            self.models.extract(module, &file.dir_name())
        });
        let mut origins: HashMap<String, PathBuf> = HashMap::new();
        for (path, outcome) in extracted {
            match outcome {
                Ok(records) => {
                    for record in records {
                        let key = record.qualified_name.clone();
                        if report.insert_model(record).is_some() {
                            warn!(
                                model = %key,
                                previous = %origins.get(&key).map(|p| p.display().to_string()).unwrap_or_default(),
                                current = %path.display(),
                                "model redefined, keeping the later definition"
                            );
                        }
                        origins.insert(key, path.clone());
                    }
                }
                Err(e) => record_failure(&mut report, path, e),
            }
        }

        // Routes
        let route_files = self.discover(&root, &self.config.discovery.route_file, &mut report);
        let extracted = self.extract_all(&route_files, |_, module| {
            (namespace(module), self.routes.extract(module))
        });
        for (path, outcome) in extracted {
            match outcome {
                Ok((namespace, patterns)) => report.push_routes(RouteFile {
                    path,
                    namespace,
                    patterns,
                }),
                Err(e) => record_failure(&mut report, path, e),
            }
        }

        info!(
            models = report.models().len(),
            route_files = report.routes.len(),
            routes = report.route_count(),
            parse_errors = report.parse_errors.len(),
            skipped = report.skipped.len(),
            "analysis complete"
        );
        Ok(report)
    }

    /// Collect every file named `target`, recording unreadable subtrees
    fn discover(&self, root: &Path, target: &str, report: &mut AnalysisReport) -> Vec<PathBuf> {
        let discovery = FileDiscovery::new(root, target, &self.config.discovery.exclude_dirs);
        let mut files = Vec::new();
        for item in discovery.iter() {
            match item {
                Ok(path) => {
                    debug!(path = %path.display(), "discovered");
                    files.push(path);
                }
                Err(Error::WalkDir(e)) => {
                    warn!(path = ?e.path(), error = %e, "skipping unreadable subtree");
                    report.skipped.push(SkippedPath {
                        path: e.path().map(Path::to_path_buf),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "skipping unreadable subtree");
                    report.skipped.push(SkippedPath {
                        path: None,
                        reason: e.to_string(),
                    });
                }
            }
        }
        files
    }

    /// Read, parse and extract each file in parallel; results keep file order
    fn extract_all<T, F>(&self, files: &[PathBuf], extract: F) -> Vec<(PathBuf, Result<T>)>
    where
        T: Send,
        F: Fn(&SourceFile, &Module) -> T + Sync,
    {
        let progress = if self.verbose {
            let pb = ProgressBar::new(files.len() as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            ) {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let results = files
            .par_iter()
            .map_init(SourceParser::new, |parser, path| {
                progress.set_message(path.display().to_string());
                let outcome = match parser {
                    Ok(parser) => SourceFile::read(path).and_then(|file| {
                        let module = parser.parse(&file.text)?;
                        debug!(path = %path.display(), "parsed");
                        Ok(extract(&file, &module))
                    }),
                    Err(e) => Err(Error::parser(e.to_string())),
                };
                progress.inc(1);
                (path.clone(), outcome)
            })
            .collect();

        progress.finish_and_clear();
        results
    }
}

/// Canonicalise the root; a missing or non-directory root is fatal
fn resolve_root(root: &Path) -> Result<PathBuf> {
    let resolved = root
        .canonicalize()
        .map_err(|_| Error::PathNotFound(root.to_path_buf()))?;
    if !resolved.is_dir() {
        return Err(Error::InvalidPath(root.to_path_buf()));
    }
    // An unlistable root is fatal rather than a skipped subtree
    std::fs::read_dir(&resolved)?;
    Ok(resolved)
}

fn record_failure(report: &mut AnalysisReport, path: PathBuf, error: Error) {
    warn!(path = %path.display(), error = %error, "file contributes nothing");
    report.parse_errors.push(FileFailure {
        path,
        message: error.to_string(),
    });
}
