// Report types produced by a project analysis

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::path::PathBuf;

/// A declared storage field on a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDeclaration {
    pub name: String,
    /// Constructor name used to declare the field, e.g. `CharField`
    #[serde(rename = "type")]
    pub field_type: String,
    /// False when declared with `null=True` or `blank=True`
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
}

impl FieldDeclaration {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            required: true,
            max_length: None,
        }
    }

    pub fn with_max_length(mut self, max_length: u64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Kind of a relation field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelationKind {
    ForeignKey,
    OneToOneField,
    ManyToManyField,
}

impl RelationKind {
    /// Kind for a field constructor name
    pub fn from_constructor(name: &str) -> Option<Self> {
        match name {
            "ForeignKey" => Some(RelationKind::ForeignKey),
            "OneToOneField" => Some(RelationKind::OneToOneField),
            "ManyToManyField" => Some(RelationKind::ManyToManyField),
            _ => None,
        }
    }
}

/// A relation field pointing at another model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub field: String,
    pub kind: RelationKind,
    /// Target as written, without quotes: `Category`, `auth.User`, `self`
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_name: Option<String>,
}

/// A custom manager attached to a model, e.g. `objects = ProductManager()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub manager_type: String,
}

impl ManagerDeclaration {
    pub fn new(name: &str, manager_type: &str) -> Self {
        Self {
            name: name.to_string(),
            manager_type: manager_type.to_string(),
        }
    }
}

/// A class recognised as a data-model declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRecord {
    /// `app.Name`
    pub qualified_name: String,
    pub app: String,
    pub name: String,
    pub fields: Vec<FieldDeclaration>,
    pub methods: Vec<String>,
    pub relations: Vec<Relation>,
    pub managers: Vec<ManagerDeclaration>,
    /// `abstract = True` in the inner `Meta` class
    pub is_abstract: bool,
}

impl ModelRecord {
    pub fn new(app: &str, name: &str) -> Self {
        Self {
            qualified_name: format!("{}.{}", app, name),
            app: app.to_string(),
            name: name.to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            relations: Vec::new(),
            managers: Vec::new(),
            is_abstract: false,
        }
    }
}

/// A route registration with a literal pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutePattern {
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parameter names captured by the pattern, in pattern order
    pub params: Vec<String>,
}

/// Route patterns found in one file, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteFile {
    pub path: PathBuf,
    /// Module-level `app_name`, if declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub patterns: Vec<RoutePattern>,
}

/// A file that contributed nothing because it could not be read or parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// A directory subtree the walk could not enter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPath {
    pub path: Option<PathBuf>,
    pub reason: String,
}

/// Everything found in one analysis run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// Models keyed by qualified name, in first-insertion order
    #[serde(serialize_with = "serialize_models")]
    models: Vec<ModelRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    pub routes: Vec<RouteFile>,
    pub parse_errors: Vec<FileFailure>,
    pub skipped: Vec<SkippedPath>,
}

impl AnalysisReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a model, replacing any model with the same qualified name.
    /// A replaced model keeps its original position and is returned.
    pub fn insert_model(&mut self, record: ModelRecord) -> Option<ModelRecord> {
        match self.index.get(&record.qualified_name) {
            Some(&slot) => Some(std::mem::replace(&mut self.models[slot], record)),
            None => {
                self.index
                    .insert(record.qualified_name.clone(), self.models.len());
                self.models.push(record);
                None
            }
        }
    }

    /// Look up a model by qualified name
    pub fn model(&self, qualified_name: &str) -> Option<&ModelRecord> {
        self.index.get(qualified_name).map(|&slot| &self.models[slot])
    }

    /// All models in aggregation order
    pub fn models(&self) -> &[ModelRecord] {
        &self.models
    }

    /// Append a file's routes; files without patterns are not recorded
    pub fn push_routes(&mut self, file: RouteFile) {
        if !file.patterns.is_empty() {
            self.routes.push(file);
        }
    }

    /// Total route patterns across all files
    pub fn route_count(&self) -> usize {
        self.routes.iter().map(|f| f.patterns.len()).sum()
    }
}

fn serialize_models<S: Serializer>(models: &[ModelRecord], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(models.len()))?;
    for model in models {
        map.serialize_entry(&model.qualified_name, model)?;
    }
    map.end()
}
