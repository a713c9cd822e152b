// Model extraction: classes shaped like `class X(models.Model)`

use crate::analysis::report::{
    FieldDeclaration, ManagerDeclaration, ModelRecord, Relation, RelationKind,
};
use crate::config::ModelConfig;
use crate::parser::{walk_classes, Assign, Call, ClassDef, Expr, Literal, Module, Stmt};

const META_CLASS: &str = "Meta";
const MANAGER_SUFFIX: &str = "Manager";
const AS_MANAGER: &str = "as_manager";

/// Recognises data-model classes purely by the written shape of their bases
#[derive(Debug, Clone)]
pub struct ModelExtractor {
    module_alias: String,
    base_class: String,
    field_suffix: String,
}

impl ModelExtractor {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            module_alias: config.module_alias.clone(),
            base_class: config.base_class.clone(),
            field_suffix: config.field_suffix.clone(),
        }
    }

    /// Extract every model class in `module`; `app` is the containing directory name
    pub fn extract(&self, module: &Module, app: &str) -> Vec<ModelRecord> {
        let mut records = Vec::new();
        walk_classes(&module.body, &mut |class| {
            if self.is_model(class) {
                records.push(self.record(class, app));
            }
        });
        records
    }

    /// True if any direct base is `<alias>.<Base>` or a bare `<Base>`
    pub fn is_model(&self, class: &ClassDef) -> bool {
        class.bases.iter().any(|base| match base {
            Expr::Attribute { .. } => base
                .as_dotted_pair()
                .map_or(false, |(object, attr)| {
                    object == self.module_alias && attr == self.base_class
                }),
            Expr::Name(name) => *name == self.base_class,
            Expr::Call(_) | Expr::Literal(_) | Expr::Other(_) => false,
        })
    }

    fn record(&self, class: &ClassDef, app: &str) -> ModelRecord {
        let mut record = ModelRecord::new(app, &class.name);

        for stmt in &class.body {
            match stmt {
                Stmt::Assign(assign) => self.assignment(assign, &mut record),
                Stmt::FunctionDef(func) => record.methods.push(func.name.clone()),
                Stmt::ClassDef(inner) if inner.name == META_CLASS => {
                    if let Some(is_abstract) = meta_abstract(inner) {
                        record.is_abstract = is_abstract;
                    }
                }
                Stmt::ClassDef(_) | Stmt::Expr(_) | Stmt::Other { .. } => {}
            }
        }

        record
    }

    /// Record a class-body assignment as fields, relations and managers
    fn assignment(&self, assign: &Assign, record: &mut ModelRecord) {
        let Expr::Call(call) = &assign.value else {
            return;
        };
        let names: Vec<&str> = assign.targets.iter().filter_map(Expr::as_name).collect();

        if let Some(field_type) = self.field_type(call) {
            for name in &names {
                record.fields.push(field_declaration(name, field_type, call));
            }
        }

        if let (Some(kind), Some(target)) = (self.relation_kind(call), relation_target(call)) {
            let related_name = keyword(call, "related_name")
                .and_then(Expr::as_str)
                .map(str::to_string);
            for name in &names {
                record.relations.push(Relation {
                    field: name.to_string(),
                    kind,
                    target: target.clone(),
                    related_name: related_name.clone(),
                });
            }
        }

        if let Some(manager_type) = self.manager_type(call) {
            for name in &names {
                record.managers.push(ManagerDeclaration::new(name, manager_type));
            }
        }
    }

    /// Callee name if the call is `<alias>.<Name><suffix>(...)`
    fn field_type<'a>(&self, call: &'a Call) -> Option<&'a str> {
        let (object, callee) = call.func.as_dotted_pair()?;
        if object == self.module_alias && callee.ends_with(&self.field_suffix) {
            Some(callee)
        } else {
            None
        }
    }

    fn relation_kind(&self, call: &Call) -> Option<RelationKind> {
        let (object, callee) = call.func.as_dotted_pair()?;
        if object != self.module_alias {
            return None;
        }
        RelationKind::from_constructor(callee)
    }

    /// `XManager()`, `<alias>.Manager()` or `XQuerySet.as_manager()`
    fn manager_type<'a>(&self, call: &'a Call) -> Option<&'a str> {
        if let Expr::Name(name) = call.func.as_ref() {
            return name.ends_with(MANAGER_SUFFIX).then_some(name.as_str());
        }
        let (object, attr) = call.func.as_dotted_pair()?;
        if attr == AS_MANAGER {
            Some(object)
        } else if object == self.module_alias && attr.ends_with(MANAGER_SUFFIX) {
            Some(attr)
        } else {
            None
        }
    }
}

fn keyword<'a>(call: &'a Call, name: &str) -> Option<&'a Expr> {
    call.keywords
        .iter()
        .find(|k| k.name.as_deref() == Some(name))
        .map(|k| &k.value)
}

fn is_true(value: Option<&Expr>) -> bool {
    matches!(value, Some(Expr::Literal(Literal::Bool(true))))
}

fn field_declaration(name: &str, field_type: &str, call: &Call) -> FieldDeclaration {
    let mut field = FieldDeclaration::new(name, field_type);
    field.required = !(is_true(keyword(call, "null")) || is_true(keyword(call, "blank")));
    field.max_length = match keyword(call, "max_length") {
        Some(Expr::Literal(Literal::Number(n))) => n.replace('_', "").parse().ok(),
        _ => None,
    };
    field
}

/// First positional argument or `to=`: a string, a bare name or `app.Model`
fn relation_target(call: &Call) -> Option<String> {
    let target = call.args.first().or_else(|| keyword(call, "to"))?;
    match target {
        Expr::Literal(Literal::Str(s)) => Some(s.clone()),
        Expr::Name(name) => Some(name.clone()),
        Expr::Attribute { .. } => target
            .as_dotted_pair()
            .map(|(object, attr)| format!("{}.{}", object, attr)),
        Expr::Call(_) | Expr::Literal(_) | Expr::Other(_) => None,
    }
}

/// `abstract = True|False` in a `Meta` class; the last assignment wins
fn meta_abstract(meta: &ClassDef) -> Option<bool> {
    let mut found = None;
    for stmt in &meta.body {
        let Stmt::Assign(assign) = stmt else {
            continue;
        };
        if assign.targets.iter().any(|t| t.as_name() == Some("abstract")) {
            if let Expr::Literal(Literal::Bool(value)) = &assign.value {
                found = Some(*value);
            }
        }
    }
    found
}

impl Default for ModelExtractor {
    fn default() -> Self {
        Self::new(&ModelConfig::default())
    }
}
