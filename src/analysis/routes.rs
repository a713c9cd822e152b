// Route extraction: calls shaped like `path('pattern/', view, name='...')`

use crate::analysis::report::RoutePattern;
use crate::config::RouteConfig;
use crate::parser::{walk_calls, Call, Expr, Module, Stmt};

/// Module-level variable holding a URL namespace
const NAMESPACE_VAR: &str = "app_name";

/// Recognises route-registration calls by the bare name of the callee
#[derive(Debug, Clone)]
pub struct RouteExtractor {
    functions: Vec<String>,
}

impl RouteExtractor {
    pub fn new(config: &RouteConfig) -> Self {
        Self {
            functions: config.functions.clone(),
        }
    }

    /// Extract route patterns in source order
    pub fn extract(&self, module: &Module) -> Vec<RoutePattern> {
        let mut patterns = Vec::new();
        walk_calls(&module.body, &mut |call| {
            if self.is_registration(call) {
                if let Some(route) = route(call) {
                    patterns.push(route);
                }
            }
        });
        patterns
    }

    fn is_registration(&self, call: &Call) -> bool {
        match call.func.as_ref() {
            Expr::Name(name) => self.functions.iter().any(|f| f == name),
            Expr::Attribute { .. } | Expr::Call(_) | Expr::Literal(_) | Expr::Other(_) => false,
        }
    }
}

impl Default for RouteExtractor {
    fn default() -> Self {
        Self::new(&RouteConfig::default())
    }
}

/// Build a route from a registration call; `None` without a literal pattern
fn route(call: &Call) -> Option<RoutePattern> {
    let pattern = call.args.first()?.as_literal()?.to_string();
    let view = call.args.get(1).and_then(view_reference);

    let mut name = None;
    for keyword in &call.keywords {
        if keyword.name.as_deref() == Some("name") {
            if let Some(lit) = keyword.value.as_literal() {
                name = Some(lit.to_string());
            }
        }
    }

    let params = url_params(&pattern);
    Some(RoutePattern {
        pattern,
        view,
        name,
        params,
    })
}

/// `view` for a bare name or a two-part `a.b` reference; nothing for other shapes
fn view_reference(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(name) => Some(name.clone()),
        Expr::Attribute { .. } => expr
            .as_dotted_pair()
            .map(|(object, attr)| format!("{}.{}", object, attr)),
        // `Views.as_view()` and anything else carry no static view name
        Expr::Call(_) | Expr::Literal(_) | Expr::Other(_) => None,
    }
}

/// The `app_name = '...'` namespace declared at module level, if any
pub fn namespace(module: &Module) -> Option<String> {
    let mut found = None;
    for stmt in &module.body {
        if let Stmt::Assign(assign) = stmt {
            let targets_namespace = assign
                .targets
                .iter()
                .any(|t| t.as_name() == Some(NAMESPACE_VAR));
            if targets_namespace {
                found = assign.value.as_str().map(str::to_string);
            }
        }
    }
    found
}

/// Parameter names in a URL pattern: `<conv:name>`, `<name>` and `(?P<name>...)`
pub fn url_params(pattern: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('<') {
        let is_named_group = rest[..open].ends_with("(?P");
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            break;
        };
        let inner = &after[..close];

        let name = if is_named_group {
            Some(inner)
        } else {
            match inner.split_once(':') {
                Some((converter, name)) if is_identifier(converter) => Some(name),
                Some(_) => None,
                None => Some(inner),
            }
        };
        if let Some(name) = name.filter(|n| is_identifier(n)) {
            params.push(name.to_string());
        }

        rest = &after[close + 1..];
    }

    params
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}
