// Syntax tree for parsed Python code
//
// A closed set of node kinds: only the shapes the extractors care about get
// their own variant. Everything else is kept as `Other` with its children, so
// walks still reach calls and classes nested inside unrecognised constructs.

use std::fmt;

/// A parsed Python module
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub body: Vec<Stmt>,
}

/// A statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    ClassDef(ClassDef),
    FunctionDef(FunctionDef),
    Assign(Assign),
    Expr(Expr),
    /// Any other statement: nested blocks in `body`, everything else in `exprs`
    Other { body: Vec<Stmt>, exprs: Vec<Expr> },
}

/// A class definition
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    /// Positional base-class expressions, as written
    pub bases: Vec<Expr>,
    pub decorators: Vec<Expr>,
    pub body: Vec<Stmt>,
    /// 1-based line of the `class` keyword
    pub line: usize,
}

/// A function or method definition
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub is_async: bool,
    pub decorators: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

/// A plain assignment: `a = b = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub targets: Vec<Expr>,
    pub value: Expr,
}

/// An expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Attribute { value: Box<Expr>, attr: String },
    Call(Call),
    Literal(Literal),
    /// Any other expression, with its sub-expressions in source order
    Other(Vec<Expr>),
}

/// A call expression
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub func: Box<Expr>,
    pub args: Vec<Expr>,
    pub keywords: Vec<Keyword>,
    pub line: usize,
}

/// A `name=value` call argument; `**mapping` has no name
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: Option<String>,
    pub value: Expr,
}

/// A literal constant
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Bytes(Vec<u8>),
    /// Numeric literal, kept as written
    Number(String),
    Bool(bool),
    None,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => f.write_str(s),
            Literal::Bytes(bytes) => write_bytes_repr(f, bytes),
            Literal::Number(n) => f.write_str(n),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::None => f.write_str("None"),
        }
    }
}

/// Bytes rendered the way Python prints them: `b'...'`
fn write_bytes_repr(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') {
        '"'
    } else {
        '\''
    };
    write!(f, "b{}", quote)?;
    for &byte in bytes {
        match byte {
            b'\\' => f.write_str("\\\\")?,
            b'\t' => f.write_str("\\t")?,
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b if b as char == quote => write!(f, "\\{}", quote)?,
            0x20..=0x7e => write!(f, "{}", byte as char)?,
            _ => write!(f, "\\x{:02x}", byte)?,
        }
    }
    write!(f, "{}", quote)
}

impl Expr {
    /// Identifier name, if this is a bare name
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expr::Name(name) => Some(name),
            _ => None,
        }
    }

    /// `(object, attr)` if this is `object.attr` with a bare-name object
    pub fn as_dotted_pair(&self) -> Option<(&str, &str)> {
        match self {
            Expr::Attribute { value, attr } => value.as_name().map(|object| (object, attr.as_str())),
            _ => None,
        }
    }

    /// Literal value, if this is a literal constant
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expr::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Literal string value, if this is a string literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expr::Literal(Literal::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Direct sub-expressions in source order
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Name(_) | Expr::Literal(_) => Vec::new(),
            Expr::Attribute { value, .. } => vec![value.as_ref()],
            Expr::Call(call) => {
                let mut out = vec![call.func.as_ref()];
                out.extend(call.args.iter());
                out.extend(call.keywords.iter().map(|k| &k.value));
                out
            }
            Expr::Other(children) => children.iter().collect(),
        }
    }
}

impl Stmt {
    /// Direct sub-expressions in source order (not descending into nested statements)
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            Stmt::ClassDef(class) => class.decorators.iter().chain(class.bases.iter()).collect(),
            Stmt::FunctionDef(func) => func.decorators.iter().collect(),
            Stmt::Assign(assign) => {
                let mut out: Vec<&Expr> = assign.targets.iter().collect();
                out.push(&assign.value);
                out
            }
            Stmt::Expr(expr) => vec![expr],
            Stmt::Other { exprs, .. } => exprs.iter().collect(),
        }
    }

    /// Nested statements (class/function bodies and compound statement blocks)
    pub fn body(&self) -> &[Stmt] {
        match self {
            Stmt::ClassDef(class) => &class.body,
            Stmt::FunctionDef(func) => &func.body,
            Stmt::Other { body, .. } => body,
            Stmt::Assign(_) | Stmt::Expr(_) => &[],
        }
    }
}

/// Visit every class definition, depth-first in source order
pub fn walk_classes<'a>(stmts: &'a [Stmt], visit: &mut impl FnMut(&'a ClassDef)) {
    for stmt in stmts {
        if let Stmt::ClassDef(class) = stmt {
            visit(class);
        }
        walk_classes(stmt.body(), visit);
    }
}

/// Visit every call expression, depth-first in source order.
///
/// A call is visited before the calls nested in its arguments, and a
/// statement's own expressions before the statements nested in it.
pub fn walk_calls<'a>(stmts: &'a [Stmt], visit: &mut impl FnMut(&'a Call)) {
    for stmt in stmts {
        for expr in stmt.exprs() {
            walk_expr_calls(expr, visit);
        }
        walk_calls(stmt.body(), visit);
    }
}

fn walk_expr_calls<'a>(expr: &'a Expr, visit: &mut impl FnMut(&'a Call)) {
    if let Expr::Call(call) = expr {
        visit(call);
    }
    for child in expr.children() {
        walk_expr_calls(child, visit);
    }
}
