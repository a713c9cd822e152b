// Python parser using tree-sitter
//
// tree-sitter always produces a tree, recovering around bad input with ERROR
// and MISSING nodes. Those are rejected up front so a file either lowers into
// a complete `Module` or fails as a whole. The grammar also accepts a few
// Python 2 forms (`print x`, `exec x`, `<>`); those fail the same way.

use crate::error::{Error, Result};
use crate::parser::ast::*;
use tree_sitter::{Node, Parser};

/// Maximum nesting of blocks and bracketed expressions, as in CPython
const MAX_NESTING: usize = 200;

/// Maximum links in one `a.b(c).d` chain
const MAX_CHAIN: usize = 5000;

/// Parser for Python source text
pub struct SourceParser {
    parser: Parser,
}

impl SourceParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::Parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse Python source code into a syntax tree
    pub fn parse(&mut self, source: &str) -> Result<Module> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parser("Failed to parse source"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(first_error(&root));
        }

        let lowering = Lowering {
            source: source.as_bytes(),
        };
        let body = lowering.block(&root, 0)?;
        Ok(Module { body })
    }
}

/// Locate the first ERROR or MISSING node in document order
fn first_error(root: &Node) -> Error {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            let message = if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "invalid syntax".to_string()
            };
            return Error::syntax(pos.row + 1, pos.column + 1, message);
        }

        // Descend only into subtrees that contain the error
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                let pos = root.start_position();
                return Error::syntax(pos.row + 1, pos.column + 1, "invalid syntax");
            }
        }
    }
}

/// Converts tree-sitter nodes into the closed `ast` tree
struct Lowering<'s> {
    source: &'s [u8],
}

impl<'s> Lowering<'s> {
    fn text(&self, node: &Node) -> Result<&'s str> {
        node.utf8_text(self.source)
            .map_err(|e| Error::parser(format!("Invalid UTF-8 in source: {}", e)))
    }

    fn check_depth(&self, node: &Node, depth: usize) -> Result<()> {
        if depth > MAX_NESTING {
            let pos = node.start_position();
            return Err(Error::syntax(
                pos.row + 1,
                pos.column + 1,
                "too many nested constructs",
            ));
        }
        Ok(())
    }

    /// Lower the statements directly inside a module or block
    fn block(&self, node: &Node, depth: usize) -> Result<Vec<Stmt>> {
        self.check_depth(node, depth)?;
        let mut stmts = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            stmts.push(self.stmt(&child, depth)?);
        }
        Ok(stmts)
    }

    fn stmt(&self, node: &Node, depth: usize) -> Result<Stmt> {
        self.check_depth(node, depth)?;
        match node.kind() {
            "print_statement" | "exec_statement" => {
                let pos = node.start_position();
                Err(Error::syntax(
                    pos.row + 1,
                    pos.column + 1,
                    "Python 2 statement is not valid Python 3",
                ))
            }
            "class_definition" => Ok(Stmt::ClassDef(self.class_def(node, Vec::new(), depth)?)),
            "function_definition" => Ok(Stmt::FunctionDef(self.function_def(node, Vec::new(), depth)?)),
            "decorated_definition" => self.decorated(node, depth),
            "expression_statement" => self.expression_statement(node, depth),
            _ => self.other_stmt(node, depth),
        }
    }

    fn class_def(&self, node: &Node, decorators: Vec<Expr>, depth: usize) -> Result<ClassDef> {
        let name = match node.child_by_field_name("name") {
            Some(n) => self.text(&n)?.to_string(),
            None => String::new(),
        };

        let mut bases = Vec::new();
        if let Some(args) = node.child_by_field_name("superclasses") {
            // Keyword arguments such as `metaclass=` are not bases
            let (positional, _) = self.arguments(&args, depth + 1)?;
            bases = positional;
        }

        let body = match node.child_by_field_name("body") {
            Some(block) => self.block(&block, depth + 1)?,
            None => Vec::new(),
        };

        Ok(ClassDef {
            name,
            bases,
            decorators,
            body,
            line: node.start_position().row + 1,
        })
    }

    fn function_def(&self, node: &Node, decorators: Vec<Expr>, depth: usize) -> Result<FunctionDef> {
        let name = match node.child_by_field_name("name") {
            Some(n) => self.text(&n)?.to_string(),
            None => String::new(),
        };

        let mut is_async = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "async" {
                is_async = true;
            }
        }

        let body = match node.child_by_field_name("body") {
            Some(block) => self.block(&block, depth + 1)?,
            None => Vec::new(),
        };

        Ok(FunctionDef {
            name,
            is_async,
            decorators,
            body,
            line: node.start_position().row + 1,
        })
    }

    fn decorated(&self, node: &Node, depth: usize) -> Result<Stmt> {
        let mut decorators = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "decorator" {
                decorators.push(self.generic_expr(&child, depth + 1)?);
            }
        }

        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "class_definition" => {
                Ok(Stmt::ClassDef(self.class_def(&def, decorators, depth + 1)?))
            }
            Some(def) if def.kind() == "function_definition" => {
                Ok(Stmt::FunctionDef(self.function_def(&def, decorators, depth + 1)?))
            }
            _ => Ok(Stmt::Other {
                body: Vec::new(),
                exprs: decorators,
            }),
        }
    }

    fn expression_statement(&self, node: &Node, depth: usize) -> Result<Stmt> {
        let children = self.named_children(node);
        if let [only] = children.as_slice() {
            return match only.kind() {
                "assignment" => self.assignment(only, depth + 1),
                "augmented_assignment" => Ok(Stmt::Other {
                    body: Vec::new(),
                    exprs: self.exprs(&self.named_children(only), depth + 1)?,
                }),
                _ => Ok(Stmt::Expr(self.expr(only, depth + 1)?)),
            };
        }
        // `a, b` as a bare statement is a tuple expression
        Ok(Stmt::Expr(Expr::Other(self.exprs(&children, depth + 1)?)))
    }

    fn assignment(&self, node: &Node, depth: usize) -> Result<Stmt> {
        // Annotated assignments are a different statement kind
        if node.child_by_field_name("type").is_some() {
            return Ok(Stmt::Other {
                body: Vec::new(),
                exprs: self.exprs(&self.named_children(node), depth + 1)?,
            });
        }

        let mut targets = Vec::new();
        let mut current = *node;
        loop {
            let left = current.child_by_field_name("left");
            let right = current.child_by_field_name("right");
            if let Some(left) = left {
                targets.push(self.expr(&left, depth + 1)?);
            }
            match right {
                // `a = b = value` nests as assignment(a, assignment(b, value))
                Some(r) if r.kind() == "assignment" && r.child_by_field_name("type").is_none() => {
                    current = r;
                }
                Some(r) => {
                    return Ok(Stmt::Assign(Assign {
                        targets,
                        value: self.expr(&r, depth + 1)?,
                    }));
                }
                None => {
                    return Ok(Stmt::Other {
                        body: Vec::new(),
                        exprs: targets,
                    });
                }
            }
        }
    }

    /// Compound or simple statements with no dedicated variant
    fn other_stmt(&self, node: &Node, depth: usize) -> Result<Stmt> {
        let mut body = Vec::new();
        let mut exprs = Vec::new();
        for child in self.named_children(node) {
            let kind = child.kind();
            if kind == "block" {
                body.extend(self.block(&child, depth + 1)?);
            } else if is_statement_kind(kind) {
                body.push(self.stmt(&child, depth + 1)?);
            } else {
                exprs.push(self.expr(&child, depth + 1)?);
            }
        }
        Ok(Stmt::Other { body, exprs })
    }

    fn expr(&self, node: &Node, depth: usize) -> Result<Expr> {
        self.check_depth(node, depth)?;
        match node.kind() {
            "identifier" => Ok(Expr::Name(self.text(node)?.to_string())),
            "attribute" | "call" => self.postfix_chain(node, depth),
            "binary_operator" | "boolean_operator" => self.operator_chain(node, depth),
            "comparison_operator" => {
                let mut cursor = node.walk();
                let legacy = node.children(&mut cursor).find(|c| c.kind() == "<>");
                if let Some(op) = legacy {
                    let pos = op.start_position();
                    return Err(Error::syntax(pos.row + 1, pos.column + 1, "invalid syntax '<>'"));
                }
                self.generic_expr(node, depth)
            }
            "string" => match self.string_literal(node)? {
                Some(lit) => Ok(Expr::Literal(lit)),
                None => self.generic_expr(node, depth),
            },
            "concatenated_string" => {
                let mut joined: Option<Literal> = None;
                for part in self.named_children(node) {
                    let Some(lit) = self.string_literal(&part)? else {
                        return self.generic_expr(node, depth);
                    };
                    joined = Some(match (joined, lit) {
                        (None, lit) => lit,
                        (Some(Literal::Str(mut a)), Literal::Str(b)) => {
                            a.push_str(&b);
                            Literal::Str(a)
                        }
                        (Some(Literal::Bytes(mut a)), Literal::Bytes(b)) => {
                            a.extend(b);
                            Literal::Bytes(a)
                        }
                        _ => {
                            let pos = part.start_position();
                            return Err(Error::syntax(
                                pos.row + 1,
                                pos.column + 1,
                                "cannot mix bytes and nonbytes literals",
                            ));
                        }
                    });
                }
                match joined {
                    Some(lit) => Ok(Expr::Literal(lit)),
                    None => self.generic_expr(node, depth),
                }
            }
            "integer" | "float" => Ok(Expr::Literal(Literal::Number(self.text(node)?.to_string()))),
            "true" => Ok(Expr::Literal(Literal::Bool(true))),
            "false" => Ok(Expr::Literal(Literal::Bool(false))),
            "none" => Ok(Expr::Literal(Literal::None)),
            "parenthesized_expression" => {
                let children = self.named_children(node);
                match children.as_slice() {
                    [inner] if inner.kind() != "yield" => self.expr(inner, depth + 1),
                    _ => Ok(Expr::Other(self.exprs(&children, depth + 1)?)),
                }
            }
            _ => self.generic_expr(node, depth),
        }
    }

    /// Lower an `a.b(c).d` spine in a loop; each link adds no nesting
    fn postfix_chain(&self, node: &Node, depth: usize) -> Result<Expr> {
        let mut links = Vec::new();
        let mut current = *node;
        loop {
            match current.kind() {
                "attribute" => {
                    let object = current.child_by_field_name("object");
                    let attr = current.child_by_field_name("attribute");
                    let (Some(object), Some(attr)) = (object, attr) else {
                        break;
                    };
                    links.push(Link::Attribute(self.text(&attr)?));
                    current = object;
                }
                "call" => {
                    let Some(func) = current.child_by_field_name("function") else {
                        break;
                    };
                    links.push(Link::Call(current));
                    current = func;
                }
                _ => break,
            }
            if links.len() > MAX_CHAIN {
                let pos = node.start_position();
                return Err(Error::syntax(pos.row + 1, pos.column + 1, "expression chain too long"));
            }
        }

        let mut expr = match current.kind() {
            "attribute" | "call" => self.generic_expr(&current, depth)?,
            _ => self.expr(&current, depth + 1)?,
        };
        for link in links.into_iter().rev() {
            expr = match link {
                Link::Attribute(attr) => Expr::Attribute {
                    value: Box::new(expr),
                    attr: attr.to_string(),
                },
                Link::Call(call) => {
                    let (args, keywords) = self.call_arguments(&call, depth + 1)?;
                    Expr::Call(Call {
                        func: Box::new(expr),
                        args,
                        keywords,
                        line: call.start_position().row + 1,
                    })
                }
            };
        }
        Ok(expr)
    }

    /// Flatten `a + b + c` or `a and b or c` into its operands, in source order
    fn operator_chain(&self, node: &Node, depth: usize) -> Result<Expr> {
        let mut rights = Vec::new();
        let mut current = *node;
        while matches!(current.kind(), "binary_operator" | "boolean_operator") {
            let left = current.child_by_field_name("left");
            let right = current.child_by_field_name("right");
            let (Some(left), Some(right)) = (left, right) else {
                break;
            };
            rights.push(right);
            current = left;
        }

        let mut operands = Vec::with_capacity(rights.len() + 1);
        operands.push(match current.kind() {
            "binary_operator" | "boolean_operator" => self.generic_expr(&current, depth)?,
            _ => self.expr(&current, depth + 1)?,
        });
        for right in rights.iter().rev() {
            operands.push(self.expr(right, depth + 1)?);
        }
        Ok(Expr::Other(operands))
    }

    fn call_arguments(&self, node: &Node, depth: usize) -> Result<(Vec<Expr>, Vec<Keyword>)> {
        match node.child_by_field_name("arguments") {
            Some(args) if args.kind() == "argument_list" => self.arguments(&args, depth),
            // `f(x for x in y)`
            Some(generator) => Ok((vec![self.expr(&generator, depth)?], Vec::new())),
            None => Ok((Vec::new(), Vec::new())),
        }
    }

    /// Split an argument list into positional arguments and keywords
    fn arguments(&self, node: &Node, depth: usize) -> Result<(Vec<Expr>, Vec<Keyword>)> {
        self.check_depth(node, depth)?;
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        for child in self.named_children(node) {
            match child.kind() {
                "keyword_argument" => {
                    let name = match child.child_by_field_name("name") {
                        Some(n) => Some(self.text(&n)?.to_string()),
                        None => None,
                    };
                    let value = match child.child_by_field_name("value") {
                        Some(v) => self.expr(&v, depth)?,
                        None => Expr::Other(Vec::new()),
                    };
                    keywords.push(Keyword { name, value });
                }
                "dictionary_splat" => {
                    keywords.push(Keyword {
                        name: None,
                        value: self.generic_expr(&child, depth)?,
                    });
                }
                _ => args.push(self.expr(&child, depth)?),
            }
        }
        Ok((args, keywords))
    }

    fn generic_expr(&self, node: &Node, depth: usize) -> Result<Expr> {
        self.check_depth(node, depth)?;
        Ok(Expr::Other(self.exprs(&self.named_children(node), depth + 1)?))
    }

    fn exprs(&self, nodes: &[Node], depth: usize) -> Result<Vec<Expr>> {
        nodes.iter().map(|n| self.expr(n, depth)).collect()
    }

    fn named_children<'t>(&self, node: &Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        let children = node
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .collect();
        children
    }

    /// Value of a plain string or bytes literal; `None` for f-strings
    fn string_literal(&self, node: &Node) -> Result<Option<Literal>> {
        if node.kind() != "string" {
            return Ok(None);
        }
        decode_string(self.text(node)?).map_err(|message| {
            let pos = node.start_position();
            Error::syntax(pos.row + 1, pos.column + 1, message)
        })
    }
}

/// One link of an attribute/call chain, outermost first
enum Link<'s, 't> {
    Attribute(&'s str),
    Call(Node<'t>),
}

fn is_statement_kind(kind: &str) -> bool {
    kind.ends_with("_statement")
        || kind.ends_with("_clause")
        || matches!(
            kind,
            "class_definition" | "function_definition" | "decorated_definition" | "block"
        )
}

/// Decode a string or bytes literal as written (prefix, quotes, escapes) into
/// its value. `Ok(None)` for f-strings, which are not constants; `Err` for
/// escapes Python itself rejects.
fn decode_string(text: &str) -> std::result::Result<Option<Literal>, String> {
    let Some(quote_start) = text.find(['\'', '"']) else {
        return Ok(None);
    };
    let prefix = text[..quote_start].to_ascii_lowercase();
    if prefix.contains('f') {
        return Ok(None);
    }
    let raw = prefix.contains('r');

    let quoted = &text[quote_start..];
    let quote_len = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        3
    } else {
        1
    };
    if quoted.len() < quote_len * 2 {
        return Ok(None);
    }
    let inner = &quoted[quote_len..quoted.len() - quote_len];

    if prefix.contains('b') {
        if !inner.is_ascii() {
            return Err("bytes can only contain ASCII literal characters".to_string());
        }
        let value = if raw {
            inner.as_bytes().to_vec()
        } else {
            unescape_bytes(inner)?
        };
        return Ok(Some(Literal::Bytes(value)));
    }

    let value = if raw {
        inner.to_string()
    } else {
        unescape(inner)?
    };
    Ok(Some(Literal::Str(value)))
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn unescape(s: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        if let Some(decoded) = simple_escape(esc) {
            out.push(decoded);
            continue;
        }
        match esc {
            // Line continuation
            '\n' => {}
            '0'..='7' => {
                let code = octal_escape(esc, &mut chars);
                out.extend(char::from_u32(code));
            }
            'x' | 'u' | 'U' => {
                let width = match esc {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let code = parse_hex(&digits, width)
                    .ok_or_else(|| format!("truncated \\{}{} escape", esc, "X".repeat(width)))?;
                chars.nth(width - 1);
                match char::from_u32(code) {
                    Some(decoded) => out.push(decoded),
                    None if code > 0x10FFFF => return Err("illegal Unicode character".to_string()),
                    // Lone surrogates have no `char`; keep them as written
                    None => {
                        out.push('\\');
                        out.push(esc);
                        out.push_str(&digits);
                    }
                }
            }
            'N' => {
                let name = named_escape(&mut chars)
                    .ok_or_else(|| "malformed \\N character escape".to_string())?;
                let decoded = unicode_names2::character(&name)
                    .ok_or_else(|| format!("unknown Unicode character name '{}'", name))?;
                out.push(decoded);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

/// Escapes in a bytes literal; `\u`, `\U` and `\N` are not escapes there
fn unescape_bytes(s: &str) -> std::result::Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c as u8);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push(b'\\');
            break;
        };
        if let Some(decoded) = simple_escape(esc) {
            out.push(decoded as u8);
            continue;
        }
        match esc {
            '\n' => {}
            '0'..='7' => out.push((octal_escape(esc, &mut chars) & 0xff) as u8),
            'x' => {
                let digits: String = chars.clone().take(2).collect();
                let code = parse_hex(&digits, 2).ok_or_else(|| "truncated \\xXX escape".to_string())?;
                chars.nth(1);
                out.push(code as u8);
            }
            other => {
                out.push(b'\\');
                out.push(other as u8);
            }
        }
    }
    Ok(out)
}

fn simple_escape(c: char) -> Option<char> {
    let decoded = match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'v' => '\x0b',
        '\\' => '\\',
        '\'' => '\'',
        '"' => '"',
        _ => return None,
    };
    Some(decoded)
}

/// Up to three octal digits, the first already consumed
fn octal_escape(first: char, chars: &mut Chars) -> u32 {
    let mut code = first.to_digit(8).unwrap_or(0);
    for _ in 0..2 {
        match chars.peek().and_then(|c| c.to_digit(8)) {
            Some(digit) => {
                code = code * 8 + digit;
                chars.next();
            }
            None => break,
        }
    }
    code
}

fn parse_hex(digits: &str, width: usize) -> Option<u32> {
    if digits.len() != width || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// The `{NAME}` part of a `\N{NAME}` escape
fn named_escape(chars: &mut Chars) -> Option<String> {
    chars.next_if_eq(&'{')?;
    let mut name = String::new();
    for c in chars.by_ref() {
        if c == '}' {
            return Some(name);
        }
        name.push(c);
    }
    None
}
