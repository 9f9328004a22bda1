use crate::syntax::{ArenaBuilder, Literal, NodeId, NodeKind, Position, SourceUnit};
use ctxhelp_common::{HelpError, Result};
use tracing::debug;
use tree_sitter::{Node, Parser};

pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(tree_sitter_python::language())
            .map_err(|e| HelpError::Parser(format!("Failed to load Python grammar: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse source text into a typed [`SourceUnit`].
    ///
    /// Tree-sitter recovers from errors, but a tree containing any error or
    /// missing node is rejected here so that nothing downstream works on a
    /// partial tree.
    pub fn parse(&mut self, content: &str) -> Result<SourceUnit> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| HelpError::Parser("Failed to parse Python content".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            let at = first_error(root).map(position).unwrap_or_else(|| position(root));
            return Err(HelpError::Syntax {
                line: at.line,
                column: at.column,
            });
        }

        let mut lowering = Lowering {
            builder: ArenaBuilder::default(),
            source: content,
        };
        let root_id = lowering
            .lower(root)
            .ok_or_else(|| HelpError::Parser("Empty syntax tree".to_string()))?;
        let unit = lowering.builder.finish(root_id);
        debug!("Lowered Python source into {} nodes", unit.len());
        Ok(unit)
    }
}

/// What lowering one tree-sitter node takes: either the typed node right
/// away, or its children first and then a [`Shape`] to assemble them into.
enum Plan<'t> {
    Leaf(NodeKind),
    Branch(Shape, Vec<Node<'t>>),
}

enum Shape {
    Module,
    Other(String),
    Attribute(String),
    /// The first `targets` children are targets, the last one the value
    Assign { targets: usize },
    /// One slot per child after the callee
    Call(Vec<Slot>),
}

enum Slot {
    Arg,
    Keyword {
        arg: Option<String>,
        position: Position,
    },
}

enum Task<'t> {
    Visit(Node<'t>),
    Build(Node<'t>, Shape, usize),
}

struct Lowering<'s> {
    builder: ArenaBuilder,
    source: &'s str,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> &'s str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    fn field_text(&self, node: Node, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| self.text(n).to_string())
    }

    /// Lower the tree below `root` into the arena and return the root's id.
    ///
    /// Pending work is kept on a heap stack, so long `a + b + ...` chains do
    /// not grow the call stack. Children are pushed before their parent.
    fn lower(&mut self, root: Node) -> Option<NodeId> {
        let mut tasks = vec![Task::Visit(root)];
        let mut lowered: Vec<NodeId> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(node) => match self.plan(node) {
                    Plan::Leaf(kind) => lowered.push(self.builder.push(kind, position(node))),
                    Plan::Branch(shape, children) => {
                        tasks.push(Task::Build(node, shape, children.len()));
                        tasks.extend(children.into_iter().rev().map(Task::Visit));
                    }
                },
                Task::Build(node, shape, count) => {
                    let ids = lowered.split_off(lowered.len() - count);
                    let kind = self.assemble(shape, ids);
                    lowered.push(self.builder.push(kind, position(node)));
                }
            }
        }

        lowered.pop()
    }

    fn plan<'t>(&self, node: Node<'t>) -> Plan<'t> {
        match node.kind() {
            "module" => Plan::Branch(Shape::Module, named_children(node)),
            "import_statement" => Plan::Leaf(NodeKind::Import {
                modules: self.imported_names(node),
            }),
            "import_from_statement" => match self.field_text(node, "module_name") {
                Some(module) => Plan::Leaf(NodeKind::ImportFrom {
                    module,
                    names: self.imported_names(node),
                }),
                None => other(node),
            },
            "assignment" => plan_assignment(node),
            "call" => self.plan_call(node),
            "attribute" => match (
                node.child_by_field_name("object"),
                self.field_text(node, "attribute"),
            ) {
                (Some(object), Some(attr)) => Plan::Branch(Shape::Attribute(attr), vec![object]),
                _ => other(node),
            },
            "identifier" => Plan::Leaf(NodeKind::Name(self.text(node).to_string())),
            "string" => match decode_string(self.text(node)) {
                StringConst::Text(value) => Plan::Leaf(NodeKind::Literal(Literal::Str(value))),
                StringConst::Bytes => {
                    Plan::Leaf(NodeKind::Literal(Literal::Other(self.text(node).to_string())))
                }
                StringConst::Formatted => other(node),
            },
            "concatenated_string" => self.plan_concatenated(node),
            "integer" | "float" | "true" | "false" | "none" => {
                Plan::Leaf(NodeKind::Literal(Literal::Other(self.text(node).to_string())))
            }
            _ => other(node),
        }
    }

    fn assemble(&mut self, shape: Shape, mut ids: Vec<NodeId>) -> NodeKind {
        match shape {
            Shape::Module => NodeKind::Module { body: ids },
            Shape::Other(kind) => NodeKind::Other {
                kind,
                children: ids,
            },
            Shape::Attribute(attr) => NodeKind::Attribute { value: ids[0], attr },
            Shape::Assign { targets } => {
                let value = ids[targets];
                ids.truncate(targets);
                NodeKind::Assign {
                    targets: ids,
                    value,
                }
            }
            Shape::Call(slots) => {
                let func = ids[0];
                let mut args = Vec::new();
                let mut keywords = Vec::new();
                for (slot, id) in slots.into_iter().zip(&ids[1..]) {
                    match slot {
                        Slot::Arg => args.push(*id),
                        Slot::Keyword { arg, position } => keywords.push(
                            self.builder
                                .push(NodeKind::Keyword { arg, value: *id }, position),
                        ),
                    }
                }
                NodeKind::Call {
                    func,
                    args,
                    keywords,
                }
            }
        }
    }

    /// Module names of `import` targets: `a.b as c` yields `a.b`, `*` yields `*`
    fn imported_names(&self, node: Node) -> Vec<String> {
        let mut cursor = node.walk();
        node.children_by_field_name("name", &mut cursor)
            .map(|name| match name.kind() {
                "aliased_import" => self
                    .field_text(name, "name")
                    .unwrap_or_else(|| self.text(name).to_string()),
                _ => self.text(name).to_string(),
            })
            .chain(
                named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() == "wildcard_import")
                    .map(|_| "*".to_string()),
            )
            .collect()
    }

    fn plan_call<'t>(&self, node: Node<'t>) -> Plan<'t> {
        let Some(function) = node.child_by_field_name("function") else {
            return other(node);
        };

        let mut children = vec![function];
        let mut slots = Vec::new();
        if let Some(arguments) = node.child_by_field_name("arguments") {
            if arguments.kind() == "argument_list" {
                for child in named_children(arguments) {
                    let keyword = match child.kind() {
                        "keyword_argument" => child
                            .child_by_field_name("value")
                            .map(|value| (self.field_text(child, "name"), value)),
                        "dictionary_splat" => {
                            named_children(child).first().map(|inner| (None, *inner))
                        }
                        _ => None,
                    };
                    match keyword {
                        Some((arg, value)) => {
                            slots.push(Slot::Keyword {
                                arg,
                                position: position(child),
                            });
                            children.push(value);
                        }
                        None => {
                            slots.push(Slot::Arg);
                            children.push(child);
                        }
                    }
                }
            } else {
                // Bare generator argument: f(x for x in y)
                slots.push(Slot::Arg);
                children.push(arguments);
            }
        }

        Plan::Branch(Shape::Call(slots), children)
    }

    fn plan_concatenated<'t>(&self, node: Node<'t>) -> Plan<'t> {
        let parts: Vec<StringConst> = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "string")
            .map(|c| decode_string(self.text(c)))
            .collect();

        if parts.iter().any(|p| matches!(p, StringConst::Formatted)) {
            return other(node);
        }
        if parts.iter().any(|p| matches!(p, StringConst::Bytes)) {
            return Plan::Leaf(NodeKind::Literal(Literal::Other(self.text(node).to_string())));
        }

        let value = parts
            .into_iter()
            .filter_map(|p| match p {
                StringConst::Text(text) => Some(text),
                _ => None,
            })
            .collect::<String>();
        Plan::Leaf(NodeKind::Literal(Literal::Str(value)))
    }
}

fn other(node: Node) -> Plan {
    Plan::Branch(Shape::Other(node.kind().to_string()), named_children(node))
}

/// `a = b = value` flattens into one node with every target
fn plan_assignment(node: Node) -> Plan {
    let mut children = Vec::new();
    let mut current = node;
    loop {
        let Some(left) = current.child_by_field_name("left") else {
            return other(node);
        };
        children.push(left);

        match current.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => current = right,
            Some(right) => {
                let targets = children.len();
                children.push(right);
                return Plan::Branch(Shape::Assign { targets }, children);
            }
            // Bare annotation (`x: int`), nothing is assigned
            None => return Plan::Branch(Shape::Other("annotation".to_string()), children),
        }
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn position(node: Node) -> Position {
    let point = node.start_position();
    Position {
        line: point.row + 1,
        column: point.column + 1,
    }
}

/// First error or missing node in document order
fn first_error(root: Node) -> Option<Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

#[derive(Debug, PartialEq)]
enum StringConst {
    Text(String),
    Bytes,
    Formatted,
}

/// Evaluate a single Python string literal from its source text
fn decode_string(raw: &str) -> StringConst {
    let prefix_len = raw
        .find(|c: char| c == '"' || c == '\'')
        .unwrap_or(raw.len());
    let (prefix, quoted) = raw.split_at(prefix_len);
    let prefix = prefix.to_ascii_lowercase();

    if prefix.contains('f') {
        return StringConst::Formatted;
    }
    if prefix.contains('b') {
        return StringConst::Bytes;
    }

    let body = ["\"\"\"", "'''", "\"", "'"]
        .iter()
        .find_map(|quote| {
            quoted
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        })
        .unwrap_or(quoted);

    if prefix.contains('r') {
        StringConst::Text(body.to_string())
    } else {
        StringConst::Text(unescape(body))
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut digits = escaped.to_string();
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
            }
            'x' | 'u' | 'U' => {
                let width = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width).filter_map(|_| chars.next()).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(ch) if digits.len() == width => out.push(ch),
                    _ => {
                        out.push('\\');
                        out.push(escaped);
                        out.push_str(&digits);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

pub fn parse_python(content: &str) -> Result<SourceUnit> {
    PythonParser::new()?.parse(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(unit: &'a SourceUnit, pred: impl Fn(&NodeKind) -> bool) -> Vec<&'a NodeKind> {
        unit.walk().map(|id| unit.kind(id)).filter(|k| pred(k)).collect()
    }

    #[test]
    fn test_imports_are_top_level_statements() {
        let unit = parse_python(
            "import tkinter as tk, os.path\nfrom PyQt5 import QtWidgets\nfrom . import local\n",
        )
        .unwrap();

        let body: Vec<&NodeKind> = unit.body().iter().map(|id| unit.kind(*id)).collect();
        assert_eq!(
            body[0],
            &NodeKind::Import {
                modules: vec!["tkinter".to_string(), "os.path".to_string()]
            }
        );
        assert_eq!(
            body[1],
            &NodeKind::ImportFrom {
                module: "PyQt5".to_string(),
                names: vec!["QtWidgets".to_string()]
            }
        );
        assert!(matches!(body[2], NodeKind::ImportFrom { module, .. } if module == "."));
    }

    #[test]
    fn test_call_with_keywords() {
        let unit = parse_python("w = ttk.Button(root, text='Go', name=\"go_button\", **extra)\n")
            .unwrap();

        let calls = find(&unit, |k| matches!(k, NodeKind::Call { .. }));
        assert_eq!(calls.len(), 1);
        let NodeKind::Call {
            func,
            args,
            keywords,
        } = calls[0]
        else {
            unreachable!()
        };
        assert!(matches!(unit.kind(*func), NodeKind::Attribute { attr, .. } if attr == "Button"));
        assert_eq!(args.len(), 1);
        assert_eq!(keywords.len(), 3);

        let named: Vec<(Option<String>, Option<&str>)> = keywords
            .iter()
            .map(|id| match unit.kind(*id) {
                NodeKind::Keyword { arg, value } => (arg.clone(), unit.string_value(*value)),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(named[0], (Some("text".to_string()), Some("Go")));
        assert_eq!(named[1], (Some("name".to_string()), Some("go_button")));
        assert_eq!(named[2].0, None);
    }

    #[test]
    fn test_chained_assignment_keeps_all_targets() {
        let unit = parse_python("a = b = QtWidgets.QLabel()\n").unwrap();
        let assigns = find(&unit, |k| matches!(k, NodeKind::Assign { .. }));
        assert_eq!(assigns.len(), 1);
        let NodeKind::Assign { targets, value } = assigns[0] else {
            unreachable!()
        };
        assert_eq!(targets.len(), 2);
        assert!(matches!(unit.kind(*value), NodeKind::Call { .. }));
    }

    #[test]
    fn test_string_literals() {
        let unit = parse_python(
            "x = f(a='plain', b=r'raw\\n', c='esc\\tx', d='con' \"cat\", e=b'bytes', g=f'{v}', h=3)\n",
        )
        .unwrap();
        let values: Vec<Option<&str>> = unit
            .walk()
            .filter_map(|id| match unit.kind(id) {
                NodeKind::Keyword { value, .. } => Some(unit.string_value(*value)),
                _ => None,
            })
            .collect();

        assert_eq!(
            values,
            vec![
                Some("plain"),
                Some("raw\\n"),
                Some("esc\tx"),
                Some("concat"),
                None,
                None,
                None
            ]
        );
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = parse_python("import tkinter\n\ndef broken(:\n    pass\n").unwrap_err();
        match err {
            HelpError::Syntax { line, .. } => assert_eq!(line, 3),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_long_operator_chain_lowers_without_recursion() {
        let terms = vec!["'a'"; 2000].join(" + ");
        let unit = parse_python(&format!("msg = {}\n", terms)).unwrap();

        let operators = find(
            &unit,
            |k| matches!(k, NodeKind::Other { kind, .. } if kind == "binary_operator"),
        );
        assert_eq!(operators.len(), 1999);
        assert_eq!(unit.walk().count(), unit.len());
    }

    #[test]
    fn test_syntax_error_inside_deep_expression() {
        let terms = vec!["1"; 2000].join(" + ");
        let err = parse_python(&format!("x = {} +\n", terms)).unwrap_err();
        assert!(matches!(err, HelpError::Syntax { .. }));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\\b"), "a\\b");
        assert_eq!(unescape(r"\x41é\101"), "AéA");
        assert_eq!(unescape(r"\q"), "\\q");
    }

    #[test]
    fn test_decode_string_forms() {
        assert_eq!(decode_string("'''tri'''"), StringConst::Text("tri".to_string()));
        assert_eq!(decode_string("u'uni'"), StringConst::Text("uni".to_string()));
        assert_eq!(decode_string("Rb'x'"), StringConst::Bytes);
        assert_eq!(decode_string("F'{x}'"), StringConst::Formatted);
    }
}
