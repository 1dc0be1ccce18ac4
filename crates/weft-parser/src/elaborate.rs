//! Elaboration of parsed statements into a [`Composition`].
//!
//! Brick declarations are visible everywhere in the file. A `let` binding is
//! visible from the statement after it. Every brick becomes exactly one leaf
//! node, created the first time it is referenced, and every binding is built
//! once; later references reuse the same [`NodeId`], so shared structure is
//! never copied.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, info, trace};

use weft_core::composition::{Brick, Composition, Grade, NodeId};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser_types::{BrickAttribute, BrickDecl, Document, Expr, Statement},
    span::{Span, Spanned},
};

/// Source spans of the nodes built from a file.
///
/// Leaves map to their brick declaration, composites to the expression that
/// produced them.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    spans: Vec<Span>,
}

impl SourceMap {
    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.spans.get(id.index()).copied()
    }
}

/// The result of parsing a `.weft` file.
#[derive(Debug)]
pub struct ParsedDiagram {
    title: Option<String>,
    composition: Composition,
    root: NodeId,
    source_map: SourceMap,
    warnings: Vec<Diagnostic>,
}

impl ParsedDiagram {
    /// The title from the `diagram` header, if present.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// The node named by the `compose` statement.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Non-fatal diagnostics, such as unused bricks.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn into_parts(self) -> (Option<String>, Composition, NodeId) {
        (self.title, self.composition, self.root)
    }
}

struct BrickEntry<'a> {
    decl: &'a BrickDecl<'a>,
    /// `None` when the declaration itself was invalid.
    brick: Option<Brick>,
    node: Option<NodeId>,
}

struct Binding {
    span: Span,
    /// `None` when the bound expression failed to elaborate.
    node: Option<NodeId>,
}

enum Task<'a> {
    Visit(&'a Expr<'a>),
    Combine(&'a Expr<'a>),
}

pub struct Builder<'a> {
    composition: Composition,
    spans: Vec<Span>,
    bricks: IndexMap<&'a str, BrickEntry<'a>>,
    bindings: IndexMap<&'a str, Binding>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Builder<'a> {
    pub fn new() -> Self {
        Self {
            composition: Composition::new(),
            spans: Vec::new(),
            bricks: IndexMap::new(),
            bindings: IndexMap::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    pub fn build(mut self, document: &'a Document<'a>) -> Result<ParsedDiagram, ParseError> {
        debug!(statements = document.statements.len(); "Elaborating document");

        let mut title: Option<Spanned<String>> = None;
        let mut later_bindings: HashMap<&'a str, Span> = HashMap::new();

        for statement in &document.statements {
            match statement {
                Statement::Diagram { title: new_title, span } => match &title {
                    Some(first) => self.diagnostics.emit(
                        Diagnostic::error("the diagram title is given more than once")
                            .with_code(ErrorCode::E206)
                            .with_label(*span, "repeated header")
                            .with_secondary_label(first.span(), "first given here"),
                    ),
                    None => title = Some(new_title.clone()),
                },
                Statement::Brick(decl) => self.declare_brick(decl),
                Statement::Let { name, .. } => {
                    later_bindings.entry(*name.inner()).or_insert(name.span());
                }
                Statement::Compose { .. } => {}
            }
        }

        let mut root: Option<(NodeId, Span)> = None;
        let mut compose_failed = false;
        for statement in &document.statements {
            match statement {
                Statement::Let { name, value, .. } => {
                    let node = self.build_expr(value, &later_bindings);
                    self.bind(*name, node);
                }
                Statement::Compose { value, span } => {
                    if let Some((_, first)) = root {
                        self.diagnostics.emit(
                            Diagnostic::error("more than one `compose` statement")
                                .with_code(ErrorCode::E205)
                                .with_label(*span, "repeated compose")
                                .with_secondary_label(first, "first compose here")
                                .with_help("combine the expressions into a single `compose`"),
                        );
                        continue;
                    }
                    match self.build_expr(value, &later_bindings) {
                        Some(node) => root = Some((node, *span)),
                        None => compose_failed = true,
                    }
                }
                Statement::Diagram { .. } | Statement::Brick(_) => {}
            }
        }

        self.warn_unused_bricks();

        let missing_compose = || {
            let end = Span::new(document.span.end()..document.span.end());
            Diagnostic::error("no `compose` statement")
                .with_code(ErrorCode::E204)
                .with_label(end, "expected `compose <expression>;`")
                .with_help("add a `compose` statement naming the expression to draw")
        };
        if root.is_none() && !compose_failed {
            self.diagnostics.emit(missing_compose());
        }

        let warnings = self.diagnostics.finish()?;
        let Some((root, _)) = root else {
            return Err(missing_compose().into());
        };

        info!(
            nodes = self.composition.len(),
            bricks = self.bricks.len(),
            bindings = self.bindings.len();
            "Elaboration completed"
        );

        Ok(ParsedDiagram {
            title: title.map(Spanned::into_inner),
            composition: self.composition,
            root,
            source_map: SourceMap { spans: self.spans },
            warnings,
        })
    }

    fn declare_brick(&mut self, decl: &'a BrickDecl<'a>) {
        let name = *decl.name.inner();
        if let Some(first) = self.bricks.get(name) {
            self.diagnostics.emit(
                Diagnostic::error(format!("brick `{name}` is defined multiple times"))
                    .with_code(ErrorCode::E201)
                    .with_label(decl.name.span(), "duplicate definition")
                    .with_secondary_label(first.decl.name.span(), "first defined here")
                    .with_help("rename one of the bricks"),
            );
            return;
        }

        let brick = self.brick_from_decl(decl);
        trace!(name, valid = brick.is_some(); "Declared brick");
        self.bricks.insert(
            name,
            BrickEntry {
                decl,
                brick,
                node: None,
            },
        );
    }

    fn brick_from_decl(&mut self, decl: &BrickDecl<'a>) -> Option<Brick> {
        let mut grade: Option<(Grade, Span)> = None;
        let mut tokens: Option<(u64, Span)> = None;
        let mut valid = true;

        for attribute in &decl.attributes {
            let seen = match attribute {
                BrickAttribute::Grade(_) => grade.map(|(_, span)| span),
                BrickAttribute::Tokens(_) => tokens.map(|(_, span)| span),
            };
            if let Some(first) = seen {
                self.diagnostics.emit(
                    Diagnostic::error(format!("`{}` is given more than once", attribute.keyword()))
                        .with_code(ErrorCode::E206)
                        .with_label(attribute.span(), "repeated attribute")
                        .with_secondary_label(first, "first given here"),
                );
                valid = false;
                continue;
            }

            match attribute {
                BrickAttribute::Grade(value) => match Grade::try_from(*value.inner()) {
                    Ok(parsed) => grade = Some((parsed, value.span())),
                    Err(err) => {
                        self.diagnostics.emit(
                            Diagnostic::error(err.to_string())
                                .with_code(ErrorCode::E203)
                                .with_label(value.span(), "not a grade")
                                .with_help(
                                    "use 0 for deterministic, 1 for model, 2 for human steps",
                                ),
                        );
                        valid = false;
                    }
                },
                BrickAttribute::Tokens(value) => tokens = Some((*value.inner(), value.span())),
            }
        }

        let grade = grade.map_or(Grade::Deterministic, |(grade, _)| grade);
        if let Some((_, span)) = tokens {
            if !grade.is_graded() {
                self.diagnostics.emit(
                    Diagnostic::warning("token estimate on a grade 0 brick is ignored")
                        .with_label(span, "grade 0 bricks cost nothing"),
                );
            }
        }

        if !valid {
            return None;
        }

        let mut brick = Brick::new(decl.name.inner(), grade);
        if let Some(label) = &decl.label {
            brick = brick.with_label(label.inner().clone());
        }
        let inputs: Vec<&str> = decl.inputs.iter().map(|port| *port.inner()).collect();
        let outputs: Vec<&str> = decl.outputs.iter().map(|port| *port.inner()).collect();
        brick = brick.with_inputs(&inputs).with_outputs(&outputs);
        if let Some((tokens, _)) = tokens {
            brick = brick.with_tokens(tokens);
        }
        Some(brick)
    }

    fn bind(&mut self, name: Spanned<&'a str>, node: Option<NodeId>) {
        let key = *name.inner();
        let clash = self
            .bindings
            .get(key)
            .map(|binding| binding.span)
            .or_else(|| self.bricks.get(key).map(|entry| entry.decl.name.span()));
        if let Some(first) = clash {
            self.diagnostics.emit(
                Diagnostic::error(format!("the name `{key}` is already defined"))
                    .with_code(ErrorCode::E202)
                    .with_label(name.span(), "duplicate binding")
                    .with_secondary_label(first, "first defined here")
                    .with_help("bindings and bricks share one namespace; pick another name"),
            );
            return;
        }
        self.bindings.insert(
            key,
            Binding {
                span: name.span(),
                node,
            },
        );
    }

    /// Resolves a name to its node, creating the leaf of a brick on first use.
    fn resolve(
        &mut self,
        name: &Spanned<&'a str>,
        later_bindings: &HashMap<&'a str, Span>,
    ) -> Option<NodeId> {
        let key = *name.inner();
        if let Some(binding) = self.bindings.get(key) {
            return binding.node;
        }

        if let Some(entry) = self.bricks.get_mut(key) {
            if let Some(node) = entry.node {
                return Some(node);
            }
            let brick = entry.brick.clone()?;
            let span = entry.decl.span;
            let node = self.composition.leaf(brick);
            self.spans.push(span);
            if let Some(entry) = self.bricks.get_mut(key) {
                entry.node = Some(node);
            }
            return Some(node);
        }

        let help = match later_bindings.get(key) {
            Some(_) => format!("`{key}` is bound later; move its `let` above this use"),
            None => format!("declare `{key}` with `brick` or `let`"),
        };
        let mut diagnostic = Diagnostic::error(format!("undefined name `{key}`"))
            .with_code(ErrorCode::E200)
            .with_label(name.span(), "not defined")
            .with_help(help);
        if let Some(span) = later_bindings.get(key) {
            diagnostic = diagnostic.with_secondary_label(*span, "bound here");
        }
        self.diagnostics.emit(diagnostic);
        None
    }

    /// Builds the node for an expression, children first, with an explicit stack.
    ///
    /// Returns `None` if any name inside failed to resolve; the errors are
    /// already reported.
    fn build_expr(
        &mut self,
        expr: &'a Expr<'a>,
        later_bindings: &HashMap<&'a str, Span>,
    ) -> Option<NodeId> {
        let mut tasks = vec![Task::Visit(expr)];
        let mut values: Vec<Option<NodeId>> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(expr) => match expr {
                    Expr::Name(name) => {
                        let node = self.resolve(name, later_bindings);
                        values.push(node);
                    }
                    Expr::Seq { left, right } | Expr::Par { left, right } => {
                        tasks.push(Task::Combine(expr));
                        tasks.push(Task::Visit(*right));
                        tasks.push(Task::Visit(*left));
                    }
                },
                Task::Combine(composite) => {
                    let right = values.pop().flatten();
                    let left = values.pop().flatten();
                    let node = match (composite, left, right) {
                        (Expr::Seq { .. }, Some(left), Some(right)) => {
                            Some(self.composition.seq(left, right))
                        }
                        (Expr::Par { .. }, Some(left), Some(right)) => {
                            Some(self.composition.par(left, right))
                        }
                        _ => None,
                    };
                    if node.is_some() {
                        self.spans.push(composite.span());
                    }
                    values.push(node);
                }
            }
        }

        values.pop().flatten()
    }

    fn warn_unused_bricks(&mut self) {
        let unused: Vec<Diagnostic> = self
            .bricks
            .iter()
            .filter(|(_, entry)| entry.node.is_none() && entry.brick.is_some())
            .map(|(name, entry)| {
                Diagnostic::warning(format!("brick `{name}` is never used"))
                    .with_label(entry.decl.name.span(), "declared here")
            })
            .collect();
        for diagnostic in unused {
            self.diagnostics.emit(diagnostic);
        }
    }
}

impl Default for Builder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
