// Copyright (c) 2016-2021 Fabian Schuiki
#![allow(dead_code)]

//! Utilities for driver analysis tests.

pub extern crate rayon;
pub extern crate sigdrive_analysis as analysis;
pub extern crate sigdrive_common;
pub extern crate simple_logger;
pub use crate::analysis::design::*;
pub use crate::analysis::expr::{Expr, ExprKind, RangeSelectKind};
pub use crate::analysis::hier::{HierarchicalReference, PathElement, Selector};
pub use crate::analysis::ty::{Type, TypeKind};
pub use crate::analysis::*;
pub use crate::sigdrive_common::errors::{DiagBuilder2, Severity};
pub use crate::sigdrive_common::source::{Source, Span, INVALID_SPAN};
pub use crate::sigdrive_common::Session;

/// Builds a design whose symbols and expressions point into a piece of
/// source text.
///
/// Spans are looked up by searching for a snippet of the text, so tests can
/// check where diagnostics point to.
pub struct Bench<'a> {
    pub arena: &'a Arenas<'a>,
    pub design: Design<'a>,
    /// The body of the top-level module.
    pub top: SymbolId,
    source: Source,
    text: String,
}

impl<'a> Bench<'a> {
    pub fn new(arena: &'a Arenas<'a>, text: &str) -> Self {
        simple_logger::init().is_ok();
        let source = sigdrive_common::source::get_source_manager().add_anonymous(text);
        let mut design = Design::new();
        let root = design.root();
        let (_, top) = design.add_instance(root, "top", INVALID_SPAN, DefinitionKind::Module);
        Bench {
            arena,
            design,
            top,
            source,
            text: text.to_string(),
        }
    }

    /// The span of the first occurrence of `needle`.
    pub fn span(&self, needle: &str) -> Span {
        self.span_nth(needle, 0)
    }

    /// The span of the `n`-th occurrence of `needle`.
    pub fn span_nth(&self, needle: &str, n: usize) -> Span {
        let begin = match self.text.match_indices(needle).nth(n) {
            Some((begin, _)) => begin,
            None => panic!("`{}` #{} not found in test source", needle, n),
        };
        Span::new(self.source, begin, begin + needle.len())
    }

    pub fn logic(&self, width: isize) -> Type<'a> {
        self.arena.alloc_type(TypeKind::logic(width - 1, 0))
    }

    pub fn module(&mut self, parent: SymbolId, name: &str) -> (SymbolId, SymbolId) {
        let span = self.span(name);
        self.design
            .add_instance(parent, name, span, DefinitionKind::Module)
    }

    pub fn interface(&mut self, parent: SymbolId, name: &str) -> (SymbolId, SymbolId) {
        let span = self.span(name);
        self.design
            .add_instance(parent, name, span, DefinitionKind::Interface)
    }

    pub fn var(&mut self, scope: SymbolId, name: &str, width: isize) -> SymbolId {
        self.var_with_init(scope, name, width, None)
    }

    pub fn var_with_init(
        &mut self,
        scope: SymbolId,
        name: &str,
        width: isize,
        initializer: Option<&'a Expr<'a>>,
    ) -> SymbolId {
        let span = self.span(name);
        let ty = self.logic(width);
        self.design.add(
            scope,
            name,
            span,
            SymbolKind::Variable(VariableSymbol {
                ty,
                lifetime: Lifetime::Static,
                initializer,
            }),
        )
    }

    pub fn net(
        &mut self,
        scope: SymbolId,
        name: &str,
        width: isize,
        net_type: NetType,
    ) -> SymbolId {
        let span = self.span(name);
        let ty = self.logic(width);
        self.design.add(
            scope,
            name,
            span,
            SymbolKind::Net(NetSymbol {
                ty,
                net_type,
                initializer: None,
            }),
        )
    }

    /// Add a procedure whose keyword is the `n`-th occurrence of its kind in
    /// the source text.
    pub fn procedure(&mut self, scope: SymbolId, kind: ProceduralBlockKind, n: usize) -> SymbolId {
        let span = self.span_nth(kind.as_str(), n);
        self.design
            .add(scope, "", span, SymbolKind::ProceduralBlock(kind))
    }

    pub fn port(
        &mut self,
        body: SymbolId,
        name: &str,
        direction: ArgumentDirection,
        internal_symbol: Option<SymbolId>,
    ) -> SymbolId {
        let span = self.span(name);
        self.design.add(
            body,
            name,
            span,
            SymbolKind::Port(PortSymbol {
                direction,
                internal_expr: None,
                internal_symbol,
            }),
        )
    }

    pub fn iface_port(&mut self, body: SymbolId, name: &str) -> SymbolId {
        let span = self.span(name);
        self.design.add(
            body,
            name,
            span,
            SymbolKind::InterfacePort(InterfacePortSymbol::default()),
        )
    }

    pub fn expr(&self, span: Span, kind: ExprKind<'a>) -> &'a Expr<'a> {
        self.arena.alloc_expr(Expr::new(span, kind))
    }

    /// A reference to `symbol` at the `n`-th occurrence of `needle`.
    pub fn named(&self, symbol: SymbolId, needle: &str, n: usize) -> &'a Expr<'a> {
        self.expr(self.span_nth(needle, n), ExprKind::NamedValue(symbol))
    }

    pub fn int(&self, value: i64) -> &'a Expr<'a> {
        self.expr(INVALID_SPAN, ExprKind::IntConst(value.into()))
    }

    pub fn range(&self, value: &'a Expr<'a>, left: i64, right: i64) -> &'a Expr<'a> {
        self.expr(
            value.span,
            ExprKind::RangeSelect {
                mode: RangeSelectKind::Simple,
                value,
                left: self.int(left),
                right: self.int(right),
            },
        )
    }

    pub fn assign(&self, lhs: &'a Expr<'a>, rhs: &'a Expr<'a>) -> &'a Expr<'a> {
        self.expr(lhs.span, ExprKind::Assignment { lhs, rhs })
    }

    /// A hierarchical reference `port.member` through an interface port.
    pub fn via_port(
        &self,
        port: SymbolId,
        member: &str,
        target: SymbolId,
        needle: &str,
        n: usize,
    ) -> &'a Expr<'a> {
        let r = HierarchicalReference::new(
            &self.design,
            vec![
                PathElement {
                    symbol: port,
                    selector: Selector::Name(self.design[port].name),
                },
                PathElement {
                    symbol: target,
                    selector: Selector::Name(member.into()),
                },
            ],
            Some(target),
        );
        let r = self.arena.alloc_hier_ref(r);
        self.expr(self.span_nth(needle, n), ExprKind::HierarchicalValue(r))
    }
}

/// Collect the assignments of a procedure.
pub fn analyze<'a>(
    cx: &AnalysisContext<'a>,
    procedure: SymbolId,
    lvalues: &[&'a Expr<'a>],
) -> AnalyzedProcedure<'a> {
    let mut builder = ProcedureBuilder::new(cx, procedure);
    for lvalue in lvalues {
        builder.note_assignment(lvalue, None);
    }
    builder.finish()
}

/// The codes of all diagnostics emitted in a session, sorted.
pub fn diag_codes(sess: &Session) -> Vec<&'static str> {
    let mut codes: Vec<_> = sess
        .diagnostics()
        .iter()
        .map(|d| d.get_code().unwrap_or("-"))
        .collect();
    codes.sort();
    codes
}
