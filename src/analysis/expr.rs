// Copyright (c) 2016-2021 Fabian Schuiki

//! Bound expressions.
//!
//! These are the fully resolved expressions handed to the driver analysis by
//! the front end. Names have been resolved to symbols, and hierarchical names
//! to [`HierarchicalReference`]s.

use crate::crate_prelude::*;
use crate::design::SymbolId;
use crate::hier::HierarchicalReference;
use num::BigInt;

/// A bound expression.
#[derive(Debug)]
pub struct Expr<'a> {
    pub span: Span,
    pub kind: ExprKind<'a>,
}

/// The different kinds of expressions.
#[derive(Debug)]
pub enum ExprKind<'a> {
    /// An expression that failed to bind.
    Invalid,
    /// An integer literal.
    IntConst(BigInt),
    /// A reference to a value in the current scope, e.g. `a`.
    NamedValue(SymbolId),
    /// A hierarchical reference to a value, e.g. `top.bus.data`.
    HierarchicalValue(&'a HierarchicalReference),
    /// A hierarchical reference to a non-value symbol, e.g. an interface
    /// instance connected to an interface port.
    ArbitrarySymbol(&'a HierarchicalReference),
    /// An element or bit select, e.g. `a[3]`.
    ElementSelect {
        value: &'a Expr<'a>,
        selector: &'a Expr<'a>,
    },
    /// A range select, e.g. `a[7:4]`, `a[i+:4]`, or `a[i-:4]`.
    RangeSelect {
        mode: RangeSelectKind,
        value: &'a Expr<'a>,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },
    /// A struct member access, e.g. `s.valid`.
    MemberAccess { value: &'a Expr<'a>, member: Name },
    /// A concatenation, e.g. `{a, b}`.
    Concatenation(Vec<&'a Expr<'a>>),
    /// An assignment, e.g. the `a = b` in a port connection `.x(a = b)`.
    Assignment { lhs: &'a Expr<'a>, rhs: &'a Expr<'a> },
    /// A unary operator.
    Unary { op: UnaryOp, arg: &'a Expr<'a> },
    /// A binary operator.
    Binary {
        op: BinaryOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },
    /// A call to a task or function.
    Call {
        subroutine: SymbolId,
        args: Vec<&'a Expr<'a>>,
    },
}

/// The flavor of a range select.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeSelectKind {
    /// `a[left:right]`
    Simple,
    /// `a[base+:width]`
    IndexedUp,
    /// `a[base-:width]`
    IndexedDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    BitNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    BitAnd,
    BitOr,
}

impl<'a> Expr<'a> {
    /// Create a new expression.
    pub fn new(span: Span, kind: ExprKind<'a>) -> Expr<'a> {
        Expr { span, kind }
    }

    /// Check whether the expression failed to bind.
    pub fn is_bad(&self) -> bool {
        match self.kind {
            ExprKind::Invalid => true,
            _ => false,
        }
    }

    /// Try to evaluate the expression to a constant integer.
    ///
    /// Only literals and a handful of arithmetic operators are folded.
    /// Anything else, including references to values, is considered dynamic.
    pub fn eval_const(&self) -> Option<BigInt> {
        match self.kind {
            ExprKind::IntConst(ref v) => Some(v.clone()),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                arg,
            } => arg.eval_const().map(|v| -v),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = lhs.eval_const()?;
                let rhs = rhs.eval_const()?;
                match op {
                    BinaryOp::Add => Some(lhs + rhs),
                    BinaryOp::Sub => Some(lhs - rhs),
                    BinaryOp::Mul => Some(lhs * rhs),
                    BinaryOp::BitAnd | BinaryOp::BitOr => None,
                }
            }
            _ => None,
        }
    }
}

impl HasSpan for Expr<'_> {
    fn span(&self) -> Span {
        self.span
    }
}

impl HasDesc for Expr<'_> {
    fn desc(&self) -> &'static str {
        match self.kind {
            ExprKind::Invalid => "invalid expression",
            ExprKind::IntConst(..) => "integer constant",
            ExprKind::NamedValue(..) | ExprKind::HierarchicalValue(..) => "value reference",
            ExprKind::ArbitrarySymbol(..) => "symbol reference",
            ExprKind::ElementSelect { .. } => "element select",
            ExprKind::RangeSelect { .. } => "range select",
            ExprKind::MemberAccess { .. } => "member access",
            ExprKind::Concatenation(..) => "concatenation",
            ExprKind::Assignment { .. } => "assignment",
            ExprKind::Unary { .. } => "unary expression",
            ExprKind::Binary { .. } => "binary expression",
            ExprKind::Call { .. } => "call",
        }
    }
}
