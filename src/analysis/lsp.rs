// Copyright (c) 2016-2021 Fabian Schuiki

//! Longest static prefixes.
//!
//! The longest static prefix (LSP) of a reference to a value is the largest
//! chain of selects around that reference whose indices are known at compile
//! time. For `a.b[3][i]` the LSP is `a.b[3]`. Drivers record the LSP of the
//! expression they assign, which identifies the bits of the value they drive.

use crate::context::Arenas;
use crate::crate_prelude::*;
use crate::design::{Design, SymbolId};
use crate::driver::DriverBitRange;
use crate::expr::{Expr, ExprKind, RangeSelectKind};
use crate::ty::{Range, Type};
use num::ToPrimitive;

/// Visit every reference to a value in an expression, together with its
/// longest static prefix and whether it is being assigned.
///
/// If `initial_lsp` is given, it is used as the LSP of the outermost value
/// reference in place of the one computed from `expr`. This allows a prefix
/// computed elsewhere to be rooted at `expr`.
pub fn visit_lsps<'a, F>(expr: &'a Expr<'a>, initial_lsp: Option<&'a Expr<'a>>, f: &mut F)
where
    F: FnMut(SymbolId, &'a Expr<'a>, bool),
{
    visit(expr, initial_lsp, true, f)
}

fn visit<'a, F>(expr: &'a Expr<'a>, lsp: Option<&'a Expr<'a>>, is_lvalue: bool, f: &mut F)
where
    F: FnMut(SymbolId, &'a Expr<'a>, bool),
{
    match expr.kind {
        ExprKind::NamedValue(symbol) => f(symbol, lsp.unwrap_or(expr), is_lvalue),
        ExprKind::HierarchicalValue(r) => match r.target {
            Some(symbol) => f(symbol, lsp.unwrap_or(expr), is_lvalue),
            None => trace!("skipping unresolved hierarchical reference `{}`", r),
        },
        ExprKind::ElementSelect { value, selector } => {
            // A dynamic index truncates the prefix at this select.
            let lsp = match selector.eval_const() {
                Some(_) => lsp.or(Some(expr)),
                None => None,
            };
            visit(value, lsp, is_lvalue, f);
            visit(selector, None, false, f);
        }
        ExprKind::RangeSelect {
            value, left, right, ..
        } => {
            let lsp = if is_static_range(expr) {
                lsp.or(Some(expr))
            } else {
                None
            };
            visit(value, lsp, is_lvalue, f);
            visit(left, None, false, f);
            visit(right, None, false, f);
        }
        ExprKind::MemberAccess { value, .. } => {
            visit(value, lsp.or(Some(expr)), is_lvalue, f);
        }
        ExprKind::Concatenation(ref items) => {
            for item in items {
                visit(item, None, is_lvalue, f);
            }
        }
        ExprKind::Assignment { lhs, rhs } => {
            visit(lhs, None, true, f);
            visit(rhs, None, false, f);
        }
        ExprKind::Unary { arg, .. } => visit(arg, None, false, f),
        ExprKind::Binary { lhs, rhs, .. } => {
            visit(lhs, None, false, f);
            visit(rhs, None, false, f);
        }
        ExprKind::Call { ref args, .. } => {
            for arg in args {
                visit(arg, None, false, f);
            }
        }
        ExprKind::Invalid | ExprKind::IntConst(..) | ExprKind::ArbitrarySymbol(..) => (),
    }
}

/// Check whether both bounds of a range select are constant.
fn is_static_range(expr: &Expr) -> bool {
    match expr.kind {
        ExprKind::RangeSelect { left, right, .. } => {
            left.eval_const().is_some() && right.eval_const().is_some()
        }
        _ => false,
    }
}

/// The state of a walk through a select chain: the lowest bit selected so far,
/// the number of bits, the type of the selected part, and a range that
/// overrides the type's own range after a range select.
struct Cursor<'a> {
    low: u64,
    width: u64,
    ty: Type<'a>,
    range: Option<Range>,
}

fn const_index(expr: &Expr) -> Option<isize> {
    expr.eval_const()?.to_isize()
}

fn select<'a>(expr: &Expr<'a>, root_ty: Type<'a>) -> Option<Cursor<'a>> {
    match expr.kind {
        ExprKind::NamedValue(..) | ExprKind::HierarchicalValue(..) => Some(Cursor {
            low: 0,
            width: root_ty.selectable_width(),
            ty: root_ty,
            range: None,
        }),
        ExprKind::ElementSelect { value, selector } => {
            let outer = select(value, root_ty)?;
            let range = outer.range.or_else(|| outer.ty.select_range())?;
            let (elem_ty, elem_width) = outer.ty.element()?;
            let pos = range.translate(const_index(selector)?)? as u64;
            Some(Cursor {
                low: outer.low + pos * elem_width,
                width: elem_width,
                ty: elem_ty,
                range: None,
            })
        }
        ExprKind::RangeSelect {
            mode,
            value,
            left,
            right,
        } => {
            let outer = select(value, root_ty)?;
            let range = outer.range.or_else(|| outer.ty.select_range())?;
            let (_, elem_width) = outer.ty.element()?;
            let left = const_index(left)?;
            let right = const_index(right)?;
            let (left, right) = match mode {
                RangeSelectKind::Simple => (left, right),
                RangeSelectKind::IndexedUp | RangeSelectKind::IndexedDown if right <= 0 => {
                    return None
                }
                RangeSelectKind::IndexedUp => (left.checked_add(right - 1)?, left),
                RangeSelectKind::IndexedDown => (left, left.checked_sub(right - 1)?),
            };
            let a = range.translate(left)? as u64;
            let b = range.translate(right)? as u64;
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            Some(Cursor {
                low: outer.low + lo * elem_width,
                width: (hi - lo + 1) * elem_width,
                ty: outer.ty,
                range: Some(Range::new(left, right)),
            })
        }
        ExprKind::MemberAccess { value, member } => {
            let outer = select(value, root_ty)?;
            if outer.range.is_some() {
                return None;
            }
            let (ty, offset) = outer.ty.find_member(member)?;
            Some(Cursor {
                low: outer.low + offset,
                width: ty.selectable_width(),
                ty,
                range: None,
            })
        }
        _ => None,
    }
}

/// Compute the bits of a value driven through a longest static prefix.
///
/// `root_ty` is the type of the value the prefix is rooted at. Returns `None`
/// if the prefix contains selects that cannot be resolved statically or that
/// are out of bounds.
pub fn get_bounds(lsp: &Expr, root_ty: Type) -> Option<DriverBitRange> {
    let cursor = select(lsp, root_ty)?;
    if cursor.width == 0 {
        return None;
    }
    Some(DriverBitRange::new(cursor.low, cursor.low + cursor.width - 1))
}

/// Render a longest static prefix as it would appear in source text, e.g.
/// `a[3]`, `s.f`, or `top.bus.data`.
pub fn stringify_lsp(lsp: &Expr, design: &Design) -> String {
    let mut out = String::new();
    write_lsp(lsp, design, &mut out);
    out
}

fn write_lsp(expr: &Expr, design: &Design, out: &mut String) {
    let index = |e: &Expr| match e.eval_const() {
        Some(v) => v.to_string(),
        None => "?".to_string(),
    };
    match expr.kind {
        ExprKind::NamedValue(symbol) => out.push_str(&design[symbol].name.as_str()),
        ExprKind::HierarchicalValue(r) | ExprKind::ArbitrarySymbol(r) => {
            out.push_str(&r.to_string())
        }
        ExprKind::ElementSelect { value, selector } => {
            write_lsp(value, design, out);
            out.push_str(&format!("[{}]", index(selector)));
        }
        ExprKind::RangeSelect {
            mode,
            value,
            left,
            right,
        } => {
            write_lsp(value, design, out);
            let sep = match mode {
                RangeSelectKind::Simple => ":",
                RangeSelectKind::IndexedUp => "+:",
                RangeSelectKind::IndexedDown => "-:",
            };
            out.push_str(&format!("[{}{}{}]", index(left), sep, index(right)));
        }
        ExprKind::MemberAccess { value, member } => {
            write_lsp(value, design, out);
            out.push('.');
            out.push_str(&member.as_str());
        }
        _ => out.push_str("<expr>"),
    }
}

/// Visit the components of a select chain, from the outermost select inwards.
/// The value reference at the root is only visited if `include_root` is set.
pub fn visit_components<'a>(
    lsp: &'a Expr<'a>,
    include_root: bool,
    mut f: impl FnMut(&'a Expr<'a>),
) {
    let mut expr = lsp;
    loop {
        match expr.kind {
            ExprKind::ElementSelect { value, .. }
            | ExprKind::RangeSelect { value, .. }
            | ExprKind::MemberAccess { value, .. } => {
                f(expr);
                expr = value;
            }
            ExprKind::NamedValue(..) | ExprKind::HierarchicalValue(..) => {
                if include_root {
                    f(expr);
                }
                return;
            }
            _ => return,
        }
    }
}

/// Rebuild the select chain of `lsp` on top of `new_root`, replacing the value
/// reference the chain was rooted at.
pub fn rebase_lsp<'a>(
    lsp: &'a Expr<'a>,
    new_root: &'a Expr<'a>,
    arena: &'a Arenas<'a>,
) -> &'a Expr<'a> {
    let kind = match lsp.kind {
        ExprKind::ElementSelect { value, selector } => ExprKind::ElementSelect {
            value: rebase_lsp(value, new_root, arena),
            selector,
        },
        ExprKind::RangeSelect {
            mode,
            value,
            left,
            right,
        } => ExprKind::RangeSelect {
            mode,
            value: rebase_lsp(value, new_root, arena),
            left,
            right,
        },
        ExprKind::MemberAccess { value, member } => ExprKind::MemberAccess {
            value: rebase_lsp(value, new_root, arena),
            member,
        },
        _ => return new_root,
    };
    arena.alloc_expr(Expr::new(lsp.span, kind))
}
