// Copyright (c) 2016-2021 Fabian Schuiki

//! The context shared by all parts of the driver analysis.
//!
//! The [`AnalysisContext`] bundles the session, the arenas that own everything
//! allocated during the analysis, and the design being analyzed. It is cheap to
//! copy and may be shared between worker threads.
//!
//! # Example
//!
//! ```
//! # use sigdrive_common::Session;
//! # use sigdrive_analysis::{AnalysisContext, Arenas, Design};
//! let sess = Session::new();
//! let arena = Arenas::default();
//! let design = Design::new();
//! let cx = AnalysisContext::new(&sess, &arena, &design);
//! assert!(!cx.allow_dup_initial_drivers());
//! ```

use crate::common::arenas::TypedArena;
use crate::crate_prelude::*;
use crate::{
    design::{Design, Symbol, SymbolId},
    driver::Driver,
    expr::Expr,
    hier::HierarchicalReference,
    ty::{Type, TypeKind},
};

/// The arenas that own everything allocated during an analysis run.
///
/// Drivers, synthesized expressions, and joined hierarchical references live
/// until the arenas are dropped at the end of the run.
#[derive(Default)]
pub struct Arenas<'a> {
    types: TypedArena<TypeKind<'a>>,
    exprs: TypedArena<Expr<'a>>,
    hier_refs: TypedArena<HierarchicalReference>,
    drivers: TypedArena<Driver<'a>>,
}

impl<'a> Arenas<'a> {
    /// Allocate a type.
    pub fn alloc_type(&'a self, ty: TypeKind<'a>) -> Type<'a> {
        self.types.alloc(ty)
    }

    /// Allocate an expression.
    pub fn alloc_expr(&'a self, expr: Expr<'a>) -> &'a Expr<'a> {
        self.exprs.alloc(expr)
    }

    /// Allocate a hierarchical reference.
    pub fn alloc_hier_ref(&'a self, r: HierarchicalReference) -> &'a HierarchicalReference {
        self.hier_refs.alloc(r)
    }

    /// Allocate a driver.
    pub fn alloc_driver(&'a self, driver: Driver<'a>) -> &'a Driver<'a> {
        self.drivers.alloc(driver)
    }
}

/// The context of a driver analysis run.
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    /// The session, which carries the options and collects diagnostics.
    pub sess: &'a Session,
    /// The arenas that own everything allocated during the analysis.
    pub arena: &'a Arenas<'a>,
    /// The design being analyzed.
    pub design: &'a Design<'a>,
}

impl<'a> AnalysisContext<'a> {
    /// Create a new context.
    pub fn new(sess: &'a Session, arena: &'a Arenas<'a>, design: &'a Design<'a>) -> Self {
        AnalysisContext {
            sess,
            arena,
            design,
        }
    }

    /// Access a symbol of the design.
    pub fn symbol(&self, id: SymbolId) -> &'a Symbol<'a> {
        self.design.symbol(id)
    }

    /// Whether drivers in `initial` procedures may overlap with drivers in
    /// single-driver procedures.
    pub fn allow_dup_initial_drivers(&self) -> bool {
        self.sess.opts.allow_dup_initial_drivers
    }
}

impl DiagEmitter for AnalysisContext<'_> {
    fn emit(&self, diag: DiagBuilder2) {
        let sev = diag.get_severity();
        self.sess.emit(diag);

        // If this is anything more than a note, emit a backtrace in debug
        // builds.
        if sev >= Severity::Warning {
            trace!(
                "Diagnostic triggered here:\n{:?}",
                backtrace::Backtrace::new()
            );
        }
    }
}
