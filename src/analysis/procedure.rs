// Copyright (c) 2016-2021 Fabian Schuiki

//! Extraction of the drivers of a procedure.

use crate::context::AnalysisContext;
use crate::crate_prelude::*;
use crate::design::{SymbolId, SymbolKind};
use crate::driver::{Driver, DriverBitRange, DriverFlags, DriverKind, SymbolDriverListPair};
use crate::expr::Expr;
use crate::lsp::{get_bounds, visit_lsps};
use std::collections::HashMap;

/// The drivers of a procedure, grouped by the value they drive.
#[derive(Debug)]
pub struct AnalyzedProcedure<'a> {
    /// The procedural block or subroutine.
    pub symbol: SymbolId,
    drivers: Vec<SymbolDriverListPair<'a>>,
}

impl<'a> AnalyzedProcedure<'a> {
    /// The driven values in the order they were first assigned.
    pub fn drivers(&self) -> &[SymbolDriverListPair<'a>] {
        &self.drivers
    }
}

/// Collects the assignments made within a procedure.
pub struct ProcedureBuilder<'a> {
    cx: AnalysisContext<'a>,
    symbol: SymbolId,
    drivers: Vec<SymbolDriverListPair<'a>>,
    index: HashMap<SymbolId, usize>,
}

impl<'a> ProcedureBuilder<'a> {
    /// Start collecting the assignments of a procedural block or subroutine.
    pub fn new(cx: &AnalysisContext<'a>, symbol: SymbolId) -> Self {
        match cx.symbol(symbol).kind {
            SymbolKind::ProceduralBlock(..) | SymbolKind::Subroutine => (),
            ref other => panic!("{:?} is not a procedure", other),
        }
        ProcedureBuilder {
            cx: *cx,
            symbol,
            drivers: vec![],
            index: HashMap::new(),
        }
    }

    /// Record an assignment to `lvalue`.
    ///
    /// If the assignment happens within a subroutine called from the
    /// procedure, `proc_call` is the call expression.
    pub fn note_assignment(&mut self, lvalue: &'a Expr<'a>, proc_call: Option<&'a Expr<'a>>) {
        let cx = self.cx;
        let containing = self.symbol;
        let mut found: Vec<(SymbolId, &'a Driver<'a>, DriverBitRange)> = vec![];
        visit_lsps(lvalue, None, &mut |symbol, lsp, is_lvalue| {
            if !is_lvalue {
                return;
            }
            let ty = match cx.symbol(symbol).kind.value_type() {
                Some(ty) => ty,
                None => return,
            };
            let bounds = match get_bounds(lsp, ty) {
                Some(b) => b,
                None => return,
            };
            let mut driver = Driver::new(
                cx.design,
                DriverKind::Procedural,
                lsp,
                containing,
                DriverFlags::empty(),
            );
            driver.proc_call_expr = proc_call;
            found.push((symbol, cx.arena.alloc_driver(driver), bounds));
        });

        for (symbol, driver, bounds) in found {
            let drivers = &mut self.drivers;
            let index = *self.index.entry(symbol).or_insert_with(|| {
                drivers.push((symbol, vec![]));
                drivers.len() - 1
            });
            self.drivers[index].1.push((driver, bounds));
        }
    }

    /// Finish collection.
    pub fn finish(self) -> AnalyzedProcedure<'a> {
        trace!(
            "procedure {} drives {} values",
            self.cx.symbol(self.symbol).desc_full(),
            self.drivers.len()
        );
        AnalyzedProcedure {
            symbol: self.symbol,
            drivers: self.drivers,
        }
    }
}
