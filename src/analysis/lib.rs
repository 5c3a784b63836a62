// Copyright (c) 2016-2021 Fabian Schuiki

//! Multi-driver analysis for elaborated SystemVerilog designs.
//!
//! This crate tracks which bits of which values are driven by which
//! procedures, continuous assignments, ports, and clocking blocks, and reports
//! drivers that the language rules do not allow to coexist. The analysis is
//! fed from many threads at once through a shared [`DriverTracker`].
//!
//! A typical run looks as follows:
//!
//! 1. Build a [`Design`] and an [`AnalysisContext`] around it.
//! 2. Collect the assignments of every procedure with a [`ProcedureBuilder`]
//!    and record them with [`DriverTracker::record_procedure`].
//! 3. Record continuous assignments, ports, port connections, and clock vars.
//! 4. Note every instance that shares the body of another instance with
//!    [`DriverTracker::note_non_canonical_instance`].
//! 5. Call [`DriverTracker::propagate_modport_drivers`] once at the end.
//!
//! Conflicts are emitted as diagnostics on the session as they are found.

#[macro_use]
extern crate log;

pub extern crate sigdrive_common as common;

mod context;
pub mod design;
pub mod diags;
pub mod driver;
pub mod driver_map;
pub mod expr;
pub mod hier;
pub mod lsp;
pub mod policy;
pub mod procedure;
pub mod retarget;
mod tracker;
pub mod ty;

pub use crate::context::{AnalysisContext, Arenas};
pub use crate::design::{Design, PortConnection, SymbolId};
pub use crate::diags::DiagCode;
pub use crate::driver::{
    Driver, DriverBitRange, DriverFlags, DriverKind, DriverList, DriverSource,
    SymbolDriverListPair,
};
pub use crate::procedure::{AnalyzedProcedure, ProcedureBuilder};
pub use crate::tracker::DriverTracker;

/// Items commonly used within the crate.
mod crate_prelude {
    #[allow(unused_imports)]
    pub use crate::common::{
        errors::{DiagBuilder2, DiagEmitter, Severity},
        name::Name,
        source::{Span, INVALID_SPAN},
        util::{HasDesc, HasSpan},
        Session,
    };
    #[allow(unused_imports)]
    pub use num::{BigInt, One, ToPrimitive, Zero};
}
