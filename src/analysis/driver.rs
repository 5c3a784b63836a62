// Copyright (c) 2016-2021 Fabian Schuiki

//! Drivers of values.
//!
//! A [`Driver`] represents one place in the design that assigns all or part of
//! a value. Drivers are allocated in the [`Arenas`](crate::Arenas) and are
//! immutable once created.

use crate::crate_prelude::*;
use crate::design::{Design, ProceduralBlockKind, SymbolId, SymbolKind};
use crate::expr::Expr;
use bitflags::bitflags;
use std::fmt;

/// Whether a driver is active continuously or from procedural code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Procedural,
    Continuous,
}

bitflags! {
    /// Additional information about a driver.
    #[derive(Default)]
    pub struct DriverFlags: u8 {
        /// The driver is the internal side of an input port.
        const INPUT_PORT = 1 << 0;
        /// The driver is the external side of an output port connection.
        const OUTPUT_PORT = 1 << 1;
        /// The driver is the target of a clocking block output.
        const CLOCK_VAR = 1 << 2;
        /// The driver is the declared initializer of the value.
        const INITIALIZER = 1 << 3;
        /// The driver was replayed from another instance sharing the same body.
        const FROM_SIDE_EFFECT = 1 << 4;
    }
}

/// Where a driver originates from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverSource {
    Initial,
    Final,
    Always,
    AlwaysComb,
    AlwaysLatch,
    AlwaysFF,
    Subroutine,
    Other,
}

impl DriverSource {
    /// Determine the source of drivers created within `containing`.
    pub fn of_symbol(design: &Design, containing: SymbolId) -> DriverSource {
        match design[containing].kind {
            SymbolKind::ProceduralBlock(kind) => kind.into(),
            SymbolKind::Subroutine => DriverSource::Subroutine,
            _ => DriverSource::Other,
        }
    }

    /// Check whether this source is a procedure that must be the only one
    /// writing to the bits it drives.
    pub fn is_single_driver(self) -> bool {
        match self {
            DriverSource::AlwaysComb | DriverSource::AlwaysLatch | DriverSource::AlwaysFF => true,
            _ => false,
        }
    }

    /// The keyword of the procedure this source refers to.
    pub fn procedure_kind_str(self) -> &'static str {
        match self {
            DriverSource::Initial => "initial",
            DriverSource::Final => "final",
            DriverSource::Always => "always",
            DriverSource::AlwaysComb => "always_comb",
            DriverSource::AlwaysLatch => "always_latch",
            DriverSource::AlwaysFF => "always_ff",
            DriverSource::Subroutine => "subroutine",
            DriverSource::Other => "<other>",
        }
    }
}

impl From<ProceduralBlockKind> for DriverSource {
    fn from(kind: ProceduralBlockKind) -> DriverSource {
        match kind {
            ProceduralBlockKind::Initial => DriverSource::Initial,
            ProceduralBlockKind::Final => DriverSource::Final,
            ProceduralBlockKind::Always => DriverSource::Always,
            ProceduralBlockKind::AlwaysComb => DriverSource::AlwaysComb,
            ProceduralBlockKind::AlwaysLatch => DriverSource::AlwaysLatch,
            ProceduralBlockKind::AlwaysFF => DriverSource::AlwaysFF,
        }
    }
}

/// One assignment of a value.
#[derive(Debug, Clone)]
pub struct Driver<'a> {
    pub kind: DriverKind,
    pub flags: DriverFlags,
    pub source: DriverSource,
    /// The procedure, instance, or scope responsible for the assignment.
    pub containing_symbol: SymbolId,
    /// The longest static prefix of the assigned expression.
    pub prefix_expr: &'a Expr<'a>,
    /// The call through which the assignment happened, if any.
    pub proc_call_expr: Option<&'a Expr<'a>>,
}

impl<'a> Driver<'a> {
    /// Create a new driver. The source is derived from the containing symbol.
    pub fn new(
        design: &Design<'a>,
        kind: DriverKind,
        prefix_expr: &'a Expr<'a>,
        containing_symbol: SymbolId,
        flags: DriverFlags,
    ) -> Driver<'a> {
        Driver {
            kind,
            flags,
            source: DriverSource::of_symbol(design, containing_symbol),
            containing_symbol,
            prefix_expr,
            proc_call_expr: None,
        }
    }

    pub fn is_input_port(&self) -> bool {
        self.flags.contains(DriverFlags::INPUT_PORT)
    }

    /// Check whether the driver comes from either side of an input or output
    /// port.
    pub fn is_unidirectional_port(&self) -> bool {
        self.flags
            .intersects(DriverFlags::INPUT_PORT | DriverFlags::OUTPUT_PORT)
    }

    pub fn is_clock_var(&self) -> bool {
        self.flags.contains(DriverFlags::CLOCK_VAR)
    }

    pub fn is_in_single_driver_procedure(&self) -> bool {
        self.source.is_single_driver()
    }

    /// The location to report for this driver: the call site if the
    /// assignment happened within a called subroutine, or the assigned
    /// expression otherwise.
    pub fn source_span(&self) -> Span {
        match self.proc_call_expr {
            Some(call) => call.span,
            None => self.prefix_expr.span,
        }
    }
}

/// A range of bits `[low, high]` within the flattened representation of a
/// value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DriverBitRange {
    pub low: u64,
    pub high: u64,
}

impl DriverBitRange {
    pub fn new(low: u64, high: u64) -> DriverBitRange {
        debug_assert!(low <= high);
        DriverBitRange { low, high }
    }

    /// Check whether two ranges share at least one bit.
    pub fn overlaps(&self, other: &DriverBitRange) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

impl fmt::Display for DriverBitRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}:{}]", self.high, self.low)
    }
}

/// The drivers of one value, together with the bits they drive.
pub type DriverList<'a> = Vec<(&'a Driver<'a>, DriverBitRange)>;

/// A value and its drivers.
pub type SymbolDriverListPair<'a> = (SymbolId, DriverList<'a>);
