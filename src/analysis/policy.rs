// Copyright (c) 2016-2021 Fabian Schuiki

//! The rules that decide whether two drivers of the same bits conflict, and
//! which diagnostic to report if they do.
//!
//! Everything in here is free of side effects. The tracker applies the
//! verdicts by emitting the returned diagnostics.

use crate::crate_prelude::*;
use crate::design::{Design, Lifetime, NetKind, Symbol, SymbolKind};
use crate::diags::{self, DiagCode};
use crate::driver::{Driver, DriverFlags, DriverKind, DriverSource};
use crate::lsp::stringify_lsp;

/// The properties of a driven value that affect how overlapping drivers are
/// treated.
#[derive(Debug, Clone, Copy)]
pub struct ValueInfo {
    pub name: Name,
    pub is_net: bool,
    pub is_uwire: bool,
    /// The value is a net of a user-defined net type without a resolution
    /// function.
    pub is_single_driver_udnt: bool,
    /// The name of the net type, if the value is a net.
    pub net_type_name: Option<Name>,
    /// Procedural drivers of the value must not overlap.
    pub check_overlap: bool,
    pub allow_dup_initial_drivers: bool,
}

impl ValueInfo {
    pub fn new(symbol: &Symbol, allow_dup_initial_drivers: bool) -> ValueInfo {
        let net_type = match symbol.kind {
            SymbolKind::Net(ref net) => Some(net.net_type),
            _ => None,
        };
        let is_uwire = net_type.map(|t| t.kind == NetKind::UWire).unwrap_or(false);
        let is_single_driver_udnt = net_type
            .map(|t| t.kind == NetKind::UserDefined && !t.has_resolution_fn)
            .unwrap_or(false);
        let is_static_var = match symbol.kind {
            SymbolKind::Variable(ref v)
            | SymbolKind::ClassProperty(ref v)
            | SymbolKind::Field(ref v)
            | SymbolKind::LocalAssertionVar(ref v) => v.lifetime == Lifetime::Static,
            // Clock vars are always static.
            SymbolKind::ClockVar(..) => true,
            _ => false,
        };
        let is_assertion_local = match symbol.kind {
            SymbolKind::LocalAssertionVar(..) => true,
            _ => false,
        };
        ValueInfo {
            name: symbol.name,
            is_net: net_type.is_some(),
            is_uwire,
            is_single_driver_udnt,
            net_type_name: net_type.map(|t| t.name),
            check_overlap: is_static_var || is_uwire || is_single_driver_udnt || is_assertion_local,
            allow_dup_initial_drivers,
        }
    }

    /// Check whether a driver is exempt from the rule that single-driver
    /// procedures may not share their bits with other procedures.
    pub fn should_ignore(&self, driver: &Driver) -> bool {
        driver.source == DriverSource::Subroutine
            || driver.flags.contains(DriverFlags::INITIALIZER)
            || (driver.source == DriverSource::Initial && self.allow_dup_initial_drivers)
    }
}

/// Decide whether a new driver overlapping with an existing one is a problem
/// that needs to be diagnosed.
pub fn is_problem(info: &ValueInfo, curr: &Driver, driver: &Driver) -> bool {
    if curr.is_unidirectional_port() != driver.is_unidirectional_port() {
        return true;
    }
    if !info.check_overlap {
        return false;
    }
    if curr.kind == DriverKind::Continuous || driver.kind == DriverKind::Continuous {
        return true;
    }
    curr.containing_symbol != driver.containing_symbol
        && !info.should_ignore(curr)
        && !info.should_ignore(driver)
        && (curr.is_in_single_driver_procedure() || driver.is_in_single_driver_procedure())
}

/// The outcome of handling an overlap between two drivers.
#[derive(Debug)]
pub struct OverlapVerdict {
    /// The diagnostic to report, if any.
    pub diag: Option<DiagBuilder2>,
    /// Whether the remaining overlapping drivers should still be checked.
    pub keep_scanning: bool,
}

impl OverlapVerdict {
    fn allowed() -> OverlapVerdict {
        OverlapVerdict {
            diag: None,
            keep_scanning: true,
        }
    }

    fn report(diag: DiagBuilder2, keep_scanning: bool) -> OverlapVerdict {
        OverlapVerdict {
            diag: Some(diag),
            keep_scanning,
        }
    }
}

/// Decide how to report an overlap between an existing driver `curr` and a new
/// driver `driver` that `is_problem` flagged.
pub fn handle_overlap(
    design: &Design,
    info: &ValueInfo,
    curr: &Driver,
    driver: &Driver,
) -> OverlapVerdict {
    let mut curr_span = curr.source_span();
    let mut driver_span = driver.source_span();

    // Port directions. Input ports of variables cannot be assigned, and net
    // ports that are driven from the other side become bidirectional.
    let is_unidirectional_net_port =
        info.is_net && (curr.is_unidirectional_port() || driver.is_unidirectional_port());
    if (is_unidirectional_net_port && !info.is_uwire && !info.is_single_driver_udnt)
        || (!info.is_net && (curr.is_input_port() || driver.is_input_port()))
    {
        let code = if !info.is_net {
            DiagCode::InputPortAssign
        } else if curr.flags.contains(DriverFlags::INPUT_PORT) {
            DiagCode::InputPortCoercion
        } else {
            DiagCode::OutputPortCoercion
        };

        // Output ports show up at the instantiation site, which is then
        // considered the port declaration.
        let (mut port_span, mut assign_span) = (curr_span, driver_span);
        if driver.is_input_port() || curr.flags.contains(DriverFlags::OUTPUT_PORT) {
            std::mem::swap(&mut port_span, &mut assign_span);
        }
        let note = if code == DiagCode::OutputPortCoercion {
            diags::NOTE_DRIVEN_HERE
        } else {
            diags::NOTE_DECLARATION_HERE
        };
        let diag = code
            .build(&info.name.as_str(), "")
            .span(assign_span)
            .add_note_at(note, port_span);
        return OverlapVerdict::report(diag, info.is_net);
    }

    if curr.is_clock_var() || driver.is_clock_var() {
        if curr.is_clock_var() && driver.is_clock_var() {
            return OverlapVerdict::allowed();
        }
        if curr.kind == DriverKind::Procedural || driver.kind == DriverKind::Procedural {
            return OverlapVerdict::allowed();
        }
        if driver.is_clock_var() {
            std::mem::swap(&mut driver_span, &mut curr_span);
        }
        let diag = DiagCode::ClockVarTargetAssign
            .build(&info.name.as_str(), "")
            .span(driver_span)
            .add_note_at(diags::NOTE_REFERENCED_HERE, curr_span);
        return OverlapVerdict::report(diag, false);
    }

    // Identical locations mean the same code drives the value from two
    // different places in the hierarchy.
    let add_assigned_here_note = |diag: DiagBuilder2, curr_span: Span, driver_span: Span| {
        if curr_span.begin() != driver_span.begin() {
            diag.add_note_at(diags::NOTE_ASSIGNED_HERE, curr_span)
        } else {
            diag.add_note(diags::note_from_here2(
                &design.hierarchical_path(driver.containing_symbol),
                &design.hierarchical_path(curr.containing_symbol),
            ))
        }
    };

    if curr.kind == DriverKind::Procedural && driver.kind == DriverKind::Procedural {
        let (proc_kind, name_source) = if driver.is_in_single_driver_procedure() {
            (driver.source, driver)
        } else {
            std::mem::swap(&mut driver_span, &mut curr_span);
            (curr.source, curr)
        };
        let diag = DiagCode::MultipleAlwaysAssigns
            .build(
                &stringify_lsp(name_source.prefix_expr, design),
                proc_kind.procedure_kind_str(),
            )
            .span(driver_span);
        let mut diag = add_assigned_here_note(diag, curr_span, driver_span);
        if driver.proc_call_expr.is_some() || curr.proc_call_expr.is_some() {
            let original = if driver.proc_call_expr.is_some() {
                driver.prefix_expr.span
            } else {
                curr.prefix_expr.span
            };
            diag = diag.add_note_at(diags::NOTE_ORIGINAL_ASSIGN, original);
        }
        return OverlapVerdict::report(diag, false);
    }

    let code = if info.is_uwire {
        DiagCode::MultipleUWireDrivers
    } else if info.is_single_driver_udnt {
        DiagCode::MultipleUDNTDrivers
    } else if driver.kind == DriverKind::Continuous && curr.kind == DriverKind::Continuous {
        DiagCode::MultipleContAssigns
    } else {
        DiagCode::MixedVarAssigns
    };
    let net_type_name = match info.net_type_name {
        Some(name) if info.is_single_driver_udnt => name.as_str().to_string(),
        _ => String::new(),
    };
    let diag = code
        .build(&stringify_lsp(driver.prefix_expr, design), &net_type_name)
        .span(driver_span);
    let diag = add_assigned_here_note(diag, curr_span, driver_span);
    OverlapVerdict::report(diag, false)
}
