// Copyright (c) 2016-2021 Fabian Schuiki

//! The diagnostics reported by the driver analysis.

use crate::crate_prelude::*;

/// The conflicts between drivers that the analysis reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagCode {
    InputPortAssign,
    InputPortCoercion,
    OutputPortCoercion,
    ClockVarTargetAssign,
    MultipleAlwaysAssigns,
    MultipleUWireDrivers,
    MultipleUDNTDrivers,
    MultipleContAssigns,
    MixedVarAssigns,
}

impl DiagCode {
    /// The stable name of the diagnostic, as attached to emitted diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            DiagCode::InputPortAssign => "input-port-assign",
            DiagCode::InputPortCoercion => "input-port-coercion",
            DiagCode::OutputPortCoercion => "output-port-coercion",
            DiagCode::ClockVarTargetAssign => "clockvar-target-assign",
            DiagCode::MultipleAlwaysAssigns => "multiple-always-assigns",
            DiagCode::MultipleUWireDrivers => "multiple-uwire-drivers",
            DiagCode::MultipleUDNTDrivers => "multiple-udnt-drivers",
            DiagCode::MultipleContAssigns => "multiple-cont-assigns",
            DiagCode::MixedVarAssigns => "mixed-var-assigns",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagCode::InputPortCoercion | DiagCode::OutputPortCoercion => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Start a diagnostic with this code.
    ///
    /// `name` is the name of the driven value or its longest static prefix.
    /// `extra` is the procedure kind for `MultipleAlwaysAssigns` and the net
    /// type name for `MultipleUDNTDrivers`, and ignored otherwise.
    pub fn build(self, name: &str, extra: &str) -> DiagBuilder2 {
        let message = match self {
            DiagCode::InputPortAssign => format!("cannot assign to input port `{}`", name),
            DiagCode::InputPortCoercion => {
                format!("input net port `{}` coerced to `inout`", name)
            }
            DiagCode::OutputPortCoercion => {
                format!("output net port `{}` coerced to `inout`", name)
            }
            DiagCode::ClockVarTargetAssign => format!(
                "cannot drive `{}` because it is the target of a clocking block output",
                name
            ),
            DiagCode::MultipleAlwaysAssigns => format!(
                "`{}` driven by `{}` procedure cannot be written to by any other process",
                name, extra
            ),
            DiagCode::MultipleUWireDrivers => {
                format!("`{}` cannot have multiple drivers because it is a uwire", name)
            }
            DiagCode::MultipleUDNTDrivers => format!(
                "`{}` cannot have multiple drivers because its net type `{}` has no resolution function",
                name, extra
            ),
            DiagCode::MultipleContAssigns => {
                format!("cannot have multiple continuous assignments to `{}`", name)
            }
            DiagCode::MixedVarAssigns => format!(
                "cannot mix continuous and procedural assignments to `{}`",
                name
            ),
        };
        DiagBuilder2::new(self.severity(), message).code(self.name())
    }
}

pub const NOTE_DECLARATION_HERE: &str = "declared here";
pub const NOTE_DRIVEN_HERE: &str = "driven here";
pub const NOTE_REFERENCED_HERE: &str = "referenced here";
pub const NOTE_ASSIGNED_HERE: &str = "also assigned here";
pub const NOTE_ORIGINAL_ASSIGN: &str = "the assignment happens within the called subroutine here";

/// The note used when two conflicting drivers share a source location, which
/// happens when the same code is instantiated more than once.
pub fn note_from_here2(first: &str, second: &str) -> String {
    format!("drivers from `{}` and `{}`", first, second)
}
