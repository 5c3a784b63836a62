// Copyright (c) 2016-2021 Fabian Schuiki

//! This crate contains the fundamental utilities used by the rest of the
//! driver analysis.

#[macro_use]
extern crate log;

pub mod arenas;
pub mod errors;
pub mod name;
pub mod source;
pub mod util;

use crate::errors::{DiagBuilder2, DiagEmitter, Severity};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A session of the analysis.
///
/// The session carries the user-provided options and collects all diagnostics
/// emitted during a run. It may be shared between threads.
pub struct Session {
    pub opts: SessionOptions,
    /// Whether any error diagnostics were produced.
    pub failed: AtomicBool,
    diagnostics: Mutex<Vec<DiagBuilder2>>,
}

impl Session {
    /// Create a new session with default options.
    pub fn new() -> Session {
        Session::with_options(SessionOptions::default())
    }

    /// Create a new session with the given options.
    pub fn with_options(opts: SessionOptions) -> Session {
        Session {
            opts,
            failed: AtomicBool::new(false),
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// Check whether any errors were emitted during this session.
    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Obtain a copy of all diagnostics emitted so far, in emission order.
    pub fn diagnostics(&self) -> Vec<DiagBuilder2> {
        self.diagnostics.lock().clone()
    }
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

impl DiagEmitter for Session {
    fn emit(&self, diag: DiagBuilder2) {
        if diag.get_severity() >= Severity::Error {
            self.failed.store(true, Ordering::SeqCst);
        }
        debug!(
            "{}: {} [{}]",
            diag.get_severity(),
            diag.get_message(),
            diag.get_code().unwrap_or("-")
        );
        self.diagnostics.lock().push(diag);
    }
}

/// The options that control the behavior of an analysis session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Allow `initial` blocks to drive the same bits as an `always_comb` or
    /// `always_ff` procedure.
    pub allow_dup_initial_drivers: bool,
    /// Print a trace of every driver recorded, for debugging purposes.
    pub trace_drivers: bool,
}
