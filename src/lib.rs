// Copyright (c) 2016-2021 Fabian Schuiki

//! Multi-driver analysis for elaborated hardware designs.
//!
//! This crate bundles the subcrates of the analysis. See
//! [`analysis::DriverTracker`] for the entry point.

// Re-export everything from the common crate.
pub extern crate sigdrive_common as common;
pub use crate::common::*;

pub extern crate sigdrive_analysis as analysis;
