// Copyright (c) 2016-2021 Fabian Schuiki

//! Hierarchical references such as `top.bus.data` or `port.sub[2].sig`.

use crate::context::Arenas;
use crate::crate_prelude::*;
use crate::design::{Design, SymbolId, SymbolKind};
use std::fmt;

/// A resolved hierarchical reference.
///
/// The first path element is the symbol the lookup started at. If that symbol
/// is an interface port, the reference reaches its target through the port and
/// is only meaningful for the instance the port belongs to.
#[derive(Debug, Clone)]
pub struct HierarchicalReference {
    /// The steps taken to reach the target.
    pub path: Vec<PathElement>,
    /// The value the reference resolves to.
    pub target: Option<SymbolId>,
    via_iface_port: bool,
}

/// One step of a hierarchical reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathElement {
    /// The symbol reached by this step.
    pub symbol: SymbolId,
    /// How the symbol was selected from the previous step.
    pub selector: Selector,
}

/// How a step of a hierarchical path selects its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// A member lookup by name, e.g. `.data`.
    Name(Name),
    /// An element of an array, e.g. `[2]`.
    Index(i32),
    /// A slice of an instance array, e.g. `[1:2]`.
    Range(i32, i32),
}

impl HierarchicalReference {
    /// Create a new reference. Whether it goes through an interface port is
    /// determined from the first path element.
    pub fn new(
        design: &Design,
        path: Vec<PathElement>,
        target: Option<SymbolId>,
    ) -> HierarchicalReference {
        let via_iface_port = match path.first() {
            Some(first) => match design[first.symbol].kind {
                SymbolKind::InterfacePort(..) => true,
                _ => false,
            },
            None => false,
        };
        HierarchicalReference {
            path,
            target,
            via_iface_port,
        }
    }

    /// Check whether the reference starts at an interface port.
    pub fn is_via_iface_port(&self) -> bool {
        self.via_iface_port
    }

    /// Extend this reference by another one that starts where this one ends.
    ///
    /// The first element of `other` is the interface port that this reference
    /// connects to, so it is dropped from the combined path.
    pub fn join<'a>(
        &self,
        arena: &'a Arenas<'a>,
        other: &HierarchicalReference,
    ) -> &'a HierarchicalReference {
        let mut path = self.path.clone();
        path.extend(other.path.iter().skip(1).cloned());
        arena.alloc_hier_ref(HierarchicalReference {
            path,
            target: other.target,
            via_iface_port: self.via_iface_port,
        })
    }
}

impl fmt::Display for HierarchicalReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, elem) in self.path.iter().enumerate() {
            match elem.selector {
                Selector::Name(name) if i == 0 => write!(f, "{}", name)?,
                Selector::Name(name) => write!(f, ".{}", name)?,
                Selector::Index(index) => write!(f, "[{}]", index)?,
                Selector::Range(left, right) => write!(f, "[{}:{}]", left, right)?,
            }
        }
        Ok(())
    }
}
