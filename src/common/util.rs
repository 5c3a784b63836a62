// Copyright (c) 2016-2021 Fabian Schuiki

//! Traits shared by everything diagnostics can point at.

use crate::source::Span;

/// A design node that covers a range of source text.
pub trait HasSpan {
    fn span(&self) -> Span;

    /// The span diagnostics should point at when referring to this node, such
    /// as just the name of a declaration. Defaults to `span()`.
    fn human_span(&self) -> Span {
        self.span()
    }
}

/// A design node that can be described in diagnostics.
pub trait HasDesc {
    /// A short description of what kind of node this is, e.g. "variable".
    fn desc(&self) -> &'static str;

    /// The description followed by the node's name where it has one, e.g.
    /// "variable `q`".
    fn desc_full(&self) -> String {
        self.desc().into()
    }
}
