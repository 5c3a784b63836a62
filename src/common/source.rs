// Copyright (c) 2016-2021 Fabian Schuiki

//! Source text registry and byte spans into it.
//!
//! Every piece of HDL text the front end hands over is registered once and
//! referred to by a small `Source` handle afterwards. Spans are plain byte
//! ranges into such a text. The registry is global and may be read from any
//! analysis worker.

use crate::name::RcStr;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

pub const INVALID_SOURCE: Source = Source(0);
pub const INVALID_SPAN: Span = Span {
    source: INVALID_SOURCE,
    begin: 0,
    end: 0,
};

/// A handle to a registered source text. Zero is reserved for "no source".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Source(pub u32);

impl Source {
    /// The name the text was registered under.
    pub fn get_path(self) -> RcStr {
        get_source_manager().with(self, |x| x.name.clone())
    }

    /// The registered text.
    pub fn get_content(self) -> Arc<str> {
        get_source_manager().with(self, |x| x.text.clone())
    }

    pub fn is_valid(self) -> bool {
        self != INVALID_SOURCE
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.get_path())
        } else {
            write!(f, "<no source>")
        }
    }
}

struct SourceText {
    name: RcStr,
    text: Arc<str>,
}

/// The registry of source texts.
pub struct SourceManager {
    texts: RwLock<Vec<Arc<SourceText>>>,
}

impl SourceManager {
    /// Run `f` on the text registered as `id`.
    ///
    /// Panics if `id` was not handed out by this registry.
    fn with<F, R>(&self, id: Source, f: F) -> R
    where
        F: FnOnce(&SourceText) -> R,
    {
        let text = {
            let texts = self.texts.read();
            match (id.0 as usize).checked_sub(1).and_then(|i| texts.get(i)) {
                Some(text) => text.clone(),
                None => panic!("{:?} is not a registered source", id.0),
            }
        };
        f(&text)
    }

    /// Register a text under a name, e.g. the file it was read from.
    pub fn add(&self, name: &str, text: &str) -> Source {
        let mut texts = self.texts.write();
        texts.push(Arc::new(SourceText {
            name: RcStr::new(name),
            text: text.into(),
        }));
        Source(texts.len() as u32)
    }

    /// Register a text that has no name.
    pub fn add_anonymous<S: Into<String>>(&self, text: S) -> Source {
        self.add("<anonymous>", &text.into())
    }
}

/// Get the global source registry.
pub fn get_source_manager() -> &'static SourceManager {
    static REGISTRY: Lazy<SourceManager> = Lazy::new(|| SourceManager {
        texts: RwLock::new(Vec::new()),
    });
    &REGISTRY
}

/// A byte offset into a source text.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash, Debug)]
pub struct Location {
    pub source: Source,
    pub offset: usize,
}

impl Location {
    /// The 1-based line and column of this location, and the byte offset at
    /// which its line starts.
    pub fn line_column(self) -> (usize, usize, usize) {
        let text = self.source.get_content();
        let before = text.get(..self.offset).unwrap_or(&text[..]);
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let line = before.matches('\n').count() + 1;
        let column = before[line_start..].chars().count() + 1;
        (line, column, line_start)
    }
}

/// A half-open byte range `[begin,end)` in a source text.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Span {
    pub source: Source,
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(source: Source, begin: usize, end: usize) -> Span {
        Span { source, begin, end }
    }

    pub fn begin(&self) -> Location {
        Location {
            source: self.source,
            offset: self.begin,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.source.is_valid()
    }

    /// The text covered by this span.
    pub fn extract(&self) -> String {
        let text = self.source.get_content();
        text.get(self.begin..self.end).unwrap_or_default().to_string()
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}:{}-{}", self.source, self.begin, self.end)
    }
}
