// Copyright (c) 2016-2021 Fabian Schuiki

//! Interned identifiers.
//!
//! Symbol names and hierarchical path selectors are compared and hashed a
//! lot while drivers are recorded, so they are interned into a global table
//! once and passed around as 32 bit tags. Names are case sensitive.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(pub u32);

impl Name {
    pub fn as_str(self) -> RcStr {
        get_name_table().get(self)
    }

    /// Check whether this is the name of an unnamed symbol.
    pub fn is_empty(self) -> bool {
        self.as_str().is_empty()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "`{}`#{}", self, self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Name {
        get_name_table().intern(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Name {
        get_name_table().intern(&s)
    }
}

/// A shared, immutable string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RcStr(Arc<str>);

impl RcStr {
    pub fn new(value: &str) -> RcStr {
        RcStr(value.into())
    }
}

impl fmt::Debug for RcStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl fmt::Display for RcStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self)
    }
}

impl Borrow<str> for RcStr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for RcStr {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

#[derive(Default)]
struct Interner {
    by_str: HashMap<RcStr, Name>,
    strs: Vec<RcStr>,
}

/// The bidirectional mapping between strings and names.
#[derive(Default)]
pub struct NameTable {
    inner: RwLock<Interner>,
}

impl NameTable {
    /// Get the name of a string, assigning a new one on first sight.
    pub fn intern(&self, value: &str) -> Name {
        if let Some(&name) = self.inner.read().by_str.get(value) {
            return name;
        }
        let mut inner = self.inner.write();
        // Another thread may have won the race for the write lock.
        if let Some(&name) = inner.by_str.get(value) {
            return name;
        }
        let name = Name(inner.strs.len() as u32);
        let value = RcStr::new(value);
        inner.strs.push(value.clone());
        inner.by_str.insert(value, name);
        name
    }

    pub fn get(&self, name: Name) -> RcStr {
        self.inner.read().strs[name.0 as usize].clone()
    }
}

/// Get the global name table.
pub fn get_name_table() -> &'static NameTable {
    static TABLE: Lazy<NameTable> = Lazy::new(NameTable::default);
    &TABLE
}
