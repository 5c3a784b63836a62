// Copyright (c) 2018-2021 Fabian Schuiki

//! Multi-type arena allocation
//!
//! The arenas in this module may be shared between threads. Allocation is
//! serialized through a lock, but the references handed out are plain shared
//! references that live as long as the arena itself.

#![deny(missing_docs)]

use parking_lot::Mutex;

/// An arena of objects of type `T` that can be shared between threads.
pub struct TypedArena<T> {
    inner: Mutex<typed_arena::Arena<T>>,
}

impl<T> TypedArena<T> {
    /// Create a new empty arena.
    pub fn new() -> Self {
        TypedArena {
            inner: Mutex::new(typed_arena::Arena::new()),
        }
    }

    /// Move `value` into the arena and return a reference to it.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc(&self, value: T) -> &mut T {
        let ptr: *mut T = self.inner.lock().alloc(value);
        // SAFETY: `typed_arena` never moves or frees an allocated value before
        // the arena itself is dropped, and the arena outlives the `&self`
        // borrow. Each call hands out a distinct value.
        unsafe { &mut *ptr }
    }
}

impl<T> Default for TypedArena<T> {
    fn default() -> Self {
        TypedArena::new()
    }
}
