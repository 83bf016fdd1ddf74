//! Cycle detection for a single top-level resolution.
//!
//! Every top-level `resolve` call owns a fresh [`ConstructionStack`]; nothing
//! is shared between unrelated calls, so two resolutions of overlapping keys
//! never trip each other's detector. Async factories carry the chain by value
//! and seed a new stack from it when they resolve further.

use std::cell::RefCell;

use smallvec::SmallVec;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Keys currently under construction, outermost first.
#[derive(Default)]
pub(crate) struct ConstructionStack {
    frames: RefCell<SmallVec<[Key; 8]>>,
}

impl ConstructionStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stack that continues a chain captured by an async factory.
    pub(crate) fn seeded(chain: &[Key]) -> Self {
        Self {
            frames: RefCell::new(chain.iter().cloned().collect()),
        }
    }

    /// Pushes `key`, failing if it is already being built.
    pub(crate) fn enter(&self, key: &Key, max_depth: usize) -> DiResult<StackGuard<'_>> {
        let mut frames = self.frames.borrow_mut();

        // Circular detection BEFORE pushing the new key
        if frames.iter().any(|k| k == key) {
            let mut path: Vec<Key> = frames.to_vec();
            path.push(key.clone());
            return Err(DiError::Circular(path));
        }

        if frames.len() >= max_depth {
            return Err(DiError::DepthExceeded(max_depth));
        }

        frames.push(key.clone());
        Ok(StackGuard { stack: self })
    }

    pub(crate) fn snapshot(&self) -> Vec<Key> {
        self.frames.borrow().to_vec()
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.frames.borrow().len()
    }
}

/// Pops its frame on drop, on success and failure alike.
pub(crate) struct StackGuard<'a> {
    stack: &'a ConstructionStack,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.stack.frames.borrow_mut().pop();
    }
}
