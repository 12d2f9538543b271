//! Lazily constructed shared dependency.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::error::Result;

/// Holds one lazily constructed `Arc<T>`.
///
/// Construction runs under a re-entrant lock, so the constructor may query
/// the slot from the same thread. A failed construction leaves the slot empty
/// and the next call tries again.
pub struct SharedSlot<T: ?Sized> {
    slot: ReentrantMutex<RefCell<Option<Arc<T>>>>,
}

impl<T: ?Sized> Default for SharedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> SharedSlot<T> {
    pub fn new() -> Self {
        Self {
            slot: ReentrantMutex::new(RefCell::new(None)),
        }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.lock().borrow().clone()
    }

    pub fn get_or_try_init<F>(&self, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<Arc<T>>,
    {
        let slot = self.slot.lock();
        if let Some(value) = slot.borrow().as_ref() {
            return Ok(value.clone());
        }
        let value = init()?;
        *slot.borrow_mut() = Some(value.clone());
        Ok(value)
    }

    /// Empty the slot, returning the previous value.
    pub fn reset(&self) -> Option<Arc<T>> {
        self.slot.lock().borrow_mut().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, HostError};

    #[test]
    fn test_constructs_once() {
        let slot = SharedSlot::<String>::new();
        let first = slot.get_or_try_init(|| Ok(Arc::new("a".to_string()))).unwrap();
        let second = slot.get_or_try_init(|| Ok(Arc::new("b".to_string()))).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(slot.reset().as_deref().map(String::as_str), Some("a"));
        assert!(slot.get().is_none());
    }

    #[test]
    fn test_failure_leaves_slot_empty() {
        let slot = SharedSlot::<u32>::new();
        let err = slot
            .get_or_try_init(|| Err(HostError::Allocation("nope".into())))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Allocation);
        assert!(slot.get().is_none());
        assert_eq!(*slot.get_or_try_init(|| Ok(Arc::new(5))).unwrap(), 5);
    }

    #[test]
    fn test_constructor_may_query_slot() {
        let slot = SharedSlot::<u32>::new();
        let value = slot
            .get_or_try_init(|| {
                assert!(slot.get().is_none());
                Ok(Arc::new(1))
            })
            .unwrap();
        assert_eq!(*value, 1);
    }
}
