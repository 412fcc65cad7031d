//! # Per-Owner Association Map
//!
//! Auxiliary state attached to one registry, keyed by type. A helper that
//! needs exactly one instance of something per owner (the lifecycle scope,
//! for instance) stores it here instead of in a global side table. The map
//! lives and dies with the registry: it is emptied when the registry reaches
//! DESTROYED.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
pub(crate) struct Associations {
    values: HashMap<TypeId, Rc<dyn Any>>,
}

impl Associations {
    pub fn get<T: Any>(&self) -> Option<Rc<T>> {
        let value = self.values.get(&TypeId::of::<T>())?;
        Rc::clone(value).downcast::<T>().ok()
    }

    pub fn insert<T: Any>(&mut self, value: Rc<T>) {
        self.values.insert(TypeId::of::<T>(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Empty the map, returning the values so they can be dropped outside
    /// any registry borrow.
    pub fn take(&mut self) -> Vec<Rc<dyn Any>> {
        self.values.drain().map(|(_, value)| value).collect()
    }
}

impl std::fmt::Debug for Associations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Associations")
            .field("len", &self.values.len())
            .finish()
    }
}
