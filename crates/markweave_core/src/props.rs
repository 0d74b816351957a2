//! Scoped, typed property bags.
//!
//! Each visited node gets a fresh [`RenderProps`] whose parent is the bag of
//! the closest ancestor with a visit action. Writes are local to the node;
//! reads fall back to the ancestors.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// A typed property key.
///
/// ```rust
/// use markweave_core::{Prop, RenderProps};
///
/// const DEPTH: Prop<u32> = Prop::new("depth");
///
/// let mut parent = RenderProps::new();
/// parent.set(DEPTH, 1);
///
/// let child = parent.child();
/// assert_eq!(child.get(DEPTH), Some(&1));
/// ```
pub struct Prop<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Prop<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Prop<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Prop<T> {}

impl<T> fmt::Debug for Prop<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prop({})", self.name)
    }
}

/// Property bag of one visited node.
#[derive(Default)]
pub struct RenderProps<'p> {
    parent: Option<&'p RenderProps<'p>>,
    values: HashMap<&'static str, Box<dyn Any>>,
}

impl<'p> RenderProps<'p> {
    /// Creates a root bag.
    pub fn new() -> Self {
        Self {
            parent: None,
            values: HashMap::new(),
        }
    }

    /// Creates an empty bag that inherits from this one.
    pub fn child(&self) -> RenderProps<'_> {
        RenderProps {
            parent: Some(self),
            values: HashMap::new(),
        }
    }

    /// Sets a value on this bag, shadowing any inherited value.
    pub fn set<T: Any>(&mut self, prop: Prop<T>, value: T) {
        self.values.insert(prop.name, Box::new(value));
    }

    /// Looks up a value on this bag, then on its ancestors.
    ///
    /// The closest bag holding the key decides; a value of another type
    /// under the same name yields `None`.
    pub fn get<T: Any>(&self, prop: Prop<T>) -> Option<&T> {
        match self.values.get(prop.name) {
            Some(value) => value.downcast_ref(),
            None => self.parent.and_then(|parent| parent.get(prop)),
        }
    }

    /// Looks up a value on this bag only.
    pub fn get_local<T: Any>(&self, prop: Prop<T>) -> Option<&T> {
        self.values.get(prop.name)?.downcast_ref()
    }

    /// Removes a value from this bag. Inherited values are untouched.
    pub fn remove<T: Any>(&mut self, prop: Prop<T>) -> Option<T> {
        let value = self.values.remove(prop.name)?;
        value.downcast().ok().map(|boxed| *boxed)
    }

    pub fn contains<T: Any>(&self, prop: Prop<T>) -> bool {
        self.get(prop).is_some()
    }

    /// Number of ancestors of this bag.
    pub fn depth(&self) -> usize {
        self.parent.map_or(0, |parent| parent.depth() + 1)
    }
}

impl fmt::Debug for RenderProps<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("RenderProps")
            .field("keys", &keys)
            .field("depth", &self.depth())
            .finish()
    }
}
