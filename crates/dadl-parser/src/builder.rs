//! Write cursors into the growing tree.
//!
//! A [`Builder`] addresses one node of the tree under construction: the
//! shared root slot plus the path of map-field / list-index steps that leads
//! to the node. Value types only ever receive a builder for the node they
//! own, so they cannot reach outside it.
//!
//! Cursors are stable: a field builder obtained before later siblings keeps
//! writing to the same field, and a list-item builder pins its index by
//! pushing a `Null` placeholder the moment it is created. Containers
//! materialize lazily; the root decides between map and list on the first
//! write that goes through it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

#[derive(Debug, Clone)]
enum Step {
    Field(String),
    Item(usize),
}

/// Cursor to a single node of the tree under construction.
///
/// Cloning a builder yields a cursor to the same node sharing the same meta
/// cell; `field_builder` / `list_item_builder` derive cursors to child nodes
/// with fresh meta.
#[derive(Debug, Clone)]
pub struct Builder {
    root: Rc<RefCell<Value>>,
    path: Vec<Step>,
    meta: Rc<RefCell<HashMap<String, usize>>>,
}

impl Builder {
    /// Root builder over a fresh tree. The container kind of the root is
    /// decided by the first write: a field write makes it a map, an item
    /// write makes it a list.
    pub fn new_root() -> Self {
        Self {
            root: Rc::new(RefCell::new(Value::Null)),
            path: Vec::new(),
            meta: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Take the finished tree out of the root slot.
    pub fn into_value(self) -> Value {
        self.root.borrow().clone()
    }

    /// Cursor to the named field of this node. No write happens until the
    /// child cursor is used.
    pub fn field_builder(&self, name: &str) -> Builder {
        let mut path = self.path.clone();
        path.push(Step::Field(name.to_string()));
        Builder {
            root: Rc::clone(&self.root),
            path,
            meta: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Cursor to a fresh element appended to this node's list. The element
    /// slot is allocated immediately so the index survives later appends.
    pub fn list_item_builder(&self) -> Builder {
        let idx = self.with_slot(|slot| {
            if slot.is_null() {
                *slot = Value::List(Vec::new());
            }
            match slot {
                Value::List(items) => {
                    items.push(Value::Null);
                    items.len() - 1
                }
                other => panic!("list item requested on non-list node: {:?}", other),
            }
        });
        let mut path = self.path.clone();
        path.push(Step::Item(idx));
        Builder {
            root: Rc::clone(&self.root),
            path,
            meta: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Read the value currently stored at this node, if any.
    pub fn get_simple(&self) -> Option<Value> {
        let root = self.root.borrow();
        let mut current: &Value = &root;
        for step in &self.path {
            current = match (step, current) {
                (Step::Field(name), Value::Map(map)) => map.get(name)?,
                (Step::Item(idx), Value::List(items)) => items.get(*idx)?,
                _ => return None,
            };
        }
        if current.is_null() {
            None
        } else {
            Some(current.clone())
        }
    }

    /// Store a value at this node, overwriting whatever was there.
    pub fn set_simple(&self, value: Value) {
        self.with_slot(|slot| *slot = value);
    }

    /// Read per-node metadata (e.g. a oneof's last matched option index).
    pub fn get_meta(&self, name: &str) -> Option<usize> {
        self.meta.borrow().get(name).copied()
    }

    /// Store per-node metadata.
    pub fn set_meta(&self, name: &str, value: usize) {
        self.meta.borrow_mut().insert(name.to_string(), value);
    }

    /// Drop per-node metadata.
    pub fn clear_meta(&self, name: &str) {
        self.meta.borrow_mut().remove(name);
    }

    /// Navigate to this builder's slot, materializing containers along the
    /// path, and run `f` on the slot.
    fn with_slot<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        let mut root = self.root.borrow_mut();
        let mut current: &mut Value = &mut root;
        for step in &self.path {
            match step {
                Step::Field(name) => {
                    if current.is_null() {
                        *current = Value::Map(IndexMap::new());
                    }
                    current = match current {
                        Value::Map(map) => map.entry(name.clone()).or_insert(Value::Null),
                        other => panic!("field {:?} requested on non-map node: {:?}", name, other),
                    };
                }
                Step::Item(idx) => {
                    current = match current {
                        Value::List(items) => &mut items[*idx],
                        other => panic!("item {} requested on non-list node: {:?}", idx, other),
                    };
                }
            }
        }
        f(current)
    }
}
