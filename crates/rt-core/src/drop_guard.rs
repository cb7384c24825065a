//! Iterative teardown for the two genuinely deep linked chains in this
//! crate: the `with`-scope chain ([`crate::closure::WithScope`]) and
//! the shape transition chain ([`crate::shape::Shape`]). Both are
//! singly-linked `Rc`/`Arc` lists whose generated `Drop` glue recurses
//! one stack frame per link when the last reference goes away — fine
//! for the handful of nested `with` blocks or properties real code
//! has, but a long synthetic chain (thousands of properties added to
//! one object, or deeply nested `with`) would otherwise recurse the
//! whole way down in a single `drop` call.
//!
//! Everything reachable through [`crate::value::Value`] itself does
//! *not* need this treatment: objects are freed one at a time by the
//! collector's sweep (`rt_gc::GcHeader::drop_in_place`), not by
//! structural Rust `Drop` cascading through a live object graph, so a
//! deep chain of `GcRef<JsObject>` never triggers a deep recursive
//! drop in the first place.

use crate::closure::WithScope;
use crate::shape::Shape;
use std::rc::Rc;
use std::sync::Arc;

/// Drop a `with`-scope chain iteratively instead of letting the last
/// `Rc<WithScope>` reference's generated `Drop` recurse through every
/// `parent` link.
pub fn drop_with_scope_chain(scope: Rc<WithScope>) {
    let mut current = Some(scope);
    while let Some(node) = current {
        match Rc::try_unwrap(node) {
            Ok(mut inner) => current = inner.parent.take(),
            Err(_) => break, // still referenced elsewhere; leave it alone
        }
    }
}

/// Drop a shape chain iteratively instead of letting the last
/// `Arc<Shape>` reference's generated `Drop` recurse through every
/// `parent` link.
pub fn drop_shape_chain(shape: Arc<Shape>) {
    let mut current = Some(shape);
    while let Some(node) = current {
        match Arc::try_unwrap(node) {
            Ok(mut inner) => current = inner.parent.take(),
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::PropertyKey;
    use crate::value::Value;

    #[test]
    fn with_scope_chain_of_many_links_drops_without_recursing() {
        let mut chain = WithScope::push(Value::int32(0), None);
        for i in 1..10_000 {
            chain = WithScope::push(Value::int32(i), Some(chain));
        }
        drop_with_scope_chain(chain);
    }

    #[test]
    fn shape_chain_of_many_links_drops_without_recursing() {
        let mut shape = Shape::root();
        for i in 0..10_000 {
            shape = shape.transition(PropertyKey::index(i)).unwrap();
        }
        drop_shape_chain(shape);
    }
}
