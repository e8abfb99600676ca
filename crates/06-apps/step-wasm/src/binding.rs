//! Replacement of the single live binding.

use std::cell::RefCell;

/// Builds a new value and only then swaps it into `slot`.
///
/// A failing `build` leaves the current binding in place. The outgoing value
/// is dropped after the slot borrow is released, so its teardown may touch
/// the slot again.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn rebind<T, E>(
    slot: &RefCell<Option<T>>,
    build: impl FnOnce() -> Result<T, E>,
) -> Result<(), E> {
    let next = build()?;
    let previous = slot.borrow_mut().replace(next);
    drop(previous);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Binding {
        name: &'static str,
        dropped: Rc<Cell<bool>>,
    }

    impl Drop for Binding {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    fn binding(name: &'static str) -> (Binding, Rc<Cell<bool>>) {
        let dropped = Rc::new(Cell::new(false));
        let value = Binding {
            name,
            dropped: Rc::clone(&dropped),
        };
        (value, dropped)
    }

    #[test]
    fn failed_build_keeps_current_binding() {
        let (current, dropped) = binding("working");
        let slot = RefCell::new(Some(current));

        let result: Result<(), &str> = rebind(&slot, || Err("engine.step is not a function"));
        assert_eq!(result, Err("engine.step is not a function"));
        assert!(!dropped.get());
        assert_eq!(slot.borrow().as_ref().map(|b| b.name), Some("working"));
    }

    #[test]
    fn successful_build_replaces_and_drops_previous() {
        let (current, old_dropped) = binding("old");
        let (next, new_dropped) = binding("new");
        let slot = RefCell::new(Some(current));

        let result: Result<(), ()> = rebind(&slot, || Ok(next));
        assert!(result.is_ok());
        assert!(old_dropped.get());
        assert!(!new_dropped.get());
        assert_eq!(slot.borrow().as_ref().map(|b| b.name), Some("new"));
    }

    #[test]
    fn first_bind_fills_empty_slot() {
        let (value, _) = binding("first");
        let slot = RefCell::new(None);
        let result: Result<(), ()> = rebind(&slot, || Ok(value));
        assert!(result.is_ok());
        assert!(slot.borrow().is_some());
    }
}
