//! Synchronous publish/subscribe emitter
//!
//! Callbacks run on the caller's stack, in registration order. There is no
//! error containment: the first callback returning `Err` aborts the emit and
//! the remaining callbacks for that event are skipped.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Result;

/// A registered callback. Identity (for [`EventEmitter::off`]) is the `Rc`
/// allocation, so keep a clone of the handle you registered.
pub type Listener<T> = Rc<dyn Fn(&T) -> Result<()>>;

/// Maps event names to ordered callback lists
pub struct EventEmitter<T> {
    listeners: RefCell<HashMap<String, Vec<Listener<T>>>>,
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
        }
    }
}

impl<T> EventEmitter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback for `event`
    pub fn on(&self, event: &str, listener: Listener<T>) {
        self.listeners
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Remove every callback for `event` that is the same allocation as
    /// `listener`, including repeat registrations of it
    pub fn off(&self, event: &str, listener: &Listener<T>) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(list) = listeners.get_mut(event) {
            list.retain(|l| !Rc::ptr_eq(l, listener));
            if list.is_empty() {
                listeners.remove(event);
            }
        }
    }

    /// Invoke every callback registered for `event` with `payload`
    pub fn emit(&self, event: &str, payload: &T) -> Result<()> {
        // Snapshot so callbacks may subscribe or unsubscribe while we iterate
        let snapshot: Vec<Listener<T>> = match self.listeners.borrow().get(event) {
            Some(list) => list.clone(),
            None => return Ok(()),
        };

        for listener in snapshot {
            listener(payload)?;
        }
        Ok(())
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().get(event).map_or(0, Vec::len)
    }

    /// Drop every callback for `event`
    pub fn clear(&self, event: &str) {
        self.listeners.borrow_mut().remove(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoomError;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> Listener<String> {
        let log = Rc::clone(log);
        Rc::new(move |payload: &String| {
            log.borrow_mut().push(format!("{}:{}", name, payload));
            Ok(())
        })
    }

    #[test]
    fn test_emit_invokes_all_in_registration_order() {
        let emitter = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        emitter.on("saved", recorder(&log, "a"));
        emitter.on("saved", recorder(&log, "b"));
        emitter.on("saved", recorder(&log, "c"));

        emitter.emit("saved", &"card-1".to_string()).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["a:card-1", "b:card-1", "c:card-1"]
        );
    }

    #[test]
    fn test_off_removes_by_reference() {
        let emitter = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = recorder(&log, "first");
        let second = recorder(&log, "second");
        emitter.on("tick", Rc::clone(&first));
        emitter.on("tick", Rc::clone(&second));

        emitter.off("tick", &first);
        emitter.emit("tick", &"1".to_string()).unwrap();

        assert_eq!(*log.borrow(), vec!["second:1"]);
        assert_eq!(emitter.listener_count("tick"), 1);
    }

    #[test]
    fn test_off_removes_repeat_registrations() {
        let emitter = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let twice = recorder(&log, "twice");
        emitter.on("tick", Rc::clone(&twice));
        emitter.on("tick", recorder(&log, "other"));
        emitter.on("tick", Rc::clone(&twice));

        emitter.off("tick", &twice);
        emitter.emit("tick", &"1".to_string()).unwrap();

        assert_eq!(*log.borrow(), vec!["other:1"]);
        assert_eq!(emitter.listener_count("tick"), 1);
    }

    #[test]
    fn test_off_with_unregistered_listener_is_noop() {
        let emitter: EventEmitter<String> = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let stray = recorder(&log, "stray");

        emitter.off("missing", &stray);
        emitter.on("tick", recorder(&log, "kept"));
        emitter.off("tick", &stray);

        assert_eq!(emitter.listener_count("tick"), 1);
    }

    #[test]
    fn test_failing_listener_skips_later_listeners() {
        let emitter = EventEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        emitter.on("load", recorder(&log, "before"));
        emitter.on(
            "load",
            Rc::new(|_: &String| Err(LoomError::Custom("boom".into()))),
        );
        emitter.on("load", recorder(&log, "after"));

        let result = emitter.emit("load", &"x".to_string());

        assert!(result.is_err());
        assert_eq!(*log.borrow(), vec!["before:x"]);
    }

    #[test]
    fn test_emit_without_listeners_is_ok() {
        let emitter: EventEmitter<u32> = EventEmitter::new();
        assert!(emitter.emit("nothing", &1).is_ok());
    }

    #[test]
    fn test_listener_may_unsubscribe_during_emit() {
        let emitter: Rc<EventEmitter<u32>> = Rc::new(EventEmitter::new());
        let slot: Rc<RefCell<Option<Listener<u32>>>> = Rc::new(RefCell::new(None));

        let emitter_ref = Rc::clone(&emitter);
        let slot_ref = Rc::clone(&slot);
        let once: Listener<u32> = Rc::new(move |_| {
            if let Some(me) = slot_ref.borrow().as_ref() {
                emitter_ref.off("ping", me);
            }
            Ok(())
        });
        *slot.borrow_mut() = Some(Rc::clone(&once));
        emitter.on("ping", once);

        emitter.emit("ping", &1).unwrap();
        assert_eq!(emitter.listener_count("ping"), 0);
    }
}
