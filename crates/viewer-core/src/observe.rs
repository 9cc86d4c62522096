//! Change notification with explicit unsubscribe handles
//!
//! Observers hand out a [`Subscription`] per callback. Dropping the handle (or
//! calling [`Subscription::unsubscribe`]) removes the callback, so a viewer
//! that is torn down stops hearing about resizes and fullscreen changes.

use doc_model::ContainerSize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// Single-threaded fan-out of `T` values to subscribed callbacks
pub struct Notifier<T> {
    listeners: Rc<RefCell<Listeners<T>>>,
}

impl<T: 'static> Notifier<T> {
    pub fn new() -> Self {
        Self { listeners: Rc::new(RefCell::new(Listeners { next_id: 0, entries: Vec::new() })) }
    }

    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let callback: Callback<T> = Rc::new(RefCell::new(callback));

        let id = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.next_id += 1;
            let id = listeners.next_id;
            listeners.entries.push((id, callback));
            id
        };

        let registry = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = registry.upgrade() {
                listeners.borrow_mut().entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Call every listener with `value`; returns how many were called
    ///
    /// Listeners are snapshotted first, so a callback may unsubscribe itself
    /// or others while being notified. A callback already running further up
    /// the stack is skipped.
    pub fn notify(&self, value: &T) -> usize {
        let snapshot: Vec<Callback<T>> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        let mut called = 0;
        for callback in snapshot {
            let Ok(mut callback) = callback.try_borrow_mut() else {
                continue;
            };
            (*callback)(value);
            called += 1;
        }

        called
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

impl<T: 'static> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle that removes its callback when released
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(release: impl FnOnce() + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.release.is_some()).finish()
    }
}

/// Latest measured size of the viewer container
///
/// The host reports every platform resize through [`SizeObserver::observe`].
pub struct SizeObserver {
    size: Cell<ContainerSize>,
    notifier: Notifier<ContainerSize>,
}

impl SizeObserver {
    pub fn new() -> Self {
        Self { size: Cell::new(ContainerSize::default()), notifier: Notifier::new() }
    }

    pub fn size(&self) -> ContainerSize {
        self.size.get()
    }

    /// Record a new measurement; subscribers hear only about real changes
    pub fn observe(&self, size: ContainerSize) -> bool {
        if self.size.get() == size {
            return false;
        }

        self.size.set(size);
        self.notifier.notify(&size);
        true
    }

    /// Re-announce the current size, e.g. after a fullscreen transition settles
    pub fn refresh(&self) {
        self.notifier.notify(&self.size.get());
    }

    pub fn subscribe(&self, callback: impl FnMut(&ContainerSize) + 'static) -> Subscription {
        self.notifier.subscribe(callback)
    }

    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }
}

impl Default for SizeObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullscreenChange {
    pub active: bool,
    pub at: Instant,
}

/// Fullscreen state of the viewer container
///
/// Requests made through [`Fullscreen::toggle`] and [`Fullscreen::exit`] are
/// applied immediately; changes the platform makes on its own are reported
/// with [`Fullscreen::set_active`].
pub struct Fullscreen {
    enabled: bool,
    active: Cell<bool>,
    notifier: Notifier<FullscreenChange>,
}

impl Fullscreen {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, active: Cell::new(false), notifier: Notifier::new() }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_fullscreen(&self) -> bool {
        self.active.get()
    }

    /// Returns the resulting state; a no-op when fullscreen is unavailable
    pub fn toggle(&self, now: Instant) -> bool {
        if !self.enabled {
            tracing::debug!("fullscreen unavailable, ignoring toggle");
            return false;
        }

        self.set_active(!self.active.get(), now);
        self.active.get()
    }

    pub fn exit(&self, now: Instant) {
        if self.active.get() {
            self.set_active(false, now);
        }
    }

    pub fn set_active(&self, active: bool, now: Instant) {
        if self.active.get() == active {
            return;
        }

        self.active.set(active);
        tracing::info!(active, "fullscreen changed");
        self.notifier.notify(&FullscreenChange { active, at: now });
    }

    pub fn subscribe(&self, callback: impl FnMut(&FullscreenChange) + 'static) -> Subscription {
        self.notifier.subscribe(callback)
    }

    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_reaches_every_subscriber() {
        let notifier = Notifier::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let seen = Rc::clone(&seen);
            notifier.subscribe(move |value: &u32| seen.borrow_mut().push(("first", *value)))
        };
        let second = {
            let seen = Rc::clone(&seen);
            notifier.subscribe(move |value: &u32| seen.borrow_mut().push(("second", *value)))
        };

        assert_eq!(notifier.notify(&7), 2);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);

        drop(first);
        drop(second);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let notifier = Notifier::new();
        let count = Rc::new(Cell::new(0));

        let subscription = {
            let count = Rc::clone(&count);
            notifier.subscribe(move |_: &()| count.set(count.get() + 1))
        };

        notifier.notify(&());
        drop(subscription);
        notifier.notify(&());

        assert_eq!(count.get(), 1);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn explicit_unsubscribe_matches_drop() {
        let notifier: Notifier<()> = Notifier::new();
        let subscription = notifier.subscribe(|_| {});

        assert_eq!(notifier.listener_count(), 1);
        subscription.unsubscribe();
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn subscription_outliving_notifier_is_harmless() {
        let notifier: Notifier<()> = Notifier::new();
        let subscription = notifier.subscribe(|_| {});

        drop(notifier);
        drop(subscription);
    }

    #[test]
    fn callback_may_unsubscribe_during_notify() {
        let notifier: Rc<Notifier<()>> = Rc::new(Notifier::new());
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let subscription = {
            let slot = Rc::clone(&slot);
            notifier.subscribe(move |_| {
                slot.borrow_mut().take();
            })
        };
        *slot.borrow_mut() = Some(subscription);

        assert_eq!(notifier.notify(&()), 1);
        assert_eq!(notifier.listener_count(), 0);
        assert_eq!(notifier.notify(&()), 0);
    }

    #[test]
    fn size_observer_only_reports_changes() {
        let observer = SizeObserver::new();
        let sizes = Rc::new(RefCell::new(Vec::new()));

        let _subscription = {
            let sizes = Rc::clone(&sizes);
            observer.subscribe(move |size| sizes.borrow_mut().push(*size))
        };

        assert!(observer.observe(ContainerSize::new(800.0, 600.0)));
        assert!(!observer.observe(ContainerSize::new(800.0, 600.0)));
        observer.refresh();

        assert_eq!(sizes.borrow().len(), 2);
        assert_eq!(observer.size(), ContainerSize::new(800.0, 600.0));
    }

    #[test]
    fn fullscreen_toggle_notifies_and_escape_exits() {
        let fullscreen = Fullscreen::new(true);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let now = Instant::now();

        let _subscription = {
            let changes = Rc::clone(&changes);
            fullscreen.subscribe(move |change| changes.borrow_mut().push(change.active))
        };

        assert!(fullscreen.toggle(now));
        assert!(fullscreen.is_fullscreen());
        fullscreen.exit(now);
        fullscreen.exit(now);

        assert_eq!(*changes.borrow(), vec![true, false]);
    }

    #[test]
    fn disabled_fullscreen_ignores_toggle() {
        let fullscreen = Fullscreen::new(false);
        let now = Instant::now();

        assert!(!fullscreen.toggle(now));
        assert!(!fullscreen.is_fullscreen());
    }
}
