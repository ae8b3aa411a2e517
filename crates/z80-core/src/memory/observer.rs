//! Change-notification registry for [`Memory`](super::Memory).

use std::fmt;
use std::ops::RangeInclusive;

/// A byte whose stored value changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryChange {
    /// Address of the byte.
    pub address: u16,
    /// New value.
    pub value: u8,
}

/// Handle returned by observer registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Callback invoked synchronously for every change inside its range.
pub type ChangeCallback = Box<dyn FnMut(MemoryChange)>;

struct Observer {
    id: ObserverId,
    range: RangeInclusive<u16>,
    callback: ChangeCallback,
}

/// Ordered list of registered observers.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Vec<Observer>,
    next_id: u64,
}

impl ObserverRegistry {
    pub(crate) fn register(
        &mut self,
        range: RangeInclusive<u16>,
        callback: ChangeCallback,
    ) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push(Observer {
            id,
            range,
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|observer| observer.id != id);
        self.observers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn notify(&mut self, change: MemoryChange) {
        for observer in &mut self.observers {
            if observer.range.contains(&change.address) {
                (observer.callback)(change);
            }
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.observers.iter().map(|o| (o.id, o.range.clone())))
            .finish()
    }
}
