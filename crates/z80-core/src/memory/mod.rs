//! Flat 64 KiB memory with synchronous change notification.

/// Change-notification types and registry.
pub mod observer;

use std::ops::RangeInclusive;

pub use observer::{ChangeCallback, MemoryChange, ObserverId};
use observer::ObserverRegistry;

/// Size in bytes of the flat architectural address space (64 KiB).
pub const ADDRESS_SPACE_BYTES: usize = u16::MAX as usize + 1;

/// Allocates a canonical zeroed 64 KiB address-space backing store.
#[must_use]
pub fn new_address_space() -> Box<[u8]> {
    vec![0; ADDRESS_SPACE_BYTES].into_boxed_slice()
}

/// Byte-addressable memory owned by one machine.
///
/// Writes that change a byte notify observers in-line, before the write call
/// returns. Observers must not write back into the memory that notified them.
#[derive(Debug)]
pub struct Memory {
    bytes: Box<[u8]>,
    observers: ObserverRegistry,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Creates zero-initialised memory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: new_address_space(),
            observers: ObserverRegistry::default(),
        }
    }

    /// Reads one byte.
    #[must_use]
    pub fn get(&self, address: u16) -> u8 {
        self.bytes[usize::from(address)]
    }

    /// Writes one byte, notifying observers if the value changed.
    pub fn set(&mut self, address: u16, value: u8) {
        let slot = &mut self.bytes[usize::from(address)];
        if *slot == value {
            return;
        }
        *slot = value;
        self.observers.notify(MemoryChange { address, value });
    }

    /// Reads a little-endian word; the high byte address wraps at 0xFFFF.
    #[must_use]
    pub fn get_word(&self, address: u16) -> u16 {
        u16::from_le_bytes([self.get(address), self.get(address.wrapping_add(1))])
    }

    /// Writes a little-endian word, low byte first.
    pub fn set_word(&mut self, address: u16, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.set(address, low);
        self.set(address.wrapping_add(1), high);
    }

    /// Copies `image` into memory starting at `origin`, wrapping at 0xFFFF.
    pub fn load(&mut self, origin: u16, image: &[u8]) {
        let mut address = origin;
        for byte in image {
            self.set(address, *byte);
            address = address.wrapping_add(1);
        }
    }

    /// Borrows the whole backing store.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Registers an observer for every address.
    pub fn subscribe(&mut self, callback: impl FnMut(MemoryChange) + 'static) -> ObserverId {
        self.subscribe_range(0..=u16::MAX, callback)
    }

    /// Registers an observer for changes inside `range`.
    pub fn subscribe_range(
        &mut self,
        range: RangeInclusive<u16>,
        callback: impl FnMut(MemoryChange) + 'static,
    ) -> ObserverId {
        self.observers.register(range, Box::new(callback))
    }

    /// Removes an observer. Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{new_address_space, Memory, MemoryChange, ADDRESS_SPACE_BYTES};

    fn recorder(memory: &mut Memory) -> Rc<RefCell<Vec<MemoryChange>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        memory.subscribe(move |change| sink.borrow_mut().push(change));
        log
    }

    #[test]
    fn canonical_backing_store_size_is_64kib() {
        let memory = new_address_space();
        assert_eq!(memory.len(), ADDRESS_SPACE_BYTES);
        assert!(memory.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn words_are_little_endian() {
        let mut memory = Memory::new();
        memory.set_word(0x1000, 0x01F4);

        assert_eq!(memory.get(0x1000), 0xF4);
        assert_eq!(memory.get(0x1001), 0x01);
        assert_eq!(memory.get_word(0x1000), 0x01F4);
    }

    #[test]
    fn word_access_wraps_at_top_of_memory() {
        let mut memory = Memory::new();
        memory.set_word(0xFFFF, 0xBEEF);

        assert_eq!(memory.get(0xFFFF), 0xEF);
        assert_eq!(memory.get(0x0000), 0xBE);
        assert_eq!(memory.get_word(0xFFFF), 0xBEEF);
    }

    #[test]
    fn only_changed_bytes_notify() {
        let mut memory = Memory::new();
        let log = recorder(&mut memory);

        memory.set(0x10, 0);
        memory.set(0x10, 7);
        memory.set(0x10, 7);

        assert_eq!(
            *log.borrow(),
            vec![MemoryChange {
                address: 0x10,
                value: 7
            }]
        );
    }

    #[test]
    fn word_write_notifies_low_then_high() {
        let mut memory = Memory::new();
        let log = recorder(&mut memory);

        memory.set_word(0x2000, 0xABCD);
        memory.set_word(0x2000, 0x11CD);

        assert_eq!(
            *log.borrow(),
            vec![
                MemoryChange {
                    address: 0x2000,
                    value: 0xCD
                },
                MemoryChange {
                    address: 0x2001,
                    value: 0xAB
                },
                MemoryChange {
                    address: 0x2001,
                    value: 0x11
                },
            ]
        );
    }

    #[test]
    fn range_observers_only_see_their_window() {
        let mut memory = Memory::new();
        let hits = Rc::new(RefCell::new(0_u32));
        let counter = Rc::clone(&hits);
        memory.subscribe_range(0x4000..=0x40FF, move |_| *counter.borrow_mut() += 1);

        memory.set(0x3FFF, 1);
        memory.set(0x4000, 1);
        memory.set(0x40FF, 1);
        memory.set(0x4100, 1);

        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut memory = Memory::new();
        let hits = Rc::new(RefCell::new(0_u32));
        let counter = Rc::clone(&hits);
        let id = memory.subscribe(move |_| *counter.borrow_mut() += 1);

        memory.set(1, 1);
        assert!(memory.unsubscribe(id));
        assert!(!memory.unsubscribe(id));
        memory.set(1, 2);

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(memory.observer_count(), 0);
    }

    #[test]
    fn load_copies_image_and_wraps() {
        let mut memory = Memory::new();
        memory.load(0xFFFE, &[1, 2, 3]);

        assert_eq!(memory.get(0xFFFE), 1);
        assert_eq!(memory.get(0xFFFF), 2);
        assert_eq!(memory.get(0x0000), 3);
    }
}
