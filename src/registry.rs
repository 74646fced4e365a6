use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Number of socket slots the co-processor exposes by default.
pub const MAX_SOCK_NUM: usize = 4;

/// Identifier of a socket slot in a [`SocketRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketHandle(u8);

impl SocketHandle {
    /// Wraps a raw slot number.
    pub const fn new(id: u8) -> SocketHandle {
        SocketHandle(id)
    }

    /// Returns the raw slot number.
    pub const fn id(self) -> u8 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SocketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Assignment state of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// Not assigned to any client.
    #[default]
    Free,
    /// Assigned; carries the handle id of the slot itself.
    InUse(SocketHandle),
}

/// A fixed-size table tracking which socket handles are currently assigned.
///
/// The registry is a shared component: cloning it yields another reference to
/// the same table, so every client built from clones of one registry competes
/// for the same slots. It uses interior mutability without any locking and is
/// therefore `!Send`; all clients sharing a registry must live on one thread.
///
/// # Example
///
/// ```rust
/// use esp_tcp::{SocketHandle, SocketRegistry};
///
/// let registry = SocketRegistry::with_capacity(2);
/// let h = registry.allocate().unwrap();
/// assert_eq!(h, SocketHandle::new(0));
/// registry.mark_in_use(h);
/// assert_eq!(registry.allocate(), Some(SocketHandle::new(1)));
/// ```
#[derive(Debug, Clone)]
pub struct SocketRegistry {
    slots: Rc<RefCell<Vec<SlotState>>>,
}

impl SocketRegistry {
    /// Creates a registry with [`MAX_SOCK_NUM`] free slots.
    pub fn new() -> SocketRegistry {
        SocketRegistry::with_capacity(MAX_SOCK_NUM)
    }

    /// Creates a registry with `capacity` free slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` does not fit in a [`SocketHandle`].
    pub fn with_capacity(capacity: usize) -> SocketRegistry {
        assert!(
            capacity <= u8::MAX as usize,
            "registry capacity {capacity} exceeds the handle range"
        );
        SocketRegistry {
            slots: Rc::new(RefCell::new(vec![SlotState::Free; capacity])),
        }
    }

    /// Number of slots in the table.
    pub fn capacity(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Returns the lowest-numbered free slot, or `None` if every slot is in use.
    ///
    /// The slot is not reserved; callers mark it with [`mark_in_use`](Self::mark_in_use)
    /// once the connection is actually open.
    pub fn allocate(&self) -> Option<SocketHandle> {
        self.slots
            .borrow()
            .iter()
            .position(|s| *s == SlotState::Free)
            .map(|i| SocketHandle(i as u8))
    }

    /// Marks `handle` as assigned.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is outside the table.
    pub fn mark_in_use(&self, handle: SocketHandle) {
        self.slots.borrow_mut()[handle.index()] = SlotState::InUse(handle);
    }

    /// Marks `handle` as unassigned.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is outside the table.
    pub fn mark_free(&self, handle: SocketHandle) {
        self.slots.borrow_mut()[handle.index()] = SlotState::Free;
    }

    /// Current state of `handle`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is outside the table.
    pub fn state(&self, handle: SocketHandle) -> SlotState {
        self.slots.borrow()[handle.index()]
    }

    /// Returns `true` if `handle` is assigned.
    pub fn is_in_use(&self, handle: SocketHandle) -> bool {
        matches!(self.state(handle), SlotState::InUse(_))
    }

    /// Number of assigned slots.
    pub fn in_use_count(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|s| matches!(s, SlotState::InUse(_)))
            .count()
    }
}

impl Default for SocketRegistry {
    fn default() -> Self {
        SocketRegistry::new()
    }
}
