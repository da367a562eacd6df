//! Bound item registry
//!
//! A small table mapping ids to application regions plus per-item state
//! flags. Lookups are linear scans over at most [`MAX_ITEMS`] entries in
//! bind order; with this few items a scan is a handful of compares and
//! touches no allocator.

use core::cell::Cell;
use core::ops::BitOr;

use heapless::Vec;

use crate::frame::MAX_ITEM_SIZE;
use crate::wire::{same_region, write_region};

/// Number of items that can be bound at once
///
/// Every id lookup scans this many entries, so keep it small. Seldom-used
/// messages can go through `Engine::enqueue_payload` and the
/// unknown-packet hook instead.
pub const MAX_ITEMS: usize = 8;

/// Per-item state bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ItemFlags(u8);

impl ItemFlags {
    pub const NONE: Self = Self(0);
    /// Broadcast periodically without an explicit request
    pub const AUTO_SEND: Self = Self(0x02);
    /// Fresh data arrived and has not been consumed
    pub const RECEIVED: Self = Self(0x04);
    /// Queued for the next outgoing frame
    pub const TO_SEND: Self = Self(0x08);
    /// Already sent in the current autosend cycle
    pub const WAS_AUTO_SENT: Self = Self(0x10);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for ItemFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Errors from binding an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BindError {
    /// All slots are taken and the id is new
    RegistryFull,
    /// The region cannot fit in a frame
    ItemTooLarge,
    /// Zero-length regions cannot be addressed
    EmptyRegion,
    /// The region does not match the wire size of the item type
    SizeMismatch,
}

/// One bound item
#[derive(Debug, Clone, Copy)]
pub struct Slot<'a> {
    id: u8,
    flags: ItemFlags,
    region: &'a [Cell<u8>],
}

impl<'a> Slot<'a> {
    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn flags(&self) -> ItemFlags {
        self.flags
    }

    /// Wire size, fixed at bind time
    pub fn size(&self) -> usize {
        self.region.len()
    }

    pub fn region(&self) -> &'a [Cell<u8>] {
        self.region
    }

    pub(crate) fn flags_mut(&mut self) -> &mut ItemFlags {
        &mut self.flags
    }
}

/// Fixed-capacity table of bound items
#[derive(Debug, Default)]
pub struct Registry<'a> {
    slots: Vec<Slot<'a>, MAX_ITEMS>,
}

impl<'a> Registry<'a> {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Bind `region` to `id`, or unbind `id` when `region` is `None`
    ///
    /// Binding an id that is already bound replaces the slot in place and
    /// resets its flags to what this call asks for.
    pub fn bind(
        &mut self,
        id: u8,
        region: Option<&'a [Cell<u8>]>,
        auto_send: bool,
    ) -> Result<(), BindError> {
        let Some(region) = region else {
            self.unbind(id);
            return Ok(());
        };
        if region.is_empty() {
            return Err(BindError::EmptyRegion);
        }
        if region.len() > MAX_ITEM_SIZE {
            return Err(BindError::ItemTooLarge);
        }

        let slot = Slot {
            id,
            flags: if auto_send {
                ItemFlags::AUTO_SEND
            } else {
                ItemFlags::NONE
            },
            region,
        };

        if let Some(existing) = self.lookup_mut(id) {
            *existing = slot;
            return Ok(());
        }
        self.slots.push(slot).map_err(|_| BindError::RegistryFull)
    }

    /// Remove the slot for `id`, freeing it for reuse
    ///
    /// Returns true if the id was bound.
    pub fn unbind(&mut self, id: u8) -> bool {
        match self.slots.iter().position(|s| s.id == id) {
            Some(index) => {
                self.slots.remove(index);
                true
            }
            None => false,
        }
    }

    /// Unbind everything
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Forget which autosend items went out in the current cycle
    pub fn reset_cycle(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.flags.remove(ItemFlags::WAS_AUTO_SENT);
        }
    }

    pub fn lookup(&self, id: u8) -> Option<&Slot<'a>> {
        self.slots.iter().find(|s| s.id == id)
    }

    fn lookup_mut(&mut self, id: u8) -> Option<&mut Slot<'a>> {
        self.slots.iter_mut().find(|s| s.id == id)
    }

    /// Find the slot bound to a region by address
    pub fn lookup_by_region(&self, region: &[Cell<u8>]) -> Option<&Slot<'a>> {
        self.slots.iter().find(|s| same_region(s.region, region))
    }

    fn lookup_by_region_mut(&mut self, region: &[Cell<u8>]) -> Option<&mut Slot<'a>> {
        self.slots.iter_mut().find(|s| same_region(s.region, region))
    }

    /// Wire size of the item bound to `id`
    pub fn size_of(&self, id: u8) -> Option<usize> {
        self.lookup(id).map(Slot::size)
    }

    /// Copy incoming data into the region bound to `id` and flag it fresh
    ///
    /// At most the bound size is written, whatever `src` claims. Returns
    /// the number of bytes copied, or `None` if `id` is not bound.
    pub fn mark_received(&mut self, id: u8, src: &[u8]) -> Option<usize> {
        let slot = self.lookup_mut(id)?;
        let copied = write_region(slot.region, src);
        slot.flags.insert(ItemFlags::RECEIVED);
        Some(copied)
    }

    /// Queue `id` for the next outgoing frame
    pub fn mark_to_send(&mut self, id: u8) -> bool {
        match self.lookup_mut(id) {
            Some(slot) => {
                slot.flags.insert(ItemFlags::TO_SEND);
                true
            }
            None => false,
        }
    }

    /// Queue the item bound to `region` for the next outgoing frame
    pub fn mark_to_send_region(&mut self, region: &[Cell<u8>]) -> bool {
        match self.lookup_by_region_mut(region) {
            Some(slot) => {
                slot.flags.insert(ItemFlags::TO_SEND);
                true
            }
            None => false,
        }
    }

    pub fn is_received(&self, id: u8) -> bool {
        self.lookup(id)
            .is_some_and(|s| s.flags.contains(ItemFlags::RECEIVED))
    }

    pub fn clear_received(&mut self, id: u8) {
        if let Some(slot) = self.lookup_mut(id) {
            slot.flags.remove(ItemFlags::RECEIVED);
        }
    }

    /// Test-and-clear the received flag of `id`
    pub fn take_fresh(&mut self, id: u8) -> bool {
        self.lookup_mut(id).is_some_and(take_received)
    }

    /// Test-and-clear the received flag of the item bound to `region`
    pub fn take_fresh_region(&mut self, region: &[Cell<u8>]) -> bool {
        self.lookup_by_region_mut(region).is_some_and(take_received)
    }

    /// Whether any item is queued for sending
    pub fn any_to_send(&self) -> bool {
        self.slots
            .iter()
            .any(|s| s.flags.contains(ItemFlags::TO_SEND))
    }

    /// Bound items in bind order
    pub fn iter(&self) -> impl Iterator<Item = &Slot<'a>> {
        self.slots.iter()
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot<'a>] {
        &mut self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn take_received(slot: &mut Slot<'_>) -> bool {
    let fresh = slot.flags.contains(ItemFlags::RECEIVED);
    slot.flags.remove(ItemFlags::RECEIVED);
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::region_of;

    #[test]
    fn test_bind_and_lookup() {
        let mut raw = [0u8; 4];
        let region = region_of(&mut raw);
        let mut registry = Registry::new();

        registry.bind(3, Some(region), true).unwrap();
        let slot = registry.lookup(3).unwrap();
        assert_eq!(slot.size(), 4);
        assert_eq!(slot.flags(), ItemFlags::AUTO_SEND);
        assert_eq!(registry.lookup_by_region(region).unwrap().id(), 3);
        assert!(registry.lookup(4).is_none());
    }

    #[test]
    fn test_rebind_replaces_slot_and_resets_flags() {
        let mut a = [0u8; 4];
        let mut b = [0u8; 2];
        let ra = region_of(&mut a);
        let rb = region_of(&mut b);
        let mut registry = Registry::new();

        registry.bind(1, Some(ra), true).unwrap();
        registry.mark_received(1, &[1, 2, 3, 4]);
        registry.mark_to_send(1);
        registry.slots_mut()[0]
            .flags_mut()
            .insert(ItemFlags::WAS_AUTO_SENT);

        registry.bind(1, Some(rb), false).unwrap();
        assert_eq!(registry.len(), 1);
        let slot = registry.lookup(1).unwrap();
        assert_eq!(slot.flags(), ItemFlags::NONE);
        assert_eq!(slot.size(), 2);
        assert!(registry.lookup_by_region(ra).is_none());
    }

    #[test]
    fn test_registry_full() {
        let mut raw = [[0u8; 1]; MAX_ITEMS + 1];
        let mut extra = [0u8; 1];
        let mut registry = Registry::new();
        let mut regions = raw.iter_mut().map(|r| region_of(r));

        for id in 0..MAX_ITEMS as u8 {
            registry.bind(id, regions.next(), false).unwrap();
        }
        assert_eq!(
            registry.bind(100, regions.next(), false),
            Err(BindError::RegistryFull)
        );
        // Replacing an existing id still works when full
        assert!(registry.bind(0, Some(region_of(&mut extra)), false).is_ok());
    }

    #[test]
    fn test_unbind_frees_slot() {
        let mut raw = [[0u8; 1]; MAX_ITEMS + 1];
        let mut registry = Registry::new();
        let mut regions = raw.iter_mut().map(|r| region_of(r));

        for id in 0..MAX_ITEMS as u8 {
            registry.bind(id, regions.next(), false).unwrap();
        }
        registry.bind(2, None, false).unwrap();
        assert!(registry.lookup(2).is_none());
        assert!(registry.bind(50, regions.next(), false).is_ok());
        assert!(!registry.unbind(2));
    }

    #[test]
    fn test_rejects_empty_and_oversize_regions() {
        let mut empty: [u8; 0] = [];
        let mut huge = [0u8; MAX_ITEM_SIZE + 1];
        let mut registry = Registry::new();

        assert_eq!(
            registry.bind(1, Some(region_of(&mut empty)), false),
            Err(BindError::EmptyRegion)
        );
        assert_eq!(
            registry.bind(2, Some(region_of(&mut huge)), false),
            Err(BindError::ItemTooLarge)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_mark_received_is_bounded_by_bound_size() {
        let mut raw = [0u8; 6];
        {
            let region = region_of(&mut raw[1..5]);
            let mut registry = Registry::new();
            registry.bind(9, Some(region), false).unwrap();

            assert_eq!(registry.mark_received(9, &[0xEE; 40]), Some(4));
            assert!(registry.is_received(9));
            assert_eq!(registry.mark_received(10, &[1]), None);
        }
        assert_eq!(raw, [0, 0xEE, 0xEE, 0xEE, 0xEE, 0]);
    }

    #[test]
    fn test_take_fresh_is_one_shot() {
        let mut raw = [0u8; 2];
        let region = region_of(&mut raw);
        let mut registry = Registry::new();
        registry.bind(5, Some(region), false).unwrap();

        assert!(!registry.take_fresh(5));
        registry.mark_received(5, &[1, 2]);
        assert!(registry.take_fresh(5));
        assert!(!registry.take_fresh(5));

        registry.mark_received(5, &[3, 4]);
        assert!(registry.take_fresh_region(region));
        assert!(!registry.take_fresh_region(region));
    }

    #[test]
    fn test_clear_received() {
        let mut raw = [0u8; 2];
        let mut registry = Registry::new();
        registry.bind(5, Some(region_of(&mut raw)), false).unwrap();

        registry.mark_received(5, &[1, 2]);
        registry.clear_received(5);
        assert!(!registry.is_received(5));
    }

    #[test]
    fn test_mark_to_send() {
        let mut raw = [0u8; 2];
        let mut other = [0u8; 2];
        let region = region_of(&mut raw);
        let mut registry = Registry::new();
        registry.bind(5, Some(region), false).unwrap();

        assert!(!registry.any_to_send());
        assert!(!registry.mark_to_send(6));
        assert!(!registry.mark_to_send_region(region_of(&mut other)));
        assert!(registry.mark_to_send_region(region));
        assert!(registry.any_to_send());
        assert!(registry.mark_to_send(5));
    }
}
