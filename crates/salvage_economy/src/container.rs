//! # Slot Container
//!
//! Fixed-capacity item slots. Used as the input and output containers of
//! [`crate::device::SimDevice`], and by hosts that have no container of
//! their own. The slot count is fixed at creation time.

use crate::error::{SalvageError, SalvageResult};
use crate::item::{ItemId, ItemStack};

/// Input slot count of a standard recycler.
pub const RECYCLER_INPUT_SLOTS: usize = 6;

/// Output slot count of a standard recycler.
pub const RECYCLER_OUTPUT_SLOTS: usize = 6;

/// A fixed number of item slots.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotContainer {
    slots: Vec<Option<ItemStack>>,
}

impl SlotContainer {
    /// Creates an empty container with `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Returns the total slot count.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub fn used_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Checks if every slot is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Gets the stack at a slot.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Puts a stack directly into a slot, replacing its contents.
    ///
    /// Out-of-range slots are ignored.
    pub fn set(&mut self, slot: usize, stack: Option<ItemStack>) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = stack.filter(|s| !s.is_empty());
        }
    }

    /// Iterates occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ItemStack)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    /// Counts the total number of a specific item across all slots.
    #[must_use]
    pub fn count_item(&self, item_id: ItemId) -> u32 {
        self.iter()
            .filter(|(_, s)| s.item_id == item_id)
            .map(|(_, s)| s.amount)
            .sum()
    }

    /// Free room for `stack` across mergeable and empty slots.
    fn room_for(&self, stack: &ItemStack, max_stack: u32) -> u64 {
        self.slots
            .iter()
            .map(|slot| match slot {
                None => u64::from(max_stack),
                Some(existing) if existing.stacks_with(stack) => {
                    u64::from(max_stack.saturating_sub(existing.amount))
                }
                Some(_) => 0,
            })
            .sum()
    }

    /// Inserts a stack, merging into existing stacks before using empty slots.
    ///
    /// The insert is all-or-nothing: nothing is placed unless the whole
    /// stack fits.
    ///
    /// # Errors
    ///
    /// Returns `OutputFull` if the stack does not fit.
    pub fn insert(&mut self, stack: ItemStack, max_stack: u32) -> SalvageResult<()> {
        let max_stack = max_stack.max(1);
        if stack.is_empty() {
            return Ok(());
        }
        if self.room_for(&stack, max_stack) < u64::from(stack.amount) {
            return Err(SalvageError::OutputFull {
                item_id: stack.item_id,
                amount: stack.amount,
            });
        }

        let mut remaining = stack.amount;

        // First, top up existing stacks
        for existing in self.slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if existing.stacks_with(&stack) && existing.amount < max_stack {
                let add = (max_stack - existing.amount).min(remaining);
                existing.amount += add;
                remaining -= add;
            }
        }

        // Then, use empty slots
        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let add = remaining.min(max_stack);
                let mut placed = stack.clone();
                placed.amount = add;
                *slot = Some(placed);
                remaining -= add;
            }
        }

        Ok(())
    }

    /// Removes up to `amount` items from a slot and returns what was taken.
    ///
    /// The slot is cleared once its stack is exhausted.
    pub fn take(&mut self, slot: usize, amount: u32) -> Option<ItemStack> {
        let entry = self.slots.get_mut(slot)?;
        let stack = entry.as_mut()?;
        let taken_amount = stack.amount.min(amount);
        if taken_amount == 0 {
            return None;
        }

        let mut taken = stack.clone();
        taken.amount = taken_amount;
        stack.amount -= taken_amount;
        if stack.amount == 0 {
            *entry = None;
        }
        Some(taken)
    }
}
