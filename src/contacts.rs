//! Contact rotation list.
//!
//! `NUM_CONTACTS` slots, fixed for the lifetime of the process.  Slot 0 is
//! the primary contact: it receives arm/disarm and siren-off notices and is
//! the first number called when an escalation starts.  Only the `REG`
//! command rewrites a slot; the list length never changes.

use core::fmt::Write;

use crate::text::{Identity, MessageBody, Truncating, bounded, is_phone_number};

/// Number of contact slots (N).
pub const NUM_CONTACTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactError {
    /// Slot index outside `0..NUM_CONTACTS`.
    IndexOutOfRange(usize),
    /// Replacement is not a phone number.
    InvalidNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactList {
    slots: [Identity; NUM_CONTACTS],
}

impl ContactList {
    pub fn new(initial: &[Identity; NUM_CONTACTS]) -> Self {
        Self { slots: initial.clone() }
    }

    pub const fn len(&self) -> usize {
        NUM_CONTACTS
    }

    pub const fn is_empty(&self) -> bool {
        NUM_CONTACTS == 0
    }

    /// Number at `index`, or `None` when the slot is out of range or blank.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots
            .get(index)
            .map(Identity::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The primary contact (slot 0).
    pub fn primary(&self) -> Option<&str> {
        self.get(0)
    }

    /// Overwrite slot `index` with `number`.
    pub fn replace(&mut self, index: usize, number: &str) -> Result<(), ContactError> {
        if !is_phone_number(number) {
            return Err(ContactError::InvalidNumber);
        }
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ContactError::IndexOutOfRange(index))?;
        *slot = bounded(number);
        Ok(())
    }

    /// One `"<index>: <number>"` line per slot, `\r\n` separated.
    pub fn render(&self) -> MessageBody {
        let mut body = MessageBody::new();
        let mut w = Truncating(&mut body);
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                let _ = w.write_str("\r\n");
            }
            let number = if slot.is_empty() { "-" } else { slot.as_str() };
            let _ = write!(w, "{}: {}", i, number);
        }
        body
    }
}
