//! Access control list: the fixed set of phone numbers allowed to issue
//! commands.
//!
//! Identity is the caller-ID string as reported by the network.  There is
//! no cryptographic authentication; a number on the list is trusted.

use crate::text::{Identity, bounded};

/// Maximum number of authorized senders.
pub const MAX_ALLOWED: usize = 3;

/// Static allow-list, built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct AccessList {
    numbers: heapless::Vec<Identity, MAX_ALLOWED>,
}

impl AccessList {
    pub fn new<'a>(numbers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut list = Self::default();
        for n in numbers {
            if n.is_empty() {
                continue;
            }
            if list.numbers.push(bounded(n)).is_err() {
                log::warn!("ACL: more than {} numbers configured, ignoring {}", MAX_ALLOWED, n);
            }
        }
        list
    }

    /// Exact string match against the allow-list.
    pub fn is_allowed(&self, sender: &str) -> bool {
        !sender.is_empty() && self.numbers.iter().any(|n| n.as_str() == sender)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}
