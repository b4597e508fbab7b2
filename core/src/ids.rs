//! Zero-padded sequential identifiers.

use crate::{
    error::{SimError, SimResult},
    types::EntityId,
};

pub const PRODUCT_IDS: (&str, usize) = ("P", 5);
pub const VISITOR_IDS: (&str, usize) = ("V", 8);
pub const CUSTOMER_IDS: (&str, usize) = ("C", 8);
pub const CHANNEL_IDS: (&str, usize) = ("CH", 3);
pub const CAMPAIGN_IDS: (&str, usize) = ("CA", 5);
pub const OFFER_IDS: (&str, usize) = ("O", 6);
pub const ACTIVITY_IDS: (&str, usize) = ("AC", 8);
pub const APPLICATION_IDS: (&str, usize) = ("AP", 8);
pub const STORY_IDS: (&str, usize) = ("ST", 8);

/// Hands out `{prefix}{n:0width$}` for n = 0, 1, 2, ...
#[derive(Debug, Clone)]
pub struct IdSequence {
    prefix: &'static str,
    width: usize,
    next: u64,
}

impl IdSequence {
    pub fn new((prefix, width): (&'static str, usize)) -> Self {
        Self {
            prefix,
            width,
            next: 0,
        }
    }

    /// Largest count of ids this sequence can hand out.
    pub fn capacity(&self) -> u64 {
        10u64.saturating_pow(self.width as u32)
    }

    pub fn issued(&self) -> u64 {
        self.next
    }

    pub fn next_id(&mut self) -> SimResult<EntityId> {
        if self.next >= self.capacity() {
            return Err(SimError::IdSpaceExhausted {
                prefix: self.prefix,
                width: self.width,
            });
        }
        let id = format!("{}{:0width$}", self.prefix, self.next, width = self.width);
        self.next += 1;
        Ok(id)
    }
}
