//! Guid generation.
//!
//! A guid is 24 lowercase hex characters built from six 4-character groups. Each
//! group is sampled from `[0x10000, 0x20000)` and rendered with its leading `1`
//! dropped, so every group is exactly four characters wide.
//!
//! Randomness comes from a [`GuidSource`]; uniqueness is enforced by [`issue_guid`]
//! against the set of guids a store has already handed out.

use rand::Rng;
use std::{collections::HashSet, fmt::Debug};

use crate::config::{GUID_GROUPS, GUID_LEN};

/// A source of candidate guids.
///
/// Candidates need not be unique; [`issue_guid`] re-rolls until it finds one that
/// has not been issued before.
pub trait GuidSource: Send + Sync + Debug {
    /// Produces the next candidate guid.
    fn next_guid(&mut self) -> String;
}

/// The default source, backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomGuid;

impl GuidSource for RandomGuid {
    fn next_guid(&mut self) -> String {
        let mut rng = rand::thread_rng();
        let mut guid = String::with_capacity(GUID_LEN);

        for _ in 0..GUID_GROUPS {
            let sample: u32 = rng.gen_range(0x1_0000..0x2_0000);
            guid.push_str(&format!("{sample:x}")[1..]);
        }

        guid
    }
}

/// Draws candidates from `source` until one is absent from `issued`, records it and returns it.
pub fn issue_guid(source: &mut dyn GuidSource, issued: &mut HashSet<String>) -> String {
    loop {
        let guid = source.next_guid();

        if issued.insert(guid.clone()) {
            return guid;
        }

        tracing::debug!(guid = %guid, "guid collision, re-rolling");
    }
}

/// Returns true if `guid` has the 24-character lowercase hex shape.
pub fn is_well_formed(guid: &str) -> bool {
    guid.len() == GUID_LEN
        && guid
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
