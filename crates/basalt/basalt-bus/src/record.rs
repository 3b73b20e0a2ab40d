//! Record layout within the data ring.
//!
//! Every record is an 8-byte header followed by the payload, and always
//! starts at an 8-byte-aligned ring offset:
//!
//! ```text
//! ┌───────────────┬───────────────┬─────────────────────────────┐
//! │ length (i32)  │ type (i32)    │ payload (length - 8 bytes)  │
//! └───────────────┴───────────────┴─────────────────────────────┘
//! ```
//!
//! `length` counts the header itself. Padding records carry the reserved
//! negative type id and a `length` spanning the unused remainder of the
//! ring; they have no payload and readers skip them.

use crate::error::BroadcastError;

/// Record header length in bytes: 4-byte length + 4-byte type id.
pub const HEADER_LENGTH: usize = 8;

/// Records begin at offsets aligned to this, and record lengths are
/// rounded up to it when advancing the tail.
pub const RECORD_ALIGNMENT: usize = 8;

/// Reserved type id marking a padding record. Negative so that readers
/// can filter padding with a plain sign check; user ids are positive.
pub const PADDING_MSG_TYPE_ID: i32 = -1;

#[inline(always)]
pub const fn length_offset(record_offset: usize) -> usize {
    record_offset
}

#[inline(always)]
pub const fn type_offset(record_offset: usize) -> usize {
    record_offset + 4
}

#[inline(always)]
pub const fn msg_offset(record_offset: usize) -> usize {
    record_offset + HEADER_LENGTH
}

/// Max payload length a ring of `capacity` accepts: one eighth of the
/// data region. Bounding messages this way caps the worst-case padding
/// waste at the end of a cycle.
#[inline(always)]
pub const fn max_message_length(capacity: usize) -> usize {
    capacity / 8
}

/// Rounds `value` up to a multiple of `alignment` (a power of two).
#[inline(always)]
pub const fn align(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

/// User message type ids must be positive.
#[inline]
pub fn check_msg_type_id(msg_type_id: i32) -> Result<(), BroadcastError> {
    if msg_type_id <= 0 {
        return Err(BroadcastError::InvalidMsgTypeId(msg_type_id));
    }
    Ok(())
}
