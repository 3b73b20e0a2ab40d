//! Single-producer, many-reader broadcast over a shared ring of
//! variable-length records.
//!
//! One writer publishes length-prefixed, typed records; any number of
//! independent readers scan the same underlying memory. The ring lives in
//! a memory-mapped file for inter-process use, or in any 8-byte-aligned
//! byte region via [`AtomicBuffer`].
//!
//! # Design
//! - **Transmitter**: holds exclusive write access; publishes records
//!   sequentially and never blocks. There is no back-pressure: a slow
//!   reader is lapped and must detect it.
//! - **Receiver**: keeps its own cursor, skips padding records, and
//!   detects laps through the `tail_intent` counter.
//!
//! # Publication protocol
//!
//! For every record the transmitter:
//! 1. ordered-stores the claimed end position into `tail_intent` and
//!    issues a release fence (readers use this to detect laps before any
//!    byte of theirs is overwritten),
//! 2. plain-stores the record header and payload (a padding record first
//!    when the record would straddle the end of the ring),
//! 3. ordered-stores the record start into `latest`,
//! 4. ordered-stores the new committed position into `tail`.
//!
//! The final store is the commit point: its release pairs with the
//! reader's acquire load of `tail`, covering every prior plain store.
//! `latest` is published before `tail` so a reader that sees the new
//! `tail` can never load a `latest` older than that record.

use crate::buffer::AtomicBuffer;
use crate::error::BroadcastError;
use crate::layout::{
    LATEST_COUNTER_OFFSET, TAIL_COUNTER_OFFSET, TAIL_INTENT_COUNTER_OFFSET, TRAILER_LENGTH,
};
use crate::{layout, record};
use basalt_mmap::{MmapFile, MmapFileMut};
use std::path::Path;
use std::sync::atomic::{fence, Ordering};

/// The writer side of the broadcast ring.
///
/// Exactly one thread of execution may transmit on a given ring at a
/// time; the `&mut self` entry point and the by-value ownership of the
/// buffer view encode that single-writer discipline. Readers attach
/// through the separate [`Receiver`] handle.
pub struct Transmitter {
    /// Owns the mmap lifetime when created via [`Transmitter::create`].
    _mm: Option<MmapFileMut>,
    buffer: AtomicBuffer,
    /// Data region length in bytes. Power of two.
    capacity: usize,
    /// `capacity - 1`, for ring offset arithmetic on absolute positions.
    mask: u64,
    max_msg_length: usize,
    tail_intent_counter_index: usize,
    tail_counter_index: usize,
    latest_counter_index: usize,
}

impl Transmitter {
    /// Creates the backing file at `path` sized for a data region of
    /// `capacity` bytes plus the counter trailer, maps it read-write,
    /// and attaches a transmitter to it.
    ///
    /// The file is truncated, so all three counters start at zero.
    ///
    /// # Errors
    /// - [`BroadcastError::InvalidCapacity`] unless `capacity` is a power
    ///   of two of at least two record slots
    /// - [`BroadcastError::Backing`] if the file cannot be created or mapped
    pub fn create<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, BroadcastError> {
        layout::check_capacity(capacity)?;

        let total = capacity + TRAILER_LENGTH;
        let mut mm = MmapFileMut::create_rw(&path, total as u64).map_err(|source| {
            BroadcastError::Backing {
                path: path.as_ref().display().to_string(),
                source,
            }
        })?;

        // SAFETY: the mapping is page-aligned, `total` bytes long, and is
        // kept alive by storing `mm` in the returned transmitter.
        let buffer = unsafe { AtomicBuffer::wrap(mm.as_mut_ptr(), total) };

        let mut transmitter = Self::attach(buffer)?;
        transmitter._mm = Some(mm);
        Ok(transmitter)
    }

    /// Attaches to an externally owned, already-initialized buffer.
    ///
    /// The wrapped region is the data ring followed by the counter
    /// trailer; the data capacity is derived as
    /// `buffer.capacity() - TRAILER_LENGTH` and validated.
    pub fn attach(buffer: AtomicBuffer) -> Result<Self, BroadcastError> {
        let capacity = buffer.capacity().saturating_sub(TRAILER_LENGTH);
        layout::check_capacity(capacity)?;

        Ok(Self {
            _mm: None,
            buffer,
            capacity,
            mask: capacity as u64 - 1,
            max_msg_length: record::max_message_length(capacity),
            tail_intent_counter_index: capacity + TAIL_INTENT_COUNTER_OFFSET,
            tail_counter_index: capacity + TAIL_COUNTER_OFFSET,
            latest_counter_index: capacity + LATEST_COUNTER_OFFSET,
        })
    }

    /// Data region capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest payload a single transmit accepts: `capacity / 8`.
    #[inline]
    pub fn max_msg_length(&self) -> usize {
        self.max_msg_length
    }

    /// Publishes one record.
    ///
    /// On success the record is visible to any receiver that acquire-loads
    /// `tail` at or past the new committed position. On failure nothing in
    /// the ring has changed: validation runs before the first store.
    ///
    /// # Errors
    /// - [`BroadcastError::InvalidMsgTypeId`] unless `msg_type_id > 0`
    /// - [`BroadcastError::MessageTooLong`] if the payload exceeds
    ///   [`max_msg_length`](Self::max_msg_length)
    pub fn transmit(&mut self, msg_type_id: i32, message: &[u8]) -> Result<(), BroadcastError> {
        record::check_msg_type_id(msg_type_id)?;
        self.check_message_length(message.len())?;

        // Single writer: the plain load of our own last commit is authoritative.
        let mut current_tail = self.buffer.load_u64(self.tail_counter_index, Ordering::Relaxed);
        let mut record_offset = (current_tail & self.mask) as usize;

        let record_length = message.len() + record::HEADER_LENGTH;
        let aligned_record_length = record::align(record_length, record::RECORD_ALIGNMENT);
        let to_end_of_buffer = self.capacity - record_offset;

        if to_end_of_buffer < aligned_record_length {
            // The record would straddle the end of the ring. Claim the
            // remainder plus the record in one intent, pad out the current
            // cycle, and start the record at offset 0 of the next one.
            self.signal_tail_intent(
                current_tail + (to_end_of_buffer + aligned_record_length) as u64,
            );
            self.insert_padding_record(record_offset, to_end_of_buffer);

            current_tail += to_end_of_buffer as u64;
            record_offset = 0;
        } else {
            self.signal_tail_intent(current_tail + aligned_record_length as u64);
        }

        self.buffer.store_i32(
            record::length_offset(record_offset),
            record_length as i32,
            Ordering::Relaxed,
        );
        self.buffer.store_i32(
            record::type_offset(record_offset),
            msg_type_id,
            Ordering::Relaxed,
        );
        self.buffer.put_bytes(record::msg_offset(record_offset), message);

        // Publish `latest` before the commit so a reader that observes the
        // new `tail` cannot see a stale newest-record pointer.
        self.buffer
            .store_u64(self.latest_counter_index, current_tail, Ordering::Release);
        self.buffer.store_u64(
            self.tail_counter_index,
            current_tail + aligned_record_length as u64,
            Ordering::Release,
        );

        Ok(())
    }

    #[inline]
    fn check_message_length(&self, length: usize) -> Result<(), BroadcastError> {
        if length > self.max_msg_length {
            return Err(BroadcastError::MessageTooLong {
                length,
                max: self.max_msg_length,
            });
        }
        Ok(())
    }

    /// Advertises the position the ring will have been written up to once
    /// the in-flight record commits.
    ///
    /// The ordered store gives the single-location happens-before edge on
    /// `tail_intent` itself; the fence additionally keeps the intent store
    /// ahead of the following plain record stores for readers that
    /// acquire-load `tail` first and inspect `tail_intent` independently.
    #[inline]
    fn signal_tail_intent(&mut self, new_tail: u64) {
        self.buffer
            .store_u64(self.tail_intent_counter_index, new_tail, Ordering::Release);
        fence(Ordering::Release);
    }

    /// Writes a payload-less record spanning the unused remainder of the
    /// current cycle so the next real record can start at offset 0.
    #[inline]
    fn insert_padding_record(&mut self, record_offset: usize, length: usize) {
        self.buffer.store_i32(
            record::length_offset(record_offset),
            length as i32,
            Ordering::Relaxed,
        );
        self.buffer.store_i32(
            record::type_offset(record_offset),
            record::PADDING_MSG_TYPE_ID,
            Ordering::Relaxed,
        );
    }
}

/// The reader side of the broadcast ring.
///
/// Each receiver keeps an independent cursor and joins at the current
/// committed tail (tail-follow), so it only observes records published
/// after it attached. Receivers never write to the shared region.
///
/// The scanning protocol is two-phase: [`receive_next`](Self::receive_next)
/// positions the cursor on the next record, and [`validate`](Self::validate)
/// confirms, after the record has been consumed, that the producer did not
/// lap the cursor mid-read. [`try_read`](Self::try_read) bundles both with
/// a copy-out.
pub struct Receiver {
    /// Owns the mmap lifetime when created via [`Receiver::open`].
    _mm: Option<MmapFile>,
    buffer: AtomicBuffer,
    capacity: usize,
    mask: u64,
    tail_intent_counter_index: usize,
    tail_counter_index: usize,
    latest_counter_index: usize,
    /// Ring offset of the record resolved by the last `receive_next`.
    record_offset: usize,
    /// Absolute position of the record resolved by the last `receive_next`.
    cursor: u64,
    /// Absolute position the next `receive_next` will resolve.
    next_record: u64,
    /// Count of laps detected while scanning.
    lapped_count: u64,
}

impl Receiver {
    /// Opens an existing broadcast file read-only and attaches at the
    /// current committed tail.
    ///
    /// # Errors
    /// - [`BroadcastError::Backing`] if the file cannot be opened or mapped
    /// - [`BroadcastError::InvalidCapacity`] if the file length minus the
    ///   trailer is not a valid ring capacity (not a broadcast file)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BroadcastError> {
        let mm = MmapFile::open_ro(&path).map_err(|source| BroadcastError::Backing {
            path: path.as_ref().display().to_string(),
            source,
        })?;

        // SAFETY: page-aligned read-only mapping, kept alive by storing
        // `mm` in the returned receiver. A receiver only ever loads.
        let buffer = unsafe { AtomicBuffer::wrap(mm.as_ptr() as *mut u8, mm.len()) };

        let mut receiver = Self::attach(buffer)?;
        receiver._mm = Some(mm);
        Ok(receiver)
    }

    /// Attaches to an externally owned buffer at the current committed tail.
    pub fn attach(buffer: AtomicBuffer) -> Result<Self, BroadcastError> {
        let capacity = buffer.capacity().saturating_sub(TRAILER_LENGTH);
        layout::check_capacity(capacity)?;

        let tail_counter_index = capacity + TAIL_COUNTER_OFFSET;
        // Tail-follow join: synchronize with the producer's latest commit.
        let cursor = buffer.load_u64(tail_counter_index, Ordering::Acquire);

        Ok(Self {
            _mm: None,
            buffer,
            capacity,
            mask: capacity as u64 - 1,
            tail_intent_counter_index: capacity + TAIL_INTENT_COUNTER_OFFSET,
            tail_counter_index,
            latest_counter_index: capacity + LATEST_COUNTER_OFFSET,
            record_offset: 0,
            cursor,
            next_record: cursor,
            lapped_count: 0,
        })
    }

    /// Data region capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of times this receiver has been lapped by the producer.
    /// Each lap fast-forwards the cursor to the most recent record, so
    /// every record published in between was lost.
    #[inline]
    pub fn lapped_count(&self) -> u64 {
        self.lapped_count
    }

    /// Advances to the next available record.
    ///
    /// Returns `true` when a record is available; its fields can then be
    /// read through [`msg_type_id`](Self::msg_type_id),
    /// [`offset`](Self::offset) and [`length`](Self::length). Padding
    /// records are skipped transparently. If the cursor has been lapped,
    /// it fast-forwards to the most recently committed record and the lap
    /// is counted.
    pub fn receive_next(&mut self) -> bool {
        let tail = self.buffer.load_u64(self.tail_counter_index, Ordering::Acquire);
        let mut cursor = self.next_record;

        if tail <= cursor {
            return false;
        }

        let mut record_offset = (cursor & self.mask) as usize;

        if !self.is_valid(cursor) {
            self.lapped_count += 1;
            cursor = self.buffer.load_u64(self.latest_counter_index, Ordering::Relaxed);
            record_offset = (cursor & self.mask) as usize;
        }

        self.cursor = cursor;
        self.next_record = cursor + self.aligned_length_at(record_offset) as u64;

        if self.buffer.load_i32(record::type_offset(record_offset), Ordering::Relaxed)
            == record::PADDING_MSG_TYPE_ID
        {
            // Padding spans to the end of the cycle; the record it made
            // room for starts at offset 0 of the next one.
            self.cursor = self.next_record;
            record_offset = 0;
            self.next_record += self.aligned_length_at(0) as u64;
        }

        self.record_offset = record_offset;
        true
    }

    /// Type id of the current record. Valid after `receive_next` returned
    /// `true` and until the next call.
    #[inline]
    pub fn msg_type_id(&self) -> i32 {
        self.buffer
            .load_i32(record::type_offset(self.record_offset), Ordering::Relaxed)
    }

    /// Ring offset of the current record's payload.
    #[inline]
    pub fn offset(&self) -> usize {
        record::msg_offset(self.record_offset)
    }

    /// Payload length of the current record in bytes.
    #[inline]
    pub fn length(&self) -> usize {
        let record_length = self
            .buffer
            .load_i32(record::length_offset(self.record_offset), Ordering::Relaxed);
        // A header being lapped mid-read can hold anything; clamp so the
        // caller's copy stays in bounds and leave rejection to validate().
        if record_length < record::HEADER_LENGTH as i32 {
            return 0;
        }
        (record_length as usize - record::HEADER_LENGTH)
            .min(self.capacity - self.offset())
    }

    /// Copies the current record's payload out of the ring.
    #[inline]
    pub fn copy_payload(&self, dst: &mut [u8]) {
        self.buffer.get_bytes(self.offset(), dst);
    }

    /// Confirms that the record resolved by the last `receive_next` was
    /// not overwritten while it was being consumed.
    ///
    /// Must be called *after* reading the record's bytes; the acquire
    /// fence orders those reads before the `tail_intent` check.
    #[inline]
    pub fn validate(&self) -> bool {
        fence(Ordering::Acquire);
        self.is_valid(self.cursor)
    }

    /// Receives the next record by copy, in one call.
    ///
    /// Copies the payload into `dst` and returns the message type id, or
    /// `None` when the receiver is caught up. A record invalidated while
    /// it was being copied is discarded and the scan continues, so the
    /// returned bytes are always a coherent record.
    pub fn try_read(&mut self, dst: &mut Vec<u8>) -> Option<i32> {
        loop {
            if !self.receive_next() {
                return None;
            }

            let msg_type_id = self.msg_type_id();
            dst.clear();
            dst.resize(self.length(), 0);
            self.copy_payload(dst);

            if self.validate() {
                return Some(msg_type_id);
            }
            // Lapped mid-copy: the bytes cannot be trusted, rescan.
        }
    }

    /// A cursor is still valid while the producer has not claimed memory
    /// a full capacity ahead of it.
    #[inline]
    fn is_valid(&self, cursor: u64) -> bool {
        cursor + self.capacity as u64
            > self
                .buffer
                .load_u64(self.tail_intent_counter_index, Ordering::Acquire)
    }

    #[inline]
    fn aligned_length_at(&self, record_offset: usize) -> usize {
        let record_length = self
            .buffer
            .load_i32(record::length_offset(record_offset), Ordering::Relaxed);
        record::align(record_length.max(0) as usize, record::RECORD_ALIGNMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TRAILER_LENGTH;

    const CAPACITY: usize = 1024;

    /// Backing store for an in-memory ring: u64 cells guarantee the
    /// 8-byte alignment `AtomicBuffer::wrap` requires.
    fn region(capacity: usize) -> Vec<u64> {
        vec![0u64; (capacity + TRAILER_LENGTH) / 8]
    }

    fn wrap(mem: &mut [u64]) -> AtomicBuffer {
        unsafe { AtomicBuffer::wrap(mem.as_mut_ptr().cast(), mem.len() * 8) }
    }

    fn counters(buf: &AtomicBuffer, capacity: usize) -> (u64, u64, u64) {
        (
            buf.load_u64(capacity + TAIL_INTENT_COUNTER_OFFSET, Ordering::Acquire),
            buf.load_u64(capacity + TAIL_COUNTER_OFFSET, Ordering::Acquire),
            buf.load_u64(capacity + LATEST_COUNTER_OFFSET, Ordering::Acquire),
        )
    }

    #[test]
    fn single_aligned_publish() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);
        let mut tx = Transmitter::attach(buf).unwrap();

        tx.transmit(7, &[0xAA; 8]).unwrap();

        assert_eq!(buf.load_i32(0, Ordering::Relaxed), 16);
        assert_eq!(buf.load_i32(4, Ordering::Relaxed), 7);
        let mut payload = [0u8; 8];
        buf.get_bytes(8, &mut payload);
        assert_eq!(payload, [0xAA; 8]);

        let (tail_intent, tail, latest) = counters(&buf, CAPACITY);
        assert_eq!(latest, 0);
        assert_eq!(tail, 16);
        assert_eq!(tail_intent, 16);
    }

    #[test]
    fn two_consecutive_publishes() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);
        let mut tx = Transmitter::attach(buf).unwrap();

        tx.transmit(7, &[0xAA; 8]).unwrap();
        tx.transmit(9, &[0xBB; 3]).unwrap();

        // Second record: length 11 rounded up to a 16-byte slot at offset 16.
        assert_eq!(buf.load_i32(16, Ordering::Relaxed), 11);
        assert_eq!(buf.load_i32(20, Ordering::Relaxed), 9);
        let mut payload = [0u8; 3];
        buf.get_bytes(24, &mut payload);
        assert_eq!(payload, [0xBB; 3]);

        let (tail_intent, tail, latest) = counters(&buf, CAPACITY);
        assert_eq!(latest, 16);
        assert_eq!(tail, 32);
        assert_eq!(tail_intent, 32);
    }

    #[test]
    fn wrap_inserts_exactly_one_padding_record() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);

        // Park the ring 16 bytes short of the end of the first cycle.
        for index in [
            CAPACITY + TAIL_INTENT_COUNTER_OFFSET,
            CAPACITY + TAIL_COUNTER_OFFSET,
            CAPACITY + LATEST_COUNTER_OFFSET,
        ] {
            buf.store_u64(index, 1008, Ordering::Relaxed);
        }

        let mut tx = Transmitter::attach(buf).unwrap();
        tx.transmit(3, &[0xCC; 24]).unwrap();

        // Padding record spans the 16 leftover bytes.
        assert_eq!(buf.load_i32(1008, Ordering::Relaxed), 16);
        assert_eq!(
            buf.load_i32(1012, Ordering::Relaxed),
            record::PADDING_MSG_TYPE_ID
        );

        // The real record starts the next cycle at offset 0.
        assert_eq!(buf.load_i32(0, Ordering::Relaxed), 32);
        assert_eq!(buf.load_i32(4, Ordering::Relaxed), 3);
        let mut payload = [0u8; 24];
        buf.get_bytes(8, &mut payload);
        assert_eq!(payload, [0xCC; 24]);

        let (tail_intent, tail, latest) = counters(&buf, CAPACITY);
        assert_eq!(tail_intent, 1056);
        assert_eq!(latest, 1024);
        assert_eq!(tail, 1056);
    }

    /// Byte image of the whole region (data ring and trailer counters),
    /// read through the buffer.
    fn snapshot(buf: &AtomicBuffer) -> Vec<u8> {
        let mut bytes = vec![0u8; buf.capacity()];
        buf.get_bytes(0, &mut bytes);
        bytes
    }

    #[test]
    fn oversize_message_is_rejected_without_side_effects() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);
        let mut tx = Transmitter::attach(buf).unwrap();
        assert_eq!(tx.max_msg_length(), 128);

        let before = snapshot(&buf);
        let err = tx.transmit(1, &[0u8; 129]).unwrap_err();
        assert!(matches!(
            err,
            BroadcastError::MessageTooLong { length: 129, max: 128 }
        ));
        assert_eq!(snapshot(&buf), before, "failed transmit must not touch the buffer");
    }

    #[test]
    fn non_positive_type_id_is_rejected_without_side_effects() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);
        let mut tx = Transmitter::attach(buf).unwrap();
        tx.transmit(1, &[1, 2, 3]).unwrap();

        let before = snapshot(&buf);
        assert!(matches!(
            tx.transmit(0, &[]),
            Err(BroadcastError::InvalidMsgTypeId(0))
        ));
        assert!(matches!(
            tx.transmit(-5, &[0xFF]),
            Err(BroadcastError::InvalidMsgTypeId(-5))
        ));
        assert_eq!(snapshot(&buf), before, "rejected transmits must not touch the buffer");
    }

    #[test]
    fn attach_rejects_invalid_capacity() {
        // 768 + trailer: not a power of two.
        let mut mem = vec![0u64; (768 + TRAILER_LENGTH) / 8];
        let buf = unsafe { AtomicBuffer::wrap(mem.as_mut_ptr().cast(), mem.len() * 8) };
        assert!(matches!(
            Transmitter::attach(buf),
            Err(BroadcastError::InvalidCapacity { capacity: 768, .. })
        ));

        // Region smaller than the trailer itself.
        let mut mem = vec![0u64; 8];
        let buf = unsafe { AtomicBuffer::wrap(mem.as_mut_ptr().cast(), mem.len() * 8) };
        assert!(Transmitter::attach(buf).is_err());
    }

    #[test]
    fn tail_advances_by_aligned_lengths_and_stays_aligned() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);
        let mut tx = Transmitter::attach(buf).unwrap();

        let mut expected_tail = 0u64;
        for length in [0usize, 1, 7, 8, 9, 63, 64, 100, 128] {
            tx.transmit(1, &vec![0x5A; length]).unwrap();

            let aligned =
                record::align(length + record::HEADER_LENGTH, record::RECORD_ALIGNMENT) as u64;
            let record_offset = expected_tail & (CAPACITY as u64 - 1);
            let to_end = CAPACITY as u64 - record_offset;
            if to_end < aligned {
                expected_tail += to_end; // padding consumed the cycle remainder
            }
            expected_tail += aligned;

            let (tail_intent, tail, latest) = counters(&buf, CAPACITY);
            assert_eq!(tail, expected_tail);
            assert_eq!(tail % record::RECORD_ALIGNMENT as u64, 0);
            assert_eq!(latest % record::RECORD_ALIGNMENT as u64, 0);
            assert_eq!(tail_intent, tail, "no publish in flight");
            assert_eq!(latest, tail - aligned);
        }
    }

    #[test]
    fn round_trip_through_receiver() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);
        let mut tx = Transmitter::attach(buf).unwrap();
        let mut rx = Receiver::attach(buf).unwrap();

        tx.transmit(42, b"basalt broadcast").unwrap();

        assert!(rx.receive_next());
        assert_eq!(rx.msg_type_id(), 42);
        assert_eq!(rx.length(), 16);
        let mut payload = vec![0u8; rx.length()];
        rx.copy_payload(&mut payload);
        assert!(rx.validate());
        assert_eq!(&payload, b"basalt broadcast");

        assert!(!rx.receive_next(), "single record, receiver is caught up");
    }

    #[test]
    fn try_read_streams_records_in_order() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);
        let mut tx = Transmitter::attach(buf).unwrap();
        let mut rx = Receiver::attach(buf).unwrap();

        for i in 1..=10i32 {
            tx.transmit(i, &[i as u8; 5]).unwrap();
        }

        let mut msg = Vec::new();
        for i in 1..=10i32 {
            assert_eq!(rx.try_read(&mut msg), Some(i));
            assert_eq!(msg, vec![i as u8; 5]);
        }
        assert_eq!(rx.try_read(&mut msg), None);
        assert_eq!(rx.lapped_count(), 0);
    }

    #[test]
    fn receiver_skips_padding_across_the_wrap() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);

        for index in [
            CAPACITY + TAIL_INTENT_COUNTER_OFFSET,
            CAPACITY + TAIL_COUNTER_OFFSET,
            CAPACITY + LATEST_COUNTER_OFFSET,
        ] {
            buf.store_u64(index, 1008, Ordering::Relaxed);
        }

        let mut tx = Transmitter::attach(buf).unwrap();
        let mut rx = Receiver::attach(buf).unwrap();

        tx.transmit(3, &[0xCC; 24]).unwrap();

        let mut msg = Vec::new();
        assert_eq!(rx.try_read(&mut msg), Some(3));
        assert_eq!(msg, vec![0xCC; 24]);
        assert_eq!(rx.try_read(&mut msg), None);
    }

    #[test]
    fn lapped_receiver_detects_loss_and_fast_forwards() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);
        let mut tx = Transmitter::attach(buf).unwrap();
        let mut rx = Receiver::attach(buf).unwrap();

        // 128 records of 16 bytes is two full cycles: the receiver's
        // position at 0 is long gone.
        for i in 0..128u64 {
            tx.transmit(1, &i.to_ne_bytes()).unwrap();
        }

        let mut msg = Vec::new();
        assert_eq!(rx.try_read(&mut msg), Some(1));
        assert_eq!(rx.lapped_count(), 1);
        // Fast-forwarded to the most recent record.
        assert_eq!(u64::from_ne_bytes(msg[..8].try_into().unwrap()), 127);
        assert_eq!(rx.try_read(&mut msg), None);
    }

    #[test]
    fn receiver_joins_at_current_tail() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);
        let mut tx = Transmitter::attach(buf).unwrap();

        tx.transmit(1, b"before join").unwrap();

        let mut rx = Receiver::attach(buf).unwrap();
        let mut msg = Vec::new();
        assert_eq!(rx.try_read(&mut msg), None, "tail-follow skips history");

        tx.transmit(2, b"after join").unwrap();
        assert_eq!(rx.try_read(&mut msg), Some(2));
        assert_eq!(msg, b"after join");
    }

    #[test]
    fn zero_length_message_round_trips() {
        let mut mem = region(CAPACITY);
        let buf = wrap(&mut mem);
        let mut tx = Transmitter::attach(buf).unwrap();
        let mut rx = Receiver::attach(buf).unwrap();

        tx.transmit(9, &[]).unwrap();

        let mut msg = vec![0xEE; 4];
        assert_eq!(rx.try_read(&mut msg), Some(9));
        assert!(msg.is_empty());

        let (tail_intent, tail, latest) = counters(&buf, CAPACITY);
        assert_eq!((tail_intent, tail, latest), (8, 8, 0));
    }

    #[test]
    fn mmap_backed_create_and_open() {
        let path = format!("/tmp/basalt_bus_unit_{}", std::process::id());
        let _ = std::fs::remove_file(&path);

        {
            let mut tx = Transmitter::create(&path, CAPACITY).unwrap();
            assert_eq!(tx.capacity(), CAPACITY);
            let mut rx = Receiver::open(&path).unwrap();

            tx.transmit(5, b"mapped").unwrap();
            let mut msg = Vec::new();
            assert_eq!(rx.try_read(&mut msg), Some(5));
            assert_eq!(msg, b"mapped");
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn create_rejects_invalid_capacity_before_touching_the_path() {
        let path = format!("/tmp/basalt_bus_unit_badcap_{}", std::process::id());
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            Transmitter::create(&path, 768),
            Err(BroadcastError::InvalidCapacity { capacity: 768, .. })
        ));
        assert!(
            !std::path::Path::new(&path).exists(),
            "no file may be created for an invalid capacity"
        );
    }
}
