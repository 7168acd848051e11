// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Per-endpoint transfer bookkeeping.
//!
//! One [`TransferControl`] exists for every endpoint number and direction. It
//! records the buffer lent by the client and how much of it has been handed
//! to the hardware. The hardware moves at most one packet per interrupt, so a
//! transfer is a sequence of [`TransferControl::next_packet`] calls, one per
//! "packet sent" interrupt, ending with [`Step::Complete`].

use core::cell::Cell;

use kernel::utilities::cells::{OptionalCell, VolatileCell};

/// Whether a slot has a transfer in flight.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferState {
    /// No transfer queued, or the last one already completed.
    Idle,
    /// A transfer is queued and the next endpoint interrupt continues it.
    Armed,
}

/// What the interrupt handler must do next for an IN transfer.
#[derive(Copy, Clone)]
pub(crate) enum Step<'a> {
    /// Write these bytes to the packet buffer as the next packet. An empty
    /// slice is a zero-length packet.
    Packet(&'a [VolatileCell<u8>]),
    /// Every byte has been acknowledged; report this many bytes.
    Complete(usize),
    /// Nothing is in flight on this slot, or the slot has no packet size
    /// yet.
    Idle,
}

/// Snapshot of a slot, for tracing and tests.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransferProgress {
    pub state: TransferState,
    pub total_len: usize,
    pub queued_len: usize,
    pub short_packet: bool,
    pub zlp_sent: bool,
}

pub(crate) struct TransferControl<'a> {
    buffer: OptionalCell<&'a [VolatileCell<u8>]>,
    total_len: Cell<usize>,
    queued_len: Cell<usize>,
    max_size: Cell<usize>,
    short_packet: Cell<bool>,
    zlp_sent: Cell<bool>,
    state: Cell<TransferState>,
}

impl<'a> TransferControl<'a> {
    pub(crate) const fn new(max_size: usize) -> Self {
        TransferControl {
            buffer: OptionalCell::empty(),
            total_len: Cell::new(0),
            queued_len: Cell::new(0),
            max_size: Cell::new(max_size),
            short_packet: Cell::new(false),
            zlp_sent: Cell::new(false),
            state: Cell::new(TransferState::Idle),
        }
    }

    pub(crate) fn set_max_size(&self, max_size: usize) {
        self.max_size.set(max_size);
    }

    /// Reset the slot for a new transfer of all of `buf`. Whatever was in
    /// flight before is forgotten.
    pub(crate) fn start(&self, buf: &'a [VolatileCell<u8>]) {
        self.buffer.set(buf);
        self.total_len.set(buf.len());
        self.queued_len.set(0);
        self.short_packet.set(false);
        self.zlp_sent.set(false);
        self.state.set(TransferState::Armed);
    }

    /// Drop any transfer in flight without reporting it.
    pub(crate) fn abort(&self) {
        self.buffer.clear();
        self.state.set(TransferState::Idle);
    }

    /// Advance the transfer by one packet.
    ///
    /// A transfer of zero bytes sends exactly one zero-length packet. A
    /// transfer whose length is a multiple of the packet size ends without a
    /// trailing zero-length packet. A slot without a packet size stays armed
    /// and sends nothing.
    pub(crate) fn next_packet(&self) -> Step<'a> {
        if self.state.get() == TransferState::Idle || self.max_size.get() == 0 {
            return Step::Idle;
        }

        let total = self.total_len.get();
        let queued = self.queued_len.get();
        let zlp = total == 0;

        if (!zlp && queued == total) || self.zlp_sent.get() {
            self.buffer.clear();
            self.state.set(TransferState::Idle);
            return Step::Complete(queued);
        }

        let size = core::cmp::min(self.max_size.get(), total - queued);
        let chunk = match self.buffer.get() {
            Some(buf) => &buf[queued..queued + size],
            None => &[],
        };

        self.queued_len.set(queued + size);
        if size < self.max_size.get() {
            self.short_packet.set(true);
        }
        if zlp {
            self.zlp_sent.set(true);
        }

        Step::Packet(chunk)
    }

    pub(crate) fn progress(&self) -> TransferProgress {
        TransferProgress {
            state: self.state.get(),
            total_len: self.total_len.get(),
            queued_len: self.queued_len.get(),
            short_packet: self.short_packet.get(),
            zlp_sent: self.zlp_sent.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Step, TransferControl, TransferState};
    use kernel::utilities::cells::VolatileCell;
    use std::vec::Vec;

    /// Drive a slot to completion and return the packet sizes and the
    /// completed byte count.
    fn run(xfer: &TransferControl, limit: usize) -> (Vec<usize>, Option<usize>) {
        let mut packets = Vec::new();
        for _ in 0..limit {
            let before = xfer.progress().queued_len;
            match xfer.next_packet() {
                Step::Packet(chunk) => {
                    packets.push(chunk.len());
                    let after = xfer.progress();
                    assert!(after.queued_len >= before);
                    assert!(after.queued_len <= after.total_len);
                }
                Step::Complete(n) => return (packets, Some(n)),
                Step::Idle => break,
            }
        }
        (packets, None)
    }

    #[test]
    fn packet_split_matches_max_size() {
        let storage: Vec<VolatileCell<u8>> = (0..64).map(VolatileCell::new).collect();
        for max_size in [1usize, 3, 8] {
            for len in 0..storage.len() {
                let xfer = TransferControl::new(max_size);
                xfer.start(&storage[..len]);

                let (packets, done) = run(&xfer, 100);
                assert_eq!(done, Some(len), "len {} max {}", len, max_size);

                if len == 0 {
                    assert_eq!(packets, [0]);
                    continue;
                }
                let full = len / max_size;
                let rest = len % max_size;
                assert_eq!(packets.len(), full + usize::from(rest != 0));
                assert!(packets[..full].iter().all(|&p| p == max_size));
                if rest != 0 {
                    assert_eq!(*packets.last().unwrap(), rest);
                }
            }
        }
    }

    #[test]
    fn packets_carry_buffer_bytes_in_order() {
        let storage: Vec<VolatileCell<u8>> =
            (0..20).map(|i| VolatileCell::new(i as u8 + 1)).collect();
        let xfer = TransferControl::new(8);
        xfer.start(&storage);

        let mut seen = Vec::new();
        while let Step::Packet(chunk) = xfer.next_packet() {
            seen.extend(chunk.iter().map(VolatileCell::get));
        }
        assert_eq!(seen, (1..=20).collect::<Vec<u8>>());
        assert!(xfer.progress().short_packet);
    }

    #[test]
    fn completion_is_reported_once() {
        let storage: Vec<VolatileCell<u8>> = (0..8).map(VolatileCell::new).collect();
        let xfer = TransferControl::new(8);
        xfer.start(&storage);

        assert!(matches!(xfer.next_packet(), Step::Packet(c) if c.len() == 8));
        assert!(!xfer.progress().short_packet);
        assert!(matches!(xfer.next_packet(), Step::Complete(8)));
        assert_eq!(xfer.progress().state, TransferState::Idle);
        assert!(matches!(xfer.next_packet(), Step::Idle));
    }

    #[test]
    fn zero_length_transfer_sends_one_zlp() {
        let xfer = TransferControl::new(8);
        xfer.start(&[]);

        assert!(matches!(xfer.next_packet(), Step::Packet(c) if c.is_empty()));
        let progress = xfer.progress();
        assert!(progress.zlp_sent);
        assert!(progress.short_packet);
        assert!(matches!(xfer.next_packet(), Step::Complete(0)));
    }

    #[test]
    fn restart_overwrites_previous_transfer() {
        let first: Vec<VolatileCell<u8>> = (0..20).map(VolatileCell::new).collect();
        let second: Vec<VolatileCell<u8>> = (0..3).map(VolatileCell::new).collect();
        let xfer = TransferControl::new(8);

        xfer.start(&first);
        assert!(matches!(xfer.next_packet(), Step::Packet(c) if c.len() == 8));

        xfer.start(&second);
        let (packets, done) = run(&xfer, 10);
        assert_eq!(packets, [3]);
        assert_eq!(done, Some(3));
    }

    #[test]
    fn abort_leaves_slot_idle() {
        let storage: Vec<VolatileCell<u8>> = (0..20).map(VolatileCell::new).collect();
        let xfer = TransferControl::new(8);
        xfer.start(&storage);
        xfer.abort();
        assert!(matches!(xfer.next_packet(), Step::Idle));
    }

    #[test]
    fn slot_without_packet_size_waits() {
        let storage: Vec<VolatileCell<u8>> = (0..4).map(VolatileCell::new).collect();
        let xfer = TransferControl::new(0);
        xfer.start(&storage);

        for _ in 0..3 {
            assert!(matches!(xfer.next_packet(), Step::Idle));
        }
        let progress = xfer.progress();
        assert_eq!(progress.state, TransferState::Armed);
        assert_eq!(progress.queued_len, 0);

        xfer.set_max_size(8);
        assert!(matches!(xfer.next_packet(), Step::Packet(c) if c.len() == 4));
        assert!(matches!(xfer.next_packet(), Step::Complete(4)));
    }
}
