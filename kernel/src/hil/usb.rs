// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Interface to USB device controller hardware.
//!
//! A device controller driver implements [`UsbController`], the fixed port
//! contract the USB protocol stack programs the hardware through. The stack
//! in turn implements [`Client`] to receive bus events, SETUP packets and
//! transfer completions, which the controller raises from its interrupt
//! handler.
//!
//! Buffers are lent to the controller as `&'a [VolatileCell<u8>]` so the same
//! slice can be read on the IN path and written on the OUT path, from
//! interrupt context, without handing over a mutable borrow. The controller keeps the slice until the matching
//! [`Client::transfer_complete`] call.

use crate::utilities::cells::VolatileCell;
use crate::ErrorCode;

/// Size of a SETUP packet on the control endpoint.
pub const SETUP_PACKET_SIZE: usize = 8;

/// Direction of a transfer, seen from the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferDirection {
    /// Host to device.
    Out = 0,
    /// Device to host.
    In = 1,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferType {
    Control = 0,
    Isochronous = 1,
    Bulk = 2,
    Interrupt = 3,
}

/// Result of a finished transfer, reported with
/// [`Client::transfer_complete`].
///
/// Controllers that only move data on the control endpoint, without STALL
/// handshakes, only ever report `Success`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferStatus {
    Success,
    /// The transfer was abandoned after a bus error.
    Failed,
    /// The endpoint answered with a STALL handshake.
    Stalled,
}

/// An endpoint address as it appears in `bEndpointAddress`: the endpoint
/// number in bits 0-3 and the direction in bit 7.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EndpointAddress(u8);

impl EndpointAddress {
    const DIRECTION_IN: u8 = 0x80;
    const NUMBER_MASK: u8 = 0x0f;
    const RESERVED_MASK: u8 = 0x70;

    pub const fn new(number: u8, direction: TransferDirection) -> Self {
        let dir = match direction {
            TransferDirection::Out => 0,
            TransferDirection::In => Self::DIRECTION_IN,
        };
        EndpointAddress((number & Self::NUMBER_MASK) | dir)
    }

    pub const fn number(self) -> usize {
        (self.0 & Self::NUMBER_MASK) as usize
    }

    pub const fn direction(self) -> TransferDirection {
        if self.0 & Self::DIRECTION_IN != 0 {
            TransferDirection::In
        } else {
            TransferDirection::Out
        }
    }
}

impl TryFrom<u8> for EndpointAddress {
    type Error = ErrorCode;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        if raw & Self::RESERVED_MASK != 0 {
            Err(ErrorCode::INVAL)
        } else {
            Ok(EndpointAddress(raw))
        }
    }
}

impl From<EndpointAddress> for u8 {
    fn from(address: EndpointAddress) -> u8 {
        address.0
    }
}

/// The parts of a standard endpoint descriptor a controller needs to open an
/// endpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub address: EndpointAddress,
    pub transfer_type: TransferType,
    pub max_packet_size: u16,
    pub interval: u8,
}

/// USB device controller interface
pub trait UsbController<'a> {
    fn set_client(&self, client: &'a dyn Client<'a>);

    /// Enable the peripheral, clear every interrupt source, arm bus-reset
    /// detection and signal presence to the host.
    fn initialize(&self);

    /// Restore the controller interrupts saved by the matching
    /// `disable_interrupts`. Without an open disabled section this does
    /// nothing.
    fn enable_interrupts(&self);

    /// Save and mask all controller interrupts.
    fn disable_interrupts(&self);

    /// Program the device address (0-127) and acknowledge the SET_ADDRESS
    /// request with a zero-length status packet.
    fn set_device_address(&self, addr: u8);

    fn set_configuration(&self, config: u8);

    fn remote_wakeup(&self);

    fn open_endpoint(&self, descriptor: &EndpointDescriptor) -> Result<(), ErrorCode>;

    /// Start a transfer of the whole of `buf` on `endpoint`. A zero length
    /// buffer sends or receives a zero-length packet. Completion is reported
    /// with [`Client::transfer_complete`].
    fn queue_transfer(
        &self,
        endpoint: EndpointAddress,
        buf: &'a [VolatileCell<u8>],
    ) -> Result<(), ErrorCode>;

    fn stall_endpoint(&self, endpoint: EndpointAddress);

    fn clear_stall(&self, endpoint: EndpointAddress);
}

/// USB controller client interface
pub trait Client<'a> {
    /// The host reset the bus; endpoint 0 is ready for a new SETUP packet.
    fn bus_reset(&self);

    /// A SETUP packet arrived on the control endpoint. The slice is only
    /// valid for the duration of the call.
    fn setup_received(&self, setup: &[u8; SETUP_PACKET_SIZE]);

    /// A transfer queued with [`UsbController::queue_transfer`] finished.
    fn transfer_complete(
        &self,
        endpoint: EndpointAddress,
        bytes_transferred: usize,
        status: TransferStatus,
    );
}
