// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Register map of the MSP430x5xx full-speed USB module.
//!
//! The module is spread over three windows: the configuration registers
//! (write-protected by `USBKEYPID`), the operation registers, and the USB
//! buffer RAM that holds the endpoint 0 packet buffers and the SETUP block.

use kernel::utilities::registers::{register_bitfields, register_structs, ReadWrite};
use kernel::utilities::StaticRef;

/// Value written to `USBKEYPID` to unlock the configuration registers.
pub const USBKEY: u16 = 0x9628;

register_structs! {
    pub UsbConfigRegisters {
        (0x00 => pub(crate) keypid: ReadWrite<u16>),
        (0x02 => pub(crate) cnf: ReadWrite<u16, USBCNF::Register>),
        (0x04 => _reserved0),
        (0x08 => pub(crate) pwrctl: ReadWrite<u16, USBPWRCTL::Register>),
        (0x0a => _reserved1),
        (0x16 => @END),
    }
}

register_structs! {
    pub UsbOperationRegisters {
        (0x00 => pub(crate) iepcnf_0: ReadWrite<u8, EPCNF::Register>),
        (0x01 => pub(crate) iepcnt_0: ReadWrite<u8, EP0CNT::Register>),
        (0x02 => pub(crate) oepcnf_0: ReadWrite<u8, EPCNF::Register>),
        (0x03 => pub(crate) oepcnt_0: ReadWrite<u8, EP0CNT::Register>),
        (0x04 => _reserved0),
        (0x0e => pub(crate) iepie: ReadWrite<u8, EPINT::Register>),
        (0x0f => pub(crate) oepie: ReadWrite<u8, EPINT::Register>),
        (0x10 => pub(crate) iepifg: ReadWrite<u8, EPINT::Register>),
        (0x11 => pub(crate) oepifg: ReadWrite<u8, EPINT::Register>),
        // Reading returns the highest priority pending source and clears it.
        (0x12 => pub(crate) vecint: ReadWrite<u16>),
        (0x14 => _reserved1),
        (0x1c => pub(crate) ctl: ReadWrite<u8, USBCTL::Register>),
        (0x1d => pub(crate) ie: ReadWrite<u8, USBIE::Register>),
        (0x1e => pub(crate) ifg: ReadWrite<u8, USBIFG::Register>),
        (0x1f => pub(crate) funadr: ReadWrite<u8, USBFUNADR::Register>),
        (0x20 => @END),
    }
}

register_structs! {
    pub UsbBufferRegisters {
        // Endpoint 0 OUT packet buffer, unused: OUT data is not copied.
        (0x00 => _oep0_buf),
        (0x08 => pub(crate) iep0_buf: [ReadWrite<u8>; 8]),
        // The eight bytes of the last SETUP packet.
        (0x10 => pub(crate) sublk: [ReadWrite<u8>; 8]),
        (0x18 => @END),
    }
}

pub const USB_CONFIG_BASE: StaticRef<UsbConfigRegisters> =
    unsafe { StaticRef::new(0x0900 as *const UsbConfigRegisters) };

pub const USB_OPERATION_BASE: StaticRef<UsbOperationRegisters> =
    unsafe { StaticRef::new(0x0920 as *const UsbOperationRegisters) };

pub const USB_BUFFER_BASE: StaticRef<UsbBufferRegisters> =
    unsafe { StaticRef::new(0x2370 as *const UsbBufferRegisters) };

register_bitfields![u16,
    pub USBCNF [
        USB_EN OFFSET(0) NUMBITS(1) [],
        PUR_EN OFFSET(1) NUMBITS(1) [],
        PUR_IN OFFSET(2) NUMBITS(1) [],
        BLKRDY OFFSET(3) NUMBITS(1) [],
        FNTEN OFFSET(4) NUMBITS(1) []
    ],
    pub USBPWRCTL [
        VUOVLIFG OFFSET(0) NUMBITS(1) [],
        VBONIFG OFFSET(1) NUMBITS(1) [],
        VBOFFIFG OFFSET(2) NUMBITS(1) [],
        USBBGVBV OFFSET(3) NUMBITS(1) [],
        USBDETEN OFFSET(4) NUMBITS(1) [],
        OVLAOFF OFFSET(5) NUMBITS(1) [],
        SLDOAON OFFSET(6) NUMBITS(1) [],
        VUOVLIE OFFSET(8) NUMBITS(1) [],
        VBONIE OFFSET(9) NUMBITS(1) [],
        VBOFFIE OFFSET(10) NUMBITS(1) [],
        VUSBEN OFFSET(11) NUMBITS(1) [],
        SLDOEN OFFSET(12) NUMBITS(1) []
    ]
];

register_bitfields![u8,
    pub EPCNF [
        USBIIE OFFSET(2) NUMBITS(1) [],
        STALL OFFSET(3) NUMBITS(1) [],
        DBUF OFFSET(4) NUMBITS(1) [],
        TOGGLE OFFSET(5) NUMBITS(1) [],
        UBME OFFSET(7) NUMBITS(1) []
    ],
    pub EP0CNT [
        CNT OFFSET(0) NUMBITS(4) [],
        NAK OFFSET(7) NUMBITS(1) []
    ],
    pub EPINT [
        EP0 OFFSET(0) NUMBITS(1) [],
        EP1 OFFSET(1) NUMBITS(1) [],
        EP2 OFFSET(2) NUMBITS(1) [],
        EP3 OFFSET(3) NUMBITS(1) [],
        EP4 OFFSET(4) NUMBITS(1) [],
        EP5 OFFSET(5) NUMBITS(1) [],
        EP6 OFFSET(6) NUMBITS(1) [],
        EP7 OFFSET(7) NUMBITS(1) []
    ],
    pub USBCTL [
        DIR OFFSET(0) NUMBITS(1) [
            Out = 0,
            In = 1
        ],
        FRSTE OFFSET(4) NUMBITS(1) [],
        RWUP OFFSET(5) NUMBITS(1) [],
        FEN OFFSET(6) NUMBITS(1) []
    ],
    pub USBIE [
        RSTRIE OFFSET(2) NUMBITS(1) [],
        SUSRIE OFFSET(3) NUMBITS(1) [],
        RESRIE OFFSET(4) NUMBITS(1) [],
        SETUPIE OFFSET(6) NUMBITS(1) [],
        STPOWIE OFFSET(7) NUMBITS(1) []
    ],
    pub USBIFG [
        RSTRIFG OFFSET(2) NUMBITS(1) [],
        SUSRIFG OFFSET(3) NUMBITS(1) [],
        RESRIFG OFFSET(4) NUMBITS(1) [],
        SETUPIFG OFFSET(6) NUMBITS(1) [],
        STPOWIFG OFFSET(7) NUMBITS(1) []
    ],
    pub USBFUNADR [
        FA OFFSET(0) NUMBITS(7) []
    ]
];

/// Interrupt sources as reported by `USBVECINT`, highest priority first.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Vector {
    None,
    PowerDrop,
    PllLock,
    PllSignal,
    PllRange,
    VbusOn,
    VbusOff,
    Timestamp,
    InputEndpoint0,
    OutputEndpoint0,
    Reset,
    Suspend,
    Resume,
    SetupPacketReceived,
    SetupOverwrite,
    /// Input endpoints 1 to 7.
    InputEndpoint(u8),
    /// Output endpoints 1 to 7.
    OutputEndpoint(u8),
}

impl TryFrom<u16> for Vector {
    type Error = u16;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        match raw {
            0x00 => Ok(Vector::None),
            0x02 => Ok(Vector::PowerDrop),
            0x04 => Ok(Vector::PllLock),
            0x06 => Ok(Vector::PllSignal),
            0x08 => Ok(Vector::PllRange),
            0x0a => Ok(Vector::VbusOn),
            0x0c => Ok(Vector::VbusOff),
            0x10 => Ok(Vector::Timestamp),
            0x12 => Ok(Vector::InputEndpoint0),
            0x14 => Ok(Vector::OutputEndpoint0),
            0x16 => Ok(Vector::Reset),
            0x18 => Ok(Vector::Suspend),
            0x1a => Ok(Vector::Resume),
            0x20 => Ok(Vector::SetupPacketReceived),
            0x22 => Ok(Vector::SetupOverwrite),
            0x24..=0x30 if raw % 2 == 0 => Ok(Vector::InputEndpoint(((raw - 0x24) / 2 + 1) as u8)),
            0x32..=0x3e if raw % 2 == 0 => Ok(Vector::OutputEndpoint(((raw - 0x32) / 2 + 1) as u8)),
            _ => Err(raw),
        }
    }
}

impl From<Vector> for u16 {
    fn from(vector: Vector) -> u16 {
        match vector {
            Vector::None => 0x00,
            Vector::PowerDrop => 0x02,
            Vector::PllLock => 0x04,
            Vector::PllSignal => 0x06,
            Vector::PllRange => 0x08,
            Vector::VbusOn => 0x0a,
            Vector::VbusOff => 0x0c,
            Vector::Timestamp => 0x10,
            Vector::InputEndpoint0 => 0x12,
            Vector::OutputEndpoint0 => 0x14,
            Vector::Reset => 0x16,
            Vector::Suspend => 0x18,
            Vector::Resume => 0x1a,
            Vector::SetupPacketReceived => 0x20,
            Vector::SetupOverwrite => 0x22,
            Vector::InputEndpoint(n) => 0x24 + 2 * (n as u16 - 1),
            Vector::OutputEndpoint(n) => 0x32 + 2 * (n as u16 - 1),
        }
    }
}
