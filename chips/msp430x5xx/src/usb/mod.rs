// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Full-speed USB device controller of the MSP430x5xx.
//!
//! The controller has dedicated 8-byte packet buffers for endpoint 0 and a
//! separate 8-byte block for SETUP packets, and no DMA. Transfers are moved
//! one packet per interrupt: queueing an IN transfer raises the endpoint 0
//! "packet sent" flag by hand, and every following IN interrupt either loads
//! the next packet or reports the transfer complete.
//!
//! Only endpoint 0 moves data. Transfers on other endpoints are recorded but
//! never started, and OUT data on endpoint 0 is not copied; queueing an OUT
//! transfer only clears NAK so the host can finish a status stage.

pub mod registers;

mod mirror;
mod transfer;

pub use self::transfer::{TransferProgress, TransferState};

use core::cell::Cell;

use kernel::debug;
use kernel::debug::HexBuf;
use kernel::hil;
use kernel::hil::usb::{
    EndpointAddress, EndpointDescriptor, TransferDirection, TransferStatus, SETUP_PACKET_SIZE,
};
use kernel::utilities::cells::{OptionalCell, VolatileCell};
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use self::mirror::InterruptMirror;
use self::registers::{
    UsbBufferRegisters, UsbConfigRegisters, UsbOperationRegisters, Vector, EP0CNT, EPCNF, EPINT,
    USBCNF, USBCTL, USBFUNADR, USBIE, USBIFG, USBKEY, USBPWRCTL,
};
use self::transfer::{Step, TransferControl};

/// Number of endpoint numbers the controller decodes.
pub const N_ENDPOINTS: usize = 8;

/// Packet size of endpoint 0, fixed by the hardware buffers.
pub const EP0_MAX_PACKET_SIZE: usize = 8;

macro_rules! usb_trace {
    [ $( $arg:expr ),+ ] => {
        if kernel::config::CONFIG.trace_usb {
            debug!($( $arg ),+);
        }
    };
}

/// Conditions the driver cannot recover from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UsbFault {
    /// `USBVECINT` held a value outside the vector table.
    InvalidVector(u16),
    /// A valid interrupt source this driver never enables.
    UnexpectedVector(Vector),
    /// An earlier fault stopped the driver.
    Halted,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Running,
    Halted,
}

const fn endpoint_pair<'a>(max_size: usize) -> [TransferControl<'a>; 2] {
    [TransferControl::new(max_size), TransferControl::new(max_size)]
}

pub struct Usb<'a> {
    config: StaticRef<UsbConfigRegisters>,
    registers: StaticRef<UsbOperationRegisters>,
    buffers: StaticRef<UsbBufferRegisters>,
    client: OptionalCell<&'a dyn hil::usb::Client<'a>>,
    mirror: InterruptMirror,
    // Indexed by endpoint number, then by `TransferDirection`.
    transfers: [[TransferControl<'a>; 2]; N_ENDPOINTS],
    setup_packet: Cell<[u8; SETUP_PACKET_SIZE]>,
    state: Cell<State>,
}

/// Keeps every USB interrupt source masked until dropped.
///
/// Returned by [`Usb::mask_interrupts`]. Guards nest with each other and
/// with explicit `disable_interrupts`/`enable_interrupts` pairs.
pub struct InterruptMask<'u, 'a> {
    usb: &'u Usb<'a>,
}

impl Drop for InterruptMask<'_, '_> {
    fn drop(&mut self) {
        self.usb.restore_interrupts();
    }
}

impl<'a> Usb<'a> {
    pub const fn new(
        config: StaticRef<UsbConfigRegisters>,
        registers: StaticRef<UsbOperationRegisters>,
        buffers: StaticRef<UsbBufferRegisters>,
    ) -> Self {
        Usb {
            config,
            registers,
            buffers,
            client: OptionalCell::empty(),
            mirror: InterruptMirror::new(),
            // Other endpoints have no packet size until they can be opened.
            transfers: [
                endpoint_pair(EP0_MAX_PACKET_SIZE),
                endpoint_pair(0),
                endpoint_pair(0),
                endpoint_pair(0),
                endpoint_pair(0),
                endpoint_pair(0),
                endpoint_pair(0),
                endpoint_pair(0),
            ],
            setup_packet: Cell::new([0; SETUP_PACKET_SIZE]),
            state: Cell::new(State::Running),
        }
    }

    /// Run `f` with the configuration registers unlocked and global
    /// interrupts off. The registers are locked again afterwards.
    fn with_unlocked<F: FnOnce() -> R, R>(&self, f: F) -> R {
        unsafe {
            msp430::support::atomic(|| {
                self.config.keypid.set(USBKEY);
                let res = f();
                self.config.keypid.set(0);
                res
            })
        }
    }

    fn transfer(&self, endpoint: EndpointAddress) -> Option<&TransferControl<'a>> {
        self.transfers
            .get(endpoint.number())
            .map(|pair| &pair[endpoint.direction() as usize])
    }

    /// Progress of the last transfer queued on `endpoint`, or `None` for an
    /// endpoint number the controller does not have.
    pub fn transfer_progress(&self, endpoint: EndpointAddress) -> Option<TransferProgress> {
        self.transfer(endpoint).map(TransferControl::progress)
    }

    /// The last SETUP packet received on endpoint 0.
    pub fn setup_packet(&self) -> [u8; SETUP_PACKET_SIZE] {
        self.setup_packet.get()
    }

    pub fn is_halted(&self) -> bool {
        self.state.get() == State::Halted
    }

    /// Enable the D+ pull-up so the host sees the device.
    pub fn connect(&self) {
        self.with_unlocked(|| self.config.cnf.modify(USBCNF::PUR_EN::SET));
        debug!("msp430x5xx usb: pull-up enabled");
    }

    /// Release the D+ pull-up so the host sees a disconnect.
    pub fn disconnect(&self) {
        self.with_unlocked(|| self.config.cnf.modify(USBCNF::PUR_EN::CLEAR));
        debug!("msp430x5xx usb: pull-up released");
    }

    /// Mask all USB interrupts for the lifetime of the returned guard.
    pub fn mask_interrupts(&self) -> InterruptMask<'_, 'a> {
        self.save_interrupts();
        InterruptMask { usb: self }
    }

    fn save_interrupts(&self) {
        self.with_unlocked(|| self.mirror.save(&self.registers, &self.config));
    }

    fn restore_interrupts(&self) {
        self.with_unlocked(|| self.mirror.restore(&self.registers, &self.config));
    }

    fn halt(&self, fault: UsbFault) -> UsbFault {
        debug!("msp430x5xx usb: {:?}, halting", fault);
        self.state.set(State::Halted);
        fault
    }

    fn bus_reset(&self) {
        for xfer in self.transfers[0].iter() {
            xfer.set_max_size(EP0_MAX_PACKET_SIZE);
            xfer.abort();
        }

        self.with_unlocked(|| {
            self.registers
                .oepcnf_0
                .modify(EPCNF::UBME::SET + EPCNF::USBIIE::SET);
            self.registers
                .iepcnf_0
                .modify(EPCNF::UBME::SET + EPCNF::USBIIE::SET);

            self.registers.oepie.modify(EPINT::EP0::SET);
            self.registers.iepie.modify(EPINT::EP0::SET);

            // NAK everything until the first SETUP packet.
            self.registers.oepcnt_0.modify(EP0CNT::NAK::SET);
            self.registers.iepcnt_0.modify(EP0CNT::NAK::SET);

            self.registers.ctl.modify(USBCTL::FEN::SET);

            self.registers.ie.modify(USBIE::SETUPIE::SET);
        });

        debug!("msp430x5xx usb: bus reset");
    }

    fn handle_setup_packet(&self) {
        let mut packet = [0; SETUP_PACKET_SIZE];
        for (byte, reg) in packet.iter_mut().zip(self.buffers.sublk.iter()) {
            *byte = reg.get();
        }
        self.setup_packet.set(packet);

        usb_trace!("msp430x5xx usb: SETUP {:?}", HexBuf(&packet));

        self.client.map(|client| client.setup_received(&packet));
    }

    fn transmit_packet(&self, endpoint: usize) {
        if endpoint != 0 {
            return;
        }

        let address = EndpointAddress::new(0, TransferDirection::In);
        match self.transfers[0][TransferDirection::In as usize].next_packet() {
            Step::Idle => {
                usb_trace!("msp430x5xx usb: IN0 interrupt with nothing queued");
            }
            Step::Complete(bytes) => {
                usb_trace!("msp430x5xx usb: IN0 complete, {} bytes", bytes);
                self.client.map(|client| {
                    client.transfer_complete(address, bytes, TransferStatus::Success)
                });
            }
            Step::Packet(chunk) => {
                for (reg, byte) in self.buffers.iep0_buf.iter().zip(chunk.iter()) {
                    reg.set(byte.get());
                }
                self.registers
                    .iepcnt_0
                    .modify(EP0CNT::CNT.val(chunk.len() as u8));
                self.registers.iepcnt_0.modify(EP0CNT::NAK::CLEAR);
                usb_trace!("msp430x5xx usb: IN0 packet, {} bytes", chunk.len());
            }
        }
    }

    fn receive_packet(&self, endpoint: usize) {
        usb_trace!("msp430x5xx usb: OUT{} interrupt ignored", endpoint);
    }

    /// Service the USB_UBM interrupt.
    ///
    /// A pending SETUP packet is captured before `USBVECINT` is read, since
    /// reading the vector acknowledges the SETUP interrupt. Any vector other
    /// than bus reset, SETUP, or endpoint 0 traffic is a fault: the driver
    /// stops and every later call returns [`UsbFault::Halted`] without
    /// touching the hardware.
    pub fn handle_interrupt(&self) -> Result<(), UsbFault> {
        if self.is_halted() {
            return Err(UsbFault::Halted);
        }

        if self.registers.ifg.is_set(USBIFG::SETUPIFG) {
            self.handle_setup_packet();
        }

        let raw = self.registers.vecint.get();
        let vector = Vector::try_from(raw).map_err(|raw| self.halt(UsbFault::InvalidVector(raw)))?;

        match vector {
            Vector::Reset => {
                self.bus_reset();
                self.client.map(|client| client.bus_reset());
            }
            // Consumed by reading the vector; the packet was captured above.
            Vector::SetupPacketReceived => {}
            Vector::InputEndpoint0 => self.transmit_packet(0),
            Vector::OutputEndpoint0 => self.receive_packet(0),
            other => return Err(self.halt(UsbFault::UnexpectedVector(other))),
        }

        Ok(())
    }

    /// Print the controller registers and endpoint 0 transfer state.
    pub fn debug_state(&self) {
        debug!(
            "msp430x5xx usb: state={:?} cnf={:#06x} pwrctl={:#06x} ctl={:#04x} ie={:#04x} ifg={:#04x}",
            self.state.get(),
            self.config.cnf.get(),
            self.config.pwrctl.get(),
            self.registers.ctl.get(),
            self.registers.ie.get(),
            self.registers.ifg.get(),
        );
        debug!(
            "msp430x5xx usb: iepie={:#04x} oepie={:#04x} iepcnt0={:#04x} oepcnt0={:#04x} mask depth={}",
            self.registers.iepie.get(),
            self.registers.oepie.get(),
            self.registers.iepcnt_0.get(),
            self.registers.oepcnt_0.get(),
            self.mirror.depth(),
        );
        debug!(
            "msp430x5xx usb: ep0 in {:?}",
            self.transfers[0][TransferDirection::In as usize].progress()
        );
        debug!(
            "msp430x5xx usb: ep0 out {:?}",
            self.transfers[0][TransferDirection::Out as usize].progress()
        );
    }
}

impl<'a> hil::usb::UsbController<'a> for Usb<'a> {
    fn set_client(&self, client: &'a dyn hil::usb::Client<'a>) {
        self.client.set(client);
    }

    fn initialize(&self) {
        self.with_unlocked(|| {
            // The configuration registers only accept writes once the
            // module is enabled.
            self.config.cnf.modify(USBCNF::USB_EN::SET);

            self.registers.oepie.set(0);
            self.registers.iepie.set(0);
            self.registers.ie.set(0);
            self.registers.oepifg.set(0);
            self.registers.iepifg.set(0);
            self.registers.ifg.set(0);
            self.config.pwrctl.modify(
                USBPWRCTL::VUOVLIE::CLEAR
                    + USBPWRCTL::VBONIE::CLEAR
                    + USBPWRCTL::VBOFFIE::CLEAR
                    + USBPWRCTL::VUOVLIFG::CLEAR
                    + USBPWRCTL::VBONIFG::CLEAR
                    + USBPWRCTL::VBOFFIFG::CLEAR,
            );
            self.mirror.clear();

            self.registers.vecint.set(0);

            // Nothing else is armed until the host resets the bus.
            self.registers.ie.modify(USBIE::RSTRIE::SET);

            self.config.cnf.modify(USBCNF::PUR_EN::SET);
        });

        debug!("msp430x5xx usb: initialized, waiting for bus reset");
    }

    fn enable_interrupts(&self) {
        self.restore_interrupts();
    }

    fn disable_interrupts(&self) {
        self.save_interrupts();
    }

    fn set_device_address(&self, addr: u8) {
        self.registers.funadr.write(USBFUNADR::FA.val(addr));
        debug!("msp430x5xx usb: address {}", addr & 0x7f);

        // Status stage of SET_ADDRESS.
        let status = EndpointAddress::new(0, TransferDirection::In);
        if let Err(e) = hil::usb::UsbController::queue_transfer(self, status, &[]) {
            debug!("msp430x5xx usb: status stage not queued: {:?}", e);
        }
    }

    fn set_configuration(&self, config: u8) {
        usb_trace!("msp430x5xx usb: configuration {}", config);
    }

    fn remote_wakeup(&self) {
        debug!("msp430x5xx usb: remote wakeup not supported");
    }

    fn open_endpoint(&self, descriptor: &EndpointDescriptor) -> Result<(), ErrorCode> {
        debug!(
            "msp430x5xx usb: cannot open endpoint {:#04x}",
            u8::from(descriptor.address)
        );
        Err(ErrorCode::NOSUPPORT)
    }

    fn queue_transfer(
        &self,
        endpoint: EndpointAddress,
        buf: &'a [VolatileCell<u8>],
    ) -> Result<(), ErrorCode> {
        let xfer = self.transfer(endpoint).ok_or(ErrorCode::INVAL)?;

        usb_trace!(
            "msp430x5xx usb: queue {:#04x}, {} bytes",
            u8::from(endpoint),
            buf.len()
        );

        unsafe {
            msp430::support::atomic(|| {
                xfer.start(buf);

                if endpoint.number() == 0 {
                    match endpoint.direction() {
                        TransferDirection::Out => {
                            self.registers.ctl.modify(USBCTL::DIR::Out);
                            self.registers.oepcnt_0.modify(EP0CNT::NAK::CLEAR);
                        }
                        TransferDirection::In => {
                            // The IN interrupt only fires once a packet has
                            // gone out, so raise it by hand to load the first.
                            self.registers.ctl.modify(USBCTL::DIR::In);
                            self.registers.iepifg.modify(EPINT::EP0::SET);
                        }
                    }
                }
            });
        }

        Ok(())
    }

    fn stall_endpoint(&self, endpoint: EndpointAddress) {
        debug!(
            "msp430x5xx usb: stall of {:#04x} not supported",
            u8::from(endpoint)
        );
    }

    fn clear_stall(&self, endpoint: EndpointAddress) {
        debug!(
            "msp430x5xx usb: clear stall of {:#04x} not supported",
            u8::from(endpoint)
        );
    }
}
