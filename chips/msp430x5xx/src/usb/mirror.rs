// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Saved interrupt enables of the USB module.
//!
//! The module has no single interrupt-disable bit, so masking it means
//! zeroing every enable register and putting the old values back later. The
//! mirror holds those values while a masked section is open. Sections nest:
//! only the outermost `save` reads the hardware and only the matching
//! outermost `restore` writes it back.
//!
//! Callers must hold global interrupts off and the configuration registers
//! unlocked around both calls.

use core::cell::Cell;

use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};

use super::registers::{UsbConfigRegisters, UsbOperationRegisters, USBPWRCTL};

pub(crate) struct InterruptMirror {
    oepie: Cell<u8>,
    iepie: Cell<u8>,
    ie: Cell<u8>,
    // Only the VBUS and overload enables.
    pwrctl: Cell<u16>,
    depth: Cell<usize>,
}

impl InterruptMirror {
    pub(crate) const fn new() -> Self {
        InterruptMirror {
            oepie: Cell::new(0),
            iepie: Cell::new(0),
            ie: Cell::new(0),
            pwrctl: Cell::new(0),
            depth: Cell::new(0),
        }
    }

    /// Forget the saved values. An open section stays open.
    pub(crate) fn clear(&self) {
        self.oepie.set(0);
        self.iepie.set(0);
        self.ie.set(0);
        self.pwrctl.set(0);
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth.get()
    }

    pub(crate) fn save(&self, ops: &UsbOperationRegisters, config: &UsbConfigRegisters) {
        let depth = self.depth.get();
        self.depth.set(depth + 1);
        if depth > 0 {
            return;
        }

        self.oepie.set(ops.oepie.get());
        self.iepie.set(ops.iepie.get());
        self.ie.set(ops.ie.get());
        self.pwrctl.set(
            config.pwrctl.get()
                & (USBPWRCTL::VUOVLIE::SET + USBPWRCTL::VBONIE::SET + USBPWRCTL::VBOFFIE::SET)
                    .mask(),
        );

        ops.oepie.set(0);
        ops.iepie.set(0);
        ops.ie.set(0);
        config.pwrctl.modify(
            USBPWRCTL::VUOVLIE::CLEAR + USBPWRCTL::VBONIE::CLEAR + USBPWRCTL::VBOFFIE::CLEAR,
        );
    }

    pub(crate) fn restore(&self, ops: &UsbOperationRegisters, config: &UsbConfigRegisters) {
        match self.depth.get() {
            0 => {}
            1 => {
                ops.oepie.set(self.oepie.get());
                ops.iepie.set(self.iepie.get());
                ops.ie.set(self.ie.get());
                config.pwrctl.set(config.pwrctl.get() | self.pwrctl.get());
                self.depth.set(0);
            }
            depth => self.depth.set(depth - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InterruptMirror;
    use crate::usb::registers::fake::FakeRegisters;
    use kernel::utilities::registers::interfaces::{Readable, Writeable};

    fn load(regs: &FakeRegisters) {
        regs.operation.oepie.set(0x01);
        regs.operation.iepie.set(0x03);
        regs.operation.ie.set(0x44);
        // VBONIE and VBOFFIE plus SLDOEN, which is not an interrupt enable.
        regs.config.pwrctl.set(0x1600);
    }

    #[test]
    fn save_then_restore_round_trips() {
        let regs = FakeRegisters::new();
        let mirror = InterruptMirror::new();
        load(&regs);

        mirror.save(&regs.operation, &regs.config);
        assert_eq!(regs.operation.oepie.get(), 0);
        assert_eq!(regs.operation.iepie.get(), 0);
        assert_eq!(regs.operation.ie.get(), 0);
        assert_eq!(regs.config.pwrctl.get(), 0x1000);
        assert_eq!(mirror.depth(), 1);

        mirror.restore(&regs.operation, &regs.config);
        assert_eq!(regs.operation.oepie.get(), 0x01);
        assert_eq!(regs.operation.iepie.get(), 0x03);
        assert_eq!(regs.operation.ie.get(), 0x44);
        assert_eq!(regs.config.pwrctl.get(), 0x1600);
        assert_eq!(mirror.depth(), 0);
    }

    #[test]
    fn restore_without_save_is_a_noop() {
        let regs = FakeRegisters::new();
        let mirror = InterruptMirror::new();
        load(&regs);

        mirror.restore(&regs.operation, &regs.config);
        assert_eq!(regs.operation.oepie.get(), 0x01);
        assert_eq!(regs.operation.iepie.get(), 0x03);
        assert_eq!(regs.operation.ie.get(), 0x44);
        assert_eq!(regs.config.pwrctl.get(), 0x1600);
        assert_eq!(mirror.depth(), 0);
    }

    #[test]
    fn nested_sections_keep_outer_snapshot() {
        let regs = FakeRegisters::new();
        let mirror = InterruptMirror::new();
        load(&regs);

        mirror.save(&regs.operation, &regs.config);
        mirror.save(&regs.operation, &regs.config);
        assert_eq!(mirror.depth(), 2);

        mirror.restore(&regs.operation, &regs.config);
        assert_eq!(regs.operation.ie.get(), 0);
        assert_eq!(mirror.depth(), 1);

        mirror.restore(&regs.operation, &regs.config);
        assert_eq!(regs.operation.oepie.get(), 0x01);
        assert_eq!(regs.operation.iepie.get(), 0x03);
        assert_eq!(regs.operation.ie.get(), 0x44);
        assert_eq!(regs.config.pwrctl.get(), 0x1600);
    }

    #[test]
    fn clear_drops_saved_values() {
        let regs = FakeRegisters::new();
        let mirror = InterruptMirror::new();
        load(&regs);

        mirror.save(&regs.operation, &regs.config);
        mirror.clear();
        mirror.restore(&regs.operation, &regs.config);
        assert_eq!(regs.operation.ie.get(), 0);
        assert_eq!(regs.operation.iepie.get(), 0);
        assert_eq!(regs.config.pwrctl.get(), 0x1000);
    }
}
