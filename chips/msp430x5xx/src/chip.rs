// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Peripherals of the MSP430x5xx and their interrupt dispatch.

use kernel::debug;
use kernel::platform::chip::InterruptService;

use crate::interrupts;
use crate::usb;

pub struct Msp430x5xxDefaultPeripherals<'a> {
    pub usb: usb::Usb<'a>,
}

impl<'a> Msp430x5xxDefaultPeripherals<'a> {
    pub const fn new() -> Self {
        Self {
            usb: usb::Usb::new(
                usb::registers::USB_CONFIG_BASE,
                usb::registers::USB_OPERATION_BASE,
                usb::registers::USB_BUFFER_BASE,
            ),
        }
    }
}

impl<'a> InterruptService for Msp430x5xxDefaultPeripherals<'a> {
    unsafe fn service_interrupt(&self, interrupt: u32) -> bool {
        match interrupt {
            interrupts::USB_UBM => {
                if let Err(fault) = self.usb.handle_interrupt() {
                    if kernel::config::CONFIG.debug_panics {
                        self.usb.debug_state();
                    }
                    debug!("msp430x5xx: unrecoverable USB fault");
                    panic!("USB fault: {:?}", fault);
                }
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::Msp430x5xxDefaultPeripherals;
    use crate::interrupts;
    use crate::usb::registers::fake::FakeRegisters;
    use crate::usb::registers::{Vector, EPINT, USBIE};
    use crate::usb::Usb;
    use kernel::platform::chip::InterruptService;
    use kernel::utilities::registers::interfaces::{Readable, Writeable};

    fn peripherals(regs: &FakeRegisters) -> Msp430x5xxDefaultPeripherals<'_> {
        Msp430x5xxDefaultPeripherals {
            usb: Usb::new(regs.config, regs.operation, regs.buffers),
        }
    }

    #[test]
    fn foreign_interrupts_are_not_claimed() {
        let regs = FakeRegisters::new();
        let peripherals = peripherals(&regs);
        assert!(!unsafe { peripherals.service_interrupt(interrupts::WDT) });
        assert!(!unsafe { peripherals.service_interrupt(interrupts::USCI_A0) });
    }

    #[test]
    fn usb_interrupt_is_serviced() {
        let regs = FakeRegisters::new();
        let peripherals = peripherals(&regs);
        regs.operation.vecint.set(Vector::Reset.into());
        assert!(unsafe { peripherals.service_interrupt(interrupts::USB_UBM) });
        assert!(!peripherals.usb.is_halted());

        // Register fields are usable from outside the driver module.
        assert!(regs.operation.ie.is_set(USBIE::SETUPIE));
        assert!(regs.operation.iepie.is_set(EPINT::EP0));
        assert!(regs.operation.oepie.is_set(EPINT::EP0));
    }

    #[test]
    #[should_panic(expected = "USB fault")]
    fn usb_fault_panics() {
        let regs = FakeRegisters::new();
        let peripherals = peripherals(&regs);
        regs.operation.vecint.set(0x0e);
        unsafe {
            peripherals.service_interrupt(interrupts::USB_UBM);
        }
    }
}
