// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Interfaces for implementing microcontrollers in Tock.

/// Interface for handling interrupts on a hardware chip.
///
/// Each chip (or chip version) implements this trait to handle its
/// peripheral interrupts. When an interrupt (identified by number) has
/// triggered, the implementation is called with the interrupt number and
/// either handles it or returns `false` to signify that it does not know how
/// to handle the interrupt.
///
/// Interrupt numbers are passed "top-down": the most specific chip variant
/// gets the first chance and forwards what it does not own to the shared base
/// object of its family.
pub trait InterruptService {
    /// Service an interrupt, if supported by this chip. If this interrupt
    /// number is not supported, return false.
    unsafe fn service_interrupt(&self, interrupt: u32) -> bool;
}
