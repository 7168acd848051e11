// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Interrupt vector numbers, counted from the bottom of the vector table.

pub const RTC: u32 = 41;
pub const PORT2: u32 = 42;
pub const TIMER2_A1: u32 = 43;
pub const TIMER2_A0: u32 = 44;
pub const USCI_B1: u32 = 45;
pub const USCI_A1: u32 = 46;
pub const PORT1: u32 = 47;
pub const TIMER1_A1: u32 = 48;
pub const TIMER1_A0: u32 = 49;
pub const DMA: u32 = 50;
/// USB module, all sources share this line and are told apart by `USBVECINT`.
pub const USB_UBM: u32 = 51;
pub const TIMER0_A1: u32 = 52;
pub const TIMER0_A0: u32 = 53;
pub const ADC12: u32 = 54;
pub const USCI_B0: u32 = 55;
pub const USCI_A0: u32 = 56;
pub const WDT: u32 = 57;
pub const TIMER0_B1: u32 = 58;
pub const TIMER0_B0: u32 = 59;
pub const COMP_B: u32 = 60;
pub const UNMI: u32 = 61;
pub const SYSNMI: u32 = 62;
