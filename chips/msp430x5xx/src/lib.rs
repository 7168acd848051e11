// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Peripheral implementations for the MSP430x5xx family.

#![crate_name = "msp430x5xx"]
#![crate_type = "rlib"]
#![no_std]

#[cfg(test)]
extern crate std;

pub mod chip;
pub mod interrupts;
pub mod usb;
