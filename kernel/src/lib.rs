// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Core kernel crate for the MSP430x5xx USB device stack.
//!
//! The kernel crate holds the code shared by the architecture and chip crates:
//! the Hardware Interface Layer (HIL) definitions that form the controller
//! port contract, the standard [`ErrorCode`], the `debug!` output machinery,
//! compile-time configuration, and small utilities such as
//! [`StaticRef`](utilities::StaticRef).
//!
//! Most `unsafe` code is in this kernel crate.

#![warn(unreachable_pub)]
#![no_std]

// This is used to run the tests on a host
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
#[macro_use]
pub mod debug;
pub mod hil;
pub mod platform;
pub mod utilities;

mod errorcode;

pub use crate::errorcode::ErrorCode;
