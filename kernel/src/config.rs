// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Data structure for storing compile-time configuration options.
//!
//! Configuration is a typed `const` object rather than a set of `#[cfg]`
//! attributes sprinkled through the code. Every code path stays type-checked,
//! even the ones that are disabled, and after type-checking the compiler folds
//! the constants so a disabled option costs nothing in the binary.
//!
//! Cargo features of the kernel crate only select the values below; no other
//! crate should use `#[cfg(feature = ...)]` for configuration.

/// Data structure holding compile-time configuration options.
///
/// To change the configuration, enable the matching kernel feature from the
/// board crate. The values are collected in the `CONFIG` constant defined at
/// the end of this file.
pub struct Config {
    /// Whether device controller drivers should trace every packet.
    ///
    /// If enabled, the USB driver prints a message in the debug output for
    /// each packet it programs, each completed transfer, each captured SETUP
    /// packet and each interrupt it deliberately ignores. This is very chatty
    /// and changes interrupt latency, so it is meant for bring-up only.
    pub trace_usb: bool,

    /// Whether fatal faults should print additional state before panicking.
    ///
    /// If enabled, the chip interrupt service dumps the driver state that led
    /// to an unrecoverable fault.
    pub debug_panics: bool,
}

/// A unique instance of `Config` where compile-time configuration options are
/// defined. This is the only location where `#[cfg(x)]` is used to configure
/// code based on Cargo features.
pub const CONFIG: Config = Config {
    trace_usb: cfg!(feature = "trace_usb"),
    debug_panics: !cfg!(feature = "no_debug_panics"),
};
