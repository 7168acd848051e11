// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Shared support for TI MSP430 CPUs.

#![cfg_attr(target_arch = "msp430", feature(asm_experimental_arch))]
#![crate_name = "msp430"]
#![crate_type = "rlib"]
#![no_std]

pub mod support;
