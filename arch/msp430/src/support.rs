// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Core low-level operations.

use core::ops::FnOnce;

/// General interrupt enable bit of the status register (SR/R2).
pub const SR_GIE: u16 = 1 << 3;

/// Run `f` with maskable interrupts disabled.
///
/// The previous state of GIE is restored afterwards, so nested calls and
/// calls from interrupt context (where GIE is already clear) leave the
/// interrupt state as they found it.
#[cfg(target_arch = "msp430")]
pub unsafe fn atomic<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    use core::arch::asm;

    let sr: u16;
    // DINT takes effect one instruction late, hence the trailing NOP.
    asm!(
        "mov r2, {sr}",
        "dint",
        "nop",
        sr = out(reg) sr,
        options(nomem, nostack),
    );

    let res = f();

    if sr & SR_GIE != 0 {
        // The 5xx CPUs need a NOP on either side of EINT.
        asm!("nop", "eint", "nop", options(nomem, nostack));
    }

    res
}

// Mock implementation for tests on the host.
#[cfg(not(target_arch = "msp430"))]
/// Host builds run on a single thread with nothing to preempt it, so the
/// critical section is the call itself.
pub unsafe fn atomic<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}
