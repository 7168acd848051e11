// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Support for in-kernel debugging.
//!
//! For printing, this module uses an output channel registered by the board
//! with [`set_debug_writer`]. Until a writer is registered every message is
//! silently dropped, which is also what happens in host unit tests.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! use kernel::debug;
//!
//! debug!("Yes the code gets here with value {}", i);
//! debug_verbose!("got here"); // Includes message count, file, and line.
//! ```

use core::fmt::{write, Arguments, Result, Write};
use core::ptr::addr_of_mut;
use core::sync::atomic::{AtomicBool, Ordering};

/// Byte sink for debug output, usually a polled UART.
pub trait IoWrite {
    /// Write as much of `buf` as possible and return the number of bytes
    /// consumed. Returning 0 means the sink is full and the rest of the
    /// message is dropped.
    fn write(&mut self, buf: &[u8]) -> usize;
}

struct DebugWriter {
    output: Option<&'static mut dyn IoWrite>,
    count: usize,
}

static mut DEBUG_WRITER: DebugWriter = DebugWriter {
    output: None,
    count: 0,
};

// Set while a message is being written.
static WRITER_BUSY: AtomicBool = AtomicBool::new(false);

/// Register the channel `debug!` prints to.
///
/// # Safety
///
/// Must be called from the main kernel thread before interrupts that may
/// print are enabled.
pub unsafe fn set_debug_writer(output: &'static mut dyn IoWrite) {
    let writer = &mut *addr_of_mut!(DEBUG_WRITER);
    writer.output = Some(output);
    writer.count = 0;
}

impl Write for DebugWriter {
    fn write_str(&mut self, s: &str) -> Result {
        if let Some(output) = self.output.as_deref_mut() {
            let mut bytes = s.as_bytes();
            while !bytes.is_empty() {
                let written = output.write(bytes);
                if written == 0 {
                    break;
                }
                bytes = &bytes[written.min(bytes.len())..];
            }
        }
        Ok(())
    }
}

/// Run `f` with exclusive access to the writer.
///
/// A message started while another one is being written, from an interrupt
/// handler or from inside the output channel, is dropped. The kernel runs on
/// a single core and an interrupt handler runs to completion, so the flag
/// needs only atomic loads and stores, which is all the MSP430 provides.
fn with_writer<F: FnOnce(&mut DebugWriter)>(f: F) {
    if WRITER_BUSY.load(Ordering::Acquire) {
        return;
    }
    WRITER_BUSY.store(true, Ordering::Release);
    let writer = unsafe { &mut *addr_of_mut!(DEBUG_WRITER) };
    f(writer);
    WRITER_BUSY.store(false, Ordering::Release);
}

pub fn debug_println(args: Arguments) {
    with_writer(|writer| {
        writer.count += 1;
        let _ = write(writer, args);
        let _ = writer.write_str("\r\n");
    });
}

pub fn debug_verbose_println(args: Arguments, file_line: &(&'static str, u32)) {
    with_writer(|writer| {
        writer.count += 1;
        let count = writer.count;
        let (file, line) = *file_line;
        let _ = writer.write_fmt(format_args!("TOCK_DEBUG({}): {}:{}: ", count, file, line));
        let _ = write(writer, args);
        let _ = writer.write_str("\r\n");
    });
}

/// In-kernel `println()` debugging.
#[macro_export]
macro_rules! debug {
    () => ({
        // Allow an empty debug!() to print the location when hit
        debug!("")
    });
    ($msg:expr $(,)?) => ({
        $crate::debug::debug_println(format_args!($msg));
    });
    ($fmt:expr, $($arg:tt)+) => ({
        $crate::debug::debug_println(format_args!($fmt, $($arg)+));
    });
}

/// In-kernel `println()` debugging that includes the message count, file
/// and line.
#[macro_export]
macro_rules! debug_verbose {
    () => ({
        debug_verbose!("")
    });
    ($msg:expr $(,)?) => ({
        $crate::debug::debug_verbose_println(format_args!($msg), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
    ($fmt:expr, $($arg:tt)+) => ({
        $crate::debug::debug_verbose_println(format_args!($fmt, $($arg)+), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
}

/// Formats a byte slice as space separated hex, e.g. `[80 06 00 01]`.
pub struct HexBuf<'a>(pub &'a [u8]);

impl core::fmt::Debug for HexBuf<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> Result {
        write!(f, "[")?;
        for (i, b) in self.0.iter().enumerate() {
            write!(f, "{}{:02x}", if i > 0 { " " } else { "" }, b)?;
        }
        write!(f, "]")
    }
}
