// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Support for in-kernel debugging.
//!
//! For printing, this module provides the `debug!` macro. It formats its
//! arguments like `format!` and hands the bytes to the writer the board
//! registered with [`set_debug_writer`], followed by `"\r\n"`.
//!
//! ```ignore
//! debug!("Yes the code gets here with value {}", i);
//! ```
//!
//! A board typically registers a UART or semihosting writer early in its
//! `main`. Until one is registered, debug output is silently dropped, which
//! is also what happens when chip code runs in host tests.

use core::fmt::{self, write, Arguments, Write};

use crate::utilities::cells::TakeCell;

/// Byte sink behind `debug!`.
pub trait IoWrite {
    /// Write `buf` out, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> usize;
}

struct DebugWriterSlot(TakeCell<'static, dyn IoWrite>);

// Tock is single threaded. The slot is only touched from the kernel loop or
// from an interrupt bottom half, never concurrently.
unsafe impl Sync for DebugWriterSlot {}

static DEBUG_WRITER: DebugWriterSlot = DebugWriterSlot(TakeCell::empty());

/// Register the writer `debug!` prints to, replacing any previous one.
///
/// # Safety
///
/// Must be called before interrupts that may print are enabled, since the
/// slot is not protected against concurrent access.
pub unsafe fn set_debug_writer(writer: &'static mut dyn IoWrite) {
    DEBUG_WRITER.0.put(Some(writer));
}

struct DebugWriter<'a>(&'a mut dyn IoWrite);

impl Write for DebugWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        if self.0.write(bytes) < bytes.len() {
            return Err(fmt::Error);
        }
        Ok(())
    }
}

/// Implementation of `debug!`. Use the macro instead.
pub fn debug_fmt(args: Arguments) {
    // A nested `debug!` (e.g. from an interrupt that fires while printing)
    // finds the cell empty and is dropped.
    DEBUG_WRITER.0.map(|writer| {
        let mut writer = DebugWriter(writer);
        let _ = write(&mut writer, args);
        let _ = writer.write_str("\r\n");
    });
}

/// In-kernel `println()` debugging.
#[macro_export]
macro_rules! debug {
    () => ({
        $crate::debug!("")
    });
    ($msg:expr $(,)?) => ({
        $crate::debug::debug_fmt(format_args!("{}", $msg))
    });
    ($fmt:expr, $($arg:tt)+) => ({
        $crate::debug::debug_fmt(format_args!($fmt, $($arg)+))
    });
}

#[cfg(test)]
mod tests {
    use super::{set_debug_writer, IoWrite};
    use std::boxed::Box;
    use std::string::String;
    use std::sync::Mutex;
    use std::vec::Vec;

    static CAPTURED: Mutex<Vec<u8>> = Mutex::new(Vec::new());

    struct Capture;

    impl IoWrite for Capture {
        fn write(&mut self, buf: &[u8]) -> usize {
            CAPTURED.lock().unwrap().extend_from_slice(buf);
            buf.len()
        }
    }

    #[test]
    fn debug_reaches_registered_writer() {
        unsafe { set_debug_writer(Box::leak(Box::new(Capture))) };
        debug!("ep{} stalled", 0);
        debug!("USBRST");

        let out = String::from_utf8(CAPTURED.lock().unwrap().clone()).unwrap();
        assert_eq!(out, "ep0 stalled\r\nUSBRST\r\n");
    }
}
