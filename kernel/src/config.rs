// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Data structure for storing compile-time configuration options.
//!
//! Configuration is a typed `const` object rather than `#[cfg]` blocks
//! scattered through the code. Every code path stays type-checked by the
//! compiler, even the disabled ones, and the constant folds away so a
//! disabled option costs nothing in the final binary.
//!
//! Cargo features of the kernel crate only select the values below. This is
//! the only place where `cfg!(feature = ...)` is consulted.

/// Data structure holding compile-time configuration options.
///
/// To change the configuration, modify the relevant values in the `CONFIG`
/// constant object defined at the end of this file, or enable the matching
/// kernel feature from the board crate.
pub struct Config {
    /// Whether chip USB drivers should trace bus events to the debug output.
    ///
    /// If enabled, every interrupt source a USB driver services (resets,
    /// enumeration, setup packets, endpoint completions) is printed with
    /// `debug!`. Failures are reported regardless of this option.
    pub trace_usb: bool,

    /// Whether the kernel should output additional debug information on panics.
    pub debug_panics: bool,
}

/// A unique instance of `Config` where compile-time configuration options are
/// defined.
pub const CONFIG: Config = Config {
    trace_usb: cfg!(feature = "trace_usb"),
    debug_panics: !cfg!(feature = "no_debug_panics"),
};
