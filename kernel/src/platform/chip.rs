// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Interfaces for implementing microcontrollers in Tock.

/// Interface for handling interrupts on a hardware chip.
///
/// Each chip crate implements this trait for the collection of peripherals it
/// exposes. The board's interrupt loop calls `service_interrupt` with the
/// NVIC number of each pending interrupt, and the implementation routes it to
/// the driver that owns that source.
pub trait InterruptService {
    /// Service an interrupt, if supported by this chip. If this interrupt
    /// number is not supported, return false.
    ///
    /// # Safety
    ///
    /// Must only be called from the kernel's interrupt servicing context, so
    /// that no two calls for the same source overlap.
    unsafe fn service_interrupt(&self, interrupt: u32) -> bool;
}
