// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Core kernel support shared by chips and capsules.
//!
//! The kernel crate holds the pieces every chip driver and capsule in this
//! workspace leans on: the Hardware Interface Layer (HIL) definitions, the
//! standard error type, the `debug!` output path, compile-time configuration
//! and the register utilities.
//!
//! Most `unsafe` code is in this kernel crate.

#![no_std]

pub mod config;
pub mod debug;
pub mod errorcode;
pub mod hil;
pub mod platform;
pub mod utilities;

pub use crate::errorcode::ErrorCode;

// This is used to run the tests on a host
#[cfg(test)]
#[macro_use]
extern crate std;
