// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Peripheral implementations for the STM32F411RE MCU.

#![no_std]

pub mod interrupt_service;
pub mod nvic;
pub mod usb_otg;

// This is used to run the tests on a host
#[cfg(test)]
#[macro_use]
extern crate std;
