// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

use kernel::hil::usb::DescriptorTable;
use kernel::platform::chip::InterruptService;

use crate::nvic;
use crate::usb_otg::{OtgFsRegisters, RegisterInterface, UsbOtg};

pub struct Stm32f411reDefaultPeripherals<'a, R: RegisterInterface = OtgFsRegisters> {
    pub usb_otg: UsbOtg<'a, R>,
}

impl<'a> Stm32f411reDefaultPeripherals<'a, OtgFsRegisters> {
    pub fn new(descriptors: &'a dyn DescriptorTable) -> Self {
        Self::with_registers(OtgFsRegisters::new(), descriptors)
    }
}

impl<'a, R: RegisterInterface> Stm32f411reDefaultPeripherals<'a, R> {
    pub fn with_registers(usb_registers: R, descriptors: &'a dyn DescriptorTable) -> Self {
        Self {
            usb_otg: UsbOtg::new(usb_registers, descriptors),
        }
    }
}

impl<'a, R: RegisterInterface> InterruptService for Stm32f411reDefaultPeripherals<'a, R> {
    unsafe fn service_interrupt(&self, interrupt: u32) -> bool {
        match interrupt {
            nvic::OTG_FS => self.usb_otg.handle_interrupt(),
            _ => return false,
        }
        true
    }
}
