// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Standard requests on endpoint 0.

use kernel::debug;
use kernel::hil::usb::{DescriptorType, Request};

use super::registers::{RegisterInterface, Reg, DCFG, DIEPCTL, DOEPCTL};
use super::state::Trigger;
use super::{UsbOtg, MAX_CTRL_PACKET_SIZE};

/// What to do with a request the driver does not implement, or a descriptor
/// it cannot find.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnsupportedPolicy {
    /// Send nothing. The host times the transfer out.
    Ignore,
    /// STALL endpoint 0 in both directions. The core clears the STALL when
    /// the next SETUP arrives.
    Stall,
}

impl<'a, R: RegisterInterface> UsbOtg<'a, R> {
    /// Act on the SETUP packet last received on endpoint 0.
    pub(super) fn handle_setup(&self) {
        let setup = self.setup.get();
        if self.trace() {
            debug!(
                "usb_otg: setup {:02x} {:02x} value {:#06x} index {:#06x} length {}",
                setup.request_type(),
                setup.request(),
                setup.value(),
                setup.index(),
                setup.length()
            );
        }

        match setup.standard_request() {
            Some(Request::SetAddress) => self.set_address(setup.value_low()),
            Some(Request::GetDescriptor) => {
                self.get_descriptor(setup.value_high(), setup.value_low(), setup.length())
            }
            _ => self.unsupported("request"),
        }
    }

    fn set_address(&self, value: u8) {
        let state = self.state.get();
        if !state.accepts_requests() {
            internal_err!("usb_otg: SET_ADDRESS in {:?}", state);
        }
        let address = value & 0x7F;

        // The core applies the new address once the status stage completes
        self.registers.modify(Reg::Dcfg, DCFG::DAD.val(address as u32));
        self.address.set(address);
        if let Some(next) = state.next(Trigger::AddressAssigned(address)) {
            self.state.set(next);
        }

        if let Err(e) = self.write_tx(&[]) {
            debug!("usb_otg: SET_ADDRESS status stage failed: {:?}", e);
        }
    }

    fn get_descriptor(&self, tag: u8, index: u8, requested: u16) {
        let descriptor = match DescriptorType::from_tag(tag) {
            Some(kind @ (DescriptorType::Device | DescriptorType::Configuration)) => {
                self.descriptors.descriptor(kind, index)
            }
            _ => None,
        };

        let descriptor = match descriptor {
            Some(d) => d,
            None => return self.unsupported("descriptor"),
        };

        // Only as much as the host asked for, in one packet
        let len = descriptor
            .len()
            .min(usize::from(requested))
            .min(MAX_CTRL_PACKET_SIZE);
        if len == 0 {
            return self.unsupported("descriptor");
        }

        let mut buffer = self.ctrl_buffer.get();
        buffer[..len].copy_from_slice(&descriptor[..len]);
        self.ctrl_buffer.set(buffer);
        self.ctrl_len.set(len);

        if let Err(e) = self.write_tx(&buffer[..len]) {
            debug!("usb_otg: GET_DESCRIPTOR {:#04x} not sent: {:?}", tag, e);
        }
    }

    fn unsupported(&self, what: &str) {
        let setup = self.setup.get();
        match self.unsupported_policy.get() {
            UnsupportedPolicy::Ignore => {
                debug!(
                    "usb_otg: unsupported {} {:02x}/{:02x} {:#06x} ignored",
                    what,
                    setup.request_type(),
                    setup.request(),
                    setup.value()
                );
            }
            UnsupportedPolicy::Stall => {
                debug!(
                    "usb_otg: unsupported {} {:02x}/{:02x} {:#06x}, stalling ep0",
                    what,
                    setup.request_type(),
                    setup.request(),
                    setup.value()
                );
                self.registers.modify(Reg::Diepctl(0), DIEPCTL::STALL::SET);
                self.registers.modify(Reg::Doepctl(0), DOEPCTL::STALL::SET);
            }
        }
    }
}
