// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Per-endpoint IN and OUT interrupts.
//!
//! DAINT tells which endpoints have something pending. One endpoint per
//! direction is serviced per interrupt, the lowest numbered; the core keeps
//! OEPINT/IEPINT asserted while others remain.

use kernel::debug;
use kernel::utilities::registers::{Field, LocalRegisterCopy, RegisterLongName};

use super::registers::{
    field_bits, RegisterInterface, Reg, DAINT, DIEPINT, DOEPINT, DOEPTSIZ, NUM_ENDPOINTS,
};
use super::UsbOtg;

/// Lowest endpoint number set in a DAINT half, if any.
fn lowest_endpoint(bits: u32) -> Option<usize> {
    match bits.trailing_zeros() as usize {
        ep if ep < NUM_ENDPOINTS => Some(ep),
        _ => None,
    }
}

impl<'a, R: RegisterInterface> UsbOtg<'a, R> {
    /// Acknowledge `field` in the write-1-to-clear register `reg` if it is set
    /// in `flags`, returning whether it was.
    fn take_flag<T: RegisterLongName>(
        &self,
        reg: Reg,
        flags: LocalRegisterCopy<u32, T>,
        field: Field<u32, T>,
    ) -> bool {
        if !flags.is_set(field) {
            return false;
        }
        self.registers.write(reg, field_bits(field.val(1)));
        true
    }

    pub(super) fn handle_out_endpoint(&self) {
        let pending = self.registers.read_field(Reg::Daint, DAINT::OEPINT);
        let Some(ep) = lowest_endpoint(pending) else {
            debug!("usb_otg: OUT interrupt with DAINT {:#06x}", pending);
            return;
        };

        let reg = Reg::Doepint(ep);
        let flags = self.registers.extract::<DOEPINT::Register>(reg);
        if self.trace() {
            debug!("usb_otg: ep{} OUT {:#06x}", ep, flags.get());
        }

        self.take_flag(reg, flags, DOEPINT::XFRC);
        self.take_flag(reg, flags, DOEPINT::EPDISD);
        if flags.is_set(DOEPINT::STUP) {
            if ep != 0 {
                internal_err!("usb_otg: SETUP completed on ep{}", ep);
            }
            self.handle_setup();
            self.take_flag(reg, flags, DOEPINT::STUP);
        }
        self.take_flag(reg, flags, DOEPINT::OTEPDIS);
        self.take_flag(reg, flags, DOEPINT::NAK);
    }

    pub(super) fn handle_in_endpoint(&self) {
        let pending = self.registers.read_field(Reg::Daint, DAINT::IEPINT);
        let Some(ep) = lowest_endpoint(pending) else {
            debug!("usb_otg: IN interrupt with DAINT {:#06x}", pending);
            return;
        };

        let reg = Reg::Diepint(ep);
        let flags = self.registers.extract::<DIEPINT::Register>(reg);
        if self.trace() {
            debug!("usb_otg: ep{} IN {:#06x}", ep, flags.get());
        }

        if self.take_flag(reg, flags, DIEPINT::XFRC) {
            // The OUT half takes the next packet of the control exchange
            self.registers.modify(Reg::Doeptsiz(ep), DOEPTSIZ::PKTCNT.val(1));
        }
        self.take_flag(reg, flags, DIEPINT::EPDISD);
        self.take_flag(reg, flags, DIEPINT::TOC);
        self.take_flag(reg, flags, DIEPINT::ITTXFE);
        self.take_flag(reg, flags, DIEPINT::INEPNE);
        self.take_flag(reg, flags, DIEPINT::PKTDRPSTS);
        self.take_flag(reg, flags, DIEPINT::NAK);
        // TXFE is read-only on this core and follows the FIFO level
    }
}

#[cfg(test)]
mod tests {
    use super::lowest_endpoint;

    #[test]
    fn lowest_set_endpoint() {
        assert_eq!(lowest_endpoint(0b0001), Some(0));
        assert_eq!(lowest_endpoint(0b1010), Some(1));
        assert_eq!(lowest_endpoint(0b1000), Some(3));
        assert_eq!(lowest_endpoint(0), None);
        // Endpoints beyond what the core implements
        assert_eq!(lowest_endpoint(1 << 4), None);
    }
}
