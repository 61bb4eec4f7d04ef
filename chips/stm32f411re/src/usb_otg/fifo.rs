// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! FIFO flush and endpoint 0 transmit.

use kernel::debug;
use kernel::ErrorCode;

use super::registers::{
    RegisterInterface, Reg, DIEPCTL, DIEPTSIZ, DOEPCTL, DTXFSTS, GRSTCTL,
};
use super::{UsbOtg, MAX_CTRL_PACKET_SIZE};

/// Bound on the busy-waits for the core to finish a flush or reset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpinLimit {
    /// Wait as long as it takes. A wedged AHB master hangs the caller.
    Forever,
    /// Give up with `BUSY` after this many polls.
    Iterations(u32),
}

impl<'a, R: RegisterInterface> UsbOtg<'a, R> {
    /// Poll `done` until it returns true, within the configured spin limit.
    pub(super) fn spin_until(&self, mut done: impl FnMut() -> bool) -> Result<(), ErrorCode> {
        match self.spin_limit.get() {
            SpinLimit::Forever => {
                while !done() {}
                Ok(())
            }
            SpinLimit::Iterations(limit) => {
                for _ in 0..limit {
                    if done() {
                        return Ok(());
                    }
                }
                Err(ErrorCode::BUSY)
            }
        }
    }

    fn wait_ahb_idle(&self) -> Result<(), ErrorCode> {
        self.spin_until(|| self.registers.is_set(Reg::Grstctl, GRSTCTL::AHBIDL))
    }

    /// Discard the contents of every TX FIFO.
    pub fn flush_tx(&self) -> Result<(), ErrorCode> {
        self.wait_ahb_idle()?;
        self.registers.write_fields(
            Reg::Grstctl,
            GRSTCTL::TXFFLSH::SET + GRSTCTL::TXFNUM::AllFifos,
        );
        self.spin_until(|| !self.registers.is_set(Reg::Grstctl, GRSTCTL::TXFFLSH))
    }

    /// Discard the contents of the shared RX FIFO.
    pub fn flush_rx(&self) -> Result<(), ErrorCode> {
        self.wait_ahb_idle()?;
        self.registers.write_fields(Reg::Grstctl, GRSTCTL::RXFFLSH::SET);
        self.spin_until(|| !self.registers.is_set(Reg::Grstctl, GRSTCTL::RXFFLSH))
    }

    /// Send `data` as a single packet on endpoint 0 IN.
    ///
    /// An empty `data` sends a zero-length packet, which is how a control
    /// transfer's status stage is acknowledged. On success the OUT side of
    /// endpoint 0 is re-armed for the host's status stage.
    ///
    /// Returns `OFF` if endpoint 0 is not active, and `SIZE` if `data` is
    /// longer than one control packet or the TX FIFO lacks room for it.
    /// Nothing is written in any of these cases.
    pub fn write_tx(&self, data: &[u8]) -> Result<(), ErrorCode> {
        // DIEPTSIZ0 only holds a 7-bit transfer size and a single packet
        if data.len() > MAX_CTRL_PACKET_SIZE {
            debug!("usb_otg: {} bytes exceed one ep0 packet", data.len());
            return Err(ErrorCode::SIZE);
        }

        if !self.registers.is_set(Reg::Diepctl(0), DIEPCTL::USBAEP) {
            debug!("usb_otg: ep0 IN not active, dropping {} bytes", data.len());
            return Err(ErrorCode::OFF);
        }

        let words = data.len().div_ceil(4);
        let available = self.registers.read_field(Reg::Dtxfsts(0), DTXFSTS::INEPTFSAV) as usize;
        if words > available {
            debug!(
                "usb_otg: ep0 TX FIFO has {} words free, {} needed",
                available, words
            );
            return Err(ErrorCode::SIZE);
        }

        self.registers.write_fields(
            Reg::Dieptsiz(0),
            DIEPTSIZ::PKTCNT.val(1) + DIEPTSIZ::XFRSIZ.val(data.len() as u32),
        );
        self.registers.modify(
            Reg::Diepctl(0),
            DIEPCTL::STALL::CLEAR + DIEPCTL::CNAK::SET + DIEPCTL::EPENA::SET,
        );

        for chunk in data.chunks(4) {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            self.registers.fifo_push(0, u32::from_le_bytes(word));
        }

        self.registers
            .modify(Reg::Doepctl(0), DOEPCTL::CNAK::SET + DOEPCTL::EPENA::SET);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fake::FakeOtg;
    use super::super::registers::{field_bits, Reg, DIEPCTL, GRSTCTL};
    use super::super::tests::{driver, NO_DESCRIPTORS};
    use super::*;
    use std::vec;

    fn ep0_active(fake: &FakeOtg, free_words: u32) {
        fake.preset(Reg::Diepctl(0), field_bits(DIEPCTL::USBAEP::SET));
        fake.preset(Reg::Dtxfsts(0), free_words);
    }

    #[test]
    fn write_packs_words_little_endian() {
        let usb = driver(&NO_DESCRIPTORS);
        ep0_active(&usb.registers, 16);

        assert_eq!(usb.write_tx(&[1, 2, 3, 4, 5, 6]), Ok(()));
        assert_eq!(usb.registers.pushed(), vec![0x0403_0201, 0x0000_0605]);
        assert_eq!(usb.registers.writes_to(Reg::Dieptsiz(0)), vec![(1 << 19) | 6]);

        let diepctl = usb.registers.value(Reg::Diepctl(0));
        assert_eq!(diepctl & (1 << 21), 0);
        assert_ne!(diepctl & (1 << 26), 0);
        assert_ne!(diepctl & (1 << 31), 0);
        // OUT side re-armed for the status stage
        assert_eq!(usb.registers.value(Reg::Doepctl(0)), (1 << 31) | (1 << 26));
    }

    #[test]
    fn zero_length_status_packet() {
        let usb = driver(&NO_DESCRIPTORS);
        ep0_active(&usb.registers, 0);

        assert_eq!(usb.write_tx(&[]), Ok(()));
        assert!(usb.registers.pushed().is_empty());
        assert_eq!(usb.registers.writes_to(Reg::Dieptsiz(0)), vec![1 << 19]);
    }

    #[test]
    fn insufficient_space_has_no_side_effects() {
        let usb = driver(&NO_DESCRIPTORS);
        ep0_active(&usb.registers, 4);

        // 17 bytes need 5 words
        assert_eq!(usb.write_tx(&[0xAA; 17]), Err(ErrorCode::SIZE));
        assert!(usb.registers.writes().is_empty());
        assert!(usb.registers.pushed().is_empty());

        // 16 bytes fit exactly
        assert_eq!(usb.write_tx(&[0xAA; 16]), Ok(()));
        assert_eq!(usb.registers.pushed().len(), 4);
    }

    #[test]
    fn oversized_packet_is_refused() {
        let usb = driver(&NO_DESCRIPTORS);
        ep0_active(&usb.registers, 32);

        assert_eq!(usb.write_tx(&[0x55; 65]), Err(ErrorCode::SIZE));
        assert!(usb.registers.writes().is_empty());
        assert!(usb.registers.pushed().is_empty());

        assert_eq!(usb.write_tx(&[0x55; 64]), Ok(()));
        assert_eq!(usb.registers.writes_to(Reg::Dieptsiz(0)), vec![(1 << 19) | 64]);
    }

    #[test]
    fn inactive_endpoint_is_refused() {
        let usb = driver(&NO_DESCRIPTORS);
        usb.registers.preset(Reg::Dtxfsts(0), 16);

        assert_eq!(usb.write_tx(&[0; 8]), Err(ErrorCode::OFF));
        assert!(usb.registers.writes().is_empty());
    }

    #[test]
    fn flushes_request_and_wait() {
        let usb = driver(&NO_DESCRIPTORS);

        assert_eq!(usb.flush_tx(), Ok(()));
        assert_eq!(usb.flush_rx(), Ok(()));
        assert_eq!(
            usb.registers.writes_to(Reg::Grstctl),
            vec![
                field_bits(GRSTCTL::TXFFLSH::SET + GRSTCTL::TXFNUM::AllFifos),
                field_bits(GRSTCTL::RXFFLSH::SET),
            ]
        );
    }

    #[test]
    fn bounded_flush_times_out() {
        let usb = driver(&NO_DESCRIPTORS);
        usb.spin_limit.set(SpinLimit::Iterations(10));
        usb.registers.set_ahb_idle(false);

        assert_eq!(usb.flush_tx(), Err(ErrorCode::BUSY));
        assert!(usb.registers.writes().is_empty());
    }
}
