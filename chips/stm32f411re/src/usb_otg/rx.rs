// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Receive status queue handling.
//!
//! Every packet the core stores in the shared RX FIFO is announced by a status
//! word in GRXSTSP. Popping the status word is what lets the core move on, and
//! payload bytes must be popped from the FIFO before the next status word is
//! read.

use kernel::debug;
use kernel::utilities::registers::LocalRegisterCopy;

use super::registers::{RegisterInterface, Reg, GINTMSK, GRXSTSP};
use super::setup::SetupPacket;
use super::UsbOtg;

/// What a receive status word announces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RxStatusKind {
    /// Global OUT NAK took effect.
    Nak,
    /// An OUT data packet is in the FIFO.
    DataUpdate,
    /// An OUT transfer completed.
    TransferComplete,
    /// The SETUP stage of a control transfer completed.
    SetupComplete,
    /// A SETUP packet is in the FIFO.
    SetupUpdate,
}

/// One decoded GRXSTSP word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RxStatus {
    pub kind: RxStatusKind,
    pub byte_count: usize,
    pub endpoint: usize,
    pub data_toggle: u8,
}

impl RxStatus {
    /// Decode a status word. Returns `None` for reserved packet status codes.
    pub fn decode(word: u32) -> Option<RxStatus> {
        let status: LocalRegisterCopy<u32, GRXSTSP::Register> = LocalRegisterCopy::new(word);
        let kind = match status.read_as_enum::<GRXSTSP::PKTSTS::Value>(GRXSTSP::PKTSTS)? {
            GRXSTSP::PKTSTS::Value::GlobalOutNak => RxStatusKind::Nak,
            GRXSTSP::PKTSTS::Value::OutDataReceived => RxStatusKind::DataUpdate,
            GRXSTSP::PKTSTS::Value::OutTransferCompleted => RxStatusKind::TransferComplete,
            GRXSTSP::PKTSTS::Value::SetupTransactionCompleted => RxStatusKind::SetupComplete,
            GRXSTSP::PKTSTS::Value::SetupDataReceived => RxStatusKind::SetupUpdate,
        };
        Some(RxStatus {
            kind,
            byte_count: status.read(GRXSTSP::BCNT) as usize,
            endpoint: status.read(GRXSTSP::EPNUM) as usize,
            data_toggle: status.read(GRXSTSP::DPID) as u8,
        })
    }

    fn words(&self) -> usize {
        self.byte_count.div_ceil(4)
    }
}

impl<'a, R: RegisterInterface> UsbOtg<'a, R> {
    /// Service RXFLVL: pop and act on one receive status word.
    pub(super) fn handle_rx_fifo_level(&self) {
        // RXFLVL stays asserted until the queue drains; keep it masked while
        // this entry is being consumed.
        self.registers.modify(Reg::Gintmsk, GINTMSK::RXFLVLM::CLEAR);

        let word = self.registers.read(Reg::Grxstsp);
        match RxStatus::decode(word) {
            Some(status) => self.classify_rx(status),
            None => debug!("usb_otg: reserved RX status {:#010x}", word),
        }

        self.registers.modify(Reg::Gintmsk, GINTMSK::RXFLVLM::SET);
    }

    fn classify_rx(&self, status: RxStatus) {
        if self.trace() {
            debug!(
                "usb_otg: rx {:?} ep{} {} bytes",
                status.kind, status.endpoint, status.byte_count
            );
        }

        match status.kind {
            RxStatusKind::SetupUpdate => {
                if status.endpoint != 0 || status.byte_count != SetupPacket::LEN {
                    internal_err!(
                        "usb_otg: malformed SETUP, ep{} with {} bytes",
                        status.endpoint,
                        status.byte_count
                    );
                }
                let mut words = [0u32; SetupPacket::WORDS];
                for word in words.iter_mut().take(status.words()) {
                    *word = self.registers.fifo_pop(0);
                }
                self.setup.set(SetupPacket::from_words(words));
            }
            RxStatusKind::DataUpdate => {
                // No OUT data stage is handled by this driver. Drop the
                // payload so the FIFO does not wedge behind it.
                for _ in 0..status.words() {
                    self.registers.fifo_pop(status.endpoint);
                }
            }
            RxStatusKind::Nak | RxStatusKind::TransferComplete | RxStatusKind::SetupComplete => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_setup_update() {
        // PKTSTS 6, DPID 0, BCNT 8, EPNUM 0
        let status = RxStatus::decode((6 << 17) | (8 << 4)).unwrap();
        assert_eq!(status.kind, RxStatusKind::SetupUpdate);
        assert_eq!(status.byte_count, 8);
        assert_eq!(status.endpoint, 0);
        assert_eq!(status.data_toggle, 0);
    }

    #[test]
    fn decode_fields() {
        // PKTSTS 2, DATA1, 13 bytes on ep 2
        let status = RxStatus::decode((2 << 17) | (2 << 15) | (13 << 4) | 2).unwrap();
        assert_eq!(status.kind, RxStatusKind::DataUpdate);
        assert_eq!(status.byte_count, 13);
        assert_eq!(status.endpoint, 2);
        assert_eq!(status.data_toggle, 2);
        assert_eq!(status.words(), 4);

        assert_eq!(
            RxStatus::decode(1 << 17).map(|s| s.kind),
            Some(RxStatusKind::Nak)
        );
        assert_eq!(
            RxStatus::decode(3 << 17).map(|s| s.kind),
            Some(RxStatusKind::TransferComplete)
        );
        assert_eq!(
            RxStatus::decode(4 << 17).map(|s| s.kind),
            Some(RxStatusKind::SetupComplete)
        );
    }

    #[test]
    fn reserved_codes() {
        assert_eq!(RxStatus::decode(0), None);
        assert_eq!(RxStatus::decode(5 << 17), None);
        assert_eq!(RxStatus::decode(0xF << 17), None);
    }
}
