// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! The 8-byte SETUP packet of a control transfer.

use kernel::hil::usb::Request;

/// Direction of the data stage, bit 7 of `bmRequestType`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferDirection {
    HostToDevice,
    DeviceToHost,
}

/// Bits 5..6 of `bmRequestType`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Standard,
    Class,
    Vendor,
    Reserved,
}

/// Bits 0..4 of `bmRequestType`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Recipient {
    Device,
    Interface,
    Endpoint,
    Other,
    Reserved,
}

/// A SETUP packet as it arrives on the wire.
///
/// The packet is stored as its 8 raw bytes. Fields are decoded on access,
/// little-endian, at fixed offsets:
///
/// | offset | field           |
/// |--------|-----------------|
/// | 0      | `bmRequestType` |
/// | 1      | `bRequest`      |
/// | 2..4   | `wValue`        |
/// | 4..6   | `wIndex`        |
/// | 6..8   | `wLength`       |
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SetupPacket {
    bytes: [u8; SETUP_LEN],
}

const SETUP_LEN: usize = 8;

impl SetupPacket {
    pub const LEN: usize = SETUP_LEN;

    /// Number of RX FIFO words a SETUP packet occupies.
    pub const WORDS: usize = SetupPacket::LEN / 4;

    pub const fn from_bytes(bytes: [u8; SetupPacket::LEN]) -> SetupPacket {
        SetupPacket { bytes }
    }

    pub fn new(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> SetupPacket {
        let mut packet = SetupPacket::default();
        packet.set_request_type(request_type);
        packet.set_request(request);
        packet.set_value(value);
        packet.set_index(index);
        packet.set_length(length);
        packet
    }

    /// Rebuild a packet from the two words popped from the RX FIFO, in pop
    /// order.
    pub fn from_words(words: [u32; SetupPacket::WORDS]) -> SetupPacket {
        let mut bytes = [0; SetupPacket::LEN];
        bytes[0..4].copy_from_slice(&words[0].to_le_bytes());
        bytes[4..8].copy_from_slice(&words[1].to_le_bytes());
        SetupPacket { bytes }
    }

    pub fn words(&self) -> [u32; SetupPacket::WORDS] {
        [
            u32::from_le_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]]),
            u32::from_le_bytes([self.bytes[4], self.bytes[5], self.bytes[6], self.bytes[7]]),
        ]
    }

    pub fn bytes(&self) -> [u8; SetupPacket::LEN] {
        self.bytes
    }

    fn u16_at(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }

    fn set_u16_at(&mut self, offset: usize, value: u16) {
        self.bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn request_type(&self) -> u8 {
        self.bytes[0]
    }

    pub fn request(&self) -> u8 {
        self.bytes[1]
    }

    pub fn value(&self) -> u16 {
        self.u16_at(2)
    }

    pub fn value_low(&self) -> u8 {
        self.bytes[2]
    }

    pub fn value_high(&self) -> u8 {
        self.bytes[3]
    }

    pub fn index(&self) -> u16 {
        self.u16_at(4)
    }

    pub fn index_low(&self) -> u8 {
        self.bytes[4]
    }

    pub fn index_high(&self) -> u8 {
        self.bytes[5]
    }

    pub fn length(&self) -> u16 {
        self.u16_at(6)
    }

    pub fn set_request_type(&mut self, request_type: u8) {
        self.bytes[0] = request_type;
    }

    pub fn set_request(&mut self, request: u8) {
        self.bytes[1] = request;
    }

    pub fn set_value(&mut self, value: u16) {
        self.set_u16_at(2, value);
    }

    pub fn set_value_low(&mut self, low: u8) {
        self.bytes[2] = low;
    }

    pub fn set_value_high(&mut self, high: u8) {
        self.bytes[3] = high;
    }

    pub fn set_index(&mut self, index: u16) {
        self.set_u16_at(4, index);
    }

    pub fn set_index_low(&mut self, low: u8) {
        self.bytes[4] = low;
    }

    pub fn set_index_high(&mut self, high: u8) {
        self.bytes[5] = high;
    }

    pub fn set_length(&mut self, length: u16) {
        self.set_u16_at(6, length);
    }

    pub fn direction(&self) -> TransferDirection {
        if self.request_type() & 0x80 != 0 {
            TransferDirection::DeviceToHost
        } else {
            TransferDirection::HostToDevice
        }
    }

    pub fn request_kind(&self) -> RequestKind {
        match (self.request_type() >> 5) & 0b11 {
            0 => RequestKind::Standard,
            1 => RequestKind::Class,
            2 => RequestKind::Vendor,
            _ => RequestKind::Reserved,
        }
    }

    pub fn recipient(&self) -> Recipient {
        match self.request_type() & 0b11111 {
            0 => Recipient::Device,
            1 => Recipient::Interface,
            2 => Recipient::Endpoint,
            3 => Recipient::Other,
            _ => Recipient::Reserved,
        }
    }

    /// The standard request this packet carries, if it is one.
    pub fn standard_request(&self) -> Option<Request> {
        match self.request_kind() {
            RequestKind::Standard => Request::from_code(self.request()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GET_DEVICE_DESCRIPTOR: [u8; 8] = [0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x40, 0x00];

    #[test]
    fn byte_view_matches_field_view() {
        // A handful of patterns covering every byte position and both halves
        // of each 16-bit field.
        let inputs: [[u8; 8]; 5] = [
            GET_DEVICE_DESCRIPTOR,
            [0x00, 0x05, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00],
            [0xFF; 8],
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08],
            [0x21, 0x0A, 0x00, 0xFF, 0x01, 0x80, 0xFE, 0x7F],
        ];

        for bytes in inputs {
            let packet = SetupPacket::from_bytes(bytes);
            assert_eq!(packet.request_type(), bytes[0]);
            assert_eq!(packet.request(), bytes[1]);
            assert_eq!(packet.value(), u16::from(bytes[2]) | u16::from(bytes[3]) << 8);
            assert_eq!(packet.value_low(), bytes[2]);
            assert_eq!(packet.value_high(), bytes[3]);
            assert_eq!(packet.index(), u16::from(bytes[4]) | u16::from(bytes[5]) << 8);
            assert_eq!(packet.index_low(), bytes[4]);
            assert_eq!(packet.index_high(), bytes[5]);
            assert_eq!(packet.length(), u16::from(bytes[6]) | u16::from(bytes[7]) << 8);

            let rebuilt = SetupPacket::new(
                packet.request_type(),
                packet.request(),
                packet.value(),
                packet.index(),
                packet.length(),
            );
            assert_eq!(rebuilt.bytes(), bytes);
        }
    }

    #[test]
    fn byte_setters_alias_fields() {
        let mut packet = SetupPacket::new(0x00, 0x05, 0x1234, 0xABCD, 0);
        packet.set_value_low(0x07);
        assert_eq!(packet.value(), 0x1207);
        packet.set_value_high(0x03);
        assert_eq!(packet.value(), 0x0307);
        packet.set_index_high(0x00);
        packet.set_index_low(0x02);
        assert_eq!(packet.index(), 0x0002);
        assert_eq!(packet.bytes(), [0x00, 0x05, 0x07, 0x03, 0x02, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn fifo_words_are_little_endian() {
        let packet = SetupPacket::from_words([0x0100_0680, 0x0040_0000]);
        assert_eq!(packet.bytes(), GET_DEVICE_DESCRIPTOR);
        assert_eq!(packet.words(), [0x0100_0680, 0x0040_0000]);
    }

    #[test]
    fn request_type_decoding() {
        let packet = SetupPacket::from_bytes(GET_DEVICE_DESCRIPTOR);
        assert_eq!(packet.direction(), TransferDirection::DeviceToHost);
        assert_eq!(packet.request_kind(), RequestKind::Standard);
        assert_eq!(packet.recipient(), Recipient::Device);
        assert_eq!(packet.standard_request(), Some(Request::GetDescriptor));

        // HID SET_IDLE shares its code with GET_INTERFACE
        let set_idle = SetupPacket::new(0x21, 0x0A, 0, 0, 0);
        assert_eq!(set_idle.request_kind(), RequestKind::Class);
        assert_eq!(set_idle.recipient(), Recipient::Interface);
        assert_eq!(set_idle.standard_request(), None);
    }
}
