// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Platform-independent USB 2.0 descriptors, serialized at compile time.
//!
//! Each descriptor has a `const fn` that produces its wire bytes, so a
//! device's descriptor set can live in `static` arrays and be handed to a
//! controller as `&'static [u8]` without any runtime buffer.

use kernel::hil::usb::{DescriptorType, TransferType};

pub const DEVICE_DESCRIPTOR_LEN: usize = 18;
pub const CONFIGURATION_DESCRIPTOR_LEN: usize = 9;
pub const INTERFACE_DESCRIPTOR_LEN: usize = 9;
pub const ENDPOINT_DESCRIPTOR_LEN: usize = 7;

/// Length of a string descriptor holding `chars` UTF-16 code units.
pub const fn string_descriptor_len(chars: usize) -> usize {
    2 + 2 * chars
}

pub struct DeviceDescriptor {
    /// Valid values include 0x0100 (USB1.0), 0x0110 (USB1.1) and 0x0200 (USB2.0)
    pub usb_release: u16,

    /// 0x00 means each interface defines its own class.
    /// 0xFF means the class behavior is defined by the vendor.
    /// All other values have meaning assigned by USB-IF
    pub class: u8,

    pub subclass: u8,

    pub protocol: u8,

    /// Max packet size for endpoint 0.  Must be 8, 16, 32 or 64
    pub max_packet_size_ep0: u8,

    pub vendor_id: u16,

    /// Together with `vendor_id`, this must be unique to the product
    pub product_id: u16,

    /// Device release number in binary coded decimal (BCD)
    pub device_release: u16,

    /// Index of the string descriptor describing manufacturer, or 0 if none
    pub manufacturer_string: u8,

    /// Index of the string descriptor describing product, or 0 if none
    pub product_string: u8,

    /// Index of the string descriptor giving device serial number, or 0 if none
    pub serial_number_string: u8,

    /// Number of configurations the device supports.  Must be at least one
    pub num_configurations: u8,
}

impl DeviceDescriptor {
    pub const fn serialize(&self) -> [u8; DEVICE_DESCRIPTOR_LEN] {
        let usb = self.usb_release.to_le_bytes();
        let vid = self.vendor_id.to_le_bytes();
        let pid = self.product_id.to_le_bytes();
        let release = self.device_release.to_le_bytes();
        [
            DEVICE_DESCRIPTOR_LEN as u8,
            DescriptorType::Device as u8,
            usb[0],
            usb[1],
            self.class,
            self.subclass,
            self.protocol,
            self.max_packet_size_ep0,
            vid[0],
            vid[1],
            pid[0],
            pid[1],
            release[0],
            release[1],
            self.manufacturer_string,
            self.product_string,
            self.serial_number_string,
            self.num_configurations,
        ]
    }
}

/// `bmAttributes` of a configuration. Bit 7 is reserved and always set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConfigurationAttributes(u8);

impl ConfigurationAttributes {
    pub const fn new(self_powered: bool, remote_wakeup: bool) -> Self {
        let mut bits = 1 << 7;
        if self_powered {
            bits |= 1 << 6;
        }
        if remote_wakeup {
            bits |= 1 << 5;
        }
        ConfigurationAttributes(bits)
    }
}

pub struct ConfigurationDescriptor {
    pub num_interfaces: u8,
    pub configuration_value: u8,
    pub string_index: u8,
    pub attributes: ConfigurationAttributes,
    /// In units of 2mA
    pub max_power: u8,
    /// Length of the interface, endpoint and class descriptors that follow
    /// this one in the GET_DESCRIPTOR(Configuration) response
    pub related_descriptor_length: usize,
}

impl ConfigurationDescriptor {
    pub const fn serialize(&self) -> [u8; CONFIGURATION_DESCRIPTOR_LEN] {
        let total = ((CONFIGURATION_DESCRIPTOR_LEN + self.related_descriptor_length) as u16)
            .to_le_bytes();
        [
            CONFIGURATION_DESCRIPTOR_LEN as u8,
            DescriptorType::Configuration as u8,
            total[0],
            total[1],
            self.num_interfaces,
            self.configuration_value,
            self.string_index,
            self.attributes.0,
            self.max_power,
        ]
    }
}

pub struct InterfaceDescriptor {
    pub interface_number: u8,
    pub alternate_setting: u8,
    pub num_endpoints: u8,
    pub interface_class: u8,
    pub interface_subclass: u8,
    pub interface_protocol: u8,
    pub string_index: u8,
}

impl InterfaceDescriptor {
    pub const fn serialize(&self) -> [u8; INTERFACE_DESCRIPTOR_LEN] {
        [
            INTERFACE_DESCRIPTOR_LEN as u8,
            DescriptorType::Interface as u8,
            self.interface_number,
            self.alternate_setting,
            self.num_endpoints,
            self.interface_class,
            self.interface_subclass,
            self.interface_protocol,
            self.string_index,
        ]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferDirection {
    DeviceToHost,
    HostToDevice,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EndpointAddress(u8);

impl EndpointAddress {
    pub const fn new_const(endpoint: usize, direction: TransferDirection) -> EndpointAddress {
        let direction_bit = match direction {
            TransferDirection::HostToDevice => 0,
            TransferDirection::DeviceToHost => 1 << 7,
        };
        EndpointAddress((endpoint as u8 & 0xf) | direction_bit)
    }
}

pub struct EndpointDescriptor {
    pub endpoint_address: EndpointAddress,
    pub transfer_type: TransferType,
    pub max_packet_size: u16,
    /// Polling interval, in frames
    pub interval: u8,
}

impl EndpointDescriptor {
    pub const fn serialize(&self) -> [u8; ENDPOINT_DESCRIPTOR_LEN] {
        let size = (self.max_packet_size & 0x7ff).to_le_bytes();
        [
            ENDPOINT_DESCRIPTOR_LEN as u8,
            DescriptorType::Endpoint as u8,
            self.endpoint_address.0,
            // No synchronization, data endpoint
            self.transfer_type as u8,
            size[0],
            size[1],
            self.interval,
        ]
    }
}

/// String descriptor 0: the LANGID codes the device supports.
pub const fn language_descriptor<const N: usize>(languages: &[u16]) -> [u8; N] {
    assert!(N == string_descriptor_len(languages.len()));
    let mut buf = [0; N];
    buf[0] = N as u8;
    buf[1] = DescriptorType::String as u8;
    let mut i = 0;
    while i < languages.len() {
        let code = languages[i].to_le_bytes();
        buf[2 + 2 * i] = code[0];
        buf[3 + 2 * i] = code[1];
        i += 1;
    }
    buf
}

/// A string descriptor for ASCII `text`, encoded as UTF-16LE.
pub const fn string_descriptor<const N: usize>(text: &str) -> [u8; N] {
    let text = text.as_bytes();
    assert!(N == string_descriptor_len(text.len()));
    let mut buf = [0; N];
    buf[0] = N as u8;
    buf[1] = DescriptorType::String as u8;
    let mut i = 0;
    while i < text.len() {
        assert!(text[i].is_ascii());
        buf[2 + 2 * i] = text[i];
        i += 1;
    }
    buf
}

/// Concatenate `parts` into one array of exactly `N` bytes.
pub const fn concat<const N: usize>(parts: &[&[u8]]) -> [u8; N] {
    let mut buf = [0; N];
    let mut offset = 0;
    let mut p = 0;
    while p < parts.len() {
        let part = parts[p];
        let mut i = 0;
        while i < part.len() {
            buf[offset] = part[i];
            offset += 1;
            i += 1;
        }
        p += 1;
    }
    assert!(offset == N);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_address() {
        let addr = EndpointAddress::new_const(1, TransferDirection::DeviceToHost);
        assert_eq!(addr, EndpointAddress(0x81));
        let addr = EndpointAddress::new_const(2, TransferDirection::HostToDevice);
        assert_eq!(addr, EndpointAddress(0x02));
    }

    #[test]
    fn configuration_attributes() {
        assert_eq!(ConfigurationAttributes::new(true, false).0, 0xC0);
        assert_eq!(ConfigurationAttributes::new(false, true).0, 0xA0);
        assert_eq!(ConfigurationAttributes::new(false, false).0, 0x80);
    }

    #[test]
    fn strings_are_utf16le() {
        let s: [u8; 8] = string_descriptor("Tok");
        assert_eq!(s, [8, 3, b'T', 0, b'o', 0, b'k', 0]);

        let langs: [u8; 6] = language_descriptor(&[0x0409, 0x0407]);
        assert_eq!(langs, [6, 3, 0x09, 0x04, 0x07, 0x04]);
    }

    #[test]
    #[should_panic]
    fn string_length_must_match() {
        let _: [u8; 6] = string_descriptor("Tock");
    }

    #[test]
    fn concat_parts() {
        let joined: [u8; 5] = concat(&[&[1, 2], &[], &[3, 4, 5]]);
        assert_eq!(joined, [1, 2, 3, 4, 5]);
    }
}
