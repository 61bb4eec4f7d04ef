// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Descriptors of a USB HID boot keyboard.
//!
//! One configuration with one HID interface (boot subclass, keyboard
//! protocol) and a single interrupt IN endpoint. The data is served to a USB
//! controller through [`KeyboardHidDescriptors`], which implements
//! `hil::usb::DescriptorTable`.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let usb = UsbOtg::new(OtgFsRegisters::new(), &KEYBOARD_DESCRIPTORS);
//! ```

use super::descriptors::{
    concat, language_descriptor, string_descriptor, string_descriptor_len,
    ConfigurationAttributes, ConfigurationDescriptor, DeviceDescriptor, EndpointAddress,
    EndpointDescriptor, InterfaceDescriptor, TransferDirection, CONFIGURATION_DESCRIPTOR_LEN,
    DEVICE_DESCRIPTOR_LEN, ENDPOINT_DESCRIPTOR_LEN, INTERFACE_DESCRIPTOR_LEN,
};

use kernel::hil::usb::{DescriptorTable, DescriptorType, TransferType};

/// Prototype vendor and product IDs.
pub const VENDOR_ID: u16 = 0x1111;
pub const PRODUCT_ID: u16 = 0x1111;

/// Max packet size specified by spec
pub const MAX_CTRL_PACKET_SIZE: u8 = 64;

/// Use 1 Interrupt transfer IN endpoint
const ENDPOINT_NUM: usize = 1;

const LANGUAGES: &[u16] = &[
    0x0409, // English (United States)
];

const MANUFACTURER: &str = "MED0KIN";
const PRODUCT: &str = "Keyboard";

const MANUFACTURER_STRING: u8 = 1;
const PRODUCT_STRING: u8 = 2;

const DEVICE: DeviceDescriptor = DeviceDescriptor {
    usb_release: 0x0200,
    // The class is given per interface
    class: 0x00,
    subclass: 0x00,
    protocol: 0x00,
    max_packet_size_ep0: MAX_CTRL_PACKET_SIZE,
    vendor_id: VENDOR_ID,
    product_id: PRODUCT_ID,
    device_release: 0x0100,
    manufacturer_string: MANUFACTURER_STRING,
    product_string: PRODUCT_STRING,
    serial_number_string: 0,
    num_configurations: 1,
};

const CONFIGURATION: ConfigurationDescriptor = ConfigurationDescriptor {
    num_interfaces: 1,
    configuration_value: 1,
    string_index: 0,
    attributes: ConfigurationAttributes::new(true, false),
    max_power: 1,
    related_descriptor_length: INTERFACE_DESCRIPTOR_LEN + ENDPOINT_DESCRIPTOR_LEN,
};

const INTERFACE: InterfaceDescriptor = InterfaceDescriptor {
    interface_number: 0,
    alternate_setting: 0,
    num_endpoints: 1,
    interface_class: 0x03,    // HID
    interface_subclass: 0x01, // Boot subclass
    interface_protocol: 0x01, // Keyboard
    string_index: 0,
};

const ENDPOINT: EndpointDescriptor = EndpointDescriptor {
    endpoint_address: EndpointAddress::new_const(ENDPOINT_NUM, TransferDirection::DeviceToHost),
    transfer_type: TransferType::Interrupt,
    max_packet_size: 8,
    interval: 10,
};

const CONFIGURATION_TOTAL_LEN: usize =
    CONFIGURATION_DESCRIPTOR_LEN + INTERFACE_DESCRIPTOR_LEN + ENDPOINT_DESCRIPTOR_LEN;

pub static DEVICE_DESCRIPTOR: [u8; DEVICE_DESCRIPTOR_LEN] = DEVICE.serialize();

/// The configuration descriptor followed by everything it describes, as
/// returned for GET_DESCRIPTOR(Configuration).
pub static CONFIGURATION_DESCRIPTOR: [u8; CONFIGURATION_TOTAL_LEN] = concat(&[
    &CONFIGURATION.serialize(),
    &INTERFACE.serialize(),
    &ENDPOINT.serialize(),
]);

pub static LANGUAGE_DESCRIPTOR: [u8; string_descriptor_len(LANGUAGES.len())] =
    language_descriptor(LANGUAGES);

pub static MANUFACTURER_DESCRIPTOR: [u8; string_descriptor_len(MANUFACTURER.len())] =
    string_descriptor(MANUFACTURER);

pub static PRODUCT_DESCRIPTOR: [u8; string_descriptor_len(PRODUCT.len())] =
    string_descriptor(PRODUCT);

/// String descriptors by index. Index 0 is the language table.
static STRINGS: [&[u8]; 3] = [
    &LANGUAGE_DESCRIPTOR,
    &MANUFACTURER_DESCRIPTOR,
    &PRODUCT_DESCRIPTOR,
];

pub struct KeyboardHidDescriptors;

pub static KEYBOARD_DESCRIPTORS: KeyboardHidDescriptors = KeyboardHidDescriptors;

impl DescriptorTable for KeyboardHidDescriptors {
    fn descriptor(&self, descriptor_type: DescriptorType, index: u8) -> Option<&'static [u8]> {
        match descriptor_type {
            DescriptorType::Device if index == 0 => Some(&DEVICE_DESCRIPTOR[..]),
            DescriptorType::Configuration if index == 0 => Some(&CONFIGURATION_DESCRIPTOR[..]),
            DescriptorType::String => STRINGS.get(usize::from(index)).copied(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_descriptor() {
        assert_eq!(
            DEVICE_DESCRIPTOR,
            [
                18, 1, 0x00, 0x02, 0x00, 0x00, 0x00, 64, 0x11, 0x11, 0x11, 0x11, 0x00, 0x01,
                1, 2, 0, 1
            ]
        );
    }

    #[test]
    fn configuration_descriptor() {
        assert_eq!(CONFIGURATION_DESCRIPTOR.len(), 25);
        assert_eq!(
            CONFIGURATION_DESCRIPTOR,
            [
                9, 2, 25, 0, 1, 1, 0, 0xC0, 1, // configuration
                9, 4, 0, 0, 1, 0x03, 0x01, 0x01, 0, // interface
                7, 5, 0x81, 0x03, 8, 0, 10, // endpoint
            ]
        );
    }

    #[test]
    fn string_descriptors() {
        assert_eq!(LANGUAGE_DESCRIPTOR, [4, 3, 0x09, 0x04]);
        assert_eq!(MANUFACTURER_DESCRIPTOR.len(), 16);
        assert_eq!(&MANUFACTURER_DESCRIPTOR[..6], &[16, 3, b'M', 0, b'E', 0]);
        assert_eq!(PRODUCT_DESCRIPTOR.len(), 18);
        assert_eq!(&PRODUCT_DESCRIPTOR[16..], &[b'd', 0]);
    }

    #[test]
    fn lookup() {
        let table = &KEYBOARD_DESCRIPTORS;
        assert_eq!(
            table.descriptor(DescriptorType::Device, 0),
            Some(&DEVICE_DESCRIPTOR[..])
        );
        assert_eq!(
            table.descriptor(DescriptorType::Configuration, 0).map(|d| d.len()),
            Some(25)
        );
        assert_eq!(table.descriptor(DescriptorType::Configuration, 1), None);
        assert_eq!(
            table.descriptor(DescriptorType::String, 2),
            Some(&PRODUCT_DESCRIPTOR[..])
        );
        assert_eq!(table.descriptor(DescriptorType::String, 3), None);
        assert_eq!(table.descriptor(DescriptorType::DeviceQualifier, 0), None);
    }
}
