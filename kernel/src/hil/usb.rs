// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Interface between USB device controllers and the data that describes the
//! device to the host.
//!
//! Request and descriptor codes follow chapter 9 of the USB 2.0
//! specification. Descriptor contents are owned by whoever configures the
//! device (usually a capsule) and are handed to the controller through
//! [`DescriptorTable`].

/// Standard device request codes (`bRequest`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Request {
    GetStatus = 0,
    ClearFeature = 1,
    SetFeature = 3,
    SetAddress = 5,
    GetDescriptor = 6,
    SetDescriptor = 7,
    GetConfiguration = 8,
    SetConfiguration = 9,
    GetInterface = 10,
    SetInterface = 11,
    SynchFrame = 12,
}

impl Request {
    pub fn from_code(code: u8) -> Option<Request> {
        match code {
            0 => Some(Request::GetStatus),
            1 => Some(Request::ClearFeature),
            3 => Some(Request::SetFeature),
            5 => Some(Request::SetAddress),
            6 => Some(Request::GetDescriptor),
            7 => Some(Request::SetDescriptor),
            8 => Some(Request::GetConfiguration),
            9 => Some(Request::SetConfiguration),
            10 => Some(Request::GetInterface),
            11 => Some(Request::SetInterface),
            12 => Some(Request::SynchFrame),
            _ => None,
        }
    }
}

/// Descriptor type tags, as carried in the high byte of `wValue` of a
/// GET_DESCRIPTOR request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DescriptorType {
    Device = 1,
    Configuration = 2,
    String = 3,
    Interface = 4,
    Endpoint = 5,
    DeviceQualifier = 6,
    OtherSpeedConfiguration = 7,
    InterfacePower = 8,
    Otg = 9,
    Hid = 0x21,
    Report = 0x22,
}

impl DescriptorType {
    pub fn from_tag(tag: u8) -> Option<DescriptorType> {
        match tag {
            1 => Some(DescriptorType::Device),
            2 => Some(DescriptorType::Configuration),
            3 => Some(DescriptorType::String),
            4 => Some(DescriptorType::Interface),
            5 => Some(DescriptorType::Endpoint),
            6 => Some(DescriptorType::DeviceQualifier),
            7 => Some(DescriptorType::OtherSpeedConfiguration),
            8 => Some(DescriptorType::InterfacePower),
            9 => Some(DescriptorType::Otg),
            0x21 => Some(DescriptorType::Hid),
            0x22 => Some(DescriptorType::Report),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferType {
    Control = 0,
    Isochronous,
    Bulk,
    Interrupt,
}

/// Bus speed negotiated during enumeration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceSpeed {
    Low,
    Full,
    High,
}

/// Read-only source of serialized descriptors.
///
/// Implementations return the complete descriptor. Truncation to the length
/// the host asked for is the controller's job.
pub trait DescriptorTable {
    /// The descriptor of `descriptor_type` at `index`, if one exists.
    fn descriptor(&self, descriptor_type: DescriptorType, index: u8) -> Option<&'static [u8]>;
}
