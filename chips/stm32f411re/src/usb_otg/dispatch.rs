// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Interrupt demultiplexing and the bus-level events.
//!
//! GINTSTS is read once per interrupt and decoded into [`Event`]s in a fixed
//! order. Each event is serviced and then acknowledged by writing its bit
//! back. GINTSTS bits without an event are acknowledged in one write and
//! otherwise dropped.

use kernel::debug;
use kernel::hil::usb::DeviceSpeed;
use kernel::utilities::registers::{Field, LocalRegisterCopy};

use super::registers::{
    field_bits, RegisterInterface, Reg, DAINTMSK, DCFG, DCTL, DIEPCTL, DIEPMSK, DOEPCTL,
    DOEPMSK, DOEPTSIZ, DSTS, EP_INT_CLEAR_ALL, GINTSTS, GOTGCTL, GOTGINT, GUSBCFG,
};
use super::setup::SetupPacket;
use super::state::{DeviceState, Trigger};
use super::UsbOtg;

/// USB turnaround time for a 32-bit AHB interface, in PHY clocks.
const TURNAROUND_TIME: u32 = 6;

/// A GINTSTS interrupt source the driver services.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    SessionRequest,
    UsbReset,
    EnumerationDone,
    StartOfFrame,
    RxFifoLevel,
    EarlySuspend,
    UsbSuspend,
    Wakeup,
    ModeMismatch,
    OutEndpoint,
    InEndpoint,
}

impl Event {
    /// Service order within one interrupt.
    pub const ORDER: [Event; 11] = [
        Event::SessionRequest,
        Event::UsbReset,
        Event::EnumerationDone,
        Event::StartOfFrame,
        Event::RxFifoLevel,
        Event::EarlySuspend,
        Event::UsbSuspend,
        Event::Wakeup,
        Event::ModeMismatch,
        Event::OutEndpoint,
        Event::InEndpoint,
    ];

    pub fn status_bit(self) -> Field<u32, GINTSTS::Register> {
        match self {
            Event::SessionRequest => GINTSTS::SRQINT,
            Event::UsbReset => GINTSTS::USBRST,
            Event::EnumerationDone => GINTSTS::ENUMDNE,
            Event::StartOfFrame => GINTSTS::SOF,
            Event::RxFifoLevel => GINTSTS::RXFLVL,
            Event::EarlySuspend => GINTSTS::ESUSP,
            Event::UsbSuspend => GINTSTS::USBSUSP,
            Event::Wakeup => GINTSTS::WKUPINT,
            Event::ModeMismatch => GINTSTS::MMIS,
            Event::OutEndpoint => GINTSTS::OEPINT,
            Event::InEndpoint => GINTSTS::IEPINT,
        }
    }

    pub fn mask(self) -> u32 {
        field_bits(self.status_bit().val(1))
    }

    /// Every GINTSTS bit that decodes to an event.
    pub fn known_mask() -> u32 {
        Event::ORDER.iter().fold(0, |mask, event| mask | event.mask())
    }

    /// The events asserted in `status`, in service order.
    pub fn decode(status: u32) -> Events {
        Events {
            status: LocalRegisterCopy::new(status),
            next: 0,
        }
    }
}

/// Iterator returned by [`Event::decode`].
pub struct Events {
    status: LocalRegisterCopy<u32, GINTSTS::Register>,
    next: usize,
}

impl Iterator for Events {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        while let Some(&event) = Event::ORDER.get(self.next) {
            self.next += 1;
            if self.status.is_set(event.status_bit()) {
                return Some(event);
            }
        }
        None
    }
}

impl<'a, R: RegisterInterface> UsbOtg<'a, R> {
    /// Service the OTG_FS interrupt.
    pub fn handle_interrupt(&self) {
        let status = self.registers.read(Reg::Gintsts);

        for event in Event::decode(status) {
            if self.trace() {
                debug!("usb_otg: {:?} in {:?}", event, self.state.get());
            }
            self.handle_event(event);
            self.registers.write(Reg::Gintsts, event.mask());
        }

        let unknown = status & !Event::known_mask();
        if unknown != 0 {
            self.registers.write(Reg::Gintsts, unknown);
        }

        if self.registers.is_set(Reg::Gotgint, GOTGINT::SEDET) {
            if self.trace() {
                debug!("usb_otg: session end");
            }
            self.registers.write_fields(Reg::Gotgint, GOTGINT::SEDET::SET);
        }
    }

    fn handle_event(&self, event: Event) {
        match event {
            Event::SessionRequest => self.session_request(),
            Event::UsbReset => self.bus_reset(),
            Event::EnumerationDone => self.enumeration_done(),
            Event::RxFifoLevel => self.handle_rx_fifo_level(),
            Event::UsbSuspend => self.suspend(),
            Event::Wakeup => self.wakeup(),
            Event::ModeMismatch => {
                internal_err!("usb_otg: mode mismatch, core left device mode")
            }
            Event::OutEndpoint => self.handle_out_endpoint(),
            Event::InEndpoint => self.handle_in_endpoint(),
            Event::StartOfFrame | Event::EarlySuspend => {}
        }
    }

    /// The state `trigger` leads to, or `None` if the current state does not
    /// honor it.
    fn transition(&self, trigger: Trigger) -> Option<DeviceState> {
        let state = self.state.get();
        let next = state.next(trigger);
        if next.is_none() && self.trace() {
            debug!("usb_otg: {:?} ignored in {:?}", trigger, state);
        }
        next
    }

    fn session_request(&self) {
        // Without B-session valid this is line noise
        if !self.registers.is_set(Reg::Gotgctl, GOTGCTL::BSVLD) {
            return;
        }
        if let Some(next) = self.transition(Trigger::SessionValid) {
            self.registers.modify(Reg::Dctl, DCTL::SDIS::CLEAR);
            self.state.set(next);
        }
    }

    fn bus_reset(&self) {
        let Some(next) = self.transition(Trigger::BusReset) else {
            return;
        };

        self.registers.modify(Reg::Dctl, DCTL::RWUSIG::CLEAR);
        self.registers.write(Reg::Diepint(0), EP_INT_CLEAR_ALL);
        self.registers.write(Reg::Doepint(0), EP_INT_CLEAR_ALL);
        self.registers.modify(Reg::Diepctl(0), DIEPCTL::STALL::CLEAR);
        self.registers.modify(Reg::Doepctl(0), DOEPCTL::STALL::CLEAR);

        self.registers
            .write_fields(Reg::Daintmsk, DAINTMSK::IEPM.val(1) + DAINTMSK::OEPM.val(1));
        self.registers.write_fields(
            Reg::Doepmsk,
            DOEPMSK::STUPM::SET
                + DOEPMSK::XFRCM::SET
                + DOEPMSK::EPDM::SET
                + DOEPMSK::OTEPDM::SET
                + DOEPMSK::NAKM::SET,
        );
        self.registers.write_fields(
            Reg::Diepmsk,
            DIEPMSK::TOM::SET + DIEPMSK::XFRCM::SET + DIEPMSK::EPDM::SET,
        );

        self.complete_or_halt(self.flush_tx(), "TX FIFO flush");
        self.complete_or_halt(self.flush_rx(), "RX FIFO flush");

        self.registers.modify(Reg::Dcfg, DCFG::DAD.val(0));
        self.address.set(0);

        // One SETUP packet, then re-enable the endpoint
        self.registers.write_fields(
            Reg::Doeptsiz(0),
            DOEPTSIZ::STUPCNT.val(1)
                + DOEPTSIZ::PKTCNT.val(1)
                + DOEPTSIZ::XFRSIZ.val(SetupPacket::LEN as u32),
        );
        self.registers
            .modify(Reg::Doepctl(0), DOEPCTL::CNAK::SET + DOEPCTL::EPENA::SET);

        self.state.set(next);
    }

    fn enumeration_done(&self) {
        let Some(next) = self.transition(Trigger::EnumerationDone) else {
            return;
        };

        let dsts = self.registers.extract::<DSTS::Register>(Reg::Dsts);
        let speed = match dsts.read_as_enum::<DSTS::ENUMSPD::Value>(DSTS::ENUMSPD) {
            Some(DSTS::ENUMSPD::Value::HighSpeed) => DeviceSpeed::High,
            Some(DSTS::ENUMSPD::Value::LowSpeed) => DeviceSpeed::Low,
            _ => DeviceSpeed::Full,
        };
        self.speed.set(speed);

        // MPSIZ 0 on endpoint 0 selects 64 byte packets
        self.registers.modify(Reg::Diepctl(0), DIEPCTL::MPSIZ.val(0));
        self.registers.modify(Reg::Doepctl(0), DOEPCTL::MPSIZ.val(0));
        self.registers.modify(Reg::Dctl, DCTL::CGINAK::SET);
        self.registers
            .modify(Reg::Gusbcfg, GUSBCFG::TRDT.val(TURNAROUND_TIME));
        self.registers
            .write_fields(Reg::Daintmsk, DAINTMSK::IEPM.val(1) + DAINTMSK::OEPM.val(1));
        self.registers.modify(Reg::Diepctl(0), DIEPCTL::USBAEP::SET);
        self.registers.modify(Reg::Doepctl(0), DOEPCTL::USBAEP::SET);
        self.registers.write(Reg::Diepint(0), EP_INT_CLEAR_ALL);

        self.state.set(next);
    }

    fn suspend(&self) {
        if let Some(next) = self.transition(Trigger::Suspend) {
            self.resume_state.set(self.state.get());
            self.state.set(next);
        }
    }

    fn wakeup(&self) {
        self.registers.modify(Reg::Dctl, DCTL::RWUSIG::CLEAR);
        if self.state.get() == DeviceState::Suspended {
            self.state.set(self.resume_state.get());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Event;
    use std::vec::Vec;

    #[test]
    fn decode_in_service_order() {
        // IEPINT, OEPINT, USBRST and SRQINT
        let status = (1 << 18) | (1 << 19) | (1 << 12) | (1 << 30);
        let events: Vec<Event> = Event::decode(status).collect();
        assert_eq!(
            events,
            [
                Event::SessionRequest,
                Event::UsbReset,
                Event::OutEndpoint,
                Event::InEndpoint
            ]
        );
    }

    #[test]
    fn decode_ignores_unknown_bits() {
        assert_eq!(Event::decode(0).count(), 0);
        // CMOD, NPTXFE and PTXFE have no event
        assert_eq!(Event::decode((1 << 0) | (1 << 5) | (1 << 26)).count(), 0);
    }

    #[test]
    fn masks_are_single_bits() {
        for event in Event::ORDER {
            assert_eq!(event.mask().count_ones(), 1, "{:?}", event);
        }
        assert_eq!(Event::ModeMismatch.mask(), 1 << 1);
        assert_eq!(Event::Wakeup.mask(), 1 << 31);
        assert_eq!(Event::known_mask().count_ones(), 11);
    }
}
