// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! USB on-the-go full-speed (OTG_FS), device mode.
//!
//! The driver enumerates the device on endpoint 0: it follows the bus from
//! power-up through reset and speed enumeration, receives SETUP packets, and
//! answers SET_ADDRESS and GET_DESCRIPTOR for the device and configuration
//! descriptors supplied through a [`DescriptorTable`]. Host mode is not
//! supported, and neither is data movement on endpoints other than 0.
//!
//! Everything runs from [`UsbOtg::handle_interrupt`], called by the chip's
//! `InterruptService` for the OTG_FS interrupt. Clocks and the DM/DP pins
//! must be configured by the board before [`UsbOtg::init`].
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let usb = static_init!(
//!     UsbOtg<'static, OtgFsRegisters>,
//!     UsbOtg::new(OtgFsRegisters::new(), &KEYBOARD_DESCRIPTORS)
//! );
//! usb.init(&UsbInit::default())?;
//! ```

use core::cell::Cell;

use kernel::config::CONFIG;
use kernel::hil::usb::{DescriptorTable, DeviceSpeed};
use kernel::utilities::cells::OptionalCell;
use kernel::ErrorCode;

/// Halt on a broken invariant. With `debug_panics` disabled the message and
/// its formatting code are left out.
macro_rules! internal_err {
    [ $( $arg:expr ),+ $(,)? ] => {
        if kernel::config::CONFIG.debug_panics {
            panic!($( $arg ),+)
        } else {
            panic!("usb_otg: internal error")
        }
    };
}

mod control;
mod dispatch;
mod endpoint;
mod fifo;
mod registers;
mod rx;
mod setup;
mod state;

#[cfg(test)]
mod fake;

pub use self::control::UnsupportedPolicy;
pub use self::dispatch::Event;
pub use self::fifo::SpinLimit;
pub use self::registers::{OtgFsRegisters, Reg, RegisterInterface, NUM_ENDPOINTS};
pub use self::rx::{RxStatus, RxStatusKind};
pub use self::setup::{Recipient, RequestKind, SetupPacket, TransferDirection};
pub use self::state::{DeviceState, Trigger};

use self::registers::{
    DCFG, DCTL, DIEPCTL, DIEPTXF, DOEPCTL, EP_INT_CLEAR_ALL, GAHBCFG, GCCFG, GINTMSK, GINTSTS,
    GRSTCTL, GRXFSIZ, GUSBCFG,
};

/// bMaxPacketSize0, and the size of the control transmit buffer.
pub const MAX_CTRL_PACKET_SIZE: usize = 64;

/// RX FIFO depth, in words.
const RX_FIFO_WORDS: u32 = 128;
/// Endpoint 0 TX FIFO depth, in words.
const EP0_TX_FIFO_WORDS: u32 = 64;

/// Runtime options for [`UsbOtg::init`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UsbInit {
    /// Whether VBUS is wired to PA9. When it is, the device stays
    /// soft-disconnected until the core reports a valid B-session. When it is
    /// not, the device connects as soon as it is initialized.
    pub vbus_sensing: bool,
    /// Bound on waits for the core to finish a reset or FIFO flush.
    pub spin_limit: SpinLimit,
    /// Response to requests and descriptors the driver does not serve.
    pub unsupported: UnsupportedPolicy,
}

impl Default for UsbInit {
    fn default() -> Self {
        UsbInit {
            vbus_sensing: false,
            spin_limit: SpinLimit::Forever,
            unsupported: UnsupportedPolicy::Stall,
        }
    }
}

pub struct UsbOtg<'a, R: RegisterInterface = OtgFsRegisters> {
    registers: R,
    descriptors: &'a dyn DescriptorTable,
    state: Cell<DeviceState>,
    /// State to return to on wakeup.
    resume_state: Cell<DeviceState>,
    address: Cell<u8>,
    speed: OptionalCell<DeviceSpeed>,
    setup: Cell<SetupPacket>,
    ctrl_buffer: Cell<[u8; MAX_CTRL_PACKET_SIZE]>,
    ctrl_len: Cell<usize>,
    spin_limit: Cell<SpinLimit>,
    unsupported_policy: Cell<UnsupportedPolicy>,
}

impl<'a, R: RegisterInterface> UsbOtg<'a, R> {
    pub fn new(registers: R, descriptors: &'a dyn DescriptorTable) -> Self {
        UsbOtg {
            registers,
            descriptors,
            state: Cell::new(DeviceState::Uninitialized),
            resume_state: Cell::new(DeviceState::Uninitialized),
            address: Cell::new(0),
            speed: OptionalCell::empty(),
            setup: Cell::new(SetupPacket::default()),
            ctrl_buffer: Cell::new([0; MAX_CTRL_PACKET_SIZE]),
            ctrl_len: Cell::new(0),
            spin_limit: Cell::new(SpinLimit::Forever),
            unsupported_policy: Cell::new(UnsupportedPolicy::Stall),
        }
    }

    /// Bring the core up in device mode.
    ///
    /// Returns `BUSY` if the core does not finish its soft reset or a FIFO
    /// flush within `config.spin_limit`.
    pub fn init(&self, config: &UsbInit) -> Result<(), ErrorCode> {
        self.spin_limit.set(config.spin_limit);
        self.unsupported_policy.set(config.unsupported);
        self.state.set(DeviceState::Uninitialized);

        // Embedded full-speed PHY, then core soft reset
        self.registers.modify(Reg::Gusbcfg, GUSBCFG::PHYSEL::SET);
        self.spin_until(|| self.registers.is_set(Reg::Grstctl, GRSTCTL::AHBIDL))?;
        self.registers.write_fields(Reg::Grstctl, GRSTCTL::CSRST::SET);
        self.spin_until(|| !self.registers.is_set(Reg::Grstctl, GRSTCTL::CSRST))?;
        self.registers.modify(Reg::Gccfg, GCCFG::PWRDWN::SET);

        self.registers
            .modify(Reg::Gusbcfg, GUSBCFG::FHMOD::CLEAR + GUSBCFG::FDMOD::SET);
        self.spin_until(|| !self.registers.is_set(Reg::Gintsts, GINTSTS::CMOD))?;

        for ep in 1..NUM_ENDPOINTS {
            self.registers.write(Reg::Dieptxf(ep), 0);
        }

        if config.vbus_sensing {
            self.registers.modify(Reg::Dctl, DCTL::SDIS::SET);
            self.registers.modify(
                Reg::Gccfg,
                GCCFG::VBUSBSEN::SET + GCCFG::NOVBUSSENS::CLEAR,
            );
        } else {
            self.registers.modify(
                Reg::Gccfg,
                GCCFG::NOVBUSSENS::SET + GCCFG::VBUSBSEN::CLEAR + GCCFG::VBUSASEN::CLEAR,
            );
        }

        // Restart the PHY clock
        self.registers.write(Reg::Pcgcctl, 0);
        self.registers.modify(Reg::Dcfg, DCFG::DSPD::FullSpeed);

        self.flush_tx()?;
        self.flush_rx()?;

        self.registers.write(Reg::Diepmsk, 0);
        self.registers.write(Reg::Doepmsk, 0);
        self.registers.write(Reg::Daintmsk, 0);

        if self.registers.is_set(Reg::Diepctl(0), DIEPCTL::EPENA) {
            self.registers
                .write_fields(Reg::Diepctl(0), DIEPCTL::EPDIS::SET + DIEPCTL::SNAK::SET);
        } else {
            self.registers.write(Reg::Diepctl(0), 0);
        }
        self.registers.write(Reg::Dieptsiz(0), 0);
        self.registers.write(Reg::Diepint(0), EP_INT_CLEAR_ALL);

        if self.registers.is_set(Reg::Doepctl(0), DOEPCTL::EPENA) {
            self.registers
                .write_fields(Reg::Doepctl(0), DOEPCTL::EPDIS::SET + DOEPCTL::SNAK::SET);
        } else {
            self.registers.write(Reg::Doepctl(0), 0);
        }
        self.registers.write(Reg::Doeptsiz(0), 0);
        self.registers.write(Reg::Doepint(0), EP_INT_CLEAR_ALL);

        self.registers.write(Reg::Gintmsk, 0);
        // A session request raised once VBUS sensing came on stays pending
        self.registers
            .write(Reg::Gintsts, u32::MAX & !Event::SessionRequest.mask());
        let session = if config.vbus_sensing {
            GINTMSK::SRQIM::SET + GINTMSK::OTGINT::SET
        } else {
            GINTMSK::SRQIM::CLEAR + GINTMSK::OTGINT::CLEAR
        };
        let mask = GINTMSK::USBRST::SET
            + GINTMSK::ENUMDNEM::SET
            + GINTMSK::IEPINT::SET
            + GINTMSK::OEPINT::SET
            + GINTMSK::RXFLVLM::SET
            + GINTMSK::SOFM::SET
            + GINTMSK::MMISM::SET
            + GINTMSK::USBSUSPM::SET
            + GINTMSK::WUIM::SET
            + session;
        self.registers.write_fields(Reg::Gintmsk, mask);

        self.registers
            .write_fields(Reg::Grxfsiz, GRXFSIZ::RXFD.val(RX_FIFO_WORDS));
        self.registers.write_fields(
            Reg::Dieptxf0,
            DIEPTXF::INEPTXFD.val(EP0_TX_FIFO_WORDS) + DIEPTXF::INEPTXSA.val(RX_FIFO_WORDS),
        );

        self.registers.modify(Reg::Gahbcfg, GAHBCFG::GINT::SET);

        if !config.vbus_sensing {
            self.registers.modify(Reg::Dctl, DCTL::SDIS::CLEAR);
            self.state.set(DeviceState::Powered);
        }
        Ok(())
    }

    pub fn registers(&self) -> &R {
        &self.registers
    }

    pub fn state(&self) -> DeviceState {
        self.state.get()
    }

    /// Bus address assigned by the host, 0 until SET_ADDRESS.
    pub fn address(&self) -> u8 {
        self.address.get()
    }

    /// Speed negotiated at the last enumeration, if there was one.
    pub fn speed(&self) -> Option<DeviceSpeed> {
        self.speed.map(|speed| *speed)
    }

    /// The most recent SETUP packet received on endpoint 0.
    pub fn setup_packet(&self) -> SetupPacket {
        self.setup.get()
    }

    /// The last control response staged for transmission.
    pub fn ctrl_response(&self) -> ([u8; MAX_CTRL_PACKET_SIZE], usize) {
        (self.ctrl_buffer.get(), self.ctrl_len.get())
    }

    fn trace(&self) -> bool {
        CONFIG.trace_usb
    }

    /// Halt if a wait the interrupt path cannot back out of timed out.
    fn complete_or_halt(&self, result: Result<(), ErrorCode>, what: &str) {
        if let Err(e) = result {
            internal_err!("usb_otg: {} did not complete: {:?}", what, e);
        }
    }
}
