// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! OTG_FS register map (RM0383, section 22.16) and the access seam the
//! driver core uses.
//!
//! The core never dereferences the register block directly. It names
//! registers with [`Reg`] and goes through [`RegisterInterface`], which
//! [`OtgFsRegisters`] implements on top of MMIO. Typed field access is layered
//! on raw words with `LocalRegisterCopy`, so the same core runs against the
//! hardware and against a test double.

use kernel::utilities::registers::interfaces::{Readable, Writeable};
use kernel::utilities::registers::{
    register_bitfields, register_structs, Field, FieldValue, LocalRegisterCopy, ReadOnly,
    ReadWrite, RegisterLongName,
};
use kernel::utilities::StaticRef;

/// Number of bidirectional endpoints implemented by the STM32F411 OTG_FS core.
pub const NUM_ENDPOINTS: usize = 4;

/// Written to DIEPINTx/DOEPINTx to clear every pending endpoint flag.
pub const EP_INT_CLEAR_ALL: u32 = 0xFB7F;

register_structs! {
    pub OtgFsRegisterBlock {
        // Core global registers
        (0x000 => gotgctl: ReadWrite<u32, GOTGCTL::Register>),
        (0x004 => gotgint: ReadWrite<u32, GOTGINT::Register>),
        (0x008 => gahbcfg: ReadWrite<u32, GAHBCFG::Register>),
        (0x00C => gusbcfg: ReadWrite<u32, GUSBCFG::Register>),
        (0x010 => grstctl: ReadWrite<u32, GRSTCTL::Register>),
        (0x014 => gintsts: ReadWrite<u32, GINTSTS::Register>),
        (0x018 => gintmsk: ReadWrite<u32, GINTMSK::Register>),
        (0x01C => _reserved0),
        (0x020 => grxstsp: ReadOnly<u32, GRXSTSP::Register>),
        (0x024 => grxfsiz: ReadWrite<u32, GRXFSIZ::Register>),
        (0x028 => dieptxf0: ReadWrite<u32, DIEPTXF::Register>),
        (0x02C => _reserved1),
        (0x038 => gccfg: ReadWrite<u32, GCCFG::Register>),
        (0x03C => _reserved2),
        (0x104 => dieptxf: [ReadWrite<u32, DIEPTXF::Register>; 3]),
        (0x110 => _reserved3),
        // Device mode registers
        (0x800 => dcfg: ReadWrite<u32, DCFG::Register>),
        (0x804 => dctl: ReadWrite<u32, DCTL::Register>),
        (0x808 => dsts: ReadOnly<u32, DSTS::Register>),
        (0x80C => _reserved4),
        (0x810 => diepmsk: ReadWrite<u32, DIEPMSK::Register>),
        (0x814 => doepmsk: ReadWrite<u32, DOEPMSK::Register>),
        (0x818 => daint: ReadOnly<u32, DAINT::Register>),
        (0x81C => daintmsk: ReadWrite<u32, DAINTMSK::Register>),
        (0x820 => _reserved5),
        (0x900 => in_endpoints: [InEndpointRegisters; NUM_ENDPOINTS]),
        (0x980 => _reserved6),
        (0xB00 => out_endpoints: [OutEndpointRegisters; NUM_ENDPOINTS]),
        (0xB80 => _reserved7),
        // Power and clock gating
        (0xE00 => pcgcctl: ReadWrite<u32, PCGCCTL::Register>),
        (0xE04 => @END),
    },

    InEndpointRegisters {
        (0x00 => diepctl: ReadWrite<u32, DIEPCTL::Register>),
        (0x04 => _reserved0),
        (0x08 => diepint: ReadWrite<u32, DIEPINT::Register>),
        (0x0C => _reserved1),
        (0x10 => dieptsiz: ReadWrite<u32, DIEPTSIZ::Register>),
        (0x14 => _reserved2),
        (0x18 => dtxfsts: ReadOnly<u32, DTXFSTS::Register>),
        (0x1C => _reserved3),
        (0x20 => @END),
    },

    OutEndpointRegisters {
        (0x00 => doepctl: ReadWrite<u32, DOEPCTL::Register>),
        (0x04 => _reserved0),
        (0x08 => doepint: ReadWrite<u32, DOEPINT::Register>),
        (0x0C => _reserved1),
        (0x10 => doeptsiz: ReadWrite<u32, DOEPTSIZ::Register>),
        (0x14 => _reserved2),
        (0x20 => @END),
    },

    // One endpoint's data FIFO window. Every word in the window aliases the
    // same push/pop port; the driver only uses the first.
    DataFifo {
        (0x000 => port: ReadWrite<u32>),
        (0x004 => _reserved),
        (0x1000 => @END),
    }
}

register_bitfields![u32,
    pub GOTGCTL [
        /// B-session valid
        BSVLD OFFSET(19) NUMBITS(1) [],
        /// A-session valid
        ASVLD OFFSET(18) NUMBITS(1) []
    ],
    pub GOTGINT [
        /// Session end detected
        SEDET OFFSET(2) NUMBITS(1) []
    ],
    pub GAHBCFG [
        /// Global interrupt mask
        GINT OFFSET(0) NUMBITS(1) []
    ],
    pub GUSBCFG [
        /// Force device mode
        FDMOD OFFSET(30) NUMBITS(1) [],
        /// Force host mode
        FHMOD OFFSET(29) NUMBITS(1) [],
        /// USB turnaround time, in PHY clocks
        TRDT OFFSET(10) NUMBITS(4) [],
        /// Full-speed serial transceiver select (always set on OTG_FS)
        PHYSEL OFFSET(6) NUMBITS(1) []
    ],
    pub GRSTCTL [
        /// AHB master idle
        AHBIDL OFFSET(31) NUMBITS(1) [],
        /// TX FIFO number to flush
        TXFNUM OFFSET(6) NUMBITS(5) [
            Fifo0 = 0x00,
            AllFifos = 0x10
        ],
        TXFFLSH OFFSET(5) NUMBITS(1) [],
        RXFFLSH OFFSET(4) NUMBITS(1) [],
        /// Core soft reset
        CSRST OFFSET(0) NUMBITS(1) []
    ],
    pub GINTSTS [
        WKUPINT OFFSET(31) NUMBITS(1) [],
        SRQINT OFFSET(30) NUMBITS(1) [],
        OEPINT OFFSET(19) NUMBITS(1) [],
        IEPINT OFFSET(18) NUMBITS(1) [],
        ENUMDNE OFFSET(13) NUMBITS(1) [],
        USBRST OFFSET(12) NUMBITS(1) [],
        USBSUSP OFFSET(11) NUMBITS(1) [],
        ESUSP OFFSET(10) NUMBITS(1) [],
        RXFLVL OFFSET(4) NUMBITS(1) [],
        SOF OFFSET(3) NUMBITS(1) [],
        OTGINT OFFSET(2) NUMBITS(1) [],
        MMIS OFFSET(1) NUMBITS(1) [],
        /// Current mode of operation, set in host mode
        CMOD OFFSET(0) NUMBITS(1) []
    ],
    pub GINTMSK [
        WUIM OFFSET(31) NUMBITS(1) [],
        SRQIM OFFSET(30) NUMBITS(1) [],
        OEPINT OFFSET(19) NUMBITS(1) [],
        IEPINT OFFSET(18) NUMBITS(1) [],
        ENUMDNEM OFFSET(13) NUMBITS(1) [],
        USBRST OFFSET(12) NUMBITS(1) [],
        USBSUSPM OFFSET(11) NUMBITS(1) [],
        RXFLVLM OFFSET(4) NUMBITS(1) [],
        SOFM OFFSET(3) NUMBITS(1) [],
        OTGINT OFFSET(2) NUMBITS(1) [],
        MMISM OFFSET(1) NUMBITS(1) []
    ],
    pub GRXSTSP [
        /// Packet status
        PKTSTS OFFSET(17) NUMBITS(4) [
            GlobalOutNak = 1,
            OutDataReceived = 2,
            OutTransferCompleted = 3,
            SetupTransactionCompleted = 4,
            SetupDataReceived = 6
        ],
        /// Data PID
        DPID OFFSET(15) NUMBITS(2) [],
        /// Byte count
        BCNT OFFSET(4) NUMBITS(11) [],
        /// Endpoint number
        EPNUM OFFSET(0) NUMBITS(4) []
    ],
    pub GRXFSIZ [
        /// RX FIFO depth, in words
        RXFD OFFSET(0) NUMBITS(16) []
    ],
    pub DIEPTXF [
        /// TX FIFO depth, in words
        INEPTXFD OFFSET(16) NUMBITS(16) [],
        /// TX FIFO start address, in words
        INEPTXSA OFFSET(0) NUMBITS(16) []
    ],
    pub GCCFG [
        NOVBUSSENS OFFSET(21) NUMBITS(1) [],
        SOFOUTEN OFFSET(20) NUMBITS(1) [],
        VBUSBSEN OFFSET(19) NUMBITS(1) [],
        VBUSASEN OFFSET(18) NUMBITS(1) [],
        /// Transceiver enabled when set
        PWRDWN OFFSET(16) NUMBITS(1) []
    ],
    pub DCFG [
        /// Device address
        DAD OFFSET(4) NUMBITS(7) [],
        /// Device speed
        DSPD OFFSET(0) NUMBITS(2) [
            FullSpeed = 0b11
        ]
    ],
    pub DCTL [
        CGINAK OFFSET(8) NUMBITS(1) [],
        SGINAK OFFSET(7) NUMBITS(1) [],
        /// Soft disconnect
        SDIS OFFSET(1) NUMBITS(1) [],
        /// Remote wakeup signaling
        RWUSIG OFFSET(0) NUMBITS(1) []
    ],
    pub DSTS [
        /// Enumerated speed
        ENUMSPD OFFSET(1) NUMBITS(2) [
            HighSpeed = 0b00,
            FullSpeedUlpi = 0b01,
            LowSpeed = 0b10,
            FullSpeed = 0b11
        ],
        SUSPSTS OFFSET(0) NUMBITS(1) []
    ],
    pub DIEPMSK [
        TOM OFFSET(3) NUMBITS(1) [],
        EPDM OFFSET(1) NUMBITS(1) [],
        XFRCM OFFSET(0) NUMBITS(1) []
    ],
    pub DOEPMSK [
        NAKM OFFSET(13) NUMBITS(1) [],
        OTEPSPRM OFFSET(5) NUMBITS(1) [],
        OTEPDM OFFSET(4) NUMBITS(1) [],
        STUPM OFFSET(3) NUMBITS(1) [],
        EPDM OFFSET(1) NUMBITS(1) [],
        XFRCM OFFSET(0) NUMBITS(1) []
    ],
    pub DAINT [
        OEPINT OFFSET(16) NUMBITS(16) [],
        IEPINT OFFSET(0) NUMBITS(16) []
    ],
    pub DAINTMSK [
        OEPM OFFSET(16) NUMBITS(16) [],
        IEPM OFFSET(0) NUMBITS(16) []
    ],
    pub DIEPCTL [
        EPENA OFFSET(31) NUMBITS(1) [],
        EPDIS OFFSET(30) NUMBITS(1) [],
        SNAK OFFSET(27) NUMBITS(1) [],
        CNAK OFFSET(26) NUMBITS(1) [],
        TXFNUM OFFSET(22) NUMBITS(4) [],
        STALL OFFSET(21) NUMBITS(1) [],
        USBAEP OFFSET(15) NUMBITS(1) [],
        /// Maximum packet size. On endpoint 0 only bits 0..1 exist and
        /// zero selects 64 bytes.
        MPSIZ OFFSET(0) NUMBITS(11) []
    ],
    pub DIEPINT [
        NAK OFFSET(13) NUMBITS(1) [],
        PKTDRPSTS OFFSET(11) NUMBITS(1) [],
        TXFE OFFSET(7) NUMBITS(1) [],
        INEPNE OFFSET(6) NUMBITS(1) [],
        ITTXFE OFFSET(4) NUMBITS(1) [],
        TOC OFFSET(3) NUMBITS(1) [],
        EPDISD OFFSET(1) NUMBITS(1) [],
        XFRC OFFSET(0) NUMBITS(1) []
    ],
    pub DIEPTSIZ [
        PKTCNT OFFSET(19) NUMBITS(10) [],
        XFRSIZ OFFSET(0) NUMBITS(19) []
    ],
    pub DTXFSTS [
        /// Free space in the endpoint's TX FIFO, in words
        INEPTFSAV OFFSET(0) NUMBITS(16) []
    ],
    pub DOEPCTL [
        EPENA OFFSET(31) NUMBITS(1) [],
        EPDIS OFFSET(30) NUMBITS(1) [],
        SNAK OFFSET(27) NUMBITS(1) [],
        CNAK OFFSET(26) NUMBITS(1) [],
        STALL OFFSET(21) NUMBITS(1) [],
        USBAEP OFFSET(15) NUMBITS(1) [],
        MPSIZ OFFSET(0) NUMBITS(11) []
    ],
    pub DOEPINT [
        NAK OFFSET(13) NUMBITS(1) [],
        OTEPDIS OFFSET(4) NUMBITS(1) [],
        STUP OFFSET(3) NUMBITS(1) [],
        EPDISD OFFSET(1) NUMBITS(1) [],
        XFRC OFFSET(0) NUMBITS(1) []
    ],
    pub DOEPTSIZ [
        /// Number of back-to-back SETUP packets the endpoint can take
        STUPCNT OFFSET(29) NUMBITS(2) [],
        PKTCNT OFFSET(19) NUMBITS(10) [],
        XFRSIZ OFFSET(0) NUMBITS(19) []
    ],
    pub PCGCCTL [
        PHYSUSP OFFSET(4) NUMBITS(1) [],
        GATEHCLK OFFSET(1) NUMBITS(1) [],
        STPPCLK OFFSET(0) NUMBITS(1) []
    ]
];

const USB_OTG_FS_BASE: StaticRef<OtgFsRegisterBlock> =
    unsafe { StaticRef::new(0x5000_0000 as *const OtgFsRegisterBlock) };

const USB_OTG_FS_FIFOS: StaticRef<[DataFifo; NUM_ENDPOINTS]> =
    unsafe { StaticRef::new(0x5000_1000 as *const [DataFifo; NUM_ENDPOINTS]) };

/// Every OTG_FS register the driver core touches.
///
/// Per-endpoint variants carry the endpoint number. `Dieptxf(n)` is the TX
/// FIFO size register of IN endpoint `n` (1 to 3); endpoint 0 has its own
/// `Dieptxf0`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reg {
    Gotgctl,
    Gotgint,
    Gahbcfg,
    Gusbcfg,
    Grstctl,
    Gintsts,
    Gintmsk,
    Grxstsp,
    Grxfsiz,
    Dieptxf0,
    Gccfg,
    Dieptxf(usize),
    Dcfg,
    Dctl,
    Dsts,
    Diepmsk,
    Doepmsk,
    Daint,
    Daintmsk,
    Diepctl(usize),
    Diepint(usize),
    Dieptsiz(usize),
    Dtxfsts(usize),
    Doepctl(usize),
    Doepint(usize),
    Doeptsiz(usize),
    Pcgcctl,
}

/// The word that results from writing `field` into an all-zero register.
pub fn field_bits<R: RegisterLongName>(field: FieldValue<u32, R>) -> u32 {
    let mut value: LocalRegisterCopy<u32, R> = LocalRegisterCopy::new(0);
    value.modify(field);
    value.get()
}

/// Register and FIFO access used by the driver core.
///
/// Reading `Reg::Grxstsp` pops the receive status queue. Writes to GINTSTS,
/// GOTGINT, DIEPINTx and DOEPINTx clear the bits that are written as one.
pub trait RegisterInterface {
    fn read(&self, reg: Reg) -> u32;
    fn write(&self, reg: Reg, value: u32);

    /// Push one word into the TX FIFO of IN endpoint `endpoint`.
    fn fifo_push(&self, endpoint: usize, word: u32);

    /// Pop one word from the shared RX FIFO. The hardware routes reads of any
    /// endpoint window to the same queue; `endpoint` selects the window.
    fn fifo_pop(&self, endpoint: usize) -> u32;

    fn extract<R: RegisterLongName>(&self, reg: Reg) -> LocalRegisterCopy<u32, R> {
        LocalRegisterCopy::new(self.read(reg))
    }

    fn is_set<R: RegisterLongName>(&self, reg: Reg, field: Field<u32, R>) -> bool {
        self.extract(reg).is_set(field)
    }

    fn read_field<R: RegisterLongName>(&self, reg: Reg, field: Field<u32, R>) -> u32 {
        self.extract(reg).read(field)
    }

    /// Read-modify-write. Never use on write-1-to-clear registers, it would
    /// clear every pending flag.
    fn modify<R: RegisterLongName>(&self, reg: Reg, field: FieldValue<u32, R>) {
        let mut value = self.extract(reg);
        value.modify(field);
        self.write(reg, value.get());
    }

    /// Write `field`, with every other bit zero.
    fn write_fields<R: RegisterLongName>(&self, reg: Reg, field: FieldValue<u32, R>) {
        self.write(reg, field_bits(field));
    }
}

/// The OTG_FS peripheral at its MMIO address.
pub struct OtgFsRegisters {
    registers: StaticRef<OtgFsRegisterBlock>,
    fifos: StaticRef<[DataFifo; NUM_ENDPOINTS]>,
}

impl OtgFsRegisters {
    pub const fn new() -> Self {
        Self {
            registers: USB_OTG_FS_BASE,
            fifos: USB_OTG_FS_FIFOS,
        }
    }
}

impl RegisterInterface for OtgFsRegisters {
    fn read(&self, reg: Reg) -> u32 {
        let regs = &*self.registers;
        match reg {
            Reg::Gotgctl => regs.gotgctl.get(),
            Reg::Gotgint => regs.gotgint.get(),
            Reg::Gahbcfg => regs.gahbcfg.get(),
            Reg::Gusbcfg => regs.gusbcfg.get(),
            Reg::Grstctl => regs.grstctl.get(),
            Reg::Gintsts => regs.gintsts.get(),
            Reg::Gintmsk => regs.gintmsk.get(),
            Reg::Grxstsp => regs.grxstsp.get(),
            Reg::Grxfsiz => regs.grxfsiz.get(),
            Reg::Dieptxf0 => regs.dieptxf0.get(),
            Reg::Gccfg => regs.gccfg.get(),
            Reg::Dieptxf(n) => regs.dieptxf[n - 1].get(),
            Reg::Dcfg => regs.dcfg.get(),
            Reg::Dctl => regs.dctl.get(),
            Reg::Dsts => regs.dsts.get(),
            Reg::Diepmsk => regs.diepmsk.get(),
            Reg::Doepmsk => regs.doepmsk.get(),
            Reg::Daint => regs.daint.get(),
            Reg::Daintmsk => regs.daintmsk.get(),
            Reg::Diepctl(n) => regs.in_endpoints[n].diepctl.get(),
            Reg::Diepint(n) => regs.in_endpoints[n].diepint.get(),
            Reg::Dieptsiz(n) => regs.in_endpoints[n].dieptsiz.get(),
            Reg::Dtxfsts(n) => regs.in_endpoints[n].dtxfsts.get(),
            Reg::Doepctl(n) => regs.out_endpoints[n].doepctl.get(),
            Reg::Doepint(n) => regs.out_endpoints[n].doepint.get(),
            Reg::Doeptsiz(n) => regs.out_endpoints[n].doeptsiz.get(),
            Reg::Pcgcctl => regs.pcgcctl.get(),
        }
    }

    fn write(&self, reg: Reg, value: u32) {
        let regs = &*self.registers;
        match reg {
            Reg::Gotgctl => regs.gotgctl.set(value),
            Reg::Gotgint => regs.gotgint.set(value),
            Reg::Gahbcfg => regs.gahbcfg.set(value),
            Reg::Gusbcfg => regs.gusbcfg.set(value),
            Reg::Grstctl => regs.grstctl.set(value),
            Reg::Gintsts => regs.gintsts.set(value),
            Reg::Gintmsk => regs.gintmsk.set(value),
            Reg::Grxfsiz => regs.grxfsiz.set(value),
            Reg::Dieptxf0 => regs.dieptxf0.set(value),
            Reg::Gccfg => regs.gccfg.set(value),
            Reg::Dieptxf(n) => regs.dieptxf[n - 1].set(value),
            Reg::Dcfg => regs.dcfg.set(value),
            Reg::Dctl => regs.dctl.set(value),
            Reg::Diepmsk => regs.diepmsk.set(value),
            Reg::Doepmsk => regs.doepmsk.set(value),
            Reg::Daintmsk => regs.daintmsk.set(value),
            Reg::Diepctl(n) => regs.in_endpoints[n].diepctl.set(value),
            Reg::Diepint(n) => regs.in_endpoints[n].diepint.set(value),
            Reg::Dieptsiz(n) => regs.in_endpoints[n].dieptsiz.set(value),
            Reg::Doepctl(n) => regs.out_endpoints[n].doepctl.set(value),
            Reg::Doepint(n) => regs.out_endpoints[n].doepint.set(value),
            Reg::Doeptsiz(n) => regs.out_endpoints[n].doeptsiz.set(value),
            Reg::Pcgcctl => regs.pcgcctl.set(value),
            Reg::Grxstsp | Reg::Dsts | Reg::Daint | Reg::Dtxfsts(_) => {
                internal_err!("write to read-only OTG_FS register {:?}", reg)
            }
        }
    }

    fn fifo_push(&self, endpoint: usize, word: u32) {
        self.fifos[endpoint].port.set(word);
    }

    fn fifo_pop(&self, endpoint: usize) -> u32 {
        self.fifos[endpoint].port.get()
    }
}
