// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! In-memory OTG_FS double for host tests.

use core::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::vec::Vec;

use super::registers::{field_bits, RegisterInterface, Reg, GRSTCTL};

/// Records every register write and FIFO push made by the driver.
///
/// Models the register behavior the driver depends on: interrupt flag
/// registers clear on writing one, the flush and soft reset bits of GRSTCTL
/// complete immediately, GRXSTSP and the RX FIFO pop queued words, and
/// everything else reads back the last value written or preset.
pub struct FakeOtg {
    values: RefCell<HashMap<Reg, u32>>,
    writes: RefCell<Vec<(Reg, u32)>>,
    pushed: RefCell<Vec<(usize, u32)>>,
    rx_status: RefCell<VecDeque<u32>>,
    rx_fifo: RefCell<VecDeque<u32>>,
    ahb_idle: Cell<bool>,
}

impl FakeOtg {
    pub fn new() -> FakeOtg {
        FakeOtg {
            values: RefCell::new(HashMap::new()),
            writes: RefCell::new(Vec::new()),
            pushed: RefCell::new(Vec::new()),
            rx_status: RefCell::new(VecDeque::new()),
            rx_fifo: RefCell::new(VecDeque::new()),
            ahb_idle: Cell::new(true),
        }
    }

    /// Set a register as hardware would, without logging a write.
    pub fn preset(&self, reg: Reg, value: u32) {
        self.values.borrow_mut().insert(reg, value);
    }

    pub fn value(&self, reg: Reg) -> u32 {
        self.values.borrow().get(&reg).copied().unwrap_or(0)
    }

    pub fn set_ahb_idle(&self, idle: bool) {
        self.ahb_idle.set(idle);
    }

    /// Queue one RX status word followed by its payload words.
    pub fn queue_rx(&self, status: u32, payload: &[u32]) {
        self.rx_status.borrow_mut().push_back(status);
        self.rx_fifo.borrow_mut().extend(payload.iter().copied());
    }

    pub fn rx_words_left(&self) -> usize {
        self.rx_fifo.borrow().len()
    }

    pub fn writes(&self) -> Vec<(Reg, u32)> {
        self.writes.borrow().clone()
    }

    pub fn writes_to(&self, reg: Reg) -> Vec<u32> {
        self.writes
            .borrow()
            .iter()
            .filter(|(r, _)| *r == reg)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Words pushed into any TX FIFO, in order.
    pub fn pushed(&self) -> Vec<u32> {
        self.pushed.borrow().iter().map(|(_, w)| *w).collect()
    }

    pub fn clear_log(&self) {
        self.writes.borrow_mut().clear();
        self.pushed.borrow_mut().clear();
    }
}

impl RegisterInterface for FakeOtg {
    fn read(&self, reg: Reg) -> u32 {
        match reg {
            Reg::Grxstsp => self.rx_status.borrow_mut().pop_front().unwrap_or(0),
            Reg::Grstctl if self.ahb_idle.get() => {
                self.value(reg) | field_bits(GRSTCTL::AHBIDL::SET)
            }
            _ => self.value(reg),
        }
    }

    fn write(&self, reg: Reg, value: u32) {
        self.writes.borrow_mut().push((reg, value));
        let stored = match reg {
            Reg::Gintsts | Reg::Gotgint | Reg::Diepint(_) | Reg::Doepint(_) => {
                self.value(reg) & !value
            }
            Reg::Grstctl => {
                value
                    & !field_bits(
                        GRSTCTL::TXFFLSH::SET + GRSTCTL::RXFFLSH::SET + GRSTCTL::CSRST::SET,
                    )
            }
            _ => value,
        };
        self.preset(reg, stored);
    }

    fn fifo_push(&self, endpoint: usize, word: u32) {
        self.pushed.borrow_mut().push((endpoint, word));
    }

    fn fifo_pop(&self, _endpoint: usize) -> u32 {
        self.rx_fifo.borrow_mut().pop_front().unwrap_or(0)
    }
}
