//! Tock Cell types.

#![no_std]

pub mod optional_cell;
pub mod take_cell;
