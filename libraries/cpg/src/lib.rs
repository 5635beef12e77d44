// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! # CPG
//!
//! A table-driven engine for the Clock Pulse Generator found on Renesas
//! RZ/G2L-family SoCs. The CPG block derives every on-chip clock from a
//! few oscillator inputs through PLLs, fixed factors, muxes and dividers,
//! gates each peripheral clock individually and drives the module reset
//! lines.
//!
//! The chip is described entirely by constant data: a [`CpgInfo`] lists the
//! clock nodes (parents first), the reset lines and the clocks that must
//! stay on. [`Cpg`] resolves the table into a graph once and then offers
//! rate queries, rate changes, reference-counted enable/disable and reset
//! control.
//!
//! ## Hardware model
//!
//! Control registers are written with a write-enable mask in their upper
//! half, so a field is updated in one bus write. Divider and mux updates
//! are confirmed through status registers, gate changes through clock
//! monitor registers and reset changes through reset monitor registers,
//! each with a bounded poll configured in [`Config`].
//!
//! Bus interfaces of powered-down modules are isolated by module-stop
//! (MSTOP) bits, shared by several clocks. Those bits are reference counted
//! separately from the clocks: a bit is released with the first clock that
//! needs it and set again with the last.
//!
//! ## Locking
//!
//! All operations of one provider are serialized through a
//! `critical_section` mutex. Polls are bounded so the critical section is
//! too. Platforms pick the `critical-section` implementation; host tests use
//! its `std` implementation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use r9a08g045::{clocks, resets};
//!
//! let regs = unsafe { MmioRegion::new(r9a08g045::CPG_BASE, r9a08g045::CPG_SIZE) };
//! let cpg = Cpg::new(&r9a08g045::CPG_INFO, regs, delay)?;
//!
//! cpg.enable(clocks::SDHI0_IMCLK)?;
//! let rate = cpg.set_rate(clocks::SD0, 200_000_000)?;
//! cpg.deassert_reset(resets::SDHI0_IXRST)?;
//! ```

#![no_std]

extern crate alloc;

mod clock;
pub mod config;
pub mod cpg;
pub mod descriptor;
pub mod error_codes;
mod mstop;
pub mod registers;
mod reset;
pub mod topology;

// Use this to generate nicer docs
#[doc(inline)]
pub use crate::config::{Config, CONFIG};
#[doc(inline)]
pub use crate::cpg::Cpg;
#[doc(inline)]
pub use crate::descriptor::{ClockId, CpgInfo, ResetId};
#[doc(inline)]
pub use crate::error_codes::{ErrorCode, InitError, TopologyError};
#[doc(inline)]
pub use crate::registers::{MmioRegion, RegisterSpace};

// This is used to run the tests on a host
#[cfg(test)]
#[macro_use]
extern crate std;

#[cfg(test)]
mod tests;
