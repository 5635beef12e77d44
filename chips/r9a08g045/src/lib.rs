// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock pulse generator tables for the Renesas RZ/G3S (R9A08G045).
//!
//! [`CPG_INFO`] plugs into [`cpg::Cpg`]:
//!
//! ```rust,ignore
//! let regs = unsafe { cpg::MmioRegion::new(r9a08g045::CPG_BASE, r9a08g045::CPG_SIZE) };
//! let cpg = cpg::Cpg::new(&r9a08g045::CPG_INFO, regs, delay)?;
//! ```

#![no_std]

pub mod clocks;
pub mod pll;
pub mod resets;

use cpg::CpgInfo;

/// Physical address of the CPG register block.
pub const CPG_BASE: usize = 0x1101_0000;
/// Size of the CPG register block, in bytes.
pub const CPG_SIZE: usize = 0x1_0000;

pub static CPG_INFO: CpgInfo = CpgInfo {
    clocks: clocks::CLOCKS,
    resets: resets::RESETS,
    critical: clocks::CRITICAL,
};

#[cfg(test)]
#[macro_use]
extern crate std;
