// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! SAM PLL rate formula.
//!
//! PLL1 is the only PLL whose output is not fixed by the boot firmware's
//! choice of oscillator. Its rate follows the CLK1 configuration register:
//!
//! ```text
//! rate = parent * (NI + NF / 4096) / (M * P)
//! ```
//!
//! where NI and M are stored minus one and P is a power of two.

use tock_registers::{register_bitfields, LocalRegisterCopy};

register_bitfields![u32,
    CLK1 [
        /// Post divider, as a power of two
        DIV_P OFFSET(26) NUMBITS(3) [],
        /// Reference divider, minus one
        DIV_M OFFSET(22) NUMBITS(4) [],
        /// Integer part of the multiplier, minus one
        DIV_NI OFFSET(13) NUMBITS(9) [],
        /// Fractional part of the multiplier, in 1/4096 steps
        DIV_NF OFFSET(1) NUMBITS(12) []
    ]
];

/// Byte offset of PLL1's CLK1 register.
pub const PLL1_CLK1: usize = 0x004;

/// Rate of a SAM PLL fed with `parent` Hz and configured with `conf`.
pub fn sam_pll_rate(parent: u64, conf: u32) -> u64 {
    let clk1: LocalRegisterCopy<u32, CLK1::Register> = LocalRegisterCopy::new(conf);

    // The post divider saturates at 16.
    let p = (1u64 << clk1.read(CLK1::DIV_P)).min(16);
    let m = u64::from(clk1.read(CLK1::DIV_M)) + 1;
    let ni = u64::from(clk1.read(CLK1::DIV_NI)) + 1;
    let nf = u64::from(clk1.read(CLK1::DIV_NF));

    let vco = (u128::from(parent) * u128::from(4096 * ni + nf)) >> 12;
    let div = u128::from(m * p);
    u64::try_from((vco + div / 2) / div).unwrap_or(u64::MAX)
}
