// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Reset controller.
//!
//! A reset line is a single bit in a write-enable protected register: 1
//! releases the module, 0 holds it in reset. Lines with a monitor register
//! are confirmed through it (the monitor bit reads 1 while the reset is in
//! effect); other lines are fire-and-forget. Reset control never looks at
//! clock state.

use embedded_hal::delay::DelayNs;

use crate::clock::Transaction;
use crate::descriptor::ResetDesc;
use crate::error_codes::ErrorCode;
use crate::registers::RegisterSpace;

impl<R: RegisterSpace, D: DelayNs> Transaction<'_, R, D> {
    pub fn assert_reset(&mut self, line: &ResetDesc) -> Result<(), ErrorCode> {
        self.regs.write_masked(line.offset, 1 << line.bit, 0);
        log::debug!("cpg: reset {} asserted", line.id.0);
        self.wait_reset(line, true)
    }

    pub fn deassert_reset(&mut self, line: &ResetDesc) -> Result<(), ErrorCode> {
        let bit = 1 << line.bit;
        self.regs.write_masked(line.offset, bit, bit);
        log::debug!("cpg: reset {} released", line.id.0);
        self.wait_reset(line, false)
    }

    /// Hold `line` in reset for the configured pulse width.
    pub fn pulse_reset(&mut self, line: &ResetDesc) -> Result<(), ErrorCode> {
        self.assert_reset(line)?;
        self.state.delay.delay_us(self.config.reset_pulse_us);
        self.deassert_reset(line)
    }

    pub fn reset_asserted(&self, line: &ResetDesc) -> bool {
        let bit = 1u32 << line.bit;
        match line.mon {
            Some(mon) => self.regs.read(mon) & bit != 0,
            None => self.regs.read(line.offset) & bit == 0,
        }
    }

    fn wait_reset(&mut self, line: &ResetDesc, asserted: bool) -> Result<(), ErrorCode> {
        let Some(mon) = line.mon else {
            return Ok(());
        };
        let bit = 1u32 << line.bit;
        let expected = if asserted { bit } else { 0 };
        self.regs
            .poll_until(
                &mut self.state.delay,
                mon,
                bit,
                expected,
                self.config.reset_timeout_us,
            )
            .map(|_| ())
    }
}
