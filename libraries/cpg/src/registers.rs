// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Register access layer.
//!
//! The CPG register file is a flat array of 32-bit words. Control registers
//! use a "write-enable" layout: the upper half of a written word selects
//! which bits of the lower half are updated, so unrelated fields sharing a
//! word are never disturbed and no read-modify-write cycle is needed.
//!
//! The hardware itself is reached through the [`RegisterSpace`] trait.
//! [`MmioRegion`] implements it over device memory; tests provide an
//! in-memory implementation.

use embedded_hal::delay::DelayNs;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::ReadWrite;
use tock_registers::{register_bitfields, LocalRegisterCopy};

use crate::error_codes::ErrorCode;

register_bitfields![u32,
    /// Layout of a write-enable protected control word.
    pub WEN_WORD [
        /// New value of the bits enabled below
        VALUE OFFSET(0) NUMBITS(16) [],
        /// One write-enable bit per VALUE bit
        WEN OFFSET(16) NUMBITS(16) []
    ]
];

/// Backing store of a CPG register file.
///
/// Offsets are in bytes from the start of the block and are always word
/// aligned and in range when called through [`Registers`].
pub trait RegisterSpace {
    /// Size of the mapped region, in bytes.
    fn size(&self) -> usize;

    /// Read the word at `offset`.
    fn read32(&self, offset: usize) -> u32;

    /// Write `value` to the word at `offset`.
    fn write32(&self, offset: usize, value: u32);
}

/// A memory-mapped CPG register block.
pub struct MmioRegion {
    regs: &'static [ReadWrite<u32>],
}

impl MmioRegion {
    /// Map the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of `size` bytes of device registers that
    /// stay mapped for the rest of the program and that nothing else writes
    /// to without going through the returned region.
    pub unsafe fn new(base: usize, size: usize) -> MmioRegion {
        MmioRegion {
            regs: core::slice::from_raw_parts(base as *const ReadWrite<u32>, size / 4),
        }
    }
}

// SAFETY: all accesses are single volatile word accesses, and the provider
// serializes every multi-access sequence under its lock.
unsafe impl Sync for MmioRegion {}
unsafe impl Send for MmioRegion {}

impl RegisterSpace for MmioRegion {
    fn size(&self) -> usize {
        self.regs.len() * 4
    }

    fn read32(&self, offset: usize) -> u32 {
        self.regs[offset / 4].get()
    }

    fn write32(&self, offset: usize, value: u32) {
        self.regs[offset / 4].set(value);
    }
}

/// Encode a write-enable protected word updating `mask` bits to `value`.
pub fn masked_word(mask: u16, value: u16) -> u32 {
    let mut word: LocalRegisterCopy<u32, WEN_WORD::Register> = LocalRegisterCopy::new(0);
    word.modify(WEN_WORD::WEN.val(mask as u32) + WEN_WORD::VALUE.val((value & mask) as u32));
    word.get()
}

/// Checked access to a [`RegisterSpace`].
///
/// An offset outside the mapped region can only come from a malformed
/// descriptor table, so it panics instead of returning an error.
pub struct Registers<R: RegisterSpace> {
    space: R,
    poll_interval_us: u32,
    trace: bool,
}

impl<R: RegisterSpace> Registers<R> {
    pub fn new(space: R, poll_interval_us: u32, trace: bool) -> Registers<R> {
        Registers {
            space,
            poll_interval_us,
            trace,
        }
    }

    /// The underlying register space.
    pub fn space(&self) -> &R {
        &self.space
    }

    /// Whether a word access at `offset` is valid.
    pub fn contains(&self, offset: usize) -> bool {
        offset % 4 == 0
            && offset
                .checked_add(4)
                .is_some_and(|end| end <= self.space.size())
    }

    fn check(&self, offset: usize) {
        if !self.contains(offset) {
            panic!(
                "cpg: register offset {:#x} outside of the {:#x} byte region",
                offset,
                self.space.size()
            );
        }
    }

    pub fn read(&self, offset: usize) -> u32 {
        self.check(offset);
        self.space.read32(offset)
    }

    /// Update the bits of `mask` in the low half of the word at `offset` to
    /// `value`, in a single bus write.
    pub fn write_masked(&self, offset: usize, mask: u16, value: u16) {
        self.check(offset);
        let word = masked_word(mask, value);
        if self.trace {
            log::trace!("cpg: write {:#010x} to {:#05x}", word, offset);
        }
        self.space.write32(offset, word);
    }

    /// Read `offset` until `(value & mask) == expected`.
    ///
    /// Gives up after `timeout_us`, with one last read after the deadline so
    /// a slow caller can't turn a completed update into a timeout. Returns the
    /// matching word.
    pub fn poll_until<D: DelayNs>(
        &self,
        delay: &mut D,
        offset: usize,
        mask: u32,
        expected: u32,
        timeout_us: u32,
    ) -> Result<u32, ErrorCode> {
        let interval = self.poll_interval_us.max(1);
        let mut waited = 0;
        loop {
            let value = self.read(offset);
            if value & mask == expected {
                return Ok(value);
            }
            if waited >= timeout_us {
                break;
            }
            delay.delay_us(interval);
            waited = waited.saturating_add(interval);
        }

        let value = self.read(offset);
        if value & mask == expected {
            Ok(value)
        } else {
            log::warn!(
                "cpg: timeout on {:#05x}: {:#010x} & {:#010x} != {:#010x}",
                offset,
                value,
                mask,
                expected
            );
            Err(ErrorCode::HardwareTimeout)
        }
    }
}
