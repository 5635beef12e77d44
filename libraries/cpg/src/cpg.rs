// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! The clock provider.
//!
//! [`Cpg`] owns the resolved graph, the register block and the runtime
//! state. Every operation, queries included, runs as one transaction inside
//! a critical section, so at most one register sequence is in flight and a
//! rate query never observes a divider write whose confirmation is still
//! pending.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;

use crate::clock::{State, Transaction};
use crate::config::{Config, CONFIG};
use crate::descriptor::{ClockId, CpgInfo, ResetDesc, ResetId};
use crate::error_codes::{ErrorCode, InitError};
use crate::registers::{RegisterSpace, Registers};
use crate::topology::Graph;

pub struct Cpg<R: RegisterSpace, D: DelayNs> {
    graph: Graph,
    regs: Registers<R>,
    config: Config,
    state: Mutex<RefCell<State<D>>>,
}

impl<R: RegisterSpace, D: DelayNs> Cpg<R, D> {
    /// Bring up the CPG described by `info` with the default [`CONFIG`].
    pub fn new(info: &'static CpgInfo, space: R, delay: D) -> Result<Cpg<R, D>, InitError> {
        Self::new_with_config(info, space, delay, CONFIG)
    }

    /// Resolve the table, read back the current selections, program the
    /// table's start-up defaults and turn on the critical clocks.
    pub fn new_with_config(
        info: &'static CpgInfo,
        space: R,
        delay: D,
        config: Config,
    ) -> Result<Cpg<R, D>, InitError> {
        let graph = Graph::resolve(info, space.size()).map_err(|err| {
            log::error!("cpg: {}", err);
            err
        })?;
        let regs = Registers::new(space, config.poll_interval_us, config.trace_register_writes);
        let state = State::new(&graph, &regs, delay);

        let cpg = Cpg {
            graph,
            regs,
            config,
            state: Mutex::new(RefCell::new(state)),
        };
        cpg.transaction(|txn| {
            txn.apply_defaults()?;
            txn.enable_critical()
        })
        .map_err(|err| {
            log::error!("cpg: bring-up failed: {}", err);
            err
        })?;

        log::debug!(
            "cpg: {} clocks, {} resets",
            info.clocks.len(),
            info.resets.len()
        );
        Ok(cpg)
    }

    fn transaction<T>(&self, f: impl FnOnce(&mut Transaction<'_, R, D>) -> T) -> T {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let mut txn = Transaction {
                graph: &self.graph,
                regs: &self.regs,
                config: &self.config,
                state: &mut *state,
            };
            f(&mut txn)
        })
    }

    fn clock(&self, id: ClockId) -> Result<usize, ErrorCode> {
        self.graph.index_of(id).ok_or(ErrorCode::InvalidClock)
    }

    fn reset_line(&self, id: ResetId) -> Result<&'static ResetDesc, ErrorCode> {
        self.graph.reset_of(id).ok_or(ErrorCode::InvalidReset)
    }

    pub fn info(&self) -> &'static CpgInfo {
        self.graph.info()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The register block the provider drives.
    pub fn registers(&self) -> &R {
        self.regs.space()
    }

    /// Current rate of `id` in Hz, 0 when it can't be derived.
    pub fn get_rate(&self, id: ClockId) -> Result<u64, ErrorCode> {
        let index = self.clock(id)?;
        Ok(self.transaction(|txn| txn.rate(index)))
    }

    /// Move `id` to the highest rate not above `hz` and return the rate
    /// actually reached.
    pub fn set_rate(&self, id: ClockId, hz: u64) -> Result<u64, ErrorCode> {
        let index = self.clock(id)?;
        self.transaction(|txn| txn.set_rate(index, hz))
    }

    pub fn enable(&self, id: ClockId) -> Result<(), ErrorCode> {
        let index = self.clock(id)?;
        self.transaction(|txn| txn.enable(index))
    }

    /// Give back a reference taken with [`Cpg::enable`]. Fails with
    /// `NotEnabled` when no such reference is left, even if `id` keeps
    /// running for its children.
    pub fn disable(&self, id: ClockId) -> Result<(), ErrorCode> {
        let index = self.clock(id)?;
        self.transaction(|txn| txn.disable(index))
    }

    /// Program the divider `id` with a raw table `code`.
    pub fn set_divisor(&self, id: ClockId, code: u32) -> Result<(), ErrorCode> {
        let index = self.clock(id)?;
        self.transaction(|txn| txn.set_divisor(index, code))
    }

    /// Switch the mux `id` to its candidate at `position`.
    pub fn set_mux(&self, id: ClockId, position: usize) -> Result<(), ErrorCode> {
        let index = self.clock(id)?;
        let position = u32::try_from(position).map_err(|_| ErrorCode::InvalidSelection)?;
        self.transaction(|txn| txn.set_mux(index, position))
    }

    /// The clock currently feeding `id`, if any.
    pub fn parent(&self, id: ClockId) -> Result<Option<ClockId>, ErrorCode> {
        let index = self.clock(id)?;
        let parent = self.transaction(|txn| txn.active_parent(index));
        Ok(parent.map(|parent| self.graph.desc(parent).id))
    }

    pub fn enable_count(&self, id: ClockId) -> Result<u32, ErrorCode> {
        let index = self.clock(id)?;
        Ok(self.transaction(|txn| txn.enable_count(index)))
    }

    /// Whether the hardware reports `id` as running.
    pub fn is_enabled(&self, id: ClockId) -> Result<bool, ErrorCode> {
        let index = self.clock(id)?;
        Ok(self.transaction(|txn| txn.is_enabled(index)))
    }

    pub fn assert_reset(&self, id: ResetId) -> Result<(), ErrorCode> {
        let line = self.reset_line(id)?;
        self.transaction(|txn| txn.assert_reset(line))
    }

    pub fn deassert_reset(&self, id: ResetId) -> Result<(), ErrorCode> {
        let line = self.reset_line(id)?;
        self.transaction(|txn| txn.deassert_reset(line))
    }

    /// Assert `id`, wait the configured pulse width and release it again.
    pub fn reset(&self, id: ResetId) -> Result<(), ErrorCode> {
        let line = self.reset_line(id)?;
        self.transaction(|txn| txn.pulse_reset(line))
    }

    /// Whether `id` is currently held in reset.
    pub fn reset_status(&self, id: ResetId) -> Result<bool, ErrorCode> {
        let line = self.reset_line(id)?;
        Ok(self.transaction(|txn| txn.reset_asserted(line)))
    }

    /// Turn off everything but the critical clocks and their parents.
    pub fn shutdown(&self) {
        self.transaction(|txn| txn.shutdown());
        log::debug!("cpg: unused clocks stopped");
    }
}
