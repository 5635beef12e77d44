// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Configuration options for the CPG engine.
//!
//! Like the kernel's configuration, options live in a `const` object so every
//! code path is type-checked regardless of which values are selected. Cargo
//! features are only used to flip the boolean options below.

/// Timing and tracing options of a provider.
///
/// All timeouts are in microseconds and bound a single confirmation poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// How long to wait for a module clock to show up in its monitor
    /// register after the gate bit was set.
    pub clk_mon_timeout_us: u32,

    /// How long to wait for a divider or mux status bit to report that the
    /// new selection was applied.
    pub clk_update_timeout_us: u32,

    /// How long to wait for a reset monitor bit to follow the control bit.
    pub reset_timeout_us: u32,

    /// Delay between two reads of a polled register.
    pub poll_interval_us: u32,

    /// Time a reset line is held asserted by `Cpg::reset()`.
    pub reset_pulse_us: u32,

    /// Whether every register write is traced through the logger.
    pub trace_register_writes: bool,
}

/// The configuration used by `Cpg::new()`.
pub const CONFIG: Config = Config {
    clk_mon_timeout_us: 10,
    clk_update_timeout_us: 200,
    reset_timeout_us: 100,
    poll_interval_us: 1,
    reset_pulse_us: 35,
    trace_register_writes: cfg!(feature = "trace_register_writes"),
};
