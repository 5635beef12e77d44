// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! The standard error codes used by the CPG engine.

use core::fmt;

use crate::descriptor::{ClockId, ResetId};

/// Errors returned by the runtime clock and reset operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    /// A confirmation register did not report the expected value in time.
    /// The node keeps the configuration that was last attempted.
    HardwareTimeout,
    /// The clock is on the critical list and cannot be turned off.
    ProtectedClock,
    /// The requested rate can't be produced from the lookup table, or the
    /// parent rate is outside the divider's permitted band.
    RateOutOfRange,
    /// `disable()` was called more times than `enable()`.
    NotEnabled,
    /// No clock with this identifier exists in the table.
    InvalidClock,
    /// No reset line with this identifier exists in the table.
    InvalidReset,
    /// The operation doesn't apply to this kind of node.
    NotSupported,
    /// A mux position or divider code that isn't in the node's table.
    InvalidSelection,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        match err {
            ErrorCode::HardwareTimeout => 1,
            ErrorCode::ProtectedClock => 2,
            ErrorCode::RateOutOfRange => 3,
            ErrorCode::NotEnabled => 4,
            ErrorCode::InvalidClock => 5,
            ErrorCode::InvalidReset => 6,
            ErrorCode::NotSupported => 7,
            ErrorCode::InvalidSelection => 8,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ErrorCode::HardwareTimeout => "hardware did not confirm the update in time",
            ErrorCode::ProtectedClock => "clock is critical and stays enabled",
            ErrorCode::RateOutOfRange => "requested rate is not achievable",
            ErrorCode::NotEnabled => "clock is not enabled",
            ErrorCode::InvalidClock => "unknown clock",
            ErrorCode::InvalidReset => "unknown reset line",
            ErrorCode::NotSupported => "operation not supported by this clock",
            ErrorCode::InvalidSelection => "no such mux position or divider code",
        };
        f.write_str(msg)
    }
}

/// Reasons a descriptor table is rejected while the graph is resolved.
///
/// All of these are programming errors in the table and abort construction
/// of the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopologyError {
    /// Two descriptors use the same identifier.
    DuplicateClock(ClockId),
    /// A parent reference names a clock that is not in the table.
    UnknownParent { clock: ClockId, parent: ClockId },
    /// A parent reference names a clock defined later in the table.
    ForwardParent { clock: ClockId, parent: ClockId },
    /// A fixed factor with a zero multiplier or divisor.
    ZeroFactor(ClockId),
    /// A divider table is missing its terminating sentinel.
    UnterminatedTable(ClockId),
    /// A divider or mux table repeats a code.
    DuplicateCode { clock: ClockId, code: u32 },
    /// A table code does not fit in the register field.
    CodeOutOfField { clock: ClockId, code: u32 },
    /// A mux has no candidates, or its value table doesn't match them.
    BadMuxTable(ClockId),
    /// A register field is misaligned, too wide or outside the mapped region.
    BadField { clock: ClockId, offset: usize },
    /// A rate bound where `min > max`.
    BadBounds(ClockId),
    /// A notifier that doesn't fit the node it is attached to.
    BadNotifier(ClockId),
    /// A coupled gate whose bit is not shared by exactly two coupled gates.
    BadCoupling(ClockId),
    /// A plain gate uses a bit claimed by a coupled pair.
    SharedGateBit(ClockId),
    /// A critical identifier that doesn't name a gate.
    BadCritical(ClockId),
    /// Two reset descriptors use the same identifier.
    DuplicateReset(ResetId),
    /// A reset register is misaligned or outside the mapped region.
    BadReset(ResetId),
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TopologyError::DuplicateClock(id) => write!(f, "clock {} defined twice", id.0),
            TopologyError::UnknownParent { clock, parent } => {
                write!(f, "clock {}: unknown parent {}", clock.0, parent.0)
            }
            TopologyError::ForwardParent { clock, parent } => write!(
                f,
                "clock {}: parent {} must be defined before its children",
                clock.0, parent.0
            ),
            TopologyError::ZeroFactor(id) => write!(f, "clock {}: zero mul/div", id.0),
            TopologyError::UnterminatedTable(id) => {
                write!(f, "clock {}: divider table has no sentinel", id.0)
            }
            TopologyError::DuplicateCode { clock, code } => {
                write!(f, "clock {}: code {:#x} used twice", clock.0, code)
            }
            TopologyError::CodeOutOfField { clock, code } => {
                write!(f, "clock {}: code {:#x} does not fit field", clock.0, code)
            }
            TopologyError::BadMuxTable(id) => write!(f, "clock {}: malformed mux table", id.0),
            TopologyError::BadField { clock, offset } => {
                write!(f, "clock {}: invalid register field at {:#x}", clock.0, offset)
            }
            TopologyError::BadBounds(id) => write!(f, "clock {}: min rate above max", id.0),
            TopologyError::BadNotifier(id) => {
                write!(f, "clock {}: notifier not valid for this node", id.0)
            }
            TopologyError::BadCoupling(id) => {
                write!(f, "clock {}: coupled gate without exactly one sibling", id.0)
            }
            TopologyError::SharedGateBit(id) => {
                write!(f, "clock {}: gate bit owned by a coupled pair", id.0)
            }
            TopologyError::BadCritical(id) => {
                write!(f, "critical clock {} is not a module gate", id.0)
            }
            TopologyError::DuplicateReset(id) => write!(f, "reset {} defined twice", id.0),
            TopologyError::BadReset(id) => write!(f, "reset {}: invalid register", id.0),
        }
    }
}

/// Failure to bring up a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitError {
    /// The descriptor table is malformed.
    Topology(TopologyError),
    /// Programming a default or enabling a critical clock failed.
    Hardware(ErrorCode),
}

impl From<TopologyError> for InitError {
    fn from(err: TopologyError) -> InitError {
        InitError::Topology(err)
    }
}

impl From<ErrorCode> for InitError {
    fn from(err: ErrorCode) -> InitError {
        InitError::Hardware(err)
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InitError::Topology(err) => write!(f, "invalid clock table: {}", err),
            InitError::Hardware(err) => write!(f, "clock bring-up failed: {}", err),
        }
    }
}
