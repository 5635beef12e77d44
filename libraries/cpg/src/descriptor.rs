// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Descriptor table format.
//!
//! A chip describes its CPG with a [`CpgInfo`]: an ordered array of clock
//! descriptors, an array of reset lines, and the identifiers of the module
//! clocks that must never be stopped. Tables are `'static` constant data
//! built with the `const fn` helpers below; the engine never mutates them.
//!
//! Clocks reference their parents by [`ClockId`]. A parent must appear in
//! the array before any of its children.

/// Logical identifier of a clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockId(pub u32);

/// Logical identifier of a reset line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResetId(pub u32);

/// A bit field of a CPG register. Control fields live in the low half of a
/// write-enable protected register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegField {
    /// Byte offset of the register in the CPG block
    pub offset: usize,
    /// Position of the field's least significant bit
    pub shift: u8,
    /// Width of the field in bits
    pub width: u8,
}

impl RegField {
    pub const fn new(offset: usize, shift: u8, width: u8) -> RegField {
        RegField {
            offset,
            shift,
            width,
        }
    }

    /// Fields must be non-empty and fit in the 16 writable bits.
    pub const fn is_valid(&self) -> bool {
        self.width > 0 && (self.shift as u32) + (self.width as u32) <= 16
    }

    /// Largest code the field can hold.
    pub const fn max_code(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// Field mask in register position.
    pub const fn mask(&self) -> u16 {
        (self.max_code() << self.shift) as u16
    }

    /// Register value placing `code` in the field.
    pub const fn place(&self, code: u32) -> u16 {
        ((code & self.max_code()) << self.shift) as u16
    }

    /// Extract the field from a register word.
    pub const fn extract(&self, word: u32) -> u32 {
        (word >> self.shift) & self.max_code()
    }

    /// Read-only status fields may sit anywhere in the word.
    pub const fn is_valid_status(&self) -> bool {
        self.width > 0 && self.width < 32 && (self.shift as u32) + (self.width as u32) <= 32
    }

    /// Field mask in register position, for reads.
    pub const fn read_mask(&self) -> u32 {
        self.max_code() << self.shift
    }

    /// Register word bits reading back `code`.
    pub const fn expect(&self, code: u32) -> u32 {
        (code & self.max_code()) << self.shift
    }
}

/// How a divider or mux reports that a new selection has been applied.
///
/// Status fields are only read, so unlike control fields they may use the
/// upper half of their register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirm {
    /// The field is non-zero while the update is in progress.
    Busy(RegField),
    /// The field reads back the code that is currently applied.
    Mirror(RegField),
}

impl Confirm {
    pub const fn field(&self) -> RegField {
        match self {
            Confirm::Busy(field) | Confirm::Mirror(field) => *field,
        }
    }
}

/// One line of a divider table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DivEntry {
    /// Raw field value
    pub code: u32,
    /// Divisor selected by `code`
    pub div: u32,
}

impl DivEntry {
    /// Terminates every divider table.
    pub const END: DivEntry = DivEntry { code: 0, div: 0 };

    pub const fn new(code: u32, div: u32) -> DivEntry {
        DivEntry { code, div }
    }

    pub const fn is_end(&self) -> bool {
        self.div == 0
    }
}

/// Iterate a divider table up to its sentinel.
pub fn div_entries(table: &[DivEntry]) -> impl Iterator<Item = &DivEntry> + '_ {
    table.iter().take_while(|entry| !entry.is_end())
}

/// Inclusive band of parent rates a divider accepts rate requests for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateBounds {
    pub min: u64,
    pub max: u64,
}

impl RateBounds {
    pub const fn contains(&self, rate: u64) -> bool {
        rate >= self.min && rate <= self.max
    }
}

/// Behaviour run around a reconfiguration of a divider or mux.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notifier {
    /// Gate every running module clock below the node for the duration of
    /// the change. For a divider fed by a mux, `safe_parent` additionally
    /// parks that mux on the given candidate until the change is confirmed.
    Quiesce { safe_parent: Option<usize> },
    /// The divider must not run at divisor 1 while its parent produces
    /// `rate`. Before the parent mux switches to such a rate, the divider is
    /// moved to `safe_code`, and divisor-1 requests at that rate are refused.
    ForbiddenParentRate { rate: u64, safe_code: u32 },
}

/// Rate formula of a PLL: `(parent_rate, configuration_word) -> rate`.
pub type PllFormula = fn(u64, u32) -> u64;

#[derive(Clone, Copy, Debug)]
pub struct PllDesc {
    pub parent: ClockId,
    /// Offset of the register holding the configuration word
    pub conf: usize,
    pub formula: PllFormula,
}

#[derive(Clone, Copy, Debug)]
pub struct MuxDesc {
    /// Candidate parents, in position order
    pub parents: &'static [ClockId],
    /// Selector field
    pub field: RegField,
    pub confirm: Option<Confirm>,
    /// Raw selector value of each position. `None` when the value equals
    /// the position. Values missing from the table are reserved.
    pub table: Option<&'static [u32]>,
    /// Position programmed at start-up instead of keeping the reset value
    pub default: Option<usize>,
    pub notifier: Option<Notifier>,
}

#[derive(Clone, Copy, Debug)]
pub struct DividerDesc {
    pub parent: ClockId,
    pub field: RegField,
    pub confirm: Option<Confirm>,
    /// Code to divisor table, ended by [`DivEntry::END`]
    pub table: &'static [DivEntry],
    pub bounds: Option<RateBounds>,
    /// Highest output rate a rate request may select
    pub limit: Option<u64>,
    /// Rate requests may also switch the parent mux to another input
    pub rate_parent: bool,
    /// Code programmed at start-up instead of keeping the reset value
    pub default: Option<u32>,
    pub notifier: Option<Notifier>,
}

/// Location of a module clock enable bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateBit {
    pub offset: usize,
    pub bit: u8,
}

/// Bits of a shared module-stop register that must be released for a
/// module to receive its clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mstop {
    pub offset: usize,
    pub mask: u16,
}

#[derive(Clone, Copy, Debug)]
pub struct ModuleGate {
    pub parent: ClockId,
    pub on: GateBit,
    /// Register reflecting which clocks are actually running
    pub mon: Option<usize>,
    pub mstop: Option<Mstop>,
}

#[derive(Clone, Copy, Debug)]
pub enum ClockKind {
    Input { rate: u64 },
    FixedFactor { parent: ClockId, mul: u32, div: u32 },
    Pll(PllDesc),
    Mux(MuxDesc),
    Divider(DividerDesc),
    Gate(ModuleGate),
    /// One half of a pair of clocks sharing a single enable bit.
    CoupledGate(ModuleGate),
}

#[derive(Clone, Copy, Debug)]
pub struct ClockDesc {
    pub name: &'static str,
    pub id: ClockId,
    pub kind: ClockKind,
}

impl ClockDesc {
    pub const fn input(name: &'static str, id: ClockId, rate: u64) -> ClockDesc {
        ClockDesc {
            name,
            id,
            kind: ClockKind::Input { rate },
        }
    }

    pub const fn fixed(
        name: &'static str,
        id: ClockId,
        parent: ClockId,
        mul: u32,
        div: u32,
    ) -> ClockDesc {
        ClockDesc {
            name,
            id,
            kind: ClockKind::FixedFactor { parent, mul, div },
        }
    }

    pub const fn pll(
        name: &'static str,
        id: ClockId,
        parent: ClockId,
        conf: usize,
        formula: PllFormula,
    ) -> ClockDesc {
        ClockDesc {
            name,
            id,
            kind: ClockKind::Pll(PllDesc {
                parent,
                conf,
                formula,
            }),
        }
    }

    pub const fn mux(name: &'static str, id: ClockId, mux: MuxDesc) -> ClockDesc {
        ClockDesc {
            name,
            id,
            kind: ClockKind::Mux(mux),
        }
    }

    pub const fn divider(name: &'static str, id: ClockId, divider: DividerDesc) -> ClockDesc {
        ClockDesc {
            name,
            id,
            kind: ClockKind::Divider(divider),
        }
    }

    pub const fn gate(name: &'static str, id: ClockId, gate: ModuleGate) -> ClockDesc {
        ClockDesc {
            name,
            id,
            kind: ClockKind::Gate(gate),
        }
    }

    pub const fn coupled(name: &'static str, id: ClockId, gate: ModuleGate) -> ClockDesc {
        ClockDesc {
            name,
            id,
            kind: ClockKind::CoupledGate(gate),
        }
    }

    /// The module gate of a `Gate` or `CoupledGate`.
    pub const fn module_gate(&self) -> Option<&ModuleGate> {
        match &self.kind {
            ClockKind::Gate(gate) | ClockKind::CoupledGate(gate) => Some(gate),
            _ => None,
        }
    }
}

/// A reset line. The control bit reads 1 when the module is released and 0
/// while it is held in reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetDesc {
    pub id: ResetId,
    pub offset: usize,
    pub bit: u8,
    /// Register whose bit reads 1 while the reset is in effect
    pub mon: Option<usize>,
}

impl ResetDesc {
    pub const fn new(id: ResetId, offset: usize, bit: u8, mon: Option<usize>) -> ResetDesc {
        ResetDesc {
            id,
            offset,
            bit,
            mon,
        }
    }
}

/// Everything the engine needs to know about one chip.
#[derive(Clone, Copy, Debug)]
pub struct CpgInfo {
    pub clocks: &'static [ClockDesc],
    pub resets: &'static [ResetDesc],
    /// Module clocks that are turned on at start-up and never turned off
    pub critical: &'static [ClockId],
}
