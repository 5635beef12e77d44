// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Topology resolver.
//!
//! Turns a [`CpgInfo`] into an index-addressed graph. Descriptors are walked
//! in array order and every parent reference must name an earlier entry, so
//! the resulting graph is acyclic and `parent index < child index` holds for
//! every edge. All table invariants are checked here once; later code relies
//! on them without re-checking.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use crate::descriptor::{
    div_entries, ClockDesc, ClockId, ClockKind, Confirm, CpgInfo, GateBit, ModuleGate,
    Notifier, RegField, ResetDesc, ResetId,
};
use crate::error_codes::TopologyError;

/// The resolved clock graph of one chip.
pub struct Graph {
    info: &'static CpgInfo,
    /// Parent candidates of every node. A single entry for nodes with a
    /// fixed parent, the candidate list for a mux.
    parents: Vec<Vec<usize>>,
    clocks: BTreeMap<ClockId, usize>,
    resets: BTreeMap<ResetId, usize>,
    critical: Vec<bool>,
    /// The other half of a coupled gate.
    sibling: Vec<Option<usize>>,
}

impl Graph {
    /// Build the graph for `info`, with registers mapped over
    /// `region_size` bytes.
    pub fn resolve(info: &'static CpgInfo, region_size: usize) -> Result<Graph, TopologyError> {
        let in_region = |offset: usize| {
            offset % 4 == 0
                && offset
                    .checked_add(4)
                    .is_some_and(|end| end <= region_size)
        };

        let mut clocks = BTreeMap::new();
        let mut parents = Vec::with_capacity(info.clocks.len());

        for (index, desc) in info.clocks.iter().enumerate() {
            if clocks.insert(desc.id, index).is_some() {
                return Err(TopologyError::DuplicateClock(desc.id));
            }

            let refs: Vec<ClockId> = match &desc.kind {
                ClockKind::Input { .. } => Vec::new(),
                ClockKind::FixedFactor { parent, .. } => vec![*parent],
                ClockKind::Pll(pll) => vec![pll.parent],
                ClockKind::Mux(mux) => mux.parents.to_vec(),
                ClockKind::Divider(divider) => vec![divider.parent],
                ClockKind::Gate(gate) | ClockKind::CoupledGate(gate) => vec![gate.parent],
            };

            let mut resolved = Vec::with_capacity(refs.len());
            for parent in refs {
                match clocks.get(&parent) {
                    Some(&p) if p < index => resolved.push(p),
                    _ => {
                        // Either missing or only seen later in the table.
                        let later = info.clocks[index..].iter().any(|d| d.id == parent);
                        return Err(if later {
                            TopologyError::ForwardParent {
                                clock: desc.id,
                                parent,
                            }
                        } else {
                            TopologyError::UnknownParent {
                                clock: desc.id,
                                parent,
                            }
                        });
                    }
                }
            }

            check_node(desc, &in_region)?;
            parents.push(resolved);
        }

        // Notifiers can only be checked once the parents are known.
        for (index, desc) in info.clocks.iter().enumerate() {
            check_notifier(info, desc, &parents[index])?;
        }

        let sibling = pair_coupled_gates(info.clocks)?;

        let mut critical = vec![false; info.clocks.len()];
        for id in info.critical {
            match clocks.get(id) {
                Some(&index) if info.clocks[index].module_gate().is_some() => {
                    critical[index] = true
                }
                _ => return Err(TopologyError::BadCritical(*id)),
            }
        }

        let mut resets = BTreeMap::new();
        for (index, reset) in info.resets.iter().enumerate() {
            if resets.insert(reset.id, index).is_some() {
                return Err(TopologyError::DuplicateReset(reset.id));
            }
            if !in_region(reset.offset) || reset.bit >= 16 || !reset.mon.map_or(true, &in_region)
            {
                return Err(TopologyError::BadReset(reset.id));
            }
        }

        Ok(Graph {
            info,
            parents,
            clocks,
            resets,
            critical,
            sibling,
        })
    }

    pub fn info(&self) -> &'static CpgInfo {
        self.info
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn desc(&self, index: usize) -> &'static ClockDesc {
        &self.info.clocks[index]
    }

    pub fn index_of(&self, id: ClockId) -> Option<usize> {
        self.clocks.get(&id).copied()
    }

    pub fn reset_of(&self, id: ResetId) -> Option<&'static ResetDesc> {
        self.resets.get(&id).map(|&index| &self.info.resets[index])
    }

    /// All parent candidates of `index`.
    pub fn parents(&self, index: usize) -> &[usize] {
        &self.parents[index]
    }

    /// The parent feeding `index` given its current `selection` (mux
    /// position; ignored for every other kind).
    pub fn active_parent(&self, index: usize, selection: u32) -> Option<usize> {
        match self.desc(index).kind {
            ClockKind::Mux(_) => self.parents[index].get(selection as usize).copied(),
            _ => self.parents[index].first().copied(),
        }
    }

    /// Nodes that list `index` among their parent candidates.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        // Children always come after their parents.
        (index + 1..self.len()).filter(move |&child| self.parents[child].contains(&index))
    }

    pub fn is_critical(&self, index: usize) -> bool {
        self.critical[index]
    }

    /// The other half of a coupled gate, which shares its enable bit.
    pub fn sibling(&self, index: usize) -> Option<usize> {
        self.sibling[index]
    }

    /// Rate of `index` for the current selection state.
    ///
    /// `selection[i]` holds the divider code or mux position of node `i`.
    /// `read` returns a register word and is only used for PLL configuration.
    /// Shared ancestors are computed once per query.
    pub fn rate_of(
        &self,
        index: usize,
        selection: &[u32],
        read: &dyn Fn(usize) -> u32,
    ) -> u64 {
        let mut memo = vec![None; index + 1];
        self.rate_memo(index, selection, read, &mut memo)
    }

    fn rate_memo(
        &self,
        index: usize,
        selection: &[u32],
        read: &dyn Fn(usize) -> u32,
        memo: &mut [Option<u64>],
    ) -> u64 {
        if let Some(rate) = memo[index] {
            return rate;
        }

        let parent_rate = |memo: &mut [Option<u64>]| {
            self.active_parent(index, selection[index])
                .map_or(0, |parent| self.rate_memo(parent, selection, read, memo))
        };

        let rate = match &self.desc(index).kind {
            ClockKind::Input { rate } => *rate,
            ClockKind::FixedFactor { mul, div, .. } => {
                scale(parent_rate(memo), *mul as u64, *div as u64)
            }
            ClockKind::Pll(pll) => (pll.formula)(parent_rate(memo), read(pll.conf)),
            ClockKind::Mux(_) => parent_rate(memo),
            ClockKind::Divider(divider) => {
                let code = selection[index];
                match div_entries(divider.table).find(|entry| entry.code == code) {
                    Some(entry) => parent_rate(memo) / entry.div as u64,
                    None => 0,
                }
            }
            ClockKind::Gate(_) | ClockKind::CoupledGate(_) => parent_rate(memo),
        };

        memo[index] = Some(rate);
        rate
    }
}

/// `rate * mul / div` without losing bits in the product.
pub fn scale(rate: u64, mul: u64, div: u64) -> u64 {
    let scaled = (rate as u128 * mul as u128) / div as u128;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

fn check_field(
    clock: ClockId,
    field: &RegField,
    in_region: &dyn Fn(usize) -> bool,
) -> Result<(), TopologyError> {
    if field.is_valid() && in_region(field.offset) {
        Ok(())
    } else {
        Err(TopologyError::BadField {
            clock,
            offset: field.offset,
        })
    }
}

fn check_status(
    clock: ClockId,
    confirm: Option<Confirm>,
    in_region: &dyn Fn(usize) -> bool,
) -> Result<(), TopologyError> {
    match confirm.map(|confirm| confirm.field()) {
        Some(field) if !field.is_valid_status() || !in_region(field.offset) => {
            Err(TopologyError::BadField {
                clock,
                offset: field.offset,
            })
        }
        _ => Ok(()),
    }
}

fn check_gate(
    clock: ClockId,
    gate: &ModuleGate,
    in_region: &dyn Fn(usize) -> bool,
) -> Result<(), TopologyError> {
    let bad = |offset| TopologyError::BadField { clock, offset };
    if gate.on.bit >= 16 || !in_region(gate.on.offset) {
        return Err(bad(gate.on.offset));
    }
    if let Some(mon) = gate.mon {
        if !in_region(mon) {
            return Err(bad(mon));
        }
    }
    if let Some(mstop) = gate.mstop {
        if mstop.mask == 0 || !in_region(mstop.offset) {
            return Err(bad(mstop.offset));
        }
    }
    Ok(())
}

fn check_node(desc: &ClockDesc, in_region: &dyn Fn(usize) -> bool) -> Result<(), TopologyError> {
    let id = desc.id;
    match &desc.kind {
        ClockKind::Input { .. } => Ok(()),
        ClockKind::FixedFactor { mul, div, .. } => {
            if *mul == 0 || *div == 0 {
                Err(TopologyError::ZeroFactor(id))
            } else {
                Ok(())
            }
        }
        ClockKind::Pll(pll) => {
            if in_region(pll.conf) {
                Ok(())
            } else {
                Err(TopologyError::BadField {
                    clock: id,
                    offset: pll.conf,
                })
            }
        }
        ClockKind::Mux(mux) => {
            check_field(id, &mux.field, in_region)?;
            check_status(id, mux.confirm, in_region)?;
            if mux.parents.is_empty() {
                return Err(TopologyError::BadMuxTable(id));
            }
            if let Some(table) = mux.table {
                if table.len() != mux.parents.len() {
                    return Err(TopologyError::BadMuxTable(id));
                }
                for (position, &code) in table.iter().enumerate() {
                    if code > mux.field.max_code() {
                        return Err(TopologyError::CodeOutOfField { clock: id, code });
                    }
                    if table[..position].contains(&code) {
                        return Err(TopologyError::DuplicateCode { clock: id, code });
                    }
                }
            } else if mux.parents.len() as u32 - 1 > mux.field.max_code() {
                return Err(TopologyError::BadMuxTable(id));
            }
            if mux.default.is_some_and(|position| position >= mux.parents.len()) {
                return Err(TopologyError::BadMuxTable(id));
            }
            Ok(())
        }
        ClockKind::Divider(divider) => {
            check_field(id, &divider.field, in_region)?;
            check_status(id, divider.confirm, in_region)?;
            if !divider.table.iter().any(|entry| entry.is_end()) {
                return Err(TopologyError::UnterminatedTable(id));
            }
            let entries: Vec<_> = div_entries(divider.table).collect();
            for (i, entry) in entries.iter().enumerate() {
                if entry.code > divider.field.max_code() {
                    return Err(TopologyError::CodeOutOfField {
                        clock: id,
                        code: entry.code,
                    });
                }
                if entries[..i].iter().any(|other| other.code == entry.code) {
                    return Err(TopologyError::DuplicateCode {
                        clock: id,
                        code: entry.code,
                    });
                }
            }
            if let Some(code) = divider.default {
                if !entries.iter().any(|entry| entry.code == code) {
                    return Err(TopologyError::CodeOutOfField { clock: id, code });
                }
            }
            if divider.bounds.is_some_and(|bounds| bounds.min > bounds.max) {
                return Err(TopologyError::BadBounds(id));
            }
            Ok(())
        }
        ClockKind::Gate(gate) | ClockKind::CoupledGate(gate) => check_gate(id, gate, in_region),
    }
}

fn check_notifier(
    info: &CpgInfo,
    desc: &ClockDesc,
    parents: &[usize],
) -> Result<(), TopologyError> {
    let (notifier, divider) = match &desc.kind {
        ClockKind::Mux(mux) => (mux.notifier, None),
        ClockKind::Divider(divider) => (divider.notifier, Some(divider)),
        _ => return Ok(()),
    };

    match (notifier, divider) {
        (None, _) => Ok(()),
        (Some(Notifier::Quiesce { safe_parent: None }), _) => Ok(()),
        (Some(Notifier::Quiesce { safe_parent: Some(safe) }), Some(_)) => {
            // Parking needs a mux right above the divider.
            match &info.clocks[parents[0]].kind {
                ClockKind::Mux(mux) if safe < mux.parents.len() => Ok(()),
                _ => Err(TopologyError::BadNotifier(desc.id)),
            }
        }
        (Some(Notifier::ForbiddenParentRate { safe_code, .. }), Some(divider)) => {
            let unity = div_entries(divider.table).any(|entry| entry.div == 1);
            let safe = div_entries(divider.table)
                .any(|entry| entry.code == safe_code && entry.div > 1);
            if unity && safe {
                Ok(())
            } else {
                Err(TopologyError::BadNotifier(desc.id))
            }
        }
        _ => Err(TopologyError::BadNotifier(desc.id)),
    }
}

/// Match up coupled gates by their shared enable bit.
fn pair_coupled_gates(clocks: &[ClockDesc]) -> Result<Vec<Option<usize>>, TopologyError> {
    let mut sibling = vec![None; clocks.len()];
    let mut users: BTreeMap<(usize, u8), Vec<usize>> = BTreeMap::new();

    for (index, desc) in clocks.iter().enumerate() {
        if let ClockKind::CoupledGate(gate) = &desc.kind {
            users.entry(key(&gate.on)).or_default().push(index);
        }
    }

    for indices in users.values() {
        if let [a, b] = indices[..] {
            sibling[a] = Some(b);
            sibling[b] = Some(a);
        } else {
            return Err(TopologyError::BadCoupling(clocks[indices[0]].id));
        }
    }

    for desc in clocks {
        if let ClockKind::Gate(gate) = &desc.kind {
            if users.contains_key(&key(&gate.on)) {
                return Err(TopologyError::SharedGateBit(desc.id));
            }
        }
    }

    Ok(sibling)
}

fn key(bit: &GateBit) -> (usize, u8) {
    (bit.offset, bit.bit)
}
