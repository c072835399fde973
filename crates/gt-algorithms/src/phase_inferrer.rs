//! Inferring phases that tracing left unset.

use std::collections::BTreeMap;

use gt_core::{EquipmentId, FeederDirection, GridResult, SinglePhaseKind, TerminalId};
use gt_network::{Network, Terminal};
use gt_trace::{NetworkStateOperators, X_PRIORITY, Y_PRIORITY, is_after, is_before};

use crate::SetPhases;

/// Equipment whose phases were inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferredPhases {
    pub equipment: EquipmentId,
    /// Whether an X/Y phase was guessed rather than copied from its nominal
    /// phase. Guesses may be wrong.
    pub suspect: bool,
}

/// Fills in phases [`SetPhases`] could not reach.
///
/// A terminal connected to others that still has a de-energised nominal phase
/// usually means upstream source data is wrong. Starting from terminals next
/// to a fully energised neighbour, each gap is filled and the result flowed
/// onward:
///
/// 1. A/B/C/N gaps take their nominal phase.
/// 2. X/Y gaps take the first unused phase in priority order, keeping X below
///    Y; terminals missing one phase are done before those missing more.
///
/// Every equipment touched is reported with `tracing::warn!`.
pub struct PhaseInferrer<'s> {
    state: &'s dyn NetworkStateOperators,
}

impl<'s> PhaseInferrer<'s> {
    pub fn new(state: &'s dyn NetworkStateOperators) -> Self {
        Self { state }
    }

    pub fn run(&self, network: &Network) -> GridResult<Vec<InferredPhases>> {
        let mut tracking = BTreeMap::new();

        loop {
            let missing: Vec<TerminalId> = network
                .terminals()
                .iter()
                .filter(|t| self.connected_to_others(network, t) && self.has_none_phase(t))
                .map(Terminal::id)
                .collect();
            let missing_xy: Vec<TerminalId> = missing
                .iter()
                .copied()
                .filter(|t| {
                    network
                        .terminal(*t)
                        .is_some_and(|t| t.phases().contains(SinglePhaseKind::X) || t.phases().contains(SinglePhaseKind::Y))
                })
                .collect();

            let nominal = self.process(network, &missing, &mut tracking, |t, tracking| {
                self.set_missing_to_nominal(network, t, tracking)
            })?;
            let xy_one = self.process(network, &missing_xy, &mut tracking, |t, tracking| {
                self.infer_xy(network, t, 1, tracking)
            })?;
            let xy_any = self.process(network, &missing_xy, &mut tracking, |t, tracking| {
                self.infer_xy(network, t, 4, tracking)
            })?;

            if !(nominal || xy_one || xy_any) {
                break;
            }
        }

        for (equipment, suspect) in &tracking {
            let mrid = network.equipment(*equipment).map_or("", |eq| eq.mrid());
            if *suspect {
                tracing::warn!(
                    equipment = mrid,
                    state = %self.state.state(),
                    "inferred missing phases which may not be correct; fix upstream phasing in the source data"
                );
            } else {
                tracing::warn!(
                    equipment = mrid,
                    state = %self.state.state(),
                    "inferred missing phase which should be correct; fix upstream phasing in the source data"
                );
            }
        }

        Ok(tracking
            .into_iter()
            .map(|(equipment, suspect)| InferredPhases { equipment, suspect })
            .collect())
    }

    /// Run `infer` over the gaps at the edge of the energised network until it
    /// stops making progress. Returns whether it ever did.
    fn process(
        &self,
        network: &Network,
        terminals: &[TerminalId],
        tracking: &mut BTreeMap<EquipmentId, bool>,
        mut infer: impl FnMut(TerminalId, &mut BTreeMap<EquipmentId, bool>) -> GridResult<bool>,
    ) -> GridResult<bool> {
        let mut processed = false;
        loop {
            let mut progressed = false;
            for terminal in self.edge_of_missing(network, terminals) {
                progressed |= infer(terminal, tracking)?;
            }
            processed |= progressed;
            if !progressed {
                return Ok(processed);
            }
        }
    }

    /// Terminals with a gap whose node has a fully energised neighbour.
    /// Downstream neighbours feeding upstream-facing terminals are preferred,
    /// then any downstream neighbour, then any neighbour at all.
    fn edge_of_missing(&self, network: &Network, terminals: &[TerminalId]) -> Vec<TerminalId> {
        let fed_by = |terminal: &Terminal, accept: &dyn Fn(&Terminal) -> bool| {
            network.connected_terminals(terminal.id()).any(|other| {
                network
                    .terminal(other)
                    .is_some_and(|other| accept(other) && !self.has_none_phase(other))
            })
        };
        let downstream =
            |t: &Terminal| self.state.direction(t).contains(FeederDirection::DOWNSTREAM);
        let upstream = |t: &Terminal| self.state.direction(t).contains(FeederDirection::UPSTREAM);

        let tiers: [&dyn Fn(&Terminal) -> bool; 3] = [
            &|t: &Terminal| upstream(t) && fed_by(t, &downstream),
            &|t: &Terminal| fed_by(t, &downstream),
            &|t: &Terminal| fed_by(t, &|_: &Terminal| true),
        ];
        for tier in tiers {
            let found: Vec<TerminalId> = terminals
                .iter()
                .copied()
                .filter(|id| {
                    network
                        .terminal(*id)
                        .is_some_and(|t| self.has_none_phase(t) && tier(t))
                })
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    fn set_missing_to_nominal(
        &self,
        network: &Network,
        terminal: TerminalId,
        tracking: &mut BTreeMap<EquipmentId, bool>,
    ) -> GridResult<bool> {
        let t = network.try_terminal(terminal)?;
        let mut status = self.state.phase_status(t);
        let mut changed = false;
        for nominal in t.phases().single_phases() {
            if nominal.is_xy() || status.phase(*nominal)? != SinglePhaseKind::None {
                continue;
            }
            changed |= status.set_phase(*nominal, *nominal)?;
        }
        if !changed {
            return Ok(false);
        }

        self.state.set_phase_status(t, status);
        self.continue_phases(network, terminal)?;
        if let Some(equipment) = t.equipment() {
            tracking.insert(equipment, false);
        }
        Ok(true)
    }

    /// Guess the unset X/Y phases of `terminal` when at most `max_missing`
    /// of its phases are unset.
    fn infer_xy(
        &self,
        network: &Network,
        terminal: TerminalId,
        max_missing: usize,
        tracking: &mut BTreeMap<EquipmentId, bool>,
    ) -> GridResult<bool> {
        let t = network.try_terminal(terminal)?;
        let Some(equipment) = t.equipment() else {
            return Ok(false);
        };

        let mut status = self.state.phase_status(t);
        let mut missing = Vec::new();
        let mut used = Vec::new();
        for nominal in t.phases().single_phases() {
            match status.phase(*nominal)? {
                SinglePhaseKind::None => missing.push(*nominal),
                phase => used.push(phase),
            }
        }
        if missing.is_empty() || missing.len() > max_missing {
            return Ok(false);
        }
        tracking.insert(equipment, true);

        let mut changed = false;
        for nominal in missing {
            let phase = match nominal {
                SinglePhaseKind::X => {
                    let y = status.phase(SinglePhaseKind::Y)?;
                    first_unused(&X_PRIORITY, &used, |p| is_before(p, y))
                }
                SinglePhaseKind::Y => {
                    let x = status.phase(SinglePhaseKind::X)?;
                    first_unused(&Y_PRIORITY, &used, |p| is_after(p, x))
                }
                _ => SinglePhaseKind::None,
            };
            if phase != SinglePhaseKind::None {
                status.set_phase(nominal, phase)?;
                used.push(phase);
                changed = true;
            }
        }

        self.state.set_phase_status(t, status);
        self.continue_phases(network, terminal)?;
        Ok(changed)
    }

    /// Carry the phases of `terminal` through its equipment and onward.
    fn continue_phases(&self, network: &Network, terminal: TerminalId) -> GridResult<()> {
        let set_phases = SetPhases::new(self.state);
        let others: Vec<TerminalId> = network.other_terminals(terminal).collect();
        for other in others {
            set_phases.spread(network, terminal, other)?;
            set_phases.flow_from(network, other)?;
        }
        Ok(())
    }

    fn connected_to_others(&self, network: &Network, terminal: &Terminal) -> bool {
        network.connected_terminals(terminal.id()).next().is_some()
    }

    fn has_none_phase(&self, terminal: &Terminal) -> bool {
        let status = self.state.phase_status(terminal);
        terminal
            .phases()
            .single_phases()
            .iter()
            .any(|nominal| status.phase(*nominal).is_ok_and(|p| p == SinglePhaseKind::None))
    }
}

fn first_unused(
    priority: &[SinglePhaseKind],
    used: &[SinglePhaseKind],
    valid: impl Fn(SinglePhaseKind) -> bool,
) -> SinglePhaseKind {
    priority
        .iter()
        .copied()
        .find(|p| !used.contains(p) && valid(*p))
        .unwrap_or(SinglePhaseKind::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use SinglePhaseKind::{A, B, C};

    #[test]
    fn first_unused_respects_order_and_bounds() {
        assert_eq!(first_unused(&X_PRIORITY, &[A], |_| true), B);
        assert_eq!(first_unused(&Y_PRIORITY, &[], |p| is_after(p, C)), SinglePhaseKind::None);
        assert_eq!(first_unused(&Y_PRIORITY, &[C], |p| is_after(p, A)), B);
    }
}
