//! Items queued by a network trace.

use gt_core::{EquipmentId, NominalPhasePath, PhaseSet, TerminalId};

/// One hop between two terminals.
///
/// A hop between terminals of the same equipment is *internal*; a hop across
/// a connectivity node is *external*. The start of a trace is recorded as an
/// internal hop from the start terminal to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPath {
    pub from_terminal: TerminalId,
    pub to_terminal: TerminalId,
    pub from_equipment: EquipmentId,
    pub to_equipment: EquipmentId,
    /// Phases wired through this hop. Empty when the trace ignores phases.
    pub nominal_phase_paths: Vec<NominalPhasePath>,
}

impl StepPath {
    pub fn traced_internally(&self) -> bool {
        self.from_equipment == self.to_equipment
    }

    pub fn traced_externally(&self) -> bool {
        !self.traced_internally()
    }

    /// Nominal phases energised at the arrival terminal.
    pub fn to_phases(&self) -> PhaseSet {
        self.nominal_phase_paths.iter().map(|p| p.to).collect()
    }
}

/// A queued trace item: the hop taken plus the payload computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTraceStep<D> {
    pub path: StepPath,
    /// Hops taken since the start terminal.
    pub num_terminal_steps: usize,
    /// Internal hops taken since the start terminal.
    pub num_equipment_steps: usize,
    pub data: D,
}

impl<D> NetworkTraceStep<D> {
    pub(crate) fn start(path: StepPath, data: D) -> Self {
        Self {
            path,
            num_terminal_steps: 0,
            num_equipment_steps: 0,
            data,
        }
    }

    pub(crate) fn next(&self, path: StepPath, data: D) -> Self {
        let equipment_step = usize::from(path.traced_internally());
        Self {
            path,
            num_terminal_steps: self.num_terminal_steps + 1,
            num_equipment_steps: self.num_equipment_steps + equipment_step,
            data,
        }
    }

    pub fn is_start(&self) -> bool {
        self.num_terminal_steps == 0
    }
}

/// Visited-state key of a step: where it arrived and on which phases.
pub(crate) fn visit_key<D>(step: &NetworkTraceStep<D>) -> (TerminalId, PhaseSet) {
    (step.path.to_terminal, step.path.to_phases())
}
