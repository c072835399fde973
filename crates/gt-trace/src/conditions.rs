//! Reusable trace conditions.

use gt_core::{GridResult, SinglePhaseKind};
use gt_network::{ConductingEquipment, Network};

use crate::operators::NetworkStateOperators;
use crate::step::NetworkTraceStep;

/// Queue condition refusing internal hops through open equipment.
///
/// Without phase tracking any open phase blocks the hop. With phase tracking
/// the hop is blocked only when every phase it carries is open; individual
/// open phases are left to the trace itself.
pub fn stop_at_open<'a, D: 'a>(
    network: &'a Network,
    state: &'a dyn NetworkStateOperators,
) -> impl FnMut(&NetworkTraceStep<D>, &NetworkTraceStep<D>) -> GridResult<bool> + 'a {
    move |next: &NetworkTraceStep<D>, _current: &NetworkTraceStep<D>| {
        let path = &next.path;
        if !path.traced_internally() || path.from_terminal == path.to_terminal {
            return Ok(true);
        }
        let equipment = network.try_equipment(path.to_equipment)?;
        if path.nominal_phase_paths.is_empty() {
            return Ok(!state.is_open(equipment, None)?);
        }
        for phase_path in &path.nominal_phase_paths {
            let phase = match phase_path.from {
                SinglePhaseKind::None => phase_path.to,
                phase => phase,
            };
            if !state.is_open(equipment, Some(phase))? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Stop condition matching steps that arrive at `equipment` for which `test` holds.
pub fn stop_at_equipment<'a, D: 'a>(
    network: &'a Network,
    mut test: impl FnMut(&ConductingEquipment) -> bool + 'a,
) -> impl FnMut(&NetworkTraceStep<D>) -> GridResult<bool> + 'a {
    move |step: &NetworkTraceStep<D>| {
        let equipment = network.try_equipment(step.path.to_equipment)?;
        Ok(test(equipment))
    }
}
