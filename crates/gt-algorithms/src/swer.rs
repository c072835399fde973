//! Single-wire-earth-return classification.

use std::cell::RefCell;
use std::collections::BTreeSet;

use gt_core::{EquipmentId, FeederId, GridError, GridResult, TerminalId, Voltage, volts};
use gt_network::{ConductingEquipment, Network, TransformerFunctionKind};
use gt_trace::{
    NetworkStateOperators, NetworkTrace, NetworkTraceActionType, NetworkTraceOptions, QueueKind,
    stop_at_open,
};

/// Voltage band of the low-voltage networks SWER transformers feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwerOptions {
    /// Exclusive lower bound.
    pub lv_min: Voltage,
    /// Inclusive upper bound.
    pub lv_max: Voltage,
}

impl Default for SwerOptions {
    fn default() -> Self {
        Self {
            lv_min: volts(1.0),
            lv_max: volts(1000.0),
        }
    }
}

impl SwerOptions {
    pub fn is_lv(&self, voltage: Voltage) -> bool {
        voltage > self.lv_min && voltage <= self.lv_max
    }
}

/// Result of a SWER classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwerEquipment {
    /// Equipment on the single-wire side of an isolator, isolators included.
    pub swer: BTreeSet<EquipmentId>,
    /// Low-voltage equipment energised through SWER.
    pub lv: BTreeSet<EquipmentId>,
}

impl SwerEquipment {
    pub fn all(&self) -> BTreeSet<EquipmentId> {
        self.swer.union(&self.lv).copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.swer.is_empty() && self.lv.is_empty()
    }
}

/// Finds SWER equipment and the LV equipment it energises.
///
/// A SWER isolator is an isolation transformer with both a single-phase and a
/// multi-phase terminal. All isolators in scope are classified before any
/// tracing, so a trace from one isolator always stops at the next.
pub struct FindSwerEquipment<'s> {
    state: &'s dyn NetworkStateOperators,
    options: SwerOptions,
}

impl<'s> FindSwerEquipment<'s> {
    pub fn new(state: &'s dyn NetworkStateOperators) -> Self {
        Self::with_options(state, SwerOptions::default())
    }

    pub fn with_options(state: &'s dyn NetworkStateOperators, options: SwerOptions) -> Self {
        Self { state, options }
    }

    pub fn find_all(&self, network: &Network) -> GridResult<SwerEquipment> {
        let isolators = network
            .equipment_list()
            .iter()
            .filter(|eq| is_swer_isolator(network, eq))
            .map(ConductingEquipment::id)
            .collect();
        self.classify(network, isolators)
    }

    /// Classify starting from the isolators assigned to `feeder` in the active state.
    pub fn find_on_feeder(&self, network: &Network, feeder: FeederId) -> GridResult<SwerEquipment> {
        let feeder = network
            .feeder(feeder)
            .ok_or_else(|| GridError::not_found(format!("feeder {feeder}")))?;
        let mut isolators = Vec::new();
        for id in self.state.feeder_equipment(feeder) {
            if is_swer_isolator(network, network.try_equipment(*id)?) {
                isolators.push(*id);
            }
        }
        self.classify(network, isolators)
    }

    fn classify(&self, network: &Network, isolators: Vec<EquipmentId>) -> GridResult<SwerEquipment> {
        let swer = RefCell::new(isolators.iter().copied().collect::<BTreeSet<_>>());
        let lv = RefCell::new(BTreeSet::new());
        for isolator in &isolators {
            let lv_sources = self.trace_swer(network, *isolator, &swer)?;
            for source in std::iter::once(*isolator).chain(lv_sources) {
                self.trace_lv(network, source, &swer, &lv)?;
            }
        }

        let result = SwerEquipment {
            swer: swer.into_inner(),
            lv: lv.into_inner(),
        };
        tracing::info!(
            isolators = isolators.len(),
            swer = result.swer.len(),
            lv = result.lv.len(),
            "SWER equipment classified"
        );
        Ok(result)
    }

    /// Mark everything reachable on the single-phase side of `isolator`.
    /// Returns the transformers reached that feed a multi-phase network.
    fn trace_swer(
        &self,
        network: &Network,
        isolator: EquipmentId,
        swer: &RefCell<BTreeSet<EquipmentId>>,
    ) -> GridResult<Vec<EquipmentId>> {
        let state = self.state;
        let lv_sources = RefCell::new(Vec::new());
        {
            let mut trace = NetworkTrace::with_options(network, state, &equipment_options(), |_, _, _| ());
            trace
                .add_queue_condition(stop_at_open(network, state))
                .add_stop_condition(move |step| {
                    let id = step.path.to_equipment;
                    if swer.borrow().contains(&id) {
                        return Ok(true);
                    }
                    Ok(!has_terminal(network, network.try_equipment(id)?, |n| n == 1))
                })
                .add_step_action(|step, stopping| {
                    if step.is_start() {
                        return Ok(());
                    }
                    let eq = network.try_equipment(step.path.to_equipment)?;
                    // Open points on the SWER network belong to it.
                    if !stopping || eq.as_switch().is_some() {
                        swer.borrow_mut().insert(eq.id());
                    }
                    if !stopping && eq.as_power_transformer().is_some() && has_terminal(network, eq, |n| n > 1) {
                        lv_sources.borrow_mut().push(eq.id());
                    }
                    Ok(())
                });

            for terminal in terminals_where(network, isolator, |n| n == 1)? {
                trace.reset();
                trace.run(terminal, (), None, false)?;
            }
        }
        Ok(lv_sources.into_inner())
    }

    /// Mark LV equipment reachable from the multi-phase side of `source`.
    fn trace_lv(
        &self,
        network: &Network,
        source: EquipmentId,
        swer: &RefCell<BTreeSet<EquipmentId>>,
        lv: &RefCell<BTreeSet<EquipmentId>>,
    ) -> GridResult<()> {
        let state = self.state;
        let options = self.options;
        let mut trace = NetworkTrace::with_options(network, state, &equipment_options(), |_, _, _| ());
        trace
            .add_queue_condition(stop_at_open(network, state))
            .add_queue_condition(move |next, _| {
                if next.path.traced_internally() {
                    return Ok(true);
                }
                let eq = network.try_equipment(next.path.to_equipment)?;
                Ok(eq.base_voltage.is_some_and(|v| options.is_lv(v)))
            })
            .add_stop_condition(move |step| Ok(swer.borrow().contains(&step.path.to_equipment)))
            .add_step_action(move |step, stopping| {
                if !step.is_start() && !stopping {
                    lv.borrow_mut().insert(step.path.to_equipment);
                }
                Ok(())
            });

        for terminal in terminals_where(network, source, |n| n > 1)? {
            trace.reset();
            trace.run(terminal, (), None, false)?;
        }
        Ok(())
    }
}

fn equipment_options() -> NetworkTraceOptions {
    NetworkTraceOptions {
        queue: QueueKind::BreadthFirst,
        action_type: NetworkTraceActionType::FirstStepOnEquipment,
    }
}

fn is_swer_isolator(network: &Network, eq: &ConductingEquipment) -> bool {
    eq.as_power_transformer()
        .is_some_and(|tx| tx.function == TransformerFunctionKind::IsolationTransformer)
        && has_terminal(network, eq, |n| n == 1)
        && has_terminal(network, eq, |n| n > 1)
}

/// Whether some terminal of `eq` has a phase count matching `test`.
fn has_terminal(network: &Network, eq: &ConductingEquipment, test: impl Fn(usize) -> bool) -> bool {
    eq.terminals()
        .iter()
        .filter_map(|t| network.terminal(*t))
        .any(|t| test(t.phases().num_phases()))
}

fn terminals_where(
    network: &Network,
    equipment: EquipmentId,
    test: impl Fn(usize) -> bool,
) -> GridResult<Vec<TerminalId>> {
    let eq = network.try_equipment(equipment)?;
    let mut terminals = Vec::new();
    for id in eq.terminals() {
        if test(network.try_terminal(*id)?.phases().num_phases()) {
            terminals.push(*id);
        }
    }
    Ok(terminals)
}
