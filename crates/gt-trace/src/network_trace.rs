//! Traces over the terminals of a network.

use gt_core::{EquipmentId, GridError, GridResult, NominalPhasePath, PhaseCode, TerminalId};
use gt_network::Network;
use gt_traversal::{BranchId, BranchingTraversal, KeyedTracker, NextSteps, Queue, Tracker, Traversal};

use crate::operators::NetworkStateOperators;
use crate::path_provider::{StepPathProvider, owner};
use crate::step::{NetworkTraceStep, StepPath, visit_key};

/// Which steps stop conditions and step actions are evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NetworkTraceActionType {
    /// Every step.
    #[default]
    AllSteps,
    /// The start step and the first arrival at each equipment, i.e. external hops.
    FirstStepOnEquipment,
}

/// Order in which a trace processes its queued steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueKind {
    #[default]
    BreadthFirst,
    DepthFirst,
}

/// Options for a basic (non-branching) trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkTraceOptions {
    pub queue: QueueKind,
    pub action_type: NetworkTraceActionType,
}

impl NetworkTraceOptions {
    pub fn queue<'q, T>(&self) -> Queue<'q, T> {
        match self.queue {
            QueueKind::BreadthFirst => Queue::fifo(),
            QueueKind::DepthFirst => Queue::lifo(),
        }
    }
}

/// What `compute_data` may consult besides the previous step and the next path.
pub struct TraceContext<'a> {
    pub network: &'a Network,
    pub state: &'a dyn NetworkStateOperators,
}

enum Engine<'a, D> {
    Basic(Traversal<'a, NetworkTraceStep<D>>),
    Branching(BranchingTraversal<'a, NetworkTraceStep<D>>),
}

/// Forward a builder call to whichever engine backs the trace.
macro_rules! on_engine {
    ($self:ident, $t:ident => $call:expr) => {
        match &mut $self.engine {
            Engine::Basic($t) => {
                $call;
            }
            Engine::Branching($t) => {
                $call;
            }
        }
    };
}

/// A traversal of [`NetworkTraceStep`]s over one network in one state.
///
/// Each step's payload is produced by `compute_data` from the step it
/// follows. Visited state is keyed on the arrival terminal and the phases
/// arriving there, so the same terminal may be revisited on other phases.
///
/// A branching trace forks whenever a step has more than one candidate hop;
/// a basic trace queues every candidate.
pub struct NetworkTrace<'a, D> {
    network: &'a Network,
    state: &'a dyn NetworkStateOperators,
    engine: Engine<'a, D>,
}

impl<'a, D: 'a> NetworkTrace<'a, D> {
    pub fn basic(
        network: &'a Network,
        state: &'a dyn NetworkStateOperators,
        queue: Queue<'a, NetworkTraceStep<D>>,
        compute_data: impl FnMut(&NetworkTraceStep<D>, &TraceContext<'_>, &StepPath) -> D + 'a,
    ) -> Self {
        let traversal = Traversal::new(
            queue,
            KeyedTracker::new(visit_key::<D>),
            queue_next(network, state, compute_data),
        );
        Self {
            network,
            state,
            engine: Engine::Basic(traversal),
        }
    }

    pub fn branching(
        network: &'a Network,
        state: &'a dyn NetworkStateOperators,
        queue: Queue<'a, NetworkTraceStep<D>>,
        branch_queue: Queue<'a, NetworkTraceStep<D>>,
        compute_data: impl FnMut(&NetworkTraceStep<D>, &TraceContext<'_>, &StepPath) -> D + 'a,
    ) -> Self {
        let traversal = BranchingTraversal::new(
            queue,
            branch_queue,
            || -> Box<dyn Tracker<NetworkTraceStep<D>> + 'a> {
                Box::new(KeyedTracker::new(visit_key::<D>))
            },
            queue_next(network, state, compute_data),
        );
        Self {
            network,
            state,
            engine: Engine::Branching(traversal),
        }
    }

    /// A basic trace configured from `options`.
    pub fn with_options(
        network: &'a Network,
        state: &'a dyn NetworkStateOperators,
        options: &NetworkTraceOptions,
        compute_data: impl FnMut(&NetworkTraceStep<D>, &TraceContext<'_>, &StepPath) -> D + 'a,
    ) -> Self {
        let mut trace = Self::basic(network, state, options.queue(), compute_data);
        trace.set_action_type(options.action_type);
        trace
    }

    pub fn set_action_type(&mut self, action_type: NetworkTraceActionType) -> &mut Self {
        let filter = move |step: &NetworkTraceStep<D>| match action_type {
            NetworkTraceActionType::AllSteps => true,
            NetworkTraceActionType::FirstStepOnEquipment => {
                step.is_start() || step.path.traced_externally()
            }
        };
        on_engine!(self, t => t.set_action_filter(filter));
        self
    }

    pub fn add_stop_condition(
        &mut self,
        condition: impl FnMut(&NetworkTraceStep<D>) -> GridResult<bool> + 'a,
    ) -> &mut Self {
        on_engine!(self, t => t.add_stop_condition(condition));
        self
    }

    /// Register a condition on `(next, current)` steps.
    pub fn add_queue_condition(
        &mut self,
        condition: impl FnMut(&NetworkTraceStep<D>, &NetworkTraceStep<D>) -> GridResult<bool> + 'a,
    ) -> &mut Self {
        on_engine!(self, t => t.add_queue_condition(condition));
        self
    }

    pub fn add_step_action(
        &mut self,
        action: impl FnMut(&NetworkTraceStep<D>, bool) -> GridResult<()> + 'a,
    ) -> &mut Self {
        on_engine!(self, t => t.add_step_action(action));
        self
    }

    /// Hook run before each branch of a branching trace. Basic traces never branch.
    pub fn set_on_branch_start(
        &mut self,
        hook: impl FnMut(&NetworkTraceStep<D>, BranchId) -> GridResult<()> + 'a,
    ) -> &mut Self {
        if let Engine::Branching(t) = &mut self.engine {
            t.set_on_branch_start(hook);
        }
        self
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn state(&self) -> &'a dyn NetworkStateOperators {
        self.state
    }

    pub fn has_run(&self) -> bool {
        match &self.engine {
            Engine::Basic(t) => t.has_run(),
            Engine::Branching(t) => t.has_run(),
        }
    }

    /// Trace outward from `start`, seeding the start step with `data`.
    ///
    /// When `phases` is given only those phases (of the ones the terminal
    /// carries) are traced, and hops that carry none of them are not taken.
    pub fn run(
        &mut self,
        start: TerminalId,
        data: D,
        phases: Option<PhaseCode>,
        can_stop_on_start: bool,
    ) -> GridResult<()> {
        let step = self.start_step(start, data, phases)?;
        match &mut self.engine {
            Engine::Basic(t) => t.run(step, can_stop_on_start),
            Engine::Branching(t) => t.run(step, can_stop_on_start),
        }
    }

    /// Trace outward from every terminal of `equipment`, each seeded with a
    /// copy of `data`.
    ///
    /// A basic trace shares visited state between the starts. A branching
    /// trace runs each start on its own branch. With `phases`, terminals
    /// carrying none of them are skipped; it is an error only when every
    /// terminal is.
    pub fn run_from_equipment(
        &mut self,
        equipment: EquipmentId,
        data: D,
        phases: Option<PhaseCode>,
        can_stop_on_start: bool,
    ) -> GridResult<()>
    where
        D: Clone,
    {
        let network = self.network;
        let eq = network.try_equipment(equipment)?;
        let mut steps = Vec::with_capacity(eq.num_terminals());
        let mut rejected = None;
        for &terminal in eq.terminals() {
            match self.start_step(terminal, data.clone(), phases) {
                Ok(step) => steps.push(step),
                Err(err @ GridError::InvalidPhase { .. }) => rejected = Some(err),
                Err(err) => return Err(err),
            }
        }
        if steps.is_empty() {
            return Err(rejected.unwrap_or_else(|| GridError::InvalidPhase {
                what: format!("{} has no terminals to trace from", eq.mrid()),
            }));
        }

        match &mut self.engine {
            Engine::Basic(t) => t.run_all(steps, can_stop_on_start),
            Engine::Branching(t) => t.run_all(steps, can_stop_on_start),
        }
    }

    fn start_step(
        &self,
        start: TerminalId,
        data: D,
        phases: Option<PhaseCode>,
    ) -> GridResult<NetworkTraceStep<D>> {
        let terminal = self.network.try_terminal(start)?;
        let equipment = owner(terminal)?;

        let nominal_phase_paths = match phases {
            None => Vec::new(),
            Some(code) => {
                let paths: Vec<_> = code
                    .single_phases()
                    .iter()
                    .copied()
                    .filter(|phase| terminal.phases().contains(*phase))
                    .map(NominalPhasePath::straight)
                    .collect();
                if paths.is_empty() {
                    return Err(GridError::InvalidPhase {
                        what: format!("terminal {} carries none of {code}", terminal.mrid()),
                    });
                }
                paths
            }
        };

        tracing::debug!(
            terminal = terminal.mrid(),
            state = %self.state.state(),
            "starting network trace"
        );
        Ok(NetworkTraceStep::start(
            StepPath {
                from_terminal: start,
                to_terminal: start,
                from_equipment: equipment,
                to_equipment: equipment,
                nominal_phase_paths,
            },
            data,
        ))
    }

    /// Clear queued steps and visited state so the trace can run again.
    pub fn reset(&mut self) {
        match &mut self.engine {
            Engine::Basic(t) => t.reset(),
            Engine::Branching(t) => t.reset(),
        }
    }
}

fn queue_next<'a, D: 'a>(
    network: &'a Network,
    state: &'a dyn NetworkStateOperators,
    mut compute_data: impl FnMut(&NetworkTraceStep<D>, &TraceContext<'_>, &StepPath) -> D + 'a,
) -> impl FnMut(&NetworkTraceStep<D>, &mut NextSteps<'_, NetworkTraceStep<D>>) -> GridResult<()> + 'a
{
    let provider = StepPathProvider::new(network, state);
    let context = TraceContext { network, state };
    move |current: &NetworkTraceStep<D>, next: &mut NextSteps<'_, NetworkTraceStep<D>>| {
        let paths = provider.next_paths(&current.path)?;
        let fork = paths.len() > 1;
        for path in paths {
            let data = compute_data(current, &context, &path);
            let step = current.next(path, data);
            if fork {
                next.branch(step);
            } else {
                next.queue(step);
            }
        }
        Ok(())
    }
}
