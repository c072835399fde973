//! Callback storage shared by both traversal flavours.

use gt_core::GridResult;

/// Collects the successors a queue-next callback produces for one item.
///
/// Items passed to [`NextSteps::queue`] continue the current traversal.
/// Items passed to [`NextSteps::branch`] start new branches on a
/// [`BranchingTraversal`](crate::BranchingTraversal); on a plain
/// [`Traversal`](crate::Traversal) they are queued like any other item.
pub struct NextSteps<'v, T> {
    pub(crate) items: Vec<T>,
    pub(crate) branches: Vec<T>,
    visited: &'v dyn Fn(&T) -> bool,
}

impl<'v, T> NextSteps<'v, T> {
    pub(crate) fn new(visited: &'v dyn Fn(&T) -> bool) -> Self {
        Self {
            items: Vec::new(),
            branches: Vec::new(),
            visited,
        }
    }

    pub fn queue(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn branch(&mut self, item: T) {
        self.branches.push(item);
    }

    /// Whether the running traversal (or any ancestor branch) has visited `item`.
    pub fn has_visited(&self, item: &T) -> bool {
        (self.visited)(item)
    }
}

pub(crate) type QueueNext<'a, T> = Box<dyn FnMut(&T, &mut NextSteps<'_, T>) -> GridResult<()> + 'a>;
pub(crate) type StopCondition<'a, T> = Box<dyn FnMut(&T) -> GridResult<bool> + 'a>;
pub(crate) type QueueCondition<'a, T> = Box<dyn FnMut(&T, &T) -> GridResult<bool> + 'a>;
pub(crate) type StepAction<'a, T> = Box<dyn FnMut(&T, bool) -> GridResult<()> + 'a>;
pub(crate) type ActionFilter<'a, T> = Box<dyn FnMut(&T) -> bool + 'a>;

/// The user-supplied behaviour of a traversal.
pub(crate) struct Hooks<'a, T> {
    queue_next: QueueNext<'a, T>,
    stop_conditions: Vec<StopCondition<'a, T>>,
    queue_conditions: Vec<QueueCondition<'a, T>>,
    step_actions: Vec<StepAction<'a, T>>,
    action_filter: Option<ActionFilter<'a, T>>,
}

impl<'a, T> Hooks<'a, T> {
    pub(crate) fn new(queue_next: QueueNext<'a, T>) -> Self {
        Self {
            queue_next,
            stop_conditions: Vec::new(),
            queue_conditions: Vec::new(),
            step_actions: Vec::new(),
            action_filter: None,
        }
    }

    pub(crate) fn add_stop_condition(&mut self, condition: StopCondition<'a, T>) {
        self.stop_conditions.push(condition);
    }

    pub(crate) fn add_queue_condition(&mut self, condition: QueueCondition<'a, T>) {
        self.queue_conditions.push(condition);
    }

    pub(crate) fn add_step_action(&mut self, action: StepAction<'a, T>) {
        self.step_actions.push(action);
    }

    pub(crate) fn set_action_filter(&mut self, filter: ActionFilter<'a, T>) {
        self.action_filter = Some(filter);
    }

    /// Run stop conditions then step actions for a freshly visited item.
    ///
    /// Every stop condition is evaluated, in order, even once one has matched.
    /// Items rejected by the action filter never stop and run no actions.
    pub(crate) fn on_visit(&mut self, item: &T, can_stop: bool) -> GridResult<bool> {
        if let Some(filter) = self.action_filter.as_mut() {
            if !filter(item) {
                return Ok(false);
            }
        }

        let mut stopping = false;
        if can_stop {
            for condition in &mut self.stop_conditions {
                stopping |= condition(item)?;
            }
        }

        for action in &mut self.step_actions {
            action(item, stopping)?;
        }
        Ok(stopping)
    }

    /// Ask queue-next for successors of `item` and keep those every queue
    /// condition accepts.
    pub(crate) fn expand(
        &mut self,
        item: &T,
        visited: &dyn Fn(&T) -> bool,
    ) -> GridResult<(Vec<T>, Vec<T>)> {
        let mut next = NextSteps::new(visited);
        (self.queue_next)(item, &mut next)?;

        let NextSteps {
            items, branches, ..
        } = next;
        let items = self.accepted(items, item)?;
        let branches = self.accepted(branches, item)?;
        Ok((items, branches))
    }

    fn accepted(&mut self, candidates: Vec<T>, current: &T) -> GridResult<Vec<T>> {
        let mut accepted = Vec::with_capacity(candidates.len());
        'candidates: for candidate in candidates {
            for condition in &mut self.queue_conditions {
                if !condition(&candidate, current)? {
                    continue 'candidates;
                }
            }
            accepted.push(candidate);
        }
        Ok(accepted)
    }
}
