//! Single-queue traversal.

use gt_core::GridResult;

use crate::error::TraversalError;
use crate::queue::Queue;
use crate::steps::{Hooks, NextSteps};
use crate::tracker::Tracker;

/// A generic traversal over items of type `T`.
///
/// For each dequeued item that has not been visited yet:
/// 1. every stop condition is evaluated in registration order,
/// 2. every step action runs in registration order with the stopping flag,
/// 3. unless stopping, queue-next produces successors, which are queued when
///    every queue condition accepts them.
///
/// A traversal runs once; `reset` clears the queue and visited state so it
/// can run again.
pub struct Traversal<'a, T> {
    hooks: Hooks<'a, T>,
    queue: Queue<'a, T>,
    tracker: Box<dyn Tracker<T> + 'a>,
    has_run: bool,
}

impl<'a, T> Traversal<'a, T> {
    pub fn new(
        queue: Queue<'a, T>,
        tracker: impl Tracker<T> + 'a,
        queue_next: impl FnMut(&T, &mut NextSteps<'_, T>) -> GridResult<()> + 'a,
    ) -> Self {
        Self {
            hooks: Hooks::new(Box::new(queue_next)),
            queue,
            tracker: Box::new(tracker),
            has_run: false,
        }
    }

    pub fn add_stop_condition(
        &mut self,
        condition: impl FnMut(&T) -> GridResult<bool> + 'a,
    ) -> &mut Self {
        self.hooks.add_stop_condition(Box::new(condition));
        self
    }

    /// Register a condition on `(next, current)` that must hold for `next` to be queued.
    pub fn add_queue_condition(
        &mut self,
        condition: impl FnMut(&T, &T) -> GridResult<bool> + 'a,
    ) -> &mut Self {
        self.hooks.add_queue_condition(Box::new(condition));
        self
    }

    /// Register an action receiving each visited item and whether it is stopping.
    pub fn add_step_action(
        &mut self,
        action: impl FnMut(&T, bool) -> GridResult<()> + 'a,
    ) -> &mut Self {
        self.hooks.add_step_action(Box::new(action));
        self
    }

    /// Restrict stop conditions and step actions to items accepted by `filter`.
    pub fn set_action_filter(&mut self, filter: impl FnMut(&T) -> bool + 'a) -> &mut Self {
        self.hooks.set_action_filter(Box::new(filter));
        self
    }

    pub fn has_visited(&self, item: &T) -> bool {
        self.tracker.has_visited(item)
    }

    pub fn has_run(&self) -> bool {
        self.has_run
    }

    /// Run from `start`. When `can_stop_on_start` is false the start item is
    /// never treated as stopping.
    pub fn run(&mut self, start: T, can_stop_on_start: bool) -> GridResult<()> {
        self.run_all([start], can_stop_on_start)
    }

    /// Run from each of `starts` in turn, draining the queue after each.
    /// Visited state is shared between them.
    pub fn run_all(
        &mut self,
        starts: impl IntoIterator<Item = T>,
        can_stop_on_start: bool,
    ) -> GridResult<()> {
        if self.has_run {
            return Err(TraversalError::NotReset.into());
        }
        self.has_run = true;

        let mut visited = 0_usize;
        for start in starts {
            self.queue.push(start);
            let mut can_stop = can_stop_on_start;
            while let Some(item) = self.queue.pop() {
                if self.tracker.visit(&item) {
                    visited += 1;
                    if !self.hooks.on_visit(&item, can_stop)? {
                        let tracker = &self.tracker;
                        let (items, branches) = self
                            .hooks
                            .expand(&item, &|i: &T| tracker.has_visited(i))?;
                        self.queue.extend(items);
                        self.queue.extend(branches);
                    }
                }
                can_stop = true;
            }
        }

        tracing::debug!(visited, "traversal finished");
        Ok(())
    }

    /// Clear the queue and visited state so the traversal can run again.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.tracker.clear();
        self.has_run = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::BasicTracker;
    use gt_core::GridError;
    use std::cell::RefCell;

    /// Edges of a small directed graph with a cycle: 0 -> 1 -> 2 -> 0, 1 -> 3.
    fn successors(n: &u32) -> Vec<u32> {
        match n {
            0 => vec![1],
            1 => vec![2, 3],
            2 => vec![0],
            _ => vec![],
        }
    }

    fn graph_traversal<'a>(queue: Queue<'a, u32>) -> Traversal<'a, u32> {
        Traversal::new(queue, BasicTracker::new(), |n: &u32, next| {
            for s in successors(n) {
                next.queue(s);
            }
            Ok(())
        })
    }

    #[test]
    fn visits_each_item_once_despite_cycle() {
        let seen = RefCell::new(Vec::new());
        let mut traversal = graph_traversal(Queue::fifo());
        traversal.add_step_action(|n, _| {
            seen.borrow_mut().push(*n);
            Ok(())
        });
        traversal.run(0, true).unwrap();
        drop(traversal);
        assert_eq!(seen.into_inner(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn lifo_goes_depth_first() {
        let seen = RefCell::new(Vec::new());
        let mut traversal = graph_traversal(Queue::lifo());
        traversal.add_step_action(|n, _| {
            seen.borrow_mut().push(*n);
            Ok(())
        });
        traversal.run(0, true).unwrap();
        drop(traversal);
        assert_eq!(seen.into_inner(), vec![0, 1, 3, 2]);
    }

    #[test]
    fn several_starts_share_visited_state() {
        let seen = RefCell::new(Vec::new());
        let mut traversal = graph_traversal(Queue::fifo());
        traversal.add_step_action(|n, _| {
            seen.borrow_mut().push(*n);
            Ok(())
        });
        traversal.run_all([3, 0], true).unwrap();
        drop(traversal);
        assert_eq!(seen.into_inner(), vec![3, 0, 1, 2]);
    }

    #[test]
    fn every_stop_condition_runs_before_actions() {
        let log = RefCell::new(Vec::new());
        let mut traversal = graph_traversal(Queue::fifo());
        traversal
            .add_stop_condition(|n| {
                log.borrow_mut().push(format!("stop1:{n}"));
                Ok(*n == 1)
            })
            .add_stop_condition(|n| {
                log.borrow_mut().push(format!("stop2:{n}"));
                Ok(false)
            })
            .add_step_action(|n, stopping| {
                log.borrow_mut().push(format!("action:{n}:{stopping}"));
                Ok(())
            });
        traversal.run(0, true).unwrap();
        drop(traversal);

        assert_eq!(
            log.into_inner(),
            vec![
                "stop1:0", "stop2:0", "action:0:false", "stop1:1", "stop2:1", "action:1:true",
            ]
        );
    }

    #[test]
    fn start_item_can_be_exempt_from_stopping() {
        let mut traversal = graph_traversal(Queue::fifo());
        traversal.add_stop_condition(|n| Ok(*n == 0));
        traversal.run(0, false).unwrap();
        assert!(traversal.has_visited(&3));

        traversal.reset();
        traversal.run(0, true).unwrap();
        assert!(!traversal.has_visited(&1));
    }

    #[test]
    fn queue_conditions_filter_successors() {
        let mut traversal = graph_traversal(Queue::fifo());
        traversal.add_queue_condition(|next, current| Ok(!(*current == 1 && *next == 3)));
        traversal.run(0, true).unwrap();
        assert!(traversal.has_visited(&2));
        assert!(!traversal.has_visited(&3));
    }

    #[test]
    fn rerun_without_reset_is_an_error() {
        let mut traversal = graph_traversal(Queue::fifo());
        traversal.run(0, true).unwrap();
        assert!(traversal.has_run());
        assert!(matches!(traversal.run(0, true), Err(GridError::Traversal { .. })));

        traversal.reset();
        assert!(!traversal.has_visited(&0));
        traversal.run(2, true).unwrap();
    }

    #[test]
    fn callback_errors_abort_the_run() {
        let visited = RefCell::new(0);
        let mut traversal = graph_traversal(Queue::fifo());
        traversal.add_step_action(|n, _| {
            *visited.borrow_mut() += 1;
            if *n == 1 {
                return Err(GridError::tracing("boom"));
            }
            Ok(())
        });
        assert_eq!(traversal.run(0, true), Err(GridError::tracing("boom")));
        drop(traversal);
        assert_eq!(visited.into_inner(), 2);
    }

    #[test]
    fn action_filter_skips_conditions_and_actions() {
        let seen = RefCell::new(Vec::new());
        let mut traversal = graph_traversal(Queue::fifo());
        traversal
            .set_action_filter(|n| n % 2 == 0)
            .add_stop_condition(|n| Ok(*n == 1))
            .add_step_action(|n, _| {
                seen.borrow_mut().push(*n);
                Ok(())
            });
        traversal.run(0, true).unwrap();
        drop(traversal);
        // 1 is never actioned, so it cannot stop and 2 is still reached.
        assert_eq!(seen.into_inner(), vec![0, 2]);
    }
}
