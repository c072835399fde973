//! Traversal that forks into branches.
//!
//! Branches live in an arena owned by the traversal. Each branch keeps its
//! own visited tracker plus a link to the branch that spawned it, so
//! `has_visited` consults the whole ancestor lineage while siblings stay
//! independent of each other.

use std::fmt;

use gt_core::GridResult;

use crate::error::TraversalError;
use crate::queue::Queue;
use crate::steps::{Hooks, NextSteps};
use crate::tracker::Tracker;

/// Identifies one branch of a [`BranchingTraversal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(usize);

impl BranchId {
    /// The branch a run starts on.
    pub const ROOT: Self = BranchId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "branch {}", self.0)
    }
}

type TrackerFactory<'a, T> = Box<dyn Fn() -> Box<dyn Tracker<T> + 'a> + 'a>;
type BranchStart<'a, T> = Box<dyn FnMut(&T, BranchId) -> GridResult<()> + 'a>;

struct Branch<'a, T> {
    parent: Option<BranchId>,
    tracker: Box<dyn Tracker<T> + 'a>,
    queue: Queue<'a, T>,
    branch_queue: Queue<'a, T>,
}

/// A traversal whose queue-next may fork into child branches.
///
/// A branch first drains its own queue. The branch starts it collected are
/// then taken from its branch queue one at a time; each becomes a child
/// branch which runs, and whose own children run, before the next sibling
/// is started.
pub struct BranchingTraversal<'a, T> {
    hooks: Hooks<'a, T>,
    branches: Vec<Branch<'a, T>>,
    tracker_factory: TrackerFactory<'a, T>,
    on_branch_start: Option<BranchStart<'a, T>>,
    has_run: bool,
}

impl<'a, T> BranchingTraversal<'a, T> {
    /// `queue` orders items within a branch and `branch_queue` orders the
    /// branch starts of a branch. Every branch gets a fresh tracker from
    /// `tracker_factory`.
    pub fn new(
        queue: Queue<'a, T>,
        branch_queue: Queue<'a, T>,
        tracker_factory: impl Fn() -> Box<dyn Tracker<T> + 'a> + 'a,
        queue_next: impl FnMut(&T, &mut NextSteps<'_, T>) -> GridResult<()> + 'a,
    ) -> Self {
        let root = Branch {
            parent: None,
            tracker: tracker_factory(),
            queue,
            branch_queue,
        };
        Self {
            hooks: Hooks::new(Box::new(queue_next)),
            branches: vec![root],
            tracker_factory: Box::new(tracker_factory),
            on_branch_start: None,
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

    pub fn add_queue_condition(
        &mut self,
        condition: impl FnMut(&T, &T) -> GridResult<bool> + 'a,
    ) -> &mut Self {
        self.hooks.add_queue_condition(Box::new(condition));
        self
    }

    pub fn add_step_action(
        &mut self,
        action: impl FnMut(&T, bool) -> GridResult<()> + 'a,
    ) -> &mut Self {
        self.hooks.add_step_action(Box::new(action));
        self
    }

    pub fn set_action_filter(&mut self, filter: impl FnMut(&T) -> bool + 'a) -> &mut Self {
        self.hooks.set_action_filter(Box::new(filter));
        self
    }

    /// Called with the start item of every child branch before it runs.
    pub fn set_on_branch_start(
        &mut self,
        hook: impl FnMut(&T, BranchId) -> GridResult<()> + 'a,
    ) -> &mut Self {
        self.on_branch_start = Some(Box::new(hook));
        self
    }

    pub fn has_run(&self) -> bool {
        self.has_run
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    pub fn parent(&self, branch: BranchId) -> GridResult<Option<BranchId>> {
        Ok(self.branch(branch)?.parent)
    }

    /// Whether `item` was visited on `branch` or any of its ancestors.
    pub fn has_visited(&self, branch: BranchId, item: &T) -> GridResult<bool> {
        self.branch(branch)?;
        Ok(lineage_visited(&self.branches, branch, item))
    }

    /// Create an empty child of `parent` with the parent's queue strategies.
    pub fn create_branch(&mut self, parent: BranchId) -> GridResult<BranchId> {
        let from = self.branch(parent)?;
        let child = Branch {
            parent: Some(parent),
            tracker: (self.tracker_factory)(),
            queue: from.queue.empty_like(),
            branch_queue: from.branch_queue.empty_like(),
        };
        let id = BranchId(self.branches.len());
        self.branches.push(child);
        Ok(id)
    }

    /// Run from `start` on the root branch, then every branch it spawns.
    pub fn run(&mut self, start: T, can_stop_on_start: bool) -> GridResult<()> {
        self.run_all([start], can_stop_on_start)
    }

    /// Run from every item of `starts`.
    ///
    /// A single start runs on the root branch. Several starts each get a
    /// child branch of the root, run to completion in order, so they do not
    /// share visited state.
    pub fn run_all(
        &mut self,
        starts: impl IntoIterator<Item = T>,
        can_stop_on_start: bool,
    ) -> GridResult<()> {
        if self.has_run {
            return Err(TraversalError::NotReset.into());
        }
        self.has_run = true;

        let mut starts: Vec<T> = starts.into_iter().collect();
        let mut visited = 0_usize;
        if starts.len() == 1 {
            if let Some(start) = starts.pop() {
                self.branches[BranchId::ROOT.0].queue.push(start);
                visited += self.drain(BranchId::ROOT, can_stop_on_start)?;
                visited += self.drain_branches(BranchId::ROOT)?;
            }
        } else {
            for start in starts {
                let child = self.create_branch(BranchId::ROOT)?;
                if let Some(hook) = self.on_branch_start.as_mut() {
                    hook(&start, child)?;
                }
                self.branches[child.0].queue.push(start);
                visited += self.drain(child, can_stop_on_start)?;
                visited += self.drain_branches(child)?;
            }
        }

        tracing::debug!(
            visited,
            branches = self.branches.len(),
            "branching traversal finished"
        );
        Ok(())
    }

    /// Run the branches spawned under `from`, depth first.
    fn drain_branches(&mut self, from: BranchId) -> GridResult<usize> {
        let mut visited = 0_usize;
        let mut stack = vec![from];
        while let Some(&top) = stack.last() {
            let Some(item) = self.branches[top.0].branch_queue.pop() else {
                stack.pop();
                continue;
            };
            let child = self.create_branch(top)?;
            if let Some(hook) = self.on_branch_start.as_mut() {
                hook(&item, child)?;
            }
            self.branches[child.0].queue.push(item);
            visited += self.drain(child, true)?;
            stack.push(child);
        }
        Ok(visited)
    }

    /// Discard every child branch and clear the root so the traversal can run again.
    pub fn reset(&mut self) {
        self.branches.truncate(1);
        let root = &mut self.branches[BranchId::ROOT.0];
        root.queue.clear();
        root.branch_queue.clear();
        root.tracker.clear();
        self.has_run = false;
    }

    fn branch(&self, id: BranchId) -> GridResult<&Branch<'a, T>> {
        self.branches
            .get(id.0)
            .ok_or_else(|| TraversalError::UnknownBranch { index: id.0 }.into())
    }

    /// Process the item queue of one branch until it is empty.
    fn drain(&mut self, id: BranchId, can_stop_on_first: bool) -> GridResult<usize> {
        let mut visited = 0_usize;
        let mut can_stop = can_stop_on_first;
        while let Some(item) = self.branches[id.0].queue.pop() {
            let fresh = !lineage_visited(&self.branches, id, &item)
                && self.branches[id.0].tracker.visit(&item);
            if fresh {
                visited += 1;
                if !self.hooks.on_visit(&item, can_stop)? {
                    let branches = &self.branches;
                    let (items, forks) = self
                        .hooks
                        .expand(&item, &|i: &T| lineage_visited(branches, id, i))?;
                    let branch = &mut self.branches[id.0];
                    branch.queue.extend(items);
                    branch.branch_queue.extend(forks);
                }
            }
            can_stop = true;
        }
        Ok(visited)
    }
}

fn lineage_visited<T>(branches: &[Branch<'_, T>], start: BranchId, item: &T) -> bool {
    let mut current = Some(start);
    while let Some(id) = current {
        let Some(branch) = branches.get(id.0) else {
            return false;
        };
        if branch.tracker.has_visited(item) {
            return true;
        }
        current = branch.parent;
    }
    false
}
