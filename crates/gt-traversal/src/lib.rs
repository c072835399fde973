//! gt-traversal: domain-agnostic traversal engine for gridtrace.
//!
//! Provides:
//! - Queue strategies (FIFO, LIFO, priority-by-key)
//! - Visited trackers
//! - `Traversal`: stop conditions, queue conditions and step actions around a
//!   queue-next callback, with an explicit run/reset contract
//! - `BranchingTraversal`: forks into branches that share visited state with
//!   their ancestors but not with their siblings
//!
//! # Example
//!
//! ```
//! use gt_traversal::{BasicTracker, Queue, Traversal};
//!
//! // Walk 0..5 counting upwards.
//! let mut visited = Vec::new();
//! {
//!     let mut traversal = Traversal::new(Queue::fifo(), BasicTracker::new(), |n: &u32, next| {
//!         if *n < 4 {
//!             next.queue(n + 1);
//!         }
//!         Ok(())
//!     });
//!     traversal.add_step_action(|n, _| {
//!         visited.push(*n);
//!         Ok(())
//!     });
//!     traversal.run(0, true).unwrap();
//! }
//! assert_eq!(visited, vec![0, 1, 2, 3, 4]);
//! ```

pub mod branching;
pub mod error;
pub mod queue;
pub mod steps;
pub mod tracker;
pub mod traversal;

// Re-exports for ergonomics
pub use branching::{BranchId, BranchingTraversal};
pub use error::TraversalError;
pub use queue::Queue;
pub use steps::NextSteps;
pub use tracker::{BasicTracker, KeyedTracker, Tracker};
pub use traversal::Traversal;
