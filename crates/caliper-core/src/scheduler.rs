//! Deferred task scheduler for one-shot callback execution.
//!
//! The scheduler allows deferring a callback to a specific time. It
//! integrates with the host event loop, which calls
//! [`SharedTaskScheduler::process_ready`] whenever it wakes and can use
//! [`SharedTaskScheduler::time_until_next`] to bound its poll timeout.
//!
//! Every scheduled task is a cancellable one-shot: it either runs once at
//! its deadline or is cancelled before that, never both.
//!
//! # Example
//!
//! ```
//! use caliper_core::SharedTaskScheduler;
//! use std::time::Duration;
//!
//! let scheduler = SharedTaskScheduler::new();
//!
//! let id = scheduler.schedule_once(Duration::from_millis(200), || {
//!     println!("deadline reached");
//! });
//!
//! // The host loop periodically drains due tasks:
//! scheduler.process_ready();
//!
//! // A pending task can be cancelled at any point before it runs:
//! let _ = scheduler.cancel(id);
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, SchedulerError};

new_key_type! {
    /// A unique identifier for a scheduled task.
    pub struct ScheduledTaskId;
}

/// A boxed task closure.
type BoxedScheduledTask = Box<dyn FnMut() + Send + 'static>;

/// Internal scheduled task data.
struct ScheduledTaskData {
    /// When this task should execute.
    run_at: Instant,
    /// Whether this task is active.
    active: bool,
    /// The task closure to execute.
    task: BoxedScheduledTask,
}

/// An entry in the scheduler queue (min-heap by execution time).
#[derive(Debug, Clone, Copy)]
struct SchedulerQueueEntry {
    id: ScheduledTaskId,
    run_time: Instant,
}

impl PartialEq for SchedulerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.run_time == other.run_time
    }
}

impl Eq for SchedulerQueueEntry {}

impl PartialOrd for SchedulerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchedulerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.run_time.cmp(&self.run_time)
    }
}

/// Manages deferred one-shot tasks.
///
/// The scheduler maintains a priority queue of tasks ordered by their
/// execution time. A task executes exactly once at (or after) its deadline
/// unless it is cancelled first.
pub struct TaskScheduler {
    /// All registered scheduled tasks.
    tasks: SlotMap<ScheduledTaskId, ScheduledTaskData>,
    /// Priority queue of pending task executions (min-heap by run time).
    queue: BinaryHeap<SchedulerQueueEntry>,
}

impl TaskScheduler {
    /// Create a new task scheduler.
    pub fn new() -> Self {
        Self {
            tasks: SlotMap::with_key(),
            queue: BinaryHeap::new(),
        }
    }

    /// Schedule a task to run once after the specified delay.
    ///
    /// Returns the task ID that can be used to cancel the task.
    pub fn schedule_once<F>(&mut self, delay: Duration, task: F) -> ScheduledTaskId
    where
        F: FnMut() + Send + 'static,
    {
        self.schedule_at(Instant::now() + delay, task)
    }

    /// Schedule a task to run once at the specified instant.
    ///
    /// Returns the task ID that can be used to cancel the task.
    pub fn schedule_at<F>(&mut self, instant: Instant, task: F) -> ScheduledTaskId
    where
        F: FnMut() + Send + 'static,
    {
        let data = ScheduledTaskData {
            run_at: instant,
            active: true,
            task: Box::new(task),
        };

        let id = self.tasks.insert(data);
        self.queue.push(SchedulerQueueEntry {
            id,
            run_time: instant,
        });

        id
    }

    /// Cancel a pending task.
    ///
    /// Returns `Ok(())` if the task was found and cancelled, or
    /// [`SchedulerError::InvalidTaskId`] if the ID is unknown, already
    /// cancelled, or the task has already run.
    pub fn cancel(&mut self, id: ScheduledTaskId) -> Result<()> {
        if let Some(task) = self.tasks.get_mut(id) {
            task.active = false;
            self.tasks.remove(id);
            Ok(())
        } else {
            Err(SchedulerError::InvalidTaskId.into())
        }
    }

    /// Check if a task is still pending.
    pub fn is_active(&self, id: ScheduledTaskId) -> bool {
        self.tasks.get(id).is_some_and(|t| t.active)
    }

    /// Get the duration until the next task is due, if any.
    ///
    /// Returns `None` if there are no pending tasks.
    pub fn time_until_next(&mut self) -> Option<Duration> {
        // Clean up cancelled entries from the front of the queue.
        while let Some(entry) = self.queue.peek() {
            if !self.tasks.get(entry.id).is_some_and(|t| t.active) {
                self.queue.pop();
            } else {
                break;
            }
        }

        self.queue.peek().map(|entry| {
            let now = Instant::now();
            if entry.run_time > now {
                entry.run_time - now
            } else {
                Duration::ZERO
            }
        })
    }

    /// Run all tasks that are due now.
    ///
    /// Returns the number of tasks that were executed. Executed tasks are
    /// removed; their IDs become invalid.
    #[tracing::instrument(skip(self), target = "caliper_core::scheduler", level = "trace")]
    pub fn process_ready(&mut self) -> usize {
        let now = Instant::now();
        let mut executed_count = 0;

        while let Some(entry) = self.queue.peek() {
            // Check if this task should run.
            if entry.run_time > now {
                break;
            }

            let entry = self.queue.pop().expect("peeked entry exists");
            let id = entry.id;

            // Check if task is still active.
            let Some(task_data) = self.tasks.get_mut(id) else {
                continue;
            };

            if !task_data.active {
                continue;
            }

            // Execute the task.
            tracing::trace!(target: "caliper_core::scheduler", ?id, "executing scheduled task");
            (task_data.task)();
            executed_count += 1;

            // One-shot tasks are removed after execution.
            task_data.active = false;
            self.tasks.remove(id);
        }

        executed_count
    }

    /// Get the number of pending tasks.
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|(_, t)| t.active).count()
    }

    /// Check if any task is due now.
    pub fn has_ready(&mut self) -> bool {
        // Clean up cancelled entries first.
        while let Some(entry) = self.queue.peek() {
            if !self.tasks.get(entry.id).is_some_and(|t| t.active) {
                self.queue.pop();
            } else {
                break;
            }
        }

        self.queue
            .peek()
            .is_some_and(|entry| entry.run_time <= Instant::now())
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A thread-safe, shareable handle around [`TaskScheduler`].
///
/// Components that need to defer work hold an `Arc<SharedTaskScheduler>`
/// injected at construction; the host event loop drains it.
///
/// Tasks run while the internal lock is held, so a task must not call back
/// into the scheduler that is running it. Schedule follow-up work from
/// outside the callback instead.
pub struct SharedTaskScheduler {
    inner: Mutex<TaskScheduler>,
}

impl SharedTaskScheduler {
    /// Create a new shared scheduler.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TaskScheduler::new()),
        }
    }

    /// Schedule a task to run once after the specified delay.
    pub fn schedule_once<F>(&self, delay: Duration, task: F) -> ScheduledTaskId
    where
        F: FnMut() + Send + 'static,
    {
        self.inner.lock().schedule_once(delay, task)
    }

    /// Schedule a task to run once at the specified instant.
    pub fn schedule_at<F>(&self, instant: Instant, task: F) -> ScheduledTaskId
    where
        F: FnMut() + Send + 'static,
    {
        self.inner.lock().schedule_at(instant, task)
    }

    /// Cancel a pending task.
    pub fn cancel(&self, id: ScheduledTaskId) -> Result<()> {
        self.inner.lock().cancel(id)
    }

    /// Check if a task is still pending.
    pub fn is_active(&self, id: ScheduledTaskId) -> bool {
        self.inner.lock().is_active(id)
    }

    /// Get the duration until the next task is due, if any.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.inner.lock().time_until_next()
    }

    /// Run all tasks that are due now. Returns the number executed.
    pub fn process_ready(&self) -> usize {
        self.inner.lock().process_ready()
    }

    /// Get the number of pending tasks.
    pub fn active_count(&self) -> usize {
        self.inner.lock().active_count()
    }

    /// Check if any task is due now.
    pub fn has_ready(&self) -> bool {
        self.inner.lock().has_ready()
    }
}

impl Default for SharedTaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(SharedTaskScheduler: Send, Sync);
