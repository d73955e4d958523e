//! Tick-driven runner for fixed-duration animations.
//!
//! Every animation in the engine (particle bursts, camera shake, flash) is a
//! [`TimedTask`].  The scheduler advances all of them once per render tick
//! with whatever time has passed, so tests can drive them with synthetic
//! time.  Tasks can be joined through a [`GroupId`]: the group completes on
//! the tick its last member finishes, and [`Scheduler::advance`] reports it.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::scene::SceneSink;

// ════════════════════════════════════════════════════════════════════════════
// TimedTask
// ════════════════════════════════════════════════════════════════════════════

/// A fixed-duration animation.
///
/// Lifecycle: dormant for `delay()`, then `start` once, then `update` once
/// per tick with progress in `[0, 1)`, then `finish` once when progress
/// reaches 1 (or the task is cancelled).
pub trait TimedTask {
    fn delay(&self) -> Duration { Duration::ZERO }

    fn duration(&self) -> Duration;

    fn start(&mut self, _scene: &mut dyn SceneSink) {}

    fn update(&mut self, progress: f32, scene: &mut dyn SceneSink);

    fn finish(&mut self, scene: &mut dyn SceneSink);
}

// ════════════════════════════════════════════════════════════════════════════
// Scheduler
// ════════════════════════════════════════════════════════════════════════════

/// Handle to a set of tasks spawned together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

/// What happened during one [`Scheduler::advance`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks whose `finish` ran this tick.
    pub finished_tasks:   usize,
    /// Groups whose last member finished this tick.
    pub completed_groups: Vec<GroupId>,
}

struct Scheduled {
    task:    Box<dyn TimedTask>,
    elapsed: Duration,
    started: bool,
    group:   Option<GroupId>,
}

#[derive(Default)]
pub struct Scheduler {
    tasks:      Vec<Scheduled>,
    /// Live groups → members still running.
    groups:     BTreeMap<GroupId, usize>,
    next_group: u64,
}

impl Scheduler {
    pub fn new() -> Self { Self::default() }

    /// Fire-and-forget.
    pub fn spawn(&mut self, task: Box<dyn TimedTask>) {
        self.push(task, None);
    }

    /// Spawn tasks as one joinable group.  An empty group completes on the
    /// next advance.
    pub fn spawn_group(&mut self, tasks: Vec<Box<dyn TimedTask>>) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        self.groups.insert(id, tasks.len());
        for task in tasks {
            self.push(task, Some(id));
        }
        id
    }

    fn push(&mut self, task: Box<dyn TimedTask>, group: Option<GroupId>) {
        self.tasks.push(Scheduled {
            task,
            elapsed: Duration::ZERO,
            started: false,
            group,
        });
    }

    /// Advance every task by `dt`.
    pub fn advance(&mut self, dt: Duration, scene: &mut dyn SceneSink) -> TickReport {
        let mut finished: Vec<Option<GroupId>> = Vec::new();

        self.tasks.retain_mut(|s| {
            s.elapsed += dt;
            let delay = s.task.delay();
            if s.elapsed < delay {
                return true;
            }
            if !s.started {
                s.task.start(scene);
                s.started = true;
            }

            let duration = s.task.duration();
            let running  = s.elapsed - delay;
            let progress = if duration.is_zero() {
                1.0
            } else {
                running.as_secs_f32() / duration.as_secs_f32()
            };

            if progress < 1.0 {
                s.task.update(progress, scene);
                true
            } else {
                s.task.finish(scene);
                finished.push(s.group);
                false
            }
        });

        let finished_tasks = finished.len();
        for group in finished.into_iter().flatten() {
            if let Some(remaining) = self.groups.get_mut(&group) {
                *remaining = remaining.saturating_sub(1);
            }
        }
        TickReport { finished_tasks, completed_groups: self.take_completed() }
    }

    /// Finish every member of `group` right now, started or not; dormant
    /// members skip `start`.  Returns false for an unknown or
    /// already-completed group.
    pub fn cancel_group(&mut self, group: GroupId, scene: &mut dyn SceneSink) -> bool {
        if self.groups.remove(&group).is_none() {
            return false;
        }
        self.tasks.retain_mut(|s| {
            if s.group != Some(group) {
                return true;
            }
            s.task.finish(scene);
            false
        });
        true
    }

    fn take_completed(&mut self) -> Vec<GroupId> {
        let done: Vec<GroupId> = self.groups
            .iter()
            .filter(|(_, remaining)| **remaining == 0)
            .map(|(&id, _)| id)
            .collect();
        for id in &done {
            self.groups.remove(id);
        }
        done
    }

    pub fn is_idle(&self) -> bool { self.tasks.is_empty() }
    pub fn len(&self) -> usize { self.tasks.len() }
    pub fn is_empty(&self) -> bool { self.tasks.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
