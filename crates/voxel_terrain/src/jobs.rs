//! JobCoordinator - batched background work with an explicit join.
//!
//! Jobs are submitted to rayon's thread pool without blocking. Results are
//! sent back over a channel and stay invisible until [`JobCoordinator::complete`]
//! joins the whole batch, so nothing is applied halfway through a cycle.
//!
//! ```text
//!   schedule ──► rayon::spawn ──► work() ──► channel ─┐
//!   schedule ──► rayon::spawn ──► work() ──► channel ─┤
//!                                                     ▼
//!                                complete(): wait for every outstanding job
//! ```
//!
//! A panicking job is caught and reported as [`TerrainError::JobPanicked`];
//! the remaining jobs of the batch still complete.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use web_time::Instant;

use crate::error::TerrainError;

/// Identifier of a scheduled job, unique per coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
  #[inline]
  pub fn raw(&self) -> u64 {
    self.0
  }
}

type JobMessage<T> = (JobId, std::thread::Result<T>);

/// Results of one joined batch, in scheduling order.
#[derive(Debug)]
pub struct JobBatch<T> {
  pub completed: Vec<(JobId, T)>,
  pub failed: Vec<TerrainError>,
  /// Wall time from the first schedule to the join.
  pub elapsed: Duration,
}

impl<T> JobBatch<T> {
  fn empty() -> Self {
    Self {
      completed: Vec::new(),
      failed: Vec::new(),
      elapsed: Duration::ZERO,
    }
  }

  pub fn len(&self) -> usize {
    self.completed.len() + self.failed.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Tracks outstanding jobs producing `T`.
pub struct JobCoordinator<T: Send + 'static> {
  sender: Sender<JobMessage<T>>,
  receiver: Receiver<JobMessage<T>>,
  outstanding: usize,
  next_id: u64,
  batch_start: Option<Instant>,
}

impl<T: Send + 'static> JobCoordinator<T> {
  pub fn new() -> Self {
    let (sender, receiver) = unbounded();
    Self {
      sender,
      receiver,
      outstanding: 0,
      next_id: 0,
      batch_start: None,
    }
  }

  /// Queue `work` on the rayon pool (non-blocking).
  pub fn schedule<F>(&mut self, work: F) -> JobId
  where
    F: FnOnce() -> T + Send + 'static,
  {
    let id = JobId(self.next_id);
    self.next_id += 1;
    self.outstanding += 1;
    self.batch_start.get_or_insert_with(Instant::now);

    let sender = self.sender.clone();
    rayon::spawn(move || {
      let result = catch_unwind(AssertUnwindSafe(work));
      // The coordinator owns a receiver for as long as jobs can be outstanding.
      let _ = sender.send((id, result));
    });
    id
  }

  /// Jobs scheduled since the last join.
  #[inline]
  pub fn outstanding(&self) -> usize {
    self.outstanding
  }

  #[inline]
  pub fn is_idle(&self) -> bool {
    self.outstanding == 0
  }

  /// Block until every outstanding job has finished and hand back the batch.
  pub fn complete(&mut self) -> JobBatch<T> {
    if self.outstanding == 0 {
      return JobBatch::empty();
    }

    let mut batch = JobBatch::empty();
    while self.outstanding > 0 {
      let Ok((id, result)) = self.receiver.recv() else {
        break;
      };
      self.outstanding -= 1;
      match result {
        Ok(output) => batch.completed.push((id, output)),
        Err(_) => {
          tracing::warn!(job = id.raw(), "job panicked");
          batch.failed.push(TerrainError::JobPanicked(id.raw()));
        }
      }
    }
    batch.completed.sort_unstable_by_key(|(id, _)| *id);
    batch.elapsed = self.batch_start.take().map(|t| t.elapsed()).unwrap_or_default();

    tracing::trace!(
      completed = batch.completed.len(),
      failed = batch.failed.len(),
      elapsed_us = batch.elapsed.as_micros() as u64,
      "job batch joined"
    );
    batch
  }
}

impl<T: Send + 'static> Default for JobCoordinator<T> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
#[path = "jobs_test.rs"]
mod jobs_test;
