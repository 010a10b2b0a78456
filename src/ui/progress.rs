//! Progress reporting for the parallel dependency resolver
//!
//! Built on `linya`, which draws from whichever thread holds the lock. That
//! fits a rayon worker pool: each worker ticks the shared bar as it finishes
//! a package, with no dedicated drawing thread.

use linya::{Bar, Progress};
use std::sync::Mutex;

/// One bar covering the whole resolver run, ticked once per package
pub struct ResolveProgress {
  inner: Mutex<ProgressState>,
}

struct ProgressState {
  progress: Progress,
  bar: Bar,
}

impl ResolveProgress {
  /// Start a bar sized to the number of packages being resolved
  pub fn new(total: usize) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, "Resolving dependencies");
    Self {
      inner: Mutex::new(ProgressState { progress, bar }),
    }
  }

  /// Mark one package as resolved
  pub fn tick(&self) {
    let mut guard = self.inner.lock().unwrap();
    let state = &mut *guard;
    state.progress.inc_and_draw(&state.bar, 1);
  }
}
