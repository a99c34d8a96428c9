// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Deadline and cancellation handle threaded through every device call.
//!
//! A `Context` is cheap to clone. Children created with `with_timeout` or
//! `with_deadline` observe their parent's cancellation, and their deadline
//! never extends past the parent's.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Longest single nap taken by `Context::sleep` before re-checking for
/// cancellation.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug)]
struct Inner {
    deadline: Option<Instant>,
    cancelled: AtomicBool,
    parent: Option<Context>,
}

#[derive(Clone, Debug)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Context {
            inner: Arc::new(Inner {
                deadline: None,
                cancelled: AtomicBool::new(false),
                parent: None,
            }),
        }
    }

    /// Derive a child that expires `timeout` from now, or with the parent,
    /// whichever comes first.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child that expires at `deadline`, or with the parent,
    /// whichever comes first.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline() {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Context {
            inner: Arc::new(Inner {
                deadline: Some(deadline),
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline. `None` if there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    fn is_cancelled(&self) -> bool {
        let mut ctx = Some(self);
        while let Some(current) = ctx {
            if current.inner.cancelled.load(Ordering::SeqCst) {
                return true;
            }
            ctx = current.inner.parent.as_ref();
        }
        false
    }

    /// Why the context is done, or `None` if it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline() {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Sleep for `duration`, returning early with an error if the context
    /// is cancelled or its deadline passes first.
    pub fn sleep(&self, duration: Duration) -> Result<(), ContextError> {
        let wake = Instant::now() + duration;
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= wake {
                return Ok(());
            }
            let mut nap = (wake - now).min(SLEEP_SLICE);
            if let Some(remaining) = self.remaining() {
                nap = nap.min(remaining);
            }
            thread::sleep(nap);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
