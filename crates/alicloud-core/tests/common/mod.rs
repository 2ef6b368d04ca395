//! Test doubles and common utilities for waiter contract tests
//!
//! This module provides a scripted accessor that replays a fixed sequence
//! of poll results and records every invocation.

#![allow(dead_code)]

use alicloud_core::error::{Error, Result};
use alicloud_core::traits::{LogicalState, Observation, StateAccessor};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;

/// One scripted poll result
#[derive(Debug, Clone)]
pub enum Step {
    /// Entity found in the given state
    Found(LogicalState),
    /// Accessor reports "not found" directly
    NotFound,
    /// Accessor fails with an API error classified as not found
    NotFoundError,
    /// Accessor fails with a throttling error
    Throttled,
    /// Accessor fails with a transport error
    NetworkFlake,
    /// Accessor fails with a non-transient API error
    Denied,
}

impl Step {
    fn to_result(&self) -> Result<Observation> {
        match self {
            Step::Found(state) => Ok(Observation::Found(*state)),
            Step::NotFound => Ok(Observation::NotFound),
            Step::NotFoundError => Err(Error::api("EntityNotExist.User.LoginProfile", "gone")),
            Step::Throttled => Err(Error::api("Throttling.User", "Request was denied due to user flow control")),
            Step::NetworkFlake => Err(Error::http("connection reset by peer")),
            Step::Denied => Err(Error::api("Forbidden.RAM", "User not authorized to operate on the specified resource")),
        }
    }
}

/// An accessor replaying a script; the last step repeats forever
pub struct ScriptedAccessor {
    script: Vec<Step>,
    /// Call counter for fetch()
    calls: Arc<AtomicUsize>,
    /// Instants of every fetch()
    instants: Arc<std::sync::Mutex<Vec<Instant>>>,
    /// Ids passed to fetch()
    ids: Arc<std::sync::Mutex<Vec<String>>>,
}

impl ScriptedAccessor {
    pub fn new(script: Vec<Step>) -> Self {
        assert!(!script.is_empty(), "script needs at least one step");
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            instants: Arc::new(std::sync::Mutex::new(Vec::new())),
            ids: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Accessor that always returns the same step
    pub fn always(step: Step) -> Self {
        Self::new(vec![step])
    }

    /// Get the number of times fetch() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Get the instants at which fetch() was called
    pub fn instants(&self) -> Vec<Instant> {
        self.instants.lock().unwrap().clone()
    }

    /// Get the ids fetch() was called with
    pub fn ids(&self) -> Vec<String> {
        self.ids.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StateAccessor for ScriptedAccessor {
    async fn fetch(&self, id: &str) -> Result<Observation> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.instants.lock().unwrap().push(Instant::now());
        self.ids.lock().unwrap().push(id.to_string());

        let step = self
            .script
            .get(index)
            .or_else(|| self.script.last())
            .expect("script is never empty");
        step.to_result()
    }
}
