//! Reading source abstraction.
//!
//! Provides a unified trait for polling reading batches from different
//! sources: the realtime database (HTTP), CSV replay, and scripted batches.

use async_trait::async_trait;
use std::collections::VecDeque;

use crate::acquisition::IngestError;
use crate::types::Reading;

/// Trait abstracting where readings come from.
///
/// Each poll returns the most recent bounded window of readings, sorted
/// ascending by timestamp. An empty window means "no data yet".
#[async_trait]
pub trait ReadingSource: Send + 'static {
    async fn poll(&mut self) -> Result<Vec<Reading>, IngestError>;

    /// Human-readable name for logging (e.g. "realtime-db", "CSV replay").
    fn source_name(&self) -> &str;
}

/// Replays pre-built poll results in order, then keeps returning the last
/// successful window.
pub struct ScriptedSource {
    script: VecDeque<Result<Vec<Reading>, IngestError>>,
    last: Vec<Reading>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<Reading>, IngestError>>) -> Self {
        Self {
            script: script.into(),
            last: Vec::new(),
        }
    }

    /// One successful batch per entry.
    pub fn from_batches(batches: Vec<Vec<Reading>>) -> Self {
        Self::new(batches.into_iter().map(Ok).collect())
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait]
impl ReadingSource for ScriptedSource {
    async fn poll(&mut self) -> Result<Vec<Reading>, IngestError> {
        match self.script.pop_front() {
            Some(Ok(batch)) => {
                self.last = batch.clone();
                Ok(batch)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.clone()),
        }
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}
