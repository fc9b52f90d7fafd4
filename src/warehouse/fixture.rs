use std::collections::{HashMap, VecDeque};

use crate::error::{PostMortemError, PostMortemResult};

use super::{QueryScript, ResultSet, Warehouse};

type Handler = Box<dyn FnMut(&QueryScript) -> PostMortemResult<ResultSet>>;

/// Headless warehouse answering scripts by label.
///
/// Used by tests and offline replays. Every executed script is recorded.
/// A label answers, in priority order, with its configured failure, its
/// handler, or the next queued result set (the last queued one repeats).
#[derive(Default)]
pub struct FixtureWarehouse {
    queued: HashMap<String, VecDeque<ResultSet>>,
    handlers: HashMap<String, Handler>,
    failures: HashMap<String, String>,
    executed: Vec<QueryScript>,
}

impl FixtureWarehouse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(mut self, label: &str, result: ResultSet) -> Self {
        self.queued
            .entry(label.to_owned())
            .or_default()
            .push_back(result);
        self
    }

    #[must_use]
    pub fn with_handler(
        mut self,
        label: &str,
        handler: impl FnMut(&QueryScript) -> PostMortemResult<ResultSet> + 'static,
    ) -> Self {
        self.handlers.insert(label.to_owned(), Box::new(handler));
        self
    }

    #[must_use]
    pub fn with_failure(mut self, label: &str, reason: &str) -> Self {
        self.failures.insert(label.to_owned(), reason.to_owned());
        self
    }

    #[must_use]
    pub fn executed(&self) -> &[QueryScript] {
        &self.executed
    }

    #[must_use]
    pub fn executed_labels(&self) -> Vec<&str> {
        self.executed.iter().map(QueryScript::label).collect()
    }
}

impl Warehouse for FixtureWarehouse {
    fn execute(&mut self, script: &QueryScript) -> PostMortemResult<ResultSet> {
        self.executed.push(script.clone());
        let label = script.label();

        if let Some(reason) = self.failures.get(label) {
            return Err(PostMortemError::UpstreamQuery {
                script: label.to_owned(),
                reason: reason.clone(),
            });
        }
        if let Some(handler) = self.handlers.get_mut(label) {
            return handler(script);
        }
        let Some(queue) = self.queued.get_mut(label) else {
            return Err(PostMortemError::UpstreamQuery {
                script: label.to_owned(),
                reason: "no fixture registered for script".to_owned(),
            });
        };
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        next.ok_or_else(|| PostMortemError::UpstreamQuery {
            script: label.to_owned(),
            reason: "fixture queue exhausted".to_owned(),
        })
    }
}
