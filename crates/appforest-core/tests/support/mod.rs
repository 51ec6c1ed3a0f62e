#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use appforest_core::control::{ControlSurface, TreeSource};
use appforest_core::error::{Action, RemoteFailure, RemoteOperationError, TreeSourceError};
use appforest_core::tree::{AppSnapshot, Forest};

/// Something the fake server observed, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Begin(Action, String),
    End(Action, String),
}

/// In-memory control surface and tree source that records every call.
///
/// Starting a component marks it `ACTIVE` and stopping marks it `RESOLVED`,
/// unless the component was registered as failing (the call errors) or as
/// stuck (the call succeeds but the state never changes).
#[derive(Debug)]
pub struct FakeServer {
    tree: Vec<AppSnapshot>,
    states: Mutex<HashMap<String, String>>,
    events: Mutex<Vec<Event>>,
    failing: HashSet<String>,
    stuck: HashSet<String>,
    delays: HashMap<String, Duration>,
}

impl FakeServer {
    pub fn new(tree: Vec<AppSnapshot>) -> Self {
        let mut states = HashMap::new();
        collect_states(&tree, &mut states);
        Self {
            tree,
            states: Mutex::new(states),
            events: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            stuck: HashSet::new(),
            delays: HashMap::new(),
        }
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn stuck(mut self, name: &str) -> Self {
        self.stuck.insert(name.to_string());
        self
    }

    pub fn with_delay(mut self, name: &str, millis: u64) -> Self {
        self.delays
            .insert(name.to_string(), Duration::from_millis(millis));
        self
    }

    /// Forest built from the server's initial tree.
    pub fn forest(&self) -> Forest {
        Forest::from_snapshots(&self.tree)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Requests in the order they were issued.
    pub fn calls(&self) -> Vec<(Action, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Begin(action, name) => Some((action, name)),
                Event::End(..) => None,
            })
            .collect()
    }

    pub fn position(&self, event: &Event) -> usize {
        self.events()
            .iter()
            .position(|seen| seen == event)
            .unwrap_or_else(|| panic!("event {event:?} never happened"))
    }

    pub fn state_of(&self, name: &str) -> String {
        self.states.lock().unwrap()[name].clone()
    }

    async fn call(&self, action: Action, name: &str) -> Result<(), RemoteOperationError> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Begin(action, name.to_string()));

        match self.delays.get(name) {
            Some(delay) => tokio::time::sleep(*delay).await,
            None => tokio::task::yield_now().await,
        }

        let result = if self.failing.contains(name) {
            Err(RemoteOperationError::new(
                name,
                action,
                RemoteFailure::Rejected {
                    status: 500,
                    message: "simulated failure".to_string(),
                },
            ))
        } else {
            if !self.stuck.contains(name) {
                let state = match action {
                    Action::Install => "ACTIVE",
                    Action::Uninstall => "RESOLVED",
                };
                self.states
                    .lock()
                    .unwrap()
                    .insert(name.to_string(), state.to_string());
            }
            Ok(())
        };

        self.events
            .lock()
            .unwrap()
            .push(Event::End(action, name.to_string()));
        result
    }
}

impl ControlSurface for FakeServer {
    async fn start(&self, name: &str) -> Result<(), RemoteOperationError> {
        self.call(Action::Install, name).await
    }

    async fn stop(&self, name: &str) -> Result<(), RemoteOperationError> {
        self.call(Action::Uninstall, name).await
    }
}

impl TreeSource for FakeServer {
    async fn fetch_tree(&self) -> Result<Vec<AppSnapshot>, TreeSourceError> {
        let states = self.states.lock().unwrap();
        Ok(self
            .tree
            .iter()
            .map(|root| with_states(root, &states))
            .collect())
    }
}

fn collect_states(nodes: &[AppSnapshot], out: &mut HashMap<String, String>) {
    for node in nodes {
        out.insert(node.name.clone(), node.state.clone());
        collect_states(&node.children, out);
    }
}

fn with_states(node: &AppSnapshot, states: &HashMap<String, String>) -> AppSnapshot {
    AppSnapshot {
        name: node.name.clone(),
        state: states[&node.name].clone(),
        version: node.version.clone(),
        children: node
            .children
            .iter()
            .map(|child| with_states(child, states))
            .collect(),
    }
}

pub fn active(name: &str) -> AppSnapshot {
    AppSnapshot::new(name, "ACTIVE")
}

pub fn inactive(name: &str) -> AppSnapshot {
    AppSnapshot::new(name, "RESOLVED")
}

/// Collects `(message, percent)` progress reports.
#[derive(Debug, Default)]
pub struct ProgressLog {
    entries: Mutex<Vec<(String, f64)>>,
}

impl ProgressLog {
    pub fn push(&self, message: &str, percent: f64) {
        self.entries
            .lock()
            .unwrap()
            .push((message.to_string(), percent));
    }

    pub fn entries(&self) -> Vec<(String, f64)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn percents(&self) -> Vec<f64> {
        self.entries().into_iter().map(|(_, pct)| pct).collect()
    }
}
