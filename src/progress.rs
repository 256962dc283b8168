//! Fetch progress reporting.
//!
//! Fetch tasks never touch the terminal. They send [`FetchEvent`]s through a
//! [`Reporter`] to a single task that owns the [`ProgressSink`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Something that happened to one repository of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    Started { name: String },
    Finished { name: String },
    Failed { name: String, message: String },
}

/// Renders fetch events. Owned by the reporting task.
pub trait ProgressSink: Send + 'static {
    fn handle(&mut self, event: &FetchEvent);

    /// Called once after the last event.
    fn finish(&mut self) {}
}

/// Reports progress as log lines.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn handle(&mut self, event: &FetchEvent) {
        match event {
            FetchEvent::Started { name } => info!("Fetching {}", name),
            FetchEvent::Finished { name } => info!("Imported {}", name),
            FetchEvent::Failed { name, message } => warn!("Failed to import {}: {}", name, message),
        }
    }
}

/// One spinner per repository.
pub struct SpinnerProgress {
    multi: MultiProgress,
    bars: HashMap<String, ProgressBar>,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: HashMap::new(),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for SpinnerProgress {
    fn handle(&mut self, event: &FetchEvent) {
        match event {
            FetchEvent::Started { name } => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::style());
                bar.set_prefix(name.clone());
                bar.set_message("fetching");
                bar.enable_steady_tick(Duration::from_millis(100));
                self.bars.insert(name.clone(), bar);
            }
            FetchEvent::Finished { name } => {
                if let Some(bar) = self.bars.remove(name) {
                    bar.finish_with_message("done");
                }
            }
            FetchEvent::Failed { name, message } => {
                if let Some(bar) = self.bars.remove(name) {
                    bar.abandon_with_message(format!("failed: {}", message));
                }
            }
        }
    }

    fn finish(&mut self) {
        // Repositories still spinning were cancelled by a failure elsewhere.
        for (_, bar) in self.bars.drain() {
            bar.abandon_with_message("cancelled");
        }
    }
}

/// Records events in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingProgress {
    events: Arc<Mutex<Vec<FetchEvent>>>,
}

impl CollectingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far.
    pub fn events(&self) -> Vec<FetchEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressSink for CollectingProgress {
    fn handle(&mut self, event: &FetchEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Sending half of the progress channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: mpsc::UnboundedSender<FetchEvent>,
}

impl Reporter {
    pub fn send(&self, event: FetchEvent) {
        // The receiver only goes away after every reporter is dropped.
        let _ = self.tx.send(event);
    }

    pub fn started(&self, name: &str) {
        self.send(FetchEvent::Started {
            name: name.to_string(),
        });
    }

    pub fn finished(&self, name: &str) {
        self.send(FetchEvent::Finished {
            name: name.to_string(),
        });
    }

    pub fn failed(&self, name: &str, message: impl Into<String>) {
        self.send(FetchEvent::Failed {
            name: name.to_string(),
            message: message.into(),
        });
    }
}

/// Starts the reporting task. It ends once every [`Reporter`] is dropped.
pub fn spawn(mut sink: Box<dyn ProgressSink>) -> (Reporter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            sink.handle(&event);
        }
        sink.finish();
    });
    (Reporter { tx }, handle)
}
