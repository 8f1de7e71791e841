use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// Milestones a job reports to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initializing,
    LoggingIn,
    Scraping,
    Downloading,
    Complete,
}

impl Stage {
    pub fn fraction(self) -> f32 {
        match self {
            Stage::Initializing => 0.0,
            Stage::LoggingIn => 0.1,
            Stage::Scraping => 0.3,
            Stage::Downloading => 0.7,
            Stage::Complete => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub stage: Stage,
    pub fraction: f32,
    pub message: String,
}

/// Sends progress events to whoever is listening; a closed receiver is ignored.
#[derive(Clone)]
pub struct ProgressReporter {
    tx: UnboundedSender<Progress>,
}

impl ProgressReporter {
    pub fn new(tx: UnboundedSender<Progress>) -> Self {
        Self { tx }
    }

    pub fn report(&self, stage: Stage, message: impl Into<String>) {
        let message = message.into();
        info!(stage = ?stage, "{message}");
        let _ = self.tx.send(Progress {
            stage,
            fraction: stage.fraction(),
            message,
        });
    }
}
