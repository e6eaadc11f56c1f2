//! User-visible notices.
//!
//! A notice is a short, transient message with a severity. Delivery is fire
//! and forget: a missing or disconnected subscriber never blocks or fails the
//! operation that raised it. Every notice is also logged through `tracing`.

use serde::Serialize;
use std::fmt;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

/// Sends notices to an optional subscriber.
#[derive(Debug, Default, Clone)]
pub struct Notifier {
    tx: Option<Sender<Notice>>,
}

impl Notifier {
    pub fn new(tx: Option<Sender<Notice>>) -> Self {
        Self { tx }
    }

    pub fn subscribe(&mut self, tx: Sender<Notice>) {
        self.tx = Some(tx);
    }

    pub fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::error!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Success | Severity::Info => tracing::info!("{message}"),
        }
        if let Some(tx) = &self.tx
            && tx.send(Notice { severity, message }).is_err()
        {
            self.tx = None;
        }
    }
}
