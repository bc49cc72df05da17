//! Non-fatal export diagnostics
//!
//! Warnings never stop a document from being written. They are collected while
//! the export runs and handed back to the caller afterwards.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
}

#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    entries: Vec<(Level, String)>,
}

impl ExportReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("export warning: {}", message);
        self.entries.push((Level::Warning, message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.entries.push((Level::Info, message.into()));
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.at(Level::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &str> {
        self.at(Level::Info)
    }

    fn at(&self, level: Level) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
    }

    /// Log everything collected so far
    pub fn emit(&self) {
        for (level, message) in &self.entries {
            match level {
                Level::Info => tracing::info!("{}", message),
                Level::Warning => tracing::warn!("{}", message),
            }
        }
    }
}
