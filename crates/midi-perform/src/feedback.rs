//! Non-fatal diagnostics (warnings, skipped notes, suggestions).
//!
//! Ingestion and scheduling keep going past recoverable problems and
//! report them here instead of aborting. Fatal problems are `Err` values.

use serde::{Deserialize, Serialize};

/// One diagnostic report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub message: String,
    /// Performance time in seconds, when the report concerns an event.
    pub time: Option<f64>,
    /// Animation frame, when the report concerns a scheduled range.
    pub frame: Option<i64>,
    pub suggestion: Option<String>,
}

impl Feedback {
    fn new(level: FeedbackLevel, message: impl Into<String>) -> Self {
        Feedback {
            level,
            message: message.into(),
            time: None,
            frame: None,
            suggestion: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FeedbackLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FeedbackLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FeedbackLevel::Info, message)
    }

    pub fn at_time(mut self, seconds: f64) -> Self {
        self.time = Some(seconds);
        self
    }

    pub fn at_frame(mut self, frame: i64) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLevel {
    /// Something was dropped or could not be honoured
    Error,
    /// Processed with an assumption, may not be what the user intended
    Warning,
    /// Informational
    Info,
}

/// Where ingestion and scheduling send their non-fatal reports.
pub trait DiagnosticSink {
    fn report(&mut self, feedback: Feedback);

    fn warning(&mut self, message: String) {
        self.report(Feedback::warning(message));
    }
}

/// Collects feedback in memory and mirrors each item as a tracing event.
#[derive(Debug, Default)]
pub struct FeedbackCollector {
    feedback: Vec<Feedback>,
}

impl FeedbackCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.feedback
            .iter()
            .any(|f| f.level == FeedbackLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Feedback> {
        self.feedback
            .iter()
            .filter(|f| f.level == FeedbackLevel::Warning)
    }

    pub fn feedback(&self) -> &[Feedback] {
        &self.feedback
    }

    pub fn into_feedback(self) -> Vec<Feedback> {
        self.feedback
    }

    pub fn len(&self) -> usize {
        self.feedback.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feedback.is_empty()
    }
}

impl DiagnosticSink for FeedbackCollector {
    fn report(&mut self, feedback: Feedback) {
        match feedback.level {
            FeedbackLevel::Error => tracing::error!(
                time = ?feedback.time,
                frame = ?feedback.frame,
                "{}",
                feedback.message
            ),
            FeedbackLevel::Warning => tracing::warn!(
                time = ?feedback.time,
                frame = ?feedback.frame,
                "{}",
                feedback.message
            ),
            FeedbackLevel::Info => tracing::info!(
                time = ?feedback.time,
                frame = ?feedback.frame,
                "{}",
                feedback.message
            ),
        }
        self.feedback.push(feedback);
    }
}

/// Discards everything. Handy when the caller only wants the result.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _feedback: Feedback) {}
}
