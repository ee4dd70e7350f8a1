//! Session report types for skipped drawings and policy decisions.
//!
//! Non-fatal conditions met while decoding or encoding are collected here
//! instead of aborting the conversion.

use serde::Serialize;
use std::fmt;

/// A report generated by one decode or encode call.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SessionReport {
    /// `"decode"` or `"encode"`.
    pub direction: String,
    pub counts: SessionCounts,
    pub issues: Vec<SessionIssue>,
}

impl SessionReport {
    pub fn new(direction: impl Into<String>) -> Self {
        Self {
            direction: direction.into(),
            ..Default::default()
        }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: SessionIssue) {
        self.issues.push(issue);
    }

    /// Count of warning-level issues (dropped or degraded drawings).
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == SessionSeverity::Warning)
            .count()
    }

    /// Count of info-level issues.
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == SessionSeverity::Info)
            .count()
    }

    /// Slices holding at least one drawing that could not be resolved.
    pub fn unresolved_slices(&self) -> Vec<usize> {
        let mut slices: Vec<usize> = self
            .issues
            .iter()
            .filter(|i| i.code == SessionIssueCode::UnresolvableLabel)
            .filter_map(|i| i.slice)
            .collect();
        slices.dedup();
        slices
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        writeln!(
            f,
            "{}: {} slices, {} drawings read, {} applied, {} written, {} labels registered",
            self.direction,
            c.slices,
            c.drawings_read,
            c.drawings_applied,
            c.drawings_written,
            c.labels_registered
        )?;

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == SessionSeverity::Warning)
            {
                writeln!(f, "  - {}", issue)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", infos)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == SessionSeverity::Info)
            {
                writeln!(f, "  - {}", issue)?;
            }
        }

        Ok(())
    }
}

/// Counters for one call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounts {
    pub slices: usize,
    /// Drawings found in the input document.
    pub drawings_read: usize,
    /// Drawings rasterized into the volume.
    pub drawings_applied: usize,
    /// Drawings appended to the output document.
    pub drawings_written: usize,
    /// Names newly added to the registry.
    pub labels_registered: usize,
}

/// A single non-fatal condition.
#[derive(Clone, Debug, Serialize)]
pub struct SessionIssue {
    pub severity: SessionSeverity,
    pub code: SessionIssueCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawing: Option<usize>,
    pub message: String,
}

impl SessionIssue {
    pub fn warning(code: SessionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: SessionSeverity::Warning,
            code,
            slice: None,
            drawing: None,
            message: message.into(),
        }
    }

    pub fn info(code: SessionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: SessionSeverity::Info,
            code,
            slice: None,
            drawing: None,
            message: message.into(),
        }
    }

    /// Attach the drawing position the issue refers to.
    pub fn at(mut self, slice: usize, drawing: usize) -> Self {
        self.slice = Some(slice);
        self.drawing = Some(drawing);
        self
    }
}

impl fmt::Display for SessionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.slice, self.drawing) {
            (Some(s), Some(d)) => write!(f, "slice {s}, drawing {d}: {}", self.message),
            (Some(s), None) => write!(f, "slice {s}: {}", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSeverity {
    /// A drawing was dropped or its metadata degraded.
    Warning,
    /// A policy decision was applied.
    Info,
}

/// Stable issue codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionIssueCode {
    /// Drawing has neither a name nor an explicit value; skipped.
    UnresolvableLabel,
    /// `longText` did not decode; treated as absent.
    MalformedPayload,
    /// A new name received a value another name already holds.
    LabelValueCollision,
    /// Payload value ignored because the name was already registered.
    IgnoredExplicitValue,
    /// Drawing skipped by the caller's label filter.
    FilteredLabel,
}
