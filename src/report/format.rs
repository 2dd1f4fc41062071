//! Summary line formats.
//!
//! Each revision of the runner's output protocol printed its execution
//! counts differently. Every known shape is a [`SummaryFormat`]; the parser
//! tries them in priority order, so a new revision only appends a format.
//! Shapes printed by the same revision share a family, and the runner may
//! switch between them mid-run.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Counts extracted from a single summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub executed: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// `None` when the format predates the errors category.
    pub errors: Option<u32>,
}

impl SummaryCounts {
    /// Returns true if the categorized counts do not exceed the executed count.
    pub fn is_consistent(&self) -> bool {
        self.succeeded
            .checked_add(self.failed)
            .and_then(|sum| sum.checked_add(self.errors.unwrap_or(0)))
            .is_some_and(|sum| sum <= self.executed)
    }
}

/// A single recognizable summary line shape.
pub trait SummaryFormat: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Group of shapes printed interchangeably by one runner revision.
    ///
    /// Within a family the last summary line in the output wins, whichever
    /// shape it has.
    fn family(&self) -> &'static str {
        self.name()
    }

    /// Extracts counts from one line of output with color codes removed.
    ///
    /// Returns `None` if the line is not in this format.
    fn parse_line(&self, line: &str) -> Option<SummaryCounts>;
}

/// Family of the shorter stats lines, chosen by the runner from the counts.
pub const NICE_STATS: &str = "nice-stats";

/// Returns the built-in formats in priority order.
pub fn default_formats() -> Vec<Box<dyn SummaryFormat>> {
    vec![
        Box::new(Detailed),
        Box::new(Brief),
        Box::new(Mixed),
        Box::new(AllErrors),
        Box::new(NothingExecuted),
    ]
}

/// Removes ANSI escape sequences (colors, cursor movement) from output.
pub fn strip_ansi(text: &str) -> std::borrow::Cow<'_, str> {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap())
        .replace_all(text, "")
}

fn count(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

/// `Executed: <n>, Succeeded: <s>, Failed: <f>, Errors: <e>`
#[derive(Debug, Clone, Copy, Default)]
pub struct Detailed;

impl SummaryFormat for Detailed {
    fn name(&self) -> &'static str {
        "detailed"
    }

    fn parse_line(&self, line: &str) -> Option<SummaryCounts> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let caps = PATTERN
            .get_or_init(|| {
                Regex::new(r"^Executed: (\d+), Succeeded: (\d+), Failed: (\d+), Errors: (\d+)$")
                    .unwrap()
            })
            .captures(line)?;

        Some(SummaryCounts {
            executed: count(&caps, 1)?,
            succeeded: count(&caps, 2)?,
            failed: count(&caps, 3)?,
            errors: Some(count(&caps, 4)?),
        })
    }
}

/// `Executed <n> tests, <k|all> succeeded|failed`
///
/// Only one category is stated; the other is the remainder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Brief;

impl SummaryFormat for Brief {
    fn name(&self) -> &'static str {
        "brief"
    }

    fn family(&self) -> &'static str {
        NICE_STATS
    }

    fn parse_line(&self, line: &str) -> Option<SummaryCounts> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let caps = PATTERN
            .get_or_init(|| {
                Regex::new(r"^Executed (\d+) tests, (all|\d+) (succeeded|failed)$").unwrap()
            })
            .captures(line)?;

        let executed = count(&caps, 1)?;
        let stated = match &caps[2] {
            "all" => executed,
            _ => count(&caps, 2)?,
        };
        let derived = executed.checked_sub(stated)?;

        let (succeeded, failed) = match &caps[3] {
            "succeeded" => (stated, derived),
            _ => (derived, stated),
        };

        Some(SummaryCounts {
            executed,
            succeeded,
            failed,
            errors: None,
        })
    }
}

/// `Executed <n> tests, <f> failed, <s> succeeded, <e> errors`
#[derive(Debug, Clone, Copy, Default)]
pub struct Mixed;

impl SummaryFormat for Mixed {
    fn name(&self) -> &'static str {
        "mixed"
    }

    fn family(&self) -> &'static str {
        NICE_STATS
    }

    fn parse_line(&self, line: &str) -> Option<SummaryCounts> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let caps = PATTERN
            .get_or_init(|| {
                Regex::new(r"^Executed (\d+) tests, (\d+) failed, (\d+) succeeded, (\d+) errors$")
                    .unwrap()
            })
            .captures(line)?;

        Some(SummaryCounts {
            executed: count(&caps, 1)?,
            failed: count(&caps, 2)?,
            succeeded: count(&caps, 3)?,
            errors: Some(count(&caps, 4)?),
        })
    }
}

/// `Executed <n> tests, all with errors`
#[derive(Debug, Clone, Copy, Default)]
pub struct AllErrors;

impl SummaryFormat for AllErrors {
    fn name(&self) -> &'static str {
        "all-errors"
    }

    fn family(&self) -> &'static str {
        NICE_STATS
    }

    fn parse_line(&self, line: &str) -> Option<SummaryCounts> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let caps = PATTERN
            .get_or_init(|| Regex::new(r"^Executed (\d+) tests, all with errors$").unwrap())
            .captures(line)?;

        let executed = count(&caps, 1)?;
        Some(SummaryCounts {
            executed,
            succeeded: 0,
            failed: 0,
            errors: Some(executed),
        })
    }
}

/// `No tests executed`
#[derive(Debug, Clone, Copy, Default)]
pub struct NothingExecuted;

impl SummaryFormat for NothingExecuted {
    fn name(&self) -> &'static str {
        "nothing"
    }

    fn family(&self) -> &'static str {
        NICE_STATS
    }

    fn parse_line(&self, line: &str) -> Option<SummaryCounts> {
        (line == "No tests executed").then(|| SummaryCounts {
            errors: Some(0),
            ..SummaryCounts::default()
        })
    }
}
