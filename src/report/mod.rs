//! Runner output parsing.
//!
//! Turns the stdout of one runner invocation into a [`Report`].

pub mod format;

pub use format::{default_formats, strip_ansi, SummaryCounts, SummaryFormat};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::invoker::RawResult;

/// Execution counts reported by one runner invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Report {
    pub num_executed: u32,
    pub num_succeeded: u32,
    pub num_failed: u32,
    /// Only present when the summary format tracks errors separately.
    pub num_errors: Option<u32>,
    /// The runner's exit code.
    pub process_return: i32,
}

impl Report {
    /// Builds a report from parsed summary counts.
    pub fn from_counts(counts: SummaryCounts, process_return: i32) -> Self {
        Self {
            num_executed: counts.executed,
            num_succeeded: counts.succeeded,
            num_failed: counts.failed,
            num_errors: counts.errors,
            process_return,
        }
    }

    /// Zero-valued report for a runner that died before printing a summary.
    pub fn crashed(process_return: i32) -> Self {
        Self {
            num_errors: Some(0),
            process_return,
            ..Self::default()
        }
    }

    /// Returns the error count, treating an untracked category as zero.
    pub fn errors(&self) -> u32 {
        self.num_errors.unwrap_or(0)
    }
}

/// Parses runner stdout using an ordered list of summary formats.
pub struct ReportParser {
    formats: Vec<Box<dyn SummaryFormat>>,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportParser {
    /// Creates a parser that knows every built-in summary format.
    pub fn new() -> Self {
        Self::with_formats(default_formats())
    }

    /// Creates a parser trying exactly the given formats, in order.
    pub fn with_formats(formats: Vec<Box<dyn SummaryFormat>>) -> Self {
        Self { formats }
    }

    /// Appends a format with the lowest priority.
    pub fn push_format(&mut self, format: Box<dyn SummaryFormat>) {
        self.formats.push(format);
    }

    /// Returns the format names in priority order.
    pub fn format_names(&self) -> Vec<&'static str> {
        self.formats.iter().map(|f| f.name()).collect()
    }

    /// Parses the captured output of one invocation.
    pub fn parse(&self, raw: &RawResult) -> Result<Report> {
        self.parse_text(&raw.stdout_text(), raw.exit_code)
    }

    /// Parses stdout text produced by a runner that exited with `exit_code`.
    ///
    /// A missing summary is a crash when the exit code is nonzero, and a
    /// protocol violation when it is zero.
    pub fn parse_text(&self, stdout: &str, exit_code: i32) -> Result<Report> {
        if let Some((format, counts)) = self.find_summary(stdout) {
            tracing::debug!(format, ?counts, exit_code, "parsed runner summary");
            return Ok(Report::from_counts(counts, exit_code));
        }

        if exit_code == 0 {
            return Err(Error::MissingSummary {
                exit_code,
                stdout: stdout.to_string(),
            });
        }

        tracing::debug!(exit_code, "no summary in runner output, treating as crash");
        Ok(Report::crashed(exit_code))
    }

    /// Finds the summary line, returning the name of the format that matched.
    ///
    /// Format families are tried in priority order and the first family with
    /// any match wins. Within a family the last matching line wins, whatever
    /// its shape, since interactive output reprints running totals.
    pub fn find_summary(&self, stdout: &str) -> Option<(&'static str, SummaryCounts)> {
        let cleaned = strip_ansi(stdout);
        let lines: Vec<&str> = cleaned.lines().map(str::trim).collect();

        let mut families: Vec<&'static str> = Vec::new();
        for format in &self.formats {
            if !families.contains(&format.family()) {
                families.push(format.family());
            }
        }

        families.into_iter().find_map(|family| {
            lines.iter().rev().find_map(|line| {
                self.formats
                    .iter()
                    .filter(|format| format.family() == family)
                    .find_map(|format| {
                        format
                            .parse_line(line)
                            .filter(SummaryCounts::is_consistent)
                            .map(|counts| (format.name(), counts))
                    })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(stdout: &str, exit_code: i32) -> Result<Report> {
        ReportParser::new().parse_text(stdout, exit_code)
    }

    #[test]
    fn parses_detailed_summary_among_other_output() {
        let stdout = "Running suite ./chili_failure.so\n\
                      test_failure1: Failed\n\
                      test_failure2: Failed\n\
                      test_failure3: Failed\n\
                      Executed: 3, Succeeded: 0, Failed: 3, Errors: 0\n";

        let report = parse(stdout, 3).unwrap();

        assert_eq!(report.num_executed, 3);
        assert_eq!(report.num_failed, 3);
        assert_eq!(report.num_errors, Some(0));
        assert_eq!(report.process_return, 3);
    }

    #[test]
    fn parses_brief_summary() {
        let report = parse("Running suite x\nExecuted 2 tests, all succeeded\n", 0).unwrap();

        assert_eq!(report.num_executed, 2);
        assert_eq!(report.num_succeeded, 2);
        assert_eq!(report.num_failed, 0);
        assert_eq!(report.num_errors, None);
        assert_eq!(report.process_return, 0);
    }

    #[test]
    fn detailed_format_takes_priority() {
        let stdout = "Executed 5 tests, all succeeded\n\
                      Executed: 5, Succeeded: 4, Failed: 1, Errors: 0\n";

        let report = parse(stdout, 1).unwrap();

        assert_eq!(report.num_succeeded, 4);
        assert_eq!(report.num_failed, 1);
    }

    #[test]
    fn last_summary_line_wins_within_a_format() {
        let stdout = "Executed: 1, Succeeded: 1, Failed: 0, Errors: 0\n\
                      Executed: 2, Succeeded: 1, Failed: 1, Errors: 0\n";

        let report = parse(stdout, 1).unwrap();

        assert_eq!(report.num_executed, 2);
    }

    #[test]
    fn last_stats_line_wins_when_shape_changes() {
        let stdout = "Running suite ./chili_mixed.so\n\
                      test_one: Ok\n\
                      Executed 1 tests, all succeeded\n\
                      \x1b[A\x1b[Ktest_two: Error\n\
                      \x1b[A\x1b[KExecuted 2 tests, 0 failed, 1 succeeded, 1 errors\n";

        let (format, _) = ReportParser::new().find_summary(stdout).unwrap();
        let report = parse(stdout, 1).unwrap();

        assert_eq!(format, "mixed");
        assert_eq!(report.num_executed, 2);
        assert_eq!(report.num_succeeded, 1);
        assert_eq!(report.num_errors, Some(1));
    }

    #[test]
    fn stats_can_shrink_back_to_brief_shape() {
        let stdout = "Executed 1 tests, all with errors\n\
                      Executed 3 tests, 2 failed\n";

        let report = parse(stdout, 2).unwrap();

        assert_eq!(report.num_executed, 3);
        assert_eq!(report.num_failed, 2);
        assert_eq!(report.num_errors, None);
    }

    #[test]
    fn colored_summary_is_parsed() {
        let stdout = "\x1b[1m\x1b[34mRunning suite x\x1b[0m\n\
                      \x1b[31;1mExecuted: 2, Succeeded: 0, Failed: 0, Errors: 2\x1b[0m\n";

        let report = parse(stdout, 2).unwrap();

        assert_eq!(report.num_errors, Some(2));
    }

    #[test]
    fn inconsistent_summary_is_ignored() {
        let err = parse("Executed: 1, Succeeded: 1, Failed: 1, Errors: 0\n", 0).unwrap_err();
        assert!(matches!(err, Error::MissingSummary { .. }));
    }

    #[test]
    fn crash_before_report_yields_zero_report() {
        let report = parse("Running suite ./chili_crash.so\n", 139).unwrap();

        assert_eq!(report, Report::crashed(139));
        assert_eq!(report.num_executed, 0);
        assert_eq!(report.num_succeeded, 0);
        assert_eq!(report.num_failed, 0);
        assert_eq!(report.errors(), 0);
    }

    #[test]
    fn empty_output_with_nonzero_exit_is_crash() {
        let report = parse("", 1).unwrap();
        assert_eq!(report.process_return, 1);
        assert_eq!(report.num_executed, 0);
    }

    #[test]
    fn missing_summary_on_success_is_fatal() {
        let err = parse("Running suite ./chili_success.so\n", 0).unwrap_err();

        match err {
            Error::MissingSummary { exit_code, stdout } => {
                assert_eq!(exit_code, 0);
                assert!(stdout.contains("Running suite"));
            }
            other => panic!("Expected MissingSummary, got {:?}", other),
        }
    }

    #[test]
    fn custom_format_can_be_appended() {
        struct Legacy;

        impl SummaryFormat for Legacy {
            fn name(&self) -> &'static str {
                "legacy"
            }

            fn parse_line(&self, line: &str) -> Option<SummaryCounts> {
                let n: u32 = line.strip_prefix("ran ")?.parse().ok()?;
                Some(SummaryCounts {
                    executed: n,
                    succeeded: n,
                    ..SummaryCounts::default()
                })
            }
        }

        let mut parser = ReportParser::new();
        parser.push_format(Box::new(Legacy));

        let report = parser.parse_text("ran 4\n", 0).unwrap();
        assert_eq!(report.num_succeeded, 4);
        assert_eq!(parser.format_names().last(), Some(&"legacy"));
    }

    #[test]
    fn parse_uses_raw_exit_code() {
        let raw = RawResult::new(3, "Executed 3 tests, all failed\n", Vec::new());
        let report = ReportParser::new().parse(&raw).unwrap();
        assert_eq!(report.process_return, 3);
        assert_eq!(report.num_failed, 3);
    }
}
