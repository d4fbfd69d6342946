//! Diagnosis report
//!
//! Groups diagnoses into info, warn and error lines and decides the exit
//! status.

use crate::diagnose::{Diagnoses, Diagnosis};
use crate::error::DepdocResult;
use console::style;
use serde::Serialize;

/// Report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Counts shown in the summary line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportSummary {
    pub libraries: usize,
    pub errors: usize,
    pub warnings: usize,
    pub unknown: usize,
    pub infos: usize,
    pub ignored: usize,
    pub strict: bool,
}

impl ReportSummary {
    /// Whether the run should exit non-zero
    pub fn exit_failure(&self) -> bool {
        self.errors > 0 || (self.strict && self.warnings > 0)
    }
}

/// Grouped report lines, without styling
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    infos: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    summary: ReportSummary,
}

impl Reporter {
    pub fn new(diagnoses: &Diagnoses, strict: bool) -> Self {
        let mut report = Self {
            summary: ReportSummary {
                libraries: diagnoses.len(),
                strict,
                ..ReportSummary::default()
            },
            ..Self::default()
        };

        // BTreeMap iteration is already sorted by name
        for diagnosis in diagnoses.values() {
            report.add(diagnosis);
        }
        report
    }

    fn add(&mut self, diagnosis: &Diagnosis) {
        let name = &diagnosis.name;

        if diagnosis.ignored {
            self.infos.push(format!("[info] {} (ignored):", name));
            self.summary.ignored += 1;
            self.summary.infos += 1;
            return;
        }

        if diagnosis.is_errored() {
            self.errors
                .push(format!("[error] {}: {}", name, diagnosis.error_message()));
            self.summary.errors += 1;
            return;
        }

        if !diagnosis.diagnosed {
            self.warnings.push(format!("[warn] {} (unknown): {}", name, diagnosis.url));
            self.summary.unknown += 1;
            self.summary.warnings += 1;
            return;
        }

        if diagnosis.archived {
            self.errors
                .push(format!("[error] {} (archived): {}", name, diagnosis.url));
            self.summary.errors += 1;
        }
        if !diagnosis.is_active {
            self.warnings
                .push(format!("[warn] {} (not-maintained): {}", name, diagnosis.url));
            self.summary.warnings += 1;
        }
    }

    pub fn summary(&self) -> ReportSummary {
        self.summary
    }

    pub fn info_lines(&self) -> &[String] {
        &self.infos
    }

    pub fn warning_lines(&self) -> &[String] {
        &self.warnings
    }

    pub fn error_lines(&self) -> &[String] {
        &self.errors
    }

    /// Two-line summary footer
    pub fn summary_text(&self) -> String {
        let s = &self.summary;
        format!(
            "Diagnosis completed! {} libraries.\n{} error, {} warn ({} unknown), {} info ({} ignored)",
            s.libraries, s.errors, s.warnings, s.unknown, s.infos, s.ignored
        )
    }

    /// Print the colored report to stdout
    pub fn print(&self) {
        println!();
        for line in &self.infos {
            println!("{}", line);
        }
        for line in &self.warnings {
            println!("{}", style(line).yellow());
        }
        for line in &self.errors {
            println!("{}", style(line).red());
        }
        println!();
        println!("{}", style(self.summary_text()).green());
    }
}

/// One diagnosis in machine-readable output
#[derive(Debug, Serialize)]
struct DiagnosisJson<'a> {
    name: &'a str,
    url: &'a str,
    archived: bool,
    ignored: bool,
    diagnosed: bool,
    is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Diagnoses as a JSON array sorted by name
pub fn to_json(diagnoses: &Diagnoses) -> DepdocResult<String> {
    let items: Vec<DiagnosisJson<'_>> = diagnoses
        .values()
        .map(|d| DiagnosisJson {
            name: &d.name,
            url: &d.url,
            archived: d.archived,
            ignored: d.ignored,
            diagnosed: d.diagnosed,
            is_active: d.is_active,
            error: d.error.as_ref().map(ToString::to_string),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&items)?)
}
