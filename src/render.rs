use crate::audit::CheckOutcome;
use crate::report::{ChangeType, IntegrityReport};

pub fn print_report(outcome: &CheckOutcome, show_diff: bool) {
    for line in format_report_lines(outcome, show_diff) {
        println!("{}", line);
    }
}

/// One line naming the tree that was checked and what was found.
pub fn format_summary(report: &IntegrityReport) -> String {
    if report.is_clean() {
        format!(
            "No changes in {} ({} files unchanged)",
            report.root.display(),
            report.unchanged
        )
    } else {
        format!(
            "Checked {}: {} modified, {} added, {} removed, {} unchanged",
            report.root.display(),
            report.modified.len(),
            report.added.len(),
            report.removed.len(),
            report.unchanged
        )
    }
}

fn format_report_lines(outcome: &CheckOutcome, show_diff: bool) -> Vec<String> {
    let mut lines = Vec::new();

    for (change, path) in outcome.report.changes() {
        lines.push(format!("{:<2} {}", change.code(), path));

        if show_diff {
            lines.extend(format_diff_line(outcome, change, path));
        }
    }

    lines
}

fn format_diff_line(outcome: &CheckOutcome, change: ChangeType, path: &str) -> Option<String> {
    let old = outcome.baseline.files.get(path);
    let new = outcome.snapshot.get(path);

    match change {
        ChangeType::Modified => Some(format!(
            "   sha256: {} -> {}",
            truncate_sha256(old?),
            truncate_sha256(new?)
        )),
        ChangeType::Added => Some(format!("   now: sha256 {}", truncate_sha256(new?))),
        ChangeType::Removed => Some(format!("   was: sha256 {}", truncate_sha256(old?))),
    }
}

fn truncate_sha256(sha256: &str) -> String {
    if sha256.len() > 12 {
        format!("{}...", &sha256[..12])
    } else {
        sha256.to_string()
    }
}
