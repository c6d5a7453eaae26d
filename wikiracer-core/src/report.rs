use crate::navigator::{RaceReport, Termination};

const RULE: &str = "============================================================";

/// One-line verdict naming how the race ended.
pub fn termination_line(termination: &Termination) -> String {
    match termination {
        Termination::Reached => "[+] Target reached".to_string(),
        Termination::DeadEnd => "[!] Dead end: every link on the page was already visited".to_string(),
        Termination::DepthExceeded { max_depth } => {
            format!("[!] Max depth ({}) reached without finding target", max_depth)
        }
        Termination::FetchFailed(e) => format!("[!] Failed to process page: {}", e),
        Termination::OracleFailed(e) => format!("[!] Similarity search failed: {}", e),
    }
}

/// Generate the end-of-race summary: verdict, every step, and the step count.
pub fn render_path_summary(report: &RaceReport) -> String {
    let mut out = String::new();

    out.push_str(&termination_line(&report.termination));
    out.push_str("\n\n");
    out.push_str(RULE);
    out.push_str("\n  PATH SUMMARY\n");
    out.push_str(RULE);
    out.push('\n');

    let last = report.path.len().saturating_sub(1);
    for (idx, step) in report.path.iter().enumerate() {
        let marker = if idx == last { ">>>" } else { "   " };
        out.push_str(&format!("{} Step {}: {}\n", marker, step.ordinal, step.label));
        out.push_str(&format!("        {}\n", step.url));
    }

    out.push('\n');
    out.push_str(RULE);
    out.push('\n');
    if report.reached {
        out.push_str(&format!(
            "  SUCCESS! Reached target in {} steps.\n",
            report.steps_taken()
        ));
    } else {
        out.push_str(&format!(
            "  FAILED. Could not reach target in {} steps.\n",
            report.steps_taken()
        ));
    }
    out.push_str(RULE);
    out.push('\n');

    out
}
