use wikiracer_core::{PathStep, RaceReport, Termination, render_path_summary, termination_line};

fn report(reached: bool, termination: Termination) -> RaceReport {
    RaceReport {
        reached,
        termination,
        path: vec![
            PathStep::new(0, "Potato", "https://en.wikipedia.org/wiki/Potato", false),
            PathStep::new(1, "Andes", "https://en.wikipedia.org/wiki/Andes", false),
            PathStep::new(2, "Peru", "https://en.wikipedia.org/wiki/Peru", reached),
        ],
    }
}

#[test]
fn test_summary_lists_every_step_and_marks_the_last() {
    let out = render_path_summary(&report(true, Termination::Reached));

    assert!(out.starts_with("[+] Target reached"));
    assert!(out.contains("PATH SUMMARY"));
    assert!(out.contains("    Step 0: Potato\n        https://en.wikipedia.org/wiki/Potato\n"));
    assert!(out.contains("    Step 1: Andes\n"));
    assert!(out.contains(">>> Step 2: Peru\n        https://en.wikipedia.org/wiki/Peru\n"));
    assert!(out.contains("SUCCESS! Reached target in 2 steps."));
    assert!(!out.contains("FAILED"));
}

#[test]
fn test_summary_reports_failure() {
    let out = render_path_summary(&report(false, Termination::DepthExceeded { max_depth: 2 }));

    assert!(out.starts_with("[!] Max depth (2) reached without finding target"));
    assert!(out.contains("FAILED. Could not reach target in 2 steps."));
}

#[test]
fn test_termination_lines_are_distinct() {
    let lines = [
        termination_line(&Termination::Reached),
        termination_line(&Termination::DeadEnd),
        termination_line(&Termination::DepthExceeded { max_depth: 20 }),
        termination_line(&Termination::FetchFailed("HTTP 500".into())),
        termination_line(&Termination::OracleFailed("offline".into())),
    ];

    for (i, a) in lines.iter().enumerate() {
        for b in &lines[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert!(lines[3].contains("HTTP 500"));
    assert!(lines[4].contains("offline"));
}
