use async_trait::async_trait;
use colored::Colorize;
use std::sync::Mutex;
use wikiracer_core::{PathStep, RaceEvent, RaceObserver};

const RULE_WIDTH: usize = 60;

pub fn print_banner() {
    let banner = r#"
    ╦ ╦╦╦╔═╦╦═╗╔═╗╔═╗╔═╗╦═╗
    ║║║║╠╩╗║╠╦╝╠═╣║  ║╣ ╠╦╝
    ╚╩╝╩╩ ╩╩╩╚═╩ ╩╚═╝╚═╝╩╚═
    "#;
    println!("{}", banner.bright_red().bold());
    println!(
        "    {}\n",
        "find a path between Wikipedia pages".bright_white()
    );
}

pub fn print_divider() {
    println!("{}", "=".repeat(RULE_WIDTH).bright_blue().bold());
}

/// `STEP n: label` plus its url. The final step is framed.
pub fn format_step(step: &PathStep) -> String {
    if step.is_final {
        let rule = "=".repeat(RULE_WIDTH);
        format!(
            "\n{}\n  {} {}\n  URL: {}\n{}",
            rule,
            format!("STEP {} (FINAL):", step.ordinal).green().bold(),
            step.label.bright_white().bold(),
            step.url,
            rule
        )
    } else {
        format!(
            "\n  {} {}\n  URL: {}",
            format!("STEP {}:", step.ordinal).cyan().bold(),
            step.label.bright_white(),
            step.url
        )
    }
}

pub fn format_closest(target_label: &str, label: &str, distance: f32) -> String {
    format!(
        "\n  Closest match to '{}': '{}' (distance: {:.4})",
        target_label,
        label.yellow(),
        distance
    )
}

/// Prints the race transcript to stdout as it happens.
#[derive(Default)]
pub struct ConsoleObserver {
    target_label: Mutex<String>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn target_label(&self) -> String {
        self.target_label
            .lock()
            .map(|label| label.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RaceObserver for ConsoleObserver {
    async fn on_event(&self, event: &RaceEvent) {
        match event {
            RaceEvent::Started {
                start_url,
                target_url,
                target_label,
                ..
            } => {
                if let Ok(mut label) = self.target_label.lock() {
                    *label = target_label.clone();
                }
                println!();
                print_divider();
                println!("{}", "  WIKIRACER - Semantic Wikipedia Navigator".bright_white().bold());
                print_divider();
                println!("\n  {} {}", "START:".blue().bold(), start_url);
                println!("  {} {}", "TARGET:".blue().bold(), target_url);
                println!("  Target page name: '{}'", target_label.bright_white());
                print_divider();
                println!(
                    "{}",
                    format_step(&PathStep::new(
                        0,
                        wikiracer_scanner::page_name(start_url),
                        start_url.clone(),
                        false
                    ))
                );
            }
            RaceEvent::Fetching { url, .. } => {
                println!("\n{} {}", "Scraping:".dimmed(), url);
            }
            RaceEvent::PageResolved {
                title, edge_count, ..
            } => {
                println!("Found {} links on '{}'", edge_count, title);
            }
            RaceEvent::HopChosen { hop, distance } => {
                if let Some(distance) = distance {
                    println!("{}", format_closest(&self.target_label(), &hop.label, *distance));
                }
                println!("{}", format_step(hop));
            }
            RaceEvent::Finished { .. } => {}
        }
    }
}
