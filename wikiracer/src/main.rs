use clap::ArgMatches;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wikiracer::console::print_banner;
use wikiracer::handlers::{handle_init, handle_links, handle_race};

mod commands;

#[tokio::main]
async fn main() {
    // Without a subcommand the arguments belong to `race`
    let chosen_command =
        commands::parse_args(std::env::args().collect()).unwrap_or_else(|e| e.exit());

    init_tracing(chosen_command.get_flag("verbose"));

    if !chosen_command.get_flag("quiet") {
        print_banner();
    }

    match chosen_command.subcommand() {
        Some(("race", primary_command)) => run_race(primary_command).await,
        Some(("links", primary_command)) => exit_on_error(handle_links(primary_command).await),
        Some(("init", primary_command)) => exit_on_error(handle_init(primary_command)),
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "wikiracer=debug"
    } else {
        "wikiracer=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_race(args: &ArgMatches) {
    match handle_race(args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn exit_on_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
