use crate::config::{AppConfig, expand_path};
use crate::console::{ConsoleObserver, print_divider};
use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use wikiracer_bridge::VisualizationBridge;
use wikiracer_core::{
    Navigator, Neighbor, SimilarityOracle, VectorOracle, render_path_summary,
};
use wikiracer_scanner::{LinkResolver, PageRecord, WikiResolver, is_article_url};

const START_PROMPT: &str = "Enter the START Wikipedia URL:";
const TARGET_PROMPT: &str = "Enter the TARGET Wikipedia URL:";
const URL_HINT: &str = "Invalid Wikipedia URL. Please enter a valid URL (e.g., https://en.wikipedia.org/wiki/Potato)";

/// Time left for the viewer to render the verdict before the bridge goes away.
const VIEWER_GRACE: Duration = Duration::from_secs(3);

/// An absolute url on the content domain whose path names an article.
pub fn validate_wikipedia_url(url: &str) -> bool {
    is_article_url(url.trim())
}

/// Ask `msg` on `output` until `input` yields a valid article url.
/// Running out of input is an error.
pub fn prompt_until_valid<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    msg: &str,
) -> Result<String> {
    loop {
        write!(output, "{} ", msg.bright_cyan().bold())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("No URL given");
        }

        let url = line.trim();
        if validate_wikipedia_url(url) {
            return Ok(url.to_string());
        }
        writeln!(output, "{}", URL_HINT.yellow())?;
    }
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

/// Load the config named by the global `--config` flag, or the default one.
pub fn load_config(args: &ArgMatches) -> Result<AppConfig> {
    AppConfig::load_or_default(args.get_one::<PathBuf>("config").map(PathBuf::as_path))
}

/// Command line values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceOverrides {
    pub demo: Option<bool>,
    pub max_depth: Option<usize>,
}

impl RaceOverrides {
    pub fn from_args(args: &ArgMatches) -> Self {
        let demo = if args.get_flag("demo") {
            Some(true)
        } else if args.get_flag("no-demo") {
            Some(false)
        } else {
            None
        };
        Self {
            demo,
            max_depth: args.get_one::<usize>("max-depth").copied(),
        }
    }

    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(demo) = self.demo {
            config.demo = demo;
        }
        if let Some(depth) = self.max_depth {
            config.navigator.max_depth = depth;
        }
    }
}

fn race_url(args: &ArgMatches, name: &str, prompt: &str) -> Result<String> {
    match args.get_one::<String>(name) {
        Some(url) if validate_wikipedia_url(url) => Ok(url.trim().to_string()),
        Some(url) => Err(anyhow!("Invalid Wikipedia URL '{}'", url)),
        None => {
            let stdin = io::stdin();
            prompt_until_valid(&mut stdin.lock(), &mut io::stdout(), prompt)
        }
    }
}

fn build_oracle(config: &AppConfig) -> Result<Arc<dyn SimilarityOracle>> {
    let embedder = config.oracle.build().context("Failed to set up the embedder")?;
    Ok(Arc::new(VectorOracle::new(embedder)))
}

async fn start_bridge(config: &AppConfig) -> Option<Arc<VisualizationBridge>> {
    let spinner = spinner("Waiting for the browser view to connect...");
    let result = VisualizationBridge::start(config.bridge.clone()).await;
    spinner.finish_and_clear();

    match result {
        Ok(bridge) => {
            println!("{} Browser view connected", "✓".green().bold());
            Some(Arc::new(bridge))
        }
        Err(e) => {
            warn!("Visualization unavailable: {}", e);
            println!(
                "{} Browser view unavailable ({}), continuing in the console",
                "⚠".yellow().bold(),
                e
            );
            None
        }
    }
}

/// Run one race. `Ok(true)` means the target was reached.
pub async fn handle_race(args: &ArgMatches) -> Result<bool> {
    let mut config = load_config(args)?;
    RaceOverrides::from_args(args).apply(&mut config);
    debug!("Race config: {:?}", config);

    let start_url = race_url(args, "START", START_PROMPT)?;
    let target_url = race_url(args, "TARGET", TARGET_PROMPT)?;

    let resolver = Arc::new(
        WikiResolver::with_config(&config.resolver).context("Failed to set up the page resolver")?,
    );
    let oracle = build_oracle(&config)?;

    let loading = spinner("Loading the similarity model...");
    let ready = oracle.ensure_ready().await;
    loading.finish_and_clear();
    ready.context("Similarity model is not available")?;
    println!("{} Similarity model ready", "✓".green().bold());

    let mut navigator = Navigator::new(resolver, oracle)
        .with_config(config.navigator.clone())
        .with_observer(Arc::new(ConsoleObserver::new()));

    let bridge = if config.demo {
        start_bridge(&config).await
    } else {
        None
    };
    if let Some(bridge) = &bridge {
        navigator = navigator.with_observer(bridge.clone());
    }

    let report = navigator.race(&start_url, &target_url).await?;

    println!();
    println!("{}", render_path_summary(&report));

    if bridge.is_some() {
        tokio::time::sleep(VIEWER_GRACE).await;
    }

    Ok(report.reached)
}

/// Resolve `url` and, given a query, rank its links by similarity to it.
pub async fn rank_links(
    resolver: &dyn LinkResolver,
    oracle: &dyn SimilarityOracle,
    url: &str,
    query: Option<&str>,
    top: usize,
) -> Result<(PageRecord, Vec<Neighbor>)> {
    let page = resolver
        .resolve(url)
        .await
        .with_context(|| format!("Failed to resolve {}", url))?;

    let ranked = match query {
        Some(query) if !page.is_dead_end() => {
            let handle = oracle.index(&page.edges).await?;
            oracle.query(&handle, query, top, &HashSet::new()).await?
        }
        _ => Vec::new(),
    };

    Ok((page, ranked))
}

pub async fn handle_links(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;
    let url = args
        .get_one::<String>("URL")
        .ok_or_else(|| anyhow!("A URL is required"))?;
    let query = args.get_one::<String>("query").map(String::as_str);
    let top = args.get_one::<usize>("top").copied().unwrap_or(10);

    let resolver = WikiResolver::with_config(&config.resolver)?;
    let oracle = build_oracle(&config)?;
    if query.is_some() {
        oracle.ensure_ready().await?;
    }

    let (page, ranked) = rank_links(&resolver, oracle.as_ref(), url, query, top).await?;

    print_divider();
    println!("  {} ({} links)", page.title.bright_white().bold(), page.edges.len());
    print_divider();

    match query {
        Some(query) => {
            println!("\n  Closest to '{}':\n", query);
            for (rank, hit) in ranked.iter().enumerate() {
                println!(
                    "  {:>3}. {} {}",
                    rank + 1,
                    hit.label.bright_white(),
                    format!("({:.4})", hit.distance).dimmed()
                );
                println!("       {}", hit.url);
            }
        }
        None => {
            println!();
            for edge in &page.edges {
                println!("  {} {}", edge.label.bright_white(), edge.url.dimmed());
            }
        }
    }

    Ok(())
}

/// Write the default config to `path`, creating parent directories.
/// Refuses to replace an existing file unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, AppConfig::default().to_toml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  WIKIRACER INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let raw = args
        .get_one::<String>("PATH")
        .ok_or_else(|| anyhow!("A config path is required"))?;
    let path = expand_path(raw);
    let mut force = args.get_flag("force");

    if path.exists() && !force {
        println!(
            "{} A config file already exists at {}",
            "⚠".yellow().bold(),
            path.display()
        );
        let answer = print_prompt("Overwrite it? [y/N]:")?;
        if answer != "y" && answer != "yes" {
            println!("{} Left the existing config untouched", "✗".red().bold());
            return Ok(());
        }
        force = true;
    }

    write_default_config(&path, force)?;
    println!(
        "{} Wrote default config to {}",
        "✓".green().bold(),
        path.display().to_string().bright_white()
    );
    Ok(())
}
