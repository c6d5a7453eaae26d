use crate::CLAP_STYLING;
use clap::error::ErrorKind;
use clap::{ArgMatches, arg, command};
use std::path::PathBuf;
use wikiracer::config::DEFAULT_CONFIG_PATH;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikiracer")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikiracer")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log debug output to stderr")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Config file to load (default: ~/.config/wikiracer/config.toml)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .subcommand_required(false)
        .subcommand(
            command!("race")
                .about(
                    "Walk from START to TARGET by always following the link whose title is \
                closest to the target",
                )
                .arg(
                    arg!([START])
                        .required(false)
                        .help("Wikipedia article to start from (prompted for if omitted)"),
                )
                .arg(
                    arg!([TARGET])
                        .required(false)
                        .help("Wikipedia article to reach (prompted for if omitted)"),
                )
                .arg(
                    arg!(--"demo")
                        .required(false)
                        .help("Mirror the race to a live browser view")
                        .action(clap::ArgAction::SetTrue)
                        .conflicts_with("no-demo"),
                )
                .arg(
                    arg!(--"no-demo")
                        .required(false)
                        .help("Console output only, even if the config enables the browser view")
                        .action(clap::ArgAction::SetTrue)
                        .conflicts_with("demo"),
                )
                .arg(
                    arg!(-d --"max-depth" <N>)
                        .required(false)
                        .help("Give up after this many steps")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            command!("links")
                .about("Resolve one page and list its outgoing article links")
                .arg(arg!(<URL>).required(true).help("Wikipedia article to scan"))
                .arg(
                    arg!(--"query" <TEXT>)
                        .required(false)
                        .help("Rank the links by similarity to this text"),
                )
                .arg(
                    arg!(-n --"top" <N>)
                        .required(false)
                        .help("How many ranked links to show")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                ),
        )
        .subcommand(
            command!("init")
                .about("Writes a default wikiracer config file")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Where to write the config file")
                        .default_value(DEFAULT_CONFIG_PATH),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing config file without asking")
                        .required(false),
                ),
        )
}

/// Parse `argv`, treating anything that is not a known subcommand as the
/// arguments of `race`. Help and version requests are returned as errors for
/// clap to print; when neither reading parses, the first error is reported.
pub(crate) fn parse_args(argv: Vec<String>) -> Result<ArgMatches, clap::Error> {
    let first_error = match command_argument_builder().try_get_matches_from(argv.clone()) {
        Ok(matches) if matches.subcommand().is_some() => return Ok(matches),
        Ok(_) => None,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Err(e);
        }
        Err(e) => Some(e),
    };

    let mut as_race = argv;
    as_race.insert(1.min(as_race.len()), "race".to_string());
    command_argument_builder()
        .try_get_matches_from(as_race)
        .map_err(|e| first_error.unwrap_or(e))
}
