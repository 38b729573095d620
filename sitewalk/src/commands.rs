use crate::CLAP_STYLING;
use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, arg, value_parser};
use sitewalk_scanner::fetcher::DEFAULT_USER_AGENT;
use std::path::PathBuf;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitewalk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitewalk")
        .about("Crawl a single site breadth-first and audit every link it contains")
        .styles(CLAP_STYLING)
        .arg(
            arg!([SEED_URL])
                .required(false)
                .help("The URL to start crawling from (prompted for when omitted)"),
        )
        .arg(
            arg!(-o --"output" <DIR>)
                .required(false)
                .help("Directory for snapshots and CSV reports")
                .default_value("."),
        )
        .arg(
            arg!(-i --"progress-interval" <PAGES>)
                .required(false)
                .help("Rewrite progress.json after this many parsed pages (0 disables it)")
                .value_parser(value_parser!(usize))
                .default_value("10"),
        )
        .arg(
            arg!(-t --"timeout" <SECONDS>)
                .required(false)
                .help("Per-request timeout in seconds")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("10"),
        )
        .arg(
            arg!(--"max-pages" <NUM>)
                .required(false)
                .help("Stop after this many pages have been recorded (default: unbounded)")
                .value_parser(RangedU64ValueParser::<usize>::new().range(1..)),
        )
        .arg(
            arg!(--"max-depth" <HOPS>)
                .required(false)
                .help("Do not follow links further than this many hops from the seed")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--"follow-redirects")
                .required(false)
                .help("Let link probes follow redirects instead of reporting the 3xx status")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-r --"resume" <SNAPSHOT>)
                .required(false)
                .help("Continue a crawl from a progress.json or progress_final.json snapshot")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(-A --"user-agent" <AGENT>)
                .required(false)
                .help("User-Agent header sent with every request")
                .default_value(DEFAULT_USER_AGENT),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Summary format: text, json")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(arg!(-q --"quiet" "Suppress banner, spinner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Log every fetch and queue decision")
                .required(false)
                .conflicts_with("quiet"),
        )
}
