use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use sitewalk_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};
use sitewalk_core::report::{CrawlSummary, ReportFormat, render_report};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber. `RUST_LOG` wins over the flags.
pub fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Asks for the seed URL on `input`. Returns `None` on an empty answer or EOF.
pub fn prompt_for_seed<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<Option<String>> {
    write!(output, "{} ", "Seed URL to crawl:".bright_cyan().bold())?;
    output.flush()?;

    let mut response = String::new();
    input.read_line(&mut response)?;
    let response = response.trim();

    if response.is_empty() {
        Ok(None)
    } else {
        Ok(Some(response.to_string()))
    }
}

/// Tilde-expands the `--output` argument.
pub fn expand_output_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn report_format(args: &ArgMatches) -> ReportFormat {
    args.get_one::<String>("format")
        .and_then(|format| ReportFormat::from_str(format))
        .unwrap_or(ReportFormat::Text)
}

/// Collects the crawl flags into [`CrawlOptions`].
pub fn build_crawl_options(seed: String, args: &ArgMatches) -> CrawlOptions {
    let mut options = CrawlOptions::new(seed);

    if let Some(output) = args.get_one::<String>("output") {
        options.output_dir = expand_output_dir(output);
    }
    if let Some(interval) = args.get_one::<usize>("progress-interval") {
        options.progress_interval = *interval;
    }
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        options.timeout = Duration::from_secs(*timeout);
    }
    if let Some(user_agent) = args.get_one::<String>("user-agent") {
        options.user_agent = user_agent.clone();
    }
    options.max_pages = args.get_one::<usize>("max-pages").copied();
    options.max_depth = args.get_one::<usize>("max-depth").copied();
    options.follow_redirects = args.get_flag("follow-redirects");
    options.resume_from = args.get_one::<PathBuf>("resume").cloned();
    options.show_progress_bars = !args.get_flag("quiet");

    options
}

fn print_crawl_configuration(options: &CrawlOptions) {
    println!("\n{} {}", "Crawling".bright_white().bold(), options.seed.bright_cyan());
    println!("  Output:    {}", options.output_dir.display());
    println!("  Timeout:   {}s", options.timeout.as_secs());
    println!(
        "  Max pages: {}",
        options
            .max_pages
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    );
    println!(
        "  Max depth: {}",
        options
            .max_depth
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    );
    if let Some(ref snapshot) = options.resume_from {
        println!("  Resuming:  {}", snapshot.display());
    }
    println!();
}

pub async fn handle_crawl(args: &ArgMatches) -> Result<()> {
    let seed = match args.get_one::<String>("SEED_URL") {
        Some(seed) => seed.clone(),
        None => match prompt_for_seed(io::stdin().lock(), io::stdout())? {
            Some(seed) => seed,
            None => bail!("No seed URL given"),
        },
    };

    let format = report_format(args);
    let quiet = args.get_flag("quiet");
    let chatty = !quiet && format == ReportFormat::Text;

    let options = build_crawl_options(seed, args);
    if chatty {
        print_crawl_configuration(&options);
    }

    let progress_callback: CrawlProgressCallback = Arc::new(move |msg: String| {
        if chatty {
            println!("{}", msg);
        }
    });

    let outcome = execute_crawl(options, Some(progress_callback))
        .await
        .context("Crawl failed")?;

    let summary = CrawlSummary::from_state(&outcome.seed, &outcome.base_domain, &outcome.state);
    if chatty {
        println!("\n{} Crawl complete in {:.1}s\n", "✓".green().bold(), outcome.elapsed.as_secs_f64());
    }
    print!("{}", render_report(&summary, format)?);

    if chatty {
        println!("\n{}", "Files written:".bold());
        for path in [&outcome.final_snapshot, &outcome.pages_csv, &outcome.links_csv] {
            println!("  {} {}", "→".blue(), path.display());
        }
    }

    Ok(())
}
