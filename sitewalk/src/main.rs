use colored::Colorize;
use sitewalk::commands::command_argument_builder;
use sitewalk::handlers::{handle_crawl, init_logging};
use sitewalk_core::print_banner;

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    let quiet = matches.get_flag("quiet");
    let json = matches.get_one::<String>("format").map(String::as_str) == Some("json");

    init_logging(matches.get_flag("verbose"), quiet);

    // Show banner unless --quiet flag is set or stdout carries JSON
    if !quiet && !json {
        print_banner();
    }

    if let Err(e) = handle_crawl(&matches).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
