pub mod crawl;
pub mod error;
pub mod report;

pub use error::CoreError;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
     _ _                   _ _
 ___(_) |_ _____      ____ _| | | __
/ __| | __/ _ \ \ /\ / / _` | | |/ /
\__ \ | ||  __/\ V  V / (_| | |   <
|___/_|\__\___| \_/\_/ \__,_|_|_|\_\
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "single-site crawler and link auditor".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
