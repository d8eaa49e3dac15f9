//! `local-proxy-lint`: check scenario files before the proxy loads them.
//!
//! ```text
//! local-proxy-lint scenarios.json
//! local-proxy-lint ./mocks --output json --strict
//! ```

use clap::{Parser, ValueEnum};
use local_proxy_lint::{lint_directory, lint_file, LintIssue, LintResult, Severity};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "local-proxy-lint")]
#[command(
    author,
    version,
    about = "Validate local-proxy scenario files and report every problem at once"
)]
struct Args {
    /// A scenarios file, or a directory whose *.json files are all checked
    path: PathBuf,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Hide warnings
    #[arg(short = 'e', long)]
    errors_only: bool,

    /// Fail on warnings too
    #[arg(short, long)]
    strict: bool,

    /// Disable ANSI colors (also honored via NO_COLOR)
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    no_color: bool,
}

/// ANSI escape sequences, or empty strings when color is off.
struct Palette {
    red: &'static str,
    yellow: &'static str,
    green: &'static str,
    cyan: &'static str,
    bold: &'static str,
    dim: &'static str,
    reset: &'static str,
}

impl Palette {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                red: "\x1b[31m",
                yellow: "\x1b[33m",
                green: "\x1b[32m",
                cyan: "\x1b[36m",
                bold: "\x1b[1m",
                dim: "\x1b[2m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                red: "",
                yellow: "",
                green: "",
                cyan: "",
                bold: "",
                dim: "",
                reset: "",
            }
        }
    }

    fn severity(&self, severity: Severity) -> &'static str {
        match severity {
            Severity::Error => self.red,
            Severity::Warning => self.yellow,
        }
    }
}

fn main() {
    let args = Args::parse();
    let result = if args.path.is_dir() {
        lint_directory(&args.path)
    } else {
        lint_file(&args.path)
    };

    match args.output {
        OutputFormat::Json => match serde_json::to_string_pretty(&result) {
            Ok(output) => println!("{output}"),
            Err(e) => eprintln!("Failed to serialize results: {e}"),
        },
        OutputFormat::Text => print_report(&result, &args, &Palette::new(!args.no_color)),
    }

    let failed = result.errors > 0 || (args.strict && result.warnings > 0);
    std::process::exit(i32::from(failed));
}

fn print_report(result: &LintResult, args: &Args, p: &Palette) {
    let mut by_file: BTreeMap<&Path, Vec<&LintIssue>> = BTreeMap::new();
    for issue in result
        .issues
        .iter()
        .filter(|issue| !args.errors_only || issue.severity == Severity::Error)
    {
        by_file.entry(issue.file.as_path()).or_default().push(issue);
    }

    for (file, issues) in &by_file {
        println!("{}{}{}", p.bold, file.display(), p.reset);
        for issue in issues {
            print_issue(issue, p);
        }
        println!();
    }

    let verdict = if result.errors > 0 {
        format!("{}{}failed{}", p.bold, p.red, p.reset)
    } else if result.warnings > 0 {
        format!("{}{}passed with warnings{}", p.bold, p.yellow, p.reset)
    } else {
        format!("{}{}ok{}", p.bold, p.green, p.reset)
    };
    println!(
        "{verdict} {}({} file(s), {} error(s), {} warning(s)){}",
        p.dim, result.files_checked, result.errors, result.warnings, p.reset
    );
}

fn print_issue(issue: &LintIssue, p: &Palette) {
    let color = p.severity(issue.severity);
    println!(
        "  {color}{}{} {}{}{} {}{}{}: {}",
        issue.code,
        p.reset,
        p.cyan,
        issue.location_or_root(),
        p.reset,
        color,
        issue.severity.label(),
        p.reset,
        issue.message
    );
    if let Some(suggestion) = &issue.suggestion {
        println!("        {}help:{} {suggestion}", p.green, p.reset);
    }
}
