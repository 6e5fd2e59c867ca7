use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use usort::analyzer::Analyzer;
use usort::config::{Config, ConfigManager, CONFIG_FILE_NAME};

#[derive(Parser)]
#[command(name = "usort")]
#[command(about = "Fast using-directive sorter for C# files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check using directives in a project
    Check {
        /// Path to check (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Rewrite files whose using directives need reorganizing
        #[arg(long, short)]
        fix: bool,

        /// Output format (default, json, github)
        #[arg(long, default_value = "default")]
        format: String,

        /// Exit with code 1 if any issues found
        #[arg(long)]
        strict: bool,
    },

    /// Show/modify configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Generate default config file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            path,
            fix,
            format,
            strict,
        } => {
            run_check(path, fix, format, strict);
        }
        Commands::Config { show, init } => {
            handle_config(show, init);
        }
    }
}

fn run_check(path: PathBuf, fix: bool, format: String, strict: bool) {
    let start = Instant::now();

    let config = Config::load_or_default(&path);
    let mut analyzer = Analyzer::new(config);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("static template"),
    );
    pb.set_message("Analyzing files...");

    let results = if fix {
        analyzer.analyze_path_with_autofix(&path)
    } else {
        analyzer.analyze_path(&path)
    };
    pb.finish_and_clear();

    let mut write_failures = 0usize;
    if fix {
        if let Some(fixed_files) = &results.fixed_files {
            for (file, content) in fixed_files {
                if let Err(e) = std::fs::write(file, content) {
                    eprintln!("Warning: Failed to write {}: {}", file.display(), e);
                    write_failures += 1;
                }
            }
        }
    }

    let issue_count = results.total_issues();
    let file_count = results.file_count();
    let duration = start.elapsed();

    match format.as_str() {
        "json" => {
            println!(
                "{}",
                serde_json::to_string_pretty(&results).expect("results serialize")
            );
        }
        "github" => {
            for (file, issues) in &results.file_issues {
                for issue in issues {
                    println!(
                        "::{}::file={},line={},col={}::{}",
                        issue.severity.github_level(),
                        file.display(),
                        issue.location.line,
                        issue.location.column,
                        issue.message
                    );
                }
            }
        }
        _ => {
            if issue_count == 0 {
                println!(
                    "{} {} files in {:.1}s",
                    "✓ Checked".green().bold(),
                    file_count,
                    duration.as_secs_f64()
                );
            } else {
                let mut files: Vec<_> = results.file_issues.iter().collect();
                files.sort_by(|a, b| a.0.cmp(b.0));
                for (file, issues) in files {
                    if !issues.is_empty() {
                        println!("\n{}", file.display().to_string().bold());
                        for issue in issues {
                            println!("{}", issue.display());
                        }
                    }
                }

                println!(
                    "\n{} {} issues in {} files ({:.1}s)",
                    "Found".red().bold(),
                    issue_count,
                    results.files_with_issues(),
                    duration.as_secs_f64()
                );

                if fix {
                    println!(
                        "{} Reorganized {} files",
                        "✓".green().bold(),
                        results.fixes_applied() - write_failures
                    );
                } else if results.fixable_count() > 0 {
                    println!(
                        "{} {} issues can be fixed with --fix",
                        "→".yellow(),
                        results.fixable_count()
                    );
                }
            }
        }
    }

    if strict && (issue_count > 0 || write_failures > 0) {
        process::exit(1);
    }
}

fn handle_config(show: bool, init: bool) {
    let config_manager = ConfigManager::new();

    if init {
        match config_manager.create_default_config() {
            Ok(()) => println!("{} Created {}", "✓".green().bold(), CONFIG_FILE_NAME),
            Err(e) => {
                eprintln!("Failed to create {}: {}", CONFIG_FILE_NAME, e);
                process::exit(1);
            }
        }
    } else if show {
        let config = Config::load_or_default(&PathBuf::from("."));
        println!(
            "{}",
            toml::to_string_pretty(&config).expect("config serializes")
        );
    }
}
