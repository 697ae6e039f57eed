use crate::backup::{execute_all_jobs, execute_job, BackupResult};
use crate::config::{self, AppConfig};
use crate::database::{ConnectivityProbe, SqlProbe};
use crate::error::Result;
use console::style;
use dialoguer::Select;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
enum MenuOption {
    RunAllJobs,
    RunSingleJob,
    TestConnection,
    Quit,
}

impl std::fmt::Display for MenuOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuOption::RunAllJobs => write!(f, "Run backup now (all jobs)"),
            MenuOption::RunSingleJob => write!(f, "Run a single job"),
            MenuOption::TestConnection => write!(f, "Test database connections"),
            MenuOption::Quit => write!(f, "Quit"),
        }
    }
}

fn display_header() {
    println!();
    println!("{}", style("╔════════════════════════════════════════╗").cyan());
    println!("{}", style("║        Database Dump Backup            ║").cyan());
    println!("{}", style("╚════════════════════════════════════════╝").cyan());
    println!();
}

fn display_summary(config: &AppConfig) {
    let db_count = config.connections.len();
    let job_count = config.jobs.len();

    println!("{}", style("Current Configuration:").bold());
    println!(
        "  Database connections: {}",
        if db_count > 0 {
            style(db_count.to_string()).green()
        } else {
            style("None".to_string()).red()
        }
    );
    println!(
        "  Backup jobs: {}",
        if job_count > 0 {
            style(job_count.to_string()).green()
        } else {
            style("None".to_string()).red()
        }
    );
    println!(
        "  Storage: {} ({})",
        style(config.storage.storage_type).cyan(),
        style(&config.storage.path).cyan()
    );
    println!("  Config file: {}", style(config::config_path().display()).dim());
    println!();
}

pub async fn run_menu(shutdown: Arc<AtomicUsize>) -> Result<()> {
    if !config::exists() {
        config::save(&AppConfig::default())?;
        println!(
            "\n{} {}",
            style("Wrote a default configuration to").yellow(),
            style(config::config_path().display()).cyan()
        );
        println!("Add [[connections]] and [[jobs]] entries there, then run again.");
    }
    let config = config::load()?;

    loop {
        if shutdown.load(Ordering::Relaxed) > 0 {
            break;
        }

        display_header();
        display_summary(&config);

        let menu_items = vec![
            MenuOption::RunAllJobs,
            MenuOption::RunSingleJob,
            MenuOption::TestConnection,
            MenuOption::Quit,
        ];

        let selection = match Select::new()
            .with_prompt("Select an option")
            .items(&menu_items)
            .default(0)
            .interact_opt()
        {
            Ok(Some(s)) => s,
            Ok(None) => break,
            Err(_) => break,
        };

        match menu_items[selection] {
            MenuOption::RunAllJobs => {
                run_all_jobs(&config).await;
            }
            MenuOption::RunSingleJob => {
                run_single_job(&config).await;
            }
            MenuOption::TestConnection => {
                test_connections(&config).await;
            }
            MenuOption::Quit => {
                println!("{}", style("Goodbye!").green());
                break;
            }
        }
    }

    Ok(())
}

fn print_result(result: &BackupResult) {
    if result.success {
        println!(
            "{} {} ({}) - {} ({:.2} MB, {} sec)",
            style("✓").green(),
            result.job_name,
            result.database,
            style("Success").green(),
            result.file_size.unwrap_or(0) as f64 / 1024.0 / 1024.0,
            result.duration_secs
        );
        if let Some(path) = &result.file_path {
            println!("    Backup file created at {}", style(path).cyan());
        }
        if let Some(sha) = &result.sha256 {
            println!("    sha256: {}", style(sha).dim());
        }
    } else {
        println!(
            "{} {} ({}) - {} ({})",
            style("✗").red(),
            result.job_name,
            result.database,
            style("Failed").red(),
            result.error.as_deref().unwrap_or("Unknown error")
        );
    }
}

fn wait_for_enter() {
    println!("\nPress Enter to continue...");
    let _ = std::io::stdin().read_line(&mut String::new());
}

async fn run_all_jobs(config: &AppConfig) {
    if config.jobs.is_empty() {
        println!("{}", style("No backup jobs configured.").red());
        return;
    }

    println!("\n{}", style("Running all backup jobs...").yellow());
    let results = execute_all_jobs(config).await;
    for result in &results {
        print_result(result);
    }

    let success_count = results.iter().filter(|r| r.success).count();
    println!(
        "\nCompleted: {}/{} backup jobs successful",
        style(success_count).green(),
        results.len()
    );
    wait_for_enter();
}

async fn run_single_job(config: &AppConfig) {
    if config.jobs.is_empty() {
        println!("{}", style("No backup jobs configured.").red());
        return;
    }

    let names: Vec<&str> = config.jobs.iter().map(|j| j.name.as_str()).collect();
    let selection = match Select::new()
        .with_prompt("Which job?")
        .items(&names)
        .default(0)
        .interact_opt()
    {
        Ok(Some(s)) => s,
        Ok(None) | Err(_) => return,
    };

    let Some(job) = config.job(names[selection]) else {
        return;
    };
    println!("\n{} {}...", style("Running").yellow(), job.name);
    print_result(&execute_job(config, job).await);
    wait_for_enter();
}

/// Probes every (connection, database) pair referenced by a job.
async fn test_connections(config: &AppConfig) {
    if config.jobs.is_empty() {
        println!(
            "{}",
            style("No backup jobs configured, nothing to test.").red()
        );
        return;
    }

    println!("\n{}", style("Testing database connections...").yellow());

    for job in &config.jobs {
        print!("  {} -> {}/{}... ", job.name, job.connection, job.database);
        let _ = std::io::stdout().flush();
        let Some(db_config) = config.connection(&job.connection) else {
            println!("{}: unknown connection", style("ERROR").red());
            continue;
        };

        let kind = db_config.engine.kind();
        let target = db_config.connection(&job.database).resolve(kind.default_port());
        match SqlProbe.check(kind, &target).await {
            Ok(_) => println!("{}", style("OK").green()),
            Err(e) => println!("{}: {}", style("FAILED").red(), e),
        }
    }

    wait_for_enter();
}
