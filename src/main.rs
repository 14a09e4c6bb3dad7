//! Command line front end of `fitch`
//!
//! - `fitch validate --logic L --premises P --conclusion C` checks that a problem is well formed
//! - `fitch check [FILE]` checks a JSON proof request read from `FILE` or stdin
//! - `fitch logics` lists the supported logics and their rules

use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use fitch::{
    driver::{validate_problem, CheckReport, CheckRequest, ProblemError, Status},
    Logic,
};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fitch")]
#[command(about = "Checks natural deduction proofs in Fitch notation")]
#[command(version)]
struct Cli {
    /// Log every checked line
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that premises and conclusion parse under a logic
    Validate {
        #[arg(short, long, default_value = "TFL")]
        logic: String,
        /// Premises separated by "," or ";", or "NA"
        #[arg(short, long, default_value = "")]
        premises: String,
        #[arg(short, long)]
        conclusion: String,
    },
    /// Check a proof given as a JSON request, printing a JSON report
    Check {
        /// Request file, stdin if omitted
        file: Option<PathBuf>,
        /// Pretty print the report
        #[arg(long)]
        pretty: bool,
    },
    /// List the supported logics with their world discipline and rules
    Logics,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn read_request(file: Option<PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn validate(logic: &str, premises: &str, conclusion: &str) -> ExitCode {
    let result = logic
        .parse::<Logic>()
        .map_err(|_| ProblemError::UnknownLogic(logic.to_owned()))
        .and_then(|logic| validate_problem(logic, premises, conclusion));
    match result {
        Ok(problem) => {
            for (i, premise) in problem.premises.iter().enumerate() {
                println!("{:>3}  {}", i + 1, premise);
            }
            println!("  ∴  {}", problem.conclusion);
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::from(1)
        }
    }
}

fn check(file: Option<PathBuf>, pretty: bool) -> ExitCode {
    let text = match read_request(file) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("could not read request: {}", error);
            return ExitCode::from(2);
        }
    };
    let request: CheckRequest = match serde_json::from_str(&text) {
        Ok(request) => request,
        Err(error) => {
            eprintln!("invalid request: {}", error);
            return ExitCode::from(2);
        }
    };
    let report = request.check();
    debug!(status = ?report.status, lines = report.lines.len(), "report ready");
    let json = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(error) => {
            eprintln!("could not write report: {}", error);
            return ExitCode::from(2);
        }
    }
    exit_code(&report)
}

fn exit_code(report: &CheckReport) -> ExitCode {
    match report.status {
        Status::Complete => ExitCode::SUCCESS,
        Status::Incomplete | Status::Error => ExitCode::from(1),
    }
}

fn logics() -> ExitCode {
    for logic in Logic::ALL {
        let rules: Vec<_> = logic.rules().map(|spec| spec.name).collect();
        println!("{:<7} {:?}", logic.name(), logic.world_discipline());
        println!("        {}", rules.join(" "));
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Validate {
            logic,
            premises,
            conclusion,
        } => validate(&logic, &premises, &conclusion),
        Commands::Check { file, pretty } => check(file, pretty),
        Commands::Logics => logics(),
    }
}
