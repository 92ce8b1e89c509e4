mod logging;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use showif_spec::{
    Change, FormSpec, LintReport, Session, build_render_payload, lint, render_json, render_text,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Conditional form visibility CLI",
    long_about = "Checks show-if rules of a form declaration and evaluates field visibility against live values"
)]
struct Cli {
    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Lint a form declaration: operators, field ids, rules, references and cycles.
    Check {
        /// Path to the form JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Evaluate visibility after applying a sequence of value changes.
    Eval {
        /// Path to the form JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Change a field value, applied in order (`name=value`).
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Read `name=value` lines from stdin and print visibility flips as they happen.
    Session {
        /// Path to the form JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
    },
    /// Print the JSON schema of the form declaration.
    Schema,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match cli.command {
        Command::Check { spec, format } => run_check(&spec, format),
        Command::Eval { spec, set, format } => run_eval(&spec, &set, format),
        Command::Session { spec } => run_session(&spec),
        Command::Schema => run_schema(),
    }
}

fn load_spec(path: &Path) -> CliResult<FormSpec> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let spec: FormSpec = serde_json::from_str(&contents)
        .map_err(|err| format!("invalid form JSON in {}: {}", path.display(), err))?;
    debug!(form = %spec.id, fields = spec.fields.len(), "loaded form");
    Ok(spec)
}

fn run_check(spec_path: &Path, format: OutputFormat) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let report = lint(&spec);
    match format {
        OutputFormat::Text => describe_lint(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.valid {
        Ok(())
    } else {
        Err("form check failed".into())
    }
}

fn describe_lint(report: &LintReport) {
    println!(
        "Check result: {}",
        if report.valid { "valid" } else { "invalid" }
    );
    if report.issues.is_empty() {
        return;
    }
    println!("Issues:");
    for issue in &report.issues {
        println!(
            "  [{}] {} - {}",
            issue.code,
            issue.field.as_deref().unwrap_or("<form>"),
            issue.message
        );
    }
}

fn run_eval(spec_path: &Path, assignments: &[String], format: OutputFormat) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let mut session = Session::start(spec)?;
    for assignment in assignments {
        let (name, value) = parse_assignment(assignment)?;
        let change = session.change(name, value)?;
        log_change(&change);
    }

    let payload = build_render_payload(&session);
    match format {
        OutputFormat::Text => println!("{}", render_text(&payload)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json(&payload))?),
    }
    Ok(())
}

fn run_session(spec_path: &Path) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let mut session = Session::start(spec)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let result = parse_assignment(line)
            .map_err(|err| err.to_string())
            .and_then(|(name, value)| session.change(name, value).map_err(|err| err.to_string()));
        match result {
            Ok(change) => {
                log_change(&change);
                if change.flipped.is_empty() {
                    writeln!(out, "{}: no visibility change", line)?;
                }
                let naming = session.spec().engine.naming();
                for (id, shown) in &change.flipped {
                    writeln!(
                        out,
                        "{} {}",
                        naming.base_name(id),
                        if *shown { "shown" } else { "hidden" }
                    )?;
                }
            }
            Err(message) => writeln!(out, "error: {}", message)?,
        }
    }

    writeln!(out, "{}", render_text(&build_render_payload(&session)))?;
    Ok(())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(FormSpec);
    let value: Value = serde_json::to_value(&schema)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn parse_assignment(raw: &str) -> CliResult<(&str, &str)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{}'", raw).into());
    }
    Ok((name, value))
}

fn log_change(change: &Change) {
    debug!(
        field = %change.field,
        evaluations = change.report.evaluations,
        flipped = change.flipped.len(),
        "applied change"
    );
    for error in &change.report.errors {
        warn!(%error, "evaluation error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(parse_assignment("age=18").unwrap(), ("age", "18"));
        assert_eq!(parse_assignment(" note =a=b").unwrap(), ("note", "a=b"));
        assert_eq!(parse_assignment("email=").unwrap(), ("email", ""));
        assert!(parse_assignment("age").is_err());
        assert!(parse_assignment("=1").is_err());
    }
}
