//! cardaddr CLI entry point: check, audit, fix, and generate card addresses.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use log::debug;
use serde::Serialize;

use cardaddr_core::{
    audit_cards, generate_batch, records, repair_cards, truncate_address, AddressFamily,
    AddressIssue, AddressValidator, AgentError, AuditReport, CardAddrError, CardRecord, Currency,
    LegacyRule, OutputMode, Repair, RepairReport, ValidatorConfig,
};

const EXIT_INVALID: i32 = 1;
const EXIT_CONFIG: i32 = 2;
const EXIT_IO: i32 = 3;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Auto,
    Json,
    Human,
}

/// CLI-only enums to satisfy clap's ValueEnum without adding clap to core.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLegacyRule {
    Strict,
    Historical,
}

impl CliLegacyRule {
    fn to_core(self) -> LegacyRule {
        match self {
            CliLegacyRule::Strict => LegacyRule::Strict,
            CliLegacyRule::Historical => LegacyRule::Historical,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "cardaddr", version)]
#[command(about = "Validate, audit, repair, and generate crypto addresses attached to cards")]
struct Cli {
    /// Output format: auto (tty=human, pipe=agent), json (agent), human (operator).
    #[arg(long, value_enum, default_value = "auto", global = true)]
    output: OutputFormat,

    /// Legacy address rule set; overrides the config file.
    #[arg(long, value_enum, global = true)]
    legacy_rule: Option<CliLegacyRule>,

    /// JSON validator config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all logging.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check one or more addresses.
    Check {
        #[arg(required = true)]
        addresses: Vec<String>,

        /// Currency tag: btc or eth (case-insensitive).
        #[arg(long, default_value = "btc", value_parser = Currency::from_str)]
        currency: Currency,
    },
    /// Audit stored card addresses from a .csv or .json export.
    Audit { input: PathBuf },
    /// Replace missing or invalid addresses and write the repaired cards.
    Fix {
        input: PathBuf,

        /// Destination .csv or .json file.
        #[arg(long)]
        out: PathBuf,
    },
    /// Generate legacy-shaped fixture addresses.
    Generate {
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

/// Per-address result of `check`.
#[derive(Debug, Clone, Serialize)]
struct Verdict {
    address: String,
    currency: Currency,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    family: Option<AddressFamily>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Detect output mode based on CLI flags and TTY detection.
fn detect_output_mode(output: OutputFormat) -> OutputMode {
    match output {
        OutputFormat::Human => OutputMode::Human,
        OutputFormat::Json => OutputMode::Agent,
        OutputFormat::Auto => {
            if std::io::stdout().is_terminal() {
                OutputMode::Human
            } else {
                OutputMode::Agent
            }
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    stderrlog::new()
        .module(module_path!())
        .module("cardaddr_core")
        .quiet(quiet)
        .verbosity(usize::from(verbose))
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .context("failed to initialise logging")
}

fn spinner(mode: OutputMode, message: &str) -> Option<ProgressBar> {
    if mode != OutputMode::Human {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

fn human_header(title: &str) {
    println!(
        "{}",
        "╔═══════════════════════════════════════════════════════════════╗".bright_white()
    );
    println!("{}", format!("║  {:<61}║", title).bright_white());
    println!(
        "{}",
        "╚═══════════════════════════════════════════════════════════════╝".bright_white()
    );
    println!();
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn status_cell(valid: bool) -> String {
    if valid {
        format!("{} {}", "✓".green(), "Valid".green())
    } else {
        format!("{} {}", "✗".red(), "Invalid".red())
    }
}

fn render_verdicts_table(verdicts: &[Verdict]) -> Table {
    let mut table = new_table(&["Address", "Currency", "Family", "Status", "Reason"]);
    for v in verdicts {
        table.add_row(vec![
            Cell::new(truncate_address(&v.address)),
            Cell::new(v.currency),
            Cell::new(v.family.map(|f| f.as_str()).unwrap_or("-")),
            Cell::new(status_cell(v.valid)),
            Cell::new(v.reason.as_deref().unwrap_or("")),
        ]);
    }
    table
}

fn render_issues_table(issues: &[AddressIssue]) -> Table {
    let mut table = new_table(&["Card", "User", "Currency", "Address", "Message"]);
    for issue in issues {
        table.add_row(vec![
            Cell::new(issue.card_id),
            Cell::new(issue.user_id),
            Cell::new(issue.currency),
            Cell::new(
                issue
                    .address
                    .as_deref()
                    .map(truncate_address)
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(&issue.message),
        ]);
    }
    table
}

fn render_repairs_table(repairs: &[Repair]) -> Table {
    let mut table = new_table(&["Card", "User", "Currency", "Previous", "Replacement"]);
    for repair in repairs {
        table.add_row(vec![
            Cell::new(repair.card_id),
            Cell::new(repair.user_id),
            Cell::new(repair.currency),
            Cell::new(
                repair
                    .previous
                    .as_deref()
                    .map(truncate_address)
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(truncate_address(&repair.replacement)),
        ]);
    }
    table
}

fn emit_agent_error<D: Serialize>(err: &AgentError<D>) -> Result<()> {
    let json = serde_json::to_string(err).context("failed to serialize agent error")?;
    eprintln!("{json}");
    Ok(())
}

fn emit_agent_payload<T: Serialize>(payload: &T) -> Result<()> {
    let json = serde_json::to_string(payload).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// Report a core error in the active mode and exit with its code.
fn fail<T>(mode: OutputMode, err: &CardAddrError) -> Result<T> {
    let (label, code) = match err {
        CardAddrError::Io(_) => ("io_error", EXIT_IO),
        CardAddrError::Config(_) => ("config_error", EXIT_CONFIG),
        CardAddrError::Parse { .. } | CardAddrError::Csv(_) | CardAddrError::Json(_) => {
            ("input_error", EXIT_CONFIG)
        }
    };
    match mode {
        OutputMode::Human => eprintln!("{} {}", "✗".red(), err.to_string().red()),
        OutputMode::Agent => emit_agent_error(&AgentError {
            error: label.to_string(),
            code,
            details: Some(err.to_string()),
        })?,
    }
    std::process::exit(code);
}

fn build_validator(
    config: Option<&Path>,
    rule: Option<CliLegacyRule>,
) -> Result<AddressValidator, CardAddrError> {
    let mut config = match config {
        Some(path) => ValidatorConfig::from_json_file(path)?,
        None => ValidatorConfig::default(),
    };
    if let Some(rule) = rule {
        config.legacy_rule = rule.to_core();
    }
    debug!("validator config: {config:?}");
    Ok(AddressValidator::from(&config))
}

fn run_check(
    mode: OutputMode,
    validator: &AddressValidator,
    addresses: &[String],
    currency: Currency,
) -> Result<()> {
    let verdicts: Vec<Verdict> = addresses
        .iter()
        .map(|address| match validator.validate_for(address, currency) {
            Ok(family) => Verdict {
                address: address.trim().to_string(),
                currency,
                valid: true,
                family: Some(family),
                reason: None,
            },
            Err(err) => Verdict {
                address: address.trim().to_string(),
                currency,
                valid: false,
                family: None,
                reason: Some(err.to_string()),
            },
        })
        .collect();

    let all_valid = verdicts.iter().all(|v| v.valid);

    match mode {
        OutputMode::Human => {
            human_header("CARDADDR — Address Check");
            println!("{}", render_verdicts_table(&verdicts));
            println!();
            if all_valid {
                println!("{} {}", "✓".green(), "All addresses are valid.".green());
            } else {
                println!(
                    "{} {}",
                    "✗".red(),
                    "Invalid address format. Do not persist the rejected addresses.".red()
                );
            }
        }
        OutputMode::Agent if all_valid => emit_agent_payload(&verdicts)?,
        OutputMode::Agent => emit_agent_error(&AgentError {
            error: "validation_failed".to_string(),
            code: EXIT_INVALID,
            details: Some(&verdicts),
        })?,
    }

    if !all_valid {
        std::process::exit(EXIT_INVALID);
    }
    Ok(())
}

fn print_report_summary(report: &AuditReport) {
    println!(
        "{} {}",
        "Cards checked:".bright_white().bold(),
        report.cards_checked.to_string().bright_white().bold()
    );
    for currency in [Currency::Btc, Currency::Eth] {
        let tally = report.tally(currency);
        println!(
            "{} {} valid, {} invalid",
            format!("{}:", currency.as_str().to_uppercase()).bright_white().bold(),
            tally.valid.to_string().green(),
            tally.invalid.to_string().red()
        );
    }
}

fn run_audit(mode: OutputMode, validator: &AddressValidator, input: &Path) -> Result<()> {
    let cards = load_cards(mode, input)?;
    let report = audit_cards(validator, &cards);

    match mode {
        OutputMode::Human => {
            if report.all_valid() {
                human_header("CARDADDR — Audit Passed");
                print_report_summary(&report);
                println!();
                println!("{}", "All card addresses are valid.".green());
            } else {
                human_header("CARDADDR — Audit Failed");
                print_report_summary(&report);
                println!();
                println!("{}", render_issues_table(&report.issues));
                println!();
                println!(
                    "{}",
                    "Run `cardaddr fix` or reissue the addresses above.".yellow()
                );
            }
        }
        OutputMode::Agent if report.all_valid() => emit_agent_payload(&report)?,
        OutputMode::Agent => emit_agent_error(&AgentError {
            error: "validation_failed".to_string(),
            code: EXIT_INVALID,
            details: Some(&report),
        })?,
    }

    if !report.all_valid() {
        std::process::exit(EXIT_INVALID);
    }
    Ok(())
}

fn load_cards(mode: OutputMode, input: &Path) -> Result<Vec<CardRecord>> {
    let pb = spinner(mode, "Reading card records…");
    let loaded = records::load_records(input);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    match loaded {
        Ok(cards) => Ok(cards),
        Err(err) => fail(mode, &err),
    }
}

fn print_repair_summary(report: &RepairReport, out: &Path) {
    println!(
        "{} {}",
        "Cards checked:".bright_white().bold(),
        report.cards_checked.to_string().bright_white().bold()
    );
    println!(
        "{} {}",
        "Addresses replaced:".bright_white().bold(),
        report.repaired.len().to_string().green()
    );
    println!(
        "{} {}",
        "Unrepaired:".bright_white().bold(),
        report.unrepaired.len().to_string().red()
    );
    println!("{} {}", "Written to:".bright_white().bold(), out.display());
}

fn run_fix(
    mode: OutputMode,
    validator: &AddressValidator,
    input: &Path,
    out: &Path,
) -> Result<()> {
    let mut cards = load_cards(mode, input)?;
    let report = repair_cards(validator, &mut cards, &mut rand::thread_rng());
    if let Err(err) = records::save_records(out, &cards) {
        return fail(mode, &err);
    }

    match mode {
        OutputMode::Human => {
            if report.all_repaired() {
                human_header("CARDADDR — Repair Complete");
            } else {
                human_header("CARDADDR — Repair Incomplete");
            }
            print_repair_summary(&report, out);
            if !report.repaired.is_empty() {
                println!();
                println!("{}", render_repairs_table(&report.repaired));
            }
            if !report.unrepaired.is_empty() {
                println!();
                println!("{}", render_issues_table(&report.unrepaired));
            }
        }
        OutputMode::Agent if report.all_repaired() => emit_agent_payload(&report)?,
        OutputMode::Agent => emit_agent_error(&AgentError {
            error: "repair_incomplete".to_string(),
            code: EXIT_INVALID,
            details: Some(&report),
        })?,
    }

    if !report.all_repaired() {
        std::process::exit(EXIT_INVALID);
    }
    Ok(())
}

fn run_generate(mode: OutputMode, count: usize) -> Result<()> {
    let addresses = generate_batch(&mut rand::thread_rng(), count);
    match mode {
        OutputMode::Human => {
            for address in &addresses {
                println!("{address}");
            }
        }
        OutputMode::Agent => emit_agent_payload(&addresses)?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;
    let mode = detect_output_mode(cli.output);

    let validator = match build_validator(cli.config.as_deref(), cli.legacy_rule) {
        Ok(validator) => validator,
        Err(err) => return fail(mode, &err),
    };

    match &cli.command {
        Commands::Check {
            addresses,
            currency,
        } => run_check(mode, &validator, addresses, *currency),
        Commands::Audit { input } => run_audit(mode, &validator, input),
        Commands::Fix { input, out } => run_fix(mode, &validator, input, out),
        Commands::Generate { count } => run_generate(mode, *count),
    }
}
