use std::io::Write;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::NamedTempFile;

const GENESIS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
const ETH: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

fn cardaddr() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cardaddr"));
    cmd.arg("--output").arg("json");
    cmd
}

fn run_check(args: &[&str]) -> Output {
    cardaddr()
        .arg("check")
        .args(args)
        .output()
        .expect("failed to run cardaddr")
}

fn cards_csv(csv_rows: &[&str]) -> NamedTempFile {
    let mut csv_file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("failed to create temp csv");
    writeln!(csv_file, "card_id,user_id,btc_address,eth_address")
        .expect("failed to write csv header");
    for row in csv_rows {
        writeln!(csv_file, "{row}").expect("failed to write csv row");
    }
    csv_file.flush().expect("failed to flush csv");
    csv_file
}

fn run_audit(csv_rows: &[&str]) -> Output {
    let csv_file = cards_csv(csv_rows);
    cardaddr()
        .arg("audit")
        .arg(csv_file.path())
        .output()
        .expect("failed to run cardaddr")
}

fn json_tempfile() -> NamedTempFile {
    tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("failed to create temp config")
}

fn parse_stdout(output: &Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout should be UTF-8");
    serde_json::from_str(stdout.trim()).expect("stdout should contain JSON payload")
}

fn parse_agent_error(output: &Output) -> Value {
    let stderr = String::from_utf8(output.stderr.clone()).expect("stderr should be UTF-8");
    serde_json::from_str(stderr.trim()).expect("stderr should contain JSON error payload")
}

#[test]
fn check_accepts_valid_addresses() {
    let output = run_check(&[GENESIS, "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq"]);
    assert_eq!(output.status.code(), Some(0));

    let payload = parse_stdout(&output);
    let verdicts = payload.as_array().expect("payload should be an array");
    assert_eq!(verdicts.len(), 2);
    assert_eq!(verdicts[0]["family"], "legacy");
    assert_eq!(verdicts[1]["family"], "bech32");
    assert!(verdicts.iter().all(|v| v["valid"] == true));
}

#[test]
fn check_rejects_placeholder_with_invalid_format_message() {
    let output = run_check(&[GENESIS, "1BTCadressshouldnotpass123"]);
    assert_eq!(output.status.code(), Some(1));

    let payload = parse_agent_error(&output);
    assert_eq!(payload["error"], "validation_failed");
    let details = payload["details"]
        .as_array()
        .expect("details should be an array");
    assert_eq!(details[0]["valid"], true);
    assert_eq!(details[1]["valid"], false);
    assert!(details[1]["reason"]
        .as_str()
        .map(|m| m.contains("invalid address format"))
        .unwrap_or(false));
}

#[test]
fn legacy_rule_flag_selects_rule_set() {
    let strict = run_check(&["11QAZXSWedcvfr4322WSXZxsw"]);
    assert_eq!(strict.status.code(), Some(1));

    let historical = cardaddr()
        .arg("--legacy-rule")
        .arg("historical")
        .arg("check")
        .arg("11QAZXSWedcvfr4322WSXZxsw")
        .output()
        .expect("failed to run cardaddr");
    assert_eq!(historical.status.code(), Some(0));
}

#[test]
fn config_file_selects_rule_set() {
    let mut config = json_tempfile();
    write!(config, r#"{{"legacy_rule": "historical"}}"#).expect("failed to write config");
    config.flush().expect("failed to flush config");

    let output = cardaddr()
        .arg("--config")
        .arg(config.path())
        .arg("check")
        .arg("11QAZXSWedcvfr4322WSXZxsw")
        .output()
        .expect("failed to run cardaddr");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn bad_config_exits_with_config_error() {
    let mut config = json_tempfile();
    write!(config, r#"{{"legacy_rule": "loose"}}"#).expect("failed to write config");
    config.flush().expect("failed to flush config");

    let output = cardaddr()
        .arg("--config")
        .arg(config.path())
        .arg("check")
        .arg(GENESIS)
        .output()
        .expect("failed to run cardaddr");
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(parse_agent_error(&output)["error"], "config_error");
}

#[test]
fn check_eth_currency() {
    let output = run_check(&["--currency", "eth", ETH]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(parse_stdout(&output)[0]["family"], "ethereum");
}

#[test]
fn audit_reports_tallies_when_all_valid() {
    let output = run_audit(&[format!("1,10,{GENESIS},{ETH}").as_str()]);
    assert_eq!(output.status.code(), Some(0));

    let report = parse_stdout(&output);
    assert_eq!(report["cards_checked"], 1);
    assert_eq!(report["btc"]["valid"], 1);
    assert_eq!(report["eth"]["valid"], 1);
}

#[test]
fn audit_lists_invalid_and_missing_addresses() {
    let output = run_audit(&[
        format!("1,10,{GENESIS},{ETH}").as_str(),
        format!("2,11,1000000000000,{ETH}").as_str(),
        "3,12,,0x1234",
    ]);
    assert_eq!(output.status.code(), Some(1));

    let payload = parse_agent_error(&output);
    assert_eq!(payload["error"], "validation_failed");
    let report = &payload["details"];
    assert_eq!(report["btc"]["invalid"], 2);
    assert_eq!(report["eth"]["invalid"], 1);

    let issues = report["issues"].as_array().expect("issues should be an array");
    assert_eq!(issues.len(), 3);
    assert!(issues
        .iter()
        .any(|issue| issue["card_id"] == 3 && issue["currency"] == "btc"));
}

#[test]
fn audit_missing_file_exits_with_io_error() {
    let output = cardaddr()
        .arg("audit")
        .arg("/nonexistent/cards.csv")
        .output()
        .expect("failed to run cardaddr");
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(parse_agent_error(&output)["error"], "io_error");
}

#[test]
fn fix_writes_repaired_cards_that_audit_clean() {
    let input = cards_csv(&[
        format!("1,10,{GENESIS},{ETH}").as_str(),
        format!("2,11,1BTCadressFAKE12345,{ETH}").as_str(),
        "3,12,,0x1234",
    ]);
    let out_dir = tempfile::tempdir().expect("failed to create temp dir");
    let out_path = out_dir.path().join("fixed.csv");

    let output = cardaddr()
        .arg("fix")
        .arg(input.path())
        .arg("--out")
        .arg(&out_path)
        .output()
        .expect("failed to run cardaddr");
    assert_eq!(output.status.code(), Some(0));

    let report = parse_stdout(&output);
    assert_eq!(report["cards_checked"], 3);
    let repaired = report["repaired"].as_array().expect("repaired should be an array");
    assert_eq!(repaired.len(), 3);
    assert_eq!(repaired[0]["card_id"], 2);
    assert_eq!(repaired[0]["previous"], "1BTCadressFAKE12345");
    assert!(repaired
        .iter()
        .any(|r| r["card_id"] == 3 && r["currency"] == "btc" && r.get("previous").is_none()));
    assert_eq!(report["unrepaired"].as_array().map(Vec::len), Some(0));

    let written = std::fs::read_to_string(&out_path).expect("fixed csv should exist");
    assert!(written.contains(GENESIS));
    assert!(!written.contains("1BTCadressFAKE12345"));

    let audit = cardaddr()
        .arg("audit")
        .arg(&out_path)
        .output()
        .expect("failed to run cardaddr");
    assert_eq!(audit.status.code(), Some(0));
    assert_eq!(parse_stdout(&audit)["btc"]["valid"], 3);
}

#[test]
fn fix_rejects_unsupported_output_extension() {
    let input = cards_csv(&[format!("1,10,{GENESIS},{ETH}").as_str()]);
    let out_dir = tempfile::tempdir().expect("failed to create temp dir");

    let output = cardaddr()
        .arg("fix")
        .arg(input.path())
        .arg("--out")
        .arg(out_dir.path().join("fixed.txt"))
        .output()
        .expect("failed to run cardaddr");
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(parse_agent_error(&output)["error"], "input_error");
}

#[test]
fn check_currency_tag_is_case_insensitive() {
    let output = run_check(&["--currency", "ETH", ETH]);
    assert_eq!(output.status.code(), Some(0));

    let unknown = run_check(&["--currency", "doge", GENESIS]);
    assert_eq!(unknown.status.code(), Some(2));
}

#[test]
fn generate_emits_requested_count_of_valid_addresses() {
    let output = cardaddr()
        .arg("generate")
        .arg("--count")
        .arg("5")
        .output()
        .expect("failed to run cardaddr");
    assert_eq!(output.status.code(), Some(0));

    let addresses = parse_stdout(&output);
    let addresses = addresses.as_array().expect("payload should be an array");
    assert_eq!(addresses.len(), 5);
    for address in addresses {
        let address = address.as_str().expect("address should be a string");
        assert_eq!(address.len(), 29);
        assert!(cardaddr_core::is_valid_address(address));
    }
}

#[test]
fn unicode_address_is_rejected_without_panic() {
    let output = run_check(&["1\u{4F60}\u{4F60}\u{4F60}\u{4F60}\u{4F60}\u{4F60}\u{4F60}\u{4F60}"]);
    assert_eq!(output.status.code(), Some(1));
    let payload = parse_agent_error(&output);
    assert_eq!(payload["details"][0]["valid"], false);
}
