//! Card record loading and saving for CSV and JSON exports.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::error::{CardAddrError, Result};
use crate::types::CardRecord;

const MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Default, Clone, Copy)]
struct HeaderIndexes {
    card_id: Option<usize>,
    user_id: Option<usize>,
    btc_address: Option<usize>,
    eth_address: Option<usize>,
}

/// Parse a CSV export with a header row.
///
/// Recognised columns are `card_id`, `user_id`, `btc_address` and
/// `eth_address` (plus a few aliases). Empty address cells become `None`.
pub fn parse_csv(input: &[u8]) -> Result<Vec<CardRecord>> {
    check_size(input)?;

    let normalized = strip_utf8_bom(input);
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(normalized);

    let headers = reader.headers()?.clone();
    let indexes = parse_headers(&headers)?;

    let mut cards = Vec::new();
    for (record_idx, record_result) in reader.records().enumerate() {
        // Header is line 1.
        let line = record_idx + 2;
        let record = record_result?;

        cards.push(CardRecord {
            card_id: required_id_cell(&record, indexes.card_id, "card_id", line)?,
            user_id: id_cell(&record, indexes.user_id, "user_id", line)?.unwrap_or(0),
            btc_address: optional_cell(&record, indexes.btc_address),
            eth_address: optional_cell(&record, indexes.eth_address),
        });
    }

    Ok(cards)
}

/// Parse a JSON array of card records.
pub fn parse_json(input: &[u8]) -> Result<Vec<CardRecord>> {
    check_size(input)?;
    Ok(serde_json::from_slice(strip_utf8_bom(input))?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordFormat {
    Csv,
    Json,
}

impl RecordFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(CardAddrError::parse(
                "E_INPUT_EXT",
                format!(
                    "unsupported card file extension for '{}': expected .csv or .json",
                    path.display()
                ),
            )),
        }
    }
}

/// Read card records from `path`, choosing the parser by file extension.
pub fn load_records(path: &Path) -> Result<Vec<CardRecord>> {
    let format = RecordFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    let cards = match format {
        RecordFormat::Csv => parse_csv(&bytes)?,
        RecordFormat::Json => parse_json(&bytes)?,
    };
    log::info!("loaded {} card records from {}", cards.len(), path.display());
    Ok(cards)
}

/// Render cards as CSV with the canonical header. Missing addresses are
/// written as empty cells so the output parses back with [`parse_csv`].
pub fn write_csv(cards: &[CardRecord]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["card_id", "user_id", "btc_address", "eth_address"])?;
    for card in cards {
        writer.write_record([
            card.card_id.to_string().as_str(),
            card.user_id.to_string().as_str(),
            card.btc_address.as_deref().unwrap_or_default(),
            card.eth_address.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.into_inner().map_err(|err| err.into_error().into())
}

/// Render cards as a pretty-printed JSON array.
pub fn write_json(cards: &[CardRecord]) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(cards)?;
    out.push(b'\n');
    Ok(out)
}

/// Write card records to `path`, choosing the format by file extension.
pub fn save_records(path: &Path, cards: &[CardRecord]) -> Result<()> {
    let bytes = match RecordFormat::from_path(path)? {
        RecordFormat::Csv => write_csv(cards)?,
        RecordFormat::Json => write_json(cards)?,
    };
    std::fs::write(path, bytes)?;
    log::info!("wrote {} card records to {}", cards.len(), path.display());
    Ok(())
}

fn check_size(input: &[u8]) -> Result<()> {
    if input.len() > MAX_FILE_SIZE_BYTES {
        return Err(CardAddrError::parse(
            "E_INPUT_SIZE",
            format!("input exceeds maximum file size of {MAX_FILE_SIZE_BYTES} bytes"),
        ));
    }
    Ok(())
}

fn parse_headers(headers: &StringRecord) -> Result<HeaderIndexes> {
    let mut indexes = HeaderIndexes::default();

    for (idx, header) in headers.iter().enumerate() {
        let slot = match header.trim().to_ascii_lowercase().as_str() {
            "card_id" | "id" | "card" => &mut indexes.card_id,
            "user_id" | "userid" | "user" => &mut indexes.user_id,
            "btc_address" | "btcaddress" | "btc" => &mut indexes.btc_address,
            "eth_address" | "ethaddress" | "eth" => &mut indexes.eth_address,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(idx);
        }
    }

    if indexes.card_id.is_none() {
        return Err(CardAddrError::parse(
            "E_MISSING_COLUMN",
            "missing required CSV column: card_id|id|card",
        ));
    }
    if indexes.btc_address.is_none() && indexes.eth_address.is_none() {
        return Err(CardAddrError::parse(
            "E_MISSING_COLUMN",
            "missing address column: btc_address|btc or eth_address|eth",
        ));
    }

    Ok(indexes)
}

fn optional_cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|idx| record.get(idx))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn id_cell(
    record: &StringRecord,
    index: Option<usize>,
    column: &'static str,
    line: usize,
) -> Result<Option<u64>> {
    optional_cell(record, index)
        .map(|value| {
            value.parse::<u64>().map_err(|_| {
                CardAddrError::parse(
                    "E_BAD_ID",
                    format!("line {line}: {column} '{value}' is not a non-negative integer"),
                )
            })
        })
        .transpose()
}

fn required_id_cell(
    record: &StringRecord,
    index: Option<usize>,
    column: &'static str,
    line: usize,
) -> Result<u64> {
    id_cell(record, index, column, line)?.ok_or_else(|| {
        CardAddrError::parse("E_BAD_ID", format!("line {line}: {column} is empty"))
    })
}

fn strip_utf8_bom(input: &[u8]) -> &[u8] {
    input.strip_prefix(&[0xEF_u8, 0xBB, 0xBF][..]).unwrap_or(input)
}
