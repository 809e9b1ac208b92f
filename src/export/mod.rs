//! Deck export to spreadsheet, JSON and CSV files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{Format, Workbook};

use crate::models::Card;

pub const SHEET_NAME: &str = "Deck";
pub const HEADERS: [&str; 7] = ["Name", "Set", "Color", "Type", "Power", "Cost", "Effect"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Json,
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Xlsx, ExportFormat::Json, ExportFormat::Csv];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

enum Cell<'a> {
    Text(Option<&'a str>),
    Number(Option<i64>),
}

fn row(card: &Card) -> [Cell<'_>; 7] {
    [
        Cell::Text(Some(card.name.as_str())),
        Cell::Text(card.set_code.as_deref()),
        Cell::Text(card.color.as_deref()),
        Cell::Text(card.card_type.as_deref()),
        Cell::Number(card.power),
        Cell::Number(card.cost),
        Cell::Text(card.effect_text.as_deref()),
    ]
}

/// `<deck name>_export.<ext>`, with characters that would escape the directory replaced.
pub fn export_file_name(deck_name: &str, format: ExportFormat) -> String {
    let safe: String = deck_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    let safe = match safe.trim() {
        "" | "." | ".." => "deck",
        trimmed => trimmed,
    };
    format!("{safe}_export.{}", format.extension())
}

/// Header row plus one line per card; every field is quoted and embedded quotes doubled.
pub fn to_csv(cards: &[Card]) -> String {
    let mut lines = Vec::with_capacity(cards.len() + 1);
    lines.push(HEADERS.join(","));

    for card in cards {
        let fields: Vec<String> = row(card)
            .iter()
            .map(|cell| match cell {
                Cell::Text(value) => quote(value.unwrap_or_default()),
                Cell::Number(value) => quote(&value.map(|n| n.to_string()).unwrap_or_default()),
            })
            .collect();
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Full card records, pretty-printed with two-space indentation.
pub fn to_json(cards: &[Card]) -> Result<String> {
    serde_json::to_string_pretty(cards).context("failed to serialize deck cards")
}

pub fn write_xlsx(cards: &[Card], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, card) in cards.iter().enumerate() {
        let row_index = index as u32 + 1;
        for (col, cell) in row(card).iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(Some(text)) => {
                    sheet.write_string(row_index, col, *text)?;
                }
                Cell::Number(Some(number)) => {
                    sheet.write_number(row_index, col, *number as f64)?;
                }
                Cell::Text(None) | Cell::Number(None) => {}
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Writes the deck in the given format into `out_dir`, returning the file path.
pub fn export_deck(
    deck_name: &str,
    cards: &[Card],
    format: ExportFormat,
    out_dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let path = out_dir.join(export_file_name(deck_name, format));

    match format {
        ExportFormat::Xlsx => write_xlsx(cards, &path)?,
        ExportFormat::Json => write_text(&path, &to_json(cards)?)?,
        ExportFormat::Csv => write_text(&path, &to_csv(cards))?,
    }

    info!("Exported {} cards to {}", cards.len(), path.display());
    Ok(path)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
