//! Extraction of the IPL points table from rendered markup.
//!
//! The table mixes three cell shapes: a team cell wrapping logo and name in
//! `.ih-pt-cont`, a recent-form cell holding one `.rf` flag per result inside
//! `.ih-pt-fb`, and plain text cells for everything else.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::{RawTableGrid, StandingRecord};

/// Rows shorter than this carry no standings record.
pub const MIN_RECORD_CELLS: usize = 9;

pub const DEFAULT_NET_RUN_RATE: &str = "0.000";

static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static TEAM_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ih-pt-cont").expect("valid selector"));
static FORM_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ih-pt-fb").expect("valid selector"));
static FORM_FLAG: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".rf").expect("valid selector"));

/// Output of one extraction pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtractedTable {
    pub raw: RawTableGrid,
    pub standings: Vec<StandingRecord>,
}

/// Parse `html` and extract the rows matched by `rows_selector`.
pub fn extract_html(html: &str, rows_selector: &str) -> Result<ExtractedTable> {
    let document = Html::parse_document(html);
    extract(&document, rows_selector)
}

/// Walk every row matched by `rows_selector` in document order.
pub fn extract(document: &Html, rows_selector: &str) -> Result<ExtractedTable> {
    let row_sel = Selector::parse(rows_selector)
        .map_err(|e| AppError::Internal(format!("invalid CSS selector '{rows_selector}': {e}")))?;

    let mut table = ExtractedTable::default();

    for (row_index, row) in document.select(&row_sel).enumerate() {
        let cells: Vec<String> = row.select(&CELL).map(cell_text).collect();

        if cells.iter().any(|c| !c.is_empty()) {
            table.raw.push(cells.clone());
        }

        if cells.len() >= MIN_RECORD_CELLS {
            table.standings.push(standing_from_cells(&cells, row_index));
        } else if !cells.is_empty() {
            debug!(row_index, cells = cells.len(), "Row too short for a standings record");
        }
    }

    Ok(table)
}

/// Text of a single cell, picking the first matching shape.
fn cell_text(cell: ElementRef<'_>) -> String {
    let mut team = cell.select(&TEAM_CONTAINER).peekable();
    if team.peek().is_some() {
        return team.flat_map(|e| e.text()).collect::<String>().trim().to_string();
    }

    if cell.select(&FORM_CONTAINER).next().is_some() {
        return cell
            .select(&FORM_FLAG)
            .map(|flag| flag.text().collect::<String>().trim().to_string())
            .collect();
    }

    cell.text().collect::<String>().trim().to_string()
}

/// Build a record from a row with at least [`MIN_RECORD_CELLS`] cells.
///
/// Layout: `pos | logo | team | played | won | lost | tied | nrr | ... | points | ...`.
/// Unparseable numbers take their defaults rather than dropping the row.
fn standing_from_cells(cells: &[String], row_index: usize) -> StandingRecord {
    let fallback_position = u32::try_from(row_index + 1).unwrap_or(u32::MAX);

    let team = match cells[2].as_str() {
        "" => format!("Team {}", row_index + 1),
        name => name.to_string(),
    };
    let net_run_rate = match cells[7].as_str() {
        "" => DEFAULT_NET_RUN_RATE.to_string(),
        nrr => nrr.to_string(),
    };

    StandingRecord {
        position: leading_int(&cells[0])
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(fallback_position),
        team,
        matches: count(&cells[3]),
        won: count(&cells[4]),
        lost: count(&cells[5]),
        tied: count(&cells[6]),
        no_result: 0,
        points: count(&cells[cells.len() - 2]),
        net_run_rate,
    }
}

fn count(text: &str) -> u32 {
    leading_int(text)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

/// Lenient integer prefix: optional sign then digits, trailing text ignored.
/// `"+1.428"` → 1, `"12 pts"` → 12, `"-"` → None.
fn leading_int(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let n = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -n } else { n })
}
