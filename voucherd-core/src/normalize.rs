//! Normalization boundary for ledger JSON.
//!
//! Records arrive with inconsistent field naming and typing across
//! evolving producers: the spreadsheet exports `Category`/`Sub_1`
//! column headers while newer rows carry `category`/`sub1`, numbers
//! sometimes arrive as strings, and totals are occasionally missing.
//! Everything is normalized exactly once, here, where ledger payloads
//! enter the process. The precedence per field is canonical
//! snake_case key first, then the legacy spellings.

use chrono::NaiveDate;
use serde_json::Value;

use crate::types::{CategoryRow, Snapshot, VoucherKind, VoucherRecord};

/// First present string value among the candidate keys, trimmed.
fn string_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(key) {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn string_field_nonempty(raw: &Value, keys: &[&str]) -> Option<String> {
    string_field(raw, keys).filter(|s| !s.is_empty())
}

/// First present numeric value among the candidate keys.
///
/// Tolerates string-encoded numbers ("12" parses as 12).
fn number_field(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match raw.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn date_field(raw: &Value, keys: &[&str]) -> Option<NaiveDate> {
    let text = string_field_nonempty(raw, keys)?;
    // Accept plain dates and datetime strings with a date prefix.
    let prefix = text.get(..10).unwrap_or(&text);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn kind_field(raw: &Value) -> VoucherKind {
    match string_field(raw, &["type", "Type"]) {
        Some(s) if s.eq_ignore_ascii_case("cash in") => VoucherKind::CashIn,
        _ => VoucherKind::CashOut,
    }
}

fn string_list(raw: &Value, keys: &[&str]) -> Vec<String> {
    for key in keys {
        if let Some(Value::Array(items)) = raw.get(key) {
            return items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
        }
    }
    Vec::new()
}

/// Normalize one raw ledger line into the canonical record shape.
///
/// The total is re-derived from count and unit cost whenever both are
/// present; a stored total is only trusted when one of them is not.
pub fn record(raw: &Value) -> VoucherRecord {
    let count = number_field(raw, &["count", "qty"]);
    let cost_piece = number_field(raw, &["cost_piece", "rate"]).map(|n| n.round() as i64);
    let total_raw = number_field(raw, &["cost_total", "total"]).map(|n| n.round() as i64);

    let count_value = count.unwrap_or(0.0);
    let cost_value = cost_piece.unwrap_or(0);
    let derived = (count_value * cost_value as f64).round() as i64;
    let cost_total = if count.is_some() && cost_piece.is_some() {
        derived
    } else {
        total_raw.unwrap_or(derived)
    };

    VoucherRecord {
        date: date_field(raw, &["date", "Date"]),
        voucher_no: string_field(raw, &["voucherno", "voucher_no"]).unwrap_or_default(),
        entered_by: string_field(raw, &["entered_by", "enteredBy"]).unwrap_or_default(),
        account: string_field(raw, &["account", "Account"]).unwrap_or_default(),
        vendor: string_field(raw, &["vendor", "supplier"]).unwrap_or_default(),
        kind: kind_field(raw),
        category: string_field(raw, &["category", "Category"]).unwrap_or_default(),
        sub1: string_field_nonempty(raw, &["sub1", "Sub_1"]),
        sub2: string_field_nonempty(raw, &["sub2", "Sub_2"]),
        sub3: string_field_nonempty(raw, &["sub3", "Sub_3"]),
        sub4: string_field_nonempty(raw, &["sub4", "Sub_4"]),
        sub5: string_field_nonempty(raw, &["sub5", "Sub_5"]),
        item_description: string_field(raw, &["item_description", "item"]).unwrap_or_default(),
        note: string_field_nonempty(raw, &["note", "Note"]),
        count: count_value,
        cost_piece: cost_value,
        cost_total,
        image_data: string_field_nonempty(raw, &["image_data", "imageData"]),
    }
}

fn category_row(raw: &Value) -> CategoryRow {
    CategoryRow {
        category: string_field(raw, &["category", "Category"]).unwrap_or_default(),
        sub1: string_field(raw, &["sub1", "Sub_1"]).unwrap_or_default(),
        sub2: string_field(raw, &["sub2", "Sub_2"]).unwrap_or_default(),
        sub3: string_field(raw, &["sub3", "Sub_3"]).unwrap_or_default(),
        sub4: string_field(raw, &["sub4", "Sub_4"]).unwrap_or_default(),
        sub5: string_field(raw, &["sub5", "Sub_5"]).unwrap_or_default(),
    }
}

fn array<'a>(raw: &'a Value, keys: &[&str]) -> &'a [Value] {
    for key in keys {
        if let Some(Value::Array(items)) = raw.get(key) {
            return items;
        }
    }
    &[]
}

/// Normalize a full ledger response into a [`Snapshot`].
///
/// Unparseable sections degrade to empty rather than failing the
/// whole snapshot; a ledger that answers at all beats no data.
pub fn snapshot(raw: &Value) -> Snapshot {
    let vouchers = array(raw, &["vouchers", "records"])
        .iter()
        .map(record)
        .collect();

    let category_tree = array(raw, &["categoryList", "tree"])
        .iter()
        .map(category_row)
        .collect();

    let prefixes = raw
        .get("prefixes")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|p| (k.clone(), p.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let last_serials = ["lastSerials", "last_serials"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_object))
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| {
                    let serial = match v {
                        Value::Number(n) => n.as_u64(),
                        Value::String(s) => s.trim().parse::<u64>().ok(),
                        _ => None,
                    }?;
                    Some((k.clone(), serial as u32))
                })
                .collect()
        })
        .unwrap_or_default();

    Snapshot {
        vouchers,
        category_tree,
        prefixes,
        last_serials,
        suppliers: string_list(raw, &["suppliers"]),
        recent_items: string_list(raw, &["recentItems", "recent_items"]),
        users: string_list(raw, &["users"]),
        accounts: string_list(raw, &["accounts"]),
    }
}
