//! Canonical voucher and snapshot shapes.
//!
//! These are the shapes the rest of the workspace operates on. Ledger
//! JSON never enters the process without passing through
//! [`crate::normalize`] first, so drifting field spellings stay
//! confined to that boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed prefix for income vouchers.
pub const INCOME_PREFIX: &str = "INC";

/// Generic expense prefix used when a category has no mapping.
pub const FALLBACK_EXPENSE_PREFIX: &str = "EXP";

/// Direction of a voucher, spelled the way the ledger spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoucherKind {
    #[serde(rename = "Cash In")]
    CashIn,
    #[serde(rename = "Cash Out")]
    CashOut,
}

impl VoucherKind {
    /// The ledger's wire spelling, also used in display contexts.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherKind::CashIn => "Cash In",
            VoucherKind::CashOut => "Cash Out",
        }
    }
}

impl Default for VoucherKind {
    fn default() -> Self {
        Self::CashOut
    }
}

/// One ledger line in canonical form.
///
/// Invariant: `cost_total == round(count * cost_piece)`. The
/// normalization boundary re-derives the total whenever the incoming
/// value is absent or fails the invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "voucherno", default)]
    pub voucher_no: String,
    #[serde(default)]
    pub entered_by: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(rename = "type", default)]
    pub kind: VoucherKind,
    #[serde(default)]
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub5: Option<String>,
    #[serde(default)]
    pub item_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub count: f64,
    #[serde(default)]
    pub cost_piece: i64,
    #[serde(default)]
    pub cost_total: i64,
    /// Optional embedded proof image as a data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

impl VoucherRecord {
    /// The total this record should carry per the count/cost invariant.
    pub fn computed_total(&self) -> i64 {
        (self.count * self.cost_piece as f64).round() as i64
    }

    /// Whether the stored total satisfies the invariant.
    pub fn total_consistent(&self) -> bool {
        self.cost_total == self.computed_total()
    }
}

impl Default for VoucherRecord {
    fn default() -> Self {
        Self {
            date: None,
            voucher_no: String::new(),
            entered_by: String::new(),
            account: String::new(),
            vendor: String::new(),
            kind: VoucherKind::default(),
            category: String::new(),
            sub1: None,
            sub2: None,
            sub3: None,
            sub4: None,
            sub5: None,
            item_description: String::new(),
            note: None,
            count: 0.0,
            cost_piece: 0,
            cost_total: 0,
            image_data: None,
        }
    }
}

/// One row of the category taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRow {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub1: String,
    #[serde(default)]
    pub sub2: String,
    #[serde(default)]
    pub sub3: String,
    #[serde(default)]
    pub sub4: String,
    #[serde(default)]
    pub sub5: String,
}

/// The full decoded ledger response at one point in time.
///
/// Immutable once constructed; a new snapshot wholly replaces the old
/// one. `Snapshot::default()` is the empty snapshot used for degraded
/// responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub vouchers: Vec<VoucherRecord>,
    #[serde(rename = "categoryList", alias = "tree", default)]
    pub category_tree: Vec<CategoryRow>,
    /// Per-category identifier prefixes for Cash Out vouchers.
    #[serde(default)]
    pub prefixes: HashMap<String, String>,
    /// Highest serial number already persisted, keyed by prefix.
    #[serde(rename = "lastSerials", default)]
    pub last_serials: HashMap<String, u32>,
    #[serde(default)]
    pub suppliers: Vec<String>,
    #[serde(rename = "recentItems", default)]
    pub recent_items: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub accounts: Vec<String>,
}

impl Snapshot {
    /// Prefix for a new voucher of the given kind and category.
    ///
    /// Unmapped or empty Cash Out categories fall back to the generic
    /// expense prefix; this never fails.
    pub fn prefix_for(&self, kind: VoucherKind, category: &str) -> &str {
        match kind {
            VoucherKind::CashIn => INCOME_PREFIX,
            VoucherKind::CashOut => self
                .prefixes
                .get(category)
                .map(String::as_str)
                .filter(|p| !p.is_empty())
                .unwrap_or(FALLBACK_EXPENSE_PREFIX),
        }
    }

    /// Highest persisted serial for a prefix, 0 if unseen.
    pub fn last_serial(&self, prefix: &str) -> u32 {
        self.last_serials.get(prefix).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_spelling() {
        let json = serde_json::to_string(&VoucherKind::CashIn).unwrap();
        assert_eq!(json, "\"Cash In\"");

        let kind: VoucherKind = serde_json::from_str("\"Cash Out\"").unwrap();
        assert_eq!(kind, VoucherKind::CashOut);
    }

    #[test]
    fn test_computed_total_rounds() {
        let record = VoucherRecord {
            count: 2.5,
            cost_piece: 333,
            cost_total: 833,
            ..Default::default()
        };
        assert_eq!(record.computed_total(), 833);
        assert!(record.total_consistent());
    }

    #[test]
    fn test_prefix_fallbacks() {
        let mut snapshot = Snapshot::default();
        snapshot
            .prefixes
            .insert("FUEL".to_string(), "EXP".to_string());
        snapshot.prefixes.insert("RENT".to_string(), String::new());

        assert_eq!(snapshot.prefix_for(VoucherKind::CashIn, "FUEL"), "INC");
        assert_eq!(snapshot.prefix_for(VoucherKind::CashOut, "FUEL"), "EXP");
        // Unmapped and empty mappings both fall back.
        assert_eq!(
            snapshot.prefix_for(VoucherKind::CashOut, "UNKNOWN"),
            FALLBACK_EXPENSE_PREFIX
        );
        assert_eq!(
            snapshot.prefix_for(VoucherKind::CashOut, "RENT"),
            FALLBACK_EXPENSE_PREFIX
        );
    }

    #[test]
    fn test_snapshot_decodes_tree_alias() {
        let raw = serde_json::json!({
            "vouchers": [],
            "tree": [{ "category": "FUEL" }],
            "lastSerials": { "EXP": 7 }
        });
        let snapshot: Snapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(snapshot.category_tree.len(), 1);
        assert_eq!(snapshot.last_serial("EXP"), 7);
        assert_eq!(snapshot.last_serial("INC"), 0);
    }
}
