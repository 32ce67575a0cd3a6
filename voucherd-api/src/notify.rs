//! Transaction alerts via Telegram.
//!
//! Alerts are fire-and-forget: a failed or slow Telegram call must
//! never delay or fail the write that triggered it, so delivery runs
//! on a spawned task and failures are only logged.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};
use voucherd_core::VoucherRecord;

use crate::config::TelegramConfig;

#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl Notifier {
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    /// Render the alert text for an accepted voucher.
    pub fn message_for(record: &VoucherRecord) -> String {
        let date = record
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "New Transaction\nVoucher: {}\nDate: {}\nBy: {}\nAccount: {}\nType: {}\nItem: {}\nAmount: {} MMK",
            record.voucher_no,
            date,
            record.entered_by,
            record.account,
            record.kind.as_str(),
            record.item_description,
            thousands(record.cost_total),
        )
    }

    /// Deliver an alert for `record` in the background.
    pub fn spawn_transaction_alert(&self, record: &VoucherRecord) {
        let notifier = self.clone();
        let text = Self::message_for(record);
        let voucher_no = record.voucher_no.clone();

        tokio::spawn(async move {
            if let Err(e) = notifier.send_message(&text).await {
                warn!(voucher_no = %voucher_no, error = %e, "transaction alert not delivered");
            } else {
                debug!(voucher_no = %voucher_no, "transaction alert delivered");
            }
        });
    }

    async fn send_message(&self, text: &str) -> Result<(), reqwest::Error> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base, self.config.bot_token
        );

        self.client
            .post(&url)
            .json(&json!({
                "chat_id": self.config.chat_id,
                "text": text,
            }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Group digits in threes, keeping a leading sign.
fn thousands(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}
