//! voucherd API - HTTP Caching Proxy for the Voucher Ledger
//!
//! Sits between the browser dashboard and the slow remote ledger
//! service. Reads are served from the stale-while-revalidate snapshot
//! cache; writes go straight to the ledger and invalidate the cache
//! before their result is returned, so the next read reflects the
//! mutation. A successful append also fires a detached Telegram
//! notification.

pub mod config;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod routes;
pub mod state;

pub use config::{AppConfig, TelegramConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use ledger::{LedgerClient, LedgerWriter};
pub use notify::Notifier;
pub use routes::create_api_router;
pub use state::AppState;
