pub mod webhook;

pub use webhook::{Webhook, market_status, message};
