//! Shared helpers and constants.

use chrono::Utc;

pub const APP_NAME: &str = "pulse_engine";

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Mints a post id whose lexicographic order tracks creation time, so the
/// id keeps working as the recency proxy the recent sort relies on.
pub fn mint_post_id() -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}
