use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::error::AppError;

/// Canonical RFC3339 UTC string at second precision (e.g. `2026-02-10T03:00:00Z`).
pub fn format_rfc3339_utc(dt: OffsetDateTime) -> Result<String, AppError> {
    let utc = dt.to_offset(UtcOffset::UTC);
    let utc = utc.replace_nanosecond(0).map_err(|e| {
        AppError::io("TIME_FORMAT_FAILED", "Failed to truncate timestamp").with_details(e.to_string())
    })?;
    utc.format(&Rfc3339).map_err(|e| {
        AppError::io("TIME_FORMAT_FAILED", "Failed to format timestamp").with_details(e.to_string())
    })
}

pub fn now_rfc3339_utc() -> Result<String, AppError> {
    format_rfc3339_utc(OffsetDateTime::now_utc())
}

/// Reject timestamps in persisted artifacts that are not RFC3339.
pub fn check_rfc3339(field: &str, value: &str) -> Result<(), AppError> {
    OffsetDateTime::parse(value, &Rfc3339).map(|_| ()).map_err(|e| {
        AppError::integrity("ARTIFACT_TIMESTAMP_INVALID", format!("{field} is not RFC3339"))
            .with_details(format!("value={value}; err={e}"))
    })
}
