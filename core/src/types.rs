//! Shared primitive types used across the entire generator.

use chrono::NaiveDateTime;

/// A stable, unique identifier for any generated entity.
pub type EntityId = String;

/// Event timestamps carry no timezone; every run lives in one calendar.
pub type Timestamp = NaiveDateTime;

/// Format used for timestamps in SQLite columns.
pub const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Compact format used inside entity tags (`ap_AP00000001_20240104000000`).
pub const TAG_DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";
