//! Store key layout.
//!
//! | Key | Value |
//! |---|---|
//! | `TGC-<ticket>` | subject identifier |
//! | `ST-<ticket>` | subject identifier |
//! | `u-<subjectId>` | subject identifier |

pub const TGC_PREFIX: &str = "TGC-";
pub const ST_PREFIX: &str = "ST-";
pub const SESSION_PREFIX: &str = "u-";

pub fn tgc_key(tgc: &str) -> String {
    format!("{TGC_PREFIX}{tgc}")
}

pub fn st_key(st: &str) -> String {
    format!("{ST_PREFIX}{st}")
}

pub fn session_key(subject_id: &str) -> String {
    format!("{SESSION_PREFIX}{subject_id}")
}
