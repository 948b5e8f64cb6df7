use std::time::SystemTime;

use diesel::prelude::*;

use crate::types::{Fingerprint as CoreFingerprint, Recording as CoreRecording};

/// Diesel row type for `recordings`, mirroring the teacher's `Songs` but
/// widened to the full §3 attribute set (title, artist, album, duration,
/// source reference).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::store::schema::recordings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecordingRow {
    pub id: i32,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_secs: Option<f64>,
    pub source_ref: String,
    pub created_at: SystemTime,
}

impl From<RecordingRow> for CoreRecording {
    fn from(row: RecordingRow) -> Self {
        CoreRecording {
            id: row.id,
            title: row.title,
            artist: row.artist,
            album: row.album,
            duration_secs: row.duration_secs,
            source_ref: row.source_ref,
            created_at: row.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::store::schema::recordings)]
pub struct NewRecordingRow {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_secs: Option<f64>,
    pub source_ref: String,
    pub created_at: SystemTime,
}

/// Diesel row/insert type for `fingerprints`. `hash` is stored as `Int8`
/// (signed 64-bit) per §6's wire format — the high bits are always zero
/// since the value came from a `u32`, and readers must widen, never
/// truncate, when handing it back to the matcher.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::store::schema::fingerprints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FingerprintRow {
    pub recording_id: i32,
    pub hash: i64,
    pub time_offset: f64,
}

impl FingerprintRow {
    pub fn from_core(fp: &CoreFingerprint) -> Self {
        Self {
            recording_id: fp.recording_id,
            hash: fp.hash as i64,
            time_offset: fp.time_offset,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::store::schema::queries)]
pub struct NewQueryRow {
    pub audio_duration: Option<f64>,
    pub identified_recording_id: Option<i32>,
    pub confidence: Option<f64>,
    pub processing_time_ms: i64,
    pub created_at: SystemTime,
}
