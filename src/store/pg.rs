use std::time::SystemTime;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use tracing::warn;

use crate::error::{ResonanceError, Result};
use crate::types::{Fingerprint, Recording, RecordingMetadata, Stats};

use super::models::{FingerprintRow, NewQueryRow, NewRecordingRow, RecordingRow};
use super::schema::{fingerprints, queries, recordings};
use super::{FingerprintStore, Posting, QueryRecord, BATCH_INSERT_SIZE, BATCH_LOOKUP_SIZE};

/// Postgres-backed store, grounded on the teacher's `db::connector::DB` but
/// generalized from a single `PgConnection` to a pooled
/// `Pool<ConnectionManager<PgConnection>>` (diesel's own `r2d2` feature, not
/// a new dependency) — required to actually satisfy §5's "allow concurrent
/// reads and concurrent writes for disjoint recordings", which one shared
/// connection cannot.
pub struct PgStore {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl PgStore {
    pub fn connect(database_url: &str) -> Result<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .build(manager)
            .map_err(|e| ResonanceError::StoreUnavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<diesel::r2d2::PooledConnection<ConnectionManager<PgConnection>>> {
        self.pool
            .get()
            .map_err(|e| ResonanceError::StoreUnavailable(e.to_string()))
    }
}

impl FingerprintStore for PgStore {
    fn ingest(&self, recording: &Recording, fingerprints_in: &[Fingerprint]) -> Result<()> {
        let mut conn = self.conn()?;
        let rows: Vec<FingerprintRow> = fingerprints_in.iter().map(FingerprintRow::from_core).collect();

        // spec.md §4.4: write in chunks <= BATCH_INSERT_SIZE, never holding
        // the whole fingerprint list in one transaction — one transaction
        // per chunk, not one around the whole loop. Cross-chunk atomicity
        // for the recording as a whole is `ingest.rs`'s job: a failure
        // partway through leaves some chunks committed, and the caller's
        // rollback (`FingerprintStore::delete`) removes them along with the
        // rest of the recording (DESIGN.md).
        for chunk in rows.chunks(BATCH_INSERT_SIZE) {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::insert_into(fingerprints::table)
                    .values(chunk)
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                Ok(())
            })?;
        }

        let _ = recording; // recording row is created separately via create_recording
        Ok(())
    }

    fn lookup(&self, hashes: &[u32]) -> Result<Vec<Posting>> {
        use fingerprints::dsl;

        let mut conn = self.conn()?;
        let mut results = Vec::new();

        for chunk in hashes.chunks(BATCH_LOOKUP_SIZE) {
            let wide: Vec<i64> = chunk.iter().map(|&h| h as i64).collect();
            let rows: Vec<(i32, i64, f64)> = dsl::fingerprints
                .filter(dsl::hash.eq_any(&wide))
                .select((dsl::recording_id, dsl::hash, dsl::time_offset))
                .load(&mut conn)?;

            results.extend(rows.into_iter().map(|(recording_id, hash, time_offset)| Posting {
                recording_id,
                stored_time_offset: time_offset,
                hash: hash as u32,
            }));
        }

        Ok(results)
    }

    fn create_recording(&self, metadata: &RecordingMetadata) -> Result<Recording> {
        let mut conn = self.conn()?;
        let new_row = NewRecordingRow {
            title: metadata.title.clone(),
            artist: metadata.artist.clone(),
            album: metadata.album.clone(),
            duration_secs: metadata.duration_secs,
            source_ref: metadata.source_ref.clone(),
            created_at: SystemTime::now(),
        };

        let row: RecordingRow = diesel::insert_into(recordings::table)
            .values(&new_row)
            .get_result(&mut conn)?;

        Ok(row.into())
    }

    fn delete(&self, recording_id: i32) -> Result<()> {
        use recordings::dsl as rdsl;
        use fingerprints::dsl as fdsl;

        let mut conn = self.conn()?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(fdsl::fingerprints.filter(fdsl::recording_id.eq(recording_id))).execute(conn)?;
            diesel::delete(rdsl::recordings.filter(rdsl::id.eq(recording_id))).execute(conn)?;
            Ok(())
        })?;
        Ok(())
    }

    fn get_recording(&self, recording_id: i32) -> Result<Option<Recording>> {
        use recordings::dsl;
        let mut conn = self.conn()?;
        let row: Option<RecordingRow> = dsl::recordings
            .find(recording_id)
            .select(RecordingRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn record_query(&self, record: &QueryRecord) -> Result<()> {
        let mut conn = self.conn()?;
        let new_row = NewQueryRow {
            audio_duration: record.audio_duration,
            identified_recording_id: record.identified_recording_id,
            confidence: record.confidence,
            processing_time_ms: record.processing_time_ms as i64,
            created_at: SystemTime::now(),
        };
        if let Err(e) = diesel::insert_into(queries::table).values(&new_row).execute(&mut conn) {
            // §7: analytics writes never fail the caller's operation.
            warn!(error = %e, "failed to record query analytics row");
        }
        Ok(())
    }

    fn stats(&self) -> Result<Stats> {
        use diesel::dsl::sum;

        let mut conn = self.conn()?;
        let recording_count: i64 = recordings::table.count().get_result(&mut conn)?;
        let fingerprint_count: i64 = fingerprints::table.count().get_result(&mut conn)?;
        let query_count: i64 = queries::table.count().get_result(&mut conn)?;
        let successful_query_count: i64 = queries::dsl::queries
            .filter(queries::dsl::identified_recording_id.is_not_null())
            .count()
            .get_result(&mut conn)?;
        // Average computed from count + sum rather than SQL avg() — avg()
        // over an Int8 column maps to Numeric on the Rust side, which would
        // pull in a bigdecimal dependency the rest of the crate has no
        // other use for.
        let total_processing_time_ms: Option<i64> = queries::table
            .select(sum(queries::dsl::processing_time_ms))
            .first(&mut conn)?;
        let average_processing_time_ms = match total_processing_time_ms {
            Some(total) if query_count > 0 => total as f64 / query_count as f64,
            _ => 0.0,
        };

        Ok(Stats {
            recording_count,
            fingerprint_count,
            query_count,
            successful_query_count,
            average_processing_time_ms,
        })
    }
}
