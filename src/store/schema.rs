// Hand-extended from the teacher's Diesel-CLI-generated schema, which only
// carried `songs`/`fingerprint`. §6 names three tables; this mirrors that
// layout exactly. `fingerprints`' `(recording_id, time_offset, hash)`
// primary key (see migrations/2024-01-01-000000_create_schema/up.sql)
// doubles as the composite `(recording_id, time_offset)` index §4.4
// requires, since those are its leading columns; `hash` trails it there,
// so the migration also carries a standalone index on `hash` alone —
// without it `lookup`'s `hash.eq_any(...)` filter has nothing to seek on.

diesel::table! {
    recordings (id) {
        id -> Int4,
        #[max_length = 512]
        title -> Varchar,
        #[max_length = 512]
        artist -> Varchar,
        #[max_length = 512]
        album -> Nullable<Varchar>,
        duration_secs -> Nullable<Float8>,
        #[max_length = 1024]
        source_ref -> Varchar,
        created_at -> Timestamp,
    }
}

diesel::table! {
    fingerprints (recording_id, time_offset, hash) {
        recording_id -> Int4,
        hash -> Int8,
        time_offset -> Float8,
    }
}

diesel::table! {
    queries (id) {
        id -> Int4,
        audio_duration -> Nullable<Float8>,
        identified_recording_id -> Nullable<Int4>,
        confidence -> Nullable<Float8>,
        processing_time_ms -> Int8,
        created_at -> Timestamp,
    }
}

diesel::joinable!(fingerprints -> recordings (recording_id));

diesel::allow_tables_to_appear_in_same_query!(recordings, fingerprints, queries,);
