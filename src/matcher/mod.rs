//! §4.5: the temporal-alignment search. Consumes query fingerprints,
//! queries the store, builds per-candidate delta histograms, and returns
//! the winning recording id with a confidence score.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::store::FingerprintStore;
use crate::types::Fingerprint;

/// §4.5 fixed constants.
pub const MIN_MATCHES: usize = 5;
pub const CONF_MIN: f64 = 0.1;
pub const TOL: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub recording_id: i32,
    pub confidence: f64,
    pub aligned_matches: usize,
    pub query_fingerprint_count: usize,
}

/// §4.5 steps 1-2: probe the store and expand every returned posting
/// against every query occurrence of its hash, preserving the multimap
/// semantics spec.md requires ("every stored collision pairs with every
/// query occurrence of that hash").
fn collect_deltas(
    store: &dyn FingerprintStore,
    query: &[Fingerprint],
) -> Result<HashMap<i32, Vec<f64>>> {
    let mut query_times_by_hash: HashMap<u32, Vec<f64>> = HashMap::new();
    for fp in query {
        query_times_by_hash.entry(fp.hash).or_default().push(fp.time_offset);
    }

    let distinct_hashes: Vec<u32> = query_times_by_hash.keys().copied().collect();
    let postings = store.lookup(&distinct_hashes)?;

    let mut deltas_by_recording: HashMap<i32, Vec<f64>> = HashMap::new();
    for posting in postings {
        if let Some(query_times) = query_times_by_hash.get(&posting.hash) {
            for &query_time in query_times {
                let delta = posting.stored_time_offset - query_time;
                deltas_by_recording.entry(posting.recording_id).or_default().push(delta);
            }
        }
    }

    Ok(deltas_by_recording)
}

/// §4.5 step 4: histogram vote within one candidate group. Returns
/// `(aligned, total, mode_bin)`.
fn histogram_vote(deltas: &[f64]) -> (usize, usize, f64) {
    let mut bins: HashMap<i64, usize> = HashMap::new();
    for &delta in deltas {
        let bin_index = (delta / TOL).round() as i64;
        *bins.entry(bin_index).or_default() += 1;
    }

    let (&mode_bin_index, &aligned) = bins
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .expect("deltas is non-empty when called");

    (aligned, deltas.len(), mode_bin_index as f64 * TOL)
}

/// One candidate recording's score, step 5's `combined = confidence *
/// (aligned / |Q|)` included alongside its inputs so callers (and tests)
/// can inspect the ranking signal directly, not just the winner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub recording_id: i32,
    pub confidence: f64,
    pub aligned_matches: usize,
    pub combined: f64,
}

/// §4.5 steps 1-4: every candidate recording that clears `MIN_MATCHES`
/// and `CONF_MIN`, scored but not yet ranked against each other.
fn evaluate_candidates(store: &dyn FingerprintStore, query: &[Fingerprint]) -> Result<Vec<CandidateScore>> {
    let query_count = query.len();
    let deltas_by_recording = collect_deltas(store, query)?;

    let mut scored = Vec::new();
    for (recording_id, deltas) in deltas_by_recording {
        if deltas.len() < MIN_MATCHES {
            continue;
        }

        let (aligned, total, _mode_bin) = histogram_vote(&deltas);
        let confidence = aligned as f64 / total as f64;

        if aligned < MIN_MATCHES || confidence < CONF_MIN {
            continue;
        }

        let combined = confidence * (aligned as f64 / query_count.max(1) as f64);

        debug!(recording_id, aligned, total, confidence, combined, "candidate evaluated");

        scored.push(CandidateScore {
            recording_id,
            confidence,
            aligned_matches: aligned,
            combined,
        });
    }

    Ok(scored)
}

/// §4.5 full procedure: run the histogram vote and pick the single best
/// match, or `None` ("no match" — not an error, per §7).
pub fn identify_best_match(
    store: &dyn FingerprintStore,
    query: &[Fingerprint],
) -> Result<Option<MatchOutcome>> {
    let query_count = query.len();
    let candidates = evaluate_candidates(store, query)?;

    let best = candidates.into_iter().fold(None, |best: Option<CandidateScore>, candidate| {
        let replace = match &best {
            None => true,
            Some(current) => {
                candidate.combined > current.combined
                    || (candidate.combined == current.combined && candidate.aligned_matches > current.aligned_matches)
                    || (candidate.combined == current.combined
                        && candidate.aligned_matches == current.aligned_matches
                        && candidate.recording_id < current.recording_id)
            }
        };
        if replace { Some(candidate) } else { best }
    });

    Ok(best.map(|c| MatchOutcome {
        recording_id: c.recording_id,
        confidence: c.confidence,
        aligned_matches: c.aligned_matches,
        query_fingerprint_count: query_count,
    }))
}

/// §8 scenario 5 ("crosstalk"): every scored candidate, ranked by
/// `combined` descending, for callers that need more than just the
/// winner — e.g. checking the margin between the true source and a
/// runner-up.
pub fn rank_candidates(store: &dyn FingerprintStore, query: &[Fingerprint]) -> Result<Vec<CandidateScore>> {
    let mut candidates = evaluate_candidates(store, query)?;
    candidates.sort_unstable_by(|a, b| {
        b.combined
            .partial_cmp(&a.combined)
            .unwrap()
            .then_with(|| b.aligned_matches.cmp(&a.aligned_matches))
            .then_with(|| a.recording_id.cmp(&b.recording_id))
    });
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{sample_metadata, FingerprintStore, InMemoryStore};

    fn fp(hash: u32, time_offset: f64) -> Fingerprint {
        Fingerprint { recording_id: 0, hash, time_offset }
    }

    #[test]
    fn no_candidates_clearing_min_matches_is_no_match() {
        let store = InMemoryStore::new();
        let recording = store.create_recording(&sample_metadata("x")).unwrap();
        let stored = vec![
            Fingerprint { recording_id: recording.id, hash: 1, time_offset: 10.0 },
            Fingerprint { recording_id: recording.id, hash: 2, time_offset: 11.0 },
        ];
        store.ingest(&recording, &stored).unwrap();

        let query = vec![fp(1, 0.0), fp(2, 1.0)];
        let result = identify_best_match(&store, &query).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn aligned_collisions_win_with_high_confidence() {
        let store = InMemoryStore::new();
        let recording = store.create_recording(&sample_metadata("y")).unwrap();

        // 6 stored hashes, all offset by a consistent +60s from the query
        // (the recording's position the clip was taken from).
        let stored: Vec<Fingerprint> = (0..6)
            .map(|i| Fingerprint {
                recording_id: recording.id,
                hash: i,
                time_offset: 60.0 + i as f64,
            })
            .collect();
        store.ingest(&recording, &stored).unwrap();

        let query: Vec<Fingerprint> = (0..6).map(|i| fp(i, i as f64)).collect();

        let result = identify_best_match(&store, &query).unwrap().unwrap();
        assert_eq!(result.recording_id, recording.id);
        assert!(result.confidence >= 0.9);
        assert_eq!(result.aligned_matches, 6);
    }

    #[test]
    fn crosstalk_prefers_the_true_source_by_a_wide_margin() {
        let store = InMemoryStore::new();
        let a = store.create_recording(&sample_metadata("A")).unwrap();
        let b = store.create_recording(&sample_metadata("B")).unwrap();

        // A: 10 consistent collisions at delta=60; B: 5 scattered collisions.
        let stored_a: Vec<Fingerprint> = (100..110)
            .map(|i| Fingerprint { recording_id: a.id, hash: i, time_offset: 60.0 + (i - 100) as f64 })
            .collect();
        store.ingest(&a, &stored_a).unwrap();

        let stored_b: Vec<Fingerprint> = (100..105)
            .map(|i| Fingerprint { recording_id: b.id, hash: i, time_offset: (i as f64) * 3.0 })
            .collect();
        store.ingest(&b, &stored_b).unwrap();

        let query: Vec<Fingerprint> = (100..110).map(|i| fp(i, (i - 100) as f64)).collect();

        let result = identify_best_match(&store, &query).unwrap().unwrap();
        assert_eq!(result.recording_id, a.id);

        let ranked = rank_candidates(&store, &query).unwrap();
        let score_a = ranked.iter().find(|c| c.recording_id == a.id).unwrap();
        let score_b = ranked.iter().find(|c| c.recording_id == b.id).unwrap();
        assert!(
            score_a.combined >= 2.0 * score_b.combined,
            "A's combined {} did not beat B's combined {} by at least 2x",
            score_a.combined,
            score_b.combined
        );
    }
}
