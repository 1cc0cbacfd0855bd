use crate::constants::session::{MAX_SCORE, MIN_SCORE};
use crate::data::CanonicalRecord;
use crate::scores::ScoreTable;

/// Rater progress over a loaded source.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionProgress {
    /// Records in the source.
    pub total: usize,
    /// Records this rater has scored.
    pub scored: usize,
    /// Records still unscored by this rater.
    pub remaining: usize,
    /// Mean of this rater's scores over loaded records; `None` before any score.
    pub mean_score: Option<f64>,
    /// Count per score value, index 0 holding score 1.
    pub histogram: [usize; (MAX_SCORE - MIN_SCORE + 1) as usize],
}

impl SessionProgress {
    /// Fraction of records scored, 0.0 for an empty source.
    pub fn completion(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.scored as f64 / self.total as f64
        }
    }
}

/// Progress of `rater` over `records`.
///
/// Entries for ids outside `records` (e.g. restored from another export) are
/// not counted.
pub fn session_progress(
    records: &[CanonicalRecord],
    scores: &ScoreTable,
    rater: &str,
) -> SessionProgress {
    let mut histogram = [0usize; (MAX_SCORE - MIN_SCORE + 1) as usize];
    let mut scored = 0usize;
    let mut sum = 0u64;
    for record in records {
        if let Some(entry) = scores.get(&record.id, rater) {
            let value = entry.score.get();
            histogram[(value - MIN_SCORE) as usize] += 1;
            scored += 1;
            sum += value as u64;
        }
    }
    SessionProgress {
        total: records.len(),
        scored,
        remaining: records.len() - scored,
        mean_score: (scored > 0).then(|| sum as f64 / scored as f64),
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MosScore, RecordId};

    fn record(idx: usize) -> CanonicalRecord {
        CanonicalRecord {
            id: RecordId::Ordinal(idx),
            video_ref: None,
            prompt: None,
            answer: None,
        }
    }

    #[test]
    fn counts_only_current_rater_and_loaded_records() {
        let records: Vec<_> = (0..4).map(record).collect();
        let mut scores = ScoreTable::new();
        let s = |v| MosScore::new(v).unwrap();
        scores.upsert(RecordId::Ordinal(0), "me", s(5), String::new());
        scores.upsert(RecordId::Ordinal(1), "me", s(2), String::new());
        scores.upsert(RecordId::Ordinal(2), "other", s(1), String::new());
        scores.upsert(RecordId::Ordinal(99), "me", s(1), String::new());

        let progress = session_progress(&records, &scores, "me");
        assert_eq!(progress.total, 4);
        assert_eq!(progress.scored, 2);
        assert_eq!(progress.remaining, 2);
        assert_eq!(progress.mean_score, Some(3.5));
        assert_eq!(progress.histogram, [0, 1, 0, 0, 1]);
        assert_eq!(progress.completion(), 0.5);
    }

    #[test]
    fn empty_inputs_have_no_mean() {
        let progress = session_progress(&[], &ScoreTable::new(), "me");
        assert_eq!(progress.mean_score, None);
        assert_eq!(progress.completion(), 0.0);
    }
}
