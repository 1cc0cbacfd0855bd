//! Record normalizer: heterogeneous JSON-lines objects to canonical records.
//!
//! Each canonical field is taken from the first alias key present in the
//! object, in the order declared by [`AliasTable`]. Keys holding `null` are
//! treated as absent. Non-string values are rendered as JSON text.

use serde_json::{Map, Value};

use crate::config::AliasTable;
use crate::data::{CanonicalRecord, RecordId};
use crate::errors::LabelerError;
use crate::types::AliasKey;

/// Stateless normalizer bound to one alias table.
#[derive(Clone, Debug, Default)]
pub struct RecordNormalizer {
    aliases: AliasTable,
}

impl RecordNormalizer {
    /// Create a normalizer using `aliases`.
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    /// Alias table in use.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Decode one raw line and normalize it.
    ///
    /// `ordinal` is the zero-based line position, used as the id when the
    /// object carries none. Lines that are not JSON objects yield
    /// `LabelerError::LineParse`; callers skip them and continue.
    pub fn normalize_line(
        &self,
        line: &str,
        ordinal: usize,
    ) -> Result<CanonicalRecord, LabelerError> {
        let value: Value =
            serde_json::from_str(line.trim()).map_err(|err| LabelerError::LineParse {
                line: ordinal,
                reason: err.to_string(),
            })?;
        let object = value.as_object().ok_or_else(|| LabelerError::LineParse {
            line: ordinal,
            reason: format!("expected a JSON object, found {}", json_kind(&value)),
        })?;
        Ok(self.normalize_object(object, ordinal))
    }

    /// Normalize an already-decoded object.
    pub fn normalize_object(&self, object: &Map<String, Value>, ordinal: usize) -> CanonicalRecord {
        let id = first_present(object, &self.aliases.id)
            .map(RecordId::Supplied)
            .unwrap_or(RecordId::Ordinal(ordinal));
        CanonicalRecord {
            id,
            video_ref: first_present(object, &self.aliases.video),
            prompt: first_present(object, &self.aliases.prompt),
            answer: first_present(object, &self.aliases.answer),
        }
    }
}

/// Text of the first alias key present in `object`.
pub fn first_present(object: &Map<String, Value>, keys: &[AliasKey]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(key))
        .find_map(value_to_text)
}

/// Render a JSON value as text; `null` is treated as absent.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn picks_first_alias_in_declared_order() {
        let normalizer = RecordNormalizer::default();
        let record = normalizer.normalize_object(
            &object(json!({
                "idx": 9,
                "path": "x/late.mp4",
                "video_path": "x/early.mp4",
                "question": "q",
                "instruction": "i",
                "text": "t",
                "caption": "c",
                "anwser": "misspelled",
            })),
            0,
        );
        assert_eq!(record.id, RecordId::Supplied("9".into()));
        assert_eq!(record.video_ref.as_deref(), Some("x/early.mp4"));
        assert_eq!(record.prompt.as_deref(), Some("i"));
        assert_eq!(record.answer.as_deref(), Some("misspelled"));
    }

    #[test]
    fn id_prefers_id_over_idx() {
        let normalizer = RecordNormalizer::default();
        let record = normalizer.normalize_object(&object(json!({"id": "a", "idx": 3})), 5);
        assert_eq!(record.id, RecordId::Supplied("a".into()));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let normalizer = RecordNormalizer::default();
        let record = normalizer.normalize_object(&object(json!({"unrelated": 1})), 4);
        assert_eq!(record.id, RecordId::Ordinal(4));
        assert_eq!(record.video_ref, None);
        assert_eq!(record.prompt, None);
        assert_eq!(record.answer, None);
    }

    #[test]
    fn null_values_defer_to_next_alias() {
        let normalizer = RecordNormalizer::default();
        let record = normalizer
            .normalize_object(&object(json!({"answer": null, "caption": "fallback"})), 0);
        assert_eq!(record.answer.as_deref(), Some("fallback"));
    }

    #[test]
    fn non_string_answers_are_serialized() {
        let normalizer = RecordNormalizer::default();
        let record = normalizer.normalize_object(
            &object(json!({"response": {"label": "fight", "conf": 0.9}})),
            0,
        );
        assert_eq!(
            record.answer.as_deref(),
            Some(r#"{"conf":0.9,"label":"fight"}"#)
        );

        let listed = normalizer.normalize_object(&object(json!({"answer": [1, 2]})), 1);
        assert_eq!(listed.answer.as_deref(), Some("[1,2]"));
    }

    #[test]
    fn normalize_line_rejects_invalid_json_and_non_objects() {
        let normalizer = RecordNormalizer::default();
        let err = normalizer.normalize_line("{not json", 2).unwrap_err();
        assert!(matches!(err, LabelerError::LineParse { line: 2, .. }));

        let err = normalizer.normalize_line("[1, 2, 3]", 3).unwrap_err();
        match err {
            LabelerError::LineParse { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("an array"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_aliases_extend_lookup() {
        let normalizer = RecordNormalizer::new(
            AliasTable::default()
                .with_answer_alias("output")
                .with_video_alias("clip"),
        );
        let record = normalizer
            .normalize_line(r#"{"output": "o", "clip": "c.mp4"}"#, 0)
            .unwrap();
        assert_eq!(record.answer.as_deref(), Some("o"));
        assert_eq!(record.video_ref.as_deref(), Some("c.mp4"));
    }
}
