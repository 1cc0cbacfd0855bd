use std::collections::HashSet;
use std::fs;

use tempfile::tempdir;

use mos_labeler::{
    JsonlLoader, LabelerConfig, LabelerError, LabelingSession, MappingEntry, MappingTable,
    RecordId, ScoreTable,
};

fn session_over(lines: &str) -> LabelingSession {
    let source = JsonlLoader::default().load_str("cococaption.jsonl", lines);
    LabelingSession::open(source, &LabelerConfig::default()).unwrap()
}

const RECORDS: &str = "{\"id\": 1, \"video\": \"a.mp4\", \"prompt\": \"What happens?\", \"answer\": \"A fight.\"}\n\
                       {\"id\": 2, \"video\": \"b.mp4\", \"prompt\": \"What happens?\", \"answer\": \"A crash.\"}\n\
                       {\"id\": 3, \"video\": \"c.mp4\", \"prompt\": \"What happens?\", \"answer\": \"Nothing.\"}\n";

#[test]
fn rewriting_a_pair_keeps_one_entry_with_latest_value() {
    let mut session = session_over(RECORDS);
    session.set_rater("jykim");
    session.score_current(2).unwrap();
    session.score_current(4).unwrap();

    let entries: Vec<_> = session.scores().entries().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].record_id, RecordId::Supplied("1".into()));
    assert_eq!(entries[0].rater, "jykim");
    assert_eq!(entries[0].score.get(), 4);
}

#[test]
fn export_has_one_row_per_distinct_pair() {
    let temp = tempdir().unwrap();
    let mut session = session_over(RECORDS);
    session.set_rater("jykim");

    let edits = [(0usize, 1i64), (1, 2), (0, 5), (2, 3), (1, 4), (0, 2)];
    for (index, value) in edits {
        session.goto(index);
        session.score_current(value).unwrap();
    }
    let path = session.export_to_dir(temp.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "cococaption_jykim.csv");

    let rows = ScoreTable::read_rows(fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(rows.len(), 3);
    let ids: HashSet<String> = rows.iter().map(|row| row.id.clone()).collect();
    assert_eq!(ids.len(), rows.len());
    let first = rows.iter().find(|row| row.id == "1").unwrap();
    assert_eq!(first.score.get(), 2);
    assert_eq!(first.video, "a.mp4");

    session.set_rater("second");
    session.goto(0);
    session.score_current(5).unwrap();
    let second_path = session.export_to_dir(temp.path()).unwrap();
    assert_eq!(second_path.file_name().unwrap(), "cococaption_second.csv");
    let second_rows = ScoreTable::read_rows(fs::File::open(&second_path).unwrap()).unwrap();
    assert_eq!(second_rows.len(), 1);
    assert_eq!(second_rows[0].rater.as_deref(), Some("second"));
    assert_eq!(
        ScoreTable::read_rows(fs::File::open(&path).unwrap())
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn exported_table_resumes_into_new_session() {
    let temp = tempdir().unwrap();
    let mut session = session_over(RECORDS);
    session.set_rater("jykim");
    session.goto(2);
    session.score_current(1).unwrap();
    let path = session.export_to_dir(temp.path()).unwrap();

    let mut resumed = session_over(RECORDS);
    resumed.set_rater("jykim");
    let restored = resumed
        .resume_from(fs::File::open(&path).unwrap())
        .unwrap();
    assert_eq!(restored, 1);
    resumed.goto(2);
    let view = resumed.view();
    assert!(view.scored);
    assert_eq!(view.score.get(), 1);
    assert_eq!(resumed.progress().scored, 1);
}

#[test]
fn view_combines_record_resolution_and_score() {
    let mut session = session_over(RECORDS).with_mapping(MappingTable::from_entries([
        MappingEntry::named("b.mp4").with_file_id("DRIVE"),
    ]));
    session.next_item();
    let view = session.view();
    assert_eq!(view.position, 2);
    assert_eq!(view.total, 3);
    assert_eq!(view.record.answer.as_deref(), Some("A crash."));
    assert_eq!(
        view.resolution.playable().as_deref(),
        Some("https://drive.google.com/file/d/DRIVE/preview")
    );
    assert_eq!(view.score.get(), 3);
    assert!(!view.scored);
}

#[test]
fn invalid_scores_leave_table_untouched() {
    let mut session = session_over(RECORDS);
    for value in [0, 6, -1] {
        assert!(matches!(
            session.score_current(value),
            Err(LabelerError::ScoreOutOfRange(v)) if v == value
        ));
    }
    assert!(session.scores().is_empty());
}

#[test]
fn ordinal_ids_survive_export_and_resume() {
    let lines = "{\"video\": \"x.mp4\"}\n{\"video\": \"y.mp4\"}\n";
    let mut session = session_over(lines);
    session.goto(1);
    session.score_current(5).unwrap();
    let mut buffer = Vec::new();
    session.export_csv(&mut buffer).unwrap();

    let mut resumed = session_over(lines);
    assert_eq!(resumed.resume_from(buffer.as_slice()).unwrap(), 1);
    resumed.goto(1);
    assert_eq!(resumed.current_score().get(), 5);
    assert_eq!(resumed.current().id, RecordId::Ordinal(1));
}
