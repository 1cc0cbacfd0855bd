/// Display name of a loaded JSON-lines source (usually its file name).
/// Examples: `cococaption_mos.jsonl`, `upload.jsonl`
pub type SourceName = String;
/// Rater display name scoping the score table.
/// Examples: `jykim`, `anonymous`
pub type RaterName = String;
/// Final path component of a video reference.
/// Examples: `a.mp4`, `a__cv2.mp4`
pub type VideoFileName = String;
/// Google Drive file identifier used by the URL templates.
/// Example: `1AbCdEfGhIjKlMnOp`
pub type DriveFileId = String;
/// Key name probed in a JSON object during alias selection.
/// Examples: `video_path`, `anwser`
pub type AliasKey = String;
/// Warning/log message text.
/// Examples: `line 4 skipped: expected value at line 1 column 1`
pub type LogMessage = String;
