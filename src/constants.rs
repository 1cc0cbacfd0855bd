//! Centralized constants for normalization, resolution, and scoring.

/// Constants used by the record normalizer alias tables.
pub mod aliases {
    /// Default id aliases, probed in order.
    pub const ID: &[&str] = &["id", "idx"];
    /// Default video reference aliases, probed in order.
    pub const VIDEO: &[&str] = &["video", "video_path", "path"];
    /// Default prompt aliases, probed in order.
    pub const PROMPT: &[&str] = &["prompt", "instruction", "question"];
    /// Default answer aliases, probed in order. `anwser` is a tolerated misspelling.
    pub const ANSWER: &[&str] = &["answer", "anwser", "caption", "response", "text"];
}

/// Constants used by the video resolver and mapping tables.
pub mod resolver {
    /// Marker inserted before the extension to name a converted asset.
    pub const CONVERTED_MARKER: &str = "__cv2";
    /// Mapping column holding the lookup key.
    pub const COLUMN_NAME: &str = "name";
    /// Mapping column holding a direct playable URL.
    pub const COLUMN_URL: &str = "url";
    /// Mapping column holding a Google Drive file id.
    pub const COLUMN_FILE_ID: &str = "file_id";
    /// Mapping column holding the asset type.
    pub const COLUMN_TYPE: &str = "type";
    /// Only rows with this type (or no type) are matched when a type column exists.
    pub const VIDEO_TYPE: &str = "video";
    /// Drive inline-preview URL prefix; `/preview` follows the file id.
    pub const DRIVE_FILE_PREFIX: &str = "https://drive.google.com/file/d/";
    /// Suffix for the inline-preview form.
    pub const DRIVE_PREVIEW_SUFFIX: &str = "/preview";
    /// Suffix for the open-in-new-tab form.
    pub const DRIVE_OPEN_SUFFIX: &str = "/view?usp=sharing";
    /// Forced-download URL prefix; the file id follows.
    pub const DRIVE_DOWNLOAD_PREFIX: &str = "https://drive.google.com/uc?export=download&id=";
}

/// Constants used by sessions, scores, and export.
pub mod session {
    /// Rater name used when the supplied name is blank.
    pub const DEFAULT_RATER: &str = "anonymous";
    /// Score shown for an item the rater has not scored yet.
    pub const DEFAULT_SCORE: u8 = 3;
    /// Lowest valid MOS value.
    pub const MIN_SCORE: u8 = 1;
    /// Highest valid MOS value.
    pub const MAX_SCORE: u8 = 5;
    /// Extension used for score export files.
    pub const EXPORT_EXTENSION: &str = "csv";
}

/// Constants used by source discovery.
pub mod source {
    /// Extension of JSON-lines sources listed by catalogs.
    pub const JSONL_EXTENSION: &str = "jsonl";
    /// Display name given to uploads supplied without a name.
    pub const DEFAULT_UPLOAD_NAME: &str = "upload.jsonl";
    /// Environment variable overriding the results directory.
    pub const ENV_RESULTS_DIR: &str = "MOS_RESULTS_DIR";
    /// Environment variable overriding the local video root.
    pub const ENV_VIDEO_ROOT: &str = "MOS_VIDEO_ROOT";
    /// Environment variable overriding the mapping table path.
    pub const ENV_MAPPING_CSV: &str = "MOS_MAPPING_CSV";
    /// Results directory used when neither argument nor environment is set.
    pub const DEFAULT_RESULTS_DIR: &str = "mos_results";
}
