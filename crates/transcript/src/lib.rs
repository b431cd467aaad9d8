use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("transcript file not found: {0}")]
    NotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed transcript json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TranscriptError>;

/// One contiguous span of transcribed speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub duration: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            duration: end - start,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTranscription {
    #[serde(default)]
    segments: Vec<RawSegment>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
}

/// Load speech segments from upstream transcription JSON.
///
/// Expects `{"segments": [{"start", "end", "text"}, ...]}`. Text is optional
/// and trimmed; segment order is preserved. An empty segment array is valid.
pub fn load_segments<R: Read>(reader: R) -> Result<Vec<Segment>> {
    let raw: RawTranscription = serde_json::from_reader(reader)?;
    Ok(raw
        .segments
        .into_iter()
        .map(|s| Segment::new(s.start, s.end, s.text.trim()))
        .collect())
}

pub fn load_segments_file(path: &Path) -> Result<Vec<Segment>> {
    if !path.exists() {
        return Err(TranscriptError::NotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    load_segments(std::io::BufReader::new(file))
}

/// Call provenance parsed from a `YYYYMMDD_HHMMSS_<name>` file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMetadata {
    pub date: u32,
    pub time: u32,
    pub dispatcher: String,
}

impl Default for CallMetadata {
    fn default() -> Self {
        Self {
            date: 0,
            time: 0,
            dispatcher: "dispatcher".to_string(),
        }
    }
}

impl CallMetadata {
    /// Parse a file stem of the form `YYYYMMDD_HHMMSS_<name>`.
    ///
    /// Stems that do not match degrade to `{0, 0, "unknown"}` rather than
    /// failing.
    pub fn parse(stem: &str) -> Self {
        let unknown = Self {
            date: 0,
            time: 0,
            dispatcher: "unknown".to_string(),
        };

        let mut parts = stem.splitn(3, '_');
        let (Some(date_part), Some(time_part), Some(name)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return unknown;
        };

        if date_part.len() != 8 || time_part.len() != 6 || name.is_empty() {
            return unknown;
        }
        let (Ok(date), Ok(time)) = (date_part.parse::<u32>(), time_part.parse::<u32>()) else {
            return unknown;
        };

        Self {
            date,
            time,
            dispatcher: name.to_string(),
        }
    }

    /// Date as `YYYY/MM/DD` for display, or "unknown" when unparsed.
    pub fn formatted_date(&self) -> String {
        if self.date == 0 {
            return "unknown".to_string();
        }
        let d = format!("{:08}", self.date);
        format!("{}/{}/{}", &d[..4], &d[4..6], &d[6..8])
    }

    /// Time as `HH:MM:SS` for display, or "unknown" when unparsed.
    pub fn formatted_time(&self) -> String {
        if self.time == 0 {
            return "unknown".to_string();
        }
        let t = format!("{:06}", self.time);
        format!("{}:{}:{}", &t[..2], &t[2..4], &t[4..6])
    }
}

/// One role-labeled span in the final transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledSegment {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// The final role-separated transcript for one call.
///
/// Field order matches the produced JSON artifact; `speakers` holds the
/// dispatcher display label followed by `"caller"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizedTranscript {
    pub date: u32,
    pub time: u32,
    pub total_segments: usize,
    pub speakers: [String; 2],
    pub segments: Vec<LabeledSegment>,
}

impl DiarizedTranscript {
    /// Render as speaker-labeled plain text, one line per segment.
    ///
    /// This is the form the downstream grading service consumes.
    pub fn to_plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("{}: {}", s.speaker, s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
