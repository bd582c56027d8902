use serde::{Deserialize, Serialize};

/// Position of one chunk inside the source video. Offsets come from the
/// segmentation plan, not from probing the extracted file.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkDescriptor {
    pub index: usize,
    pub total_chunks: usize,
    pub start_offset_seconds: f64,
    pub duration_seconds: f64,
}

impl ChunkDescriptor {
    /// 1-based position, for prompts and file names.
    pub fn chunk_number(&self) -> usize {
        self.index + 1
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total_chunks
    }

    pub fn start_time_minutes(&self) -> f64 {
        self.start_offset_seconds / 60.0
    }

    pub fn end_time_minutes(&self) -> f64 {
        (self.start_offset_seconds + self.duration_seconds) / 60.0
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }
}

/// Raw media bytes plus the MIME type inferred from the file extension.
#[derive(Clone, Debug)]
pub struct VideoPayload {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// One key frame reported by the model. Timecodes are chunk-relative as
/// emitted and rebased to whole-video time before merging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame {
    #[serde(default = "default_timecode")]
    pub timecode: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "frame_description")]
    pub description: String,
}

fn default_timecode() -> String {
    "00:00:00".to_string()
}

/// Wire shape of the structured block embedded in model responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyFramePayload {
    pub key_frames: Vec<KeyFrame>,
}

#[derive(Clone, Debug)]
pub struct ChunkAnalysisResult {
    pub chunk: ChunkDescriptor,
    pub raw_text: String,
    pub key_frames: Option<Vec<KeyFrame>>,
}

#[derive(Clone, Debug)]
pub struct FinalAnalysis {
    pub text: String,
    pub key_frames: Option<Vec<KeyFrame>>,
}
