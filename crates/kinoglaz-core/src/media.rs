use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, process::Command};

use crate::{
    error::{KinoglazError, Result},
    types::{ChunkDescriptor, VideoPayload},
};

/// File extensions recognized as video input.
pub const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"];

pub fn is_video_file(path: &Path) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = ext.to_string_lossy().to_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// MIME type for a video file, inferred from its extension. Unknown
/// extensions fall back to `video/mp4`.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        _ => "video/mp4",
    }
}

/// Read a media file into memory together with its MIME type.
pub async fn load_payload(path: &Path) -> Result<VideoPayload> {
    let bytes = fs::read(path).await?;
    Ok(VideoPayload {
        bytes,
        mime_type: guess_mime(path),
    })
}

/// Media operations the pipeline needs from the host system.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Container duration in seconds.
    async fn probe_duration(&self, video: &Path) -> Result<f64>;

    /// Copy one chunk of the video into `dest` without re-encoding.
    async fn extract_chunk(
        &self,
        video: &Path,
        chunk: &ChunkDescriptor,
        dest: &Path,
    ) -> Result<()>;

    /// Export a single frame at an absolute timecode as a JPEG.
    async fn extract_still(&self, video: &Path, timecode: &str, dest: &Path) -> Result<()>;
}

/// ffmpeg and ffprobe invoked as external commands from PATH.
#[derive(Clone, Debug)]
pub struct Ffmpeg {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

#[async_trait]
impl MediaTool for Ffmpeg {
    async fn probe_duration(&self, video: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe)
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg(video)
            .output()
            .await?;

        if !output.status.success() {
            return Err(KinoglazError::ProbeFailed {
                video: video.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let probe: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        probe["format"]["duration"]
            .as_str()
            .and_then(|duration| duration.parse::<f64>().ok())
            .ok_or_else(|| KinoglazError::ProbeFailed {
                video: video.to_path_buf(),
                reason: "no duration in probe output".to_string(),
            })
    }

    async fn extract_chunk(
        &self,
        video: &Path,
        chunk: &ChunkDescriptor,
        dest: &Path,
    ) -> Result<()> {
        let output = Command::new(&self.ffmpeg)
            .arg("-i")
            .arg(video)
            .arg("-ss")
            .arg(chunk.start_offset_seconds.to_string())
            .arg("-t")
            .arg(chunk.duration_seconds.to_string())
            .arg("-c")
            .arg("copy")
            .arg("-avoid_negative_ts")
            .arg("make_zero")
            .arg("-y")
            .arg(dest)
            .output()
            .await?;

        if !output.status.success() {
            return Err(KinoglazError::ChunkExtractionFailed {
                index: chunk.index,
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(())
    }

    async fn extract_still(&self, video: &Path, timecode: &str, dest: &Path) -> Result<()> {
        let output = Command::new(&self.ffmpeg)
            .arg("-ss")
            .arg(timecode)
            .arg("-i")
            .arg(video)
            .arg("-frames:v")
            .arg("1")
            .arg("-q:v")
            .arg("2")
            .arg("-y")
            .arg(dest)
            .output()
            .await?;

        if !output.status.success() {
            return Err(KinoglazError::StillExportFailed {
                timecode: timecode.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_video_extensions_case_insensitively() {
        assert!(is_video_file(Path::new("talk.mp4")));
        assert!(is_video_file(Path::new("talk.MOV")));
        assert!(is_video_file(Path::new("clip.WebM")));
        assert!(!is_video_file(Path::new("notes.txt")));
        assert!(!is_video_file(Path::new("noextension")));
    }

    #[test]
    fn guesses_mime_with_mp4_fallback() {
        assert_eq!(guess_mime(Path::new("a.mov")), "video/quicktime");
        assert_eq!(guess_mime(Path::new("a.mkv")), "video/x-matroska");
        assert_eq!(guess_mime(Path::new("a.mp4")), "video/mp4");
        assert_eq!(guess_mime(Path::new("a.m4v")), "video/mp4");
        assert_eq!(guess_mime(Path::new("a.unknown")), "video/mp4");
    }
}
