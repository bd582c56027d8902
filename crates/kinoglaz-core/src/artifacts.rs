//! Where every file lands and what gets stamped on it.
//!
//! Scratch holds chunk media and per-chunk analyses and is wiped before
//! each video. Final artifacts live under `<output>/<stem>/` and are
//! never written for a failed video.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::{
    error::Result,
    media::MediaTool,
    timecode,
    types::{ChunkAnalysisResult, KeyFrame},
};

/// Scratch space for chunk media and per-chunk analyses.
pub fn default_scratch_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("kinoglaz")
}

/// Wipe and recreate the scratch directory.
pub async fn reset_scratch_dir(dir: &Path) -> Result<()> {
    if fs::try_exists(dir).await? {
        fs::remove_dir_all(dir).await?;
    }
    fs::create_dir_all(dir).await?;
    Ok(())
}

/// File stem used for every artifact belonging to one video.
pub fn video_stem(video: &Path) -> String {
    video
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string())
}

pub fn chunk_media_path(scratch_dir: &Path, stem: &str, chunk_number: usize) -> PathBuf {
    scratch_dir.join(format!("{stem}_chunk_{chunk_number:03}.mp4"))
}

pub fn chunk_analysis_path(scratch_dir: &Path, stem: &str, chunk_number: usize) -> PathBuf {
    scratch_dir.join(format!("{stem}_chunk_{chunk_number:03}_analysis.txt"))
}

/// Directory all final artifacts for one video land in.
pub fn video_output_dir(output_root: &Path, stem: &str) -> PathBuf {
    output_root.join(stem)
}

pub fn final_analysis_path(video_dir: &Path, stem: &str) -> PathBuf {
    video_dir.join(format!("{stem}.txt"))
}

pub fn key_frames_path(video_dir: &Path) -> PathBuf {
    video_dir.join("key_frames.json")
}

pub fn images_dir(video_dir: &Path) -> PathBuf {
    video_dir.join("images")
}

pub fn still_image_path(images: &Path, ordinal: usize, timecode: &str) -> PathBuf {
    images.join(format!("{:02}_{}.jpg", ordinal, timecode::sanitize(timecode)))
}

/// Write one chunk's analysis to scratch with its position header,
/// returning the path written.
pub async fn save_chunk_analysis(
    scratch_dir: &Path,
    stem: &str,
    result: &ChunkAnalysisResult,
    source_name: &str,
) -> Result<PathBuf> {
    let chunk = &result.chunk;
    let header = format!(
        "Chunk {} of {}\nTime range: {:.1}-{:.1} minutes\nDuration: {:.1} minutes\nSource file: {}\n{}\n\n",
        chunk.chunk_number(),
        chunk.total_chunks,
        chunk.start_time_minutes(),
        chunk.end_time_minutes(),
        chunk.duration_minutes(),
        source_name,
        "=".repeat(50),
    );
    let path = chunk_analysis_path(scratch_dir, stem, chunk.chunk_number());
    fs::write(&path, format!("{header}{}", result.raw_text)).await?;
    Ok(path)
}

/// Write the final analysis under the video's output directory, stamped
/// with the source path and the time of writing.
pub async fn save_final_analysis(
    video_dir: &Path,
    stem: &str,
    video: &Path,
    text: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(video_dir).await?;
    let header = format!(
        "Video analysis for: {}\nTimestamp: {}\n{}\n\n",
        video.display(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60),
    );
    let path = final_analysis_path(video_dir, stem);
    fs::write(&path, format!("{header}{text}")).await?;
    Ok(path)
}

/// Persist the merged key-frame list as pretty JSON.
pub async fn save_key_frames(video_dir: &Path, frames: &[KeyFrame]) -> Result<PathBuf> {
    fs::create_dir_all(video_dir).await?;
    let path = key_frames_path(video_dir);
    let pretty = serde_json::to_string_pretty(&serde_json::json!({ "key_frames": frames }))?;
    fs::write(&path, pretty).await?;
    Ok(path)
}

/// Export one still per key frame into the images directory, numbered in
/// list order. A frame whose export fails is skipped with a warning and
/// leaves no file behind. Returns how many stills were written.
pub async fn export_key_frame_images(
    media: &dyn MediaTool,
    video: &Path,
    frames: &[KeyFrame],
    images: &Path,
) -> Result<usize> {
    fs::create_dir_all(images).await?;
    let mut exported = 0;
    for (i, frame) in frames.iter().enumerate() {
        let dest = still_image_path(images, i + 1, &frame.timecode);
        match media.extract_still(video, &frame.timecode, &dest).await {
            Ok(()) => exported += 1,
            Err(error) => {
                tracing::warn!(timecode = %frame.timecode, %error, "skipping still export");
            }
        }
    }
    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkDescriptor, KeyFramePayload};

    #[test]
    fn chunk_paths_use_three_digit_numbers() {
        let scratch = Path::new("/tmp/scratch");
        assert_eq!(
            chunk_media_path(scratch, "talk", 2),
            PathBuf::from("/tmp/scratch/talk_chunk_002.mp4")
        );
        assert_eq!(
            chunk_analysis_path(scratch, "talk", 12),
            PathBuf::from("/tmp/scratch/talk_chunk_012_analysis.txt")
        );
    }

    #[test]
    fn still_names_order_and_sanitize() {
        let images = Path::new("/out/talk/images");
        assert_eq!(
            still_image_path(images, 3, "00:15:42"),
            PathBuf::from("/out/talk/images/03_00-15-42.jpg")
        );
    }

    #[test]
    fn stem_falls_back_when_the_path_has_none() {
        assert_eq!(video_stem(Path::new("dir/talk.mp4")), "talk");
        assert_eq!(video_stem(Path::new("/")), "video");
    }

    #[tokio::test]
    async fn chunk_analysis_carries_its_position_header() {
        let dir = tempfile::tempdir().unwrap();
        let result = ChunkAnalysisResult {
            chunk: ChunkDescriptor {
                index: 1,
                total_chunks: 3,
                start_offset_seconds: 600.0,
                duration_seconds: 600.0,
            },
            raw_text: "things happen".to_string(),
            key_frames: None,
        };
        let path = save_chunk_analysis(dir.path(), "talk", &result, "talk_chunk_002.mp4")
            .await
            .unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with("Chunk 2 of 3\n"));
        assert!(written.contains("Time range: 10.0-20.0 minutes"));
        assert!(written.contains("Duration: 10.0 minutes"));
        assert!(written.contains("Source file: talk_chunk_002.mp4"));
        assert!(written.contains(&"=".repeat(50)));
        assert!(written.ends_with("things happen"));
    }

    #[tokio::test]
    async fn final_analysis_is_stamped_and_placed_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let video_dir = dir.path().join("talk");
        let path = save_final_analysis(
            &video_dir,
            "talk",
            Path::new("video/talk.mp4"),
            "the whole story",
        )
        .await
        .unwrap();

        assert_eq!(path, video_dir.join("talk.txt"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with("Video analysis for: video/talk.mp4\n"));
        assert!(written.contains("Timestamp: "));
        assert!(written.ends_with("the whole story"));
    }

    #[tokio::test]
    async fn key_frames_round_trip_through_the_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let frames = vec![KeyFrame {
            timecode: "00:10:05".to_string(),
            title: "Demo".to_string(),
            description: "A demo starts".to_string(),
        }];
        let path = save_key_frames(dir.path(), &frames).await.unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        let payload: KeyFramePayload = serde_json::from_str(&written).unwrap();
        assert_eq!(payload.key_frames, frames);
    }

    #[tokio::test]
    async fn scratch_reset_clears_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        tokio::fs::create_dir_all(&scratch).await.unwrap();
        tokio::fs::write(scratch.join("stale.txt"), "old")
            .await
            .unwrap();

        reset_scratch_dir(&scratch).await.unwrap();

        assert!(scratch.exists());
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }
}
