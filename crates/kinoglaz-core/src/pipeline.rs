//! The batch run: discover videos, then for each one segment, analyze,
//! combine, and persist. One video's failure never stops the batch; it is
//! recorded with the stage it died in and the run moves on.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use thiserror::Error;
use tokio::fs;

use crate::{
    analyzer::VideoAnalyzer,
    artifacts,
    error::{KinoglazError, Result},
    keyframes,
    media::{self, MediaTool},
    segment,
    types::{ChunkAnalysisResult, FinalAnalysis},
};

/// Settings for one batch run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub chunk_duration_seconds: f64,
    pub key_frames: bool,
}

impl RunConfig {
    /// Ten minute chunks, scratch under the user cache directory.
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            scratch_dir: artifacts::default_scratch_dir(),
            chunk_duration_seconds: 600.0,
            key_frames: false,
        }
    }
}

/// Where a video currently is in its run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoStage {
    Pending,
    Segmenting,
    Analyzing { chunk: usize, total: usize },
    Combining,
    Persisting,
    Done,
}

impl fmt::Display for VideoStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoStage::Pending => write!(f, "pending"),
            VideoStage::Segmenting => write!(f, "segmenting"),
            VideoStage::Analyzing { chunk, total } => {
                write!(f, "analyzing chunk {chunk} of {total}")
            }
            VideoStage::Combining => write!(f, "combining"),
            VideoStage::Persisting => write!(f, "persisting"),
            VideoStage::Done => write!(f, "done"),
        }
    }
}

/// A finished video with its artifacts in place.
#[derive(Debug)]
pub struct VideoSuccess {
    pub video: PathBuf,
    pub final_path: PathBuf,
    pub analysis: FinalAnalysis,
    pub chunks_analyzed: usize,
    pub images_exported: usize,
    pub elapsed: Duration,
}

/// A video that died mid-run, with the stage it reached.
#[derive(Debug, Error)]
#[error("failed while {stage}: {error}")]
pub struct VideoFailure {
    pub video: PathBuf,
    pub stage: VideoStage,
    pub error: KinoglazError,
}

#[derive(Debug)]
pub enum VideoOutcome {
    Completed(VideoSuccess),
    Failed(VideoFailure),
}

/// Progress notifications emitted by [`process_batch`]. `Chunk` fires as
/// each chunk of the current video is sent off for analysis.
pub enum BatchEvent<'a> {
    Started {
        index: usize,
        total: usize,
        video: &'a Path,
    },
    Chunk {
        video: &'a Path,
        chunk: usize,
        total_chunks: usize,
    },
    Finished {
        index: usize,
        total: usize,
        outcome: &'a VideoOutcome,
    },
}

/// What a whole batch run came to.
#[derive(Clone, Debug)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Video files directly inside `input_dir`, sorted by path. The scan does
/// not recurse.
pub async fn discover_videos(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(input_dir).await?;
    let mut videos = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && media::is_video_file(&path) {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

/// Run one video through segmentation, analysis, combination, and
/// persistence. On failure the scratch directory keeps whatever
/// intermediate files were already written.
pub async fn process_video(
    config: &RunConfig,
    analyzer: &dyn VideoAnalyzer,
    media: &dyn MediaTool,
    video: &Path,
) -> std::result::Result<VideoSuccess, VideoFailure> {
    process_video_observed(config, analyzer, media, video, &mut |_| {}).await
}

/// [`process_video`] with per-chunk progress reported through `observer`
/// as [`BatchEvent::Chunk`] notifications.
pub async fn process_video_observed(
    config: &RunConfig,
    analyzer: &dyn VideoAnalyzer,
    media: &dyn MediaTool,
    video: &Path,
    observer: &mut dyn FnMut(BatchEvent<'_>),
) -> std::result::Result<VideoSuccess, VideoFailure> {
    let started = Instant::now();
    let mut stage = VideoStage::Pending;
    run_video(config, analyzer, media, video, started, &mut stage, observer)
        .await
        .map_err(|error| VideoFailure {
            video: video.to_path_buf(),
            stage,
            error,
        })
}

async fn run_video(
    config: &RunConfig,
    analyzer: &dyn VideoAnalyzer,
    media: &dyn MediaTool,
    video: &Path,
    started: Instant,
    stage: &mut VideoStage,
    observer: &mut dyn FnMut(BatchEvent<'_>),
) -> Result<VideoSuccess> {
    *stage = VideoStage::Segmenting;
    artifacts::reset_scratch_dir(&config.scratch_dir).await?;
    let chunks = segment::split_video(
        media,
        video,
        &config.scratch_dir,
        config.chunk_duration_seconds,
    )
    .await?;
    let Some(first) = chunks.first() else {
        return Err(KinoglazError::NoChunksExtracted {
            video: video.to_path_buf(),
        });
    };
    let total = first.descriptor.total_chunks;
    let stem = artifacts::video_stem(video);

    let mut results: Vec<ChunkAnalysisResult> = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        *stage = VideoStage::Analyzing {
            chunk: chunk.descriptor.chunk_number(),
            total,
        };
        observer(BatchEvent::Chunk {
            video,
            chunk: chunk.descriptor.chunk_number(),
            total_chunks: total,
        });
        tracing::info!(
            video = %video.display(),
            chunk = chunk.descriptor.chunk_number(),
            total,
            "analyzing"
        );

        let payload = media::load_payload(&chunk.path).await?;
        let raw_text = if total == 1 {
            analyzer.analyze_whole(&payload).await?
        } else {
            analyzer.analyze_chunk(&payload, &chunk.descriptor).await?
        };

        let key_frames = if config.key_frames {
            keyframes::extract_key_frames(&raw_text).map(|payload| {
                keyframes::rebase_key_frames(
                    payload.key_frames,
                    chunk.descriptor.start_offset_seconds as u64,
                )
            })
        } else {
            None
        };

        let result = ChunkAnalysisResult {
            chunk: chunk.descriptor.clone(),
            raw_text,
            key_frames,
        };
        let source_name = chunk
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        artifacts::save_chunk_analysis(&config.scratch_dir, &stem, &result, &source_name).await?;
        results.push(result);
    }

    *stage = VideoStage::Combining;
    let text = if let [only] = results.as_slice() {
        only.raw_text.clone()
    } else {
        let texts: Vec<String> = results.iter().map(|r| r.raw_text.clone()).collect();
        analyzer.combine(&texts).await?
    };

    let merged = keyframes::combine_key_frames(
        results
            .iter()
            .filter_map(|result| result.key_frames.clone())
            .collect(),
    );
    let analysis = FinalAnalysis {
        text,
        key_frames: if merged.is_empty() { None } else { Some(merged) },
    };

    *stage = VideoStage::Persisting;
    let video_dir = artifacts::video_output_dir(&config.output_dir, &stem);
    let final_path =
        artifacts::save_final_analysis(&video_dir, &stem, video, &analysis.text).await?;

    let mut images_exported = 0;
    if let Some(frames) = &analysis.key_frames {
        artifacts::save_key_frames(&video_dir, frames).await?;
        images_exported = artifacts::export_key_frame_images(
            media,
            video,
            frames,
            &artifacts::images_dir(&video_dir),
        )
        .await?;
    }

    *stage = VideoStage::Done;
    Ok(VideoSuccess {
        video: video.to_path_buf(),
        final_path,
        analysis,
        chunks_analyzed: results.len(),
        images_exported,
        elapsed: started.elapsed(),
    })
}

/// Process every video in the input directory in order, reporting
/// progress through `observer`. Returns how the batch went as a whole.
pub async fn process_batch<F>(
    config: &RunConfig,
    analyzer: &dyn VideoAnalyzer,
    media: &dyn MediaTool,
    mut observer: F,
) -> Result<BatchSummary>
where
    F: FnMut(BatchEvent<'_>),
{
    let started = Instant::now();
    let videos = discover_videos(&config.input_dir).await?;
    let total = videos.len();
    let mut succeeded = 0;
    let mut failed = 0;

    for (index, video) in videos.iter().enumerate() {
        observer(BatchEvent::Started {
            index,
            total,
            video,
        });
        tracing::info!(video = %video.display(), position = index + 1, total, "processing video");

        let result =
            process_video_observed(config, analyzer, media, video, &mut |event| observer(event))
                .await;
        let outcome = match result {
            Ok(success) => {
                succeeded += 1;
                VideoOutcome::Completed(success)
            }
            Err(failure) => {
                failed += 1;
                tracing::error!(
                    video = %failure.video.display(),
                    stage = %failure.stage,
                    error = %failure.error,
                    "video failed"
                );
                VideoOutcome::Failed(failure)
            }
        };
        observer(BatchEvent::Finished {
            index,
            total,
            outcome: &outcome,
        });
    }

    Ok(BatchSummary {
        total,
        succeeded,
        failed,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_read_naturally() {
        assert_eq!(VideoStage::Segmenting.to_string(), "segmenting");
        assert_eq!(
            VideoStage::Analyzing { chunk: 2, total: 3 }.to_string(),
            "analyzing chunk 2 of 3"
        );
        assert_eq!(VideoStage::Done.to_string(), "done");
    }

    #[tokio::test]
    async fn discovery_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp4", "a.mkv", "notes.txt", "c.MOV"] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }
        tokio::fs::create_dir(dir.path().join("sub.mp4"))
            .await
            .unwrap();

        let videos = discover_videos(dir.path()).await.unwrap();
        let names: Vec<String> = videos
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, ["a.mkv", "b.mp4", "c.MOV"]);
    }

    #[tokio::test]
    async fn empty_input_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let videos = discover_videos(dir.path()).await.unwrap();
        assert!(videos.is_empty());
    }
}
