use std::path::{Path, PathBuf};

use crate::{artifacts, error::Result, media::MediaTool, types::ChunkDescriptor};

/// One planned chunk together with the media file backing it. For a video
/// short enough to fit a single chunk this is the source file itself.
#[derive(Clone, Debug)]
pub struct SplitChunk {
    pub descriptor: ChunkDescriptor,
    pub path: PathBuf,
}

/// Lay out fixed-duration chunks over a video.
///
/// A video no longer than the nominal duration maps to a single chunk
/// covering the whole file. Otherwise every chunk is nominal-length
/// except the last, which takes the remainder.
pub fn plan_chunks(
    video_duration_seconds: f64,
    nominal_chunk_seconds: f64,
) -> Vec<ChunkDescriptor> {
    if video_duration_seconds <= nominal_chunk_seconds {
        return vec![ChunkDescriptor {
            index: 0,
            total_chunks: 1,
            start_offset_seconds: 0.0,
            duration_seconds: video_duration_seconds,
        }];
    }

    let total_chunks = (video_duration_seconds / nominal_chunk_seconds).ceil() as usize;
    (0..total_chunks)
        .map(|index| {
            let start_offset_seconds = index as f64 * nominal_chunk_seconds;
            let duration_seconds = if index + 1 == total_chunks {
                video_duration_seconds - start_offset_seconds
            } else {
                nominal_chunk_seconds
            };
            ChunkDescriptor {
                index,
                total_chunks,
                start_offset_seconds,
                duration_seconds,
            }
        })
        .collect()
}

/// Probe the video and extract its chunk files into `scratch_dir`.
///
/// A chunk whose extraction fails is dropped with a warning and the rest
/// of the sequence is still produced. Single-chunk videos skip extraction
/// entirely and point at the source file.
pub async fn split_video(
    media: &dyn MediaTool,
    video: &Path,
    scratch_dir: &Path,
    nominal_chunk_seconds: f64,
) -> Result<Vec<SplitChunk>> {
    let duration = media.probe_duration(video).await?;
    let plan = plan_chunks(duration, nominal_chunk_seconds);
    tracing::debug!(
        video = %video.display(),
        duration,
        chunks = plan.len(),
        "planned segmentation"
    );

    if let [descriptor] = plan.as_slice() {
        return Ok(vec![SplitChunk {
            descriptor: descriptor.clone(),
            path: video.to_path_buf(),
        }]);
    }

    let stem = artifacts::video_stem(video);
    let mut chunks = Vec::with_capacity(plan.len());
    for descriptor in plan {
        let dest = artifacts::chunk_media_path(scratch_dir, &stem, descriptor.chunk_number());
        match media.extract_chunk(video, &descriptor, &dest).await {
            Ok(()) => chunks.push(SplitChunk {
                descriptor,
                path: dest,
            }),
            Err(error) => {
                tracing::warn!(chunk = descriptor.chunk_number(), %error, "dropping chunk");
            }
        }
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_video_is_a_single_whole_chunk() {
        let plan = plan_chunks(300.0, 600.0);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].index, 0);
        assert_eq!(plan[0].total_chunks, 1);
        assert_eq!(plan[0].start_offset_seconds, 0.0);
        assert_eq!(plan[0].duration_seconds, 300.0);
    }

    #[test]
    fn duration_equal_to_nominal_stays_single() {
        let plan = plan_chunks(600.0, 600.0);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].duration_seconds, 600.0);
    }

    #[test]
    fn exact_multiple_splits_evenly() {
        let plan = plan_chunks(1800.0, 600.0);
        assert_eq!(plan.len(), 3);
        for (i, chunk) in plan.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.total_chunks, 3);
            assert_eq!(chunk.start_offset_seconds, i as f64 * 600.0);
            assert_eq!(chunk.duration_seconds, 600.0);
        }
    }

    #[test]
    fn remainder_becomes_a_short_last_chunk() {
        let plan = plan_chunks(1500.0, 600.0);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[2].start_offset_seconds, 1200.0);
        assert_eq!(plan[2].duration_seconds, 300.0);
    }

    #[test]
    fn marginal_overflow_yields_a_tiny_final_chunk() {
        let plan = plan_chunks(601.0, 600.0);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].duration_seconds, 1.0);
    }

    #[test]
    fn derived_fields_follow_the_index() {
        let plan = plan_chunks(1500.0, 600.0);
        assert!(plan[0].is_first());
        assert!(!plan[0].is_last());
        assert!(plan[2].is_last());
        assert_eq!(plan[1].chunk_number(), 2);
        assert_eq!(plan[1].start_time_minutes(), 10.0);
        assert_eq!(plan[1].end_time_minutes(), 20.0);
        assert_eq!(plan[2].duration_minutes(), 5.0);
    }
}
