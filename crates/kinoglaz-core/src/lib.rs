//! Kinoglaz Core Library
//!
//! Core functionality for describing videos with multimodal models:
//! splitting long recordings into chunks with ffmpeg, sending each chunk
//! to an analysis backend, recovering embedded key-frame data, and
//! merging everything into per-video artifacts.

pub mod analyzer;
pub mod artifacts;
pub mod error;
pub mod gemini;
pub mod keyframes;
pub mod media;
pub mod openrouter;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod segment;
pub mod timecode;
pub mod types;

// Re-export commonly used items at crate root
pub use analyzer::{retry_with_backoff, AnalyzerOptions, VideoAnalyzer, MAX_RETRIES};
pub use error::{FailureClass, KinoglazError, Result};
pub use gemini::GeminiAnalyzer;
pub use keyframes::{combine_key_frames, extract_key_frames, rebase_key_frames};
pub use media::{
    guess_mime, is_video_file, load_payload, Ffmpeg, MediaTool, VIDEO_EXTENSIONS,
};
pub use openrouter::OpenRouterAnalyzer;
pub use pipeline::{
    discover_videos, process_batch, process_video, process_video_observed, BatchEvent,
    BatchSummary, RunConfig, VideoFailure, VideoOutcome, VideoStage, VideoSuccess,
};
pub use prompts::PromptKind;
pub use provider::{create_analyzer, Provider, ProviderConfig};
pub use segment::{plan_chunks, split_video, SplitChunk};
pub use types::{
    ChunkAnalysisResult, ChunkDescriptor, FinalAnalysis, KeyFrame, KeyFramePayload, VideoPayload,
};
