use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use kinoglaz_core::{
    create_analyzer, discover_videos, process_batch, AnalyzerOptions, BatchEvent, Ffmpeg,
    PromptKind, Provider, RunConfig, VideoOutcome, VIDEO_EXTENSIONS,
};
use tokio::fs;
use tracing_subscriber::EnvFilter;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Gemini,
    Openrouter,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openrouter => Provider::OpenRouter,
        }
    }
}

/// CLI wrapper for PromptKind enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliPromptKind {
    #[default]
    General,
    Lecture,
    Meeting,
    Presentation,
    Tutorial,
    Marketing,
    LanguageLesson,
    Interview,
}

impl From<CliPromptKind> for PromptKind {
    fn from(cli: CliPromptKind) -> Self {
        match cli {
            CliPromptKind::General => PromptKind::General,
            CliPromptKind::Lecture => PromptKind::Lecture,
            CliPromptKind::Meeting => PromptKind::Meeting,
            CliPromptKind::Presentation => PromptKind::Presentation,
            CliPromptKind::Tutorial => PromptKind::Tutorial,
            CliPromptKind::Marketing => PromptKind::Marketing,
            CliPromptKind::LanguageLesson => PromptKind::LanguageLesson,
            CliPromptKind::Interview => PromptKind::Interview,
        }
    }
}

#[derive(Parser)]
#[command(name = "kinoglaz")]
#[command(about = "Describe videos with a multimodal model, one chunk at a time")]
struct Cli {
    /// Directory with input videos
    #[arg(default_value = "video")]
    input: PathBuf,

    /// Root directory for analysis output
    #[arg(short, long, default_value = "analysis")]
    output: PathBuf,

    /// Chunk length in minutes
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    chunk_minutes: u64,

    /// AI provider for video analysis
    #[arg(short, long, default_value = "gemini")]
    provider: CliProvider,

    /// Prompt flavor matching the kind of video
    #[arg(long, default_value = "general")]
    prompt: CliPromptKind,

    /// Model override for the chosen provider
    #[arg(short, long)]
    model: Option<String>,

    /// Extract key frames and export a still image for each
    #[arg(short, long)]
    key_frames: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let provider: Provider = cli.provider.into();

    // Validate API key early
    if let Err(e) = provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    println!(
        "\n{}  {}\n",
        style("kinoglaz").cyan().bold(),
        style("Video Analyzer").dim()
    );

    if !cli.input.exists() {
        fs::create_dir_all(&cli.input).await?;
        println!(
            "{} Created input directory {}. Put your videos there and run again.",
            style("!").yellow().bold(),
            style(cli.input.display()).cyan()
        );
        return Ok(());
    }

    let videos = discover_videos(&cli.input).await?;
    if videos.is_empty() {
        println!(
            "{} No video files found in {}. Supported formats: {}.",
            style("!").yellow().bold(),
            style(cli.input.display()).cyan(),
            VIDEO_EXTENSIONS.join(", ")
        );
        return Ok(());
    }

    let prompt_kind: PromptKind = cli.prompt.into();
    let analyzer = create_analyzer(
        provider,
        AnalyzerOptions {
            model: cli.model.clone(),
            prompt_kind,
            key_frames: cli.key_frames,
        },
    )?;
    let media = Ffmpeg::default();

    let mut config = RunConfig::new(cli.input.clone(), cli.output.clone());
    config.chunk_duration_seconds = (cli.chunk_minutes * 60) as f64;
    config.key_frames = cli.key_frames;

    println!(
        "{} Found {} video(s), analyzing with {} ({} prompt)",
        style("✓").green().bold(),
        videos.len(),
        style(provider.name()).yellow(),
        style(prompt_kind.name()).yellow()
    );
    println!("{}", style("─".repeat(60)).dim());

    let mut spinner: Option<ProgressBar> = None;
    let mut label = String::new();
    let summary = process_batch(&config, analyzer.as_ref(), &media, |event| match event {
        BatchEvent::Started {
            index,
            total,
            video,
        } => {
            label = format!(
                "[{}/{}] Analyzing {}...",
                index + 1,
                total,
                display_name(video)
            );
            spinner = Some(create_spinner(&label));
        }
        BatchEvent::Chunk {
            chunk,
            total_chunks,
            ..
        } => {
            if total_chunks > 1 {
                if let Some(pb) = &spinner {
                    pb.set_message(format!("{label} (chunk {chunk}/{total_chunks})"));
                }
            }
        }
        BatchEvent::Finished { outcome, .. } => {
            let pb = spinner.take();
            match outcome {
                VideoOutcome::Completed(success) => {
                    let mut message = format!(
                        "{} {}: {} chunk(s) {}",
                        style("✓").green().bold(),
                        display_name(&success.video),
                        success.chunks_analyzed,
                        style(format!("[{}]", format_duration(success.elapsed))).dim()
                    );
                    if let Some(frames) = &success.analysis.key_frames {
                        message.push_str(&format!(
                            " {}",
                            style(format!(
                                "({} key frames, {} stills)",
                                frames.len(),
                                success.images_exported
                            ))
                            .dim()
                        ));
                    }
                    match pb {
                        Some(pb) => pb.finish_with_message(message),
                        None => println!("{message}"),
                    }
                    println!(
                        "  {} {}",
                        style("Saved:").dim(),
                        style(success.final_path.display()).cyan()
                    );
                    let preview: String = success.analysis.text.chars().take(300).collect();
                    let ellipsis = if success.analysis.text.chars().count() > 300 {
                        "..."
                    } else {
                        ""
                    };
                    println!("{}", style(format!("{preview}{ellipsis}")).dim());
                }
                VideoOutcome::Failed(failure) => {
                    let message = format!(
                        "{} {}: {}",
                        style("✗").red().bold(),
                        display_name(&failure.video),
                        failure
                    );
                    match pb {
                        Some(pb) => pb.finish_with_message(message),
                        None => eprintln!("{message}"),
                    }
                }
            }
        }
    })
    .await?;

    println!("{}", style("─".repeat(60)).dim());
    println!(
        "\n{} {} of {} videos, {} failed",
        style("Completed:").dim(),
        style(summary.succeeded).green().bold(),
        summary.total,
        if summary.failed > 0 {
            style(summary.failed).red().bold()
        } else {
            style(summary.failed).dim()
        }
    );
    println!(
        "{} {}\n",
        style("Total time:").dim(),
        style(format_duration(summary.elapsed)).cyan().bold()
    );

    Ok(())
}
