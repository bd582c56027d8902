//! Prompt assembly for the analysis backends.
//!
//! Templates use `{name}` placeholders filled by plain string replacement,
//! so the JSON example in the key-frame instructions survives untouched.

use crate::types::ChunkDescriptor;

/// What kind of video is being analyzed; selects the prompt wording.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PromptKind {
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

impl PromptKind {
    pub fn name(&self) -> &'static str {
        match self {
            PromptKind::General => "general",
            PromptKind::Lecture => "lecture",
            PromptKind::Meeting => "meeting",
            PromptKind::Presentation => "presentation",
            PromptKind::Tutorial => "tutorial",
            PromptKind::Marketing => "marketing",
            PromptKind::LanguageLesson => "language-lesson",
            PromptKind::Interview => "interview",
        }
    }

    fn focus(&self) -> &'static str {
        match self {
            PromptKind::General => "Describe the content for someone who cannot watch it.",
            PromptKind::Lecture => {
                "Treat it as an academic lecture: capture the concepts taught, definitions, \
                 worked examples, and anything written on slides or boards."
            }
            PromptKind::Meeting => {
                "Treat it as a recorded meeting: capture who speaks, decisions made, action \
                 items, open disagreements, and deadlines."
            }
            PromptKind::Presentation => {
                "Treat it as a presentation: capture each slide's message, the speaker's \
                 argument, and any live demos."
            }
            PromptKind::Tutorial => {
                "Treat it as a hands-on tutorial: capture each step precisely enough to \
                 reproduce it, including commands, settings, and UI actions."
            }
            PromptKind::Marketing => {
                "Treat it as marketing material: capture the product claims, the intended \
                 audience, calls to action, and persuasion techniques."
            }
            PromptKind::LanguageLesson => {
                "Treat it as a language lesson: capture vocabulary, grammar points, example \
                 phrases with translations, and pronunciation notes."
            }
            PromptKind::Interview => {
                "Treat it as an interview: capture questions and answers, the interviewee's \
                 key statements, and notable quotes."
            }
        }
    }
}

static CHUNK_CONTEXT: &str = r#"You are analyzing part {chunk_number} of {total_chunks} of a longer video.
This part covers minutes {start_time_minutes} to {end_time_minutes} of the full recording and is {duration_minutes} minutes long.

"#;

static DESCRIBE_TASK: &str = r#"Watch the video carefully and produce a thorough chronological description of what happens.
{focus}
Cover spoken content, on-screen text, visual events and scene changes, and give the timecode of each notable moment in mm:ss or hh:mm:ss form."#;

static KEY_FRAMES_POSTFIX: &str = r#"

After the description, pick the most important key frames and append them as a JSON object inside a ```json fence, shaped exactly like:
{"key_frames": [{"timecode": "mm:ss", "title": "short title", "description": "what the frame shows"}]}
Timecodes count from the start of the footage you were given."#;

/// Prompt for a whole video analyzed in one request.
pub fn describe_prompt(kind: PromptKind, key_frames: bool) -> String {
    let mut prompt = render(DESCRIBE_TASK, &[("focus", kind.focus().to_string())]);
    if key_frames {
        prompt.push_str(KEY_FRAMES_POSTFIX);
    }
    prompt
}

/// Prompt for one chunk of a longer video, with its position spelled out.
pub fn chunk_prompt(kind: PromptKind, chunk: &ChunkDescriptor, key_frames: bool) -> String {
    let mut prompt = render(
        CHUNK_CONTEXT,
        &[
            ("chunk_number", chunk.chunk_number().to_string()),
            ("total_chunks", chunk.total_chunks.to_string()),
            (
                "start_time_minutes",
                format!("{:.1}", chunk.start_time_minutes()),
            ),
            (
                "end_time_minutes",
                format!("{:.1}", chunk.end_time_minutes()),
            ),
            (
                "duration_minutes",
                format!("{:.1}", chunk.duration_minutes()),
            ),
        ],
    );
    prompt.push_str(&describe_prompt(kind, key_frames));
    prompt
}

/// Synthesis request built from the per-chunk analyses, in order.
pub fn combine_prompt(analyses: &[String]) -> String {
    let mut document = String::from(
        "The following are sequential analyses of consecutive parts of one video.\n\
         Merge them into a single coherent analysis of the whole video.\n\
         Keep all concrete details and timecodes, remove the seams between parts, \
         and do not summarize away content.\n\n",
    );
    for (i, analysis) in analyses.iter().enumerate() {
        document.push_str(&format!(
            "--- Part {} of {} ---\n{}\n\n",
            i + 1,
            analyses.len(),
            analysis.trim()
        ));
    }
    document
}

fn render(template: &str, replacements: &[(&str, String)]) -> String {
    let mut rendered = template.to_string();
    for (key, value) in replacements {
        rendered = rendered.replace(&format!("{{{key}}}"), value);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn middle_chunk() -> ChunkDescriptor {
        ChunkDescriptor {
            index: 1,
            total_chunks: 3,
            start_offset_seconds: 600.0,
            duration_seconds: 600.0,
        }
    }

    #[test]
    fn chunk_prompt_fills_every_placeholder() {
        let prompt = chunk_prompt(PromptKind::General, &middle_chunk(), false);
        assert!(prompt.contains("part 2 of 3"));
        assert!(prompt.contains("minutes 10.0 to 20.0"));
        assert!(prompt.contains("10.0 minutes long"));
        assert!(!prompt.contains("{chunk_number}"));
        assert!(!prompt.contains("{focus}"));
    }

    #[test]
    fn whole_video_prompt_has_no_part_context() {
        let prompt = describe_prompt(PromptKind::Lecture, false);
        assert!(!prompt.contains("part"));
        assert!(prompt.contains("academic lecture"));
    }

    #[test]
    fn key_frame_instructions_appear_only_when_requested() {
        let with = chunk_prompt(PromptKind::General, &middle_chunk(), true);
        let without = chunk_prompt(PromptKind::General, &middle_chunk(), false);
        assert!(with.contains("\"key_frames\""));
        assert!(!without.contains("key_frames"));
    }

    #[test]
    fn key_frame_json_example_keeps_its_braces() {
        let prompt = describe_prompt(PromptKind::General, true);
        assert!(prompt.contains("{\"key_frames\": [{\"timecode\""));
    }

    #[test]
    fn combine_prompt_labels_every_part_in_order() {
        let parts = vec!["first part text".to_string(), "second part text".to_string()];
        let prompt = combine_prompt(&parts);
        assert!(prompt.contains("--- Part 1 of 2 ---\nfirst part text"));
        assert!(prompt.contains("--- Part 2 of 2 ---\nsecond part text"));
        let first = prompt.find("first part text").unwrap();
        let second = prompt.find("second part text").unwrap();
        assert!(first < second);
    }

    #[test]
    fn each_kind_selects_distinct_wording() {
        let tutorial = describe_prompt(PromptKind::Tutorial, false);
        let interview = describe_prompt(PromptKind::Interview, false);
        assert!(tutorial.contains("reproduce"));
        assert!(interview.contains("questions and answers"));
        assert_ne!(tutorial, interview);
    }

    #[test]
    fn kind_names_stay_kebab_case() {
        assert_eq!(PromptKind::General.name(), "general");
        assert_eq!(PromptKind::LanguageLesson.name(), "language-lesson");
        assert_eq!(PromptKind::default().name(), "general");
    }
}
