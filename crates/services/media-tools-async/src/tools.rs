//! Per-tool request descriptors and the builder that turns them into uploads.
//!
//! Every processing endpoint takes a multipart form, but the field names differ
//! from endpoint to endpoint (`video`, `media`, `videos`, `voice`...). The
//! remote API is the authority here: each [`ToolSpec`] mirrors exactly what its
//! endpoint accepts.

use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use tokio::sync::watch;

use crate::error::MediaToolsError;

/// Grouping used for navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolCategory {
    /// Video editing
    Video,
    /// Audio processing
    Audio,
    /// Subtitles
    Captions,
    /// Jobs and housekeeping
    System,
    /// Anything else
    Other,
}

/// Display order of categories
pub const CATEGORY_ORDER: [ToolCategory; 5] = [
    ToolCategory::Video,
    ToolCategory::Audio,
    ToolCategory::Captions,
    ToolCategory::System,
    ToolCategory::Other,
];

/// Rollout status; informational only, every tool can be called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    /// Generally available
    Live,
    /// Endpoint exists but the tool is not advertised yet
    ComingSoon,
}

/// A file field accepted by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileField {
    /// Form field name
    pub name: &'static str,
    /// Whether the request is rejected without it
    pub required: bool,
    /// Whether the field may repeat (one part per file)
    pub multiple: bool,
}

impl FileField {
    const fn one(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            multiple: false,
        }
    }

    const fn many(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            multiple: true,
        }
    }
}

/// Descriptor for one processing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    /// Stable identifier
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Endpoint path relative to the API base
    pub path: &'static str,
    /// Navigation group
    pub category: ToolCategory,
    /// Rollout status
    pub status: ToolStatus,
    /// One-line description
    pub summary: &'static str,
    /// File fields the endpoint accepts
    pub files: &'static [FileField],
    /// Scalar fields sent unless overridden or removed
    pub defaults: &'static [(&'static str, &'static str)],
    /// Label for the result link when the response names no file
    pub default_filename: &'static str,
}

const X264: [(&str, &str); 2] = [("crf", "18"), ("preset", "veryfast")];

/// Every tool the API exposes
pub static CATALOG: &[ToolSpec] = &[
    ToolSpec {
        id: "video-trim",
        name: "Trim Video",
        path: "/video/trim/",
        category: ToolCategory::Video,
        status: ToolStatus::Live,
        summary: "Cut the start/end and keep only the best part of your clip.",
        files: &[FileField::one("video")],
        defaults: &[("start", "0"), ("duration", "5"), ("precise", "true")],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-crop",
        name: "Crop Video",
        path: "/video/crop/",
        category: ToolCategory::Video,
        status: ToolStatus::Live,
        summary: "Crop to a region or aspect ratio for TikTok, Reels, YouTube, etc.",
        files: &[FileField::one("video")],
        defaults: &[("aspect", "9:16"), ("mode", "center")],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-resize",
        name: "Resize Video",
        path: "/edit/resize/",
        category: ToolCategory::Video,
        status: ToolStatus::Live,
        summary: "Resize videos to common presets or custom dimensions.",
        files: &[FileField::one("video")],
        defaults: &[
            ("mode", "pad"),
            ("preset", "portrait_1080x1920"),
            ("bg_hex", "000000"),
            ("crf", "18"),
            ("preset_x264", "veryfast"),
            ("copy_audio", "true"),
            ("bitrate_aac", "192k"),
        ],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-speed",
        name: "Change Speed",
        path: "/video/speed/",
        category: ToolCategory::Video,
        status: ToolStatus::Live,
        summary: "Speed up or slow down your video.",
        files: &[FileField::one("video")],
        defaults: &[
            ("factor", "1.25"),
            ("affect_audio", "true"),
            ("preserve_pitch", "true"),
            X264[0],
            X264[1],
        ],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-rotate",
        name: "Rotate Video",
        path: "/video/rotate/",
        category: ToolCategory::Video,
        status: ToolStatus::Live,
        summary: "Fix sideways or upside-down videos with one click.",
        files: &[FileField::one("video")],
        defaults: &[
            ("degrees", "90"),
            ("direction", "clockwise"),
            X264[0],
            X264[1],
        ],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-shuffle",
        name: "Shuffle Clips",
        path: "/shuffle/",
        category: ToolCategory::Video,
        status: ToolStatus::Live,
        summary: "Randomize or reorder segments for quick shuffle edits.",
        files: &[FileField::one("video")],
        defaults: &[("chunk_sec", "2")],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-concat",
        name: "Concat Videos",
        path: "/video/concat/",
        category: ToolCategory::Video,
        status: ToolStatus::Live,
        summary: "Merge multiple clips into one seamless video.",
        files: &[FileField::many("videos")],
        defaults: &[("reencode", "true"), X264[0], X264[1]],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-color",
        name: "Video Color",
        path: "/video/effects/color/",
        category: ToolCategory::Video,
        status: ToolStatus::Live,
        summary: "Apply color filters or LUT-style looks for consistent style.",
        files: &[FileField::one("video")],
        defaults: &[
            ("mode", "cinematic"),
            X264[0],
            X264[1],
            ("copy_audio", "true"),
        ],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-watermark",
        name: "Watermark",
        path: "/video/watermark/",
        category: ToolCategory::Video,
        status: ToolStatus::Live,
        summary: "Overlay a logo/watermark with control over position and opacity.",
        files: &[FileField::one("video"), FileField::one("image")],
        defaults: &[
            ("position", "top-right"),
            ("opacity", "0.8"),
            ("scale_pct", "20"),
            ("margin_x", "24"),
            ("margin_y", "24"),
            X264[0],
            X264[1],
        ],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "audio-normalize",
        name: "Audio Normalize",
        path: "/audio/normalize/",
        category: ToolCategory::Audio,
        status: ToolStatus::Live,
        summary: "Normalize loudness for consistent audio levels.",
        files: &[FileField::one("media")],
        defaults: &[
            ("target_i", "-14"),
            ("target_tp", "-1.0"),
            ("target_lra", "11"),
            ("dual_pass", "true"),
            ("mix_to_mono", "false"),
            X264[0],
            X264[1],
        ],
        default_filename: "output",
    },
    ToolSpec {
        id: "audio-mix",
        name: "Audio Mix",
        path: "/audio/mix/",
        category: ToolCategory::Audio,
        status: ToolStatus::ComingSoon,
        summary: "Combine multiple audio tracks (voice + BGM, etc.).",
        files: &[FileField::one("voice"), FileField::one("music")],
        defaults: &[
            ("voice_gain_db", "0"),
            ("music_gain_db", "-4"),
            ("out_gain_db", "0"),
            ("mode", "ducking"),
            ("ducking_db", "-10"),
            ("duck_attack_ms", "80"),
            ("duck_release_ms", "300"),
            ("duck_threshold_db", "-20"),
            ("voice_offset_sec", "0.0"),
            ("music_offset_sec", "0.0"),
            ("sample_rate", "48000"),
            ("channels", "2"),
        ],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "captions-burn",
        name: "Captions Burn-in",
        path: "/captions/burn/",
        category: ToolCategory::Captions,
        status: ToolStatus::ComingSoon,
        summary: "Burn SRT/VTT subtitles directly into your video.",
        files: &[FileField::one("video"), FileField::one("subtitle")],
        defaults: &[
            ("position", "bottom"),
            ("font_size", "36"),
            ("color", "white"),
            ("outline", "2"),
        ],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-overlay-text",
        name: "Text Overlay",
        path: "/overlay/text/",
        category: ToolCategory::Video,
        status: ToolStatus::ComingSoon,
        summary: "Burn arbitrary text onto your video for titles and callouts.",
        files: &[FileField::one("video")],
        defaults: &[
            ("text", "Hello World"),
            ("x", "50"),
            ("y", "100"),
            ("font_size", "48"),
            ("color", "white"),
            ("alignment", "left"),
            ("start", "0"),
        ],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-inpaint-image",
        name: "Image Inpaint",
        path: "/inpaint/image",
        category: ToolCategory::Video,
        status: ToolStatus::ComingSoon,
        summary: "Erase unwanted text or objects from an image.",
        files: &[FileField::one("image")],
        defaults: &[],
        default_filename: "output.png",
    },
    ToolSpec {
        id: "video-inpaint-video",
        name: "Video Inpaint",
        path: "/inpaint/video",
        category: ToolCategory::Video,
        status: ToolStatus::ComingSoon,
        summary: "Erase unwanted objects from video frames using AI.",
        files: &[FileField::one("video")],
        defaults: &[("ocr_langs", "en"), ("fps", "30"), ("device", "cpu")],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "video-stabilize",
        name: "Video Stabilizer",
        path: "/video/stabilize/cv/",
        category: ToolCategory::Video,
        status: ToolStatus::ComingSoon,
        summary: "Stabilize shaky footage for smoother viewing.",
        files: &[FileField::one("video")],
        defaults: &[
            ("smoothing_radius", "30"),
            ("max_corners", "200"),
            ("quality_level", "0.01"),
            ("min_distance", "30"),
            ("border_mode", "reflect"),
            ("crop", "true"),
            ("scale", "1.0"),
            X264[0],
            X264[1],
        ],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "audio-denoise",
        name: "Audio Denoise",
        path: "/audio/denoise/",
        category: ToolCategory::Audio,
        status: ToolStatus::ComingSoon,
        summary: "Reduce background noise and hiss from recordings.",
        files: &[FileField::one("media")],
        defaults: &[
            ("method", "afftdn"),
            ("strength", "20"),
            ("keep_video", "true"),
        ],
        default_filename: "output",
    },
    ToolSpec {
        id: "audio-transcribe",
        name: "Transcribe Audio",
        path: "/transcribe/",
        category: ToolCategory::Audio,
        status: ToolStatus::ComingSoon,
        summary: "Transcribe speech audio into text.",
        files: &[FileField::one("media")],
        defaults: &[("model_size", "base")],
        default_filename: "output",
    },
    ToolSpec {
        id: "captions-translate",
        name: "Caption Translate",
        path: "/captions/translate/",
        category: ToolCategory::Captions,
        status: ToolStatus::ComingSoon,
        summary: "Translate captions into other languages.",
        files: &[FileField::one("subtitle")],
        defaults: &[
            ("target_lang", "en"),
            ("format", "srt"),
            ("preserve_timing", "true"),
        ],
        default_filename: "output.mp4",
    },
    ToolSpec {
        id: "detect-scenes",
        name: "Scene Detection",
        path: "/detect/scenes/",
        category: ToolCategory::Video,
        status: ToolStatus::ComingSoon,
        summary: "Find scene cuts and export thumbnails and timecodes.",
        files: &[FileField::one("video")],
        defaults: &[
            ("method", "ffmpeg"),
            ("threshold", "0.4"),
            ("min_scene_len", "0.5"),
            ("thumbnails", "true"),
            ("max_thumbs", "100"),
        ],
        default_filename: "output.mp4",
    },
];

/// Returns the full tool catalog
#[must_use]
pub fn catalog() -> &'static [ToolSpec] {
    CATALOG
}

/// Looks up a tool by id
#[must_use]
pub fn find(id: &str) -> Option<&'static ToolSpec> {
    CATALOG.iter().find(|t| t.id == id)
}

/// Tools in one category, in catalog order
pub fn by_category(category: ToolCategory) -> impl Iterator<Item = &'static ToolSpec> {
    CATALOG.iter().filter(move |t| t.category == category)
}

impl ToolSpec {
    /// Looks up the accepted file field called `name`
    #[must_use]
    pub fn file_field(&self, name: &str) -> Option<&FileField> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// A file attached to a [`ToolRequest`]
#[derive(Debug, Clone)]
pub struct FilePart {
    field: String,
    filename: String,
    data: Bytes,
}

impl FilePart {
    /// Form field the file is sent under
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Filename sent with the part
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a zero-byte file
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Size of the slices file contents are streamed in when progress is tracked
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Whole percentage of `sent` out of `total`, rounded to nearest.
///
/// An empty upload counts as complete.
#[must_use]
pub fn upload_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = u128::from(sent.min(total));
    let total = u128::from(total);
    ((sent * 100 + total / 2) / total) as u8
}

#[derive(Debug)]
struct UploadTracker {
    sent: AtomicU64,
    total: u64,
    sink: Arc<watch::Sender<u8>>,
}

impl UploadTracker {
    fn advance(&self, n: usize) {
        let n = n as u64;
        let sent = self.sent.fetch_add(n, Ordering::Relaxed) + n;
        let pct = upload_percent(sent, self.total);
        // never moves backwards
        self.sink.send_if_modified(|p| {
            if pct > *p {
                *p = pct;
                true
            } else {
                false
            }
        });
    }
}

fn tracked_body(data: Bytes, tracker: Arc<UploadTracker>) -> reqwest::Body {
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|at| data.slice(at..(at + UPLOAD_CHUNK_SIZE).min(data.len())))
        .collect();
    let stream = futures::stream::iter(chunks).map(move |chunk| {
        tracker.advance(chunk.len());
        Ok::<_, std::io::Error>(chunk)
    });
    reqwest::Body::wrap_stream(stream)
}

/// One submission to a processing endpoint
///
/// Starts from the tool's defaults. Consumed when sent.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    spec: &'static ToolSpec,
    files: Vec<FilePart>,
    params: Vec<(String, String)>,
    progress: Option<Arc<watch::Sender<u8>>>,
}

impl ToolRequest {
    /// Creates a request for `spec`, seeded with its default scalar values
    #[must_use]
    pub fn new(spec: &'static ToolSpec) -> Self {
        Self {
            spec,
            files: Vec::new(),
            params: spec
                .defaults
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            progress: None,
        }
    }

    /// Creates a request for the catalog tool `id`
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown id.
    pub fn for_tool(id: &str) -> Result<Self, MediaToolsError> {
        find(id)
            .map(Self::new)
            .ok_or_else(|| MediaToolsError::Config(format!("Unknown tool: {id}")))
    }

    /// Attaches in-memory file contents under `field`
    #[must_use]
    pub fn file(
        mut self,
        field: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.files.push(FilePart {
            field: field.into(),
            filename: filename.into(),
            data: data.into(),
        });
        self
    }

    /// Reads `path` and attaches it under `field`, named after the file
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read.
    pub async fn file_from_path(
        self,
        field: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, MediaToolsError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(self.file(field, filename, data))
    }

    /// Sets a scalar field, replacing a default or earlier value
    ///
    /// Numbers and booleans are sent in their `Display` form (`5`, `true`).
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Display) -> Self {
        let name = name.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    /// Sets a scalar field when `value` is `Some`, removes it otherwise
    #[must_use]
    pub fn param_opt(self, name: impl Into<String>, value: Option<impl Display>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self.without(name),
        }
    }

    /// Removes a scalar field, including a default
    #[must_use]
    pub fn without(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.params.retain(|(k, _)| *k != name);
        self
    }

    /// Reports upload progress on `sink` as a whole percentage, 0 to 100.
    ///
    /// The value is reset to 0 when the form is built, rises as file bytes are
    /// handed to the transport and is set to 100 once the endpoint answers.
    #[must_use]
    pub fn with_upload_progress(mut self, sink: watch::Sender<u8>) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    pub(crate) fn progress_sink(&self) -> Option<Arc<watch::Sender<u8>>> {
        self.progress.as_ref().map(Arc::clone)
    }

    /// The tool this request targets
    #[must_use]
    pub const fn spec(&self) -> &'static ToolSpec {
        self.spec
    }

    /// Scalar fields in send order
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Value of a scalar field
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attached files in send order
    #[must_use]
    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    /// Checks the attached files against the tool's file-field contract.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a required field is missing, a field is
    /// not accepted by the endpoint, or a single-file field is given several files.
    pub fn validate(&self) -> Result<(), MediaToolsError> {
        for part in &self.files {
            if self.spec.file_field(&part.field).is_none() {
                let accepted: Vec<&str> = self.spec.files.iter().map(|f| f.name).collect();
                return Err(MediaToolsError::Config(format!(
                    "{} does not accept a file field named {:?} (expected one of {accepted:?})",
                    self.spec.id, part.field
                )));
            }
        }

        for field in self.spec.files {
            let count = self.files.iter().filter(|p| p.field == field.name).count();
            if field.required && count == 0 {
                return Err(MediaToolsError::Config(format!(
                    "{} requires a file in field {:?}",
                    self.spec.id, field.name
                )));
            }
            if !field.multiple && count > 1 {
                return Err(MediaToolsError::Config(format!(
                    "{} accepts a single file in field {:?}, got {count}",
                    self.spec.id, field.name
                )));
            }
        }

        Ok(())
    }

    /// Validates and converts the request into a multipart form
    ///
    /// # Errors
    ///
    /// See [`ToolRequest::validate`].
    pub fn into_form(self) -> Result<Form, MediaToolsError> {
        self.validate()?;

        let tracker = self.progress.map(|sink| {
            sink.send_replace(0);
            Arc::new(UploadTracker {
                sent: AtomicU64::new(0),
                total: self.files.iter().map(|p| p.data.len() as u64).sum(),
                sink,
            })
        });

        let mut form = Form::new();
        for part in self.files {
            let len = part.data.len() as u64;
            let body = match &tracker {
                Some(t) => tracked_body(part.data, Arc::clone(t)),
                None => reqwest::Body::from(part.data),
            };
            form = form.part(
                part.field,
                Part::stream_with_length(body, len).file_name(part.filename),
            );
        }
        for (name, value) in self.params {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn trim() -> &'static ToolSpec {
        find("video-trim").unwrap()
    }

    #[test]
    fn catalog_ids_and_paths_unique() {
        let ids: HashSet<_> = catalog().iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), catalog().len());

        let paths: HashSet<_> = catalog().iter().map(|t| t.path).collect();
        assert_eq!(paths.len(), catalog().len());

        for t in catalog() {
            assert!(t.path.starts_with('/'), "{} path must be absolute", t.id);
            assert!(!t.files.is_empty(), "{} must take at least one file", t.id);
        }
    }

    #[test]
    fn field_names_mirror_remote_contract() {
        assert_eq!(find("audio-normalize").unwrap().files[0].name, "media");
        assert_eq!(find("video-trim").unwrap().files[0].name, "video");
        assert!(find("video-concat").unwrap().files[0].multiple);
        assert_eq!(find("video-resize").unwrap().path, "/edit/resize/");
        let mix: Vec<_> = find("audio-mix").unwrap().files.iter().map(|f| f.name).collect();
        assert_eq!(mix, ["voice", "music"]);
    }

    #[test]
    fn by_category_filters() {
        assert!(by_category(ToolCategory::Captions).all(|t| t.category == ToolCategory::Captions));
        assert_eq!(by_category(ToolCategory::Captions).count(), 2);
        assert_eq!(by_category(ToolCategory::System).count(), 0);
    }

    #[test]
    fn defaults_seeded_and_overridable() {
        let req = ToolRequest::new(trim()).param("duration", 12.5).param("precise", false);
        assert_eq!(req.get("start"), Some("0"));
        assert_eq!(req.get("duration"), Some("12.5"));
        assert_eq!(req.get("precise"), Some("false"));
        assert_eq!(req.params().len(), 3);
    }

    #[test]
    fn param_opt_none_removes_default() {
        let req = ToolRequest::for_tool("video-crop")
            .unwrap()
            .param_opt("aspect", None::<&str>)
            .param_opt("x", Some(10));
        assert_eq!(req.get("aspect"), None);
        assert_eq!(req.get("x"), Some("10"));
    }

    #[test]
    fn unknown_tool_rejected() {
        assert!(matches!(
            ToolRequest::for_tool("video-explode"),
            Err(MediaToolsError::Config(_))
        ));
    }

    #[test]
    fn missing_required_file_rejected() {
        let req = ToolRequest::for_tool("video-watermark")
            .unwrap()
            .file("video", "in.mp4", &b"v"[..]);
        match req.validate() {
            Err(MediaToolsError::Config(msg)) => assert!(msg.contains("\"image\"")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_field_name_rejected() {
        let req = ToolRequest::for_tool("audio-normalize")
            .unwrap()
            .file("video", "in.wav", &b"a"[..]);
        match req.validate() {
            Err(MediaToolsError::Config(msg)) => assert!(msg.contains("media")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn single_field_rejects_two_files() {
        let req = ToolRequest::new(trim())
            .file("video", "a.mp4", &b"a"[..])
            .file("video", "b.mp4", &b"b"[..]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn multiple_field_accepts_many() {
        let req = ToolRequest::for_tool("video-concat")
            .unwrap()
            .file("videos", "a.mp4", &b"a"[..])
            .file("videos", "b.mp4", &b"b"[..])
            .file("videos", "c.mp4", &b"c"[..]);
        assert!(req.validate().is_ok());
        assert_eq!(req.files().len(), 3);
        assert!(req.into_form().is_ok());
    }

    #[tokio::test]
    async fn file_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        tokio::fs::write(&path, b"fake video").await.unwrap();

        let req = ToolRequest::new(trim())
            .file_from_path("video", &path)
            .await
            .unwrap();
        assert_eq!(req.files()[0].filename(), "clip.mp4");
        assert_eq!(req.files()[0].len(), 10);
    }

    #[tokio::test]
    async fn file_from_missing_path_is_io_error() {
        let res = ToolRequest::new(trim())
            .file_from_path("video", "/definitely/not/here.mp4")
            .await;
        assert!(matches!(res, Err(MediaToolsError::Io(_))));
    }

    #[test]
    fn upload_percent_rounds_and_clamps() {
        assert_eq!(upload_percent(0, 0), 100);
        assert_eq!(upload_percent(0, 200), 0);
        assert_eq!(upload_percent(1, 200), 1);
        assert_eq!(upload_percent(99, 200), 50);
        assert_eq!(upload_percent(200, 200), 100);
        assert_eq!(upload_percent(500, 200), 100);
        assert_eq!(upload_percent(u64::MAX / 2, u64::MAX), 50);
    }

    #[test]
    fn tracked_body_reports_each_chunk() {
        let (tx, rx) = watch::channel(0u8);
        let data = Bytes::from(vec![7u8; UPLOAD_CHUNK_SIZE * 2 + 10]);
        let tracker = Arc::new(UploadTracker {
            sent: AtomicU64::new(0),
            total: data.len() as u64,
            sink: Arc::new(tx),
        });

        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|at| data.slice(at..(at + UPLOAD_CHUNK_SIZE).min(data.len())))
            .collect();
        assert_eq!(chunks.len(), 3);

        tracker.advance(chunks[0].len());
        let first = *rx.borrow();
        assert!(first > 0 && first < 100, "got {first}");
        tracker.advance(chunks[1].len());
        assert!(*rx.borrow() > first);
        tracker.advance(chunks[2].len());
        assert_eq!(*rx.borrow(), 100);

        let body = tracked_body(Bytes::from_static(b"abc"), Arc::clone(&tracker));
        assert!(body.as_bytes().is_none());
    }

    #[test]
    fn into_form_resets_progress() {
        let (tx, rx) = watch::channel(42u8);
        let req = ToolRequest::new(trim())
            .file("video", "a.mp4", &b"abc"[..])
            .with_upload_progress(tx);
        assert!(req.progress_sink().is_some());
        assert!(req.into_form().is_ok());
        assert_eq!(*rx.borrow(), 0);
    }
}
