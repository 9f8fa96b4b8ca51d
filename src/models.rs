//! Data models for outline requests and their exported artifacts.
//!
//! This module defines the core data structures used throughout the application:
//! - [`OutlineRequest`]: a validated generation request built from the form
//! - [`ProductFormat`], [`Tone`], [`Backend`]: the enumerated form choices
//! - [`GeneratedDocument`]: one successful generation, keyed by slug + timestamp
//! - [`ExportArtifactSet`]: the three exported files belonging to one generation

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::utils::{file_timestamp, slugify};

/// Prefix shared by every exported filename.
pub const FILE_PREFIX: &str = "seedling";

/// A validated request for one generation action.
///
/// Constructed from the submitted form at the moment "Generate" is invoked
/// and discarded once the prompt has been built and the backend selected.
#[derive(Debug, Clone)]
pub struct OutlineRequest {
    /// The product idea. Guaranteed non-empty after validation.
    pub idea: String,
    /// Who the product is for. May be empty.
    pub audience: String,
    /// The presentation format the outline should target.
    pub format: ProductFormat,
    /// The voice the outline should be written in.
    pub tone: Tone,
    /// Which generation backend to send the prompt to.
    pub backend: Backend,
    /// API key for the hosted backend. Present iff `backend` is hosted.
    pub api_key: Option<String>,
}

/// The ten presentation formats offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ProductFormat {
    #[serde(rename = "eBook")]
    Ebook,
    #[serde(rename = "Video Course")]
    VideoCourse,
    #[serde(rename = "Workshop Outline")]
    WorkshopOutline,
    #[serde(rename = "Printable PDF Guide")]
    PrintableGuide,
    #[serde(rename = "Notion Template")]
    NotionTemplate,
    #[serde(rename = "Email Series")]
    EmailSeries,
    #[serde(rename = "Funnel Script")]
    FunnelScript,
    #[serde(rename = "Web App (MVP)")]
    WebAppMvp,
    #[serde(rename = "Interactive Quiz")]
    InteractiveQuiz,
    #[serde(rename = "Social Media Toolkit")]
    SocialMediaToolkit,
}

impl ProductFormat {
    pub const ALL: [ProductFormat; 10] = [
        ProductFormat::Ebook,
        ProductFormat::VideoCourse,
        ProductFormat::WorkshopOutline,
        ProductFormat::PrintableGuide,
        ProductFormat::NotionTemplate,
        ProductFormat::EmailSeries,
        ProductFormat::FunnelScript,
        ProductFormat::WebAppMvp,
        ProductFormat::InteractiveQuiz,
        ProductFormat::SocialMediaToolkit,
    ];

    /// The label shown in the form, also the wire value of the form field.
    pub fn label(&self) -> &'static str {
        match self {
            ProductFormat::Ebook => "eBook",
            ProductFormat::VideoCourse => "Video Course",
            ProductFormat::WorkshopOutline => "Workshop Outline",
            ProductFormat::PrintableGuide => "Printable PDF Guide",
            ProductFormat::NotionTemplate => "Notion Template",
            ProductFormat::EmailSeries => "Email Series",
            ProductFormat::FunnelScript => "Funnel Script",
            ProductFormat::WebAppMvp => "Web App (MVP)",
            ProductFormat::InteractiveQuiz => "Interactive Quiz",
            ProductFormat::SocialMediaToolkit => "Social Media Toolkit",
        }
    }
}

impl fmt::Display for ProductFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The three voice styles offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Tone {
    Conversational,
    Academic,
    #[serde(rename = "Story-driven")]
    StoryDriven,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Conversational, Tone::Academic, Tone::StoryDriven];

    pub fn label(&self) -> &'static str {
        match self {
            Tone::Conversational => "Conversational",
            Tone::Academic => "Academic",
            Tone::StoryDriven => "Story-driven",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which text-generation service a prompt is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// An Ollama-compatible host on the local machine.
    Local,
    /// A hosted completion API, authenticated with an operator-supplied key.
    Hosted,
}

impl Backend {
    pub fn label(&self) -> &'static str {
        match self {
            Backend::Local => "Local (Ollama)",
            Backend::Hosted => "Hosted (API)",
        }
    }
}

/// One successful generation, immutable after construction.
///
/// The slug + timestamp pair uniquely names the generation's export set.
/// Timestamps have second resolution, so two generations started within
/// the same second would collide; the single-operator surface makes this
/// acceptable.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// The backend's full response, exactly as returned.
    pub raw_text: String,
    /// Filesystem-safe identifier derived from the idea text.
    pub slug: String,
    /// Local creation time, formatted `%Y-%m-%d_%H-%M-%S`.
    pub timestamp: String,
}

impl GeneratedDocument {
    /// Build a document from a backend response, deriving the slug from the
    /// idea text and stamping it with the current local time.
    pub fn new(raw_text: String, idea: &str) -> Self {
        GeneratedDocument {
            raw_text,
            slug: slugify(idea),
            timestamp: file_timestamp(),
        }
    }

    /// Filename for one export format, e.g. `seedling_my_idea_outline_2026-08-23_10-00-00.txt`.
    pub fn artifact_name(&self, ext: &str) -> String {
        format!(
            "{}_{}_outline_{}.{}",
            FILE_PREFIX, self.slug, self.timestamp, ext
        )
    }
}

/// The filenames of one generation's exported files, all within a single
/// export directory. Created by the exporter and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ExportArtifactSet {
    /// Directory every artifact lives in.
    pub export_dir: PathBuf,
    pub txt_name: String,
    pub pdf_name: String,
    pub md_name: String,
    pub slug: String,
    pub timestamp: String,
}

impl ExportArtifactSet {
    /// The three artifact filenames in presentation order (txt, pdf, md).
    pub fn file_names(&self) -> [&str; 3] {
        [&self.txt_name, &self.pdf_name, &self.md_name]
    }

    /// Path of one named artifact inside the export directory.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.export_dir.join(name)
    }

    /// Filename of the optional zip bundle for this set.
    pub fn bundle_name(&self) -> String {
        format!("{}_{}_bundle.zip", FILE_PREFIX, self.slug)
    }
}

impl ExportArtifactSet {
    /// Reconstruct the set a given slug + timestamp pair names, without
    /// touching disk. Used when the bundle is requested after generation.
    pub fn from_parts(export_dir: &Path, slug: &str, timestamp: &str) -> Self {
        let name = |ext: &str| format!("{FILE_PREFIX}_{slug}_outline_{timestamp}.{ext}");
        ExportArtifactSet {
            export_dir: export_dir.to_path_buf(),
            txt_name: name("txt"),
            pdf_name: name("pdf"),
            md_name: name("md"),
            slug: slug.to_string(),
            timestamp: timestamp.to_string(),
        }
    }
}

/// Build the expected artifact set for a document without touching disk.
pub fn artifact_set_for(doc: &GeneratedDocument, export_dir: &Path) -> ExportArtifactSet {
    ExportArtifactSet::from_parts(export_dir, &doc.slug, &doc.timestamp)
}
