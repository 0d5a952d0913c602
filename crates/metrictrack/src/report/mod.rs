//! Templated document reports.
//!
//! A report is produced in four steps: load the template bytes through a
//! [`TemplateSource`], bind a flat [`DataContext`], render with a
//! [`TemplateEngine`], and hand the finished [`Artifact`] to an
//! [`ArtifactSink`]. The sink is only reached when rendering succeeded and
//! produced a non-empty document, so a failed report never leaves a file
//! behind.
//!
//! Generation works on owned record snapshots: the store may change while a
//! template is being loaded without affecting the report in flight.
//!
//! # Example
//!
//! ```no_run
//! use metrictrack::report::{FsArtifactSink, FsTemplateSource, PlaceholderEngine, ReportGenerator};
//! use metrictrack::{MetricRecord, Period};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = ReportGenerator::new(
//!     FsTemplateSource::new("templates"),
//!     PlaceholderEngine::new(),
//!     FsArtifactSink::new("out"),
//! );
//! let record = MetricRecord::new("Выручка", "100", Period::parse("2026-02")?)?;
//! let artifact = generator.generate_single(record).await?;
//! println!("wrote {}", artifact.filename);
//! # Ok(())
//! # }
//! ```

mod engine;
mod sink;
mod source;

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::period::{display_label, official_long_form};
use crate::record::MetricRecord;

pub use engine::PlaceholderEngine;
pub use sink::FsArtifactSink;
pub use source::FsTemplateSource;

/// Default template file name.
pub const DEFAULT_TEMPLATE: &str = "template.txt";

/// Default maximum number of name characters in a report file name.
pub const DEFAULT_MAX_NAME_LEN: usize = 50;

/// Characters that are not allowed in file names on common filesystems.
const UNSAFE_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Flat key-to-text binding passed to the template engine.
pub type DataContext = BTreeMap<String, String>;

/// Errors produced by report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The template could not be loaded.
    #[error("failed to load template '{template}': {message}")]
    TemplateFetch {
        /// Template name.
        template: String,
        /// Description of what went wrong.
        message: String,
    },

    /// A template name tried to leave the templates directory.
    #[error("invalid template name '{0}'")]
    InvalidTemplateName(String),

    /// The engine rejected the template or the data.
    #[error("{}", render_message(.reasons))]
    TemplateRender {
        /// Structured reasons reported by the engine.
        reasons: Vec<String>,
    },

    /// The engine reported success but produced nothing.
    #[error("template rendering produced an empty document")]
    EmptyArtifact,

    /// A summary was requested for no records.
    #[error("no metrics selected for the summary report")]
    EmptySelection,

    /// Two selected records map to the same template key.
    #[error("metrics '{first}' and '{second}' both map to template key '{key}'")]
    SlugCollision {
        /// The shared key.
        key: String,
        /// Name of the first record.
        first: String,
        /// Name of the second record.
        second: String,
    },

    /// A record name has no characters usable in a template key.
    #[error("metric name '{name}' yields an empty template key")]
    EmptySlug {
        /// The record name.
        name: String,
    },

    /// The finished artifact could not be delivered.
    #[error("failed to save report '{filename}': {message}")]
    Delivery {
        /// Artifact file name.
        filename: String,
        /// Description of what went wrong.
        message: String,
    },
}

fn render_message(reasons: &[String]) -> String {
    if reasons.is_empty() {
        "template rendering failed".to_string()
    } else {
        format!("template rendering failed: {}", reasons.join("; "))
    }
}

/// Normalized engine failure: the list of structured reasons, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderFailure {
    /// Human-readable reasons, one per problem found.
    pub reasons: Vec<String>,
}

impl RenderFailure {
    /// A failure with a single reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reasons: vec![reason.into()],
        }
    }
}

impl From<RenderFailure> for ReportError {
    fn from(failure: RenderFailure) -> Self {
        Self::TemplateRender {
            reasons: failure.reasons,
        }
    }
}

/// A finished report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Suggested file name.
    pub filename: String,
    /// Document contents.
    pub bytes: Vec<u8>,
}

/// Loads template bytes by name.
#[async_trait::async_trait]
pub trait TemplateSource: Send + Sync {
    /// Load the named template.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::TemplateFetch`] if the template is unavailable,
    /// or [`ReportError::InvalidTemplateName`] for names the source refuses.
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, ReportError>;
}

/// Renders a template against a data context.
pub trait TemplateEngine: Send + Sync {
    /// Render `template` with `context`.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderFailure`] listing every problem found.
    fn render(&self, template: &[u8], context: &DataContext) -> Result<Vec<u8>, RenderFailure>;
}

/// Delivers finished artifacts to the user.
#[async_trait::async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Offer the artifact under its file name.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Delivery`] if the artifact cannot be delivered.
    async fn offer(&self, artifact: &Artifact) -> Result<(), ReportError>;
}

/// Produces single-metric and summary reports.
#[derive(Debug)]
pub struct ReportGenerator<S, E, K> {
    source: S,
    engine: E,
    sink: K,
    default_template: String,
    max_name_len: usize,
    today: Option<NaiveDate>,
}

impl<S, E, K> ReportGenerator<S, E, K>
where
    S: TemplateSource,
    E: TemplateEngine,
    K: ArtifactSink,
{
    /// Create a generator with default template name and file name limits.
    #[must_use]
    pub fn new(source: S, engine: E, sink: K) -> Self {
        Self {
            source,
            engine,
            sink,
            default_template: DEFAULT_TEMPLATE.to_string(),
            max_name_len: DEFAULT_MAX_NAME_LEN,
            today: None,
        }
    }

    /// Use a different default template.
    #[must_use]
    pub fn with_default_template(mut self, name: impl Into<String>) -> Self {
        self.default_template = name.into();
        self
    }

    /// Limit the record name part of file names to `len` characters.
    #[must_use]
    pub fn with_max_name_len(mut self, len: usize) -> Self {
        self.max_name_len = len;
        self
    }

    /// Fix the date used for `current_date` instead of reading the clock.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The sink artifacts are delivered to.
    #[must_use]
    pub fn sink(&self) -> &K {
        &self.sink
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Generate and deliver the report of one record.
    ///
    /// The record's own template is used when set, otherwise the default.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if loading, rendering or delivery fails. No
    /// artifact is delivered in that case.
    pub async fn generate_single(&self, record: MetricRecord) -> Result<Artifact, ReportError> {
        let template = record
            .template
            .clone()
            .unwrap_or_else(|| self.default_template.clone());

        let mut context = DataContext::new();
        context.insert("metric_name".to_string(), record.name.clone());
        context.insert("metric_value".to_string(), record.value.clone());
        context.insert("metric_period".to_string(), display_label(&record.period));
        context.insert(
            "metric_section".to_string(),
            record.section.clone().unwrap_or_default(),
        );
        context.insert("current_date".to_string(), official_long_form(self.today()));

        let filename = single_filename(&record, self.max_name_len, &extension_of(&template));
        self.produce(&template, &context, filename).await
    }

    /// Generate and deliver one combined report for several records.
    ///
    /// Each record contributes `<slug>_value` and `<slug>_period` keys.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::EmptySelection`], [`ReportError::EmptySlug`] or
    /// [`ReportError::SlugCollision`] before any template is loaded if the
    /// selection cannot be bound, or any loading/rendering/delivery error.
    pub async fn generate_summary(
        &self,
        records: Vec<MetricRecord>,
    ) -> Result<Artifact, ReportError> {
        let context = summary_context(&records, self.today())?;
        let filename = format!(
            "Сводный_отчет_{}{}",
            self.today().format("%Y-%m-%d"),
            extension_of(&self.default_template)
        );
        self.produce(&self.default_template, &context, filename)
            .await
    }

    async fn produce(
        &self,
        template: &str,
        context: &DataContext,
        filename: String,
    ) -> Result<Artifact, ReportError> {
        debug!(template, keys = context.len(), "Loading template");
        let bytes = self.source.fetch(template).await?;
        if bytes.is_empty() {
            warn!(template, "Template is empty");
            return Err(ReportError::TemplateFetch {
                template: template.to_string(),
                message: "template is empty".to_string(),
            });
        }

        let rendered = self.engine.render(&bytes, context).map_err(|failure| {
            warn!(template, reasons = ?failure.reasons, "Template rendering failed");
            ReportError::from(failure)
        })?;
        if rendered.is_empty() {
            return Err(ReportError::EmptyArtifact);
        }

        let artifact = Artifact {
            filename,
            bytes: rendered,
        };
        self.sink.offer(&artifact).await?;
        info!(filename = %artifact.filename, bytes = artifact.bytes.len(), "Report generated");
        Ok(artifact)
    }
}

/// Build the data context of a summary report.
///
/// # Errors
///
/// Returns an error for an empty selection, a name without key characters,
/// or two names with the same key.
pub fn summary_context(
    records: &[MetricRecord],
    today: NaiveDate,
) -> Result<DataContext, ReportError> {
    if records.is_empty() {
        return Err(ReportError::EmptySelection);
    }

    let mut owners: HashMap<String, &str> = HashMap::new();
    let mut context = DataContext::new();
    for record in records {
        let slug = slugify(&record.name);
        if slug.is_empty() {
            return Err(ReportError::EmptySlug {
                name: record.name.clone(),
            });
        }
        if let Some(first) = owners.insert(slug.clone(), &record.name) {
            return Err(ReportError::SlugCollision {
                key: slug,
                first: first.to_string(),
                second: record.name.clone(),
            });
        }
        context.insert(format!("{slug}_value"), record.value.clone());
        context.insert(format!("{slug}_period"), display_label(&record.period));
    }
    context.insert("current_date".to_string(), official_long_form(today));
    context.insert("records_count".to_string(), records.len().to_string());
    Ok(context)
}

fn whitespace_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace pattern"))
}

/// Template key of a record name: lowercase, whitespace runs become `_`, and
/// everything outside `[a-z0-9_]` is dropped.
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    whitespace_regex()
        .replace_all(&lowered, "_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// Replace filesystem-unsafe characters with `_`.
#[must_use]
pub fn sanitize_filename(text: &str) -> String {
    text.chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// File name of a single-record report, e.g. `Отчет_Выручка_2026-02.txt`.
#[must_use]
pub fn single_filename(record: &MetricRecord, max_name_len: usize, extension: &str) -> String {
    let name: String = sanitize_filename(&record.name)
        .chars()
        .take(max_name_len)
        .collect();
    format!("Отчет_{name}_{}{extension}", record.period)
}

/// The `.ext` suffix of a template name, or an empty string.
///
/// Built from the parsed extension rather than sliced from the name, since
/// `Path` ignores trailing separators.
fn extension_of(template: &str) -> String {
    Path::new(template)
        .extension()
        .and_then(OsStr::to_str)
        .map_or_else(String::new, |ext| format!(".{}", sanitize_filename(ext)))
}
