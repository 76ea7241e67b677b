use serde::{Deserialize, Serialize};

/// Schema tags stamped into every persisted artifact. Bump the suffix when a record's
/// shape changes; readers reject anything they do not recognize.
pub const SOURCE_INDEX_SCHEMA: &str = "source_index/v1";
pub const DRAFT_ANSWERS_SCHEMA: &str = "draft_answers/v1";
pub const APPROVAL_SCHEMA: &str = "approval/v1";
pub const EXPORT_MANIFEST_SCHEMA: &str = "export_manifest/v1";

/// Decision values (after trim + lowercase) that count as approving.
pub const APPROVING_DECISIONS: [&str; 2] = ["approve", "approved"];

/// A persisted, schema-tagged record owned by exactly one run.
pub trait VersionedRecord {
    const SCHEMA: &'static str;

    fn schema(&self) -> &str;
    fn run_id(&self) -> &str;
    /// `(field name, RFC3339 value)` of the record's creation timestamp.
    fn stamped_at(&self) -> (&'static str, &str);
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionnaireItem {
    pub question_id: String,
    pub question: String,
}

/// One non-blank line of an ingested evidence file; the atomic unit of citation.
///
/// `source_file` is the stored (renamed) file name, e.g. `01_policy.md`.
/// Line numbers are 1-based positions in the original file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceChunk {
    pub source_file: String,
    pub line_start: u32,
    pub line_end: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceFile {
    pub source_file: String,
    pub original_name: String,
    pub sha256: String,
    pub bytes: u64,
    pub chunk_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceIndex {
    pub schema: String,
    pub run_id: String,
    pub created_at: String, // RFC3339
    pub chunk_count: u32,
    pub sources: Vec<SourceFile>,
    pub chunks: Vec<SourceChunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub source_file: String,
    pub line_start: u32,
    pub line_end: u32,
    pub quote: String,
}

impl Citation {
    /// `file:start-end`, the form used in the exported answers table.
    pub fn locator(&self) -> String {
        format!("{}:{}-{}", self.source_file, self.line_start, self.line_end)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Draft,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftAnswer {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub status: AnswerStatus,
}

impl DraftAnswer {
    pub fn is_cited(&self) -> bool {
        !self.citations.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateChecks {
    pub all_answers_have_citations: bool,
    pub pending_human_approval: bool,
    pub uncited_question_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftAnswers {
    pub schema: String,
    pub run_id: String,
    pub generated_at: String, // RFC3339
    pub answers: Vec<DraftAnswer>,
    pub gate_checks: GateChecks,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub question_id: String,
    /// Normalized: trimmed and lowercased.
    pub decision: String,
    pub notes: String,
}

impl Decision {
    pub fn is_approving(&self) -> bool {
        APPROVING_DECISIONS.contains(&self.decision.as_str())
    }
}

/// Written only when every question resolved to an approving decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Approval {
    pub schema: String,
    pub run_id: String,
    pub reviewer: String,
    pub reviewed_at: String, // RFC3339
    pub all_approved: bool,
    pub approvals: Vec<Decision>,
}

/// Both flags are always true: an export that would carry a false gate is never produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportGates {
    pub all_cited: bool,
    pub human_approved: bool,
}

impl ExportGates {
    pub fn passed() -> Self {
        Self {
            all_cited: true,
            human_approved: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportFileEntry {
    pub rel_path: String,
    pub sha256: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportManifest {
    pub schema: String,
    pub run_id: String,
    pub exported_at: String, // RFC3339
    pub reviewer: String,
    pub approval_timestamp: String,
    pub answer_count: u32,
    pub gates: ExportGates,
    pub files: Vec<ExportFileEntry>,
}

macro_rules! versioned {
    ($ty:ty, $schema:expr, $stamp:ident) => {
        impl VersionedRecord for $ty {
            const SCHEMA: &'static str = $schema;

            fn schema(&self) -> &str {
                &self.schema
            }

            fn run_id(&self) -> &str {
                &self.run_id
            }

            fn stamped_at(&self) -> (&'static str, &str) {
                (stringify!($stamp), &self.$stamp)
            }
        }
    };
}

versioned!(SourceIndex, SOURCE_INDEX_SCHEMA, created_at);
versioned!(DraftAnswers, DRAFT_ANSWERS_SCHEMA, generated_at);
versioned!(Approval, APPROVAL_SCHEMA, reviewed_at);
versioned!(ExportManifest, EXPORT_MANIFEST_SCHEMA, exported_at);

/// Where a run sits in `created -> drafted -> approved -> exported`, derived from which
/// artifacts exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Created,
    Drafted,
    Approved,
    Exported,
}

impl RunStage {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStage::Created => "created",
            RunStage::Drafted => "drafted",
            RunStage::Approved => "approved",
            RunStage::Exported => "exported",
        }
    }
}
