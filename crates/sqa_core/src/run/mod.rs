use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{
    Approval, DraftAnswers, ExportManifest, QuestionnaireItem, RunStage, SourceIndex,
    VersionedRecord,
};
use crate::error::AppError;
use crate::ingest::questionnaire_csv::{parse_questionnaire_csv, write_questionnaire_csv};
use crate::normalize::timestamps::check_rfc3339;
use crate::store::{join_key, BlobStore};

pub const QUESTIONNAIRE_FILE: &str = "questionnaire.csv";
pub const SOURCES_DIR: &str = "sources";
pub const SOURCE_INDEX_FILE: &str = "source_index.json";
pub const DRAFT_ANSWERS_FILE: &str = "draft_answers.json";
pub const APPROVAL_FILE: &str = "approval.json";
pub const EXPORT_DIR: &str = "export_package";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Validate an operator-supplied run identifier: letters, digits, `-` and `_` only.
pub fn sanitize_run_id(raw: &str) -> Result<String, AppError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::input("RUN_ID_INVALID", "Run id is required"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::input(
            "RUN_ID_INVALID",
            "Run id can contain only letters, numbers, dashes, and underscores",
        )
        .with_details(format!("run_id={value}")));
    }
    Ok(value.to_string())
}

/// System of record for runs: owns the persisted layout below `<run_id>/` and the
/// schema checks applied whenever an artifact is read back.
///
/// Holds no state of its own; every call goes to the blob store.
pub struct RunStore<'a> {
    blobs: &'a dyn BlobStore,
}

impl<'a> RunStore<'a> {
    pub fn new(blobs: &'a dyn BlobStore) -> Self {
        Self { blobs }
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs
    }

    pub fn key(&self, run_id: &str, rel: &str) -> String {
        join_key(run_id, rel)
    }

    pub fn exists(&self, run_id: &str) -> Result<bool, AppError> {
        self.blobs.namespace_exists(run_id)
    }

    pub fn require_exists(&self, run_id: &str) -> Result<(), AppError> {
        if !self.exists(run_id)? {
            return Err(AppError::conflict("RUN_NOT_FOUND", "Run does not exist; ingest it first")
                .with_details(format!("run_id={run_id}; location={}", self.blobs.location(run_id))));
        }
        Ok(())
    }

    /// Claim the run identifier. Fails if it was ever used before.
    pub fn create(&self, run_id: &str) -> Result<(), AppError> {
        if !self.blobs.create_namespace(run_id)? {
            return Err(AppError::conflict(
                "RUN_ALREADY_EXISTS",
                "Run already exists; use a new run id",
            )
            .with_details(format!("run_id={run_id}; location={}", self.blobs.location(run_id))));
        }
        Ok(())
    }

    fn get_required(&self, run_id: &str, rel: &str) -> Result<Vec<u8>, AppError> {
        let key = self.key(run_id, rel);
        self.blobs.get(&key)?.ok_or_else(|| {
            AppError::integrity("ARTIFACT_MISSING", format!("Run artifact {rel} is missing"))
                .with_details(format!("location={}", self.blobs.location(&key)))
        })
    }

    pub fn write_questionnaire(
        &self,
        run_id: &str,
        items: &[QuestionnaireItem],
    ) -> Result<(), AppError> {
        let bytes = write_questionnaire_csv(items)?;
        self.blobs.put(&self.key(run_id, QUESTIONNAIRE_FILE), &bytes)
    }

    /// Later stages always read the stored snapshot, never the operator's original file.
    pub fn read_questionnaire(&self, run_id: &str) -> Result<Vec<QuestionnaireItem>, AppError> {
        let bytes = self.get_required(run_id, QUESTIONNAIRE_FILE)?;
        let text = String::from_utf8(bytes).map_err(|e| {
            AppError::integrity("ARTIFACT_DECODE_FAILED", "Stored questionnaire is not UTF-8")
                .with_details(e.to_string())
        })?;
        parse_questionnaire_csv(&text).map_err(|e| {
            AppError::integrity("ARTIFACT_DECODE_FAILED", "Stored questionnaire failed to parse")
                .with_details(e.to_string())
        })
    }

    pub fn read_questionnaire_bytes(&self, run_id: &str) -> Result<Vec<u8>, AppError> {
        self.get_required(run_id, QUESTIONNAIRE_FILE)
    }

    pub fn write_source(&self, run_id: &str, stored_name: &str, bytes: &[u8]) -> Result<(), AppError> {
        self.blobs
            .put(&self.key(run_id, &join_key(SOURCES_DIR, stored_name)), bytes)
    }

    /// Stored evidence as `(relative path below the run, bytes)`, sorted by path.
    pub fn read_sources(&self, run_id: &str) -> Result<Vec<(String, Vec<u8>)>, AppError> {
        let prefix = self.key(run_id, SOURCES_DIR);
        let mut out = Vec::new();
        for key in self.blobs.list(&prefix)? {
            let bytes = self.blobs.get(&key)?.ok_or_else(|| {
                AppError::io("STORE_READ_FAILED", "Listed blob disappeared during read")
                    .with_details(format!("location={}", self.blobs.location(&key)))
            })?;
            let rel = key
                .strip_prefix(&format!("{run_id}/"))
                .unwrap_or(key.as_str())
                .to_string();
            out.push((rel, bytes));
        }
        Ok(out)
    }

    fn save<T: VersionedRecord + Serialize>(
        &self,
        run_id: &str,
        rel: &str,
        record: &T,
    ) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(record).map_err(|e| {
            AppError::io("ARTIFACT_ENCODE_FAILED", format!("Failed to encode {rel}"))
                .with_details(e.to_string())
        })?;
        self.blobs.put(&self.key(run_id, rel), &json)
    }

    fn load<T: VersionedRecord + DeserializeOwned>(
        &self,
        run_id: &str,
        rel: &str,
    ) -> Result<Option<T>, AppError> {
        let key = self.key(run_id, rel);
        let Some(bytes) = self.blobs.get(&key)? else {
            return Ok(None);
        };
        let record: T = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::integrity("ARTIFACT_DECODE_FAILED", format!("Failed to decode {rel}"))
                .with_details(format!("location={}; err={}", self.blobs.location(&key), e))
        })?;
        if record.schema() != T::SCHEMA {
            return Err(AppError::integrity(
                "ARTIFACT_SCHEMA_MISMATCH",
                format!("{rel} has an unsupported schema"),
            )
            .with_details(format!("expected={}; got={}", T::SCHEMA, record.schema())));
        }
        if record.run_id() != run_id {
            return Err(AppError::integrity(
                "ARTIFACT_RUN_MISMATCH",
                format!("{rel} belongs to a different run"),
            )
            .with_details(format!("expected={run_id}; got={}", record.run_id())));
        }
        let (field, value) = record.stamped_at();
        check_rfc3339(field, value)?;
        Ok(Some(record))
    }

    pub fn save_source_index(&self, index: &SourceIndex) -> Result<(), AppError> {
        self.save(&index.run_id, SOURCE_INDEX_FILE, index)
    }

    pub fn load_source_index(&self, run_id: &str) -> Result<SourceIndex, AppError> {
        let index: SourceIndex = self.load(run_id, SOURCE_INDEX_FILE)?.ok_or_else(|| {
            AppError::integrity("ARTIFACT_MISSING", "Run artifact source_index.json is missing")
                .with_details(format!("run_id={run_id}"))
        })?;
        if index.chunk_count as usize != index.chunks.len() {
            return Err(AppError::integrity(
                "SOURCE_INDEX_COUNT_MISMATCH",
                "source_index.json chunk_count does not match its chunks",
            )
            .with_details(format!(
                "chunk_count={}; chunks={}",
                index.chunk_count,
                index.chunks.len()
            )));
        }
        if let Some(bad) = index
            .chunks
            .iter()
            .find(|c| c.line_start == 0 || c.line_end < c.line_start)
        {
            return Err(AppError::integrity(
                "SOURCE_INDEX_SPAN_INVALID",
                "source_index.json contains an invalid line span",
            )
            .with_details(format!(
                "source_file={}; line_start={}; line_end={}",
                bad.source_file, bad.line_start, bad.line_end
            )));
        }
        Ok(index)
    }

    pub fn save_draft(&self, draft: &DraftAnswers) -> Result<(), AppError> {
        self.save(&draft.run_id, DRAFT_ANSWERS_FILE, draft)
    }

    pub fn load_draft(&self, run_id: &str) -> Result<Option<DraftAnswers>, AppError> {
        self.load(run_id, DRAFT_ANSWERS_FILE)
    }

    pub fn save_approval(&self, approval: &Approval) -> Result<(), AppError> {
        self.save(&approval.run_id, APPROVAL_FILE, approval)
    }

    pub fn load_approval(&self, run_id: &str) -> Result<Option<Approval>, AppError> {
        self.load(run_id, APPROVAL_FILE)
    }

    pub fn has_approval(&self, run_id: &str) -> Result<bool, AppError> {
        self.blobs.exists(&self.key(run_id, APPROVAL_FILE))
    }

    pub fn export_key(&self, run_id: &str, rel: &str) -> String {
        self.key(run_id, &join_key(EXPORT_DIR, rel))
    }

    pub fn clear_export(&self, run_id: &str) -> Result<(), AppError> {
        self.blobs.delete_prefix(&self.key(run_id, EXPORT_DIR))
    }

    pub fn put_export_file(&self, run_id: &str, rel: &str, bytes: &[u8]) -> Result<(), AppError> {
        self.blobs.put(&self.export_key(run_id, rel), bytes)
    }

    pub fn save_export_manifest(&self, manifest: &ExportManifest) -> Result<(), AppError> {
        self.save(
            &manifest.run_id,
            &join_key(EXPORT_DIR, MANIFEST_FILE),
            manifest,
        )
    }

    pub fn load_export_manifest(&self, run_id: &str) -> Result<Option<ExportManifest>, AppError> {
        self.load(run_id, &join_key(EXPORT_DIR, MANIFEST_FILE))
    }

    /// Export package contents as `(path relative to the package, bytes)`, sorted by path.
    pub fn read_export_files(&self, run_id: &str) -> Result<Vec<(String, Vec<u8>)>, AppError> {
        let prefix = self.key(run_id, EXPORT_DIR);
        let mut out = Vec::new();
        for key in self.blobs.list(&prefix)? {
            let bytes = self.blobs.get(&key)?.ok_or_else(|| {
                AppError::io("STORE_READ_FAILED", "Listed blob disappeared during read")
                    .with_details(format!("location={}", self.blobs.location(&key)))
            })?;
            let rel = key
                .strip_prefix(&format!("{prefix}/"))
                .unwrap_or(key.as_str())
                .to_string();
            out.push((rel, bytes));
        }
        Ok(out)
    }

    /// Derive the run's position in the stage machine from which artifacts exist.
    pub fn stage(&self, run_id: &str) -> Result<RunStage, AppError> {
        self.require_exists(run_id)?;
        let has = |rel: &str| self.blobs.exists(&self.key(run_id, rel));
        if has(&join_key(EXPORT_DIR, MANIFEST_FILE))? {
            Ok(RunStage::Exported)
        } else if has(APPROVAL_FILE)? {
            Ok(RunStage::Approved)
        } else if has(DRAFT_ANSWERS_FILE)? {
            Ok(RunStage::Drafted)
        } else {
            Ok(RunStage::Created)
        }
    }
}
