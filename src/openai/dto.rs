use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::{Problems, Validate};

use super::services::MAX_FILES_PER_REQUEST;

#[derive(Debug, Clone, Deserialize)]
pub struct SourceFile {
    pub file_name: String,
    /// Standard base64 of the UTF-8 file contents.
    pub base64: String,
}

/// Either a batch under `files` or one file given inline.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GenerateRequest {
    Batch {
        files: Vec<SourceFile>,
        #[serde(default)]
        model: Option<String>,
    },
    Single {
        file_name: String,
        base64: String,
        #[serde(default)]
        model: Option<String>,
    },
}

impl GenerateRequest {
    pub fn into_parts(self) -> (Vec<SourceFile>, Option<String>) {
        match self {
            Self::Batch { files, model } => (files, model),
            Self::Single {
                file_name,
                base64,
                model,
            } => (vec![SourceFile { file_name, base64 }], model),
        }
    }

    fn files(&self) -> Vec<&str> {
        match self {
            Self::Batch { files, .. } => files.iter().map(|f| f.file_name.as_str()).collect(),
            Self::Single { file_name, .. } => vec![file_name.as_str()],
        }
    }

    fn model(&self) -> Option<&str> {
        match self {
            Self::Batch { model, .. } | Self::Single { model, .. } => model.as_deref(),
        }
    }
}

impl Validate for GenerateRequest {
    fn validate(&self) -> Vec<String> {
        let mut p = Problems::default();
        let names = self.files();
        if names.is_empty() {
            p.add("files", "At least one file is required");
        } else if names.len() > MAX_FILES_PER_REQUEST {
            p.add(
                "files",
                format!("At most {MAX_FILES_PER_REQUEST} files can be documented per request"),
            );
        }
        for (i, name) in names.iter().enumerate() {
            p.check(!name.trim().is_empty(), &format!("files[{i}].file_name"), "must not be empty");
        }
        if let Some(model) = self.model() {
            p.check(!model.trim().is_empty(), "model", "must not be empty");
        }
        p.into_vec()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Error,
}

/// Outcome for one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: String,
    pub language: String,
    pub model_used: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub missing_sections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub results: Vec<FileResult>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub generated_by: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub openai_configured: bool,
    pub default_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_files_per_request: usize,
}
