use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{config::OpenAiConfig, error::AppError, state::AppState};

use super::{
    client::{ChatRequest, CompletionClient},
    dto::{BatchReport, FileResult, FileStatus, HealthReport, SourceFile},
    language, prompt,
};

pub const MAX_FILES_PER_REQUEST: usize = 5;

pub struct DocumentationService {
    client: Arc<dyn CompletionClient>,
    config: OpenAiConfig,
}

/// A file that decoded cleanly and is ready to be sent to the model.
struct Decoded {
    content: String,
    language: String,
}

fn decode(file: &SourceFile) -> Result<Decoded, String> {
    let bytes = STANDARD
        .decode(file.base64.trim())
        .map_err(|_| "Invalid base64 content".to_string())?;
    let content = String::from_utf8(bytes).map_err(|_| "File is not valid UTF-8 text".to_string())?;
    if content.trim().is_empty() {
        return Err("File is empty".into());
    }
    let language = language::detect(&file.file_name, &content);
    Ok(Decoded { content, language })
}

impl DocumentationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            client: state.completions.clone(),
            config: state.config.openai.clone(),
        }
    }

    fn ensure_configured(&self) -> Result<(), AppError> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(AppError::ServiceUnavailable("OpenAI API key not configured".into()))
        }
    }

    pub fn health(&self) -> Result<HealthReport, AppError> {
        self.ensure_configured()?;
        Ok(HealthReport {
            openai_configured: true,
            default_model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            max_files_per_request: MAX_FILES_PER_REQUEST,
        })
    }

    /// Documents each file in order. A failing file yields an error entry and
    /// the rest of the batch carries on.
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn generate_batch(
        &self,
        files: Vec<SourceFile>,
        model: Option<String>,
        generated_by: Uuid,
    ) -> Result<BatchReport, AppError> {
        self.ensure_configured()?;
        if files.is_empty() || files.len() > MAX_FILES_PER_REQUEST {
            return Err(AppError::BadRequest(format!(
                "Between 1 and {MAX_FILES_PER_REQUEST} files are required"
            )));
        }
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.config.model.clone());

        let mut results = Vec::with_capacity(files.len());
        for file in &files {
            results.push(self.generate_one(file, &model).await);
        }

        let succeeded = results.iter().filter(|r| r.status == FileStatus::Success).count();
        let failed = results.len() - succeeded;
        info!(succeeded, failed, %generated_by, "documentation batch finished");
        Ok(BatchReport {
            total: results.len(),
            results,
            succeeded,
            failed,
            generated_by,
        })
    }

    async fn generate_one(&self, file: &SourceFile, model: &str) -> FileResult {
        let failure = |language: String, error: String| {
            warn!(file = %file.file_name, %error, "documentation failed");
            FileResult {
                file: file.file_name.clone(),
                language,
                model_used: model.to_string(),
                status: FileStatus::Error,
                documentation: None,
                missing_sections: Vec::new(),
                error: Some(error),
            }
        };

        let decoded = match decode(file) {
            Ok(d) => d,
            Err(error) => {
                let language = language::extension(&file.file_name).unwrap_or_else(|| "unknown".into());
                return failure(language, error);
            }
        };

        let request = ChatRequest {
            model: model.to_string(),
            system: prompt::system_prompt(&decoded.language),
            user: prompt::structured_prompt(&decoded.content, &file.file_name, &decoded.language),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        match self.client.complete(&request).await {
            Ok(content) => {
                let normalized = prompt::normalize(&content, &file.file_name);
                if !normalized.missing_sections.is_empty() {
                    warn!(file = %file.file_name, missing = ?normalized.missing_sections, "model skipped sections");
                }
                FileResult {
                    file: file.file_name.clone(),
                    language: decoded.language,
                    model_used: model.to_string(),
                    status: FileStatus::Success,
                    documentation: Some(normalized.documentation),
                    missing_sections: normalized.missing_sections,
                    error: None,
                }
            }
            Err(err) => failure(decoded.language, format!("Failed to generate documentation: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state, test_state_with_completions, FakeCompletions};

    fn encoded(name: &str, content: &str) -> SourceFile {
        SourceFile {
            file_name: name.into(),
            base64: STANDARD.encode(content),
        }
    }

    #[test]
    fn decode_rejects_bad_input() {
        let bad = SourceFile {
            file_name: "a.py".into(),
            base64: "%%%".into(),
        };
        assert_eq!(decode(&bad).err().as_deref(), Some("Invalid base64 content"));

        let binary = SourceFile {
            file_name: "a.bin".into(),
            base64: STANDARD.encode([0xff, 0xfe, 0x00]),
        };
        assert_eq!(decode(&binary).err().as_deref(), Some("File is not valid UTF-8 text"));
        assert_eq!(decode(&encoded("a.py", " \n\t")).err().as_deref(), Some("File is empty"));

        let ok = decode(&encoded("run", "#!/usr/bin/env python\nprint(1)")).unwrap();
        assert_eq!(ok.language, "py");
    }

    #[tokio::test]
    async fn one_failure_does_not_sink_the_batch() {
        let fake = FakeCompletions::default();
        let state = test_state_with_completions(fake.clone());
        let report = DocumentationService::new(&state)
            .generate_batch(
                vec![
                    encoded("main.rs", "fn main() {}"),
                    encoded("empty.py", ""),
                    encoded("app.js", "console.log(1)"),
                ],
                None,
                Uuid::nil(),
            )
            .await
            .unwrap();

        assert_eq!((report.total, report.succeeded, report.failed), (3, 2, 1));
        assert_eq!(fake.calls(), 2);
        assert_eq!(report.results[1].status, FileStatus::Error);
        assert_eq!(report.results[1].error.as_deref(), Some("File is empty"));
        let doc = report.results[0].documentation.as_deref().unwrap();
        assert!(doc.starts_with("# Documentation: `main.rs`"));
        assert!(report.results[0].missing_sections.is_empty());
        assert_eq!(report.results[2].language, "js");
        assert_eq!(report.results[0].model_used, state.config.openai.model);
    }

    #[tokio::test]
    async fn upstream_errors_are_per_file() {
        let fake = FakeCompletions::failing();
        let state = test_state_with_completions(fake.clone());
        let report = DocumentationService::new(&state)
            .generate_batch(vec![encoded("a.go", "package main")], Some("gpt-4".into()), Uuid::nil())
            .await
            .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.results[0].model_used, "gpt-4");
        assert!(report.results[0].error.as_deref().unwrap().starts_with("Failed to generate documentation"));
    }

    #[tokio::test]
    async fn unconfigured_key_is_503() {
        let mut state = test_state();
        let mut config = (*state.config).clone();
        config.openai.api_key = None;
        state.config = Arc::new(config);

        let service = DocumentationService::new(&state);
        let err = service
            .generate_batch(vec![encoded("a.py", "x = 1")], None, Uuid::nil())
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
        assert!(service.health().is_err());
    }
}
