//! Request/response contracts for hosting the engine behind HTTP routes.
//!
//! Handlers validate the request, run the analysis behind [`guarded`] and always
//! answer with a [`ServiceResponse`], whether the analysis succeeded, found
//! nothing, or panicked.

use crate::cache::cache_key;
use crate::data_flow::{DataFlowQuery, DataFlowResult, FlowDirection};
use crate::error::{CausalError, CausalResult};
use crate::impact::{ImpactAnalysis, DEFAULT_IMPACT_DEPTH};
use crate::models::SourceFile;
use crate::sequence::{LayerGroup, SequenceFlow, DEFAULT_SEQUENCE_DEPTH};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, UnwindSafe};
use tracing::{error, warn};

/// Product cap on files per analysed batch
pub const MAX_BATCH_FILES: usize = 50;

/// Upper bound accepted for any `maxDepth`
pub const MAX_DEPTH_LIMIT: usize = 50;

fn require(field: &str, value: &str) -> CausalResult<()> {
    if value.trim().is_empty() {
        return Err(CausalError::invalid_input(format!("{} is required", field)));
    }
    Ok(())
}

fn check_depth(max_depth: Option<usize>) -> CausalResult<()> {
    match max_depth {
        Some(0) => Err(CausalError::invalid_input("maxDepth must be at least 1")),
        Some(depth) if depth > MAX_DEPTH_LIMIT => Err(CausalError::invalid_input(format!(
            "maxDepth must be at most {}",
            MAX_DEPTH_LIMIT
        ))),
        _ => Ok(()),
    }
}

/// Rejects batches above [`MAX_BATCH_FILES`]
pub fn validate_batch(files: &[SourceFile]) -> CausalResult<()> {
    if files.len() > MAX_BATCH_FILES {
        return Err(CausalError::invalid_input(format!(
            "Too many files: {} (max {})",
            files.len(),
            MAX_BATCH_FILES
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactTargetRef {
    pub name: String,
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactRequest {
    pub repo: String,
    pub branch: String,
    pub target: ImpactTargetRef,
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl ImpactRequest {
    pub fn validate(&self) -> CausalResult<()> {
        require("repo", &self.repo)?;
        require("branch", &self.branch)?;
        require("target.name", &self.target.name)?;
        check_depth(self.max_depth)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_IMPACT_DEPTH)
    }

    pub fn cache_key(&self, files: &[SourceFile]) -> String {
        let target = match &self.target.file {
            Some(file) => format!("{}@{}", self.target.name, file),
            None => self.target.name.clone(),
        };
        cache_key("impact", &self.repo, &self.branch, &target, files)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTraceTargetRef {
    pub name: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTraceRequest {
    pub repo: String,
    pub branch: String,
    pub target: DataTraceTargetRef,
    #[serde(default)]
    pub direction: Option<FlowDirection>,
}

impl DataTraceRequest {
    pub fn validate(&self) -> CausalResult<()> {
        require("repo", &self.repo)?;
        require("branch", &self.branch)?;
        require("target.name", &self.target.name)?;
        require("target.file", &self.target.file)?;
        if self.target.line == 0 {
            return Err(CausalError::invalid_input("target.line must be 1 or greater"));
        }
        Ok(())
    }

    pub fn query(&self) -> DataFlowQuery {
        DataFlowQuery::new(&self.target.name, &self.target.file, self.target.line)
            .with_direction(self.direction.unwrap_or_default())
    }

    pub fn cache_key(&self, files: &[SourceFile]) -> String {
        let target = format!(
            "{}@{}:{}:{}",
            self.target.name,
            self.target.file,
            self.target.line,
            self.direction.unwrap_or_default()
        );
        cache_key("data-trace", &self.repo, &self.branch, &target, files)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceTriggerRef {
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRequest {
    pub repo: String,
    pub branch: String,
    pub trigger: SequenceTriggerRef,
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl SequenceRequest {
    pub fn validate(&self) -> CausalResult<()> {
        require("repo", &self.repo)?;
        require("branch", &self.branch)?;
        require("trigger.target", &self.trigger.target)?;
        check_depth(self.max_depth)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_SEQUENCE_DEPTH)
    }

    pub fn cache_key(&self, files: &[SourceFile]) -> String {
        cache_key("sequence", &self.repo, &self.branch, &self.trigger.target, files)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTraceData {
    pub result: DataFlowResult,
    pub analysis_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceData {
    pub flow: SequenceFlow,
    /// Participants grouped by layer
    pub diagram: Vec<LayerGroup>,
}

pub type ImpactResponse = ServiceResponse<ImpactAnalysis>;
pub type DataTraceResponse = ServiceResponse<DataTraceData>;
pub type SequenceResponse = ServiceResponse<SequenceData>;

/// Uniform response envelope: `{success, ...data}` or `{success: false, error}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub status: u16,
}

impl<T> ServiceResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status: 200,
        }
    }

    pub fn from_error(err: &CausalError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            status: err.status_code(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            status: 500,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs `operation`, converting errors and panics into a failure response
pub fn guarded<T, F>(endpoint: &str, operation: F) -> ServiceResponse<T>
where
    F: FnOnce() -> CausalResult<T> + UnwindSafe,
{
    match catch_unwind(operation) {
        Ok(Ok(data)) => ServiceResponse::ok(data),
        Ok(Err(err)) => {
            warn!(endpoint = %endpoint, status = err.status_code(), error = %err, "Analysis request failed");
            ServiceResponse::from_error(&err)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(endpoint = %endpoint, panic = %message, "Analysis panicked");
            ServiceResponse::internal(format!("Internal analysis error: {}", message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impact_request(name: &str) -> ImpactRequest {
        ImpactRequest {
            repo: "acme/web".into(),
            branch: "main".into(),
            target: ImpactTargetRef {
                name: name.into(),
                file: None,
            },
            max_depth: None,
        }
    }

    #[test]
    fn impact_request_requires_target_name() {
        assert!(impact_request("useAuth").validate().is_ok());
        let err = impact_request(" ").validate().unwrap_err();
        assert_eq!(err.status_code(), 400);

        let mut request = impact_request("useAuth");
        request.max_depth = Some(0);
        assert!(request.validate().is_err());
        assert_eq!(impact_request("useAuth").max_depth(), DEFAULT_IMPACT_DEPTH);
    }

    #[test]
    fn deserializes_camel_case_contract() {
        let request: SequenceRequest = serde_json::from_str(
            r#"{"repo":"acme/web","branch":"main","trigger":{"target":"handleLogin"},"maxDepth":4}"#,
        )
        .unwrap();
        assert_eq!(request.max_depth(), 4);

        let trace: DataTraceRequest = serde_json::from_str(
            r#"{"repo":"r","branch":"b","target":{"name":"email","file":"src/a.ts","line":3},"direction":"forward"}"#,
        )
        .unwrap();
        assert_eq!(trace.query().direction, FlowDirection::Forward);
    }

    #[test]
    fn oversize_batch_is_rejected() {
        let files: Vec<SourceFile> = (0..=MAX_BATCH_FILES)
            .map(|i| SourceFile::new(format!("src/f{i}.ts"), ""))
            .collect();
        assert!(validate_batch(&files).is_err());
        assert!(validate_batch(&files[..MAX_BATCH_FILES]).is_ok());
    }

    #[test]
    fn guarded_maps_errors_and_panics() {
        let ok: ServiceResponse<u32> = guarded("test", || Ok(7));
        assert_eq!(ok.data, Some(7));
        assert_eq!(ok.status, 200);

        let missing: ServiceResponse<u32> = guarded("test", || Err(CausalError::not_found("Function", "x")));
        assert!(!missing.success);
        assert_eq!(missing.status, 404);

        let panicked: ServiceResponse<u32> = guarded("test", || panic!("boom"));
        assert_eq!(panicked.status, 500);
        assert!(panicked.error.unwrap().contains("boom"));
    }

    #[test]
    fn failure_serializes_without_data() {
        let response: ServiceResponse<DataTraceData> = ServiceResponse::internal("bad");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "bad");
        assert!(json.get("result").is_none());
    }

    #[test]
    fn cache_keys_include_target() {
        let files = vec![SourceFile::new("src/a.ts", "x")];
        let key = impact_request("useAuth").cache_key(&files);
        assert!(key.starts_with("impact:acme/web:main:useAuth:"));
    }
}
