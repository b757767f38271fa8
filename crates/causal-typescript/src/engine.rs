//! Request handlers tying the TypeScript front end to the core analyses.
//!
//! Every handler validates its request, builds what it needs from the file
//! batch and answers through [`guarded`], so callers always get a
//! [`ServiceResponse`] back.

use crate::builder::TypeScriptCallGraphBuilder;
use crate::data_flow::analyze_data_flow_from_files;
use causal_core::cache::ResultCache;
use causal_core::call_graph::CallGraph;
use causal_core::impact::analyze_impact_by_name;
use causal_core::models::SourceFile;
use causal_core::sequence::{generate_sequence_from_handler, layer_groups};
use causal_core::service::{
    guarded, validate_batch, DataTraceData, DataTraceRequest, DataTraceResponse, ImpactRequest,
    ImpactResponse, SequenceData, SequenceRequest, SequenceResponse,
};
use causal_core::{CausalError, CausalResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs impact, data trace and sequence requests, optionally through a cache
#[derive(Default)]
pub struct CausalEngine {
    builder: TypeScriptCallGraphBuilder,
    cache: Option<Arc<dyn ResultCache>>,
}

impl CausalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.builder = self.builder.with_verbose(verbose);
        self
    }

    pub fn build_graph(&self, files: &[SourceFile]) -> CallGraph {
        self.builder.build_graph(files)
    }

    pub fn impact(&self, request: &ImpactRequest, files: &[SourceFile]) -> ImpactResponse {
        guarded(
            "impact",
            AssertUnwindSafe(|| {
                request.validate()?;
                validate_batch(files)?;
                require_files(files)?;
                self.cached(&request.cache_key(files), || {
                    let graph = self.build_graph(files);
                    analyze_impact_by_name(
                        &graph,
                        &request.target.name,
                        request.target.file.as_deref(),
                        request.max_depth(),
                    )
                    .ok_or_else(|| CausalError::not_found("Function", request.target.name.as_str()))
                })
            }),
        )
    }

    /// A missing identifier is a successful response with `found: false`
    pub fn data_trace(&self, request: &DataTraceRequest, files: &[SourceFile]) -> DataTraceResponse {
        guarded(
            "data-trace",
            AssertUnwindSafe(|| {
                request.validate()?;
                validate_batch(files)?;
                require_files(files)?;
                self.cached(&request.cache_key(files), || {
                    let result = analyze_data_flow_from_files(files, &request.query());
                    Ok(DataTraceData {
                        analysis_time_ms: result.analysis_time_ms,
                        result,
                    })
                })
            }),
        )
    }

    pub fn sequence(&self, request: &SequenceRequest, files: &[SourceFile]) -> SequenceResponse {
        guarded(
            "sequence",
            AssertUnwindSafe(|| {
                request.validate()?;
                validate_batch(files)?;
                require_files(files)?;
                self.cached(&request.cache_key(files), || {
                    let graph = self.build_graph(files);
                    let flow = generate_sequence_from_handler(&graph, &request.trigger.target, request.max_depth())
                        .ok_or_else(|| CausalError::not_found("Trigger", request.trigger.target.as_str()))?;
                    Ok(SequenceData {
                        diagram: layer_groups(&flow),
                        flow,
                    })
                })
            }),
        )
    }

    /// Serves `key` from the cache when present, otherwise computes and stores it.
    /// Cache failures only cost the lookup; they never fail the request.
    fn cached<T, F>(&self, key: &str, compute: F) -> CausalResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> CausalResult<T>,
    {
        let Some(cache) = &self.cache else {
            return compute();
        };
        match cache.get(key) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    debug!(key = %key, "Cache hit");
                    return Ok(value);
                }
                Err(err) => warn!(key = %key, error = %err, "Discarding unreadable cache entry"),
            },
            Ok(None) => {}
            Err(err) => warn!(key = %key, error = %err, "Cache lookup failed"),
        }

        let value = compute()?;
        match serde_json::to_vec(&value) {
            Ok(bytes) => {
                if let Err(err) = cache.put(key, bytes) {
                    warn!(key = %key, error = %err, "Cache write failed");
                }
            }
            Err(err) => warn!(key = %key, error = %err, "Failed to serialize result for cache"),
        }
        Ok(value)
    }
}

fn require_files(files: &[SourceFile]) -> CausalResult<()> {
    if files.is_empty() {
        return Err(CausalError::not_found("Files", "no analyzable files"));
    }
    Ok(())
}

/// Impact request against an uncached engine
pub fn handle_impact(request: &ImpactRequest, files: &[SourceFile]) -> ImpactResponse {
    CausalEngine::new().impact(request, files)
}

/// Data trace request against an uncached engine
pub fn handle_data_trace(request: &DataTraceRequest, files: &[SourceFile]) -> DataTraceResponse {
    CausalEngine::new().data_trace(request, files)
}

/// Sequence request against an uncached engine
pub fn handle_sequence(request: &SequenceRequest, files: &[SourceFile]) -> SequenceResponse {
    CausalEngine::new().sequence(request, files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use causal_core::cache::MemoryCache;
    use causal_core::service::{DataTraceTargetRef, ImpactTargetRef, SequenceTriggerRef};

    fn files() -> Vec<SourceFile> {
        vec![
            SourceFile::new(
                "src/lib/auth.ts",
                "export async function login(email: string) {\n  return validateEmail(email);\n}\nexport function validateEmail(email: string) {\n  return email.includes('@');\n}\n",
            ),
            SourceFile::new(
                "src/app/login/page.tsx",
                "import { login } from '@/lib/auth';\nexport default function LoginPage() {\n  const handleLogin = async () => { await login('a@b.c'); };\n  return <button onClick={handleLogin}>Login</button>;\n}\n",
            ),
        ]
    }

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
    fn test_impact_reports_callers() {
        let response = handle_impact(&impact_request("validateEmail"), &files());
        assert!(response.success);
        let analysis = response.data.unwrap();
        assert_eq!(analysis.direct_callers.len(), 1);
        assert_eq!(analysis.direct_callers[0].name, "login");
        assert!(analysis.indirect_callers.iter().any(|c| c.name == "handleLogin"));
    }

    #[test]
    fn test_missing_target_is_404_and_bad_request_is_400() {
        let response = handle_impact(&impact_request("doesNotExist"), &files());
        assert_eq!(response.status, 404);
        assert!(response.error.unwrap().contains("doesNotExist"));

        let response = handle_impact(&impact_request(""), &files());
        assert_eq!(response.status, 400);

        let response = handle_impact(&impact_request("login"), &[]);
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_sequence_includes_layer_diagram() {
        let request = SequenceRequest {
            repo: "acme/web".into(),
            branch: "main".into(),
            trigger: SequenceTriggerRef {
                target: "handleLogin".into(),
            },
            max_depth: Some(5),
        };
        let response = handle_sequence(&request, &files());
        assert!(response.success);
        let data = response.data.unwrap();
        assert!(data.flow.messages.len() >= 2);
        assert!(!data.diagram.is_empty());
    }

    #[test]
    fn test_data_trace_not_found_is_still_successful() {
        let request = DataTraceRequest {
            repo: "acme/web".into(),
            branch: "main".into(),
            target: DataTraceTargetRef {
                name: "missing".into(),
                file: "src/lib/auth.ts".into(),
                line: 2,
            },
            direction: None,
        };
        let response = handle_data_trace(&request, &files());
        assert!(response.success);
        assert!(!response.data.unwrap().result.found);
    }

    #[test]
    fn test_cache_serves_repeated_requests() {
        let cache = Arc::new(MemoryCache::new(8, None));
        let engine = CausalEngine::new().with_cache(cache.clone());
        let request = impact_request("validateEmail");

        let first = engine.impact(&request, &files());
        assert_eq!(cache.len(), 1);
        let second = engine.impact(&request, &files());
        assert_eq!(first.data, second.data);
        assert_eq!(cache.len(), 1);

        let mut changed = files();
        changed[0].content.push_str("\n// touched\n");
        engine.impact(&request, &changed);
        assert_eq!(cache.len(), 2);
    }
}
