use super::{into_data, CommandContext, LOCAL_BRANCH};
use crate::reporters::Report;
use anyhow::Result;
use causal_core::service::{ImpactRequest, ImpactTargetRef};

/// Reports what breaks when `name` changes
pub fn execute_impact(
    ctx: &CommandContext,
    name: &str,
    file: Option<&str>,
    max_depth: Option<usize>,
) -> Result<()> {
    let files = ctx.load_files()?;
    let request = ImpactRequest {
        repo: ctx.repo(),
        branch: LOCAL_BRANCH.to_string(),
        target: ImpactTargetRef {
            name: name.to_string(),
            file: file.map(str::to_string),
        },
        max_depth: Some(max_depth.unwrap_or_else(|| ctx.config.analysis.impact_depth())),
    };
    let analysis = into_data(ctx.engine().impact(&request, &files))?;
    ctx.emit(&Report::Impact(&analysis))
}
