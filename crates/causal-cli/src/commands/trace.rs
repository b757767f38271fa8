use super::{into_data, CommandContext, LOCAL_BRANCH};
use crate::reporters::Report;
use anyhow::Result;
use causal_core::data_flow::FlowDirection;
use causal_core::service::{DataTraceRequest, DataTraceTargetRef};

/// Traces where `identifier` at `file:line` comes from and where it goes.
///
/// An identifier missing at that line is reported, not treated as an error.
pub fn execute_trace(
    ctx: &CommandContext,
    identifier: &str,
    file: &str,
    line: usize,
    direction: FlowDirection,
) -> Result<()> {
    let files = ctx.load_files()?;
    let request = DataTraceRequest {
        repo: ctx.repo(),
        branch: LOCAL_BRANCH.to_string(),
        target: DataTraceTargetRef {
            name: identifier.to_string(),
            file: file.to_string(),
            line,
        },
        direction: Some(direction),
    };
    let data = into_data(ctx.engine().data_trace(&request, &files))?;
    ctx.emit(&Report::DataFlow(&data.result))
}
