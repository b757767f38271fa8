use super::{into_data, CommandContext, LOCAL_BRANCH};
use crate::reporters::Report;
use anyhow::Result;
use causal_core::service::{SequenceRequest, SequenceTriggerRef};

/// Builds the call sequence started by `trigger`
pub fn execute_sequence(ctx: &CommandContext, trigger: &str, max_depth: Option<usize>) -> Result<()> {
    let files = ctx.load_files()?;
    let request = SequenceRequest {
        repo: ctx.repo(),
        branch: LOCAL_BRANCH.to_string(),
        trigger: SequenceTriggerRef {
            target: trigger.to_string(),
        },
        max_depth: Some(max_depth.unwrap_or_else(|| ctx.config.analysis.sequence_depth())),
    };
    let data = into_data(ctx.engine().sequence(&request, &files))?;
    ctx.emit(&Report::Sequence(&data))
}
