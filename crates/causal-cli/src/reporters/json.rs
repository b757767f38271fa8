use super::Report;
use anyhow::Result;
use std::fs;
use std::path::Path;

/// JSON report generator
pub struct JsonReporter;

impl JsonReporter {
    /// Pretty JSON envelope: version, timestamp, report kind and payload
    pub fn render(&self, report: &Report) -> Result<String> {
        let envelope = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "kind": report.kind(),
            "data": report.to_value()?,
        });
        Ok(serde_json::to_string_pretty(&envelope)?)
    }

    /// Generates a JSON report file
    pub fn generate(&self, report: &Report, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.render(report)?)?;
        Ok(())
    }
}
