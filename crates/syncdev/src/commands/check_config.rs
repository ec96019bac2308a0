//! `syncdev check-config`: validate a settings draft without a running app.

use serde_json::json;

use syncdev_core::AppConfig;

use super::util::read_input;
use crate::cli::{CheckConfigArgs, OutputFormat};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Painter};

pub async fn handle(args: CheckConfigArgs, settings: Resolved) -> Result<(), CliError> {
    let text = read_input(&args.file).await?;
    let draft: AppConfig = serde_json::from_str(&text)?;
    draft.validate_draft()?;

    let rendered = match settings.output {
        OutputFormat::Text => {
            let p = Painter::new(output::should_color(settings.color));
            format!(
                "{} draft for '{}' is valid (port {}, every {} min)",
                p.good("✓"),
                draft.device_name,
                draft.port,
                draft.sync_interval_mins
            )
        }
        OutputFormat::Json => output::render_json(&json!({ "valid": true, "config": draft }))?,
    };
    output::print_output(&rendered, settings.quiet);
    Ok(())
}
