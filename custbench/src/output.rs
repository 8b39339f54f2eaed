use crate::cli::OutputFormat;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, config: &custbench_core::RunConfig);
    fn events(&self) -> Option<custbench_core::EventFn>;
    fn print_summary(&self, summary: &custbench_core::RunSummary) -> anyhow::Result<()>;
}

pub(crate) fn formatter(
    format: OutputFormat,
    config: &custbench_core::RunConfig,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new(config)),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
