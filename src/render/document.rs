use serde::Serialize;

/// Serialization used for the emitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// What the orchestration layer is fed.
    #[default]
    Yaml,
    Json,
}

/// Render any serializable document (assembled spec, filtered params, policy
/// table). JSON output is pretty-printed and newline terminated.
pub fn render_document<T: Serialize>(doc: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(doc)?),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(doc)?;
            out.push('\n');
            Ok(out)
        }
    }
}
