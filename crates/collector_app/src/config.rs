use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use collector_engine::{ParamSpec, PayloadFormat, ProviderConfig, Window};
use serde::Deserialize;

/// One harvest run: the shared window, output root, and provider list.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    pub window: WindowConfig,
    /// Seconds to pause before retrying a transport failure.
    #[serde(default)]
    pub backoff_secs: Option<u64>,
    pub providers: Vec<ProviderEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

impl WindowConfig {
    pub fn into_window(self) -> Window {
        Window {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatEntry {
    Json,
    Xml,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEntry {
    pub dataset: String,
    pub base_url: String,
    pub format: FormatEntry,
    pub rows_path: String,
    #[serde(default)]
    pub total_path: Option<String>,
    #[serde(default)]
    pub echo_marker: Option<String>,
    #[serde(default)]
    pub params: Vec<(String, String)>,
    #[serde(default)]
    pub period_param: Option<String>,
    #[serde(default = "default_page_param")]
    pub page_param: String,
    #[serde(default = "default_size_param")]
    pub size_param: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub keep_raw: bool,
}

fn default_page_param() -> String {
    "pageNo".to_string()
}

fn default_size_param() -> String {
    "numOfRows".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_delimiter() -> char {
    ','
}

impl ProviderEntry {
    pub fn into_provider(self) -> ProviderConfig {
        ProviderConfig {
            dataset: self.dataset,
            base_url: self.base_url,
            format: match self.format {
                FormatEntry::Json => PayloadFormat::Json,
                FormatEntry::Xml => PayloadFormat::Xml,
            },
            rows_path: self.rows_path,
            total_path: self.total_path,
            echo_marker: self.echo_marker,
            params: ParamSpec {
                fixed: self.params,
                period_param: self.period_param,
            },
            page_param: self.page_param,
            size_param: self.size_param,
            page_size: self.page_size,
            delimiter: self.delimiter,
            keep_raw: self.keep_raw,
        }
    }
}

pub fn load(path: &Path) -> anyhow::Result<RunConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: RunConfig =
        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
    anyhow::ensure!(!config.providers.is_empty(), "config lists no providers");
    for provider in &config.providers {
        anyhow::ensure!(
            provider.delimiter.is_ascii(),
            "provider {}: delimiter must be an ASCII character",
            provider.dataset
        );
        anyhow::ensure!(
            provider.page_size > 0,
            "provider {}: page_size must be positive",
            provider.dataset
        );
        anyhow::ensure!(
            !provider.rows_path.is_empty(),
            "provider {}: rows_path must not be empty",
            provider.dataset
        );
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"(
        output_dir: "harvest_out",
        window: (start: "2023", end: "2023"),
        backoff_secs: Some(1),
        providers: [
            (
                dataset: "kosis_population",
                base_url: "https://stats.example.com/api",
                format: json,
                rows_path: "response.body.items",
                total_path: Some("response.body.totalCount"),
                echo_marker: Some("OpenAPI_ServiceResponse"),
                params: [("serviceKey", "demo")],
                period_param: Some("year"),
                delimiter: '|',
                keep_raw: true,
            ),
            (
                dataset: "org_directory",
                base_url: "https://intra.example.com/soap",
                format: xml,
                rows_path: "Envelope.Body.listResponse.row",
            ),
        ],
    )"#;

    #[test]
    fn sample_config_parses_with_defaults() {
        let config: RunConfig = ron::from_str(SAMPLE).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("harvest_out"));
        assert_eq!(config.backoff_secs, Some(1));
        assert_eq!(config.providers.len(), 2);

        let first = config.providers[0].clone().into_provider();
        assert_eq!(first.delimiter, '|');
        assert_eq!(first.params.period_param.as_deref(), Some("year"));
        assert!(first.keep_raw);

        let second = config.providers[1].clone().into_provider();
        assert_eq!(second.format, PayloadFormat::Xml);
        assert_eq!(second.page_param, "pageNo");
        assert_eq!(second.size_param, "numOfRows");
        assert_eq!(second.page_size, 100);
        assert_eq!(second.delimiter, ',');
        assert!(second.params.fixed.is_empty());
        assert!(!second.keep_raw);
    }

    #[test]
    fn load_rejects_empty_provider_lists() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("run.ron");
        fs::write(
            &path,
            r#"(output_dir: "out", window: (start: "2023", end: "2023"), providers: [])"#,
        )
        .unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn load_rejects_zero_page_size() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("run.ron");
        fs::write(
            &path,
            r#"(
                output_dir: "out",
                window: (start: "2023", end: "2023"),
                providers: [(
                    dataset: "d",
                    base_url: "https://example.com",
                    format: json,
                    rows_path: "items",
                    page_size: 0,
                )],
            )"#,
        )
        .unwrap();
        assert!(load(&path).is_err());
    }
}
