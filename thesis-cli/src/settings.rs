//! Validated runtime settings
//!
//! Everything the run needs is read once from the command line and the
//! environment, then checked before any component is built.

use std::path::PathBuf;

use anyhow::{bail, Result};

use thesis_agents::Provider;
use thesis_core::SearchInputs;

use crate::Cli;

#[derive(Debug, Clone)]
pub struct Settings {
    pub inputs: SearchInputs,
    pub output_dir: PathBuf,
    pub resume_path: PathBuf,
    pub provider: Provider,
    pub model: String,
    /// Key for `provider`; `None` only for local servers
    pub llm_api_key: Option<String>,
    pub base_url: Option<String>,
    pub serper_api_key: String,
    pub country_code: Option<String>,
    pub config_dir: Option<PathBuf>,
    pub max_results: usize,
    pub max_pages: usize,
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let field = cli.field.trim().to_string();
        let country = cli.country.trim().to_string();
        if field.is_empty() {
            bail!("--field must not be empty");
        }
        if country.is_empty() {
            bail!("--country must not be empty");
        }
        if cli.top_k == 0 {
            bail!("--top-k must be at least 1");
        }
        if cli.max_results == 0 {
            bail!("--max-results must be at least 1");
        }

        let serper_api_key = match non_empty(cli.serper_key) {
            Some(key) => key,
            None => bail!("Web search API key required. Set SERPER_API_KEY or use --serper-key"),
        };

        let llm_api_key = match cli.provider {
            Provider::OpenAI => non_empty(cli.api_key),
            Provider::Anthropic => non_empty(cli.anthropic_key),
            Provider::OpenRouter => non_empty(cli.openrouter_key),
            Provider::Local => None,
        };

        match (cli.provider, cli.provider.key_env()) {
            (Provider::Local, _) => {
                if non_empty(cli.base_url.clone()).is_none() {
                    bail!("Local provider requires a base URL. Set LLM_BASE_URL or use --base-url");
                }
            }
            (provider, Some(env)) if llm_api_key.is_none() => {
                bail!("{} API key required. Set {}", provider, env);
            }
            _ => {}
        }

        if !cli.resume.is_file() {
            bail!(
                "Resume not found at {}. Set RESUME_PATH or use --resume",
                cli.resume.display()
            );
        }

        if let Some(dir) = &cli.config_dir {
            if !dir.is_dir() {
                bail!("Config directory {} does not exist", dir.display());
            }
        }

        Ok(Self {
            inputs: SearchInputs {
                field,
                location: country,
                top_k: cli.top_k,
            },
            output_dir: cli.output_dir,
            resume_path: cli.resume,
            provider: cli.provider,
            model: cli.model,
            llm_api_key,
            base_url: non_empty(cli.base_url),
            serper_api_key,
            country_code: non_empty(cli.country_code),
            config_dir: cli.config_dir,
            max_results: cli.max_results,
            max_pages: cli.max_pages,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
