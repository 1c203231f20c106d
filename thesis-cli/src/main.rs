//! thesis-matcher CLI
//!
//! Finds master's thesis positions and research internships on the web and
//! ranks them against your resume with a crew of four LLM agents.

mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use thesis_agents::{build_backend, CrewConfig, Provider, SearchSettings, StageData};
use thesis_core::{
    extract_matches, render_summary, save_results, ChunkConfig, KnowledgeSource, MatchRecord,
};
use thesis_runtime::{Crew, CrewOutput};
use thesis_web::{HttpConfig, HttpScraper, SerperConfig, SerperSearch};

use settings::Settings;

/// Characters of raw output shown when no matches could be extracted
const RAW_PREVIEW_CHARS: usize = 500;

#[derive(Parser)]
#[command(name = "thesis-matcher")]
#[command(author, version, about = "Find master thesis positions matching your resume", long_about = None)]
struct Cli {
    /// Country to search in
    #[arg(long, default_value = "Finland")]
    country: String,

    /// Field of interest (e.g. Machine Learning, AI Engineer)
    #[arg(long, default_value = "Machine Learning")]
    field: String,

    /// Output directory for results
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Number of top matches to return
    #[arg(long, default_value = "5")]
    top_k: usize,

    /// Resume file (.pdf, .txt or .md). PDF input needs poppler's `pdftotext` on PATH
    #[arg(long, env = "RESUME_PATH", default_value = "resume.pdf")]
    resume: PathBuf,

    /// LLM provider: openai, anthropic, openrouter or local
    #[arg(long, default_value = "openai")]
    provider: Provider,

    /// LLM model to use
    #[arg(short, long, env = "MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Base URL of an OpenAI-compatible server (local provider)
    #[arg(long, env = "LLM_BASE_URL")]
    base_url: Option<String>,

    /// Directory holding agents.toml and tasks.toml (default: built-in)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Search results requested per query
    #[arg(long, default_value = "10")]
    max_results: usize,

    /// Result pages fetched per run
    #[arg(long, default_value = "5")]
    max_pages: usize,

    /// Two-letter country code for localized search results (e.g. fi)
    #[arg(long)]
    country_code: Option<String>,

    /// Serper API key (or set SERPER_API_KEY env var)
    #[arg(long, env = "SERPER_API_KEY")]
    serper_key: Option<String>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// Anthropic API key (or set ANTHROPIC_API_KEY env var)
    #[arg(long, env = "ANTHROPIC_API_KEY")]
    anthropic_key: Option<String>,

    /// OpenRouter API key (or set OPENROUTER_API_KEY env var)
    #[arg(long, env = "OPENROUTER_API_KEY")]
    openrouter_key: Option<String>,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let settings = Settings::from_cli(cli)?;
    run(&settings).await
}

async fn run(settings: &Settings) -> Result<()> {
    println!("🎓 Thesis Matcher - thesis positions that fit your resume\n");
    println!("📡 Provider: {} | Model: {}", settings.provider, settings.model);
    println!("📄 Resume: {}", settings.resume_path.display());

    let knowledge = KnowledgeSource::from_path(&settings.resume_path, ChunkConfig::default())?;
    println!("📚 Resume loaded: {} chunks", knowledge.len());

    let config = match &settings.config_dir {
        Some(dir) => CrewConfig::load_from_dir(dir)?,
        None => CrewConfig::load_embedded()?,
    };

    let backend = build_backend(
        settings.provider,
        &settings.model,
        settings.llm_api_key.as_deref(),
        settings.base_url.as_deref(),
    )?;

    let search = SerperSearch::new(
        SerperConfig::new(&settings.serper_api_key)?
            .with_num_results(settings.max_results)
            .with_country_code(settings.country_code.clone()),
    )?;
    let fetcher = HttpScraper::new(HttpConfig::default())?;

    let crew = Crew::builder(config, backend)
        .search(Arc::new(search))
        .fetcher(Arc::new(fetcher))
        .knowledge(Arc::new(knowledge))
        .search_settings(SearchSettings {
            max_pages: settings.max_pages,
            ..Default::default()
        })
        .build()?;

    let inputs = &settings.inputs;
    println!("🤖 Agents: {}", crew.agent_ids().join(", "));
    println!(
        "\n🔍 Searching for master thesis positions in {} related to '{}'...\n",
        inputs.location, inputs.field
    );

    let result = crew.kickoff(inputs).await?;
    process_results(&result, settings)
}

/// Matches from the final task, re-extracted from raw text when the agent
/// could not structure them
fn final_matches(result: &CrewOutput) -> Vec<MatchRecord> {
    match result.final_data() {
        Some(StageData::Matches(matches)) => matches.clone(),
        _ => extract_matches(&result.raw),
    }
}

fn process_results(result: &CrewOutput, settings: &Settings) -> Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("PROCESSING RESULTS...");
    println!("{}", "=".repeat(80));

    let matches = final_matches(result);

    if matches.is_empty() {
        println!("\n⚠️  Warning: Could not extract JSON from result. Raw output:");
        let preview: String = result.raw.chars().take(RAW_PREVIEW_CHARS).collect();
        println!("{}", preview);
        println!("\nNo matches found or could not parse results.");
        return Ok(());
    }

    let saved = save_results(
        &matches,
        &settings.output_dir,
        &settings.inputs.field,
        &settings.inputs.location,
    )?;
    info!("Saved {} matches to {}", matches.len(), saved.json_path.display());

    println!("\n✅ Found {} matches!", matches.len());
    println!("📄 Results saved to:");
    println!("   JSON: {}", saved.json_path.display());
    if let Some(csv_path) = &saved.csv_path {
        println!("   CSV:  {}", csv_path.display());
    }

    println!("\n{}", "=".repeat(80));
    println!("TOP MATCHES:");
    println!("{}", "=".repeat(80));
    println!("{}", render_summary(&matches));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use thesis_runtime::TaskOutput;

    fn crew_output(raw: &str, data: StageData) -> CrewOutput {
        CrewOutput {
            id: Default::default(),
            raw: raw.to_string(),
            tasks_output: vec![TaskOutput {
                task: "match_jobs_task".to_string(),
                agent: "matcher".to_string(),
                raw: raw.to_string(),
                data,
                elapsed: Duration::from_secs(1),
            }],
        }
    }

    fn test_settings(output_dir: &std::path::Path, resume: &std::path::Path) -> Settings {
        let output_dir = output_dir.display().to_string();
        let resume = resume.display().to_string();
        let mut cli = Cli::parse_from([
            "thesis-matcher",
            "--output-dir",
            output_dir.as_str(),
            "--resume",
            resume.as_str(),
        ]);
        cli.serper_key = Some("serper".to_string());
        cli.api_key = Some("sk-test".to_string());
        cli.provider = Provider::OpenAI;
        Settings::from_cli(cli).unwrap()
    }

    #[test]
    fn test_resume_help_names_pdftotext() {
        use clap::CommandFactory;

        let cmd = Cli::command();
        let resume = cmd.get_arguments().find(|a| a.get_id() == "resume").unwrap();
        assert!(resume.get_help().unwrap().to_string().contains("pdftotext"));
    }

    #[test]
    fn test_final_matches_falls_back_to_raw() {
        let raw = r#"[{"rank": 1, "title": "Thesis X", "fit_score": 90}]"#;
        let matches = final_matches(&crew_output(raw, StageData::Text));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].display_field("title").as_deref(), Some("Thesis X"));

        assert!(final_matches(&crew_output("no json here", StageData::Text)).is_empty());
    }

    #[test]
    fn test_process_results_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let resume = tempfile::NamedTempFile::new().unwrap();
        let settings = test_settings(&dir.path().join("out"), resume.path());

        let raw = r#"[{"rank": 1, "title": "Thesis X", "company_or_institution": "Acme", "fit_score": 90, "url": "http://x", "match_summary": "good fit"}]"#;
        process_results(&crew_output(raw, StageData::Text), &settings).unwrap();

        let written: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|name| name.starts_with("matches_Machine_Learning_Finland_")));
    }

    #[test]
    fn test_process_results_without_matches_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let resume = tempfile::NamedTempFile::new().unwrap();
        let settings = test_settings(&dir.path().join("out"), resume.path());

        process_results(&crew_output("Sorry, nothing found.", StageData::Text), &settings).unwrap();
        assert!(!dir.path().join("out").exists());
    }
}
