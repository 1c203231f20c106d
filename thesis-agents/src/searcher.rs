//! Job Searcher Agent
//!
//! Finds postings on the web.
//! - Asks the LLM for a handful of search queries
//! - Runs them through the web search tool and merges the results
//! - Fetches the top result pages
//! - Has the LLM write up the postings it found

use async_trait::async_trait;
use tracing::{debug, info, warn};

use thesis_core::{extract_list, JobPosting, SearchInputs};
use thesis_web::{merge_results, ScrapedPage, SearchResult, SharedFetcher, SharedSearch};

use crate::{AgentBase, AgentError, AgentSpec, CrewAgent, SharedBackend, StageData, StageOutput, TaskPrompt};

/// Limits for one search task
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Search queries issued per task
    pub max_queries: usize,
    /// Result pages fetched per task
    pub max_pages: usize,
    /// Characters of each fetched page shown to the LLM
    pub page_excerpt_chars: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_queries: 3,
            max_pages: 5,
            page_excerpt_chars: 1500,
        }
    }
}

/// Job searcher agent - uses the web search and fetch tools
pub struct JobSearcherAgent {
    base: AgentBase,
    search: Option<SharedSearch>,
    fetcher: Option<SharedFetcher>,
    settings: SearchSettings,
}

impl JobSearcherAgent {
    pub fn new(spec: AgentSpec, backend: SharedBackend) -> Self {
        Self {
            base: AgentBase::new(spec, backend),
            search: None,
            fetcher: None,
            settings: SearchSettings::default(),
        }
    }

    pub fn with_search(mut self, search: SharedSearch) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_fetcher(mut self, fetcher: SharedFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Ask the LLM for search queries, falling back to fixed ones
    async fn plan_queries(&self, prompt: &TaskPrompt) -> Result<Vec<String>, AgentError> {
        let request = format!(
            "Write up to {} web search queries that would find postings for this task. \
             One query per line, no numbering, no commentary.\n\nTask: {}",
            self.settings.max_queries,
            prompt.description.trim()
        );

        let reply = self.base.complete(&prompt.inputs, &request).await?;
        let mut queries = parse_queries(&reply, self.settings.max_queries);

        if queries.is_empty() {
            debug!("No usable queries from LLM, using defaults");
            queries = default_queries(&prompt.inputs);
            queries.truncate(self.settings.max_queries.max(1));
        }

        Ok(queries)
    }

    async fn run_searches(&self, search: &SharedSearch, queries: &[String]) -> Result<Vec<SearchResult>, AgentError> {
        let mut lists = Vec::new();
        let mut failures = Vec::new();

        for query in queries {
            match search.search(query).await {
                Ok(results) => lists.push(results),
                Err(e) => {
                    warn!("{} search '{}' failed: {}", search.name(), query, e);
                    failures.push(format!("{}: {}", search.name(), e));
                }
            }
        }

        if lists.is_empty() && !failures.is_empty() {
            return Err(AgentError::Tool(format!(
                "all {} searches failed: {}",
                failures.len(),
                failures.join("; ")
            )));
        }

        Ok(merge_results(lists))
    }

    async fn fetch_pages(&self, fetcher: &SharedFetcher, results: &[SearchResult]) -> Vec<ScrapedPage> {
        let mut pages = Vec::new();

        for result in results.iter().take(self.settings.max_pages) {
            match fetcher.fetch(&result.url).await {
                Ok(page) if !page.text.is_empty() => {
                    debug!("Fetched {} chars from {}", page.char_count, page.url);
                    pages.push(page);
                }
                Ok(_) => debug!("Empty content from {}", result.url),
                Err(e) => warn!("Failed to fetch {}: {}", result.url, e),
            }
        }

        pages
    }
}

#[async_trait]
impl CrewAgent for JobSearcherAgent {
    fn id(&self) -> &str {
        &self.base.spec().id
    }

    fn role(&self) -> &str {
        &self.base.spec().role
    }

    async fn execute(&self, prompt: &TaskPrompt) -> Result<StageOutput, AgentError> {
        let mut results = Vec::new();

        if let Some(search) = &self.search {
            let queries = self.plan_queries(prompt).await?;
            info!("Searcher running {} queries: {:?}", queries.len(), queries);
            results = self.run_searches(search, &queries).await?;
            info!("Searcher found {} unique results", results.len());
        } else {
            warn!("Agent {} has no search tool, answering from the model alone", self.id());
        }

        let pages = match &self.fetcher {
            Some(fetcher) if !results.is_empty() => self.fetch_pages(fetcher, &results).await,
            _ => Vec::new(),
        };

        let user = self.base.task_prompt(
            prompt,
            &[
                ("Web search results", format_results(&results)),
                ("Fetched pages", format_pages(&pages, self.settings.page_excerpt_chars)),
            ],
        );

        let raw = self.base.complete(&prompt.inputs, &user).await?;
        let postings: Vec<JobPosting> = extract_list(&raw);
        info!("Searcher reported {} structured postings", postings.len());

        let data = if postings.is_empty() {
            StageData::Text
        } else {
            StageData::Postings(postings)
        };

        Ok(StageOutput { raw, data })
    }
}

/// One query per line; bullets, numbering and quotes stripped, duplicates dropped
fn parse_queries(reply: &str, max: usize) -> Vec<String> {
    let mut queries: Vec<String> = Vec::new();

    for line in reply.lines() {
        let query = line
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | ')' | '-' | '*' | '•'))
            .trim()
            .trim_matches(|c| c == '"' || c == '`')
            .trim();

        if query.is_empty() || query.ends_with(':') {
            continue;
        }
        if !queries.iter().any(|q| q.eq_ignore_ascii_case(query)) {
            queries.push(query.to_string());
        }
        if queries.len() >= max {
            break;
        }
    }

    queries
}

fn default_queries(inputs: &SearchInputs) -> Vec<String> {
    vec![
        format!("master thesis {} {}", inputs.field, inputs.location),
        format!("thesis worker {} {} job", inputs.field, inputs.location),
        format!("{} research internship {}", inputs.field, inputs.location),
    ]
}

fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("{}. {}\n   URL: {}\n   {}", r.position, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_pages(pages: &[ScrapedPage], max_chars: usize) -> String {
    pages
        .iter()
        .map(|page| {
            let mut excerpt: String = page.text.chars().take(max_chars).collect();
            if page.truncated || page.char_count > max_chars {
                excerpt.push_str(" ...(truncated)");
            }
            let title = page.title.as_deref().unwrap_or("(untitled)");
            format!("## {}\nURL: {}\n{}", title, page.url, excerpt)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::test_support::{prompt, spec, ScriptedBackend};
    use std::sync::{Arc, Mutex};
    use thesis_web::{PageFetcher, WebError, WebSearch};

    struct MockSearch {
        fail: bool,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WebSearch for MockSearch {
        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, WebError> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(WebError::InvalidUrl("mock failure".to_string()));
            }
            Ok(vec![
                SearchResult {
                    position: 1,
                    title: "ML thesis worker - Acme".to_string(),
                    url: "https://acme.fi/jobs/ml-thesis".to_string(),
                    snippet: "Open until May".to_string(),
                },
                SearchResult {
                    position: 2,
                    title: format!("Result for {}", query),
                    url: format!("https://example.com/{}", query.len()),
                    snippet: String::new(),
                },
            ])
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    struct MockFetcher;

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<ScrapedPage, WebError> {
            if url.contains("example.com") {
                return Err(WebError::InvalidUrl(url.to_string()));
            }
            Ok(ScrapedPage {
                url: url.to_string(),
                title: Some("Acme careers".to_string()),
                text: "Thesis worker in machine learning, Helsinki. Python required.".to_string(),
                char_count: 61,
                truncated: false,
            })
        }
    }

    fn searcher_spec() -> AgentSpec {
        let mut spec = spec("job_searcher");
        spec.tools = vec![crate::ToolKind::WebSearch, crate::ToolKind::Fetch];
        spec
    }

    #[test]
    fn test_parse_queries() {
        let reply = "Here are queries:\n1. \"machine learning thesis Finland\"\n- thesis worker ML Helsinki\n* Machine Learning Thesis Finland\n\n4) ML internship Espoo";
        let queries = parse_queries(reply, 3);
        assert_eq!(
            queries,
            vec![
                "machine learning thesis Finland",
                "thesis worker ML Helsinki",
                "ML internship Espoo"
            ]
        );
    }

    #[test]
    fn test_format_pages_marks_cut_text() {
        let page = ScrapedPage {
            url: "https://acme.fi/jobs/1".to_string(),
            title: None,
            text: "abcdefgh".to_string(),
            char_count: 8,
            truncated: false,
        };
        let out = format_pages(&[page.clone()], 4);
        assert!(out.ends_with("abcd ...(truncated)"));
        assert!(out.contains("(untitled)"));

        let out = format_pages(&[page], 20);
        assert!(out.ends_with("abcdefgh"));
    }

    #[test]
    fn test_default_queries() {
        let queries = default_queries(&SearchInputs::new("NLP", "Sweden", 5));
        assert_eq!(queries[0], "master thesis NLP Sweden");
    }

    #[tokio::test]
    async fn test_execute_with_tools() {
        let backend = ScriptedBackend::new(&[
            "ml thesis finland\nthesis worker ml",
            r#"[{"title": "ML thesis worker", "company_or_institution": "Acme", "url": "https://acme.fi/jobs/ml-thesis"}]"#,
        ]);
        let search = Arc::new(MockSearch {
            fail: false,
            queries: Mutex::new(Vec::new()),
        });

        let agent = JobSearcherAgent::new(searcher_spec(), backend.clone())
            .with_search(search.clone())
            .with_fetcher(Arc::new(MockFetcher));

        let output = agent.execute(&prompt("search_jobs_task", "")).await.unwrap();

        assert_eq!(search.queries.lock().unwrap().len(), 2);
        match &output.data {
            StageData::Postings(postings) => assert_eq!(postings[0].company_or_institution, "Acme"),
            other => panic!("expected postings, got {:?}", other),
        }

        let prompts = backend.user_prompts();
        assert_eq!(prompts.len(), 2);
        let final_prompt = &prompts[1];
        assert!(final_prompt.contains("# Web search results"));
        // Shared acme URL is merged, leaving three unique results
        assert!(final_prompt.contains("3. Result for thesis worker ml"));
        assert!(final_prompt.contains("# Fetched pages\n\n## Acme careers"));
        assert!(final_prompt.contains("Python required."));
    }

    #[tokio::test]
    async fn test_all_searches_failing_is_an_error() {
        let backend = ScriptedBackend::new(&["query one"]);
        let search = Arc::new(MockSearch {
            fail: true,
            queries: Mutex::new(Vec::new()),
        });
        let agent = JobSearcherAgent::new(searcher_spec(), backend).with_search(search);

        let err = agent.execute(&prompt("search_jobs_task", "")).await.unwrap_err();
        assert!(matches!(err, AgentError::Tool(msg) if msg.contains("all 1 searches failed") && msg.contains("mock:")));
    }

    #[tokio::test]
    async fn test_without_tools_uses_model_only() {
        let backend = ScriptedBackend::new(&["No tools, but here is what I know."]);
        let agent = JobSearcherAgent::new(spec("job_searcher"), backend.clone());

        let output = agent.execute(&prompt("search_jobs_task", "")).await.unwrap();
        assert_eq!(output.data, StageData::Text);
        assert_eq!(backend.user_prompts().len(), 1);
        assert!(!backend.user_prompts()[0].contains("# Web search results"));
    }
}
