use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use atlas_core::{
    Answerer, AtlasError, Critic, CriticReport, Evidence, Extractor, Fetcher, NO_TASKS_REPORT,
    Planner, RagConfig, ReportComposer, ResearchPlan, ResearchTask, Result, RunnerConfig,
    SubquestionResult, Verdict, WebResult, WebSearch,
};
use atlas_rag::{EmbeddingProvider, HashingEmbeddingProvider, RagError};
use atlas_runner::{
    AbandonReason, CancellationToken, ResearchRunner, ResearchRunnerBuilder, RunControl, RunEvent,
};
use tokio::sync::mpsc;

fn paragraph(topic: &str) -> String {
    format!("{topic} ").repeat(40).trim().to_string()
}

fn plan(subquestions: &[&[&str]]) -> ResearchPlan {
    ResearchPlan {
        overall_goal: "goal".into(),
        tasks: subquestions
            .iter()
            .enumerate()
            .map(|(i, subs)| ResearchTask {
                id: format!("t{}", i + 1),
                description: format!("task {}", i + 1),
                subquestions: subs.iter().map(|s| s.to_string()).collect(),
                document_types: Vec::new(),
            })
            .collect(),
    }
}

fn hit(url: &str) -> WebResult {
    WebResult { title: format!("Title of {url}"), url: url.into(), snippet: String::new() }
}

struct StaticPlanner(ResearchPlan);

#[async_trait]
impl Planner for StaticPlanner {
    async fn plan(&self, _query: &str) -> Result<ResearchPlan> {
        Ok(self.0.clone())
    }
}

/// Returns the scripted hits for each call in turn and optionally cancels a token on a given
/// call number (1-based).
#[derive(Default)]
struct ScriptedSearch {
    responses: Mutex<Vec<Result<Vec<WebResult>>>>,
    calls: AtomicUsize,
    cancel_on: Option<(usize, CancellationToken)>,
}

impl ScriptedSearch {
    fn new(responses: Vec<Result<Vec<WebResult>>>) -> Self {
        Self { responses: Mutex::new(responses), ..Default::default() }
    }

    fn cancelling(mut self, call: usize, token: CancellationToken) -> Self {
        self.cancel_on = Some((call, token));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSearch for ScriptedSearch {
    async fn search(&self, _query: &str) -> Result<Vec<WebResult>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, token)) = &self.cancel_on {
            if *at == call {
                token.cancel();
            }
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() { Ok(Vec::new()) } else { responses.remove(0) }
    }
}

/// Serves page bodies from a map; unknown URLs fail.
#[derive(Default)]
struct MapFetcher {
    pages: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MapFetcher {
    fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages.get(url).cloned().ok_or_else(|| AtlasError::Fetch {
            url: url.into(),
            message: "HTTP 404".into(),
        })
    }
}

/// Treats the fetched body as already-clean text.
struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn extract(&self, raw: &str, _url: Option<&str>) -> String {
        raw.trim().to_string()
    }
}

#[derive(Default)]
struct CitingAnswerer {
    evidence_seen: Mutex<Vec<Vec<Evidence>>>,
}

#[async_trait]
impl Answerer for CitingAnswerer {
    async fn answer(&self, question: &str, evidence: &[Evidence]) -> Result<String> {
        self.evidence_seen.lock().unwrap().push(evidence.to_vec());
        Ok(format!("Answer to {question} [1]"))
    }
}

#[derive(Default)]
struct PassingCritic {
    calls: AtomicUsize,
}

#[async_trait]
impl Critic for PassingCritic {
    async fn critique(&self, _q: &str, _a: &str, _e: &[Evidence]) -> Result<CriticReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CriticReport {
            faithfulness_score: 0.9,
            unsupported_claims: Vec::new(),
            verdict: Verdict::Pass,
            rationale: "grounded".into(),
        })
    }
}

#[derive(Default)]
struct RecordingComposer {
    calls: AtomicUsize,
    results: Mutex<Vec<SubquestionResult>>,
}

#[async_trait]
impl ReportComposer for RecordingComposer {
    async fn compose(
        &self,
        _query: &str,
        _plan: &ResearchPlan,
        results: &[SubquestionResult],
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.results.lock().unwrap() = results.to_vec();
        Ok(format!("# Report\n\n{} answers", results.len()))
    }
}

/// Hashing embeddings that can be told to fail while indexing or while embedding queries.
struct FlakyEmbeddings {
    inner: HashingEmbeddingProvider,
    fail_indexing: bool,
    fail_queries: bool,
}

impl FlakyEmbeddings {
    fn unavailable() -> RagError {
        RagError::EmbeddingError { provider: "Flaky".into(), message: "service unavailable".into() }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbeddings {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, RagError> {
        if self.fail_queries {
            return Err(Self::unavailable());
        }
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, RagError> {
        if self.fail_indexing {
            return Err(Self::unavailable());
        }
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Serves every URL after a per-URL delay and tracks how many fetches overlap.
struct SlowFetcher {
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowFetcher {
    fn new(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(url, ms)| (url.to_string(), Duration::from_millis(*ms)))
                .collect(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Fetcher for SlowFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = self.delays.get(url).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(paragraph(&format!("content of {url}")))
    }
}

struct FailingCritic;

#[async_trait]
impl Critic for FailingCritic {
    async fn critique(&self, _q: &str, _a: &str, _e: &[Evidence]) -> Result<CriticReport> {
        Err(AtlasError::Generation { model: "mock".into(), message: "HTTP 500".into() })
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn abandon_reasons(events: &[RunEvent]) -> Vec<AbandonReason> {
    events
        .iter()
        .filter_map(|event| match event {
            RunEvent::SubquestionAbandoned { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect()
}

struct Harness {
    search: Arc<ScriptedSearch>,
    fetcher: Arc<MapFetcher>,
    answerer: Arc<CitingAnswerer>,
    critic: Arc<PassingCritic>,
    composer: Arc<RecordingComposer>,
}

impl Harness {
    fn new(search: ScriptedSearch, fetcher: MapFetcher) -> Self {
        Self {
            search: Arc::new(search),
            fetcher: Arc::new(fetcher),
            answerer: Arc::new(CitingAnswerer::default()),
            critic: Arc::new(PassingCritic::default()),
            composer: Arc::new(RecordingComposer::default()),
        }
    }

    fn builder(&self, plan: ResearchPlan) -> ResearchRunnerBuilder {
        ResearchRunner::builder()
            .planner(Arc::new(StaticPlanner(plan)))
            .search(self.search.clone())
            .fetcher(self.fetcher.clone())
            .extractor(Arc::new(PlainTextExtractor))
            .embedding_provider(Arc::new(HashingEmbeddingProvider::new(1024)))
            .answerer(self.answerer.clone())
            .critic(self.critic.clone())
            .composer(self.composer.clone())
    }

    fn runner(&self, plan: ResearchPlan) -> ResearchRunner {
        self.builder(plan).build().unwrap()
    }
}

#[tokio::test]
async fn single_subquestion_end_to_end() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![Ok(vec![hit("https://tides.example")])]),
        MapFetcher::default().with_page("https://tides.example", paragraph("tides follow the moon")),
    );
    let runner = harness.runner(plan(&[&["Why do tides happen?"]]));

    let outcome = runner.run("tides").await.unwrap();

    assert!(!outcome.cancelled);
    assert_eq!(outcome.results.len(), 1);
    let result = &outcome.results[0];
    assert_eq!(result.task_id, "t1");
    assert_eq!(result.evidence.len(), 1);
    assert_eq!(result.evidence[0].rank, 1);
    assert_eq!(result.evidence[0].url.as_deref(), Some("https://tides.example"));
    assert!(result.answer.contains("[1]"));
    assert_eq!(result.critic.as_ref().map(|c| c.verdict), Some(Verdict::Pass));

    assert_eq!(outcome.report, "# Report\n\n1 answers");
    assert_eq!(outcome.stats.answered, 1);
    assert_eq!(outcome.stats.documents_indexed, 1);
    assert_eq!(outcome.stats.chunks_indexed, 1);
    assert_eq!(outcome.stats.item_failures, 0);
    assert_eq!(harness.composer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn subquestion_without_search_results_is_abandoned() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![Ok(vec![hit("https://a.example")]), Ok(Vec::new())]),
        MapFetcher::default().with_page("https://a.example", paragraph("solar panels")),
    );
    let runner = harness.runner(plan(&[&["first?", "second?"]]));

    let outcome = runner.run("q").await.unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].subquestion, "first?");
    assert_eq!(outcome.stats.subquestions, 2);
    assert_eq!(outcome.stats.abandoned, 1);
    assert_eq!(harness.composer.results.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_plan_short_circuits() {
    let harness = Harness::new(ScriptedSearch::default(), MapFetcher::default());
    let runner = harness.runner(ResearchPlan::default());

    let outcome = runner.run("q").await.unwrap();

    assert_eq!(outcome.report, NO_TASKS_REPORT);
    assert!(outcome.results.is_empty());
    assert_eq!(harness.search.calls(), 0);
    assert_eq!(harness.fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.composer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_subquestions_are_skipped() {
    let harness = Harness::new(ScriptedSearch::default(), MapFetcher::default());
    let runner = harness.runner(plan(&[&["   ", ""]]));

    let outcome = runner.run("q").await.unwrap();

    assert_eq!(outcome.stats.subquestions, 0);
    assert_eq!(harness.search.calls(), 0);
    assert_eq!(harness.composer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancellation_composes_partial_report() {
    let token = CancellationToken::new();
    let harness = Harness::new(
        ScriptedSearch::new(vec![
            Ok(vec![hit("https://a.example")]),
            Ok(vec![hit("https://b.example")]),
        ])
        .cancelling(2, token.clone()),
        MapFetcher::default()
            .with_page("https://a.example", paragraph("alpha content"))
            .with_page("https://b.example", paragraph("beta content")),
    );
    let runner = harness.runner(plan(&[&["one?", "two?", "three?"]]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = runner
        .run_with("q", RunControl::new().with_cancellation(token).with_events(tx))
        .await
        .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.stats.subquestions, 2);
    assert_eq!(harness.search.calls(), 2);
    assert_eq!(harness.composer.calls.load(Ordering::SeqCst), 1);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(events.contains(&RunEvent::SubquestionAbandoned {
        subquestion: "two?".into(),
        reason: AbandonReason::Cancelled,
    }));
    assert_eq!(events.last(), Some(&RunEvent::Finished { cancelled: true }));
}

#[tokio::test]
async fn failed_fetch_is_skipped_and_counted() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![Ok(vec![hit("https://missing.example"), hit("https://ok.example")])]),
        MapFetcher::default().with_page("https://ok.example", paragraph("good page")),
    );
    let runner = harness.runner(plan(&[&["q?"]]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = runner.run_with("q", RunControl::new().with_events(tx)).await.unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.stats.item_failures, 1);
    assert_eq!(outcome.stats.documents_indexed, 1);

    let mut skipped = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let RunEvent::DocumentSkipped { url, .. } = event {
            skipped.push(url);
        }
    }
    assert_eq!(skipped, vec!["https://missing.example".to_string()]);
}

#[tokio::test]
async fn error_budget_aborts_the_run() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![Ok(vec![hit("https://missing.example")])]),
        MapFetcher::default(),
    );
    let runner = harness
        .builder(plan(&[&["q?"]]))
        .runner_config(RunnerConfig { max_item_failures: Some(0), ..Default::default() })
        .build()
        .unwrap();

    let err = runner.run("q").await.unwrap_err();

    assert!(matches!(err, AtlasError::ErrorBudgetExhausted { failures: 1, budget: 0 }));
    assert_eq!(harness.composer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn page_without_text_leaves_no_documents() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![Ok(vec![hit("https://blank.example")])]),
        MapFetcher::default().with_page("https://blank.example", "   \n  "),
    );
    let runner = harness.runner(plan(&[&["q?"]]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = runner.run_with("q", RunControl::new().with_events(tx)).await.unwrap();

    assert!(outcome.results.is_empty());
    assert_eq!(outcome.stats.item_failures, 0);
    let mut reasons = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let RunEvent::SubquestionAbandoned { reason, .. } = event {
            reasons.push(reason);
        }
    }
    assert_eq!(reasons, vec![AbandonReason::NoDocuments]);
}

#[tokio::test]
async fn search_failure_is_recoverable() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![
            Err(AtlasError::Search("rate limited".into())),
            Ok(vec![hit("https://b.example")]),
        ]),
        MapFetcher::default().with_page("https://b.example", paragraph("beta content")),
    );
    let runner = harness.runner(plan(&[&["a?"], &["b?"]]));

    let outcome = runner.run("q").await.unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].task_id, "t2");
    assert_eq!(outcome.stats.item_failures, 1);
    assert_eq!(outcome.stats.abandoned, 1);
}

#[tokio::test]
async fn critic_can_be_disabled() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![Ok(vec![hit("https://a.example")])]),
        MapFetcher::default().with_page("https://a.example", paragraph("alpha content")),
    );
    let runner = harness
        .builder(plan(&[&["a?"]]))
        .runner_config(RunnerConfig { use_critic: false, ..Default::default() })
        .build()
        .unwrap();

    let outcome = runner.run("q").await.unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert!(outcome.results[0].critic.is_none());
    assert_eq!(harness.critic.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn evidence_is_shared_across_subquestions_of_a_run() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![
            Ok(vec![hit("https://a.example")]),
            Ok(vec![hit("https://b.example")]),
        ]),
        MapFetcher::default()
            .with_page("https://a.example", paragraph("alpha content"))
            .with_page("https://b.example", paragraph("beta content")),
    );
    let runner = harness.runner(plan(&[&["alpha?", "beta?"]]));

    runner.run("q").await.unwrap();

    let seen = harness.answerer.evidence_seen.lock().unwrap();
    assert_eq!(seen[0].len(), 1);
    assert_eq!(seen[1].len(), 2);
}

#[tokio::test]
async fn each_run_starts_with_an_empty_index() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![
            Ok(vec![hit("https://a.example")]),
            Ok(vec![hit("https://a.example")]),
        ]),
        MapFetcher::default().with_page("https://a.example", paragraph("alpha content")),
    );
    let runner = harness.runner(plan(&[&["alpha?"]]));

    runner.run("first").await.unwrap();
    runner.run("second").await.unwrap();

    let seen = harness.answerer.evidence_seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].len(), 1);
}

#[test]
fn builder_requires_collaborators() {
    let err = ResearchRunner::builder().build().err().unwrap();
    assert!(matches!(err, AtlasError::Config(ref m) if m == "planner is required"));
}

#[test]
fn builder_rejects_zero_concurrency() {
    let harness = Harness::new(ScriptedSearch::default(), MapFetcher::default());
    let result = harness
        .builder(ResearchPlan::default())
        .runner_config(RunnerConfig { fetch_concurrency: 0, ..Default::default() })
        .build();
    assert!(matches!(result, Err(AtlasError::Config(_))));
}

#[test]
fn builder_validates_rag_config() {
    let harness = Harness::new(ScriptedSearch::default(), MapFetcher::default());
    let mut rag = RagConfig::default();
    rag.top_k = 0;
    assert!(harness.builder(ResearchPlan::default()).rag_config(rag).build().is_err());
}

#[tokio::test]
async fn indexing_failure_skips_the_document() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![Ok(vec![hit("https://a.example")])]),
        MapFetcher::default().with_page("https://a.example", paragraph("alpha content")),
    );
    let runner = harness
        .builder(plan(&[&["a?"]]))
        .embedding_provider(Arc::new(FlakyEmbeddings {
            inner: HashingEmbeddingProvider::new(256),
            fail_indexing: true,
            fail_queries: false,
        }))
        .build()
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = runner.run_with("q", RunControl::new().with_events(tx)).await.unwrap();

    assert!(outcome.results.is_empty());
    assert_eq!(outcome.stats.item_failures, 1);
    assert_eq!(outcome.stats.documents_indexed, 0);
    let events = drain(&mut rx);
    assert_eq!(abandon_reasons(&events), vec![AbandonReason::NoDocuments]);
    assert!(events.iter().any(|e| matches!(e, RunEvent::DocumentSkipped { .. })));
    assert!(harness.answerer.evidence_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn retrieval_failure_abandons_without_answering() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![Ok(vec![hit("https://a.example")])]),
        MapFetcher::default().with_page("https://a.example", paragraph("alpha content")),
    );
    let runner = harness
        .builder(plan(&[&["a?"]]))
        .embedding_provider(Arc::new(FlakyEmbeddings {
            inner: HashingEmbeddingProvider::new(256),
            fail_indexing: false,
            fail_queries: true,
        }))
        .build()
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = runner.run_with("q", RunControl::new().with_events(tx)).await.unwrap();

    assert!(outcome.results.is_empty());
    assert_eq!(outcome.stats.item_failures, 1);
    assert_eq!(outcome.stats.documents_indexed, 1);
    assert_eq!(abandon_reasons(&drain(&mut rx)), vec![AbandonReason::NoEvidence]);
    assert!(harness.answerer.evidence_seen.lock().unwrap().is_empty());
    assert_eq!(harness.composer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_fetches_are_indexed_in_result_order() {
    let urls = ["https://1.example", "https://2.example", "https://3.example", "https://4.example"];
    let harness = Harness::new(
        ScriptedSearch::new(vec![Ok(urls.iter().map(|u| hit(u)).collect())]),
        MapFetcher::default(),
    );
    // Earlier results take longer, so completion order is the reverse of result order.
    let fetcher = Arc::new(SlowFetcher::new(&[
        (urls[0], 80),
        (urls[1], 60),
        (urls[2], 40),
        (urls[3], 20),
    ]));
    let runner = harness
        .builder(plan(&[&["content?"]]))
        .fetcher(fetcher.clone())
        .runner_config(RunnerConfig { fetch_concurrency: 3, ..Default::default() })
        .build()
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = runner.run_with("q", RunControl::new().with_events(tx)).await.unwrap();

    assert!(fetcher.max_in_flight.load(Ordering::SeqCst) > 1);
    let events = drain(&mut rx);
    let indexed: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::DocumentIndexed { url, .. } => Some(url.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(indexed, urls);

    // Retrieval only starts once every document of the sub-question is indexed.
    let last_indexed = events
        .iter()
        .rposition(|e| matches!(e, RunEvent::DocumentIndexed { .. }))
        .unwrap();
    let retrieved = events
        .iter()
        .position(|e| matches!(e, RunEvent::EvidenceRetrieved { .. }))
        .unwrap();
    assert!(last_indexed < retrieved);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].evidence.len(), 4);
}

#[tokio::test]
async fn critic_failure_keeps_the_answer() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![Ok(vec![hit("https://a.example")])]),
        MapFetcher::default().with_page("https://a.example", paragraph("alpha content")),
    );
    let runner = harness
        .builder(plan(&[&["a?"]]))
        .critic(Arc::new(FailingCritic))
        .build()
        .unwrap();

    let outcome = runner.run("q").await.unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert!(outcome.results[0].answer.contains("[1]"));
    assert!(outcome.results[0].critic.is_none());
    assert_eq!(outcome.stats.item_failures, 1);
    assert_eq!(outcome.stats.answered, 1);
}

#[tokio::test]
async fn unrecoverable_search_error_ends_the_run() {
    let harness = Harness::new(
        ScriptedSearch::new(vec![Err(AtlasError::Config("search backend misconfigured".into()))]),
        MapFetcher::default(),
    );
    let runner = harness.runner(plan(&[&["a?"]]));

    let err = runner.run("q").await.unwrap_err();

    assert!(matches!(err, AtlasError::Config(_)));
    assert_eq!(harness.composer.calls.load(Ordering::SeqCst), 0);
}
