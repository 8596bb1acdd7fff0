//! The research orchestrator.
//!
//! [`ResearchRunner`] drives one query through the whole pipeline:
//!
//! ```text
//! plan -> for each task, for each sub-question:
//!           search -> fetch + extract -> index -> retrieve -> answer -> critique
//!      -> compose
//! ```
//!
//! Every run gets a fresh [`EmbeddingIndex`], shared by all sub-questions of that run and
//! dropped when the run ends. Per-item failures (a page that will not download, a search or
//! embedding call that errors, a critic that fails) are logged, counted, and skipped; a
//! sub-question that ends up with no documents or no evidence is abandoned rather than
//! answered. Planner, answerer and composer failures end the run.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;

use atlas_core::{
    Answerer, AtlasError, CleanedDocument, Critic, Extractor, Fetcher, NO_TASKS_REPORT, Planner,
    RagConfig, ReportComposer, ResearchPlan, ResearchTask, Result, RunnerConfig,
    SubquestionResult, WebResult, WebSearch,
};
use atlas_rag::{Chunker, EmbeddingIndex, EmbeddingProvider, EvidenceRetriever, ParagraphChunker};
use futures::{StreamExt, stream};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::event::{AbandonReason, RunEvent};
use crate::outcome::{RunOutcome, RunStats};

/// Per-run handles: a cancellation token and an optional progress channel.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    cancel: CancellationToken,
    events: Option<UnboundedSender<RunEvent>>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the run when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Send a [`RunEvent`] to `events` for every step.
    pub fn with_events(mut self, events: UnboundedSender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[derive(Debug, Clone)]
struct RunSettings {
    top_k: usize,
    similarity_threshold: Option<f32>,
    use_critic: bool,
    fetch_concurrency: usize,
    max_item_failures: Option<usize>,
}

/// Runs research queries end to end. Construct one via [`ResearchRunner::builder()`].
///
/// # Example
///
/// ```rust,ignore
/// use atlas_runner::ResearchRunner;
///
/// let runner = ResearchRunner::builder()
///     .planner(planner)
///     .search(search)
///     .fetcher(fetcher)
///     .extractor(extractor)
///     .embedding_provider(embeddings)
///     .answerer(answerer)
///     .critic(critic)
///     .composer(composer)
///     .build()?;
///
/// let outcome = runner.run("How do tidal power plants work?").await?;
/// println!("{}", outcome.report);
/// ```
pub struct ResearchRunner {
    planner: Arc<dyn Planner>,
    search: Arc<dyn WebSearch>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
    answerer: Arc<dyn Answerer>,
    critic: Option<Arc<dyn Critic>>,
    composer: Arc<dyn ReportComposer>,
    settings: RunSettings,
}

/// Mutable state owned by one run.
struct RunState {
    index: Arc<EmbeddingIndex>,
    retriever: EvidenceRetriever,
    results: Vec<SubquestionResult>,
    stats: RunStats,
    budget: Option<usize>,
    events: Option<UnboundedSender<RunEvent>>,
}

impl RunState {
    fn emit(&self, event: RunEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = events.send(event);
        }
    }

    /// Count `error` as a skipped item if it is recoverable; anything else ends the run.
    fn recover(&mut self, error: AtlasError) -> Result<AtlasError> {
        if !error.is_recoverable() {
            return Err(error);
        }
        self.record_failure()?;
        Ok(error)
    }

    /// Count a recovered failure, failing the run once the budget is exceeded.
    fn record_failure(&mut self) -> Result<()> {
        self.stats.item_failures += 1;
        match self.budget {
            Some(budget) if self.stats.item_failures > budget => {
                Err(AtlasError::ErrorBudgetExhausted { failures: self.stats.item_failures, budget })
            }
            _ => Ok(()),
        }
    }
}

enum Step {
    Answered(SubquestionResult),
    Abandoned(AbandonReason),
}

enum Fetched {
    Document(CleanedDocument),
    Failed { url: String, error: AtlasError },
    Empty { url: String },
}

/// Await `fut` unless `token` is cancelled first.
async fn or_cancel<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}

impl ResearchRunner {
    /// Create a new [`ResearchRunnerBuilder`].
    pub fn builder() -> ResearchRunnerBuilder {
        ResearchRunnerBuilder::default()
    }

    /// Run `query` to completion with no progress channel and no external cancellation.
    ///
    /// # Errors
    ///
    /// Returns the planner, answerer or composer error that ended the run, or
    /// [`AtlasError::ErrorBudgetExhausted`].
    pub async fn run(&self, query: &str) -> Result<RunOutcome> {
        self.run_with(query, RunControl::default()).await
    }

    /// Run `query`, reporting progress and honouring cancellation through `control`.
    ///
    /// On cancellation the sub-question in flight is abandoned, the rest are skipped, and the
    /// report is composed from the results gathered so far.
    pub async fn run_with(&self, query: &str, control: RunControl) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        let span = info_span!("research_run", %run_id, query);
        self.execute(run_id, query, control).instrument(span).await
    }

    fn new_state(&self, control: &RunControl) -> RunState {
        let index = Arc::new(EmbeddingIndex::new(
            Arc::clone(&self.embedding_provider),
            Arc::clone(&self.chunker),
        ));
        let mut retriever = EvidenceRetriever::new(Arc::clone(&index), self.settings.top_k);
        if let Some(threshold) = self.settings.similarity_threshold {
            retriever = retriever.with_similarity_threshold(threshold);
        }
        RunState {
            index,
            retriever,
            results: Vec::new(),
            stats: RunStats::default(),
            budget: self.settings.max_item_failures,
            events: control.events.clone(),
        }
    }

    async fn execute(&self, run_id: Uuid, query: &str, control: RunControl) -> Result<RunOutcome> {
        let cancel = &control.cancel;
        let mut run = self.new_state(&control);
        info!("research run started");

        let plan = match or_cancel(cancel, self.planner.plan(query)).await {
            Some(plan) => plan?,
            None => ResearchPlan::default(),
        };
        run.stats.tasks = plan.tasks.len();
        run.emit(RunEvent::PlanReady {
            task_count: plan.tasks.len(),
            subquestion_count: plan.subquestion_count(),
        });

        if plan.is_empty() && !cancel.is_cancelled() {
            info!("planner produced no tasks");
            run.emit(RunEvent::Finished { cancelled: false });
            return Ok(RunOutcome {
                run_id,
                query: query.to_string(),
                plan,
                results: Vec::new(),
                report: NO_TASKS_REPORT.to_string(),
                cancelled: false,
                stats: run.stats,
            });
        }

        'tasks: for task in &plan.tasks {
            if cancel.is_cancelled() {
                break;
            }
            run.emit(RunEvent::TaskStarted {
                task_id: task.display_id().to_string(),
                description: task.description.clone(),
            });

            for subquestion in &task.subquestions {
                if cancel.is_cancelled() {
                    break 'tasks;
                }
                let subquestion = subquestion.trim();
                if subquestion.is_empty() {
                    debug!(task_id = %task.display_id(), "skipping empty sub-question");
                    continue;
                }
                run.stats.subquestions += 1;

                let span = info_span!("subquestion", task_id = %task.display_id(), subquestion);
                let step = self
                    .research_subquestion(task, subquestion, &mut run, cancel)
                    .instrument(span)
                    .await?;
                match step {
                    Step::Answered(result) => {
                        run.stats.answered += 1;
                        run.results.push(result);
                    }
                    Step::Abandoned(reason) => {
                        info!(subquestion, %reason, "sub-question abandoned");
                        run.stats.abandoned += 1;
                        run.emit(RunEvent::SubquestionAbandoned {
                            subquestion: subquestion.to_string(),
                            reason,
                        });
                    }
                }
            }
        }

        let cancelled = cancel.is_cancelled();
        if cancelled {
            warn!(answered = run.stats.answered, "run cancelled; composing partial report");
        }

        run.emit(RunEvent::Composing { result_count: run.results.len() });
        let report = self.composer.compose(query, &plan, &run.results).await?;
        run.emit(RunEvent::Finished { cancelled });

        info!(
            answered = run.stats.answered,
            abandoned = run.stats.abandoned,
            documents_indexed = run.stats.documents_indexed,
            chunks_indexed = run.stats.chunks_indexed,
            item_failures = run.stats.item_failures,
            cancelled,
            "research run finished"
        );

        Ok(RunOutcome {
            run_id,
            query: query.to_string(),
            plan,
            results: run.results,
            report,
            cancelled,
            stats: run.stats,
        })
    }

    async fn research_subquestion(
        &self,
        task: &ResearchTask,
        subquestion: &str,
        run: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<Step> {
        run.emit(RunEvent::SubquestionStarted {
            task_id: task.display_id().to_string(),
            subquestion: subquestion.to_string(),
        });

        let hits = match or_cancel(cancel, self.search.search(subquestion)).await {
            None => return Ok(Step::Abandoned(AbandonReason::Cancelled)),
            Some(Ok(hits)) => hits,
            Some(Err(e)) => {
                warn!(error = %e, "search failed");
                run.recover(e)?;
                return Ok(Step::Abandoned(AbandonReason::SearchFailed));
            }
        };
        let hits: Vec<WebResult> = hits.into_iter().filter(|h| !h.url.trim().is_empty()).collect();
        run.emit(RunEvent::SearchResults {
            subquestion: subquestion.to_string(),
            count: hits.len(),
        });
        if hits.is_empty() {
            return Ok(Step::Abandoned(AbandonReason::NoSearchResults));
        }
        if cancel.is_cancelled() {
            return Ok(Step::Abandoned(AbandonReason::Cancelled));
        }

        let mut documents: Vec<CleanedDocument> = Vec::new();
        let mut fetched = pin!(
            stream::iter(hits)
                .map(|hit| self.fetch_and_extract(hit))
                .buffered(self.settings.fetch_concurrency.max(1))
        );

        loop {
            let next = match or_cancel(cancel, fetched.next()).await {
                None => return Ok(Step::Abandoned(AbandonReason::Cancelled)),
                Some(None) => break,
                Some(Some(next)) => next,
            };
            match next {
                Fetched::Document(doc) => {
                    match run.index.add_document(&doc.text, Some(&doc.url)).await {
                        Ok(0) => run.emit(RunEvent::DocumentSkipped {
                            url: doc.url,
                            reason: "no chunks".to_string(),
                        }),
                        Ok(chunks) => {
                            run.stats.documents_indexed += 1;
                            run.stats.chunks_indexed += chunks;
                            run.emit(RunEvent::DocumentIndexed {
                                url: doc.url.clone(),
                                title: doc.title.clone(),
                                chunks,
                            });
                            documents.push(doc);
                        }
                        Err(e) => {
                            warn!(document.url = %doc.url, error = %e, "indexing failed");
                            let error = run.recover(e.into())?;
                            run.emit(RunEvent::DocumentSkipped {
                                url: doc.url,
                                reason: error.to_string(),
                            });
                        }
                    }
                }
                Fetched::Failed { url, error } => {
                    warn!(document.url = %url, error = %error, "fetch failed");
                    let error = run.recover(error)?;
                    run.emit(RunEvent::DocumentSkipped { url, reason: error.to_string() });
                }
                Fetched::Empty { url } => {
                    debug!(document.url = %url, "no extractable text");
                    run.emit(RunEvent::DocumentSkipped {
                        url,
                        reason: "no extractable text".to_string(),
                    });
                }
            }
        }

        if documents.is_empty() {
            return Ok(Step::Abandoned(AbandonReason::NoDocuments));
        }
        if cancel.is_cancelled() {
            return Ok(Step::Abandoned(AbandonReason::Cancelled));
        }

        let evidence = match run.retriever.retrieve_evidence(subquestion).await {
            Ok(evidence) => evidence,
            Err(e) => {
                warn!(error = %e, "retrieval failed");
                run.recover(e.into())?;
                return Ok(Step::Abandoned(AbandonReason::NoEvidence));
            }
        };
        run.emit(RunEvent::EvidenceRetrieved {
            subquestion: subquestion.to_string(),
            count: evidence.len(),
        });
        if evidence.is_empty() {
            return Ok(Step::Abandoned(AbandonReason::NoEvidence));
        }

        let answer = match or_cancel(cancel, self.answerer.answer(subquestion, &evidence)).await {
            None => return Ok(Step::Abandoned(AbandonReason::Cancelled)),
            Some(answer) => answer?,
        };
        run.emit(RunEvent::AnswerProduced { subquestion: subquestion.to_string() });

        let critic = match (&self.critic, self.settings.use_critic) {
            (Some(critic), true) => {
                match or_cancel(cancel, critic.critique(subquestion, &answer, &evidence)).await {
                    None => None,
                    Some(Ok(report)) => {
                        run.emit(RunEvent::CritiqueProduced {
                            subquestion: subquestion.to_string(),
                            verdict: report.verdict,
                            score: report.faithfulness_score,
                        });
                        Some(report)
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "critique failed; keeping answer without it");
                        run.record_failure()?;
                        None
                    }
                }
            }
            _ => None,
        };

        info!(evidence_count = evidence.len(), documents = documents.len(), "sub-question answered");
        Ok(Step::Answered(SubquestionResult {
            task_id: task.id.clone(),
            task_description: task.description.clone(),
            subquestion: subquestion.to_string(),
            answer,
            evidence,
            critic,
        }))
    }

    async fn fetch_and_extract(&self, hit: WebResult) -> Fetched {
        let raw = match self.fetcher.fetch(&hit.url).await {
            Ok(raw) => raw,
            Err(error) => return Fetched::Failed { url: hit.url, error },
        };
        let text = self.extractor.extract(&raw, Some(&hit.url));
        if text.trim().is_empty() {
            Fetched::Empty { url: hit.url }
        } else {
            Fetched::Document(CleanedDocument { url: hit.url, title: hit.title, text })
        }
    }
}

/// Builder for [`ResearchRunner`].
#[derive(Default)]
pub struct ResearchRunnerBuilder {
    planner: Option<Arc<dyn Planner>>,
    search: Option<Arc<dyn WebSearch>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    extractor: Option<Arc<dyn Extractor>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
    answerer: Option<Arc<dyn Answerer>>,
    critic: Option<Arc<dyn Critic>>,
    composer: Option<Arc<dyn ReportComposer>>,
    rag: RagConfig,
    runner: RunnerConfig,
}

impl ResearchRunnerBuilder {
    pub fn planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Override the chunker. Defaults to [`ParagraphChunker`] built from the RAG config.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    pub fn answerer(mut self, answerer: Arc<dyn Answerer>) -> Self {
        self.answerer = Some(answerer);
        self
    }

    /// Grade answers with `critic` (still subject to `RunnerConfig::use_critic`).
    pub fn critic(mut self, critic: Arc<dyn Critic>) -> Self {
        self.critic = Some(critic);
        self
    }

    pub fn composer(mut self, composer: Arc<dyn ReportComposer>) -> Self {
        self.composer = Some(composer);
        self
    }

    /// Chunking and retrieval settings.
    pub fn rag_config(mut self, config: RagConfig) -> Self {
        self.rag = config;
        self
    }

    /// Critic toggle, fetch concurrency and error budget.
    pub fn runner_config(mut self, config: RunnerConfig) -> Self {
        self.runner = config;
        self
    }

    /// Build the [`ResearchRunner`], validating that all required collaborators are set.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::Config`] if a required collaborator is missing or the settings
    /// are invalid.
    pub fn build(self) -> Result<ResearchRunner> {
        fn required<T: ?Sized>(value: Option<Arc<T>>, name: &str) -> Result<Arc<T>> {
            value.ok_or_else(|| AtlasError::Config(format!("{name} is required")))
        }

        self.rag.validate()?;
        if self.runner.fetch_concurrency == 0 {
            return Err(AtlasError::Config("fetch_concurrency must be greater than 0".into()));
        }

        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(ParagraphChunker::from_config(&self.rag)),
        };

        Ok(ResearchRunner {
            planner: required(self.planner, "planner")?,
            search: required(self.search, "search")?,
            fetcher: required(self.fetcher, "fetcher")?,
            extractor: required(self.extractor, "extractor")?,
            embedding_provider: required(self.embedding_provider, "embedding_provider")?,
            chunker,
            answerer: required(self.answerer, "answerer")?,
            critic: self.critic,
            composer: required(self.composer, "composer")?,
            settings: RunSettings {
                top_k: self.rag.top_k,
                similarity_threshold: self.rag.similarity_threshold,
                use_critic: self.runner.use_critic,
                fetch_concurrency: self.runner.fetch_concurrency,
                max_item_failures: self.runner.max_item_failures,
            },
        })
    }
}
