//! The batch engine: one synchronous entry point over all six stages.
//!
//! `run_batch` is the only write path into the archive. Scan and classify
//! fan out over the rayon pool, routing runs on a private tokio runtime
//! with the router's own in-flight bound, and everything from linking on
//! is serialized. A record that fails never aborts the batch; it lands in
//! the report's rejected list with a reason.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use creek_core::config::CreekConfig;
use creek_core::constants::MAX_BATCH_SIZE;
use creek_core::errors::{CreekError, CreekResult};
use creek_core::fragment::{ClassificationVector, Fragment, SourceRecord};
use creek_core::models::{
    BatchReport, ContradictionMark, Eddy, ParadoxRecord, RejectedRecord, ReviewEntry,
    SynchronicityRecord, Thread,
};
use creek_core::traits::{IEmbeddingProvider, ISecondaryClassifier};

use creek_classify::{RouteDecision, RouteOutcome, Router, SignalClassifier};
use creek_detect::DetectEngine;
use creek_embeddings::EmbeddingEngine;
use creek_link::LinkingEngine;
use creek_redact::{AuditLog, RedactionEngine};

use crate::cancel::CancelToken;

/// Everything one batch run hands back: the committed fragments with their
/// final vectors and link ids, the review queue, and the stage counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    pub fragments: Vec<Fragment>,
    pub review_queue: Vec<ReviewEntry>,
    pub report: BatchReport,
}

/// Owns every stage engine plus the archive they feed.
///
/// `run_batch` is a blocking call; one runs at a time and a second caller
/// gets `CreekError::Busy` instead of queueing. The engine is `&self`
/// throughout, so it can sit behind an `Arc` and serve readers while a
/// batch is in flight.
pub struct PipelineEngine {
    config: CreekConfig,
    redactor: RedactionEngine,
    audit: AuditLog,
    classifier: SignalClassifier,
    router: Arc<Router>,
    embedder: EmbeddingEngine,
    linker: LinkingEngine,
    detector: Mutex<DetectEngine>,
    /// Committed fragments by id. Redacted text only.
    archive: RwLock<BTreeMap<String, Fragment>>,
    /// Fragment id to salted raw hash, for duplicate detection across
    /// batches. Written at commit, so a cancelled run leaves no trace here.
    raw_hashes: DashMap<String, String>,
    /// Guard: only one batch can run at a time.
    is_running: Arc<AtomicBool>,
    /// Drives the routing stage. The public entry point stays synchronous.
    runtime: tokio::runtime::Runtime,
}

impl PipelineEngine {
    /// Build an engine from config with the default deterministic embedding
    /// provider and no secondary classifier. Validation failures and
    /// malformed custom patterns are fatal here, before any record moves.
    pub fn new(config: CreekConfig) -> CreekResult<Self> {
        Self::with_capabilities(config, None, None)
    }

    /// Build an engine around caller-supplied capabilities: a secondary
    /// classifier for the router's low-confidence path and an embedding
    /// provider replacing the built-in one.
    pub fn with_capabilities(
        config: CreekConfig,
        secondary: Option<Arc<dyn ISecondaryClassifier>>,
        embedding_provider: Option<Box<dyn IEmbeddingProvider>>,
    ) -> CreekResult<Self> {
        config.validate()?;
        let redactor = RedactionEngine::new(&config.redaction)?;
        let classifier = SignalClassifier::new(
            config.taxonomy.clone(),
            config.classify.confidence_saturation,
            config.classify.dual_margin,
        );
        let router = Arc::new(Router::new(
            config.classify.clone(),
            config.taxonomy.clone(),
            secondary,
        ));
        let embedder = match embedding_provider {
            Some(provider) => EmbeddingEngine::with_provider(provider, &config.embedding),
            None => EmbeddingEngine::new(&config.embedding),
        };
        let linker = LinkingEngine::new(config.linking.clone());
        let detector = Mutex::new(DetectEngine::new(config.detect.clone()));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        info!(
            provider = embedder.provider_name(),
            parallel = config.pipeline.parallel,
            "pipeline engine initialized"
        );
        Ok(Self {
            config,
            redactor,
            audit: AuditLog::new(),
            classifier,
            router,
            embedder,
            linker,
            detector,
            archive: RwLock::new(BTreeMap::new()),
            raw_hashes: DashMap::new(),
            is_running: Arc::new(AtomicBool::new(false)),
            runtime,
        })
    }

    /// Run one batch through scan, classify, route, embed, link, and
    /// detect. Blocking; returns `CreekError::Busy` if a run is already in
    /// flight and `CreekError::Cancelled` if the token was tripped before
    /// the run started.
    ///
    /// A token tripped mid-run finishes the fragment in flight, stops
    /// before the next stage, and commits nothing; audit entries already
    /// appended stay, and the report comes back with `cancelled` set. Once
    /// the batch is linked it always commits, even if cancellation then
    /// skips detection.
    ///
    /// An empty batch still runs detection against the existing archive,
    /// which lets a caller advance dormancy with the clock.
    pub fn run_batch(
        &self,
        records: Vec<SourceRecord>,
        cancel: &CancelToken,
    ) -> CreekResult<BatchOutput> {
        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CreekError::Busy);
        }
        let result = self.run_batch_inner(records, cancel);
        self.is_running.store(false, Ordering::SeqCst);
        result
    }

    fn run_batch_inner(
        &self,
        records: Vec<SourceRecord>,
        cancel: &CancelToken,
    ) -> CreekResult<BatchOutput> {
        if cancel.is_cancelled() {
            return Err(CreekError::Cancelled);
        }
        if records.len() > MAX_BATCH_SIZE {
            return Err(CreekError::Integrity {
                message: format!(
                    "batch of {} records exceeds the cap of {}",
                    records.len(),
                    MAX_BATCH_SIZE
                ),
            });
        }

        let started = Instant::now();
        let now = Utc::now();
        let mut report = BatchReport {
            records_in: records.len(),
            ..BatchReport::default()
        };
        info!(
            records = report.records_in,
            parallel = self.config.pipeline.parallel,
            "batch run started"
        );

        // Scan. Each record is redacted, checked against the duplicate
        // registry, and audited as one atomic unit; ordering of kept
        // fragments follows input order in both modes.
        let rejected: Mutex<Vec<RejectedRecord>> = Mutex::new(Vec::new());
        let warnings: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let matches_found = AtomicUsize::new(0);
        let seen: DashMap<String, String> = DashMap::new();

        let mut fragments: Vec<Fragment> = {
            let scan_one = |record: &SourceRecord| -> Option<Fragment> {
                if self.redactor.is_dry_run() {
                    let entries = self.redactor.scan_only(record, now);
                    matches_found.fetch_add(entries.len(), Ordering::Relaxed);
                    if let Err(err) = self.audit.append_batch(entries) {
                        if let Ok(mut held) = rejected.lock() {
                            held.push(RejectedRecord {
                                origin_path: record.origin_path.clone(),
                                reason: format!("audit append failed: {err}"),
                            });
                        }
                    }
                    return None;
                }

                let (fragment, entries) = self.redactor.process(record, now);

                if let Some(prior) = self.raw_hashes.get(&fragment.id) {
                    if *prior == fragment.raw_hash {
                        debug!(fragment_id = %fragment.id, "already ingested; skipped");
                        if let Ok(mut held) = warnings.lock() {
                            held.push(format!(
                                "fragment {} from {} already ingested; skipped",
                                fragment.id, record.origin_path
                            ));
                        }
                    } else {
                        warn!(fragment_id = %fragment.id, "id collision with different content");
                        if let Ok(mut held) = rejected.lock() {
                            held.push(RejectedRecord {
                                origin_path: record.origin_path.clone(),
                                reason: format!(
                                    "fragment {} already exists with different content",
                                    fragment.id
                                ),
                            });
                        }
                    }
                    return None;
                }

                match seen.entry(fragment.id.clone()) {
                    Entry::Occupied(held_hash) => {
                        if *held_hash.get() == fragment.raw_hash {
                            if let Ok(mut held) = warnings.lock() {
                                held.push(format!(
                                    "fragment {} duplicated within the batch; skipped",
                                    fragment.id
                                ));
                            }
                        } else if let Ok(mut held) = rejected.lock() {
                            held.push(RejectedRecord {
                                origin_path: record.origin_path.clone(),
                                reason: format!(
                                    "fragment {} already exists with different content",
                                    fragment.id
                                ),
                            });
                        }
                        return None;
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(fragment.raw_hash.clone());
                    }
                }

                // Matched content surviving redaction must never be
                // committed. The audit trail still records the matches.
                if !self.redactor.rescan(&fragment.text).is_empty() {
                    warn!(fragment_id = %fragment.id, "redacted text still matches; rejected");
                    let _ = self.audit.append_batch(entries);
                    if let Ok(mut held) = rejected.lock() {
                        held.push(RejectedRecord {
                            origin_path: record.origin_path.clone(),
                            reason: "redacted text still matches a sensitive pattern".to_string(),
                        });
                    }
                    return None;
                }

                if let Err(err) = self.audit.append_batch(entries) {
                    if let Ok(mut held) = rejected.lock() {
                        held.push(RejectedRecord {
                            origin_path: record.origin_path.clone(),
                            reason: format!("audit append failed: {err}"),
                        });
                    }
                    return None;
                }
                matches_found.fetch_add(fragment.redaction_count, Ordering::Relaxed);
                Some(fragment)
            };

            if self.config.pipeline.parallel {
                records
                    .par_iter()
                    .filter_map(|record| {
                        if cancel.is_cancelled() {
                            return None;
                        }
                        scan_one(record)
                    })
                    .collect()
            } else {
                let mut kept = Vec::new();
                for record in &records {
                    if cancel.is_cancelled() {
                        break;
                    }
                    if let Some(fragment) = scan_one(record) {
                        kept.push(fragment);
                    }
                }
                kept
            }
        };
        drop(records);

        report.rejected = rejected.into_inner().unwrap_or_default();
        report.warnings = warnings.into_inner().unwrap_or_default();
        report.redaction_matches = matches_found.load(Ordering::Relaxed);
        debug!(
            kept = fragments.len(),
            rejected = report.rejected.len(),
            matches = report.redaction_matches,
            "scan stage complete"
        );
        if cancel.is_cancelled() {
            return Ok(finish_cancelled(report, started));
        }

        // Classify. Pure per fragment; output stays aligned with the
        // fragment list.
        let vectors: Vec<ClassificationVector> = if self.config.pipeline.parallel {
            fragments
                .par_iter()
                .map(|fragment| self.classifier.classify(&fragment.text))
                .collect()
        } else {
            fragments
                .iter()
                .map(|fragment| self.classifier.classify(&fragment.text))
                .collect()
        };
        if cancel.is_cancelled() {
            return Ok(finish_cancelled(report, started));
        }

        // Route. All fragments are dispatched concurrently; the router's
        // semaphore bounds actual secondary calls. Cancellation stops
        // dispatch and lets in-flight routes finish.
        let total = fragments.len();
        let mut outcomes: Vec<(usize, RouteOutcome)> = self.runtime.block_on(async {
            let mut tasks = JoinSet::new();
            for (idx, (fragment, rules)) in fragments.iter().zip(vectors).enumerate() {
                if cancel.is_cancelled() {
                    break;
                }
                let router = Arc::clone(&self.router);
                let fragment = fragment.clone();
                tasks.spawn(async move { (idx, router.route(&fragment, rules, now).await) });
            }
            let mut collected = Vec::with_capacity(total);
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(pair) => collected.push(pair),
                    Err(err) => {
                        return Err(CreekError::Integrity {
                            message: format!("routing task failed: {err}"),
                        })
                    }
                }
            }
            Ok(collected)
        })?;
        if outcomes.len() < total {
            return Ok(finish_cancelled(report, started));
        }
        outcomes.sort_by_key(|(idx, _)| *idx);

        let mut review_queue: Vec<ReviewEntry> = Vec::new();
        let mut marks: Vec<ContradictionMark> = Vec::new();
        for (idx, outcome) in outcomes {
            match outcome.decision {
                RouteDecision::AcceptedOnRules => report.accepted_on_rules += 1,
                RouteDecision::Merged => report.secondary_invoked += 1,
                RouteDecision::Degraded => {
                    report.secondary_invoked += 1;
                    report.secondary_failures += 1;
                }
            }
            fragments[idx].classification = outcome.vector;
            if let Some(entry) = outcome.review {
                review_queue.push(entry);
            }
            marks.extend(outcome.contradictions);
        }
        report.contradiction_marks = marks.len();

        // Embed. Cached by content, so repeated text costs one provider
        // call. A provider failure rejects the fragment, not the batch.
        let mut embedded: Vec<Fragment> = Vec::with_capacity(fragments.len());
        for mut fragment in fragments {
            if cancel.is_cancelled() {
                return Ok(finish_cancelled(report, started));
            }
            match self.embedder.attach(&mut fragment) {
                Ok(()) => embedded.push(fragment),
                Err(err) => {
                    warn!(fragment_id = %fragment.id, error = %err, "embedding failed; rejected");
                    report.rejected.push(RejectedRecord {
                        origin_path: fragment.source.origin_path.clone(),
                        reason: format!("embedding failed: {err}"),
                    });
                }
            }
        }
        if cancel.is_cancelled() {
            return Ok(finish_cancelled(report, started));
        }

        // Link, then commit. Past this point the batch is in the graph, so
        // the fragments go into the archive no matter what.
        let link_outcome = self.linker.link_batch(&embedded, now)?;
        report.semantic_edges = link_outcome.semantic_edges;
        report.temporal_edges = link_outcome.temporal_edges;

        let batch_ids: Vec<String> = embedded.iter().map(|f| f.id.clone()).collect();
        {
            let mut archive = self.archive.write().map_err(|_| poisoned("archive"))?;
            for fragment in embedded {
                self.raw_hashes
                    .insert(fragment.id.clone(), fragment.raw_hash.clone());
                archive.insert(fragment.id.clone(), fragment);
            }
        }
        report.fragments_out = batch_ids.len();

        // Detect, against a consistent snapshot of the graph.
        if cancel.is_cancelled() {
            report.cancelled = true;
        } else {
            let graph = self.linker.graph_snapshot()?;
            let outcome = {
                let archive = self.archive.read().map_err(|_| poisoned("archive"))?;
                let mut detector = self.detector.lock().map_err(|_| poisoned("detector"))?;
                detector.detect(&archive, &graph, &marks, now)?
            };
            report.threads_formed = outcome.threads_formed;
            report.threads_updated = outcome.threads_updated;
            report.threads_dissolved = outcome.threads_dissolved;
            report.eddies_formed = outcome.eddies_formed;
            report.eddies_updated = outcome.eddies_updated;
            report.eddies_dissolved = outcome.eddies_dissolved;
            report.paradoxes = outcome.paradoxes;
            report.synchronicities = outcome.synchronicities;
            if !outcome.synchronicity_edges.is_empty() {
                let materialized = self.linker.insert_edges(outcome.synchronicity_edges)?;
                debug!(materialized, "synchronicity edges written to the graph");
            }
        }

        // Refresh every fragment's link ids from the live graph and copy
        // this batch out of the archive for the caller.
        let fragments_out: Vec<Fragment> = {
            let mut archive = self.archive.write().map_err(|_| poisoned("archive"))?;
            for (id, fragment) in archive.iter_mut() {
                fragment.links = self.linker.edge_ids_of(id)?;
            }
            batch_ids
                .iter()
                .filter_map(|id| archive.get(id).cloned())
                .collect()
        };

        if self.config.pipeline.verify_links && !report.cancelled {
            let disagreements = self.linker.relink_check()?;
            if !disagreements.is_empty() {
                warn!(
                    count = disagreements.len(),
                    "relink disagreed with the live graph"
                );
            }
            report.warnings.extend(disagreements);
        }

        report.review_entries = review_queue.len();
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            records = report.records_in,
            fragments = report.fragments_out,
            rejected = report.rejected.len(),
            review = report.review_entries,
            semantic = report.semantic_edges,
            temporal = report.temporal_edges,
            threads_formed = report.threads_formed,
            synchronicities = report.synchronicities,
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed_ms,
            "batch run complete"
        );
        Ok(BatchOutput {
            fragments: fragments_out,
            review_queue,
            report,
        })
    }

    /// Mark a thread resolved. This is the external, human-driven signal;
    /// detection itself never resolves anything.
    pub fn resolve_thread(&self, thread_id: &str) -> CreekResult<()> {
        let mut detector = self.detector.lock().map_err(|_| poisoned("detector"))?;
        detector.resolve_thread(thread_id)
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &CreekConfig {
        &self.config
    }

    /// The append-only audit log. Read it; the pipeline never rewrites it.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn archive_len(&self) -> usize {
        self.archive.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn fragment(&self, fragment_id: &str) -> Option<Fragment> {
        self.archive
            .read()
            .ok()
            .and_then(|archive| archive.get(fragment_id).cloned())
    }

    pub fn edge_count(&self) -> usize {
        self.linker.edge_count()
    }

    pub fn threads(&self) -> CreekResult<Vec<Thread>> {
        let detector = self.detector.lock().map_err(|_| poisoned("detector"))?;
        Ok(detector.threads().cloned().collect())
    }

    pub fn eddies(&self) -> CreekResult<Vec<Eddy>> {
        let detector = self.detector.lock().map_err(|_| poisoned("detector"))?;
        Ok(detector.eddies().cloned().collect())
    }

    pub fn paradoxes(&self) -> CreekResult<Vec<ParadoxRecord>> {
        let detector = self.detector.lock().map_err(|_| poisoned("detector"))?;
        Ok(detector.paradoxes().cloned().collect())
    }

    pub fn synchronicities(&self) -> CreekResult<Vec<SynchronicityRecord>> {
        let detector = self.detector.lock().map_err(|_| poisoned("detector"))?;
        Ok(detector.synchronicities().cloned().collect())
    }
}

fn finish_cancelled(mut report: BatchReport, started: Instant) -> BatchOutput {
    report.cancelled = true;
    report.elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        records = report.records_in,
        elapsed_ms = report.elapsed_ms,
        "batch run cancelled; nothing committed"
    );
    BatchOutput {
        fragments: Vec::new(),
        review_queue: Vec::new(),
        report,
    }
}

fn poisoned(what: &str) -> CreekError {
    CreekError::Integrity {
        message: format!("{what} lock poisoned"),
    }
}
