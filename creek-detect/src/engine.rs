//! The detection pass: four detectors over one snapshot, reconciled
//! against the prior record set.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use creek_core::config::DetectConfig;
use creek_core::errors::{CreekResult, DetectError};
use creek_core::fragment::{Fragment, Resonance};
use creek_core::models::{
    ContradictionMark, Eddy, EddyStatus, ParadoxRecord, SynchronicityRecord, Thread, ThreadStatus,
};
use creek_link::EdgeGraph;

use crate::eddies::detect_components;
use crate::paradox::detect_paradoxes;
use crate::synchronicity::detect_synchronicities;
use crate::threads::{detect_groups, dominant_labels, title_for, ThreadGroup};

/// What one detection pass changed. `updated` counts prior records whose
/// stored fields were mutated this pass, status flips included; formations
/// and dissolutions are counted separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectOutcome {
    pub threads_formed: usize,
    pub threads_updated: usize,
    pub threads_dissolved: usize,
    pub eddies_formed: usize,
    pub eddies_updated: usize,
    pub eddies_dissolved: usize,
    pub paradoxes: usize,
    pub synchronicities: usize,
    /// Edges to insert into the live graph, one per new synchronicity.
    pub synchronicity_edges: Vec<Resonance>,
}

/// Holds every detected record across passes. All record stores are
/// additive: ids are deterministic, groups are matched back to prior
/// records by largest member overlap, and a record whose membership
/// invariant breaks transitions to Dissolved instead of being removed.
pub struct DetectEngine {
    config: DetectConfig,
    threads: BTreeMap<String, Thread>,
    eddies: BTreeMap<String, Eddy>,
    paradoxes: BTreeMap<String, ParadoxRecord>,
    synchronicities: BTreeMap<String, SynchronicityRecord>,
}

impl DetectEngine {
    pub fn new(config: DetectConfig) -> Self {
        Self {
            config,
            threads: BTreeMap::new(),
            eddies: BTreeMap::new(),
            paradoxes: BTreeMap::new(),
            synchronicities: BTreeMap::new(),
        }
    }

    /// Run all four detectors against a snapshot of the archive and its
    /// edge graph. Re-running on unchanged input changes nothing and
    /// reports an all-zero outcome.
    ///
    /// Synchronicity edges are returned in the outcome rather than
    /// inserted here; the caller owns the live graph.
    pub fn detect(
        &mut self,
        archive: &BTreeMap<String, Fragment>,
        graph: &EdgeGraph,
        marks: &[ContradictionMark],
        now: DateTime<Utc>,
    ) -> CreekResult<DetectOutcome> {
        for edge in graph.iter() {
            for endpoint in [&edge.a, &edge.b] {
                if !archive.contains_key(endpoint) {
                    return Err(DetectError::UnknownFragment {
                        fragment_id: endpoint.clone(),
                    }
                    .into());
                }
            }
        }

        let mut outcome = DetectOutcome::default();

        let groups = detect_groups(
            archive,
            graph,
            self.config.thread_window_hours,
            self.config.thread_min_fragments,
        );
        self.reconcile_threads(groups, now, &mut outcome);

        let components = detect_components(graph, self.config.eddy_min_fragments);
        self.reconcile_eddies(components, archive, now, &mut outcome);

        let records = detect_paradoxes(
            archive,
            graph,
            marks,
            self.config.paradox_confidence_floor,
            now,
        );
        for record in records {
            if !self.paradoxes.contains_key(&record.id) {
                outcome.paradoxes += 1;
                self.paradoxes.insert(record.id.clone(), record);
            }
        }

        // Suppression sees this pass's thread statuses, not last pass's.
        let threads: Vec<&Thread> = self.threads.values().collect();
        let hits = detect_synchronicities(archive, graph, &threads, &self.config, now);
        for hit in hits {
            if !self.synchronicities.contains_key(&hit.record.id) {
                outcome.synchronicities += 1;
                outcome.synchronicity_edges.push(hit.edge);
                self.synchronicities.insert(hit.record.id.clone(), hit.record);
            }
        }

        info!(
            threads_formed = outcome.threads_formed,
            threads_updated = outcome.threads_updated,
            threads_dissolved = outcome.threads_dissolved,
            eddies_formed = outcome.eddies_formed,
            eddies_dissolved = outcome.eddies_dissolved,
            paradoxes = outcome.paradoxes,
            synchronicities = outcome.synchronicities,
            "detection pass complete"
        );
        Ok(outcome)
    }

    fn reconcile_threads(
        &mut self,
        groups: Vec<ThreadGroup>,
        now: DateTime<Utc>,
        outcome: &mut DetectOutcome,
    ) {
        let mut claimed: BTreeSet<String> = BTreeSet::new();
        for group in groups {
            let matched = best_match(
                self.threads
                    .iter()
                    .map(|(id, t)| (id.as_str(), t.members.as_slice())),
                &group.members,
                &claimed,
            )
            .map(str::to_string);
            match matched {
                Some(id) => {
                    claimed.insert(id.clone());
                    let thread = self.threads.get_mut(&id).expect("matched thread exists");
                    let mut mutated = thread.members != group.members
                        || thread.first_seen != group.first_seen
                        || thread.last_seen != group.last_seen
                        || thread.label_affinity != group.label_affinity;
                    thread.members = group.members;
                    thread.first_seen = group.first_seen;
                    thread.last_seen = group.last_seen;
                    thread.label_affinity = group.label_affinity;
                    match thread.status {
                        // A dissolved thread whose membership holds again
                        // comes back; the revival is itself an update.
                        ThreadStatus::Dissolved => {
                            thread.status = ThreadStatus::Active;
                            mutated = true;
                        }
                        // New activity wakes a dormant thread. An unchanged
                        // group leaves it dormant, which keeps the re-run
                        // no-op.
                        ThreadStatus::Dormant if mutated => {
                            thread.status = ThreadStatus::Active;
                        }
                        // Resolved never changes here; membership still
                        // tracks the group.
                        _ => {}
                    }
                    if mutated {
                        outcome.threads_updated += 1;
                    }
                }
                None => {
                    let id = Thread::derive_id(&group.members);
                    let title = title_for(&group.label_affinity, group.first_seen);
                    claimed.insert(id.clone());
                    self.threads.insert(
                        id.clone(),
                        Thread {
                            id,
                            title,
                            status: ThreadStatus::Active,
                            first_seen: group.first_seen,
                            last_seen: group.last_seen,
                            members: group.members,
                            label_affinity: group.label_affinity,
                        },
                    );
                    outcome.threads_formed += 1;
                }
            }
        }

        // Threads no group claimed have lost their membership invariant.
        for thread in self.threads.values_mut() {
            if claimed.contains(&thread.id) {
                continue;
            }
            if matches!(thread.status, ThreadStatus::Active | ThreadStatus::Dormant) {
                thread.status = ThreadStatus::Dissolved;
                outcome.threads_dissolved += 1;
            }
        }

        // A thread quiet for longer than its own window goes dormant.
        let horizon = Duration::hours(self.config.thread_window_hours);
        for thread in self.threads.values_mut() {
            if thread.status == ThreadStatus::Active && now - thread.last_seen > horizon {
                thread.status = ThreadStatus::Dormant;
                outcome.threads_updated += 1;
            }
        }
    }

    fn reconcile_eddies(
        &mut self,
        components: Vec<Vec<String>>,
        archive: &BTreeMap<String, Fragment>,
        now: DateTime<Utc>,
        outcome: &mut DetectOutcome,
    ) {
        let mut claimed: BTreeSet<String> = BTreeSet::new();
        for members in components {
            let matched = best_match(
                self.eddies
                    .iter()
                    .map(|(id, e)| (id.as_str(), e.members.as_slice())),
                &members,
                &claimed,
            )
            .map(str::to_string);
            match matched {
                Some(id) => {
                    claimed.insert(id.clone());
                    let eddy = self.eddies.get_mut(&id).expect("matched eddy exists");
                    let mut mutated = eddy.members != members;
                    eddy.members = members;
                    if eddy.status == EddyStatus::Dissolved {
                        eddy.status = EddyStatus::Active;
                        mutated = true;
                    }
                    if mutated {
                        outcome.eddies_updated += 1;
                    }
                }
                None => {
                    let id = Eddy::derive_id(&members);
                    let title = title_for(&dominant_labels(&members, archive), now);
                    claimed.insert(id.clone());
                    self.eddies.insert(
                        id.clone(),
                        Eddy {
                            id,
                            title,
                            status: EddyStatus::Active,
                            formed: now,
                            members,
                        },
                    );
                    outcome.eddies_formed += 1;
                }
            }
        }

        for eddy in self.eddies.values_mut() {
            if claimed.contains(&eddy.id) {
                continue;
            }
            if eddy.status == EddyStatus::Active {
                eddy.status = EddyStatus::Dissolved;
                outcome.eddies_dissolved += 1;
            }
        }
    }

    /// Close a thread by hand. Detection never resolves, dissolves, or
    /// revives a resolved thread afterwards.
    pub fn resolve_thread(&mut self, thread_id: &str) -> CreekResult<()> {
        let thread = self
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| DetectError::UnknownThread {
                thread_id: thread_id.to_string(),
            })?;
        thread.resolve();
        Ok(())
    }

    pub fn thread(&self, thread_id: &str) -> Option<&Thread> {
        self.threads.get(thread_id)
    }

    pub fn eddy(&self, eddy_id: &str) -> Option<&Eddy> {
        self.eddies.get(eddy_id)
    }

    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    pub fn eddies(&self) -> impl Iterator<Item = &Eddy> {
        self.eddies.values()
    }

    pub fn paradoxes(&self) -> impl Iterator<Item = &ParadoxRecord> {
        self.paradoxes.values()
    }

    pub fn synchronicities(&self) -> impl Iterator<Item = &SynchronicityRecord> {
        self.synchronicities.values()
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }
}

/// The prior record with the largest member overlap; the smaller id wins a
/// tie. Records already claimed this pass are skipped so two groups never
/// land on the same prior record.
fn best_match<'a, I>(
    candidates: I,
    members: &[String],
    claimed: &BTreeSet<String>,
) -> Option<&'a str>
where
    I: Iterator<Item = (&'a str, &'a [String])>,
{
    let target: BTreeSet<&str> = members.iter().map(String::as_str).collect();
    candidates
        .filter(|(id, _)| !claimed.contains(*id))
        .map(|(id, prior)| {
            let overlap = prior
                .iter()
                .filter(|m| target.contains(m.as_str()))
                .count();
            (overlap, id)
        })
        .filter(|(overlap, _)| *overlap > 0)
        .max_by(|(na, ia), (nb, ib)| na.cmp(nb).then_with(|| ib.cmp(ia)))
        .map(|(_, id)| id)
}
