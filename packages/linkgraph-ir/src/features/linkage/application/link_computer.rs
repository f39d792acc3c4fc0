//! Link computer: memoized per-method summaries
//!
//! # Lifecycle of one method
//!
//! ```text
//! on-demand ──summary()──► being computed ──Ok──► done (memoized)
//!     │                         │
//!     │ abstract / external     └──Err(unsupported)──► unavailable (recorded)
//!     ▼
//!  shallow (memoized)
//! ```
//!
//! A method already being computed, by this task's call chain or by another
//! thread, is answered with its shallow summary for that one request. The
//! shallow answer is not memoized, so the source-derived summary wins once
//! it completes.
//!
//! # Concurrency
//! - `DashMap` memo, snapshot and failure tables: write-once per method
//! - `RecursionGuard`: one short-held lock for ownership bookkeeping
//! - `analyze_types`: rayon pool, one type per work item

use super::context::MethodContext;
use super::recursion::{Acquire, AnalysisTask, RecursionGuard};
use super::shallow::ShallowLinkComputer;
use super::source_method::SourceMethodComputer;
use crate::config::LinkConfig;
use crate::errors::{ErrorRecord, LinkError, Phase, Result};
use crate::features::linkage::domain::{Links, MethodLinkedVariables, VariableData};
use crate::features::linkage::infrastructure::{DeclaredFacts, DefaultHiddenContent};
use crate::features::linkage::ports::{HiddenContentProvider, MethodFactProvider, TypeModel};
use crate::shared::models::{MethodInfo, MethodRef, Program, TypeName, Variable};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Outcome of one summary request
#[derive(Debug, Clone)]
pub enum SummaryOutcome {
    Available(Arc<MethodLinkedVariables>),
    /// Analysis failed on an unsupported construct; callers must assume the worst
    Unavailable(ErrorRecord),
}

impl SummaryOutcome {
    pub fn summary(&self) -> Option<&Arc<MethodLinkedVariables>> {
        match self {
            SummaryOutcome::Available(s) => Some(s),
            SummaryOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SummaryOutcome::Available(_))
    }
}

/// Counters of one computer's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub source_computations: u64,
    pub shallow_computations: u64,
    pub recursion_cutoffs: u64,
    pub failures: u64,
    pub memo_hits: u64,
}

type Snapshots = Arc<BTreeMap<String, VariableData>>;

pub struct LinkComputer {
    model: Arc<dyn TypeModel>,
    hidden: Arc<dyn HiddenContentProvider>,
    facts: Arc<dyn MethodFactProvider>,
    config: LinkConfig,

    summaries: DashMap<MethodRef, Arc<MethodLinkedVariables>>,
    snapshots: DashMap<MethodRef, Snapshots>,
    failures: DashMap<MethodRef, ErrorRecord>,
    guard: RecursionGuard,

    next_task: AtomicU64,
    source_computations: AtomicU64,
    shallow_computations: AtomicU64,
    recursion_cutoffs: AtomicU64,
    failure_count: AtomicU64,
    memo_hits: AtomicU64,
}

impl LinkComputer {
    /// Computer over an in-memory program with the default hidden-content
    /// naming and the facts declared on each method
    pub fn new(program: Arc<Program>, config: LinkConfig) -> Self {
        let model: Arc<dyn TypeModel> = program;
        let hidden = Arc::new(DefaultHiddenContent::new(model.clone()));
        Self::with_ports(model, hidden, Arc::new(DeclaredFacts), config)
    }

    pub fn with_ports(
        model: Arc<dyn TypeModel>,
        hidden: Arc<dyn HiddenContentProvider>,
        facts: Arc<dyn MethodFactProvider>,
        config: LinkConfig,
    ) -> Self {
        Self {
            model,
            hidden,
            facts,
            config,
            summaries: DashMap::new(),
            snapshots: DashMap::new(),
            failures: DashMap::new(),
            guard: RecursionGuard::new(),
            next_task: AtomicU64::new(1),
            source_computations: AtomicU64::new(0),
            shallow_computations: AtomicU64::new(0),
            recursion_cutoffs: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            memo_hits: AtomicU64::new(0),
        }
    }

    pub fn model(&self) -> &dyn TypeModel {
        self.model.as_ref()
    }

    pub fn hidden(&self) -> &dyn HiddenContentProvider {
        self.hidden.as_ref()
    }

    pub fn facts(&self) -> &dyn MethodFactProvider {
        self.facts.as_ref()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Public API
    // ═══════════════════════════════════════════════════════════════════════

    /// Summary of `method`, computed on first request
    ///
    /// Unsupported constructs yield `Unavailable`; invariant violations are
    /// returned as errors.
    pub fn summary(&self, method: &MethodRef) -> Result<SummaryOutcome> {
        let task = AnalysisTask::new(self.next_task.fetch_add(1, Ordering::Relaxed));
        match self.summary_in(method, &task) {
            Ok(s) => Ok(SummaryOutcome::Available(s)),
            Err(e) => match e.to_record() {
                Some(record) => Ok(SummaryOutcome::Unavailable(record)),
                None => Err(e),
            },
        }
    }

    /// Snapshot after statement `index` of a method computed from source
    pub fn snapshot(&self, method: &MethodRef, index: &str) -> Option<VariableData> {
        self.snapshots
            .get(method)
            .and_then(|s| s.value().get(index).cloned())
    }

    /// Links of `v` after statement `index`
    pub fn links_for(&self, method: &MethodRef, index: &str, v: &Variable) -> Option<Links> {
        self.snapshot(method, index).map(|d| d.links_of(v))
    }

    /// Why `method`'s summary is unavailable, if it is
    pub fn failure(&self, method: &MethodRef) -> Option<ErrorRecord> {
        self.failures.get(method).map(|r| r.value().clone())
    }

    /// Summaries of every method declared in `ty`
    pub fn analyze_type(&self, ty: &TypeName) -> Result<BTreeMap<MethodRef, SummaryOutcome>> {
        let mut result = BTreeMap::new();
        for method in self.model.methods_of(ty) {
            let outcome = self.summary(&method.id)?;
            if let SummaryOutcome::Unavailable(record) = &outcome {
                debug!("{} unavailable: {}", method.id, record);
            }
            result.insert(method.id.clone(), outcome);
        }
        Ok(result)
    }

    /// `analyze_type` for many types, in parallel when configured
    pub fn analyze_types(
        &self,
        types: &[TypeName],
    ) -> Result<BTreeMap<TypeName, BTreeMap<MethodRef, SummaryOutcome>>> {
        info!("analyzing {} type(s)", types.len());
        if let Some(result) = self.analyze_parallel(types) {
            info!("analysis done: {:?}", self.stats());
            return result;
        }
        let mut result = BTreeMap::new();
        for t in types {
            result.insert(t.clone(), self.analyze_type(t)?);
        }
        info!("analysis done: {:?}", self.stats());
        Ok(result)
    }

    /// `None` when parallel analysis is disabled or the pool cannot be built
    #[cfg(feature = "parallel")]
    fn analyze_parallel(
        &self,
        types: &[TypeName],
    ) -> Option<Result<BTreeMap<TypeName, BTreeMap<MethodRef, SummaryOutcome>>>> {
        if !self.config.parallel || types.len() < 2 {
            return None;
        }
        let workers = self.config.workers();
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("linkgraph-worker-{}", i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!("could not build worker pool, analyzing sequentially: {}", e);
                return None;
            }
        };
        debug!("rayon pool with {} worker(s)", workers);
        let results: Vec<Result<(TypeName, BTreeMap<MethodRef, SummaryOutcome>)>> = pool.install(|| {
            types
                .par_iter()
                .map(|t| self.analyze_type(t).map(|r| (t.clone(), r)))
                .collect()
        });
        Some(results.into_iter().collect())
    }

    #[cfg(not(feature = "parallel"))]
    fn analyze_parallel(
        &self,
        _types: &[TypeName],
    ) -> Option<Result<BTreeMap<TypeName, BTreeMap<MethodRef, SummaryOutcome>>>> {
        None
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            source_computations: self.source_computations.load(Ordering::Relaxed),
            shallow_computations: self.shallow_computations.load(Ordering::Relaxed),
            recursion_cutoffs: self.recursion_cutoffs.load(Ordering::Relaxed),
            failures: self.failure_count.load(Ordering::Relaxed),
            memo_hits: self.memo_hits.load(Ordering::Relaxed),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Orchestration
    // ═══════════════════════════════════════════════════════════════════════

    /// Summary of `method` requested from within `task`
    pub(crate) fn summary_in(
        &self,
        method: &MethodRef,
        task: &AnalysisTask,
    ) -> Result<Arc<MethodLinkedVariables>> {
        if let Some(s) = self.memoized(method) {
            return Ok(s);
        }
        if let Some(record) = self.failure(method) {
            return Err(LinkError::Unsupported {
                method: record.method,
                phase: record.phase,
                message: record.message,
            });
        }
        let info = self.model.method(method).ok_or_else(|| {
            LinkError::unsupported(method, Phase::MethodCall, "unknown method")
        })?;

        if self.is_shallow(&info) {
            let computed = self.summaries.entry(method.clone()).or_insert_with(|| {
                self.shallow_computations.fetch_add(1, Ordering::Relaxed);
                Arc::new(self.shallow(&info))
            });
            return Ok(computed.value().clone());
        }
        if task.depth() >= self.config.max_call_depth {
            debug!("call depth {} reached at {}", task.depth(), method);
            return Ok(self.cutoff(&info));
        }

        match self.guard.try_acquire(method, task) {
            Acquire::Owned(_token) => {
                let _frame = task.enter(method);
                self.compute_source(info, task)
            }
            Acquire::Reentrant => {
                trace!("{} recursive within task {}", method, task.id());
                Ok(self.memoized(method).unwrap_or_else(|| self.cutoff(&info)))
            }
            Acquire::Contended(owner) => {
                trace!("{} owned by task {}", method, owner);
                Ok(self.memoized(method).unwrap_or_else(|| self.cutoff(&info)))
            }
        }
    }

    fn compute_source(&self, info: Arc<MethodInfo>, task: &AnalysisTask) -> Result<Arc<MethodLinkedVariables>> {
        // computed concurrently between the memo check and acquiring ownership
        if let Some(s) = self.memoized(&info.id) {
            return Ok(s);
        }
        let ctx = MethodContext::new(self, task, info.clone());
        match SourceMethodComputer::new(&ctx).compute() {
            Ok(outcome) => {
                let summary = Arc::new(outcome.summary);
                self.snapshots.insert(info.id.clone(), Arc::new(outcome.snapshots));
                self.summaries.insert(info.id.clone(), summary.clone());
                self.source_computations.fetch_add(1, Ordering::Relaxed);
                Ok(summary)
            }
            Err(e) => {
                if let Some(record) = e.to_record() {
                    warn!("summary of {} unavailable: {}", info.id, record);
                    self.failures.insert(info.id.clone(), record);
                    self.failure_count.fetch_add(1, Ordering::Relaxed);
                }
                Err(e)
            }
        }
    }

    fn memoized(&self, method: &MethodRef) -> Option<Arc<MethodLinkedVariables>> {
        let hit = self.summaries.get(method).map(|s| s.value().clone());
        if hit.is_some() {
            self.memo_hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    fn is_shallow(&self, info: &MethodInfo) -> bool {
        self.config.force_shallow
            || info.is_abstract
            || !info.has_source()
            || self.model.is_external(&info.owner)
    }

    fn shallow(&self, info: &MethodInfo) -> MethodLinkedVariables {
        ShallowLinkComputer::new(self.model(), self.hidden(), self.facts()).compute(info)
    }

    /// Shallow answer for one request, not memoized
    fn cutoff(&self, info: &MethodInfo) -> Arc<MethodLinkedVariables> {
        self.recursion_cutoffs.fetch_add(1, Ordering::Relaxed);
        Arc::new(self.shallow(info))
    }
}
