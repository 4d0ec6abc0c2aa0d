//! Reconciliation driver.
//!
//! Walks assays → versions → olives → declared workflow names. For each
//! item it decides whether the olive runs for that assay-version, vets the
//! olive's tags against history, and registers the result into the report
//! (and, for checked olives, the staged config).
//!
//! Each item produces an explicit [`ItemOutcome`] or a fault. Faults become
//! [`Diagnostic`]s and the walk continues with the next item.

use crate::error::{Diagnostic, FaultKind};
use crate::filter::AssayFilter;
use crate::history::{ControlEntry, History, OlderReport, VersionControl};
use crate::matcher::{MatchStrategy, matches};
use crate::model::{AssayConfig, OliveRecord, value_kind};
use crate::orphans::find_orphans;
use crate::register::{Report, ReportBuilder};
use crate::versions::{TagSet, Versions};
use crate::vetter::{VetSource, vet};
use serde_json::{Map, Value, json};
use std::borrow::Cow;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

pub const STAGED_CONFIG_SCHEMA: u32 = 1;
pub const STAGED_CONFIG_KIND: &str = "cfgscan.staged_assay_config.v1";

const REFERENCE_KEY: &str = "reference";
const VERSIONS_KEY: &str = "versions";

/// Run-wide knobs.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub strategy: MatchStrategy,
    pub filter: AssayFilter,
    /// Wrap the staged config in the schema header block.
    pub schema_header: bool,
}

/// What happened to one (olive, workflow name) pair for one assay-version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Registered; carries what the report now stores for the key.
    Registered(Versions),
    /// The olive's check does not hold for this assay-version.
    Rejected,
    /// Vetting left nothing to register.
    Empty,
}

/// Reconciliation entry point. Holds the optional history inputs.
#[derive(Debug, Clone, Default)]
pub struct ConfigScanner {
    options: ScanOptions,
    version_control: Option<VersionControl>,
    older_report: Option<OlderReport>,
}

impl ConfigScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            version_control: None,
            older_report: None,
        }
    }

    pub fn with_version_control(mut self, version_control: VersionControl) -> Self {
        self.version_control = Some(version_control);
        self
    }

    pub fn with_older_report(mut self, older_report: OlderReport) -> Self {
        self.older_report = Some(older_report);
        self
    }

    /// Reconcile `olives` against `config`.
    pub fn run(self, config: &AssayConfig, olives: &[OliveRecord]) -> ScanRun {
        let orphans = find_orphans(config, olives);
        let mut diagnostics: Vec<Diagnostic> = orphans
            .iter()
            .map(|name| {
                warn!(workflow = %name, "olive runs a workflow no assay configures");
                Diagnostic::new(
                    FaultKind::OrphanedOlive,
                    "no assay-version configures this workflow",
                )
                .for_workflow(name)
            })
            .collect();

        let mut driver = Driver {
            options: &self.options,
            builder: ReportBuilder::new(config.as_map().clone()),
            diagnostics: Vec::new(),
            version_control: self.version_control,
            older_report: self.older_report.as_ref(),
        };
        driver.construct_report(config, olives);

        let Driver {
            builder,
            diagnostics: run_diagnostics,
            version_control,
            ..
        } = driver;
        diagnostics.extend(run_diagnostics);
        let (report, staged) = builder.finish();

        let run = ScanRun {
            report,
            staged,
            diagnostics,
            orphans,
            version_control,
            schema_header: self.options.schema_header,
        };
        info!(
            assays = run.report.len(),
            errors = run.errors(),
            orphans = run.orphans.len(),
            "scan finished"
        );
        run
    }
}

/// Result of one reconciliation run.
#[derive(Debug, Clone)]
pub struct ScanRun {
    report: Report,
    staged: Value,
    diagnostics: Vec<Diagnostic>,
    orphans: BTreeSet<String>,
    version_control: Option<VersionControl>,
    schema_header: bool,
}

impl ScanRun {
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// The staged assay configuration, without any header.
    pub fn staged_config(&self) -> &Value {
        &self.staged
    }

    /// The staged config as written to disk: wrapped in the schema header
    /// block when the run was configured for it.
    pub fn staged_document(&self) -> Value {
        if self.schema_header {
            json!({
                "schema": STAGED_CONFIG_SCHEMA,
                "kind": STAGED_CONFIG_KIND,
                "values": self.staged,
            })
        } else {
            self.staged.clone()
        }
    }

    /// Number of recovered faults, orphans excluded.
    pub fn errors(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.kind.is_error())
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn orphans(&self) -> &BTreeSet<String> {
        &self.orphans
    }

    pub fn version_control(&self) -> Option<&VersionControl> {
        self.version_control.as_ref()
    }

    /// Whether vetting committed drift into the version-control document.
    pub fn version_control_updated(&self) -> bool {
        self.version_control
            .as_ref()
            .is_some_and(VersionControl::is_updated)
    }
}

struct Driver<'a> {
    options: &'a ScanOptions,
    builder: ReportBuilder,
    diagnostics: Vec<Diagnostic>,
    version_control: Option<VersionControl>,
    older_report: Option<&'a OlderReport>,
}

/// History in effect for one assay-version.
struct VersionHistory<'a> {
    control: Option<ControlEntry>,
    prior: Option<&'a Map<String, Value>>,
}

impl VersionHistory<'_> {
    fn is_frozen(&self) -> bool {
        self.control.as_ref().is_some_and(|entry| entry.frozen)
    }
}

impl<'a> Driver<'a> {
    fn construct_report(&mut self, config: &AssayConfig, olives: &[OliveRecord]) {
        for (assay, node) in config.assays() {
            if !self.options.filter.admits(assay) {
                debug!(assay = %assay, "assay excluded by filter");
                continue;
            }
            let Some(assay_node) = node.as_object() else {
                self.record(
                    Diagnostic::new(
                        FaultKind::ItemFailure,
                        format!("assay node is a {}, not an object", value_kind(node)),
                    )
                    .at_assay(assay),
                );
                continue;
            };
            self.builder.open_assay(assay);

            match reference_of(assay_node) {
                Some(reference) => self.builder.set_reference(assay, reference),
                None => self.record(
                    Diagnostic::new(FaultKind::MissingReference, "no usable reference value")
                        .at_assay(assay),
                ),
            }

            let Some(versions) = assay_node.get(VERSIONS_KEY) else {
                debug!(assay = %assay, "assay has no versions");
                continue;
            };
            let Some(versions) = versions.as_object() else {
                self.record(
                    Diagnostic::new(FaultKind::ItemFailure, "`versions` is not an object")
                        .at_assay(assay),
                );
                continue;
            };

            for (version, settings) in versions {
                // Report nodes keep the reference beside their versions.
                if version == REFERENCE_KEY {
                    self.record(
                        Diagnostic::new(
                            FaultKind::ItemFailure,
                            "version name collides with the report's reference field",
                        )
                        .at_assay(assay)
                        .at_version(version),
                    );
                    continue;
                }
                let Some(settings) = settings.as_object() else {
                    self.record(
                        Diagnostic::new(
                            FaultKind::ItemFailure,
                            format!("version node is a {}, not an object", value_kind(settings)),
                        )
                        .at_assay(assay)
                        .at_version(version),
                    );
                    continue;
                };
                self.reconcile_version(assay, version, settings, olives);
            }
        }
    }

    fn reconcile_version(
        &mut self,
        assay: &str,
        version: &str,
        settings: &Map<String, Value>,
        olives: &[OliveRecord],
    ) {
        self.builder.open_version(assay, version);
        let mut history = self.version_history(assay, version);

        if let Some(entry) = history.control.as_ref().filter(|entry| entry.frozen) {
            info!(assay, version, "assay-version is frozen");
            if let Err(reason) =
                self.builder
                    .replace_staged_workflows(assay, version, entry.staged_table())
            {
                self.record(
                    Diagnostic::new(FaultKind::ItemFailure, reason)
                        .at_assay(assay)
                        .at_version(version),
                );
            }
        }

        for olive in olives {
            for workflow in &olive.names {
                let outcome =
                    self.reconcile_item(assay, version, settings, olive, workflow, &mut history);
                match outcome {
                    Ok(outcome) => {
                        debug!(assay, version, workflow = %workflow, ?outcome, "reconciled");
                    }
                    Err(reason) => self.record(
                        Diagnostic::new(FaultKind::ItemFailure, reason)
                            .at_assay(assay)
                            .at_version(version)
                            .for_workflow(workflow),
                    ),
                }
            }
        }
    }

    fn reconcile_item(
        &mut self,
        assay: &str,
        version: &str,
        settings: &Map<String, Value>,
        olive: &OliveRecord,
        workflow: &str,
        history: &mut VersionHistory<'a>,
    ) -> Result<ItemOutcome, String> {
        let checked = match olive.check_for(workflow) {
            None => false,
            Some(check) => {
                let predicate = predicate_tree(workflow, check)?;
                if !matches(settings, &predicate, self.options.strategy) {
                    return Ok(ItemOutcome::Rejected);
                }
                true
            }
        };

        let resolved = match History::resolve(history.control.as_ref(), history.prior, workflow) {
            Ok(resolved) => resolved,
            Err(malformed) => {
                self.record(
                    Diagnostic::new(FaultKind::MalformedHistory, malformed.reason.clone())
                        .at_assay(assay)
                        .at_version(version)
                        .for_workflow(workflow),
                );
                malformed.fallback
            }
        };
        let vetting = vet(workflow, &olive.tags, &resolved);
        if vetting.changed {
            match vetting.source {
                VetSource::Controlled => {
                    warn!(
                        assay,
                        version,
                        workflow,
                        tags = ?vetting.tags,
                        "workflow versions drifted from version control"
                    );
                    self.commit(assay, version, workflow, &vetting.tags, history)?;
                }
                _ => info!(
                    assay,
                    version,
                    workflow,
                    tags = ?vetting.tags,
                    "workflow versions differ from older report"
                ),
            }
        }

        let Some(stored) = self
            .builder
            .register(vetting.tags.iter().cloned(), assay, version, workflow)
            .cloned()
        else {
            return Ok(ItemOutcome::Empty);
        };

        if checked && !history.is_frozen() {
            let staged_history = match self.builder.staged_tags(assay, version, workflow) {
                Some(staged) => History::Controlled(staged.into_iter().collect()),
                None => History::Unrecorded,
            };
            let staged = vet(workflow, &vetting.tags, &staged_history);
            self.builder.stage(assay, version, workflow, &staged.tags)?;
        }

        Ok(ItemOutcome::Registered(stored))
    }

    fn version_history(&mut self, assay: &str, version: &str) -> VersionHistory<'a> {
        let control = match self.version_control.as_ref().map(|vc| vc.entry(assay, version)) {
            None | Some(Ok(None)) => None,
            Some(Ok(Some(entry))) => Some(entry),
            Some(Err(reason)) => {
                self.record(
                    Diagnostic::new(FaultKind::MalformedHistory, reason)
                        .at_assay(assay)
                        .at_version(version),
                );
                None
            }
        };
        let prior = match self.older_report.map(|older| older.versions_for(assay, version)) {
            None | Some(Ok(None)) => None,
            Some(Ok(Some(table))) => Some(table),
            Some(Err(reason)) => {
                self.record(
                    Diagnostic::new(FaultKind::MalformedHistory, reason)
                        .at_assay(assay)
                        .at_version(version),
                );
                None
            }
        };
        VersionHistory { control, prior }
    }

    fn commit(
        &mut self,
        assay: &str,
        version: &str,
        workflow: &str,
        tags: &TagSet,
        history: &mut VersionHistory<'a>,
    ) -> Result<(), String> {
        let Some(version_control) = self.version_control.as_mut() else {
            return Ok(());
        };
        version_control.commit(assay, version, workflow, tags)?;
        if let Some(entry) = history.control.as_mut() {
            entry.record(workflow, tags);
        }
        Ok(())
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        warn!(%diagnostic, "recovered fault");
        self.diagnostics.push(diagnostic);
    }
}

/// The reference value of an assay node: a string, or the first element of
/// a list of strings.
fn reference_of(assay: &Map<String, Value>) -> Option<&str> {
    match assay.get(REFERENCE_KEY)? {
        Value::String(reference) => Some(reference.as_str()),
        Value::Array(items) => items.first()?.as_str(),
        _ => None,
    }
}

/// The predicate tree for `workflow`. A mapping is used as is; a bare
/// scalar check is the flat form `{workflow: value}`.
fn predicate_tree<'c>(
    workflow: &str,
    check: &'c Value,
) -> Result<Cow<'c, Map<String, Value>>, String> {
    match check {
        Value::Object(tree) => Ok(Cow::Borrowed(tree)),
        Value::String(_) | Value::Bool(_) | Value::Number(_) => {
            let mut flat = Map::new();
            flat.insert(workflow.to_string(), check.clone());
            Ok(Cow::Owned(flat))
        }
        other => Err(format!(
            "check for `{workflow}` is a {}, expected an object or scalar",
            value_kind(other)
        )),
    }
}
