//! Generation runner.
//!
//! Drives the full pipeline per table: scheduler × identity → fault
//! injector → synthesizer → sink, in bounded batches. The four
//! history-independent tables (gRPC, SNMP, syslog — and DDM, which runs
//! on the coordinator because Lifecycle needs its severity history) each
//! consume their own seeded value stream, so output is reproducible
//! regardless of thread interleaving. Lifecycle Prediction is generated
//! strictly after DDM, reading the bounded in-memory history view —
//! never a partially-written sink.
//!
//! Memory is bounded by batch size × record footprint, independent of
//! the requested volume.

use std::thread;

use crossbeam_channel::bounded;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::config::GenerationRequest;
use crate::error::{SimError, SinkWriteError};
use crate::fault::{FaultInjector, FaultState};
use crate::identity::{CommonFields, common_fields_for};
use crate::schedule::SamplePlan;
use crate::sink::RecordSink;
use crate::stream_seed;
use crate::tables::ddm::DdmRecord;
use crate::tables::grpc::GrpcRecord;
use crate::tables::lifecycle::{DdmHistory, LifecycleRecord};
use crate::tables::snmp::SnmpRecord;
use crate::tables::syslog::SyslogRecord;
use crate::tables::{TableKind, ddm, grpc, lifecycle, snmp, syslog};
use crate::topology::{KeyId, ModuleKey, Topology};

/// Rows handed to the sink per `emit` call.
pub(crate) const BATCH_SIZE: usize = 4096;

/// One sink per output table, moved into the runner.
pub struct SinkSet {
    pub grpc: Box<dyn RecordSink<GrpcRecord> + Send>,
    pub snmp: Box<dyn RecordSink<SnmpRecord> + Send>,
    pub syslog: Box<dyn RecordSink<SyslogRecord> + Send>,
    pub ddm: Box<dyn RecordSink<DdmRecord> + Send>,
    pub lifecycle: Box<dyn RecordSink<LifecycleRecord> + Send>,
}

/// Outcome of one table's generation.
#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: TableKind,
    pub rows: u64,
    pub flagged: u64,
    pub batches: u64,
    /// Set when the table aborted early. Batches counted above remain
    /// committed at the sink.
    pub error: Option<SimError>,
}

/// Result of a whole run. `seed` is the seed actually used — report it
/// to reproduce the run exactly.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub reports: Vec<TableReport>,
}

impl RunSummary {
    pub fn report(&self, table: TableKind) -> &TableReport {
        self.reports
            .iter()
            .find(|r| r.table == table)
            .expect("all five tables are always reported")
    }

    pub fn total_rows(&self) -> u64 {
        self.reports.iter().map(|r| r.rows).sum()
    }
}

/// Generates all five tables.
///
/// Configuration problems surface before any row is synthesized. Sink
/// write failures abort only the affected table and are recorded in that
/// table's report; a schema violation anywhere fails the whole run after
/// the remaining workers drain, since it signals an anchor bug rather
/// than bad input.
pub fn run(request: &GenerationRequest, sinks: SinkSet) -> Result<RunSummary, SimError> {
    request.validate()?;
    let seed = request.resolve_seed();
    let topology = Topology::build(request, seed)?;

    // Validate every table's plan up front so a bad range fails the run
    // eagerly and never partially.
    for table in TableKind::all() {
        plan_for(request, &topology, table)?;
    }

    info!(
        seed,
        devices = topology.devices().len(),
        keys = topology.key_count(),
        rows_per_table = request.rows_per_table,
        fault_ratio = request.fault_ratio,
        "generation starting"
    );

    let SinkSet {
        grpc: grpc_sink,
        snmp: snmp_sink,
        syslog: syslog_sink,
        ddm: ddm_sink,
        lifecycle: lifecycle_sink,
    } = sinks;

    let (tx, rx) = bounded::<TableReport>(TableKind::all().len());
    let topology_ref = &topology;

    thread::scope(|scope| {
        spawn_worker(scope, &tx, TableKind::Grpc, {
            let mut sink = grpc_sink;
            move || {
                generate_table(
                    TableKind::Grpc,
                    request,
                    topology_ref,
                    seed,
                    &mut sink,
                    |rng, _id, key, common, fault| grpc::synthesize(rng, key, common, fault),
                )
            }
        });
        spawn_worker(scope, &tx, TableKind::Snmp, {
            let mut sink = snmp_sink;
            move || {
                generate_table(
                    TableKind::Snmp,
                    request,
                    topology_ref,
                    seed,
                    &mut sink,
                    |rng, _id, key, common, fault| snmp::synthesize(rng, key, common, fault),
                )
            }
        });
        spawn_worker(scope, &tx, TableKind::Syslog, {
            let mut sink = syslog_sink;
            move || {
                generate_table(
                    TableKind::Syslog,
                    request,
                    topology_ref,
                    seed,
                    &mut sink,
                    |rng, _id, key, common, fault| syslog::synthesize(rng, key, common, fault),
                )
            }
        });

        // DDM runs on the coordinator: Lifecycle Prediction consumes its
        // severity history and must be generated after it.
        let mut history = DdmHistory::new(topology_ref.key_count());
        let mut ddm_sink = ddm_sink;
        let ddm_report = generate_table(
            TableKind::Ddm,
            request,
            topology_ref,
            seed,
            &mut ddm_sink,
            |rng, id, key, common, fault| {
                history.record(id, fault.severity());
                ddm::synthesize(rng, key, common, fault)
            },
        );
        let _ = tx.send(ddm_report);

        let mut lifecycle_sink = lifecycle_sink;
        let lifecycle_report = generate_table(
            TableKind::Lifecycle,
            request,
            topology_ref,
            seed,
            &mut lifecycle_sink,
            |rng, id, key, common, fault| {
                lifecycle::synthesize(rng, id, key, common, fault, &history)
            },
        );
        let _ = tx.send(lifecycle_report);
    });
    drop(tx);

    let mut reports: Vec<TableReport> = rx.into_iter().collect();
    reports.sort_by_key(|r| TableKind::all().iter().position(|t| *t == r.table));

    // A schema violation is fatal for the run as a whole.
    if let Some(violation) = reports.iter().find_map(|r| match &r.error {
        Some(e @ SimError::SchemaViolation { .. }) => Some(e.clone()),
        _ => None,
    }) {
        return Err(violation);
    }

    Ok(RunSummary { seed, reports })
}

fn spawn_worker<'scope, F>(
    scope: &'scope thread::Scope<'scope, '_>,
    tx: &crossbeam_channel::Sender<TableReport>,
    table: TableKind,
    work: F,
) where
    F: FnOnce() -> TableReport + Send + 'scope,
{
    let tx = tx.clone();
    thread::Builder::new()
        .name(format!("netsim-{}", table.name()))
        .spawn_scoped(scope, move || {
            let _ = tx.send(work());
        })
        .expect("failed to spawn table worker");
}

fn plan_for(
    request: &GenerationRequest,
    topology: &Topology,
    table: TableKind,
) -> Result<SamplePlan, SimError> {
    SamplePlan::plan(
        &request.range,
        request.rows_per_table,
        topology.key_count(),
        table.cadence_secs(),
    )
}

/// Generates one table: pulls the plan lazily, synthesizes row by row,
/// emits bounded batches, and always signals `finish` on a clean walk —
/// including the zero-row case.
fn generate_table<R, S, F>(
    table: TableKind,
    request: &GenerationRequest,
    topology: &Topology,
    seed: u64,
    sink: &mut S,
    mut synthesize: F,
) -> TableReport
where
    S: RecordSink<R> + ?Sized,
    F: FnMut(
        &mut ChaCha8Rng,
        KeyId,
        &ModuleKey,
        CommonFields,
        &FaultState,
    ) -> Result<R, SimError>,
{
    let mut report = TableReport {
        table,
        rows: 0,
        flagged: 0,
        batches: 0,
        error: None,
    };

    let plan = match plan_for(request, topology, table) {
        Ok(plan) => plan,
        Err(e) => {
            report.error = Some(e);
            return report;
        }
    };

    let mut rng = ChaCha8Rng::seed_from_u64(stream_seed(seed, table.name()));
    let mut injector = match FaultInjector::new(seed, request.fault_ratio) {
        Ok(injector) => injector,
        Err(e) => {
            report.error = Some(e);
            return report;
        }
    };

    let mut batch: Vec<R> = Vec::with_capacity(BATCH_SIZE);
    for (key_id, ts) in plan.iter() {
        let key = topology.key(key_id);
        let fault = injector.decide(key_id, &key.module_id, ts);
        let common = common_fields_for(key, ts);

        match synthesize(&mut rng, key_id, key, common, &fault) {
            Ok(record) => {
                if fault.is_anomalous() {
                    report.flagged += 1;
                }
                batch.push(record);
            }
            Err(e) => {
                warn!(table = table.name(), error = %e, "table aborted");
                report.error = Some(e);
                return report;
            }
        }

        if batch.len() == BATCH_SIZE {
            if let Err(e) = flush(table, sink, &mut batch, &mut report) {
                report.error = Some(e);
                return report;
            }
        }
    }

    if !batch.is_empty() {
        if let Err(e) = flush(table, sink, &mut batch, &mut report) {
            report.error = Some(e);
            return report;
        }
    }

    if let Err(e) = sink.finish(table.name()) {
        report.error = Some(wrap_sink_error(table, report.batches, e));
        return report;
    }

    info!(
        table = table.name(),
        rows = report.rows,
        flagged = report.flagged,
        batches = report.batches,
        "table complete"
    );
    report
}

fn flush<R, S>(
    table: TableKind,
    sink: &mut S,
    batch: &mut Vec<R>,
    report: &mut TableReport,
) -> Result<(), SimError>
where
    S: RecordSink<R> + ?Sized,
{
    let rows = batch.len() as u64;
    sink.emit(std::mem::take(batch))
        .map_err(|e| wrap_sink_error(table, report.batches, e))?;
    report.rows += rows;
    report.batches += 1;
    batch.reserve(BATCH_SIZE);
    Ok(())
}

fn wrap_sink_error(table: TableKind, batches_committed: u64, source: SinkWriteError) -> SimError {
    SimError::SinkWrite {
        table,
        batches_committed,
        source,
    }
}
