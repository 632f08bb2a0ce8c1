//! Behavioural tests for [`run_pipeline`].
//!
//! The pipeline runs against [`StubResourceSource`] and an in-memory sink so
//! the scenarios exercise windowing, regrouping, and dispatch without a
//! network or database.

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use swapi_core::test_support::MemorySink;
use swapi_core::{IdRange, PersonId};
use swapi_data::dispatch::DEFAULT_MAX_PENDING;
use swapi_data::enrich::FetchError;
use swapi_data::pipeline::{LoadReport, PipelineError, PipelineOptions, run_pipeline};
use swapi_data::source::test_support::StubResourceSource;

type SourceCell = RefCell<Option<StubResourceSource>>;
type SinkCell = RefCell<Option<Arc<MemorySink>>>;
type ResultCell = RefCell<Option<Result<LoadReport, PipelineError>>>;

#[fixture]
fn source() -> SourceCell {
    RefCell::new(None)
}

#[fixture]
fn sink() -> SinkCell {
    RefCell::new(None)
}

#[fixture]
fn result() -> ResultCell {
    RefCell::new(None)
}

fn id(value: u32) -> PersonId {
    PersonId::new(value).expect("non-zero id")
}

fn serving(ids: &[u32]) -> StubResourceSource {
    ids.iter().fold(StubResourceSource::default(), |stub, &value| {
        stub.with_person(value, &format!("Person {value}"))
    })
}

fn stored_ids(sink: &SinkCell) -> Vec<u32> {
    sink.borrow()
        .as_ref()
        .expect("sink must be initialised")
        .stored_ids()
}

// --- Given steps ---

#[given("an API serving people 1 and 3")]
fn api_with_gap(#[from(source)] source: &SourceCell) {
    *source.borrow_mut() = Some(serving(&[1, 3]));
}

#[given("an API serving people 1 to 4")]
fn api_with_four(#[from(source)] source: &SourceCell) {
    *source.borrow_mut() = Some(serving(&[1, 2, 3, 4]));
}

#[given("an API serving people 1 to 6")]
fn api_with_six(#[from(source)] source: &SourceCell) {
    *source.borrow_mut() = Some(serving(&[1, 2, 3, 4, 5, 6]));
}

#[given("an API serving people 1 to 4 where person 3 is unreachable")]
fn api_with_failure(#[from(source)] source: &SourceCell) {
    *source.borrow_mut() =
        Some(serving(&[1, 2, 3, 4]).with_failure("https://swapi.test/api/people/3/"));
}

#[given("an empty store")]
fn empty_store(#[from(sink)] sink: &SinkCell) {
    *sink.borrow_mut() = Some(Arc::new(MemorySink::default()));
}

#[given("a store rejecting person 2")]
fn rejecting_store(#[from(sink)] sink: &SinkCell) {
    *sink.borrow_mut() = Some(Arc::new(MemorySink::rejecting([id(2)])));
}

#[given("a store rejecting person 1")]
fn rejecting_first(#[from(sink)] sink: &SinkCell) {
    *sink.borrow_mut() = Some(Arc::new(MemorySink::rejecting([id(1)])));
}

// --- When steps ---

#[when("I load people 1 to 3 in windows of 2 and batches of 2")]
fn load_three(
    #[from(source)] source: &SourceCell,
    #[from(sink)] sink: &SinkCell,
    #[from(result)] result: &ResultCell,
) {
    load(source, sink, result, 3, Some(DEFAULT_MAX_PENDING));
}

#[when("I load people 1 to 4 in windows of 2 and batches of 2")]
fn load_four(
    #[from(source)] source: &SourceCell,
    #[from(sink)] sink: &SinkCell,
    #[from(result)] result: &ResultCell,
) {
    load(source, sink, result, 4, Some(DEFAULT_MAX_PENDING));
}

#[when("I load people 1 to 6 in windows of 2 and batches of 2 with one pending batch")]
fn load_six_one_pending(
    #[from(source)] source: &SourceCell,
    #[from(sink)] sink: &SinkCell,
    #[from(result)] result: &ResultCell,
) {
    load(source, sink, result, 6, NonZeroUsize::new(1));
}

fn load(
    source: &SourceCell,
    sink: &SinkCell,
    result: &ResultCell,
    last: u32,
    max_pending: Option<NonZeroUsize>,
) {
    let guard = source.borrow();
    let stub = guard.as_ref().expect("source must be initialised");
    let sink = Arc::clone(sink.borrow().as_ref().expect("sink must be initialised"));
    let two = NonZeroUsize::new(2).expect("non-zero");
    let options = PipelineOptions::default()
        .with_ids(IdRange::new(id(1), id(last)).expect("valid range"))
        .with_concurrency(two)
        .with_batch_size(two)
        .with_max_pending_batches(max_pending);
    let outcome = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("create Tokio runtime")
        .block_on(run_pipeline(stub, sink, &options));
    *result.borrow_mut() = Some(outcome);
}

// --- Then steps ---

#[then("people 1 and 3 are persisted")]
fn then_gap_persisted(#[from(sink)] sink: &SinkCell) {
    assert_eq!(stored_ids(sink), vec![1, 3]);
}

#[then("people 1 and 2 are persisted")]
fn then_first_window_persisted(#[from(sink)] sink: &SinkCell) {
    assert_eq!(stored_ids(sink), vec![1, 2]);
}

#[then("people 3 and 4 are persisted")]
fn then_second_batch_persisted(#[from(sink)] sink: &SinkCell) {
    assert_eq!(stored_ids(sink), vec![3, 4]);
}

#[then("people 3 to 6 are persisted")]
fn then_later_batches_persisted(#[from(sink)] sink: &SinkCell) {
    assert_eq!(stored_ids(sink), vec![3, 4, 5, 6]);
}

#[then("the report counts 2 batches and 1 absent person")]
fn then_report(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    let report = borrowed
        .as_ref()
        .expect("pipeline must have run")
        .as_ref()
        .expect("expected Ok result");
    assert_eq!(report.requested, 3);
    assert_eq!(report.batches, 2);
    assert_eq!(report.persisted, 2);
    assert_eq!(report.absent(), 1);
}

#[then("a fetch error is returned")]
fn then_fetch_error(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    assert!(
        matches!(
            &*borrowed,
            Some(Err(PipelineError::Fetch(FetchError::Transport(_))))
        ),
        "expected a fetch error, got {borrowed:?}"
    );
}

#[then("a persistence error is returned")]
fn then_persistence_error(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    assert!(
        matches!(&*borrowed, Some(Err(PipelineError::Dispatch(_)))),
        "expected a dispatch error, got {borrowed:?}"
    );
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/load_people.feature", name = $title)]
        fn $fn_name(source: SourceCell, sink: SinkCell, result: ResultCell) {
            let _ = (source, sink, result);
        }
    };
}

register_scenario!(
    persisting_around_absent_identifier,
    "persisting people around an absent identifier"
);
register_scenario!(
    aborting_on_failed_fetch,
    "aborting the load when a fetch fails"
);
register_scenario!(
    isolating_rejected_batch,
    "isolating a batch the store rejects"
);
register_scenario!(
    isolating_rejected_batch_with_one_pending,
    "isolating a rejected batch with one persistence task at a time"
);
