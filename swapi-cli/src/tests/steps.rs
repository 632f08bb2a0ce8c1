//! Behaviour-driven step definitions driving the load command scenarios.

use super::*;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use swapi_core::test_support::MemorySink;
use swapi_data::source::test_support::StubResourceSource;

/// Aggregates load scenario state so each step takes a single world argument.
struct LoadWorld {
    source: RefCell<StubResourceSource>,
    cli_args: RefCell<Vec<String>>,
    outcome: RefCell<Option<Result<LoadReport, CliError>>>,
}

impl LoadWorld {
    fn new() -> Self {
        Self {
            source: RefCell::new(StubResourceSource::default()),
            cli_args: RefCell::new(Vec::new()),
            outcome: RefCell::new(None),
        }
    }

    fn push_flag(&self, flag: &str) {
        self.cli_args
            .borrow_mut()
            .extend(flag.split_whitespace().map(str::to_owned));
    }
}

#[fixture]
fn world() -> LoadWorld {
    LoadWorld::new()
}

#[given("an API serving people 1 to 3")]
fn api_serving_three(#[from(world)] world: &LoadWorld) {
    let stub = StubResourceSource::default()
        .with_person(1, "Luke Skywalker")
        .with_person(2, "C-3PO")
        .with_person(3, "R2-D2");
    world.source.replace(stub);
}

#[given("I pass \"--last-id 3\" and \"--batch-size 1\" as CLI flags")]
fn pass_range_and_batch(#[from(world)] world: &LoadWorld) {
    world.push_flag("--last-id 3");
    world.push_flag("--batch-size 1");
}

#[given("I pass \"--batch-size 0\" as a CLI flag")]
fn pass_zero_batch(#[from(world)] world: &LoadWorld) {
    world.push_flag("--batch-size 0");
}

#[given("I pass \"--first-id 5\" and \"--last-id 2\" as CLI flags")]
fn pass_inverted_range(#[from(world)] world: &LoadWorld) {
    world.push_flag("--first-id 5");
    world.push_flag("--last-id 2");
}

#[when("I run the load command")]
fn run_load_command(#[from(world)] world: &LoadWorld) {
    let mut invocation = vec!["swapi-loader".to_owned(), "load".to_owned()];
    invocation.extend(world.cli_args.borrow().iter().cloned());
    let source = world.source.borrow();
    let outcome = Cli::try_parse_from(invocation)
        .map_err(CliError::ArgumentParsing)
        .and_then(|cli| match cli.command {
            Command::Load(args) => LoadConfig::try_from(args),
        })
        .and_then(|config| {
            tokio::runtime::Builder::new_current_thread()
                .build()
                .map_err(CliError::Runtime)?
                .block_on(execute(&config, &*source, MemorySink::default()))
        });
    world.outcome.replace(Some(outcome));
}

#[then("3 people are loaded in 3 batches")]
fn three_loaded(#[from(world)] world: &LoadWorld) {
    let borrowed = world.outcome.borrow();
    let report = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect("expected success");
    assert_eq!(report.persisted, 3);
    assert_eq!(report.batches, 3);
    assert_eq!(report.absent(), 0);
}

#[then("the CLI reports that \"batch-size\" must be positive")]
fn reports_zero_batch(#[from(world)] world: &LoadWorld) {
    let borrowed = world.outcome.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::ZeroSetting { field, .. } => assert_eq!(*field, ARG_BATCH_SIZE),
        other => panic!("unexpected error {other:?}"),
    }
}

#[then("the CLI reports an invalid id range")]
fn reports_inverted_range(#[from(world)] world: &LoadWorld) {
    let borrowed = world.outcome.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    assert!(
        matches!(error, CliError::InvalidIdRange(_)),
        "unexpected error {error:?}"
    );
}

macro_rules! register_load_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/load_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: LoadWorld) {
            let _ = world;
        }
    };
}

register_load_scenario!(loading_selected_range, "loading a range selected with CLI flags");
register_load_scenario!(rejecting_zero_batch, "rejecting a zero batch size");
register_load_scenario!(rejecting_inverted_range, "rejecting an inverted id range");
