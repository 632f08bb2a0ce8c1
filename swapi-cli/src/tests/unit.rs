//! Focused unit tests covering load configuration and command wiring.

use super::*;
use rstest::rstest;
use swapi_core::test_support::MemorySink;
use swapi_data::source::test_support::StubResourceSource;

fn parse_load(args: &[&str]) -> LoadArgs {
    let invocation = ["swapi-loader", "load"].iter().chain(args);
    let cli = Cli::try_parse_from(invocation).expect("arguments should parse");
    match cli.command {
        Command::Load(load) => load,
    }
}

#[rstest]
fn defaults_apply_when_nothing_is_configured() {
    let config = LoadConfig::try_from(LoadArgs::default()).expect("defaults are valid");
    assert_eq!(config.database, Utf8PathBuf::from("swapi.db"));
    assert_eq!(config.source.base_url.as_ref(), DEFAULT_BASE_URL);
    assert_eq!(config.source.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(config.source.timeout, Duration::from_secs(30));
    assert_eq!(config.pipeline, PipelineOptions::default());
}

#[rstest]
fn flags_override_defaults() {
    let args = parse_load(&[
        "--database",
        "out/people.db",
        "--base-url",
        "http://localhost:8080/api/people/",
        "--first-id",
        "10",
        "--last-id",
        "20",
        "--concurrency",
        "4",
        "--batch-size",
        "5",
        "--max-pending-batches",
        "3",
        "--user-agent",
        "loader-test/1.0",
        "--timeout-secs",
        "5",
    ]);
    let config = LoadConfig::try_from(args).expect("overrides are valid");
    assert_eq!(config.database, Utf8PathBuf::from("out/people.db"));
    assert_eq!(
        config.source.base_url.as_ref(),
        "http://localhost:8080/api/people"
    );
    assert_eq!(config.source.user_agent, "loader-test/1.0");
    assert_eq!(config.source.timeout, Duration::from_secs(5));
    assert_eq!(config.pipeline.ids.first().get(), 10);
    assert_eq!(config.pipeline.ids.last().get(), 20);
    assert_eq!(config.pipeline.concurrency.get(), 4);
    assert_eq!(config.pipeline.batch_size.get(), 5);
    assert_eq!(config.pipeline.max_pending_batches, NonZeroUsize::new(3));
}

#[rstest]
fn zero_pending_cap_means_unbounded() {
    let config = LoadConfig::try_from(parse_load(&["--max-pending-batches", "0"]))
        .expect("zero cap is valid");
    assert_eq!(config.pipeline.max_pending_batches, None);
}

#[rstest]
#[case(&["--first-id", "0"], ARG_FIRST_ID, ENV_FIRST_ID)]
#[case(&["--last-id", "0"], ARG_LAST_ID, ENV_LAST_ID)]
#[case(&["--concurrency", "0"], ARG_CONCURRENCY, ENV_CONCURRENCY)]
#[case(&["--batch-size", "0"], ARG_BATCH_SIZE, ENV_BATCH_SIZE)]
#[case(&["--timeout-secs", "0"], ARG_TIMEOUT_SECS, ENV_TIMEOUT_SECS)]
fn zero_settings_are_rejected(
    #[case] args: &[&str],
    #[case] expected_field: &'static str,
    #[case] expected_env: &'static str,
) {
    let err = LoadConfig::try_from(parse_load(args)).expect_err("zero should be rejected");
    match err {
        CliError::ZeroSetting { field, env } => {
            assert_eq!(field, expected_field);
            assert_eq!(env, expected_env);
        }
        other => panic!("expected ZeroSetting, found {other:?}"),
    }
}

#[rstest]
fn inverted_range_is_rejected() {
    let err = LoadConfig::try_from(parse_load(&["--first-id", "9", "--last-id", "3"]))
        .expect_err("inverted range");
    assert!(
        matches!(err, CliError::InvalidIdRange(_)),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn non_numeric_ids_fail_argument_parsing() {
    let err = Cli::try_parse_from(["swapi-loader", "load", "--first-id", "luke"])
        .expect_err("ids are numeric");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[rstest]
fn summary_reports_loaded_and_absent_people() {
    let report = LoadReport {
        requested: 3,
        batches: 2,
        persisted: 2,
    };
    let line = summary_line(&report, Duration::from_millis(1500));
    assert_eq!(line, "Loaded 2 people (1 absent) in 1.50s");
}

#[rstest]
fn execute_loads_configured_range_into_sink() {
    let source = StubResourceSource::default()
        .with_person(1, "Luke Skywalker")
        .with_person(2, "C-3PO");
    let config = LoadConfig::try_from(parse_load(&["--last-id", "3"])).expect("valid config");
    let sink = MemorySink::default();
    let report = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("create Tokio runtime")
        .block_on(execute(&config, &source, sink))
        .expect("load succeeds");
    assert_eq!(report.requested, 3);
    assert_eq!(report.persisted, 2);
}

#[rstest]
fn invalid_base_url_fails_before_touching_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database =
        Utf8PathBuf::from_path_buf(dir.path().join("swapi.db")).expect("utf-8 temp path");
    let args = parse_load(&["--database", database.as_str(), "--base-url", "not a url"]);
    let config = LoadConfig::try_from(args).expect("config is structurally valid");
    let err = run_load(&config).expect_err("base url is rejected");
    assert!(
        matches!(err, CliError::BuildSource { .. }),
        "unexpected error {err:?}"
    );
    assert!(!database.exists());
}
