mod common;

use std::fs;

use annogen::error::Error;
use annogen::render::GENERATED_MARKER;
use annogen::{Config, GeneratorKind, Pipeline, Runner, emit};
use common::package;

const MIXED: &str = r#"
pub struct Context;

/// @enum
pub struct Status(pub i32);
pub const STATUS_ON: Status = Status(1);
pub const STATUS_OFF: Status = Status(0);

/// @api path=/status/
pub fn get_status(ctx: &Context) -> Status { todo!() }
"#;

#[test]
fn reruns_are_byte_identical() {
    let dir = package(&[("lib.rs", MIXED)]);
    let runner = Runner::new(Config::default()).with_all();

    let first = runner.run(dir.path()).unwrap();
    let second = runner.run(dir.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn written_artifacts_are_ignored_by_the_next_run() {
    let dir = package(&[("lib.rs", MIXED)]);
    let runner = Runner::new(Config::default()).with_all();

    let first = runner.run(dir.path()).unwrap();
    let kinds: Vec<_> = first.iter().map(|artifact| artifact.kind).collect();
    assert_eq!(kinds, [GeneratorKind::Api, GeneratorKind::Enum]);

    let emitted = emit::write_artifacts(dir.path(), &first).unwrap();
    assert!(emitted.iter().all(|emitted| emitted.changed));
    for artifact in &first {
        let written = fs::read_to_string(dir.path().join(&artifact.filename)).unwrap();
        assert!(written.starts_with(GENERATED_MARKER));
    }

    let second = runner.run(dir.path()).unwrap();
    assert_eq!(first, second);
    let emitted = emit::write_artifacts(dir.path(), &second).unwrap();
    assert!(emitted.iter().all(|emitted| !emitted.changed));
}

#[test]
fn output_names_follow_the_configuration() {
    let dir = package(&[("lib.rs", MIXED)]);
    let config: Config = toml::from_str("[output]\nenums = \"status_strings.rs\"\n").unwrap();
    let artifacts = Runner::new(config)
        .with_kind(GeneratorKind::Enum)
        .run(dir.path())
        .unwrap();

    assert_eq!(artifacts[0].filename, "status_strings.rs");
}

#[test]
fn runtime_modules_follow_the_configuration() {
    let dir = package(&[("lib.rs", MIXED)]);
    let config: Config = toml::from_str("[runtime]\nweb = \"server::http\"\n").unwrap();
    let artifacts = Runner::new(config).with_kind(GeneratorKind::Api).run(dir.path()).unwrap();

    assert!(artifacts[0].text.contains("use server::http;"));
    assert!(artifacts[0].text.contains("pub fn register(router: &mut http::Router)"));
}

#[test]
fn unknown_type_filters_fail() {
    let dir = package(&[("lib.rs", MIXED)]);
    let config = Config::default();
    let err = Runner::new(config.clone())
        .with(Pipeline::datastore(&config).only_type("Status"))
        .run(dir.path())
        .unwrap_err();
    assert!(matches!(err, Error::TypeNotFound { .. }));
}

#[test]
fn validation_errors_of_every_generator_are_reported_together() {
    let dir = package(&[(
        "lib.rs",
        r#"
        pub struct Context;

        /// @datastore
        pub struct NoKey {
            /// @tag ent:"timestamp"
            pub at: std::time::SystemTime,
        }

        /// @api path=/x/
        pub fn fetch_x(ctx: &Context) {}

        /// @enum
        pub struct Status(pub i32);
        pub const STATUS_ON: Status = Status(1);
        "#,
    )]);

    let Err(Error::Invalid(errors)) = Runner::new(Config::default()).with_all().run(dir.path()) else {
        panic!("expected validation errors");
    };
    let declarations: Vec<_> = errors.iter().map(|error| error.declaration.as_str()).collect();
    assert_eq!(declarations, ["NoKey", "fetch_x"]);
}

#[test]
fn plain_packages_produce_nothing() {
    let dir = package(&[("lib.rs", "pub struct Plain;\n")]);
    let artifacts = Runner::new(Config::default()).with_all().run(dir.path()).unwrap();
    assert!(artifacts.is_empty());
}

#[test]
fn missing_directories_are_load_errors() {
    let dir = package(&[]);
    let err = Runner::new(Config::default())
        .with_all()
        .run(&dir.path().join("absent"))
        .unwrap_err();
    assert!(matches!(err, Error::Load(_)));
}
