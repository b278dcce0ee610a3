mod common;

use annogen::GeneratorKind;
use annogen::error::{Error, SpecErrorKind};
use common::{compact, generate, generated_text, package};

const STATUS: &str = r#"
/// @enum
pub struct Status(pub i32);

pub const STATUS_ACTIVE: Status = Status(1);
pub const STATUS_PENDING_REVIEW: Status = Status(2);
pub const STATUS_DELETED: Status = Status(-1);
"#;

#[test]
fn status_maps_both_ways() {
    let dir = package(&[("status.rs", STATUS)]);
    let text = generated_text(GeneratorKind::Enum, dir.path());
    let compacted = compact(&text);

    assert!(text.starts_with("//! Code generated by annogen (enum). DO NOT EDIT.\n"));
    assert!(text.contains("use super::status::Status;"));
    assert!(text.contains("use annogen_runtime::enums;"));
    assert!(compacted.contains(r#"1=>::std::option::Option::Some("active")"#));
    assert!(compacted.contains(r#"-1=>::std::option::Option::Some("deleted")"#));
    assert!(compacted.contains(r#""pending_review"=>::std::result::Result::Ok(Status(2))"#));
    assert!(compacted.contains(r#"enums::ParseError::new("Status",text)"#));
    assert!(compacted.contains(r#"write!(f,"{}({})","Status",self.0)"#));
    assert!(compacted.contains("pubconstALL:&'static[Status]=&[Status(1),Status(2),Status(-1)]"));
}

#[test]
fn constants_in_other_files_count() {
    let dir = package(&[
        ("lib.rs", "/// @enum\npub struct Color(pub u8);\n"),
        ("palette.rs", "use super::Color;\npub const COLOR_DARK_RED: Color = Color(1);\n"),
    ]);
    let text = compact(&generated_text(GeneratorKind::Enum, dir.path()));

    assert!(text.contains(r#""dark_red"=>::std::result::Result::Ok(Color(1))"#));
}

#[test]
fn each_broken_enum_is_reported() {
    let dir = package(&[(
        "lib.rs",
        r#"
        /// @enum
        pub struct Status(pub i32);
        pub const STATUS_A: Status = Status(1);
        pub const STATUS_B: Status = Status(1);

        /// @enum
        pub struct Empty(pub i32);

        /// @enum
        pub struct Fine(pub i32);
        pub const FINE_OK: Fine = Fine(0);
        "#,
    )]);

    let Err(Error::Invalid(errors)) = generate(GeneratorKind::Enum, dir.path()) else {
        panic!("expected validation errors");
    };
    let kinds: Vec<_> = errors.into_iter().map(|error| (error.declaration, error.kind)).collect();
    assert_eq!(
        kinds,
        [
            (
                "Status".to_string(),
                SpecErrorKind::DuplicateEnumValue {
                    value: 1,
                    first: "STATUS_A".into(),
                    second: "STATUS_B".into()
                }
            ),
            ("Empty".to_string(), SpecErrorKind::NoEnumConstants),
        ]
    );
}
