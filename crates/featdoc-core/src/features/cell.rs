//! Spreadsheet address decoding features

use featdoc_property::{PropertyFlags, PropertyKind, PropertySpec};
use once_cell::sync::Lazy;
use regex::Regex;

use super::DOCUMENT_OBJECT;
use crate::exec::{ExecContext, ExecError};
use crate::registry::ObjectType;

pub const FEATURE_TEST_COLUMN: &str = "App::FeatureTestColumn";
pub const FEATURE_TEST_ROW: &str = "App::FeatureTestRow";
pub const FEATURE_TEST_ABS_ADDRESS: &str = "App::FeatureTestAbsAddress";

const MAX_ROWS: i64 = 16384;

static COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{1,3}$").expect("column pattern"));
static ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{1,5}$").expect("row pattern"));
static ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\$?)([A-Z]{1,2})(\$?)([0-9]{1,5})$").expect("address pattern")
});

/// Zero-based index of a column name: `A` is 0, `AA` is 26, `ZZZ` is 18277
pub(crate) fn decode_column(text: &str) -> Option<i64> {
    if !COLUMN.is_match(text) {
        return None;
    }
    let bijective = text
        .bytes()
        .fold(0_i64, |acc, b| acc * 26 + i64::from(b - b'A' + 1));
    Some(bijective - 1)
}

/// Zero-based index of a row number in `1..=16384`
pub(crate) fn decode_row(text: &str) -> Option<i64> {
    if !ROW.is_match(text) {
        return None;
    }
    let row: i64 = text.parse().ok()?;
    (1..=MAX_ROWS).contains(&row).then_some(row - 1)
}

/// Cell address with at least one absolute part
pub(crate) fn is_absolute_address(text: &str) -> bool {
    let Some(caps) = ADDRESS.captures(text) else {
        return false;
    };
    let absolute = !caps[1].is_empty() || !caps[3].is_empty();
    absolute && decode_column(&caps[2]).is_some() && decode_row(&caps[4]).is_some()
}

fn value_spec() -> PropertySpec {
    PropertySpec::new(PropertyKind::Integer, "Value")
        .group("Test")
        .flags(PropertyFlags::OUTPUT)
}

fn silent_spec() -> PropertySpec {
    PropertySpec::new(PropertyKind::Bool, "Silent")
        .group("Test")
        .doc("Report bad input as -1 instead of failing")
}

pub(super) fn types() -> Vec<ObjectType> {
    vec![
        ObjectType::new(FEATURE_TEST_COLUMN)
            .parent(DOCUMENT_OBJECT)
            .property(PropertySpec::new(PropertyKind::String, "Column").group("Test"))
            .property(silent_spec())
            .property(value_spec())
            .executor(|ctx| decode_into(ctx, "Column", decode_column)),
        ObjectType::new(FEATURE_TEST_ROW)
            .parent(DOCUMENT_OBJECT)
            .property(PropertySpec::new(PropertyKind::String, "Row").group("Test"))
            .property(silent_spec())
            .property(value_spec())
            .executor(|ctx| decode_into(ctx, "Row", decode_row)),
        ObjectType::new(FEATURE_TEST_ABS_ADDRESS)
            .parent(DOCUMENT_OBJECT)
            .property(PropertySpec::new(PropertyKind::String, "Address").group("Test"))
            .property(
                PropertySpec::new(PropertyKind::Bool, "Valid")
                    .group("Test")
                    .flags(PropertyFlags::OUTPUT),
            )
            .executor(|ctx| {
                let address = ctx.string("Address")?;
                ctx.set("Valid", is_absolute_address(&address))
            }),
    ]
}

fn decode_into(
    ctx: &mut ExecContext<'_>,
    input: &str,
    decode: fn(&str) -> Option<i64>,
) -> Result<(), ExecError> {
    let text = ctx.string(input)?;
    match decode(&text) {
        Some(value) => ctx.set("Value", value),
        None if ctx.boolean("Silent")? => ctx.set("Value", -1_i64),
        None => Err(ExecError::new(format!("invalid {} '{text}'", input.to_lowercase()))),
    }
}
