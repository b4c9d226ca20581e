//! Integer array equality in the style of Unity's `UnityAssertEqualIntArray`.
//!
//! Elements are read from raw byte buffers at a selectable width. With
//! `ArrayToValue` the expected side is a single element compared against
//! every actual element.

use serde::{Deserialize, Serialize};

use focalkit_harness::{
    FatalError, FatalHook, LiteralSet, Suite, TestContext, expect_eq, expect_err, expect_false,
    expect_ok, expect_true,
};

pub const SUITE: &str = "int_array";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementWidth {
    W8,
    W16,
    W32,
    #[cfg(feature = "int64")]
    W64,
}

impl ElementWidth {
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::W8 => 1,
            Self::W16 => 2,
            Self::W32 => 4,
            #[cfg(feature = "int64")]
            Self::W64 => 8,
        }
    }

    /// Width for a byte length. Unsupported lengths fall back to 4 bytes.
    #[must_use]
    pub const fn from_bytes(n: usize) -> Self {
        match n {
            1 => Self::W8,
            2 => Self::W16,
            #[cfg(feature = "int64")]
            8 => Self::W64,
            _ => Self::W32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStyle {
    Int,
    Uint,
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayFlags {
    ArrayToValue,
    ArrayToArray,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayVerdict {
    Pass,
    /// Zero elements requested.
    Pointless,
    OneArrayNull,
    ElementMismatch {
        index: u32,
        expected: i64,
        actual: i64,
        message: String,
    },
    /// A buffer ended before `num_elements` elements were read.
    BufferTooShort { index: u32 },
}

impl ArrayVerdict {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Pointless => "pointless",
            Self::OneArrayNull => "one_array_null",
            Self::ElementMismatch { .. } => "element_mismatch",
            Self::BufferTooShort { .. } => "buffer_too_short",
        }
    }

    #[must_use]
    pub fn index(&self) -> Option<u32> {
        match self {
            Self::ElementMismatch { index, .. } | Self::BufferTooShort { index } => Some(*index),
            _ => None,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Pass => String::new(),
            Self::Pointless => "You Asked Me To Compare Nothing, Which Was Pointless".to_string(),
            Self::OneArrayNull => "Expected pointer and actual pointer differ in nullness".to_string(),
            Self::ElementMismatch { message, .. } => message.clone(),
            Self::BufferTooShort { index } => format!("Element {index} is past the end of a buffer"),
        }
    }
}

fn read_element(buf: &[u8], offset: usize, width: ElementWidth, style: DisplayStyle) -> Option<i64> {
    let bytes = buf.get(offset..offset + width.bytes())?;
    let signed = style == DisplayStyle::Int;
    let value = match width {
        ElementWidth::W8 => {
            let raw = [bytes[0]];
            if signed {
                i64::from(i8::from_ne_bytes(raw))
            } else {
                i64::from(u8::from_ne_bytes(raw))
            }
        }
        ElementWidth::W16 => {
            let raw = [bytes[0], bytes[1]];
            if signed {
                i64::from(i16::from_ne_bytes(raw))
            } else {
                i64::from(u16::from_ne_bytes(raw))
            }
        }
        ElementWidth::W32 => {
            let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
            if signed {
                i64::from(i32::from_ne_bytes(raw))
            } else {
                i64::from(u32::from_ne_bytes(raw))
            }
        }
        #[cfg(feature = "int64")]
        ElementWidth::W64 => {
            let mut raw = [0_u8; 8];
            raw.copy_from_slice(bytes);
            i64::from_ne_bytes(raw)
        }
    };
    Some(value)
}

fn render(value: i64, width: ElementWidth, style: DisplayStyle) -> String {
    match style {
        DisplayStyle::Int => value.to_string(),
        // 64-bit unsigned values were read through i64; reinterpret for display.
        DisplayStyle::Uint => (value as u64).to_string(),
        DisplayStyle::Hex => format!("0x{:0w$X}", value as u64, w = width.bytes() * 2),
    }
}

/// Compare `num_elements` elements of `expected` and `actual`.
///
/// `None` stands for a null buffer. Two views of the same memory compare
/// equal without reading.
#[must_use]
pub fn assert_equal_int_array(
    expected: Option<&[u8]>,
    actual: Option<&[u8]>,
    num_elements: u32,
    width: ElementWidth,
    style: DisplayStyle,
    flags: ArrayFlags,
    msg: Option<&str>,
) -> ArrayVerdict {
    if num_elements == 0 {
        return ArrayVerdict::Pointless;
    }
    let (expected, actual) = match (expected, actual) {
        (None, None) => return ArrayVerdict::Pass,
        (Some(e), Some(a)) if std::ptr::eq(e, a) => return ArrayVerdict::Pass,
        (Some(e), Some(a)) => (e, a),
        _ => return ArrayVerdict::OneArrayNull,
    };

    let step = width.bytes();
    let mut expected_at = 0;
    let mut actual_at = 0;
    for index in 0..num_elements {
        let (Some(e), Some(a)) = (
            read_element(expected, expected_at, width, style),
            read_element(actual, actual_at, width, style),
        ) else {
            return ArrayVerdict::BufferTooShort { index };
        };
        if e != a {
            let mut message = format!(
                "Element {index} Expected {} Was {}",
                render(e, width, style),
                render(a, width, style)
            );
            if let Some(msg) = msg {
                message.push_str(". ");
                message.push_str(msg);
            }
            return ArrayVerdict::ElementMismatch {
                index,
                expected: e,
                actual: a,
                message,
            };
        }
        if flags == ArrayFlags::ArrayToArray {
            expected_at += step;
        }
        actual_at += step;
    }
    ArrayVerdict::Pass
}

/// Failing verdicts bail out through `hook`, the way a failed Unity
/// assertion leaves the running test.
#[allow(clippy::too_many_arguments)]
pub fn expect_equal_int_array(
    hook: &FatalHook,
    expected: Option<&[u8]>,
    actual: Option<&[u8]>,
    num_elements: u32,
    width: ElementWidth,
    style: DisplayStyle,
    flags: ArrayFlags,
    msg: Option<&str>,
) -> Result<(), FatalError> {
    match assert_equal_int_array(expected, actual, num_elements, width, style, flags, msg) {
        ArrayVerdict::Pass => Ok(()),
        failed => Err(hook.fire(failed.message())),
    }
}

/// Pack `values` at `width`, native endian, truncating each value.
#[must_use]
pub fn encode(values: &[i64], width: ElementWidth) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * width.bytes());
    for &v in values {
        match width {
            ElementWidth::W8 => out.extend_from_slice(&(v as i8).to_ne_bytes()),
            ElementWidth::W16 => out.extend_from_slice(&(v as i16).to_ne_bytes()),
            ElementWidth::W32 => out.extend_from_slice(&(v as i32).to_ne_bytes()),
            #[cfg(feature = "int64")]
            ElementWidth::W64 => out.extend_from_slice(&v.to_ne_bytes()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Literal table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct IntArrayInput {
    pub expected: Option<Vec<i64>>,
    pub actual: Option<Vec<i64>>,
    pub num_elements: u32,
    pub width: usize,
    pub style: DisplayStyle,
    pub flags: ArrayFlags,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpectedVerdict {
    pub verdict: String,
    #[serde(default)]
    pub index: Option<u32>,
}

const LITERAL_CASES: &str = include_str!("../fixtures/int_array_cases.json");

fn literal_table(ctx: &mut TestContext<'_>) {
    let Some(set) = expect_ok!(
        ctx,
        LiteralSet::<IntArrayInput, ExpectedVerdict>::from_json(LITERAL_CASES)
    ) else {
        return;
    };
    expect_eq!(ctx, set.focal.as_str(), "UnityAssertEqualIntArray");
    for case in &set.cases {
        let input = &case.input;
        let width = ElementWidth::from_bytes(input.width);
        let expected = input.expected.as_deref().map(|v| encode(v, width));
        let actual = input.actual.as_deref().map(|v| encode(v, width));
        let verdict = assert_equal_int_array(
            expected.as_deref(),
            actual.as_deref(),
            input.num_elements,
            width,
            input.style,
            input.flags,
            None,
        );
        expect_eq!(ctx, verdict.kind(), case.expected.verdict.as_str(), "{}: verdict", case.name);
        expect_eq!(ctx, verdict.index(), case.expected.index, "{}: index", case.name);
    }
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

fn zero_elements(ctx: &mut TestContext<'_>) {
    let e = encode(&[1], ElementWidth::W8);
    let a = encode(&[2], ElementWidth::W8);
    let verdict = assert_equal_int_array(
        Some(&e),
        Some(&a),
        0,
        ElementWidth::W8,
        DisplayStyle::Int,
        ArrayFlags::ArrayToArray,
        Some("zero elements"),
    );
    expect_eq!(ctx, verdict, ArrayVerdict::Pointless);
}

fn same_buffer_and_nulls(ctx: &mut TestContext<'_>) {
    let buf = encode(&[5, 6, 7], ElementWidth::W32);
    let same = assert_equal_int_array(
        Some(&buf),
        Some(&buf),
        3,
        ElementWidth::W32,
        DisplayStyle::Int,
        ArrayFlags::ArrayToArray,
        None,
    );
    expect_eq!(ctx, same, ArrayVerdict::Pass);
    let both_null = assert_equal_int_array(
        None,
        None,
        3,
        ElementWidth::W32,
        DisplayStyle::Int,
        ArrayFlags::ArrayToArray,
        None,
    );
    expect_eq!(ctx, both_null, ArrayVerdict::Pass);
    let one_null = assert_equal_int_array(
        None,
        Some(&buf),
        3,
        ElementWidth::W32,
        DisplayStyle::Int,
        ArrayFlags::ArrayToArray,
        None,
    );
    expect_eq!(ctx, one_null, ArrayVerdict::OneArrayNull);
}

fn int8_unsigned_mismatch(ctx: &mut TestContext<'_>) {
    let e = encode(&[10, -1, 30], ElementWidth::W8);
    let a = encode(&[10, 99, 30], ElementWidth::W8);
    let verdict = assert_equal_int_array(
        Some(&e),
        Some(&a),
        3,
        ElementWidth::W8,
        DisplayStyle::Uint,
        ArrayFlags::ArrayToArray,
        Some("int8 mismatch with range flag"),
    );
    expect_eq!(ctx, verdict.index(), Some(1));
    expect_eq!(
        ctx,
        verdict.message(),
        "Element 1 Expected 255 Was 99. int8 mismatch with range flag"
    );
}

fn int32_mismatch(ctx: &mut TestContext<'_>) {
    let e = encode(&[100, 200, 300], ElementWidth::W32);
    let a = encode(&[100, 201, 300], ElementWidth::W32);
    let verdict = assert_equal_int_array(
        Some(&e),
        Some(&a),
        3,
        ElementWidth::W32,
        DisplayStyle::Int,
        ArrayFlags::ArrayToArray,
        None,
    );
    expect_eq!(
        ctx,
        verdict,
        ArrayVerdict::ElementMismatch {
            index: 1,
            expected: 200,
            actual: 201,
            message: "Element 1 Expected 200 Was 201".to_string(),
        }
    );
    let hex = assert_equal_int_array(
        Some(&e),
        Some(&a),
        3,
        ElementWidth::W32,
        DisplayStyle::Hex,
        ArrayFlags::ArrayToArray,
        None,
    );
    expect_eq!(ctx, hex.message(), "Element 1 Expected 0x000000C8 Was 0x000000C9");
}

#[cfg(feature = "int64")]
fn int64_mismatch(ctx: &mut TestContext<'_>) {
    let e = encode(&[10_000_000_000, 20_000_000_000], ElementWidth::W64);
    let a = encode(&[10_000_000_000, 20_000_000_001], ElementWidth::W64);
    let verdict = assert_equal_int_array(
        Some(&e),
        Some(&a),
        2,
        ElementWidth::W64,
        DisplayStyle::Int,
        ArrayFlags::ArrayToArray,
        None,
    );
    expect_eq!(ctx, verdict.index(), Some(1));
    expect_true!(ctx, verdict.message().contains("Was 20000000001"));
}

fn array_to_value(ctx: &mut TestContext<'_>) {
    let value = encode(&[7], ElementWidth::W16);
    let all_sevens = encode(&[7, 7, 7], ElementWidth::W16);
    let one_off = encode(&[7, 8, 7], ElementWidth::W16);
    let pass = assert_equal_int_array(
        Some(&value),
        Some(&all_sevens),
        3,
        ElementWidth::W16,
        DisplayStyle::Int,
        ArrayFlags::ArrayToValue,
        None,
    );
    expect_eq!(ctx, pass, ArrayVerdict::Pass);
    let fail = assert_equal_int_array(
        Some(&value),
        Some(&one_off),
        3,
        ElementWidth::W16,
        DisplayStyle::Int,
        ArrayFlags::ArrayToValue,
        None,
    );
    expect_eq!(ctx, fail.index(), Some(1));
}

fn short_buffer(ctx: &mut TestContext<'_>) {
    let e = encode(&[1, 2, 3], ElementWidth::W8);
    let a = encode(&[1, 2], ElementWidth::W8);
    let verdict = assert_equal_int_array(
        Some(&e),
        Some(&a),
        3,
        ElementWidth::W8,
        DisplayStyle::Int,
        ArrayFlags::ArrayToArray,
        None,
    );
    expect_eq!(ctx, verdict, ArrayVerdict::BufferTooShort { index: 2 });
    expect_true!(ctx, verdict.message().starts_with("Element 2"));
}

fn fail_and_bail(ctx: &mut TestContext<'_>) {
    let e = encode(&[1, 2, 3], ElementWidth::W32);
    let a = encode(&[1, 9, 3], ElementWidth::W32);

    let passing = FatalHook::new();
    expect_ok!(
        ctx,
        expect_equal_int_array(
            &passing,
            Some(&e),
            Some(&e[..]),
            3,
            ElementWidth::W32,
            DisplayStyle::Int,
            ArrayFlags::ArrayToArray,
            None,
        )
    );
    expect_false!(ctx, passing.fatal_called());

    let failing = FatalHook::new();
    let bailed = expect_err!(
        ctx,
        expect_equal_int_array(
            &failing,
            Some(&e),
            Some(&a),
            3,
            ElementWidth::W32,
            DisplayStyle::Int,
            ArrayFlags::ArrayToArray,
            Some("bail"),
        )
    );
    expect_eq!(ctx, failing.fired(), 1);
    expect_eq!(
        ctx,
        bailed.map(|err| err.to_string()),
        Some("fatal: Element 1 Expected 2 Was 9. bail".to_string())
    );
}

#[must_use]
pub fn suite() -> Suite {
    let suite = Suite::new(SUITE, "UnityAssertEqualIntArray")
        .case("zero_elements", "zero elements is pointless", zero_elements)
        .case(
            "same_buffer_and_nulls",
            "same buffer and two nulls pass, one null fails",
            same_buffer_and_nulls,
        )
        .case(
            "int8_unsigned_mismatch",
            "8-bit unsigned display strips sign extension",
            int8_unsigned_mismatch,
        )
        .case("int32_mismatch", "first 32-bit mismatch is reported", int32_mismatch);
    #[cfg(feature = "int64")]
    let suite = suite.case("int64_mismatch", "64-bit elements compare", int64_mismatch);
    suite
        .case(
            "array_to_value",
            "expected pointer does not advance",
            array_to_value,
        )
        .case("short_buffer", "a short buffer is reported, not read past", short_buffer)
        .case(
            "fail_and_bail",
            "a failing comparison leaves through the fatal hook",
            fail_and_bail,
        )
        .case("literal_table", "table of literal inputs", literal_table)
}
