//! Layout contracts for shadow types.
//!
//! A shadow type re-declares a library struct so a focal function can be
//! called without the library's headers. If the re-declaration drifts from
//! the real layout, the focal function silently reads the wrong bytes. Each
//! shadow type therefore declares its expected size, alignment and field
//! offsets, and [`check`] compares them with what the compiler produced.

use std::fmt;

use serde::Serialize;

/// Pointer width on the target, used to write portable contracts.
pub const PTR: usize = std::mem::size_of::<*const u8>();
pub const PTR_ALIGN: usize = std::mem::align_of::<*const u8>();

/// Round `n` up to a multiple of `align`.
#[must_use]
pub const fn round_up(n: usize, align: usize) -> usize {
    n.div_ceil(align) * align
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
}

/// Declared layout of a shadow type. Fields are listed in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutContract {
    pub type_name: &'static str,
    pub size: usize,
    pub align: usize,
    pub fields: &'static [FieldSpec],
}

/// Layout the compiler actually produced (see `observe_layout!`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedLayout {
    pub size: usize,
    pub align: usize,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutMismatch {
    Size {
        type_name: &'static str,
        expected: usize,
        actual: usize,
    },
    Align {
        type_name: &'static str,
        expected: usize,
        actual: usize,
    },
    FieldOffset {
        type_name: &'static str,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    MissingField {
        type_name: &'static str,
        field: &'static str,
    },
    UnexpectedField {
        type_name: &'static str,
        field: &'static str,
    },
    FieldOrder {
        type_name: &'static str,
        field: &'static str,
    },
}

impl fmt::Display for LayoutMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size {
                type_name,
                expected,
                actual,
            } => write!(f, "{type_name}: size {actual}, contract says {expected}"),
            Self::Align {
                type_name,
                expected,
                actual,
            } => write!(f, "{type_name}: align {actual}, contract says {expected}"),
            Self::FieldOffset {
                type_name,
                field,
                expected,
                actual,
            } => write!(
                f,
                "{type_name}.{field}: offset {actual}, contract says {expected}"
            ),
            Self::MissingField { type_name, field } => {
                write!(f, "{type_name}.{field}: declared in contract but not observed")
            }
            Self::UnexpectedField { type_name, field } => {
                write!(f, "{type_name}.{field}: observed but not in contract")
            }
            Self::FieldOrder { type_name, field } => {
                write!(f, "{type_name}.{field}: out of declaration order")
            }
        }
    }
}

/// A `#[repr(C)]` stand-in for a library type.
pub trait ShadowType {
    const CONTRACT: LayoutContract;

    fn observed() -> ObservedLayout;
}

/// Compare `T`'s compiled layout with its contract.
#[must_use]
pub fn check<T: ShadowType>() -> Vec<LayoutMismatch> {
    check_against(&T::CONTRACT, &T::observed())
}

/// Every difference between `contract` and `observed`; empty when they agree.
#[must_use]
pub fn check_against(contract: &LayoutContract, observed: &ObservedLayout) -> Vec<LayoutMismatch> {
    let type_name = contract.type_name;
    let mut out = Vec::new();
    if contract.size != observed.size {
        out.push(LayoutMismatch::Size {
            type_name,
            expected: contract.size,
            actual: observed.size,
        });
    }
    if contract.align != observed.align {
        out.push(LayoutMismatch::Align {
            type_name,
            expected: contract.align,
            actual: observed.align,
        });
    }

    for spec in contract.fields {
        match observed.fields.iter().find(|f| f.name == spec.name) {
            None => out.push(LayoutMismatch::MissingField {
                type_name,
                field: spec.name,
            }),
            Some(seen) if seen.offset != spec.offset => out.push(LayoutMismatch::FieldOffset {
                type_name,
                field: spec.name,
                expected: spec.offset,
                actual: seen.offset,
            }),
            Some(_) => {}
        }
    }
    for seen in &observed.fields {
        if !contract.fields.iter().any(|spec| spec.name == seen.name) {
            out.push(LayoutMismatch::UnexpectedField {
                type_name,
                field: seen.name,
            });
        }
    }

    // repr(C) keeps declaration order, so observed offsets must not decrease.
    for pair in observed.fields.windows(2) {
        if pair[1].offset < pair[0].offset {
            out.push(LayoutMismatch::FieldOrder {
                type_name,
                field: pair[1].name,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[allow(dead_code)]
    struct Sample {
        tag: u8,
        value: u32,
    }

    const SAMPLE: LayoutContract = LayoutContract {
        type_name: "Sample",
        size: 8,
        align: 4,
        fields: &[
            FieldSpec {
                name: "tag",
                offset: 0,
            },
            FieldSpec {
                name: "value",
                offset: 4,
            },
        ],
    };

    #[test]
    fn matching_layout_has_no_mismatches() {
        let observed = observe_layout!(Sample { tag, value });
        assert!(check_against(&SAMPLE, &observed).is_empty());
    }

    #[test]
    fn drift_is_reported_not_panicked() {
        let drifted = LayoutContract {
            size: 12,
            fields: &[
                FieldSpec {
                    name: "tag",
                    offset: 0,
                },
                FieldSpec {
                    name: "value",
                    offset: 8,
                },
                FieldSpec {
                    name: "flags",
                    offset: 8,
                },
            ],
            ..SAMPLE
        };
        let observed = observe_layout!(Sample { tag, value });
        let mismatches = check_against(&drifted, &observed);
        assert_eq!(mismatches.len(), 3);
        assert!(mismatches.contains(&LayoutMismatch::Size {
            type_name: "Sample",
            expected: 12,
            actual: 8
        }));
        assert!(mismatches.contains(&LayoutMismatch::FieldOffset {
            type_name: "Sample",
            field: "value",
            expected: 8,
            actual: 4
        }));
        assert_eq!(
            mismatches[2].to_string(),
            "Sample.flags: declared in contract but not observed"
        );
    }

    #[test]
    fn round_up_pads_to_alignment() {
        assert_eq!(round_up(12, 8), 16);
        assert_eq!(round_up(16, 8), 16);
        assert_eq!(round_up(PTR + 4, PTR_ALIGN), 2 * PTR);
    }

    #[test]
    fn mismatches_serialize_with_a_kind_tag() {
        let mismatch = LayoutMismatch::MissingField {
            type_name: "Sample",
            field: "flags",
        };
        let value = serde_json::to_value(&mismatch).unwrap();
        assert_eq!(value["kind"], "missing_field");
        assert_eq!(value["field"], "flags");
    }
}
