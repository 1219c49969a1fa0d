//! The feature catalog: version buckets and the named counters each bucket
//! recognizes.
//!
//! The catalog is immutable configuration data. Every [`CommitResult`] is
//! seeded from it, so two results from different commits always carry the
//! same buckets and counter names and can be compared without presence
//! checks. Counters only ever increase during one aggregation pass.

use std::fmt;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// A C# language version, used as a grouping key for feature counters.
///
/// Ordering follows release order; no arithmetic beyond comparison is ever
/// performed on versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CsVersion {
    V7_1,
    V7_2,
    V7_3,
    V8_0,
    V9_0,
    V10_0,
    V11_0,
    V12_0,
}

impl CsVersion {
    /// All versions the catalog knows, in bucket order.
    pub const ALL: [CsVersion; 8] = [
        CsVersion::V7_1,
        CsVersion::V7_2,
        CsVersion::V7_3,
        CsVersion::V8_0,
        CsVersion::V9_0,
        CsVersion::V10_0,
        CsVersion::V11_0,
        CsVersion::V12_0,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CsVersion::V7_1 => "7.1",
            CsVersion::V7_2 => "7.2",
            CsVersion::V7_3 => "7.3",
            CsVersion::V8_0 => "8.0",
            CsVersion::V9_0 => "9.0",
            CsVersion::V10_0 => "10.0",
            CsVersion::V11_0 => "11.0",
            CsVersion::V12_0 => "12.0",
        }
    }
}

impl fmt::Display for CsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for CsVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Counter names, shared between the catalog table and the detectors so the
/// two cannot drift apart silently.
pub mod counters {
    // 7.1
    pub const ASYNC_MAIN: &str = "async Main";
    pub const DEFAULT_EXPRESSIONS: &str = "default expressions";
    pub const INFERRED_TUPLE_NAMES: &str = "inferred tuple element names";
    pub const PATTERN_MATCHING_GENERICS: &str = "pattern matching with generics";

    // 7.2
    pub const PRIVATE_PROTECTED: &str = "private protected";
    pub const NON_TRAILING_NAMED_ARGUMENTS: &str = "non-trailing named arguments";
    pub const DIGIT_SEPARATORS: &str = "digit separators after 0b or 0x";
    pub const CONDITIONAL_REF: &str = "conditional ref expressions";
    pub const IN_PARAMETERS: &str = "in parameters";
    pub const IN_ARGUMENTS: &str = "in arguments";
    pub const REF_STRUCT: &str = "ref struct";
    pub const READONLY_STRUCT: &str = "readonly struct";
    pub const IN_MODIFIER: &str = "in";
    pub const SPAN_TYPES: &str = "Span<T> and ReadOnlySpan<T>";
    pub const REF_MODIFIER: &str = "ref";
    pub const TUPLE_EQUALITY_72: &str = "tuple equality";

    // 7.3
    pub const UNMANAGED_CONSTRAINT: &str = "unmanaged type constraint";
    pub const TUPLE_EQUALITY: &str = "tuple == and != support";
    pub const FIELD_TARGETED_ATTRIBUTES: &str = "field-targeted attributes on auto-properties";
    pub const STACKALLOC_INITIALIZERS: &str = "stackalloc array initializers";
    pub const EXPANDED_FIXED_BUFFERS: &str = "expanded fixed-size buffer types";
    pub const EXPRESSION_VARIABLES_IN_INITIALIZERS: &str = "expression variables in initializers";

    // 8.0
    pub const READONLY_PROPERTIES: &str = "readonly properties";
    pub const READONLY_METHODS: &str = "readonly methods";
    pub const INDEX_TYPE: &str = "Index type";
    pub const RANGE_TYPE: &str = "Range type";
    pub const STATIC_LOCAL_FUNCTIONS: &str = "static local functions";
    pub const STACKALLOC_NESTED: &str = "stackalloc in nested contexts";
    pub const ALT_VERBATIM_STRINGS: &str = "alternative interpolated verbatim strings";
    pub const RANGE_EXPRESSIONS: &str = "range expressions";
    pub const ENHANCED_USING: &str = "enhanced using";
    pub const RECURSIVE_PATTERNS: &str = "recursive pattern matching";
    pub const DEFAULT_INTERFACE_METHODS: &str = "default interface methods";

    // 9.0
    pub const TARGET_TYPED_NEW: &str = "target-typed new expressions";
    pub const SKIP_LOCALS_INIT: &str = "SkipLocalsInit attribute";
    pub const LAMBDA_DISCARDS: &str = "lambda discard parameters";
    pub const NATIVE_INTEGERS: &str = "native-sized integers";
    pub const LOCAL_FUNCTION_ATTRIBUTES: &str = "attributes on local functions";
    pub const FUNCTION_POINTERS: &str = "function pointers";
    pub const STATIC_LAMBDAS: &str = "static lambdas";
    pub const RECORDS: &str = "records";
    pub const TARGET_TYPED_CONDITIONALS: &str = "target-typed conditional expressions";
    pub const COVARIANT_RETURNS: &str = "covariant returns";
    pub const EXTENSION_GET_ENUMERATOR: &str = "extension GetEnumerator in foreach";
    pub const MODULE_INITIALIZERS: &str = "module initializers";
    pub const TOP_LEVEL_STATEMENTS: &str = "top-level statements";

    // 10.0
    pub const RECORD_STRUCTS: &str = "record struct declarations";
    pub const GLOBAL_USINGS: &str = "global using directives";
    pub const CONSTANT_INTERPOLATED_STRINGS: &str = "constant interpolated strings";
    pub const SEALED_TOSTRING_RECORDS: &str = "records with sealed ToString override";
    pub const MIXED_DECONSTRUCTION: &str = "mixed declarations in deconstruction";
    pub const ASYNC_METHOD_BUILDER: &str = "AsyncMethodBuilder attribute on methods";
    pub const STATIC_ABSTRACT_INTERFACE_MEMBERS: &str = "static abstract interface members";
    pub const LAMBDA_IMPROVEMENTS: &str = "lambda improvements";
    pub const FILE_SCOPED_NAMESPACES: &str = "file-scoped namespaces";
    pub const PARAMETERLESS_STRUCT_CTORS: &str = "parameterless struct constructors";
    pub const CALLER_EXPRESSION_ATTRIBUTE: &str = "CallerArgumentExpression attribute";

    // 11.0
    pub const FILE_LOCAL_TYPES: &str = "file-local types";
    pub const REQUIRED_MEMBERS: &str = "required members";
    pub const UNSIGNED_RIGHT_SHIFT: &str = "unsigned right shift";
    pub const UTF8_STRING_LITERALS: &str = "UTF-8 string literals";
    pub const SPAN_PATTERN_MATCHING: &str = "pattern matching on ReadOnlySpan<char>";
    pub const CHECKED_OPERATORS: &str = "checked operators";
    pub const AUTO_DEFAULT_STRUCTS: &str = "auto-default structs";
    pub const LIST_PATTERNS: &str = "list patterns";
    pub const RAW_STRING_LITERALS: &str = "raw string literals";
    pub const NAMEOF_IN_ATTRIBUTES: &str = "nameof in attributes";
    pub const GENERIC_ATTRIBUTES: &str = "generic attributes";

    // 12.0
    pub const REF_READONLY_PARAMETERS: &str = "ref readonly parameters";
    pub const COLLECTION_EXPRESSIONS: &str = "collection expressions";
    pub const INLINE_ARRAYS: &str = "inline arrays";
    pub const NAMEOF_INSTANCE_MEMBERS: &str = "nameof with instance members";
    pub const USING_ALIASES: &str = "using alias directives";
    pub const PRIMARY_CONSTRUCTORS: &str = "primary constructors";
    pub const LAMBDA_OPTIONAL_PARAMETERS: &str = "lambda optional parameters";
}

use counters::*;

/// The full catalog: one entry per version bucket, counters in report order.
///
/// `REF_MODIFIER` and `TUPLE_EQUALITY_72` are declared but fed by no rule;
/// they are part of the published report schema and stay at zero.
pub static CATALOG: &[(CsVersion, &[&str])] = &[
    (
        CsVersion::V7_1,
        &[
            ASYNC_MAIN,
            DEFAULT_EXPRESSIONS,
            INFERRED_TUPLE_NAMES,
            PATTERN_MATCHING_GENERICS,
        ],
    ),
    (
        CsVersion::V7_2,
        &[
            PRIVATE_PROTECTED,
            NON_TRAILING_NAMED_ARGUMENTS,
            DIGIT_SEPARATORS,
            CONDITIONAL_REF,
            IN_PARAMETERS,
            IN_ARGUMENTS,
            REF_STRUCT,
            READONLY_STRUCT,
            IN_MODIFIER,
            SPAN_TYPES,
            REF_MODIFIER,
            TUPLE_EQUALITY_72,
        ],
    ),
    (
        CsVersion::V7_3,
        &[
            UNMANAGED_CONSTRAINT,
            TUPLE_EQUALITY,
            FIELD_TARGETED_ATTRIBUTES,
            STACKALLOC_INITIALIZERS,
            EXPANDED_FIXED_BUFFERS,
            EXPRESSION_VARIABLES_IN_INITIALIZERS,
        ],
    ),
    (
        CsVersion::V8_0,
        &[
            READONLY_PROPERTIES,
            READONLY_METHODS,
            INDEX_TYPE,
            RANGE_TYPE,
            STATIC_LOCAL_FUNCTIONS,
            STACKALLOC_NESTED,
            ALT_VERBATIM_STRINGS,
            RANGE_EXPRESSIONS,
            ENHANCED_USING,
            RECURSIVE_PATTERNS,
            DEFAULT_INTERFACE_METHODS,
        ],
    ),
    (
        CsVersion::V9_0,
        &[
            TARGET_TYPED_NEW,
            SKIP_LOCALS_INIT,
            LAMBDA_DISCARDS,
            NATIVE_INTEGERS,
            LOCAL_FUNCTION_ATTRIBUTES,
            FUNCTION_POINTERS,
            STATIC_LAMBDAS,
            RECORDS,
            TARGET_TYPED_CONDITIONALS,
            COVARIANT_RETURNS,
            EXTENSION_GET_ENUMERATOR,
            MODULE_INITIALIZERS,
            TOP_LEVEL_STATEMENTS,
        ],
    ),
    (
        CsVersion::V10_0,
        &[
            RECORD_STRUCTS,
            GLOBAL_USINGS,
            CONSTANT_INTERPOLATED_STRINGS,
            SEALED_TOSTRING_RECORDS,
            MIXED_DECONSTRUCTION,
            ASYNC_METHOD_BUILDER,
            STATIC_ABSTRACT_INTERFACE_MEMBERS,
            LAMBDA_IMPROVEMENTS,
            FILE_SCOPED_NAMESPACES,
            PARAMETERLESS_STRUCT_CTORS,
            CALLER_EXPRESSION_ATTRIBUTE,
        ],
    ),
    (
        CsVersion::V11_0,
        &[
            FILE_LOCAL_TYPES,
            REQUIRED_MEMBERS,
            UNSIGNED_RIGHT_SHIFT,
            UTF8_STRING_LITERALS,
            SPAN_PATTERN_MATCHING,
            CHECKED_OPERATORS,
            AUTO_DEFAULT_STRUCTS,
            LIST_PATTERNS,
            RAW_STRING_LITERALS,
            NAMEOF_IN_ATTRIBUTES,
            GENERIC_ATTRIBUTES,
        ],
    ),
    (
        CsVersion::V12_0,
        &[
            REF_READONLY_PARAMETERS,
            COLLECTION_EXPRESSIONS,
            INLINE_ARRAYS,
            NAMEOF_INSTANCE_MEMBERS,
            USING_ALIASES,
            PRIMARY_CONSTRUCTORS,
            LAMBDA_OPTIONAL_PARAMETERS,
        ],
    ),
];

/// Raised when a rule feeds a bucket or counter the catalog does not
/// declare. This signals a registration defect, not an input problem, and
/// is fatal to the file being analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("counter {name:?} is not registered under version {version}")]
pub struct DriftError {
    pub version: CsVersion,
    pub name: String,
}

/// A named, non-negative count scoped to one version bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCounter {
    pub name: &'static str,
    pub count: u64,
}

/// One version's counters within a [`CommitResult`]. The counter set is
/// fixed at construction; only counts mutate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBucket {
    pub version: CsVersion,
    counters: Vec<FeatureCounter>,
}

impl VersionBucket {
    pub fn counters(&self) -> &[FeatureCounter] {
        &self.counters
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        self.counters.iter().find(|c| c.name == name).map(|c| c.count)
    }

    pub fn total(&self) -> u64 {
        self.counters.iter().map(|c| c.count).sum()
    }
}

impl Serialize for VersionBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Counts<'a>(&'a [FeatureCounter]);

        impl Serialize for Counts<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for c in self.0 {
                    map.serialize_entry(c.name, &c.count)?;
                }
                map.end()
            }
        }

        let mut s = serializer.serialize_struct("VersionBucket", 2)?;
        s.serialize_field("version", &self.version)?;
        s.serialize_field("counts", &Counts(&self.counters))?;
        s.end()
    }
}

/// One sampled commit's feature histogram: a date label plus every catalog
/// bucket, in catalog order, even when all counts are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitResult {
    pub date: String,
    pub versions: Vec<VersionBucket>,
}

impl CommitResult {
    /// Increment one counter. The `(version, name)` binding must exist in
    /// the catalog; anything else is drift between a rule and the catalog.
    pub fn bump(&mut self, version: CsVersion, name: &'static str) -> Result<(), DriftError> {
        let bucket = self
            .versions
            .iter_mut()
            .find(|b| b.version == version)
            .ok_or_else(|| DriftError {
                version,
                name: name.to_string(),
            })?;
        let counter = bucket
            .counters
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| DriftError {
                version,
                name: name.to_string(),
            })?;
        counter.count += 1;
        Ok(())
    }

    pub fn bucket(&self, version: CsVersion) -> Option<&VersionBucket> {
        self.versions.iter().find(|b| b.version == version)
    }

    /// Count for one counter, if declared.
    pub fn count(&self, version: CsVersion, name: &str) -> Option<u64> {
        self.bucket(version).and_then(|b| b.count(name))
    }

    /// Sum of every counter across all buckets.
    pub fn total(&self) -> u64 {
        self.versions.iter().map(|b| b.total()).sum()
    }
}

/// Seed a catalog-shaped result for a newly sampled commit: every bucket
/// present, every counter at zero, in catalog order.
pub fn new_result(date: &str) -> CommitResult {
    CommitResult {
        date: date.to_string(),
        versions: CATALOG
            .iter()
            .map(|(version, names)| VersionBucket {
                version: *version,
                counters: names
                    .iter()
                    .map(|name| FeatureCounter { name, count: 0 })
                    .collect(),
            })
            .collect(),
    }
}
