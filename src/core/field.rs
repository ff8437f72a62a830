//! Purpose: Map record fields between their native types and raw string values.
//! Exports: `Record`, `Scalar`, `Variants`, `Field`, `Schema`, `FieldKind`, `ScalarKind`,
//! `Coercion`, `CoercionReason`, `Assign`.
//! Role: Explicit field-descriptor tables stand in for runtime type inspection.
//! Invariants: A failed coercion never touches the field; the prior value survives.
//! Invariants: Field names match case-insensitively (ASCII); encoded keys are lowercased.
//! Invariants: Read-only fields are skipped on decode and still emitted on encode.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

use crate::core::codec;
use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarKind {
    Str,
    Int,
    Enum,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    List(ScalarKind),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoercionReason {
    InvalidInteger,
    UnknownVariant,
    UnbracketedList,
}

impl CoercionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CoercionReason::InvalidInteger => "invalid_integer",
            CoercionReason::UnknownVariant => "unknown_variant",
            CoercionReason::UnbracketedList => "unbracketed_list",
        }
    }
}

/// A raw value that could not be converted to the field's declared type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Coercion {
    pub reason: CoercionReason,
    pub raw: String,
}

impl Coercion {
    pub fn new(reason: CoercionReason, raw: impl Into<String>) -> Self {
        Self {
            reason,
            raw: raw.into(),
        }
    }
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            CoercionReason::InvalidInteger => write!(f, "invalid integer {:?}", self.raw),
            CoercionReason::UnknownVariant => write!(f, "unknown variant {:?}", self.raw),
            CoercionReason::UnbracketedList => {
                write!(f, "list value {:?} is not wrapped in [ ]", self.raw)
            }
        }
    }
}

impl StdError for Coercion {}

/// A single value type a field (or list element) may hold.
pub trait Scalar: Clone + PartialEq + 'static {
    const KIND: ScalarKind;

    fn decode(raw: &str) -> Result<Self, Coercion>;

    fn encode(&self) -> String;

    /// Native equality against a caller-supplied key; keys of another type never match.
    fn matches_key(&self, key: &dyn Any) -> bool {
        key.downcast_ref::<Self>() == Some(self)
    }
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::Str;

    fn decode(raw: &str) -> Result<Self, Coercion> {
        Ok(raw.to_owned())
    }

    fn encode(&self) -> String {
        self.clone()
    }

    fn matches_key(&self, key: &dyn Any) -> bool {
        let key = key
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| key.downcast_ref::<&str>().copied());
        key == Some(self.as_str())
    }
}

macro_rules! integer_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const KIND: ScalarKind = ScalarKind::Int;

                fn decode(raw: &str) -> Result<Self, Coercion> {
                    raw.parse()
                        .map_err(|_| Coercion::new(CoercionReason::InvalidInteger, raw))
                }

                fn encode(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Declared variant names for an enum field, matched case-insensitively on decode.
pub trait Variants: Copy + PartialEq + 'static {
    const VARIANTS: &'static [(&'static str, Self)];
}

impl<T: Variants> Scalar for T {
    const KIND: ScalarKind = ScalarKind::Enum;

    fn decode(raw: &str) -> Result<Self, Coercion> {
        T::VARIANTS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(raw))
            .map(|(_, value)| *value)
            .ok_or_else(|| Coercion::new(CoercionReason::UnknownVariant, raw))
    }

    fn encode(&self) -> String {
        T::VARIANTS
            .iter()
            .find(|(_, value)| value == self)
            .map(|(name, _)| (*name).to_owned())
            .unwrap_or_default()
    }
}

type DecodeFn<R> = Box<dyn Fn(&mut R, &str) -> Result<(), Coercion>>;
type EncodeFn<R> = Box<dyn Fn(&R) -> Option<String>>;
type MatchFn<R> = Box<dyn Fn(&R, &dyn Any) -> bool>;
type ParseKeyFn = Box<dyn Fn(&str) -> Result<Box<dyn Any>, Coercion>>;

/// Static metadata and accessors for one field of a record type.
pub struct Field<R> {
    name: &'static str,
    kind: FieldKind,
    read_only: bool,
    decode: DecodeFn<R>,
    encode: EncodeFn<R>,
    matches: MatchFn<R>,
    parse_key: ParseKeyFn,
}

impl<R: 'static> Field<R> {
    /// A single-valued field. `get` returns `None` when the value is absent.
    pub fn scalar<T: Scalar>(
        name: &'static str,
        get: fn(&R) -> Option<&T>,
        set: fn(&mut R, T),
    ) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar(T::KIND),
            read_only: false,
            decode: Box::new(move |record: &mut R, raw: &str| {
                set(record, T::decode(raw)?);
                Ok(())
            }),
            encode: Box::new(move |record: &R| get(record).map(T::encode)),
            matches: Box::new(move |record: &R, key: &dyn Any| {
                get(record).is_some_and(|value| value.matches_key(key))
            }),
            parse_key: Box::new(|raw: &str| {
                T::decode(raw).map(|value| Box::new(value) as Box<dyn Any>)
            }),
        }
    }

    /// A list field written as `[e1, e2, ...]`. The list is replaced only if every element decodes.
    pub fn list<T: Scalar>(
        name: &'static str,
        get: fn(&R) -> Option<&Vec<T>>,
        set: fn(&mut R, Vec<T>),
    ) -> Self {
        Self {
            name,
            kind: FieldKind::List(T::KIND),
            read_only: false,
            decode: Box::new(move |record: &mut R, raw: &str| {
                set(record, decode_list(raw)?);
                Ok(())
            }),
            encode: Box::new(move |record: &R| {
                get(record).map(|values| codec::join_list(values.iter().map(T::encode)))
            }),
            matches: Box::new(move |record: &R, key: &dyn Any| {
                get(record).is_some_and(|values| key.downcast_ref::<Vec<T>>() == Some(values))
            }),
            parse_key: Box::new(|raw: &str| {
                decode_list::<T>(raw).map(|values| Box::new(values) as Box<dyn Any>)
            }),
        }
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

impl<R> Field<R> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn decode(&self, record: &mut R, raw: &str) -> Result<(), Coercion> {
        (self.decode)(record, raw)
    }

    pub fn encode(&self, record: &R) -> Option<String> {
        (self.encode)(record)
    }

    pub fn matches(&self, record: &R, key: &dyn Any) -> bool {
        (self.matches)(record, key)
    }

    pub fn parse_key(&self, raw: &str) -> Result<Box<dyn Any>, Coercion> {
        (self.parse_key)(raw)
    }
}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

fn decode_list<T: Scalar>(raw: &str) -> Result<Vec<T>, Coercion> {
    let items = codec::split_list(raw)
        .ok_or_else(|| Coercion::new(CoercionReason::UnbracketedList, raw))?;
    items.into_iter().map(T::decode).collect()
}

/// A record type: empty-constructible and described by a field table in declaration order.
pub trait Record: Default + 'static {
    fn fields() -> Vec<Field<Self>>;
}

/// Outcome of applying one `key: value` line to a record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Assign {
    Set,
    Ignored,
    Failed(Coercion),
}

/// The cached field table for one record type.
#[derive(Debug)]
pub struct Schema<R> {
    fields: Vec<Field<R>>,
}

impl<R: Record> Schema<R> {
    pub fn new() -> Self {
        Self { fields: R::fields() }
    }

    pub fn fields(&self) -> &[Field<R>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field<R>> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Like `field`, but a missing name is a caller error.
    pub fn key_field(&self, name: &str) -> Result<&Field<R>, Error> {
        self.field(name).ok_or_else(|| {
            Error::new(ErrorKind::UnknownField)
                .with_message(format!("field '{name}' not found"))
                .with_field(name)
                .with_hint(format!("Known fields: {}.", self.field_names().join(", ")))
        })
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }

    pub fn assign(&self, record: &mut R, key: &str, raw: &str) -> Assign {
        match self.field(key) {
            Some(field) if !field.read_only => match field.decode(record, raw) {
                Ok(()) => Assign::Set,
                Err(coercion) => Assign::Failed(coercion),
            },
            _ => Assign::Ignored,
        }
    }

    /// Present fields as lowercased `(key, value)` pairs in declaration order.
    pub fn encode(&self, record: &R) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|field| {
                field
                    .encode(record)
                    .map(|value| (field.name.to_lowercase(), value))
            })
            .collect()
    }

    /// Decode a raw lookup key into the named field's native type.
    pub fn parse_key(&self, name: &str, raw: &str) -> Result<Box<dyn Any>, Error> {
        let field = self.key_field(name)?;
        field.parse_key(raw).map_err(|coercion| {
            Error::new(ErrorKind::Coercion)
                .with_message(coercion.to_string())
                .with_field(field.name)
                .with_source(coercion)
        })
    }
}

impl<R: Record> Default for Schema<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Assign, Coercion, CoercionReason, Field, FieldKind, Record, Scalar, ScalarKind, Schema,
        Variants,
    };
    use crate::core::error::ErrorKind;

    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    enum Level {
        Low,
        High,
    }

    impl Variants for Level {
        const VARIANTS: &'static [(&'static str, Self)] =
            &[("Low", Level::Low), ("High", Level::High)];
    }

    #[derive(Debug, Default, PartialEq)]
    struct Probe {
        label: Option<String>,
        count: i32,
        level: Option<Level>,
        levels: Option<Vec<Level>>,
        sizes: Option<Vec<u8>>,
        id: u32,
    }

    impl Record for Probe {
        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::scalar("Label", |p: &Probe| p.label.as_ref(), |p, v| p.label = Some(v)),
                Field::scalar("Count", |p: &Probe| Some(&p.count), |p, v| p.count = v),
                Field::scalar("Level", |p: &Probe| p.level.as_ref(), |p, v| p.level = Some(v)),
                Field::list("Levels", |p: &Probe| p.levels.as_ref(), |p, v| p.levels = Some(v)),
                Field::list("Sizes", |p: &Probe| p.sizes.as_ref(), |p, v| p.sizes = Some(v)),
                Field::scalar("Id", |p: &Probe| Some(&p.id), |p, v| p.id = v).read_only(),
            ]
        }
    }

    #[test]
    fn kinds_follow_declared_types() {
        let schema = Schema::<Probe>::new();
        let kinds = schema
            .fields()
            .iter()
            .map(|field| field.kind())
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                FieldKind::Scalar(ScalarKind::Str),
                FieldKind::Scalar(ScalarKind::Int),
                FieldKind::Scalar(ScalarKind::Enum),
                FieldKind::List(ScalarKind::Enum),
                FieldKind::List(ScalarKind::Int),
                FieldKind::Scalar(ScalarKind::Int),
            ]
        );
    }

    #[test]
    fn strings_are_verbatim() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe::default();
        assert_eq!(schema.assign(&mut probe, "label", r"a\nb: c"), Assign::Set);
        assert_eq!(probe.label.as_deref(), Some(r"a\nb: c"));
    }

    #[test]
    fn keys_match_case_insensitively() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe::default();
        assert_eq!(schema.assign(&mut probe, "COUNT", "7"), Assign::Set);
        assert_eq!(probe.count, 7);
    }

    #[test]
    fn bad_integer_keeps_prior_value() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe {
            count: 3,
            ..Probe::default()
        };
        assert_eq!(
            schema.assign(&mut probe, "count", "abc"),
            Assign::Failed(Coercion::new(CoercionReason::InvalidInteger, "abc"))
        );
        assert_eq!(probe.count, 3);
    }

    #[test]
    fn integer_parse_is_strict() {
        assert!(i32::decode("12").is_ok());
        assert!(i32::decode("1.5").is_err());
        assert!(i32::decode("1_000").is_err());
        assert!(u8::decode("256").is_err());
        assert!(u8::decode("-1").is_err());
    }

    #[test]
    fn enums_match_case_insensitively() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe::default();
        assert_eq!(schema.assign(&mut probe, "level", "hIgH"), Assign::Set);
        assert_eq!(probe.level, Some(Level::High));
        assert_eq!(Level::High.encode(), "High");
    }

    #[test]
    fn unknown_variant_is_reported() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe::default();
        let outcome = schema.assign(&mut probe, "level", "medium");
        assert_eq!(
            outcome,
            Assign::Failed(Coercion::new(CoercionReason::UnknownVariant, "medium"))
        );
        assert_eq!(probe.level, None);
    }

    #[test]
    fn list_decodes_in_order_and_reencodes() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe::default();
        assert_eq!(schema.assign(&mut probe, "sizes", "[1, 2, 3]"), Assign::Set);
        assert_eq!(probe.sizes, Some(vec![1, 2, 3]));
        assert_eq!(
            schema.encode(&probe),
            vec![
                ("count".to_string(), "0".to_string()),
                ("sizes".to_string(), "[1, 2, 3]".to_string()),
                ("id".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn enum_list_elements_match_case_insensitively() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe::default();
        assert_eq!(schema.assign(&mut probe, "levels", "[low, HIGH]"), Assign::Set);
        assert_eq!(probe.levels, Some(vec![Level::Low, Level::High]));
    }

    #[test]
    fn one_bad_element_leaves_list_unchanged() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe {
            sizes: Some(vec![9]),
            ..Probe::default()
        };
        let outcome = schema.assign(&mut probe, "sizes", "[1, x, 3]");
        assert_eq!(
            outcome,
            Assign::Failed(Coercion::new(CoercionReason::InvalidInteger, "x"))
        );
        assert_eq!(probe.sizes, Some(vec![9]));
    }

    #[test]
    fn unbracketed_list_is_rejected() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe::default();
        let outcome = schema.assign(&mut probe, "sizes", "1, 2");
        assert!(matches!(
            outcome,
            Assign::Failed(Coercion {
                reason: CoercionReason::UnbracketedList,
                ..
            })
        ));
        assert_eq!(probe.sizes, None);
    }

    #[test]
    fn empty_list_round_trips() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe::default();
        assert_eq!(schema.assign(&mut probe, "sizes", "[]"), Assign::Set);
        assert_eq!(probe.sizes, Some(vec![]));
        let encoded = schema.encode(&probe);
        assert!(encoded.contains(&("sizes".to_string(), "[]".to_string())));
    }

    #[test]
    fn unknown_and_read_only_keys_are_ignored() {
        let schema = Schema::<Probe>::new();
        let mut probe = Probe::default();
        assert_eq!(schema.assign(&mut probe, "nickname", "x"), Assign::Ignored);
        assert_eq!(schema.assign(&mut probe, "id", "42"), Assign::Ignored);
        assert_eq!(probe, Probe::default());
    }

    #[test]
    fn absent_values_are_omitted() {
        let schema = Schema::<Probe>::new();
        let probe = Probe {
            label: Some("x".to_string()),
            ..Probe::default()
        };
        let keys = schema
            .encode(&probe)
            .into_iter()
            .map(|(key, _)| key)
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["label", "count", "id"]);
    }

    #[test]
    fn key_matching_uses_native_equality() {
        let schema = Schema::<Probe>::new();
        let probe = Probe {
            label: Some("Alice".to_string()),
            count: 5,
            sizes: Some(vec![1, 2]),
            ..Probe::default()
        };
        let label = schema.field("label").expect("label");
        assert!(label.matches(&probe, &"Alice".to_string()));
        assert!(label.matches(&probe, &"Alice"));
        assert!(!label.matches(&probe, &"alice"));

        let count = schema.field("count").expect("count");
        assert!(count.matches(&probe, &5i32));
        assert!(!count.matches(&probe, &5i64));

        let sizes = schema.field("sizes").expect("sizes");
        assert!(sizes.matches(&probe, &vec![1u8, 2]));

        let level = schema.field("level").expect("level");
        assert!(!level.matches(&probe, &Level::Low));
    }

    #[test]
    fn parse_key_decodes_native_type() {
        let schema = Schema::<Probe>::new();
        let key = schema.parse_key("count", "5").expect("parse key");
        assert_eq!(key.downcast_ref::<i32>(), Some(&5));

        let err = schema.parse_key("count", "five").expect_err("bad key");
        assert_eq!(err.kind(), ErrorKind::Coercion);

        let err = schema.parse_key("missing", "5").expect_err("unknown field");
        assert_eq!(err.kind(), ErrorKind::UnknownField);
    }
}
