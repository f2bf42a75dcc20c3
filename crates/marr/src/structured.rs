//! Structured encoding through serde.
//!
//! A [`MultiArray`] serializes as a struct with three fields:
//!
//! ```text
//! { "version": 1, "count": 3, "values": [10, 20, 30] }
//! ```
//!
//! `values` holds each element's own serde encoding, so the format is as
//! portable as the element type's. Decoding accepts the fields in any order
//! in self-describing formats, defaults a missing `version` to 1 and checks
//! `count` against the number of values.

use std::fmt;
use std::marker::PhantomData;

use marr_generic::Generic;
use marr_layout::ArrayData;
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::MultiArray;

/// Current structured encoding version.
const ENCODING_VERSION: u64 = 1;

const FIELDS: &[&str] = &["version", "count", "values"];

/// Upper bound on up-front `Vec` reservation driven by an untrusted count.
const MAX_PREALLOC: usize = 4096;

struct Values<'a, E: Generic>(&'a MultiArray<E>)
where
    E::Rep: ArrayData;

impl<E> Serialize for Values<'_, E>
where
    E: Generic + Serialize,
    E::Rep: ArrayData,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<E> Serialize for MultiArray<E>
where
    E: Generic + Serialize,
    E::Rep: ArrayData,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MultiArray", FIELDS.len())?;
        state.serialize_field("version", &ENCODING_VERSION)?;
        state.serialize_field("count", &(self.len() as u64))?;
        state.serialize_field("values", &Values(self))?;
        state.end()
    }
}

#[derive(Deserialize)]
#[serde(field_identifier, rename_all = "lowercase")]
enum Field {
    Version,
    Count,
    Values,
    #[serde(other)]
    Unknown,
}

fn not_enough<Error: de::Error>(expected: usize, found: usize) -> Error {
    Error::custom(format_args!(
        "not enough values: expected {expected}, found {found}"
    ))
}

fn too_many<Error: de::Error>(expected: usize) -> Error {
    Error::custom(format_args!(
        "too many values: expected {expected}, found more"
    ))
}

fn check_version<Error: de::Error>(version: u64) -> Result<(), Error> {
    if version == ENCODING_VERSION {
        Ok(())
    } else {
        Err(Error::custom(format_args!(
            "unsupported MultiArray encoding version: {version}"
        )))
    }
}

fn check_count<Error: de::Error>(count: u64) -> Result<usize, Error> {
    usize::try_from(count)
        .map_err(|_| Error::custom(format_args!("count {count} overflows usize")))
}

/// Reads exactly `count` values from a sequence.
struct ExactValues<E> {
    count: usize,
    _marker: PhantomData<fn() -> E>,
}

impl<E> ExactValues<E> {
    fn new(count: usize) -> Self {
        Self {
            count,
            _marker: PhantomData,
        }
    }
}

impl<'de, E: Deserialize<'de>> DeserializeSeed<'de> for ExactValues<E> {
    type Value = Vec<E>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Vec<E>, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, E: Deserialize<'de>> Visitor<'de> for ExactValues<E> {
    type Value = Vec<E>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "a sequence of {} values", self.count)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<E>, A::Error> {
        let mut values = Vec::with_capacity(self.count.min(MAX_PREALLOC));
        while values.len() < self.count {
            match seq.next_element()? {
                Some(value) => values.push(value),
                None => return Err(not_enough(self.count, values.len())),
            }
        }
        // non-self-describing formats cannot skip an element of unknown type
        if seq.next_element::<E>()?.is_some() {
            return Err(too_many(self.count));
        }
        Ok(values)
    }
}

struct MultiArrayVisitor<E>(PhantomData<fn() -> E>);

impl<'de, E> Visitor<'de> for MultiArrayVisitor<E>
where
    E: Generic + Deserialize<'de>,
    E::Rep: ArrayData,
{
    type Value = MultiArray<E>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a MultiArray with version, count and values")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<MultiArray<E>, A::Error> {
        let version: u64 = seq
            .next_element()?
            .ok_or_else(|| <A::Error as de::Error>::invalid_length(0, &self))?;
        check_version::<A::Error>(version)?;
        let count: u64 = seq
            .next_element()?
            .ok_or_else(|| <A::Error as de::Error>::invalid_length(1, &self))?;
        let count = check_count::<A::Error>(count)?;
        let values = seq
            .next_element_seed(ExactValues::new(count))?
            .ok_or_else(|| <A::Error as de::Error>::invalid_length(2, &self))?;
        Ok(MultiArray::from(values))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<MultiArray<E>, A::Error> {
        let mut version: Option<u64> = None;
        let mut count: Option<usize> = None;
        let mut values: Option<Vec<E>> = None;

        while let Some(field) = map.next_key()? {
            match field {
                Field::Version => {
                    if version.is_some() {
                        return Err(de::Error::duplicate_field("version"));
                    }
                    version = Some(map.next_value()?);
                }
                Field::Count => {
                    if count.is_some() {
                        return Err(de::Error::duplicate_field("count"));
                    }
                    count = Some(check_count::<A::Error>(map.next_value()?)?);
                }
                Field::Values => {
                    if values.is_some() {
                        return Err(de::Error::duplicate_field("values"));
                    }
                    values = Some(match count {
                        Some(count) => map.next_value_seed(ExactValues::new(count))?,
                        None => map.next_value()?,
                    });
                }
                Field::Unknown => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        check_version::<A::Error>(version.unwrap_or(ENCODING_VERSION))?;
        let count = count.ok_or_else(|| <A::Error as de::Error>::missing_field("count"))?;
        let values = values.ok_or_else(|| <A::Error as de::Error>::missing_field("values"))?;
        if values.len() < count {
            return Err(not_enough(count, values.len()));
        }
        if values.len() > count {
            return Err(too_many(count));
        }
        Ok(MultiArray::from(values))
    }
}

impl<'de, E> Deserialize<'de> for MultiArray<E>
where
    E: Generic + Deserialize<'de>,
    E::Rep: ArrayData,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_struct("MultiArray", FIELDS, MultiArrayVisitor(PhantomData))
    }
}
