//! Serde helpers for [`SnowflakeId`].
//!
//! With the `serde` feature, [`SnowflakeId`] itself serializes as its raw
//! `u64`. Some consumers (JavaScript, for one) cannot hold 64-bit integers
//! exactly; use [`as_decimal`] with `#[serde(with = ...)]` to exchange the
//! decimal string form instead.
//!
//! [`SnowflakeId`]: crate::SnowflakeId

/// (De)serializes a [`SnowflakeId`] as a decimal string.
///
/// ```
/// use nodeflake::SnowflakeId;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Event {
///     #[serde(with = "nodeflake::serde::as_decimal")]
///     id: SnowflakeId,
/// }
///
/// let event = Event { id: SnowflakeId::from_value(6_823_236_456_859_828_225) };
/// let json = serde_json::to_string(&event).unwrap();
/// assert_eq!(json, r#"{"id":"6823236456859828225"}"#);
///
/// let back: Event = serde_json::from_str(&json).unwrap();
/// assert_eq!(back.id, event.id);
/// ```
///
/// [`SnowflakeId`]: crate::SnowflakeId
pub mod as_decimal {
    use core::fmt;

    use ::serde::{
        Deserializer, Serializer,
        de::{self, Visitor},
    };

    use crate::SnowflakeId;

    /// Serialize an ID as its decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(id)
    }

    /// Deserialize an ID from its decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the string is
    /// not a decimal `u64`.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_str(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl Visitor<'_> for DecimalVisitor {
        type Value = SnowflakeId;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal snowflake ID")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            v.parse().map_err(E::custom)
        }
    }
}
