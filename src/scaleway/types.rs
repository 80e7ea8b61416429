//! Locality newtypes and locality-qualified identifiers.
//!
//! Zonal resources (flexible IPs) are addressed as `fr-par-1/<id>`, regional
//! ones (Kapsule pools) as `fr-par/<id>`. A bare id is accepted wherever a
//! default locality is available.

use std::fmt;
use std::ops::Deref;

use thiserror::Error;

macro_rules! newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, Hash, PartialEq)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw value, trimming surrounding whitespace.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into().trim().to_owned())
            }

            /// Borrows the raw value.
            #[must_use]
            pub const fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

newtype!(
    /// Availability zone such as `fr-par-1`.
    Zone
);
newtype!(
    /// Region such as `fr-par`.
    Region
);

impl Zone {
    /// Region containing this zone (`fr-par-1` → `fr-par`).
    #[must_use]
    pub fn region(&self) -> Region {
        match self.as_str().rsplit_once('-') {
            Some((region, index)) if index.chars().all(|ch| ch.is_ascii_digit()) => {
                Region::new(region)
            }
            _ => Region::new(self.as_str()),
        }
    }
}

/// Errors raised when parsing locality-qualified identifiers.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LocalityError {
    /// Raised when the identifier is blank.
    #[error("identifier must not be empty")]
    Empty,
    /// Raised when either side of `locality/id` is blank.
    #[error("malformed identifier '{0}': expected <locality>/<id>")]
    Malformed(String),
}

fn split_locality(raw: &str) -> Result<(Option<&str>, &str), LocalityError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LocalityError::Empty);
    }
    match trimmed.split_once('/') {
        None => Ok((None, trimmed)),
        Some((locality, id))
            if !locality.is_empty() && !id.is_empty() && !id.contains('/') =>
        {
            Ok((Some(locality), id))
        }
        Some(_) => Err(LocalityError::Malformed(trimmed.to_owned())),
    }
}

/// Strips an optional locality prefix, returning the bare identifier.
///
/// # Errors
///
/// Returns [`LocalityError`] when the value is blank or malformed.
pub fn expand_id(raw: &str) -> Result<&str, LocalityError> {
    split_locality(raw).map(|(_, id)| id)
}

/// Identifier of a zonal resource.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ZonedId {
    /// Zone hosting the resource.
    pub zone: Zone,
    /// Bare resource identifier.
    pub id: String,
}

impl ZonedId {
    /// Builds an identifier from its parts.
    #[must_use]
    pub fn new(zone: Zone, id: impl Into<String>) -> Self {
        Self {
            zone,
            id: id.into(),
        }
    }

    /// Parses `zone/id`, or a bare `id` placed in `default_zone`.
    ///
    /// # Errors
    ///
    /// Returns [`LocalityError`] when the value is blank or malformed.
    pub fn parse(raw: &str, default_zone: &Zone) -> Result<Self, LocalityError> {
        let (zone, id) = split_locality(raw)?;
        Ok(Self::new(
            zone.map_or_else(|| default_zone.clone(), Zone::from),
            id,
        ))
    }
}

impl fmt::Display for ZonedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zone, self.id)
    }
}

/// Identifier of a regional resource.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RegionalId {
    /// Region hosting the resource.
    pub region: Region,
    /// Bare resource identifier.
    pub id: String,
}

impl RegionalId {
    /// Builds an identifier from its parts.
    #[must_use]
    pub fn new(region: Region, id: impl Into<String>) -> Self {
        Self {
            region,
            id: id.into(),
        }
    }

    /// Parses `region/id`, or a bare `id` placed in `default_region`.
    ///
    /// # Errors
    ///
    /// Returns [`LocalityError`] when the value is blank or malformed.
    pub fn parse(raw: &str, default_region: &Region) -> Result<Self, LocalityError> {
        let (region, id) = split_locality(raw)?;
        Ok(Self::new(
            region.map_or_else(|| default_region.clone(), Region::from),
            id,
        ))
    }
}

impl fmt::Display for RegionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("fr-par-1", "fr-par")]
    #[case("nl-ams-2", "nl-ams")]
    #[case("pl-waw-3", "pl-waw")]
    #[case("custom", "custom")]
    fn zone_maps_to_region(#[case] zone: &str, #[case] region: &str) {
        assert_eq!(Zone::from(zone).region(), Region::from(region));
    }

    #[rstest]
    fn zoned_id_parses_qualified_value() {
        let id = ZonedId::parse("nl-ams-1/abc", &Zone::from("fr-par-1")).expect("parse");
        assert_eq!(id.zone.as_str(), "nl-ams-1");
        assert_eq!(id.id, "abc");
        assert_eq!(id.to_string(), "nl-ams-1/abc");
    }

    #[rstest]
    fn zoned_id_falls_back_to_default_zone() {
        let id = ZonedId::parse(" abc ", &Zone::from("fr-par-1")).expect("parse");
        assert_eq!(id.to_string(), "fr-par-1/abc");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_identifiers_are_rejected(#[case] raw: &str) {
        assert_eq!(
            RegionalId::parse(raw, &Region::from("fr-par")),
            Err(LocalityError::Empty)
        );
    }

    #[rstest]
    #[case("/abc")]
    #[case("fr-par/")]
    #[case("fr-par/a/b")]
    fn malformed_identifiers_are_rejected(#[case] raw: &str) {
        let err = RegionalId::parse(raw, &Region::from("fr-par")).expect_err("malformed");
        assert!(matches!(err, LocalityError::Malformed(_)), "got {err:?}");
    }

    #[rstest]
    fn expand_id_strips_locality() {
        assert_eq!(expand_id("fr-par-1/abc"), Ok("abc"));
        assert_eq!(expand_id("abc"), Ok("abc"));
    }
}
