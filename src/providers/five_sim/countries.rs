//! Mapping between 5sim country slugs and ISO countries.

use crate::types::{CountrySlug, DialCode};
use keshvar::{Alpha2, Country, CountryIterator};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

/// Error when mapping a slug.
#[derive(Debug, Clone, Error)]
pub enum CountryMapError {
    #[error("No ISO country for 5sim slug '{slug}'")]
    UnknownSlug { slug: String },
}

/// Slugs are lowercase names with every non-letter removed
/// (`southafrica`, `hongkong`), so compare names the same way.
fn norm(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Overrides: 5sim slug -> ISO alpha-2 code, where the slug is not the
/// normalized ISO short name.
static SLUG_OVERRIDES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("usa", "US"),
        ("england", "GB"),
        ("russia", "RU"),
        ("uae", "AE"),
        ("vietnam", "VN"),
        ("southkorea", "KR"),
        ("czech", "CZ"),
        ("moldova", "MD"),
        ("laos", "LA"),
        ("syria", "SY"),
        ("iran", "IR"),
        ("venezuela", "VE"),
        ("tanzania", "TZ"),
        ("bolivia", "BO"),
        ("bih", "BA"),
        ("ivorycoast", "CI"),
        ("drcongo", "CD"),
        ("taiwan", "TW"),
        ("turkey", "TR"),
        ("capeverde", "CV"),
        ("swaziland", "SZ"),
        ("northmacedonia", "MK"),
        ("macau", "MO"),
        ("hongkong", "HK"),
        ("palestine", "PS"),
        ("reunion", "RE"),
        ("gambia", "GM"),
        ("salvador", "SV"),
        ("papuanewguinea", "PG"),
        ("timorleste", "TL"),
    ])
});

/// Normalized ISO short name -> Alpha2, built from keshvar.
static ISO_NAME2ALPHA2: Lazy<HashMap<String, Alpha2>> = Lazy::new(|| {
    CountryIterator::new()
        .map(|country| (norm(country.iso_short_name()), country.alpha2()))
        .collect()
});

/// Resolve a 5sim slug to an ISO country.
pub fn country_for_slug(slug: &CountrySlug) -> Result<Country, CountryMapError> {
    let key = norm(slug.as_str());

    if let Some(&alpha2) = SLUG_OVERRIDES.get(key.as_str())
        && let Ok(country) = Country::try_from(alpha2)
    {
        return Ok(country);
    }

    ISO_NAME2ALPHA2
        .get(&key)
        .map(|alpha2| alpha2.to_country())
        .ok_or_else(|| CountryMapError::UnknownSlug {
            slug: slug.to_string(),
        })
}

/// Extension trait for slug lookups.
pub trait CountrySlugExt {
    /// ISO country behind the slug.
    fn country(&self) -> Result<Country, CountryMapError>;

    /// Calling code of the slug's country.
    fn dial_code(&self) -> Option<DialCode>;
}

impl CountrySlugExt for CountrySlug {
    fn country(&self) -> Result<Country, CountryMapError> {
        country_for_slug(self)
    }

    fn dial_code(&self) -> Option<DialCode> {
        let country = self.country().ok()?;
        DialCode::new(country.country_code().to_string()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm() {
        assert_eq!(norm("South Africa"), "southafrica");
        assert_eq!(norm("Korea (Republic of)"), "korearepublicof");
        assert_eq!(norm("  Pakistan "), "pakistan");
    }

    #[test]
    fn test_overrides_resolve() {
        for (slug, alpha2) in [
            ("usa", Alpha2::US),
            ("england", Alpha2::GB),
            ("russia", Alpha2::RU),
        ] {
            let country = country_for_slug(&CountrySlug::new(slug)).unwrap();
            assert_eq!(country.alpha2(), alpha2, "slug {slug}");
        }
    }

    #[test]
    fn test_iso_names_resolve() {
        let country = country_for_slug(&CountrySlug::new("pakistan")).unwrap();
        assert_eq!(country.alpha2(), Alpha2::PK);
        let country = country_for_slug(&CountrySlug::new("India")).unwrap();
        assert_eq!(country.alpha2(), Alpha2::IN);
    }

    #[test]
    fn test_unknown_slug() {
        assert!(matches!(
            country_for_slug(&CountrySlug::new("atlantis")),
            Err(CountryMapError::UnknownSlug { .. })
        ));
    }

    #[test]
    fn test_dial_codes() {
        assert_eq!(
            CountrySlug::new("pakistan").dial_code(),
            Some(DialCode::new("92").unwrap())
        );
        assert_eq!(
            CountrySlug::new("england").dial_code(),
            Some(DialCode::new("44").unwrap())
        );
        assert_eq!(CountrySlug::new("atlantis").dial_code(), None);
    }
}
