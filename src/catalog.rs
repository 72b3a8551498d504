//! Purchasable services as shown to users.

use crate::models::Service;
use crate::types::CountrySlug;

/// Active services sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    services: Vec<Service>,
}

impl Catalog {
    /// Build from raw service records, dropping inactive ones.
    pub fn new(services: impl IntoIterator<Item = Service>) -> Self {
        let mut services: Vec<Service> = services.into_iter().filter(|s| s.is_active).collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Self { services }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Eligible countries of a service; empty when it is not listed.
    pub fn countries_for(&self, name: &str) -> &[CountrySlug] {
        self.get(name).map(|s| s.countries.as_slice()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl IntoIterator for Catalog {
    type Item = Service;
    type IntoIter = std::vec::IntoIter<Service>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.into_iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Service;
    type IntoIter = std::slice::Iter<'a, Service>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.iter()
    }
}
