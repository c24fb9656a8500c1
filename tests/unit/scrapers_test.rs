// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use gpuscout::domain::models::product::Store;
use gpuscout::scrapers::registry::ScraperRegistry;
use gpuscout::utils::errors::ScrapeError;

#[test]
fn test_registry_knows_every_store() {
    let registry = ScraperRegistry::with_defaults();
    assert_eq!(registry.stores(), Store::ALL.to_vec());

    for store in Store::ALL {
        let crawler = registry.create(store.id()).unwrap();
        assert_eq!(crawler.store(), store);
        assert!(crawler.page_url(1).starts_with(store.base_url()));
    }
}

#[test]
fn test_registry_rejects_unknown_store() {
    let registry = ScraperRegistry::with_defaults();
    assert!(matches!(
        registry.create("amazon"),
        Err(ScrapeError::UnknownStore(id)) if id == "amazon"
    ));
}

#[test]
fn test_page_urls_are_pure_functions_of_page_number() {
    let registry = ScraperRegistry::with_defaults();
    let kabum = registry.create("kabum").unwrap();

    assert_eq!(kabum.page_url(3), kabum.page_url(3));
    assert_ne!(kabum.page_url(2), kabum.page_url(3));
    assert!(kabum.page_url(2).contains("page_number=2"));
}

#[test]
fn test_only_pichau_declares_maintenance_markers() {
    let registry = ScraperRegistry::with_defaults();
    assert!(!registry.create("pichau").unwrap().maintenance_markers().is_empty());
    assert!(registry.create("terabyte").unwrap().maintenance_markers().is_empty());
}
