#![cfg(feature = "sqlite")]

use common::{Customer, Property, Service, ServiceType, setup_db};
use entwine::EntError;
use entwine::predicate::{self, asc};

mod common;

#[test]
fn neighbors_over_a_join_table() {
    let (client, _driver) = setup_db();

    let customers = client
        .query::<Service>()
        .r#where(predicate::eq("name", "alpha"))
        .query_edge::<Customer>("customers")
        .order(asc("id"))
        .all()
        .unwrap();

    let names: Vec<&str> = customers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["acme", "globex"]);
}

#[test]
fn neighbors_over_an_owning_key() {
    let (client, _driver) = setup_db();

    let types = client
        .query::<Service>()
        .r#where(predicate::not_null("external_id"))
        .query_edge::<ServiceType>("type")
        .order(asc("id"))
        .ids()
        .unwrap();
    assert_eq!(types, ["1", "2"]);
}

#[test]
fn neighbors_over_an_inverse_key() {
    let (client, _driver) = setup_db();

    let properties = client
        .query::<Service>()
        .r#where(predicate::eq("type_id", 1))
        .query_edge::<Property>("properties")
        .order(asc("id"))
        .ids()
        .unwrap();
    assert_eq!(properties, ["1", "2"]);
}

#[test]
fn traversals_chain() {
    let (client, _driver) = setup_db();

    let customers = client
        .query::<ServiceType>()
        .r#where(predicate::eq("name", "fiber"))
        .query_edge::<Service>("services")
        .query_edge::<Customer>("customers")
        .all()
        .unwrap();

    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].name, "initech");
}

#[test]
fn traversal_keeps_source_pagination() {
    let (client, _driver) = setup_db();

    let count = client
        .query::<Service>()
        .order(asc("id"))
        .limit(1)
        .query_edge::<Customer>("customers")
        .count()
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn traversal_results_load_edges() {
    let (client, _driver) = setup_db();

    let services = client
        .query::<Customer>()
        .r#where(predicate::eq("name", "acme"))
        .query_edge::<Service>("services")
        .with::<ServiceType>("type")
        .order(asc("id"))
        .all()
        .unwrap();

    assert_eq!(services.len(), 2);
    assert!(services.iter().all(|s| s.service_type().is_some()));
}

#[test]
fn traversal_over_unknown_edge_is_invalid() {
    let (client, _driver) = setup_db();

    let err = client
        .query::<Service>()
        .query_edge::<Customer>("owners")
        .all()
        .unwrap_err();
    assert!(matches!(err, EntError::InvalidQuery(_)));
}
