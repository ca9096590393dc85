#![cfg(feature = "sqlite")]

use common::{Service, setup_db};
use entwine::must::{Must, QueryX};
use entwine::predicate::{self, asc};

mod common;

#[test]
fn x_terminals_return_plain_values() {
    let (client, _driver) = setup_db();
    let services = client.query::<Service>().order(asc("id"));

    assert_eq!(services.all_x().len(), 4);
    assert_eq!(services.ids_x(), ["1", "2", "3", "4"]);
    assert_eq!(services.count_x(), 4);
    assert!(services.exist_x());
    assert_eq!(services.first_x().unwrap().name, "alpha");
}

#[test]
fn first_x_is_none_when_nothing_matches() {
    let (client, _driver) = setup_db();

    let missing = client
        .query::<Service>()
        .r#where(predicate::eq("name", "zeta"))
        .first_x();
    assert!(missing.is_none());
}

#[test]
#[should_panic(expected = "service not singular")]
fn only_x_panics_on_many() {
    let (client, _driver) = setup_db();
    client.query::<Service>().only_x();
}

#[test]
#[should_panic(expected = "invalid query")]
fn first_x_panics_on_other_errors() {
    let (client, _driver) = setup_db();
    client
        .query::<Service>()
        .r#where(predicate::eq("nope", 1))
        .first_x();
}

#[test]
fn must_unwraps_results() {
    let (client, _driver) = setup_db();
    let gamma = client
        .query::<Service>()
        .r#where(predicate::eq("name", "gamma"))
        .only()
        .must();
    assert_eq!(gamma.id, "3");
}
