#![cfg(feature = "sqlite")]

use common::{Service, setup_db};
use entwine::EntError;
use entwine::predicate::{self, asc, desc};

mod common;

fn names(services: &[Service]) -> Vec<&str> {
    services.iter().map(|s| s.name.as_str()).collect()
}

#[test]
fn all_orders_by_every_term() {
    let (client, _driver) = setup_db();

    let services = client
        .query::<Service>()
        .order(asc("name"))
        .all()
        .unwrap();
    assert_eq!(names(&services), ["alpha", "beta", "delta", "gamma"]);

    let services = client
        .query::<Service>()
        .order(desc("type_id"))
        .order(asc("id"))
        .all()
        .unwrap();
    assert_eq!(names(&services), ["gamma", "alpha", "beta", "delta"]);
}

#[test]
fn materializes_nullable_columns() {
    let (client, _driver) = setup_db();

    let services = client.query::<Service>().order(asc("id")).all().unwrap();
    assert_eq!(services[0].id, "1");
    assert_eq!(services[0].external_id.as_deref(), Some("A-1"));
    assert_eq!(services[1].external_id, None);
}

#[test]
fn only_distinguishes_zero_one_and_many() {
    let (client, _driver) = setup_db();

    let beta = client
        .query::<Service>()
        .r#where(predicate::eq("name", "beta"))
        .only()
        .unwrap();
    assert_eq!(beta.id, "2");

    let missing = client
        .query::<Service>()
        .r#where(predicate::eq("name", "zeta"))
        .only();
    assert!(matches!(missing, Err(EntError::NotFound { label: "service" })));

    let many = client.query::<Service>().only();
    assert!(matches!(many, Err(EntError::NotSingular { label: "service" })));
    assert!(many.unwrap_err().is_not_singular());
}

#[test]
fn first_honors_order_and_reports_not_found() {
    let (client, _driver) = setup_db();

    let last = client
        .query::<Service>()
        .order(desc("name"))
        .first()
        .unwrap();
    assert_eq!(last.name, "gamma");

    let err = client
        .query::<Service>()
        .r#where(predicate::eq("name", "zeta"))
        .first()
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn count_ignores_pagination_and_order() {
    let (client, _driver) = setup_db();

    let query = client.query::<Service>().order(asc("name")).limit(1).offset(1);
    assert_eq!(query.count().unwrap(), 4);
    assert_eq!(query.all().unwrap().len(), 1);

    let without_external = client
        .query::<Service>()
        .r#where(predicate::is_null("external_id"));
    assert_eq!(without_external.count().unwrap(), 2);
    assert_eq!(
        without_external.clone().unique(true).count().unwrap(),
        2
    );
}

#[test]
fn ids_select_identifiers_only() {
    let (client, _driver) = setup_db();

    let ids = client.query::<Service>().order(asc("id")).ids().unwrap();
    assert_eq!(ids, ["1", "2", "3", "4"]);

    let first = client.query::<Service>().order(desc("id")).first_id().unwrap();
    assert_eq!(first, "4");

    let only = client
        .query::<Service>()
        .r#where(predicate::eq("name", "gamma"))
        .only_id()
        .unwrap();
    assert_eq!(only, "3");

    let err = client.query::<Service>().only_id().unwrap_err();
    assert!(err.is_not_singular());
}

#[test]
fn exist_agrees_with_count() {
    let (client, _driver) = setup_db();

    for name in ["alpha", "zeta"] {
        let query = client
            .query::<Service>()
            .r#where(predicate::eq("name", name));
        assert_eq!(query.exist().unwrap(), query.count().unwrap() > 0);
    }

    let past_end = client.query::<Service>().order(asc("id")).offset(10);
    assert_eq!(past_end.count().unwrap(), 4);
    assert!(past_end.exist().unwrap());

    let empty_page = client.query::<Service>().limit(0);
    assert_eq!(empty_page.count().unwrap(), 4);
    assert!(empty_page.exist().unwrap());
}

#[test]
fn offset_without_limit_is_unbounded() {
    let (client, _driver) = setup_db();

    let ids = client
        .query::<Service>()
        .order(asc("id"))
        .offset(2)
        .ids()
        .unwrap();
    assert_eq!(ids, ["3", "4"]);
}

#[test]
fn cloned_builders_are_independent() {
    let (client, _driver) = setup_db();

    let base = client
        .query::<Service>()
        .r#where(predicate::not_null("external_id"));
    let narrowed = base.clone().r#where(predicate::eq("name", "alpha"));
    let paged = base.clone().order(asc("id")).limit(1);

    assert_eq!(base.count().unwrap(), 2);
    assert_eq!(narrowed.count().unwrap(), 1);
    assert_eq!(base.all().unwrap().len(), 2);
    assert_eq!(paged.all().unwrap().len(), 1);
}

#[test]
fn builders_run_repeatedly() {
    let (client, _driver) = setup_db();

    let query = client.query::<Service>().order(asc("id"));
    let first = query.ids().unwrap();
    let second = query.ids().unwrap();
    assert_eq!(first, second);
}

#[test]
fn field_predicates() {
    let (client, _driver) = setup_db();
    let count = |p| client.query::<Service>().r#where(p).count().unwrap();

    assert_eq!(count(predicate::ne("name", "alpha")), 3);
    assert_eq!(count(predicate::gt("id", 2)), 2);
    assert_eq!(count(predicate::lte("id", 2)), 2);
    assert_eq!(count(predicate::in_values("name", ["alpha", "delta"])), 2);
    assert_eq!(count(predicate::not_in("name", ["alpha"])), 3);
    assert_eq!(count(predicate::contains("name", "mm")), 1);
    assert_eq!(count(predicate::has_prefix("name", "de")), 1);
    assert_eq!(count(predicate::has_suffix("name", "ta")), 2);
    assert_eq!(count(predicate::equal_fold("name", "ALPHA")), 1);
    assert_eq!(count(predicate::contains_fold("name", "LP")), 1);
    assert_eq!(count(predicate::eq("type_id", 1)), 2);
}

#[test]
fn like_patterns_match_wildcards_literally() {
    let (client, driver) = setup_db();
    driver
        .execute_batch("INSERT INTO services (id, name) VALUES (5, '50%_off')")
        .unwrap();

    let matched = client
        .query::<Service>()
        .r#where(predicate::contains("name", "%_"))
        .ids()
        .unwrap();
    assert_eq!(matched, ["5"]);
}

#[test]
fn empty_membership_lists() {
    let (client, _driver) = setup_db();
    let none: [&str; 0] = [];

    let in_none = client
        .query::<Service>()
        .r#where(predicate::in_values("name", none));
    assert_eq!(in_none.count().unwrap(), 0);

    let not_in_none = client
        .query::<Service>()
        .r#where(predicate::not_in("name", none));
    assert_eq!(not_in_none.count().unwrap(), 4);
}

#[test]
fn id_predicates() {
    let (client, _driver) = setup_db();

    let ids = client
        .query::<Service>()
        .r#where(predicate::id_in(["3", "1"]))
        .order(asc("id"))
        .ids()
        .unwrap();
    assert_eq!(ids, ["1", "3"]);

    let above = client
        .query::<Service>()
        .r#where(predicate::id_gte("3"))
        .count()
        .unwrap();
    assert_eq!(above, 2);

    let err = client
        .query::<Service>()
        .r#where(predicate::id_eq("not-a-number"))
        .all()
        .unwrap_err();
    assert!(matches!(err, EntError::InvalidQuery(_)));
}

#[test]
fn combinators() {
    let (client, _driver) = setup_db();

    let either = client
        .query::<Service>()
        .r#where(predicate::or([
            predicate::eq("name", "alpha"),
            predicate::eq("name", "delta"),
        ]))
        .order(asc("id"))
        .ids()
        .unwrap();
    assert_eq!(either, ["1", "4"]);

    let both = client
        .query::<Service>()
        .r#where(predicate::and([
            predicate::eq("type_id", 1),
            predicate::not_null("external_id"),
        ]))
        .ids()
        .unwrap();
    assert_eq!(both, ["1"]);

    let negated = client
        .query::<Service>()
        .r#where(predicate::not(predicate::eq("name", "alpha")))
        .count()
        .unwrap();
    assert_eq!(negated, 3);

    let nothing = client
        .query::<Service>()
        .r#where(predicate::or([]))
        .count()
        .unwrap();
    assert_eq!(nothing, 0);
}

#[test]
fn edge_predicates() {
    let (client, _driver) = setup_db();
    let ids = |p| {
        client
            .query::<Service>()
            .r#where(p)
            .order(asc("id"))
            .ids()
            .unwrap()
    };

    assert_eq!(ids(predicate::has_edge("type")), ["1", "2", "3"]);
    assert_eq!(
        ids(predicate::has_edge_with(
            "type",
            [predicate::eq("name", "fiber")]
        )),
        ["3"]
    );
    assert_eq!(ids(predicate::has_edge("properties")), ["1", "3"]);
    assert_eq!(
        ids(predicate::has_edge_with(
            "properties",
            [predicate::eq("name", "region")]
        )),
        ["1"]
    );
    assert_eq!(ids(predicate::has_edge("customers")), ["1", "2", "3"]);
    assert_eq!(
        ids(predicate::has_edge_with(
            "customers",
            [predicate::eq("active", false)]
        )),
        ["1"]
    );
    assert_eq!(ids(predicate::has_edge("downstream")), ["1", "2"]);
    assert_eq!(ids(predicate::has_edge("upstream")), ["2", "3"]);
    assert_eq!(
        ids(predicate::not(predicate::has_edge("customers"))),
        ["4"]
    );
}

#[test]
fn unknown_fields_and_edges_are_invalid() {
    let (client, _driver) = setup_db();

    let err = client
        .query::<Service>()
        .r#where(predicate::eq("nope", 1))
        .all()
        .unwrap_err();
    assert!(matches!(&err, EntError::InvalidQuery(msg) if msg.contains("service.nope")));

    let err = client
        .query::<Service>()
        .r#where(predicate::has_edge("nope"))
        .count()
        .unwrap_err();
    assert!(matches!(err, EntError::InvalidQuery(_)));

    let err = client
        .query::<Service>()
        .order(asc("nope"))
        .ids()
        .unwrap_err();
    assert!(matches!(err, EntError::InvalidQuery(_)));
}
