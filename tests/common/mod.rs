#![cfg(feature = "sqlite")]
#![allow(dead_code)]

pub mod schema;

pub use schema::*;

use entwine::Client;
use entwine::core::Statement;
use entwine::sqlite::SqliteDriver;

const DDL: &str = "
CREATE TABLE service_types (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE services (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    external_id TEXT,
    type_id INTEGER REFERENCES service_types(id)
);
CREATE TABLE properties (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    service_id INTEGER REFERENCES services(id)
);
CREATE TABLE customers (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    active INTEGER NOT NULL
);
CREATE TABLE service_customers (
    service_id INTEGER NOT NULL REFERENCES services(id),
    customer_id INTEGER NOT NULL REFERENCES customers(id),
    PRIMARY KEY (service_id, customer_id)
);
CREATE TABLE service_downstream (
    service_id INTEGER NOT NULL REFERENCES services(id),
    downstream_id INTEGER NOT NULL REFERENCES services(id),
    PRIMARY KEY (service_id, downstream_id)
);
";

/// service_types: 1 vpn, 2 fiber, 3 unused
/// services: 1 alpha (vpn), 2 beta (vpn), 3 gamma (fiber), 4 delta (no type)
/// properties: alpha {speed, region}, gamma {speed}, one orphan
/// customers: 1 acme, 2 globex (inactive), 3 initech
/// service_customers: alpha {acme, globex}, beta {acme}, gamma {initech}
/// service_downstream: alpha -> {beta, gamma}, beta -> {gamma}
const SEED: &str = "
INSERT INTO service_types (id, name) VALUES (1, 'vpn'), (2, 'fiber'), (3, 'unused');
INSERT INTO services (id, name, external_id, type_id) VALUES
    (1, 'alpha', 'A-1', 1),
    (2, 'beta', NULL, 1),
    (3, 'gamma', 'G-3', 2),
    (4, 'delta', NULL, NULL);
INSERT INTO properties (id, name, value, service_id) VALUES
    (1, 'speed', '100', 1),
    (2, 'region', 'eu', 1),
    (3, 'speed', '10', 3),
    (4, 'orphan', 'x', NULL);
INSERT INTO customers (id, name, active) VALUES (1, 'acme', 1), (2, 'globex', 0), (3, 'initech', 1);
INSERT INTO service_customers (service_id, customer_id) VALUES (1, 1), (1, 2), (2, 1), (3, 3);
INSERT INTO service_downstream (service_id, downstream_id) VALUES (1, 2), (1, 3), (2, 3);
";

/// Seeded in-memory database and a client over it.
pub fn setup_db() -> (Client, SqliteDriver) {
    let driver = SqliteDriver::open_in_memory().expect("Failed to create in-memory database");
    driver.execute_batch(DDL).expect("Failed to create tables");
    driver.execute_batch(SEED).expect("Failed to seed tables");
    (Client::new(driver.clone()), driver)
}

pub fn insert_customer(name: &str, active: bool) -> Statement {
    Statement {
        sql: "INSERT INTO customers (name, active) VALUES (?, ?)".into(),
        args: vec![name.into(), active.into()],
    }
}
