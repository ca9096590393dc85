//! Entity fixtures over the service inventory tables.

use entwine::core::{ColumnSpec, EdgeDescriptor, EntitySchema, Result, RowReader};
use entwine::{Edges, Entity};

macro_rules! entity_accessors {
    () => {
        fn id(&self) -> &str {
            &self.id
        }

        fn edges(&self) -> &Edges {
            &self.edges
        }

        fn edges_mut(&mut self) -> &mut Edges {
            &mut self.edges
        }
    };
}

// =============================================================================
// Schemas
// =============================================================================

pub static SERVICE: EntitySchema = EntitySchema {
    label: "service",
    table: "services",
    id_column: "id",
    columns: &[
        ColumnSpec::new("id"),
        ColumnSpec::new("name"),
        ColumnSpec::nullable("external_id"),
    ],
    foreign_keys: &["type_id"],
    edges: &[
        EdgeDescriptor::many_to_one("type", &SERVICE_TYPE, "type_id"),
        EdgeDescriptor::one_to_many("properties", &PROPERTY, "service_id"),
        EdgeDescriptor::many_to_many(
            "customers",
            &CUSTOMER,
            "service_customers",
            "service_id",
            "customer_id",
        ),
        EdgeDescriptor::many_to_many(
            "downstream",
            &SERVICE,
            "service_downstream",
            "service_id",
            "downstream_id",
        ),
        EdgeDescriptor::many_to_many(
            "upstream",
            &SERVICE,
            "service_downstream",
            "downstream_id",
            "service_id",
        ),
    ],
};

pub static SERVICE_TYPE: EntitySchema = EntitySchema {
    label: "service_type",
    table: "service_types",
    id_column: "id",
    columns: &[ColumnSpec::new("id"), ColumnSpec::new("name")],
    foreign_keys: &[],
    edges: &[EdgeDescriptor::one_to_many("services", &SERVICE, "type_id")],
};

pub static PROPERTY: EntitySchema = EntitySchema {
    label: "property",
    table: "properties",
    id_column: "id",
    columns: &[
        ColumnSpec::new("id"),
        ColumnSpec::new("name"),
        ColumnSpec::new("value"),
    ],
    foreign_keys: &["service_id"],
    edges: &[EdgeDescriptor::many_to_one("service", &SERVICE, "service_id")],
};

pub static CUSTOMER: EntitySchema = EntitySchema {
    label: "customer",
    table: "customers",
    id_column: "id",
    columns: &[
        ColumnSpec::new("id"),
        ColumnSpec::new("name"),
        ColumnSpec::new("active"),
    ],
    foreign_keys: &[],
    edges: &[EdgeDescriptor::many_to_many(
        "services",
        &SERVICE,
        "service_customers",
        "customer_id",
        "service_id",
    )],
};

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub external_id: Option<String>,
    pub edges: Edges,
}

impl Entity for Service {
    const SCHEMA: &'static EntitySchema = &SERVICE;

    fn from_row(row: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            id: row.id()?,
            name: row.next()?,
            external_id: row.next()?,
            edges: Edges::default(),
        })
    }

    entity_accessors!();
}

impl Service {
    pub fn service_type(&self) -> Option<&ServiceType> {
        self.edges.unique("type").ok().flatten()
    }

    pub fn properties(&self) -> &[Property] {
        self.edges.many("properties").unwrap_or_default()
    }

    pub fn customers(&self) -> &[Customer] {
        self.edges.many("customers").unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ServiceType {
    pub id: String,
    pub name: String,
    pub edges: Edges,
}

impl Entity for ServiceType {
    const SCHEMA: &'static EntitySchema = &SERVICE_TYPE;

    fn from_row(row: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            id: row.id()?,
            name: row.next()?,
            edges: Edges::default(),
        })
    }

    entity_accessors!();
}

#[derive(Debug, Clone)]
pub struct Property {
    pub id: String,
    pub name: String,
    pub value: String,
    pub edges: Edges,
}

impl Entity for Property {
    const SCHEMA: &'static EntitySchema = &PROPERTY;

    fn from_row(row: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            id: row.id()?,
            name: row.next()?,
            value: row.next()?,
            edges: Edges::default(),
        })
    }

    entity_accessors!();
}

#[derive(Debug, Clone)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub edges: Edges,
}

impl Entity for Customer {
    const SCHEMA: &'static EntitySchema = &CUSTOMER;

    fn from_row(row: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            id: row.id()?,
            name: row.next()?,
            active: row.next()?,
            edges: Edges::default(),
        })
    }

    entity_accessors!();
}

