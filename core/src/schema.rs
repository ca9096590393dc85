//! Static entity metadata: tables, columns and edge descriptors.
//!
//! Every entity type declares one `static` [`EntitySchema`]. Edges point at
//! the target's schema by reference, so schemas may refer to each other (and
//! to themselves) freely:
//!
//! ```
//! use entwine_core::schema::{ColumnSpec, EdgeDescriptor, EntitySchema};
//!
//! pub static SERVICE: EntitySchema = EntitySchema {
//!     label: "service",
//!     table: "services",
//!     id_column: "id",
//!     columns: &[ColumnSpec::new("id"), ColumnSpec::new("name")],
//!     foreign_keys: &[],
//!     edges: &[EdgeDescriptor::many_to_many(
//!         "downstream",
//!         &SERVICE,
//!         "service_downstream",
//!         "parent_id",
//!         "child_id",
//!     )],
//! };
//!
//! assert_eq!(SERVICE.edge("downstream").unwrap().target().table, "services");
//! ```

use core::fmt;

/// One declared column and its null rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub nullable: bool,
}

impl ColumnSpec {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            nullable: false,
        }
    }

    pub const fn nullable(name: &'static str) -> Self {
        Self {
            name,
            nullable: true,
        }
    }
}

/// Table-level metadata for one entity type.
#[derive(Debug)]
pub struct EntitySchema {
    /// Singular name used in error messages.
    pub label: &'static str,
    pub table: &'static str,
    pub id_column: &'static str,
    /// Columns decoded by the materializer, identifier first.
    pub columns: &'static [ColumnSpec],
    /// Foreign-key columns not exposed as fields; fetched only to stitch
    /// owning-side edges.
    pub foreign_keys: &'static [&'static str],
    pub edges: &'static [EdgeDescriptor],
}

impl EntitySchema {
    /// Looks up an edge by name.
    pub fn edge(&'static self, name: &str) -> Option<&'static EdgeDescriptor> {
        self.edges.iter().find(|edge| edge.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Identifier or foreign-key column; both hold identifiers.
    pub fn is_key(&self, name: &str) -> bool {
        name == self.id_column || self.foreign_keys.contains(&name)
    }
}

/// How many entities sit on each side of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// Whether a parent holds at most one neighbor over this edge.
    pub const fn is_unique(&self) -> bool {
        matches!(self, Cardinality::OneToOne | Cardinality::ManyToOne)
    }
}

/// Where the keys linking parent and target rows are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Join {
    /// The parent row holds `column`, a foreign key to the target id.
    OwningFk { column: &'static str },
    /// Target rows hold `column`, a foreign key back to the parent id.
    InverseFk { column: &'static str },
    /// `table` holds (`parent_column`, `target_column`) pairs.
    JoinTable {
        table: &'static str,
        parent_column: &'static str,
        target_column: &'static str,
    },
}

/// Static description of one relation.
///
/// Only constructible through the cardinality-named constructors, which pair
/// each cardinality with the join strategy it requires.
#[derive(Clone, Copy)]
pub struct EdgeDescriptor {
    name: &'static str,
    target: &'static EntitySchema,
    cardinality: Cardinality,
    join: Join,
}

impl EdgeDescriptor {
    /// Parent rows hold a foreign key to the target (`service.type_id`).
    pub const fn many_to_one(
        name: &'static str,
        target: &'static EntitySchema,
        column: &'static str,
    ) -> Self {
        Self {
            name,
            target,
            cardinality: Cardinality::ManyToOne,
            join: Join::OwningFk { column },
        }
    }

    /// Target rows hold a foreign key back to the parent (`property.service_id`).
    pub const fn one_to_many(
        name: &'static str,
        target: &'static EntitySchema,
        column: &'static str,
    ) -> Self {
        Self {
            name,
            target,
            cardinality: Cardinality::OneToMany,
            join: Join::InverseFk { column },
        }
    }

    /// Pairs of keys in a join table; declare the reverse edge by swapping the columns.
    pub const fn many_to_many(
        name: &'static str,
        target: &'static EntitySchema,
        table: &'static str,
        parent_column: &'static str,
        target_column: &'static str,
    ) -> Self {
        Self {
            name,
            target,
            cardinality: Cardinality::ManyToMany,
            join: Join::JoinTable {
                table,
                parent_column,
                target_column,
            },
        }
    }

    /// One-to-one where the parent row holds the (unique) foreign key.
    pub const fn one_to_one_owning(
        name: &'static str,
        target: &'static EntitySchema,
        column: &'static str,
    ) -> Self {
        Self {
            name,
            target,
            cardinality: Cardinality::OneToOne,
            join: Join::OwningFk { column },
        }
    }

    /// One-to-one where the target row holds the (unique) foreign key.
    pub const fn one_to_one_inverse(
        name: &'static str,
        target: &'static EntitySchema,
        column: &'static str,
    ) -> Self {
        Self {
            name,
            target,
            cardinality: Cardinality::OneToOne,
            join: Join::InverseFk { column },
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn target(&self) -> &'static EntitySchema {
        self.target
    }

    #[inline]
    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    #[inline]
    pub const fn join(&self) -> Join {
        self.join
    }

    #[inline]
    pub const fn is_unique(&self) -> bool {
        self.cardinality.is_unique()
    }
}

impl fmt::Debug for EdgeDescriptor {
    // Targets may point back at the owning schema; print only their label.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeDescriptor")
            .field("name", &self.name)
            .field("target", &self.target.label)
            .field("cardinality", &self.cardinality)
            .field("join", &self.join)
            .finish()
    }
}
