//! The entity contract and the container for eager-loaded edges.

use core::any::Any;
use core::fmt;

use entwine_core::{EntError, EntitySchema, Result, Row, RowReader};
use smallvec::SmallVec;

/// A typed record materialized from one table.
///
/// Implementors decode their declared columns in order from the reader:
///
/// ```
/// use entwine::{Edges, Entity};
/// use entwine::core::{ColumnSpec, EntitySchema, Result, RowReader};
///
/// static SERVICE_TYPE: EntitySchema = EntitySchema {
///     label: "service_type",
///     table: "service_types",
///     id_column: "id",
///     columns: &[ColumnSpec::new("id"), ColumnSpec::new("name")],
///     foreign_keys: &[],
///     edges: &[],
/// };
///
/// #[derive(Debug, Clone)]
/// struct ServiceType {
///     id: String,
///     name: String,
///     edges: Edges,
/// }
///
/// impl Entity for ServiceType {
///     const SCHEMA: &'static EntitySchema = &SERVICE_TYPE;
///
///     fn from_row(row: &mut RowReader<'_>) -> Result<Self> {
///         Ok(Self {
///             id: row.id()?,
///             name: row.next()?,
///             edges: Edges::default(),
///         })
///     }
///
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn edges(&self) -> &Edges {
///         &self.edges
///     }
///
///     fn edges_mut(&mut self) -> &mut Edges {
///         &mut self.edges
///     }
/// }
/// ```
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    const SCHEMA: &'static EntitySchema;

    fn from_row(row: &mut RowReader<'_>) -> Result<Self>;

    /// Canonical decimal form of the numeric identifier.
    fn id(&self) -> &str;

    fn edges(&self) -> &Edges;

    fn edges_mut(&mut self) -> &mut Edges;
}

/// Decodes the leading declared columns of `row` into `T`.
pub(crate) fn materialize<T: Entity>(row: &Row) -> Result<T> {
    let schema = T::SCHEMA;
    let mut reader = RowReader::new(schema.label, schema.columns, row);
    let entity = T::from_row(&mut reader)?;
    reader.finish()?;
    Ok(entity)
}

// =============================================================================
// Edges
// =============================================================================

trait EdgeSlot: Send + Sync {
    fn clone_slot(&self) -> Box<dyn EdgeSlot>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn len(&self) -> usize;
}

impl<T: Entity> EdgeSlot for Vec<T> {
    fn clone_slot(&self) -> Box<dyn EdgeSlot> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<T: Entity> EdgeSlot for Option<T> {
    fn clone_slot(&self) -> Box<dyn EdgeSlot> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn len(&self) -> usize {
        usize::from(self.is_some())
    }
}

/// Loaded neighbors of one entity, keyed by edge name.
///
/// Edges appear here only after being requested with
/// [`Query::with_edge`](crate::Query::with_edge). Reading any other edge
/// fails with [`EntError::NotLoaded`].
#[derive(Default)]
pub struct Edges {
    slots: SmallVec<[(&'static str, Box<dyn EdgeSlot>); 2]>,
}

impl Edges {
    fn slot(&self, edge: &'static str) -> Result<&dyn Any> {
        self.slots
            .iter()
            .find(|(name, _)| *name == edge)
            .map(|(_, slot)| slot.as_any())
            .ok_or(EntError::NotLoaded { edge })
    }

    fn slot_mut<S: Any>(&mut self, edge: &'static str) -> Option<&mut S> {
        self.slots
            .iter_mut()
            .find(|(name, _)| *name == edge)
            .and_then(|(_, slot)| slot.as_any_mut().downcast_mut::<S>())
    }

    fn replace(&mut self, edge: &'static str, slot: Box<dyn EdgeSlot>) {
        match self.slots.iter_mut().find(|(name, _)| *name == edge) {
            Some(existing) => existing.1 = slot,
            None => self.slots.push((edge, slot)),
        }
    }

    /// Whether `edge` was eager-loaded.
    pub fn is_loaded(&self, edge: &str) -> bool {
        self.slots.iter().any(|(name, _)| *name == edge)
    }

    /// Names of the loaded edges.
    pub fn loaded(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|(name, _)| *name)
    }

    /// Neighbors over a one-to-many or many-to-many edge.
    pub fn many<T: Entity>(&self, edge: &'static str) -> Result<&[T]> {
        self.slot(edge)?
            .downcast_ref::<Vec<T>>()
            .map(Vec::as_slice)
            .ok_or_else(|| mistyped::<T>(edge, "many"))
    }

    /// Neighbor over a many-to-one or one-to-one edge; `None` when unset.
    pub fn unique<T: Entity>(&self, edge: &'static str) -> Result<Option<&T>> {
        self.slot(edge)?
            .downcast_ref::<Option<T>>()
            .map(Option::as_ref)
            .ok_or_else(|| mistyped::<T>(edge, "unique"))
    }

    pub(crate) fn init_many<T: Entity>(&mut self, edge: &'static str) {
        self.replace(edge, Box::new(Vec::<T>::new()));
    }

    pub(crate) fn init_unique<T: Entity>(&mut self, edge: &'static str) {
        self.replace(edge, Box::new(None::<T>));
    }

    pub(crate) fn push<T: Entity>(&mut self, edge: &'static str, node: T) {
        if let Some(nodes) = self.slot_mut::<Vec<T>>(edge) {
            nodes.push(node);
        } else {
            self.replace(edge, Box::new(vec![node]));
        }
    }

    pub(crate) fn set<T: Entity>(&mut self, edge: &'static str, node: T) {
        self.replace(edge, Box::new(Some(node)));
    }
}

fn mistyped<T: Entity>(edge: &'static str, accessor: &str) -> EntError {
    EntError::invalid(format!(
        "edge {edge:?} does not hold {} values through {accessor}()",
        T::SCHEMA.label
    ))
}

impl Clone for Edges {
    fn clone(&self) -> Self {
        Self {
            slots: self
                .slots
                .iter()
                .map(|(name, slot)| (*name, slot.clone_slot()))
                .collect(),
        }
    }
}

impl fmt::Debug for Edges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(name, slot)| (name, slot.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use entwine_core::{ColumnSpec, Value};

    use super::*;

    static NODE: EntitySchema = EntitySchema {
        label: "node",
        table: "nodes",
        id_column: "id",
        columns: &[ColumnSpec::new("id"), ColumnSpec::nullable("label")],
        foreign_keys: &[],
        edges: &[],
    };

    #[derive(Debug, Clone)]
    struct Node {
        id: String,
        label: Option<String>,
        edges: Edges,
    }

    impl Entity for Node {
        const SCHEMA: &'static EntitySchema = &NODE;

        fn from_row(row: &mut RowReader<'_>) -> Result<Self> {
            Ok(Self {
                id: row.id()?,
                label: row.next()?,
                edges: Edges::default(),
            })
        }

        fn id(&self) -> &str {
            &self.id
        }

        fn edges(&self) -> &Edges {
            &self.edges
        }

        fn edges_mut(&mut self) -> &mut Edges {
            &mut self.edges
        }
    }

    fn node(id: i64) -> Node {
        materialize(&Row::new(vec![Value::Integer(id), Value::Null])).unwrap()
    }

    #[test]
    fn unloaded_edges_report_not_loaded() {
        let n = node(1);
        assert!(matches!(
            n.edges().many::<Node>("children"),
            Err(EntError::NotLoaded { edge: "children" })
        ));
        assert_eq!(n.label, None);
    }

    #[test]
    fn slots_are_typed() {
        let mut n = node(1);
        n.edges_mut().init_many::<Node>("children");
        n.edges_mut().push("children", node(2));
        n.edges_mut().init_unique::<Node>("parent");

        assert_eq!(n.edges().many::<Node>("children").unwrap().len(), 1);
        assert!(n.edges().unique::<Node>("parent").unwrap().is_none());
        assert!(matches!(
            n.edges().unique::<Node>("children"),
            Err(EntError::InvalidQuery(_))
        ));
    }

    #[test]
    fn clones_copy_loaded_edges() {
        let mut n = node(1);
        n.edges_mut().set("parent", node(9));
        let copy = n.clone();
        n.edges_mut().set("parent", node(8));
        assert_eq!(copy.edges().unique::<Node>("parent").unwrap().unwrap().id(), "9");
        assert_eq!(format!("{:?}", copy.edges), r#"{"parent": 1}"#);
    }
}
