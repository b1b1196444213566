//! Schema catalog.
//!
//! The catalog knows every registered record type, either through its live
//! descriptor or a serialized description, and derives each table once.
//! Derived tables are shared process-wide; workers read them through a
//! [`SchemaView`] that skips the shared lock after the first lookup.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use recorder_cache::{LocalCache, SharedCache};
use recorder_common::{RecorderError, RecorderResult};
use tracing::debug;

use crate::description::TypeDescription;
use crate::record::{Record, RecordDescriptor, RecordTypeId};
use crate::table::Table;

/// Anything that can produce the table of a record type.
pub trait SchemaSource: Send + Sync {
    /// Returns the table of a record type.
    fn table(&self, record: &RecordTypeId) -> RecorderResult<Arc<Table>>;
}

/// How a record type became known.
#[derive(Debug, Clone)]
enum Registration {
    Live(&'static RecordDescriptor),
    Described(Arc<TypeDescription>),
}

impl Registration {
    fn accepts(&self, descriptor: &'static RecordDescriptor) -> RecorderResult<()> {
        match self {
            Self::Live(existing) if !std::ptr::eq(*existing, descriptor) => {
                Err(RecorderError::DuplicateRecordType {
                    record: descriptor.type_id.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Registry of record types and cache of their derived tables.
pub struct SchemaCatalog {
    registry: RwLock<HashMap<RecordTypeId, Registration>>,
    tables: Arc<SharedCache<RecordTypeId, Arc<Table>>>,
}

impl SchemaCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            tables: Arc::new(SharedCache::new("tables")),
        }
    }

    /// Registers a record type and every record its foreign keys refer to.
    pub fn register<R: Record>(&self) -> RecorderResult<()> {
        self.register_descriptor(R::descriptor())
    }

    /// Registers a live descriptor and, transitively, its dependencies.
    ///
    /// Fails if another live descriptor already holds the same identifier.
    /// A serialized description registered first keeps precedence.
    pub fn register_descriptor(
        &self,
        descriptor: &'static RecordDescriptor,
    ) -> RecorderResult<()> {
        if let Some(registration) = self.registry.read().get(&descriptor.type_id) {
            return registration.accepts(descriptor);
        }

        // Nothing is inserted unless the whole dependency graph is accepted
        let mut registry = self.registry.write();
        let mut pending = vec![descriptor];
        let mut accepted: Vec<&'static RecordDescriptor> = Vec::new();
        while let Some(next) = pending.pop() {
            if let Some(registration) = registry.get(&next.type_id) {
                registration.accepts(next)?;
                continue;
            }
            if let Some(seen) = accepted.iter().find(|seen| seen.type_id == next.type_id) {
                Registration::Live(*seen).accepts(next)?;
                continue;
            }
            accepted.push(next);
            pending.extend(next.dependencies.iter().map(|dependency| dependency()));
        }

        for next in accepted {
            debug!(record = %next.type_id, "registered record");
            registry.insert(next.type_id.clone(), Registration::Live(next));
        }
        Ok(())
    }

    /// Registers a serialized description.
    ///
    /// Returns false if the record type was already registered; the first
    /// registration wins.
    pub fn register_description(&self, description: TypeDescription) -> bool {
        let mut registry = self.registry.write();
        if registry.contains_key(&description.type_id) {
            return false;
        }
        debug!(record = %description.type_id, "registered record description");
        registry.insert(
            description.type_id.clone(),
            Registration::Described(Arc::new(description)),
        );
        true
    }

    /// Returns true if the record type is registered.
    pub fn is_registered(&self, record: &RecordTypeId) -> bool {
        self.registry.read().contains_key(record)
    }

    /// Returns the number of registered record types.
    pub fn len(&self) -> usize {
        self.registry.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.read().is_empty()
    }

    /// Registers a record type and returns its table.
    pub fn table_of<R: Record>(&self) -> RecorderResult<Arc<Table>> {
        self.register::<R>()?;
        self.table(&R::record_type())
    }

    /// Derives a table without consulting the table cache.
    pub fn derive(&self, record: &RecordTypeId) -> RecorderResult<Arc<Table>> {
        let registration = self
            .registry
            .read()
            .get(record)
            .cloned()
            .ok_or_else(|| RecorderError::UnknownRecord {
                record: record.to_string(),
            })?;

        let table = match registration {
            Registration::Live(descriptor) => Table::from_descriptor(descriptor)?,
            Registration::Described(description) => description.to_table()?,
        };
        Ok(Arc::new(table))
    }

    /// Returns the shared table cache.
    pub fn tables(&self) -> &Arc<SharedCache<RecordTypeId, Arc<Table>>> {
        &self.tables
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaSource for SchemaCatalog {
    fn table(&self, record: &RecordTypeId) -> RecorderResult<Arc<Table>> {
        self.tables
            .get_or_try_insert_with(record, || self.derive(record))
    }
}

/// A worker's view of the catalog.
pub struct SchemaView {
    catalog: Arc<SchemaCatalog>,
    local: LocalCache<RecordTypeId, Arc<Table>>,
    registered: HashSet<TypeId>,
}

impl SchemaView {
    /// Creates a view over a catalog.
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        let local = LocalCache::new(Arc::clone(catalog.tables()));
        Self {
            catalog,
            local,
            registered: HashSet::new(),
        }
    }

    /// Registers a record type and returns its table.
    pub fn table_of<R: Record>(&mut self) -> RecorderResult<Arc<Table>> {
        // Each Rust type is checked against the catalog once per view
        if !self.registered.contains(&TypeId::of::<R>()) {
            self.catalog.register::<R>()?;
            self.registered.insert(TypeId::of::<R>());
        }
        let record = R::record_type();
        let catalog = &self.catalog;
        self.local
            .get_or_try_insert_with(&record, || catalog.derive(&record))
    }

    /// Returns the table of a registered record type.
    pub fn table(&mut self, record: &RecordTypeId) -> RecorderResult<Arc<Table>> {
        let catalog = &self.catalog;
        self.local
            .get_or_try_insert_with(record, || catalog.derive(record))
    }

    /// Returns the catalog behind this view.
    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record, ForeignKey, PrimaryKey};

    record! {
        pub struct Team {
            pub id: PrimaryKey<i32>,
            pub name: String,
        }
    }

    record! {
        pub struct Member {
            pub id: PrimaryKey<i64>,
            pub team: ForeignKey<Team>,
            pub mentor: Option<ForeignKey<Member>>,
        }
    }

    #[test]
    fn test_register_follows_foreign_keys() {
        let catalog = SchemaCatalog::new();
        catalog.register::<Member>().unwrap();

        assert!(catalog.is_registered(&Member::record_type()));
        assert!(catalog.is_registered(&Team::record_type()));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_unknown_record() {
        let catalog = SchemaCatalog::new();
        let err = catalog.table(&Team::record_type()).unwrap_err();
        assert!(matches!(err, RecorderError::UnknownRecord { .. }));
    }

    #[test]
    fn test_tables_are_derived_once() {
        let catalog = SchemaCatalog::new();
        let first = catalog.table_of::<Team>().unwrap();
        let second = catalog.table(&Team::record_type()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(catalog.tables().stats().inserts(), 1);
    }

    #[test]
    fn test_description_registration() {
        let catalog = SchemaCatalog::new();
        assert!(catalog.register_description(TypeDescription::of::<Team>()));
        assert!(!catalog.register_description(TypeDescription::of::<Team>()));

        let table = catalog.table(&Team::record_type()).unwrap();
        assert_eq!(*table, Table::from_record::<Team>().unwrap());
    }

    #[test]
    fn test_view_shares_catalog_tables() {
        let catalog = Arc::new(SchemaCatalog::new());
        let mut view = SchemaView::new(Arc::clone(&catalog));
        let mut other = SchemaView::new(Arc::clone(&catalog));

        let a = view.table_of::<Member>().unwrap();
        let b = other.table(&Member::record_type()).unwrap();
        let c = catalog.table(&Member::record_type()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert!(catalog.is_registered(&Team::record_type()));
    }

    fn alpha_table(view: &mut SchemaView) -> RecorderResult<Arc<Table>> {
        record! {
            #[allow(dead_code)]
            struct Row as "Alpha" {
                id: PrimaryKey<i64>,
                a: String,
            }
        }
        view.table_of::<Row>()
    }

    fn beta_table(view: &mut SchemaView) -> RecorderResult<Arc<Table>> {
        record! {
            #[allow(dead_code)]
            struct Row as "Beta" {
                id: PrimaryKey<i64>,
                b: i32,
            }
        }
        view.table_of::<Row>()
    }

    #[test]
    fn test_same_name_in_different_functions() {
        let catalog = Arc::new(SchemaCatalog::new());
        let mut view = SchemaView::new(Arc::clone(&catalog));

        let alpha = alpha_table(&mut view).unwrap();
        let beta = beta_table(&mut view).unwrap();

        assert_ne!(alpha.record, beta.record);
        assert_eq!(alpha.name, "Alpha");
        assert_eq!(alpha.column_names().collect::<Vec<_>>(), vec!["id", "a"]);
        assert_eq!(beta.name, "Beta");
        assert_eq!(beta.column_names().collect::<Vec<_>>(), vec!["id", "b"]);
        assert_eq!(catalog.len(), 2);
    }

    fn leaked(type_name: &'static str, field: &'static str) -> &'static RecordDescriptor {
        Box::leak(Box::new(RecordDescriptor {
            type_id: RecordTypeId::from_static("app::Row"),
            type_name,
            table_name: None,
            fields: vec![crate::FieldDescriptor {
                name: field,
                field_type: <i32 as crate::Field>::field_type(),
                annotations: crate::FieldAnnotations::NONE,
            }],
            dependencies: Vec::new(),
        }))
    }

    #[test]
    fn test_conflicting_descriptors_are_rejected() {
        let catalog = SchemaCatalog::new();
        let first = leaked("Row", "a");
        let second = leaked("Row", "b");

        catalog.register_descriptor(first).unwrap();
        catalog.register_descriptor(first).unwrap();
        let err = catalog.register_descriptor(second).unwrap_err();
        assert!(matches!(
            err,
            RecorderError::DuplicateRecordType { ref record } if record == "app::Row"
        ));
        assert!(err.is_schema_error());

        // The first registration is untouched
        let table = catalog.table(&RecordTypeId::from_static("app::Row")).unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_conflicting_dependency_registers_nothing() {
        fn conflicting() -> &'static RecordDescriptor {
            static DESCRIPTOR: std::sync::OnceLock<&'static RecordDescriptor> =
                std::sync::OnceLock::new();
            *DESCRIPTOR.get_or_init(|| leaked("Row", "c"))
        }

        let catalog = SchemaCatalog::new();
        catalog.register_descriptor(leaked("Row", "a")).unwrap();

        let parent: &'static RecordDescriptor = Box::leak(Box::new(RecordDescriptor {
            type_id: RecordTypeId::from_static("app::Parent"),
            type_name: "Parent",
            table_name: None,
            fields: Vec::new(),
            dependencies: vec![conflicting],
        }));
        assert!(catalog.register_descriptor(parent).is_err());
        assert!(!catalog.is_registered(&RecordTypeId::from_static("app::Parent")));
        assert_eq!(catalog.len(), 1);
    }
}
