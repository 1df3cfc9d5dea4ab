use std::collections::HashMap;

use generational_arena::Index;

use crate::typemap::TypeId;
use crate::{array_storage::Instance, table::TablePtr};

/// We have to store the TypeId, for the TablePtr's to know what table in the TypeMap the ref
/// count needs to be increased/decreased in when cloning/removing snapshot.
#[derive(Debug)]
pub(crate) struct TypedTablePtr {
    pub(crate) table_ptr: TablePtr,
    pub(crate) type_id: TypeId,
}

#[derive(Debug)]
pub(crate) struct TypedInstance {
    pub(crate) instance: Instance,
    pub(crate) type_id: TypeId,
}

/// A frozen view of every live object, keyed by the same [`Index`] the live objects and arrays are
/// addressed by in [`crate::SpaceTime`]. Every entry shares its backing page(s) with the live
/// object through a bumped reference count, so taking a [`Snapshot`] is proportional to the number
/// of live objects, never to their size.
#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    table_ptrs: HashMap<Index, TypedTablePtr>,
    instances: HashMap<Index, TypedInstance>,
}

impl Snapshot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_table_ptr(&mut self, index: Index, table_ptr: TablePtr, type_id: TypeId) {
        self.table_ptrs.insert(index, TypedTablePtr { table_ptr, type_id });
    }

    pub(crate) fn insert_instance(&mut self, index: Index, instance: Instance, type_id: TypeId) {
        self.instances.insert(index, TypedInstance { instance, type_id });
    }

    pub(crate) fn iter_table_ptrs(&self) -> impl Iterator<Item = (Index, &TypedTablePtr)> {
        self.table_ptrs.iter().map(|(&index, entry)| (index, entry))
    }

    pub(crate) fn iter_instances(&self) -> impl Iterator<Item = (Index, &TypedInstance)> {
        self.instances.iter().map(|(&index, entry)| (index, entry))
    }

    pub(crate) fn into_iterators(
        self,
    ) -> (
        impl Iterator<Item = (Index, TypedTablePtr)>,
        impl Iterator<Item = (Index, TypedInstance)>,
    ) {
        (self.table_ptrs.into_iter(), self.instances.into_iter())
    }
}
