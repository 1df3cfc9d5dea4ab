//! Copy-on-write backing storage for a [`Simulator`](crate::allocator::Allocator) implementer.
//!
//! [`SpaceTime`] is a [`Allocator`] whose every object and array is addressable both in the
//! present and, through a [`SnapshotId`], in any past state it was ever snapshotted in. Taking a
//! snapshot is O(number of live objects): every live page gets its reference count bumped rather
//! than copied, and a page is only actually duplicated the first time a mutation would otherwise
//! be observed by an older snapshot (copy-on-write, implemented by [`table`] and
//! [`array_storage`]).

pub mod allocator;
pub(crate) mod array_storage;
pub mod errors;
pub(crate) mod ids;
pub(crate) mod snapshot;
pub(crate) mod table;
pub(crate) mod typemap;

use std::ops::RangeBounds;

use generational_arena::{Arena, Index};

use allocator::{Allocator, ArrayAccessor, ArrayAccessorMut};
use array_storage::Instance;
use errors::{InvalidIdError, InvalidSnapshotIdError};
pub use ids::SpaceTimeId;
use snapshot::{Snapshot, TypedInstance, TypedTablePtr};
use table::TableTrait;
use typemap::{ArrayStorageTypeMap, TableTypeMap};

/// Identifies a single, non-array, object held by a [`SpaceTime`].
pub type Id<T> = SpaceTimeId<T, false>;

/// Identifies an array of objects held by a [`SpaceTime`].
pub type ArrayId<T> = SpaceTimeId<T, true>;

/// Identifies a snapshot previously made with [`SpaceTime::make_snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId {
    index: Index,
}

impl SnapshotId {
    fn new(index: Index) -> Self {
        Self { index }
    }
}

/// Copy-on-write, snapshot-able backing storage.
///
/// `SpaceTime` implements [`Allocator`]: consumers allocate objects and arrays through it exactly
/// like they would through any other arena, but may additionally call [`Self::make_snapshot`] to
/// freeze the current state under a [`SnapshotId`], and later [`Self::checkout`] that state back
/// into the present.
///
/// Every object and array keeps the same [`Id`]/[`ArrayId`] for its entire lifetime, independent
/// of how many snapshots are taken or checked out; only the data backing that id changes.
#[derive(Debug, Default)]
pub struct SpaceTime {
    tables: TableTypeMap,
    array_storages: ArrayStorageTypeMap,
    objects: Arena<TypedTablePtr>,
    array_objects: Arena<TypedInstance>,
    snapshots: Arena<Snapshot>,
}

impl SpaceTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freezes the current state of every live object and array, returning an id that can later be
    /// passed to [`Self::checkout`] to restore it.
    ///
    /// This is cheap: no data is copied, only reference counts of the pages backing each live
    /// object are incremented.
    pub fn make_snapshot(&mut self) -> SnapshotId {
        let mut snapshot = Snapshot::new();

        for (index, entry) in self.objects.iter() {
            let table = self
                .tables
                .get_with_id_mut(entry.type_id)
                .expect("a live object must have a table for its type");
            let table_ptr = table.clone_table_ptr(&entry.table_ptr);
            snapshot.insert_table_ptr(index, table_ptr, entry.type_id);
        }

        for (index, entry) in self.array_objects.iter() {
            let storage = self
                .array_storages
                .get_with_id_mut(entry.type_id)
                .expect("a live array must have a storage for its type");
            let instance = storage.clone_instance(&entry.instance);
            snapshot.insert_instance(index, instance, entry.type_id);
        }

        SnapshotId::new(self.snapshots.insert(snapshot))
    }

    /// Restores every object and array to the state it was in when `id` was made with
    /// [`Self::make_snapshot`].
    ///
    /// `id` remains valid and may be checked out again, or dropped later with
    /// [`Self::drop_snapshot`].
    ///
    /// # Panics
    ///
    /// This requires that no object or array alive at the time of the snapshot has since been
    /// removed from this `SpaceTime` (objects and arrays created after the snapshot are left
    /// untouched). [`Ram`](crate) and the other resources this crate backs never remove an object
    /// mid-simulation, only at teardown, so this invariant always holds in practice; violating it
    /// is a programmer error and panics rather than silently dropping state.
    pub fn checkout(&mut self, id: SnapshotId) -> Result<(), InvalidSnapshotIdError> {
        if !self.snapshots.contains(id.index) {
            return Err(InvalidSnapshotIdError);
        }

        let indices: Vec<Index> = self.objects.iter().map(|(index, _)| index).collect();
        for index in indices {
            let Some(snapshot_entry) = self.snapshots[id.index]
                .iter_table_ptrs()
                .find(|(i, _)| *i == index)
                .map(|(_, e)| e)
            else {
                continue;
            };
            let type_id = snapshot_entry.type_id;
            let table = self
                .tables
                .get_with_id_mut(type_id)
                .expect("snapshotted object must have a table for its type");
            let cloned = table.clone_table_ptr(&snapshot_entry.table_ptr);

            let entry = &mut self.objects[index];
            let old_type_id = entry.type_id;
            let old_ptr = std::mem::replace(&mut entry.table_ptr, cloned);
            entry.type_id = type_id;

            if old_type_id == type_id {
                table.drop_table_ptr(old_ptr);
            } else {
                self.tables
                    .get_with_id_mut(old_type_id)
                    .expect("live object must have a table for its type")
                    .drop_table_ptr(old_ptr);
            }
        }

        let array_indices: Vec<Index> = self.array_objects.iter().map(|(index, _)| index).collect();
        for index in array_indices {
            let Some(snapshot_entry) = self.snapshots[id.index]
                .iter_instances()
                .find(|(i, _)| *i == index)
                .map(|(_, e)| e)
            else {
                continue;
            };
            let type_id = snapshot_entry.type_id;
            let storage = self
                .array_storages
                .get_with_id_mut(type_id)
                .expect("snapshotted array must have a storage for its type");
            let cloned = storage.clone_instance(&snapshot_entry.instance);

            let entry = &mut self.array_objects[index];
            let old_type_id = entry.type_id;
            let old_instance = std::mem::replace(&mut entry.instance, cloned);
            entry.type_id = type_id;

            if old_type_id == type_id {
                storage.drop_instance(old_instance);
            } else {
                self.array_storages
                    .get_with_id_mut(old_type_id)
                    .expect("live array must have a storage for its type")
                    .drop_instance(old_instance);
            }
        }

        Ok(())
    }

    /// Discards a snapshot, releasing the references it held on the pages it shared with the live
    /// state (or with other snapshots).
    pub fn drop_snapshot(&mut self, id: SnapshotId) -> Result<(), InvalidSnapshotIdError> {
        let snapshot = self.snapshots.remove(id.index).ok_or(InvalidSnapshotIdError)?;
        let (table_ptrs, instances) = snapshot.into_iterators();

        for (_, entry) in table_ptrs {
            if let Some(table) = self.tables.get_with_id_mut(entry.type_id) {
                table.drop_table_ptr(entry.table_ptr);
            }
        }
        for (_, entry) in instances {
            if let Some(storage) = self.array_storages.get_with_id_mut(entry.type_id) {
                storage.drop_instance(entry.instance);
            }
        }

        Ok(())
    }
}

impl Allocator for SpaceTime {
    type Id<T> = Id<T>;
    type ArrayId<T> = ArrayId<T>;

    fn insert<T: Clone + 'static>(&mut self, object: T) -> Self::Id<T> {
        let (type_id, table) = self.tables.get_or_default_mut::<T>();
        let table_ptr = table.add_item(object);
        let index = self.objects.insert(TypedTablePtr { table_ptr, type_id });
        Id::new(index)
    }

    fn insert_array<T: Copy + 'static>(&mut self, object: T, n: usize) -> Self::ArrayId<T> {
        let (type_id, storage) = self.array_storages.get_or_default_mut::<T>();
        let instance = storage.new_instance(object, n as u64);
        let index = self.array_objects.insert(TypedInstance { instance, type_id });
        ArrayId::new(index)
    }

    fn remove<T: Clone + 'static>(&mut self, id: Self::Id<T>) -> Result<(), InvalidIdError> {
        let entry = self.objects.remove(id.index).ok_or(InvalidIdError)?;
        if let Some(table) = self.tables.get_with_id_mut(entry.type_id) {
            table.drop_table_ptr(entry.table_ptr);
        }
        Ok(())
    }

    fn remove_array<T: Copy + 'static>(&mut self, id: Self::ArrayId<T>) -> Result<(), InvalidIdError> {
        let entry = self.array_objects.remove(id.index).ok_or(InvalidIdError)?;
        if let Some(storage) = self.array_storages.get_with_id_mut(entry.type_id) {
            storage.drop_instance(entry.instance);
        }
        Ok(())
    }

    fn pop<T: Clone + 'static>(&mut self, id: Self::Id<T>) -> Result<T, InvalidIdError> {
        let entry = self.objects.remove(id.index).ok_or(InvalidIdError)?;
        let table = self
            .tables
            .get_mut::<T>()
            .expect("live object must have a table for its type");
        Ok(table.pop_or_get_item(entry.table_ptr))
    }

    fn get<T: Clone + 'static>(&self, id: Self::Id<T>) -> Result<&T, InvalidIdError> {
        let entry = self.objects.get(id.index).ok_or(InvalidIdError)?;
        let table = self.tables.get::<T>().ok_or(InvalidIdError)?;
        Ok(table.get_item(&entry.table_ptr))
    }

    fn get_array<'a, T: 'a + Copy + 'static>(
        &'a self,
        id: Self::ArrayId<T>,
    ) -> Result<impl ArrayAccessor<'a, T>, InvalidIdError> {
        let entry = self.array_objects.get(id.index).ok_or(InvalidIdError)?;
        let storage = self.array_storages.get::<T>().ok_or(InvalidIdError)?;
        Ok(ImmutableArrayAccessor {
            storage,
            instance: &entry.instance,
        })
    }

    fn get_mut<T: Clone + 'static>(&mut self, id: Self::Id<T>) -> Result<&mut T, InvalidIdError> {
        let entry = self.objects.get_mut(id.index).ok_or(InvalidIdError)?;
        let table = self.tables.get_mut::<T>().ok_or(InvalidIdError)?;

        if !table.is_unique_table_ptr(&entry.table_ptr) {
            let duplicate = entry.table_ptr.unsafe_clone();
            entry.table_ptr = table.clone_item(duplicate, T::clone);
        }

        Ok(table
            .get_item_mut(&entry.table_ptr)
            .expect("table_ptr was just made unique"))
    }

    fn get_array_mut<'a, T: 'a + Copy + 'static>(
        &'a mut self,
        id: Self::ArrayId<T>,
    ) -> Result<impl ArrayAccessorMut<'a, T>, InvalidIdError> {
        let entry = self.array_objects.get_mut(id.index).ok_or(InvalidIdError)?;
        let storage = self.array_storages.get_mut::<T>().ok_or(InvalidIdError)?;
        Ok(MutableArrayAccessor::new(storage, &mut entry.instance))
    }
}

fn range_to_start_len(range: impl RangeBounds<usize>, total_len: usize) -> Option<(usize, usize)> {
    use std::ops::Bound::*;

    let start = match range.start_bound() {
        Included(&s) => s,
        Excluded(&s) => s + 1,
        Unbounded => 0,
    };
    let end = match range.end_bound() {
        Included(&e) => e + 1,
        Excluded(&e) => e,
        Unbounded => total_len,
    };
    if start > end || end > total_len {
        return None;
    }
    Some((start, end - start))
}

struct ImmutableArrayAccessor<'a, T: Copy + 'static> {
    storage: &'a array_storage::ArrayStorage<T>,
    instance: &'a Instance,
}

impl<'a, T: Copy + 'static> ArrayAccessor<'a, T> for ImmutableArrayAccessor<'a, T> {
    fn len(&self) -> usize {
        self.instance.len() as usize
    }

    fn get(&self, index: usize) -> Option<T> {
        self.instance.get(self.storage, index as u64).copied()
    }

    fn get_ref(&self, index: usize) -> Option<&'a T> {
        self.instance.get(self.storage, index as u64)
    }

    fn read(&self, buf: &mut [T], index: usize) -> bool {
        self.instance.read(self.storage, buf, index as u64)
    }

    fn iter_range<R>(&self, index_range: R) -> Option<impl IntoIterator<Item = &'a T> + 'a>
    where
        R: RangeBounds<usize>,
    {
        let (start, len) = range_to_start_len(index_range, self.len())?;
        self.instance.iter_range(self.storage, start as u64, len as u64)
    }
}

/// Grants repeated, independently-resolved `&mut` access through a `&self` method, as required by
/// [`ArrayAccessorMut`]. Built once from the unique `&'a mut` borrows of the storage and instance;
/// every accessor method reborrows through a raw pointer instead of re-acquiring `&mut self`.
///
/// # Safety invariant
///
/// Callers of [`ArrayAccessorMut`] must not hold two live `&mut T` (or overlapping ranges from
/// [`ArrayAccessorMut::iter_range_mut`]) borrowed from the same accessor at once; that is the
/// caller contract the trait itself documents ("often very expensive", implying exclusive,
/// one-at-a-time use), which this type relies on to stay sound.
struct MutableArrayAccessor<'a, T: Copy + 'static> {
    storage: *mut array_storage::ArrayStorage<T>,
    instance: *mut Instance,
    _marker: std::marker::PhantomData<&'a mut ()>,
}

impl<'a, T: Copy + 'static> MutableArrayAccessor<'a, T> {
    fn new(storage: &'a mut array_storage::ArrayStorage<T>, instance: &'a mut Instance) -> Self {
        Self {
            storage,
            instance,
            _marker: std::marker::PhantomData,
        }
    }

    fn storage(&self) -> &'a array_storage::ArrayStorage<T> {
        // Safety: `storage` was derived from a unique `&'a mut` at construction and this type is
        // not `Clone`, so no other live reference to the pointee can exist.
        unsafe { &*self.storage }
    }

    fn storage_mut(&self) -> &'a mut array_storage::ArrayStorage<T> {
        // Safety: see `Self::storage`.
        unsafe { &mut *self.storage }
    }

    fn instance(&self) -> &'a Instance {
        // Safety: see `Self::storage`.
        unsafe { &*self.instance }
    }

    fn instance_mut(&self) -> &'a mut Instance {
        // Safety: see `Self::storage`.
        unsafe { &mut *self.instance }
    }
}

impl<'a, T: Copy + 'static> ArrayAccessor<'a, T> for MutableArrayAccessor<'a, T> {
    fn len(&self) -> usize {
        self.instance().len() as usize
    }

    fn get(&self, index: usize) -> Option<T> {
        self.instance().get(self.storage(), index as u64).copied()
    }

    fn get_ref(&self, index: usize) -> Option<&'a T> {
        self.instance().get(self.storage(), index as u64)
    }

    fn read(&self, buf: &mut [T], index: usize) -> bool {
        self.instance().read(self.storage(), buf, index as u64)
    }

    fn iter_range<R>(&self, index_range: R) -> Option<impl IntoIterator<Item = &'a T> + 'a>
    where
        R: RangeBounds<usize>,
    {
        let (start, len) = range_to_start_len(index_range, self.len())?;
        self.instance().iter_range(self.storage(), start as u64, len as u64)
    }
}

impl<'a, T: Copy + 'static> ArrayAccessorMut<'a, T> for MutableArrayAccessor<'a, T> {
    fn get_mut(&self, index: usize) -> Option<&'a mut T> {
        if index >= self.len() {
            return None;
        }
        self.instance_mut().get_mut(self.storage_mut(), index as u64)
    }

    fn set(&self, index: usize, value: T) -> bool {
        match self.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn write(&self, index: usize, buf: &[T]) -> bool {
        self.instance_mut().write(self.storage_mut(), index as u64, buf)
    }

    fn iter_range_mut<R>(&self, index_range: R) -> Option<impl IntoIterator<Item = &'a mut T> + 'a>
    where
        R: RangeBounds<usize>,
    {
        let (start, len) = range_to_start_len(index_range, self.len())?;
        let storage = self.storage_mut();
        let instance = self.instance_mut();
        let mut items = Vec::with_capacity(len);
        for i in start..(start + len) {
            items.push(instance.get_mut(storage, i as u64)?);
        }
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut space_time = SpaceTime::new();
        let id = space_time.insert(42u32);
        assert_eq!(space_time.get(id), Ok(&42));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut space_time = SpaceTime::new();
        let id = space_time.insert(1u32);
        *space_time.get_mut(id).unwrap() = 2;
        assert_eq!(space_time.get(id), Ok(&2));
    }

    #[test]
    fn remove_then_get_is_invalid() {
        let mut space_time = SpaceTime::new();
        let id = space_time.insert(1u32);
        space_time.remove(id).unwrap();
        assert_eq!(space_time.get(id), Err(InvalidIdError));
    }

    #[test]
    fn snapshot_and_checkout_restores_mutation() {
        let mut space_time = SpaceTime::new();
        let id = space_time.insert(10u32);

        let snapshot = space_time.make_snapshot();
        *space_time.get_mut(id).unwrap() = 20;
        assert_eq!(space_time.get(id), Ok(&20));

        space_time.checkout(snapshot).unwrap();
        assert_eq!(space_time.get(id), Ok(&10));
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut space_time = SpaceTime::new();
        let array = space_time.insert_array(0u8, 8);
        space_time.get_array_mut(array).unwrap().set(0, 1);

        let snapshot = space_time.make_snapshot();
        space_time.get_array_mut(array).unwrap().set(0, 2);

        assert_eq!(space_time.get_array(array).unwrap().get(0), Some(2));
        space_time.checkout(snapshot).unwrap();
        assert_eq!(space_time.get_array(array).unwrap().get(0), Some(1));
    }

    #[test]
    fn drop_snapshot_allows_pages_to_be_reused() {
        let mut space_time = SpaceTime::new();
        let id = space_time.insert(1u32);
        let snapshot = space_time.make_snapshot();
        space_time.drop_snapshot(snapshot).unwrap();
        assert!(space_time.checkout(snapshot).is_err());
        assert_eq!(space_time.get(id), Ok(&1));
    }

    #[test]
    fn array_read_write_roundtrip() {
        let mut space_time = SpaceTime::new();
        let array = space_time.insert_array(0u32, 16);

        {
            let accessor = space_time.get_array_mut(array).unwrap();
            assert!(accessor.write(4, &[1, 2, 3, 4]));
        }

        let accessor = space_time.get_array(array).unwrap();
        assert_eq!(accessor.get(4), Some(1));
        assert_eq!(accessor.get(7), Some(4));
        assert_eq!(accessor.get(8), Some(0));
    }
}
