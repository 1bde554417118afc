use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Numeric identifier tagged with the kind of entity it refers to.
///
/// Ordering is by the numeric value, which is the tie-break used by every
/// embedding algorithm ("lowest id wins").
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Id<T> {
    pub id: u32,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub const fn new(id: u32) -> Self {
        Id { id, _marker: PhantomData }
    }
}

// Manual impls, derives would require `T: Clone/Copy` on the zero-sized tag.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<u32> for Id<T> {
    fn from(id: u32) -> Self {
        Id::new(id)
    }
}

impl<T> From<Id<T>> for u32 {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {}", display_name, self.id)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct SubstrateNodeTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct SubstrateLinkTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct VnrTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct VirtualNodeTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct VirtualLinkTag;

pub type SubstrateNodeId = Id<SubstrateNodeTag>;
pub type SubstrateLinkId = Id<SubstrateLinkTag>;
pub type VnrId = Id<VnrTag>;
pub type VirtualNodeId = Id<VirtualNodeTag>;
pub type VirtualLinkId = Id<VirtualLinkTag>;
