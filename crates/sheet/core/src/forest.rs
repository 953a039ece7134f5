//! Arena storage for rooted trait forests.
//!
//! Nodes live in a slot vector and are addressed by [`NodeId`]. Parents own their
//! children: removing a node frees its whole subtree. Ids of removed nodes are
//! never reused, so a stale id simply resolves to `None`.
//!
//! For persistence a forest converts to and from nested [`Row`]s.

/// Index of a node inside one [`Forest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq)]
struct Slot<T> {
    data: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Forest<T> {
    slots: Vec<Option<Slot<T>>>,
    roots: Vec<NodeId>,
}

impl<T> Default for Forest<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            roots: Vec::new(),
        }
    }
}

/// Nested persistence form of a forest node.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(deserialize = "T: serde::Deserialize<'de>")))]
pub struct Row<T> {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub data: T,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<Row<T>>,
}

impl<T> Row<T> {
    pub fn leaf(data: T) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    pub fn container(data: T, children: Vec<Row<T>>) -> Self {
        Self { data, children }
    }
}

impl<T> Forest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Inserts `data` as the last child of `parent`, or as a root.
    ///
    /// A stale `parent` id inserts at the root level.
    pub fn insert(&mut self, parent: Option<NodeId>, data: T) -> NodeId {
        let id = NodeId(u32::try_from(self.slots.len()).unwrap_or(u32::MAX));
        let parent = parent.filter(|&p| self.contains(p));
        self.slots.push(Some(Slot {
            data,
            parent,
            children: Vec::new(),
        }));
        match parent.and_then(|p| self.slot_mut(p)) {
            Some(slot) => slot.children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn push_root(&mut self, data: T) -> NodeId {
        self.insert(None, data)
    }

    pub fn push_child(&mut self, parent: NodeId, data: T) -> NodeId {
        self.insert(Some(parent), data)
    }

    /// Removes a node and its whole subtree, returning the node's data.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.0 as usize)?.take()?;
        match slot.parent.and_then(|p| self.slot_mut(p)) {
            Some(parent) => parent.children.retain(|&child| child != id),
            None => self.roots.retain(|&root| root != id),
        }
        let mut pending = slot.children;
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.slots.get_mut(child.0 as usize).and_then(Option::take) {
                pending.extend(removed.children);
            }
        }
        Some(slot.data)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    fn slot(&self, id: NodeId) -> Option<&Slot<T>> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot<T>> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slot(id).map(|slot| &slot.data)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slot_mut(id).map(|slot| &mut slot.data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|slot| slot.children.as_slice()).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    /// Node ids in depth-first pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.ids_where(|_| true)
    }

    /// Pre-order ids, skipping the subtree of every node for which `descend`
    /// returns false.
    pub fn ids_where(&self, mut descend: impl FnMut(&T) -> bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slot(id) else { continue };
            if !descend(&slot.data) {
                continue;
            }
            out.push(id);
            stack.extend(slot.children.iter().rev().copied());
        }
        out
    }

    /// Pre-order iteration over `(id, data)`.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.ids()
            .into_iter()
            .filter_map(move |id| self.get(id).map(|data| (id, data)))
    }

    /// Builds a forest from nested rows, preserving order.
    pub fn from_rows(rows: Vec<Row<T>>) -> Self {
        let mut forest = Self::new();
        let mut pending: Vec<(Option<NodeId>, Row<T>)> =
            rows.into_iter().rev().map(|row| (None, row)).collect();
        while let Some((parent, row)) = pending.pop() {
            let id = forest.insert(parent, row.data);
            pending.extend(row.children.into_iter().rev().map(|child| (Some(id), child)));
        }
        forest
    }
}

impl<T: Clone> Forest<T> {
    /// Converts back to nested rows.
    pub fn to_rows(&self) -> Vec<Row<T>> {
        self.roots.iter().filter_map(|&id| self.row(id)).collect()
    }

    fn row(&self, id: NodeId) -> Option<Row<T>> {
        let slot = self.slot(id)?;
        Some(Row {
            data: slot.data.clone(),
            children: slot.children.iter().filter_map(|&child| self.row(child)).collect(),
        })
    }
}

#[cfg(feature = "serde")]
impl<T: Clone + serde::Serialize> serde::Serialize for Forest<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde::Serialize::serialize(&self.to_rows(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for Forest<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <Vec<Row<T>> as serde::Deserialize>::deserialize(deserializer).map(Self::from_rows)
    }
}
