//! cJSON-style item tree with pluggable allocation hooks.
//!
//! Every node, key and string value is accounted through an [`AllocHooks`]
//! implementation, so a test can check that deleting a tree releases exactly
//! what building it acquired.

use focalkit_harness::{
    CallRecorder, Suite, TestContext, expect_eq, expect_err, expect_ok, expect_some, expect_true,
};

pub const SUITE: &str = "json_tree";

/// What an allocation hook call was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Allocation {
    Item,
    Key,
    ValueString,
}

pub trait AllocHooks {
    fn allocate(&mut self, kind: Allocation);
    fn deallocate(&mut self, kind: Allocation);
}

/// Hooks that record every allocation and deallocation.
#[derive(Debug, Default)]
pub struct CountingHooks {
    pub allocations: CallRecorder<Allocation>,
    pub deallocations: CallRecorder<Allocation>,
}

impl CountingHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn balanced(&self) -> bool {
        self.allocations.count() == self.deallocations.count()
    }
}

impl AllocHooks for CountingHooks {
    fn allocate(&mut self, kind: Allocation) {
        self.allocations.record(kind);
    }

    fn deallocate(&mut self, kind: Allocation) {
        self.deallocations.record(kind);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Object,
    Array,
    Number,
    String,
}

/// One node of the tree. Children are owned; deleting a node deletes them.
#[derive(Debug, PartialEq)]
pub struct Item {
    kind: ItemType,
    key: Option<String>,
    value_string: Option<String>,
    number: f64,
    children: Vec<Item>,
}

impl Item {
    fn alloc(hooks: &mut impl AllocHooks, kind: ItemType) -> Self {
        hooks.allocate(Allocation::Item);
        Self {
            kind,
            key: None,
            value_string: None,
            number: 0.0,
            children: Vec::new(),
        }
    }

    pub fn create_object(hooks: &mut impl AllocHooks) -> Self {
        Self::alloc(hooks, ItemType::Object)
    }

    pub fn create_array(hooks: &mut impl AllocHooks) -> Self {
        Self::alloc(hooks, ItemType::Array)
    }

    pub fn create_number(hooks: &mut impl AllocHooks, number: f64) -> Self {
        let mut item = Self::alloc(hooks, ItemType::Number);
        item.number = number;
        item
    }

    pub fn create_string(hooks: &mut impl AllocHooks, value: &str) -> Self {
        let mut item = Self::alloc(hooks, ItemType::String);
        hooks.allocate(Allocation::ValueString);
        item.value_string = Some(value.to_string());
        item
    }

    #[must_use]
    pub fn kind(&self) -> ItemType {
        self.kind
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use]
    pub fn number(&self) -> f64 {
        self.number
    }

    #[must_use]
    pub fn value_str(&self) -> Option<&str> {
        self.value_string.as_deref()
    }

    /// Append `item`. A non-container hands the item back.
    pub fn add_item_to_array(&mut self, item: Item) -> Result<(), Item> {
        if !matches!(self.kind, ItemType::Array | ItemType::Object) {
            return Err(item);
        }
        self.children.push(item);
        Ok(())
    }

    /// Attach `item` under a freshly allocated copy of `key`.
    pub fn add_item_to_object(
        &mut self,
        hooks: &mut impl AllocHooks,
        key: &str,
        mut item: Item,
    ) -> Result<(), Item> {
        if self.kind != ItemType::Object {
            return Err(item);
        }
        if item.key.take().is_some() {
            hooks.deallocate(Allocation::Key);
        }
        hooks.allocate(Allocation::Key);
        item.key = Some(key.to_string());
        self.children.push(item);
        Ok(())
    }

    #[must_use]
    pub fn get_array_item(&self, index: usize) -> Option<&Item> {
        self.children.get(index)
    }

    #[must_use]
    pub fn get_object_item(&self, key: &str) -> Option<&Item> {
        self.children.iter().find(|c| c.key.as_deref() == Some(key))
    }

    #[must_use]
    pub fn array_size(&self) -> usize {
        self.children.len()
    }

    /// Replace the element at `which`, deleting the old one through `hooks`.
    ///
    /// A negative or out-of-range index leaves the array unchanged and hands
    /// the replacement back.
    pub fn replace_item_in_array(
        &mut self,
        hooks: &mut impl AllocHooks,
        which: i32,
        replacement: Item,
    ) -> Result<(), Item> {
        let Ok(index) = usize::try_from(which) else {
            return Err(replacement);
        };
        let Some(slot) = self.children.get_mut(index) else {
            return Err(replacement);
        };
        let old = std::mem::replace(slot, replacement);
        old.delete(hooks);
        Ok(())
    }

    /// Release this item: children first, then its string value, key and node.
    pub fn delete(self, hooks: &mut impl AllocHooks) {
        for child in self.children {
            child.delete(hooks);
        }
        if self.value_string.is_some() {
            hooks.deallocate(Allocation::ValueString);
        }
        if self.key.is_some() {
            hooks.deallocate(Allocation::Key);
        }
        hooks.deallocate(Allocation::Item);
    }
}

fn number_array(hooks: &mut CountingHooks, values: &[f64]) -> Item {
    let mut array = Item::create_array(hooks);
    for &v in values {
        let item = Item::create_number(hooks, v);
        // An array always accepts children.
        let _ = array.add_item_to_array(item);
    }
    array
}

fn numbers(array: &Item) -> Vec<f64> {
    (0..array.array_size())
        .filter_map(|i| array.get_array_item(i))
        .map(Item::number)
        .collect()
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

fn delete_counts(ctx: &mut TestContext<'_>) {
    let mut hooks = CountingHooks::new();
    let mut root = Item::create_object(&mut hooks);
    let child = Item::create_string(&mut hooks, "childValue");
    expect_ok!(ctx, root.add_item_to_object(&mut hooks, "childKey", child));
    expect_eq!(ctx, hooks.allocations.count(), 4);

    if let Some(child) = expect_some!(ctx, root.get_object_item("childKey")) {
        expect_eq!(ctx, child.value_str(), Some("childValue"));
    }

    root.delete(&mut hooks);
    expect_eq!(ctx, hooks.deallocations.count(), 4, "exactly four deallocations");
    expect_eq!(
        ctx,
        hooks.deallocations.calls(),
        [
            Allocation::ValueString,
            Allocation::Key,
            Allocation::Item,
            Allocation::Item,
        ]
        .as_slice()
    );
    expect_true!(ctx, hooks.balanced());
}

fn replace_first(ctx: &mut TestContext<'_>) {
    let mut hooks = CountingHooks::new();
    let mut array = number_array(&mut hooks, &[1.0, 2.0, 3.0]);
    let replacement = Item::create_number(&mut hooks, 10.0);
    expect_ok!(ctx, array.replace_item_in_array(&mut hooks, 0, replacement));
    expect_eq!(ctx, numbers(&array), vec![10.0, 2.0, 3.0]);
    expect_eq!(ctx, hooks.deallocations.count(), 1, "old item deleted");
    array.delete(&mut hooks);
    expect_true!(ctx, hooks.balanced());
}

fn replace_last(ctx: &mut TestContext<'_>) {
    let mut hooks = CountingHooks::new();
    let mut array = number_array(&mut hooks, &[4.0, 5.0, 6.0]);
    let replacement = Item::create_number(&mut hooks, 7.0);
    expect_ok!(ctx, array.replace_item_in_array(&mut hooks, 2, replacement));
    expect_eq!(ctx, array.array_size(), 3);
    expect_eq!(ctx, numbers(&array), vec![4.0, 5.0, 7.0]);
    array.delete(&mut hooks);
    expect_true!(ctx, hooks.balanced());
}

fn replace_negative_index(ctx: &mut TestContext<'_>) {
    let mut hooks = CountingHooks::new();
    let mut array = number_array(&mut hooks, &[1.0, 2.0]);
    let replacement = Item::create_number(&mut hooks, 99.0);
    if let Some(returned) = expect_err!(ctx, array.replace_item_in_array(&mut hooks, -1, replacement)) {
        expect_eq!(ctx, returned.number(), 99.0);
        returned.delete(&mut hooks);
    }
    expect_eq!(ctx, numbers(&array), vec![1.0, 2.0]);
    array.delete(&mut hooks);
    expect_true!(ctx, hooks.balanced());
}

fn replace_out_of_bounds(ctx: &mut TestContext<'_>) {
    let mut hooks = CountingHooks::new();
    let mut array = number_array(&mut hooks, &[1.0, 2.0, 3.0]);
    let replacement = Item::create_number(&mut hooks, 99.0);
    if let Some(returned) = expect_err!(ctx, array.replace_item_in_array(&mut hooks, 5, replacement)) {
        returned.delete(&mut hooks);
    }
    expect_eq!(ctx, numbers(&array), vec![1.0, 2.0, 3.0]);
    expect_eq!(ctx, hooks.deallocations.count(), 1);
    array.delete(&mut hooks);
    expect_true!(ctx, hooks.balanced());
}

#[must_use]
pub fn suite() -> Suite {
    Suite::new(SUITE, "cJSON_Delete / cJSON_ReplaceItemInArray")
        .case(
            "delete_counts",
            "deleting {\"childKey\":\"childValue\"} releases four allocations",
            delete_counts,
        )
        .case("replace_first", "replace index 0 of [1,2,3]", replace_first)
        .case("replace_last", "replace index 2 of [4,5,6]", replace_last)
        .case(
            "replace_negative_index",
            "index -1 is rejected and the array is unchanged",
            replace_negative_index,
        )
        .case(
            "replace_out_of_bounds",
            "index 5 of a 3-element array is rejected",
            replace_out_of_bounds,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_cannot_take_children() {
        let mut hooks = CountingHooks::new();
        let mut number = Item::create_number(&mut hooks, 1.0);
        let child = Item::create_number(&mut hooks, 2.0);
        let back = number.add_item_to_array(child).unwrap_err();
        assert_eq!(back.number(), 2.0);
        let key_child = Item::create_object(&mut hooks);
        assert!(
            number
                .add_item_to_object(&mut hooks, "k", key_child)
                .is_err()
        );
    }

    #[test]
    fn rekeying_releases_the_old_key() {
        let mut hooks = CountingHooks::new();
        let mut a = Item::create_object(&mut hooks);
        let mut b = Item::create_object(&mut hooks);
        let leaf = Item::create_number(&mut hooks, 3.0);
        a.add_item_to_object(&mut hooks, "first", leaf).unwrap();
        let leaf = a.children.pop().unwrap();
        b.add_item_to_object(&mut hooks, "second", leaf).unwrap();
        assert_eq!(hooks.deallocations.calls(), [Allocation::Key]);
        assert_eq!(b.get_object_item("second").map(Item::number), Some(3.0));
        a.delete(&mut hooks);
        b.delete(&mut hooks);
        assert!(hooks.balanced());
    }
}
