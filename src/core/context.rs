//! Copy-on-write context updates.
//!
//! Contexts are plain values. Updating one never touches the original: the
//! draft form clones the context and lets a recipe mutate the clone, the
//! producer form builds a new value from a reference to the old one.
//!
//! Cloning is shallow for any substructure held behind an [`Arc`](std::sync::Arc),
//! so large collections are shared between the old and new context until a
//! recipe writes to them through [`Arc::make_mut`](std::sync::Arc::make_mut).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Data carried by a machine instance between transitions.
///
/// Blanket-implemented for every type with the required capabilities.
pub trait Context:
    Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Context for T where
    T: Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Apply `recipe` to a draft of `context` and return the committed draft.
///
/// # Example
///
/// ```rust
/// use statecraft::core::context::update;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Train { passengers: u32, fuel: u32 }
///
/// let before = Train { passengers: 0, fuel: 100 };
/// let after = update(&before, |draft| draft.passengers += 50);
///
/// assert_eq!(before.passengers, 0);
/// assert_eq!(after.passengers, 50);
/// assert_eq!(after.fuel, 100);
/// ```
pub fn update<C, F>(context: &C, recipe: F) -> C
where
    C: Clone,
    F: FnOnce(&mut C),
{
    let mut draft = context.clone();
    recipe(&mut draft);
    draft
}

/// Build a new context from the old one.
pub fn replace<C, F>(context: &C, recipe: F) -> C
where
    F: FnOnce(&C) -> C,
{
    recipe(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    struct Ledger {
        owner: String,
        entries: Arc<Vec<u32>>,
        tags: Arc<Vec<String>>,
    }

    fn ledger() -> Ledger {
        Ledger {
            owner: "ops".to_string(),
            entries: Arc::new(vec![1, 2, 3]),
            tags: Arc::new(vec!["a".to_string()]),
        }
    }

    #[test]
    fn update_leaves_original_untouched() {
        let before = ledger();
        let after = update(&before, |draft| {
            draft.owner = "finance".to_string();
            Arc::make_mut(&mut draft.entries).push(4);
        });

        assert_eq!(before.owner, "ops");
        assert_eq!(*before.entries, vec![1, 2, 3]);
        assert_eq!(after.owner, "finance");
        assert_eq!(*after.entries, vec![1, 2, 3, 4]);
    }

    #[test]
    fn unrelated_substructures_are_shared() {
        let before = ledger();
        let after = update(&before, |draft| {
            Arc::make_mut(&mut draft.entries).clear();
        });

        assert!(Arc::ptr_eq(&before.tags, &after.tags));
        assert!(!Arc::ptr_eq(&before.entries, &after.entries));
    }

    #[test]
    fn later_drafts_do_not_leak_into_earlier_values() {
        let first = ledger();
        let second = update(&first, |draft| draft.owner = "second".to_string());
        let third = update(&second, |draft| {
            Arc::make_mut(&mut draft.tags).push("b".to_string());
        });

        assert_eq!(first, ledger());
        assert_eq!(second.tags.len(), 1);
        assert_eq!(third.tags.len(), 2);
    }

    #[test]
    fn replace_builds_from_old_value() {
        let before = ledger();
        let after = replace(&before, |old| Ledger {
            owner: old.owner.to_uppercase(),
            ..old.clone()
        });

        assert_eq!(after.owner, "OPS");
        assert_eq!(before.owner, "ops");
        assert!(Arc::ptr_eq(&before.entries, &after.entries));
    }
}
