use std::collections::{BTreeMap, HashMap};

use crate::models::Drink;

/// Monotonic stamp handed to every request when it is issued.
pub type Generation = u64;

#[derive(Debug, Clone)]
struct Slot {
    generation: Generation,
    /// `None` once the drink has been deleted.
    drink: Option<Drink>,
}

/// The in-memory id → drink mapping.
///
/// Every write carries the generation of the request that produced it. An id
/// only accepts writes that are at least as new as the last one it applied,
/// so a slow response can't clobber the result of a later request. Deletes
/// leave a tombstone for the same reason. A tombstone only matters while a
/// request issued before it is still in flight; see
/// [`prune_tombstones`](Self::prune_tombstones).
#[derive(Debug, Default)]
pub struct DrinkCache {
    slots: HashMap<u64, Slot>,
}

impl DrinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge drinks into the cache, overwriting entries with the same id and
    /// leaving every other entry alone. Unsaved drinks are skipped.
    ///
    /// Returns how many drinks were applied.
    pub fn upsert<I>(&mut self, generation: Generation, drinks: I) -> usize
    where
        I: IntoIterator<Item = Drink>,
    {
        let mut applied = 0;
        for drink in drinks {
            let Some(id) = drink.id.persisted() else {
                continue;
            };
            if self.accepts(id, generation) {
                self.slots.insert(
                    id,
                    Slot {
                        generation,
                        drink: Some(drink),
                    },
                );
                applied += 1;
            }
        }
        applied
    }

    /// Drop the drink with `id`. Returns whether the removal was applied.
    pub fn remove(&mut self, generation: Generation, id: u64) -> bool {
        if !self.accepts(id, generation) {
            return false;
        }
        self.slots.insert(
            id,
            Slot {
                generation,
                drink: None,
            },
        );
        true
    }

    /// Forget tombstones older than every request still in flight. With
    /// nothing in flight every tombstone goes.
    ///
    /// Returns how many were dropped.
    pub fn prune_tombstones(&mut self, oldest_in_flight: Option<Generation>) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| match (&slot.drink, oldest_in_flight) {
            (Some(_), _) => true,
            (None, Some(oldest)) => slot.generation > oldest,
            (None, None) => false,
        });
        before - self.slots.len()
    }

    pub fn tombstones(&self) -> usize {
        self.slots.values().filter(|slot| slot.drink.is_none()).count()
    }

    fn accepts(&self, id: u64, generation: Generation) -> bool {
        self.slots
            .get(&id)
            .map_or(true, |slot| generation >= slot.generation)
    }

    pub fn get(&self, id: u64) -> Option<&Drink> {
        self.slots.get(&id).and_then(|slot| slot.drink.as_ref())
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &Drink)> {
        self.slots
            .iter()
            .filter_map(|(id, slot)| slot.drink.as_ref().map(|drink| (*id, drink)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the live entries, ordered by id for display.
    pub fn snapshot(&self) -> BTreeMap<u64, Drink> {
        self.iter().map(|(id, drink)| (id, drink.clone())).collect()
    }
}
