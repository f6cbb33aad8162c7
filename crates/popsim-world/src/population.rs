//! Index-stable arena owning every live individual.
//!
//! Slots keep insertion order, which is also the iteration and partner-scan
//! order. Deaths leave a tombstone until the next [`Population::compact`], so
//! a cursor walking the slots never skips or revisits anyone while the arena
//! grows or shrinks underneath it.

use crate::individual::{Individual, PAIRING_ACCEPTANCE, PAIRING_SCHEDULE_SCALE};
use crate::registry::{Distributions, LifeEvent};
use popsim_core::{IndividualId, IndividualRecord};
use std::collections::HashMap;

struct Slot {
    id: IndividualId,
    individual: Individual,
}

#[derive(Default)]
pub struct Population {
    slots: Vec<Option<Slot>>,
    index: HashMap<IndividualId, usize>,
    live: usize,
    next_id: u64,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_individuals(individuals: impl IntoIterator<Item = Individual>) -> Self {
        let mut population = Self::new();
        for individual in individuals {
            population.admit(individual);
        }
        population
    }

    /// Append an individual at the end of the iteration order.
    ///
    /// Any partner reference carried in is dropped; bonds are only formed
    /// through [`Population::pair`].
    pub fn admit(&mut self, mut individual: Individual) -> IndividualId {
        individual.set_partner(None);
        let id = IndividualId(self.next_id);
        self.next_id += 1;
        self.index.insert(id, self.slots.len());
        self.slots.push(Some(Slot { id, individual }));
        self.live += 1;
        id
    }

    /// Number of live individuals
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots including tombstones; the upper bound for a cursor.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Id of the individual in `slot`, or `None` for a tombstone.
    pub fn id_at(&self, slot: usize) -> Option<IndividualId> {
        self.slots.get(slot)?.as_ref().map(|s| s.id)
    }

    pub fn contains(&self, id: IndividualId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: IndividualId) -> Option<&Individual> {
        let slot = *self.index.get(&id)?;
        self.slots[slot].as_ref().map(|s| &s.individual)
    }

    pub fn get_mut(&mut self, id: IndividualId) -> Option<&mut Individual> {
        let slot = *self.index.get(&id)?;
        self.slots[slot].as_mut().map(|s| &mut s.individual)
    }

    /// Live individuals in iteration order
    pub fn iter(&self) -> impl Iterator<Item = (IndividualId, &Individual)> {
        self.slots
            .iter()
            .flatten()
            .map(|slot| (slot.id, &slot.individual))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (IndividualId, &mut Individual)> {
        self.slots
            .iter_mut()
            .flatten()
            .map(|slot| (slot.id, &mut slot.individual))
    }

    pub fn ids(&self) -> Vec<IndividualId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Bond two unengaged individuals and schedule both at `time_children`.
    /// Returns false, changing nothing, if either is missing or already engaged.
    pub fn pair(&mut self, a: IndividualId, b: IndividualId, time_children: f64) -> bool {
        let available = |id| self.get(id).is_some_and(|i| !i.is_engaged());
        if a == b || !available(a) || !available(b) {
            return false;
        }
        for (me, other) in [(a, b), (b, a)] {
            if let Some(individual) = self.get_mut(me) {
                individual.set_partner(Some(other));
                individual.time_children = time_children;
            }
        }
        true
    }

    /// Clear the bond on both sides and reset the caller's `time_children`.
    ///
    /// The former partner's `time_children` is left as it was.
    pub fn disengage(&mut self, id: IndividualId) -> Option<IndividualId> {
        let individual = self.get_mut(id)?;
        let partner = individual.partner()?;
        individual.set_partner(None);
        individual.time_children = 0.0;

        if let Some(other) = self.get_mut(partner) {
            other.set_partner(None);
        }
        Some(partner)
    }

    /// Scan in iteration order for the first candidate that is compatible,
    /// itself eligible, and passes a fresh uniform acceptance draw. At most
    /// one bond is formed per call.
    ///
    /// The draw is only taken for candidates passing the first two checks.
    pub fn seek_partner(
        &mut self,
        seeker: IndividualId,
        current_time: u64,
        distributions: &mut Distributions,
    ) -> Option<IndividualId> {
        let found = {
            let me = self.get(seeker)?;
            self.slots.iter().flatten().find_map(|slot| {
                let candidate = &slot.individual;
                let accepted = me.is_compatible_partner(candidate)
                    && candidate.is_eligible_for_relation()
                    && distributions.sample(LifeEvent::BirthEngageDisengage) <= PAIRING_ACCEPTANCE;
                accepted.then_some(slot.id)
            })?
        };

        let schedule = current_time as f64
            + distributions.sample(LifeEvent::TimeChildren) * PAIRING_SCHEDULE_SCALE;
        self.pair(seeker, found, schedule).then_some(found)
    }

    /// Deliver a pregnant female's child and admit it at the end of the
    /// iteration order. A rescheduled `time_children` is mirrored onto her partner.
    pub fn deliver(
        &mut self,
        mother: IndividualId,
        distributions: &mut Distributions,
        current_time: u64,
    ) -> Option<IndividualId> {
        let individual = self.get_mut(mother)?;
        let partner = individual.partner();
        let birth = individual.give_birth(distributions, current_time)?;

        if let (Some(next), Some(partner)) = (birth.rescheduled, partner) {
            if let Some(other) = self.get_mut(partner) {
                other.time_children = next;
            }
        }
        Some(self.admit(birth.child))
    }

    /// Remove an individual, clearing any bond first so no live partner
    /// is left pointing at it. The slot becomes a tombstone.
    pub fn remove(&mut self, id: IndividualId) -> Option<Individual> {
        self.disengage(id);
        let slot = self.index.remove(&id)?;
        let removed = self.slots[slot].take()?;
        self.live -= 1;
        Some(removed.individual)
    }

    /// Drop tombstones, preserving order and ids.
    pub fn compact(&mut self) {
        if self.slots.len() == self.live {
            return;
        }
        self.slots.retain(Option::is_some);
        self.index.clear();
        for (position, slot) in self.slots.iter().enumerate() {
            if let Some(slot) = slot {
                self.index.insert(slot.id, position);
            }
        }
    }

    /// True when every bond points at a live individual that points back.
    pub fn partners_symmetric(&self) -> bool {
        self.iter().all(|(id, individual)| match individual.partner() {
            Some(partner) => self
                .get(partner)
                .is_some_and(|other| other.partner() == Some(id)),
            None => true,
        })
    }

    pub fn records(&self) -> Vec<IndividualRecord> {
        self.iter().map(|(_, individual)| individual.to_record()).collect()
    }
}
