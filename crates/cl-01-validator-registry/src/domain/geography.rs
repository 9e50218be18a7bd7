//! Geographic membership index
//!
//! Three-level tree (country → state → city) with a member set per node.
//!
//! INVARIANT: a member belongs to exactly one (city, state, country) tuple and
//! appears once in every ancestor node of that tuple.
//!
//! Upsert policy: idempotent. Re-upserting the same location is a no-op;
//! upserting a different location moves the member out of its old chain.

use serde::{Deserialize, Serialize};
use shared_types::{normalize_name, GeoLevel, IdentityId, Location};
use std::collections::{BTreeSet, HashMap};

type StateKey = (String, String);
type CityKey = (String, String, String);

/// A node in the geographic tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeographicNode {
    /// Display name (first spelling seen)
    pub name: String,
    /// Parent display name, `None` for countries
    pub parent: Option<String>,
    members: BTreeSet<IdentityId>,
}

impl GeographicNode {
    fn new(name: &str, parent: Option<&str>) -> Self {
        Self {
            name: name.trim().to_string(),
            parent: parent.map(|p| p.trim().to_string()),
            members: BTreeSet::new(),
        }
    }

    pub fn total_member_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, identity: &IdentityId) -> bool {
        self.members.contains(identity)
    }

    pub fn members(&self) -> impl Iterator<Item = &IdentityId> {
        self.members.iter()
    }
}

/// Outcome of an upsert
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    Inserted,
    Unchanged,
    /// Member moved; carries the previous location
    Moved(Location),
}

/// Country → state → city index.
#[derive(Clone, Debug, Default)]
pub struct GeographicIndex {
    countries: HashMap<String, GeographicNode>,
    states: HashMap<StateKey, GeographicNode>,
    cities: HashMap<CityKey, GeographicNode>,
    /// Location as entered, per member
    locations: HashMap<IdentityId, Location>,
}

impl GeographicIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or move a member.
    pub fn upsert_member(&mut self, location: &Location, identity: &IdentityId) -> UpsertOutcome {
        let previous = self.locations.get(identity).cloned();

        if let Some(previous) = &previous {
            if previous.normalized() == location.normalized() {
                return UpsertOutcome::Unchanged;
            }
            self.detach(previous, identity);
        }

        let key = location.normalized();
        self.countries
            .entry(key.country.clone())
            .or_insert_with(|| GeographicNode::new(&location.country, None))
            .members
            .insert(identity.clone());
        self.states
            .entry((key.country.clone(), key.state.clone()))
            .or_insert_with(|| GeographicNode::new(&location.state, Some(&location.country)))
            .members
            .insert(identity.clone());
        self.cities
            .entry((key.country, key.state, key.city))
            .or_insert_with(|| GeographicNode::new(&location.city, Some(&location.state)))
            .members
            .insert(identity.clone());

        self.locations.insert(identity.clone(), location.clone());

        match previous {
            Some(previous) => UpsertOutcome::Moved(previous),
            None => UpsertOutcome::Inserted,
        }
    }

    /// Remove the member from every node of its old chain.
    ///
    /// Nodes are kept even when they become empty.
    fn detach(&mut self, location: &Location, identity: &IdentityId) {
        let key = location.normalized();
        if let Some(node) = self.countries.get_mut(&key.country) {
            node.members.remove(identity);
        }
        if let Some(node) = self.states.get_mut(&(key.country.clone(), key.state.clone())) {
            node.members.remove(identity);
        }
        if let Some(node) = self.cities.get_mut(&(key.country, key.state, key.city)) {
            node.members.remove(identity);
        }
    }

    /// Members at every node with this name at `level`.
    ///
    /// Same-named states or cities in different parents are summed.
    pub fn get_member_count(&self, level: GeoLevel, name: &str) -> usize {
        let name = normalize_name(name);
        match level {
            GeoLevel::Country => self
                .countries
                .get(&name)
                .map_or(0, GeographicNode::total_member_count),
            GeoLevel::State => self
                .states
                .iter()
                .filter(|((_, state), _)| *state == name)
                .map(|(_, node)| node.total_member_count())
                .sum(),
            GeoLevel::City => self
                .cities
                .iter()
                .filter(|((_, _, city), _)| *city == name)
                .map(|(_, node)| node.total_member_count())
                .sum(),
        }
    }

    /// The node for `location` at `level`, addressed through its full path.
    pub fn node(&self, level: GeoLevel, location: &Location) -> Option<&GeographicNode> {
        let key = location.normalized();
        match level {
            GeoLevel::Country => self.countries.get(&key.country),
            GeoLevel::State => self.states.get(&(key.country, key.state)),
            GeoLevel::City => self.cities.get(&(key.country, key.state, key.city)),
        }
    }

    pub fn get_location(&self, identity: &IdentityId) -> Option<&Location> {
        self.locations.get(identity)
    }

    pub fn member_count(&self) -> usize {
        self.locations.len()
    }

    /// All (member, location) pairs, for snapshots
    pub fn members(&self) -> impl Iterator<Item = (&IdentityId, &Location)> {
        self.locations.iter()
    }
}
