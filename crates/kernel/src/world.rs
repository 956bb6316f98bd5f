use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trackway_common::{ArchetypeId, EntityId, Transform};

/// An event record produced by every mutation to the world.
///
/// The event log is the foundation for replay and for comparing two runs.
/// Each event captures enough information to reconstruct the mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorldEvent {
    /// World was created with an explicit seed.
    Seeded { seed: u64 },
    /// Entity was spawned, optionally attached to a parent.
    Spawned {
        id: EntityId,
        archetype: ArchetypeId,
        transform: Transform,
        parent: Option<EntityId>,
    },
    /// Entity was despawned. Children are always despawned before their parent.
    Despawned {
        id: EntityId,
        archetype: ArchetypeId,
        transform: Transform,
        parent: Option<EntityId>,
    },
    /// Entity transform was updated.
    TransformUpdated {
        id: EntityId,
        old: Transform,
        new: Transform,
    },
    /// Simulation advanced one tick with the given seed.
    Stepped { tick: u64, seed: u64 },
}

/// Spawn/despawn sink consumed by the streamer and the traffic spawner.
///
/// Implementations must cascade destruction: destroying an entity destroys
/// everything instantiated with it (transitively) as parent.
pub trait Scene {
    /// Instantiate `archetype` at `transform`, optionally under `parent`.
    fn instantiate(
        &mut self,
        archetype: &ArchetypeId,
        transform: Transform,
        parent: Option<EntityId>,
    ) -> EntityId;

    /// Destroy an entity and its descendants. Returns how many were removed.
    fn destroy(&mut self, id: EntityId) -> usize;

    fn contains(&self, id: EntityId) -> bool;
}

/// The authoritative scene state.
///
/// Uses BTreeMap for deterministic iteration order across all platforms.
/// Entity ids come from a splitmix64 stream seeded by the world seed, so
/// two worlds built with the same seed and operations hash identically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    entities: BTreeMap<EntityId, EntityData>,
    tick: u64,
    seed: u64,
    id_state: u64,
    /// Append-only event log of all mutations.
    #[serde(skip)]
    event_log: Vec<WorldEvent>,
}

/// Per-entity data stored in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityData {
    pub archetype: ArchetypeId,
    pub transform: Transform,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
}

impl World {
    /// Create an empty world at tick 0 with seed 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world with a specific seed for deterministic replay.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            id_state: seed,
            event_log: vec![WorldEvent::Seeded { seed }],
            ..Default::default()
        }
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of entities in the world.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Read-only access to all entities (BTreeMap for deterministic iteration).
    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    /// Spawn a root entity. Returns its id.
    pub fn spawn(&mut self, archetype: &ArchetypeId, transform: Transform) -> EntityId {
        self.instantiate(archetype, transform, None)
    }

    /// Spawn an entity with a specific id (used for replay).
    pub fn spawn_with_id(
        &mut self,
        id: EntityId,
        archetype: ArchetypeId,
        transform: Transform,
        parent: Option<EntityId>,
    ) {
        let parent = match parent {
            Some(p) if self.entities.contains_key(&p) => Some(p),
            Some(p) => {
                tracing::warn!(?id, parent = ?p, "parent not found, spawning as root");
                None
            }
            None => None,
        };
        if let Some(pd) = parent.and_then(|p| self.entities.get_mut(&p)) {
            pd.children.push(id);
        }
        self.entities.insert(
            id,
            EntityData {
                archetype: archetype.clone(),
                transform,
                parent,
                children: Vec::new(),
            },
        );
        self.event_log.push(WorldEvent::Spawned {
            id,
            archetype,
            transform,
            parent,
        });
    }

    /// Remove an entity and its descendants. Returns how many were removed.
    pub fn despawn(&mut self, id: EntityId) -> usize {
        let mut doomed = Vec::new();
        self.collect_subtree(id, &mut doomed);
        for victim in &doomed {
            self.remove_one(*victim);
        }
        doomed.len()
    }

    /// Get a reference to entity data.
    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    /// Direct children of an entity (empty if unknown).
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.entities
            .get(&id)
            .map(|d| d.children.as_slice())
            .unwrap_or(&[])
    }

    /// Update an entity's transform and log the change.
    pub fn set_transform(&mut self, id: EntityId, new: Transform) -> bool {
        if let Some(data) = self.entities.get_mut(&id) {
            let old = data.transform;
            data.transform = new;
            self.event_log
                .push(WorldEvent::TransformUpdated { id, old, new });
            true
        } else {
            false
        }
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) {
        self.tick += 1;
        // splitmix64 keeps the seed sequence identical across platforms.
        self.seed = splitmix64(self.seed);
        self.event_log.push(WorldEvent::Stepped {
            tick: self.tick,
            seed: self.seed,
        });
    }

    /// Reconstruct world state from a sequence of events (for replay).
    pub fn replay(events: &[WorldEvent]) -> Self {
        let mut world = Self::new();
        for event in events {
            match event {
                WorldEvent::Seeded { seed } => {
                    world.seed = *seed;
                    world.id_state = *seed;
                }
                WorldEvent::Spawned {
                    id,
                    archetype,
                    transform,
                    parent,
                } => {
                    world.spawn_with_id(*id, archetype.clone(), *transform, *parent);
                }
                WorldEvent::Despawned { id, .. } => {
                    world.remove_one(*id);
                }
                WorldEvent::TransformUpdated { id, new, .. } => {
                    if let Some(data) = world.entities.get_mut(id) {
                        data.transform = *new;
                    }
                }
                WorldEvent::Stepped { tick, seed } => {
                    world.tick = *tick;
                    world.seed = *seed;
                }
            }
        }
        world.event_log.clear();
        world
    }

    /// Compute a deterministic hash of the world state for comparison.
    /// Uses canonical (BTreeMap) iteration order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.seed.to_le_bytes());
        for (id, data) in &self.entities {
            mix(&mut h, id.0.as_bytes());
            mix(&mut h, data.archetype.as_str().as_bytes());
            if let Some(parent) = data.parent {
                mix(&mut h, parent.0.as_bytes());
            }
            let t = &data.transform;
            for v in t.position.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
            for v in t.rotation.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
            for v in t.scale.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
        }
        h
    }

    fn next_id(&mut self) -> EntityId {
        self.id_state = splitmix64(self.id_state);
        let hi = self.id_state;
        self.id_state = splitmix64(self.id_state);
        let lo = self.id_state;
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&hi.to_le_bytes());
        bytes[8..].copy_from_slice(&lo.to_le_bytes());
        EntityId::from_random_bytes(bytes)
    }

    /// Post-order walk: children are listed before their parent.
    fn collect_subtree(&self, root: EntityId, out: &mut Vec<EntityId>) {
        if let Some(data) = self.entities.get(&root) {
            for child in &data.children {
                self.collect_subtree(*child, out);
            }
            out.push(root);
        }
    }

    fn remove_one(&mut self, id: EntityId) {
        let Some(data) = self.entities.remove(&id) else {
            return;
        };
        if let Some(pd) = data.parent.and_then(|p| self.entities.get_mut(&p)) {
            pd.children.retain(|c| *c != id);
        }
        self.event_log.push(WorldEvent::Despawned {
            id,
            archetype: data.archetype,
            transform: data.transform,
            parent: data.parent,
        });
    }
}

impl Scene for World {
    fn instantiate(
        &mut self,
        archetype: &ArchetypeId,
        transform: Transform,
        parent: Option<EntityId>,
    ) -> EntityId {
        let id = self.next_id();
        self.spawn_with_id(id, archetype.clone(), transform, parent);
        id
    }

    fn destroy(&mut self, id: EntityId) -> usize {
        self.despawn(id)
    }

    fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }
}

/// Splitmix64 ... a fast, high-quality deterministic PRNG step function.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
