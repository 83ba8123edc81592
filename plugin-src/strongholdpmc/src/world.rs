//! The slice of the game world a stronghold needs: players, groups, blocks, entities.
//!
//! The host server implements [`World`]; everything in this crate reaches the world
//! only through it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::region::BlockPos;

/// Persistent player identity.
pub type PlayerId = Uuid;

/// Identity and display name of a player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameProfile {
    pub id: PlayerId,
    pub name: String,
}

impl GameProfile {
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Identifier of a player group (league).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

/// A named collection of players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

/// Runtime identifier of any entity in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// What kind of entity took part in a combat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// A player character.
    Player(GameProfile),
    /// Anything else: creatures, projectiles, summoned guards.
    Creature {
        /// Player this creature guards, if it was summoned or tamed by one.
        guarded_player: Option<PlayerId>,
    },
}

/// Snapshot of an entity as seen by a damage source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: BlockPos,
}

impl EntityRef {
    /// The player profile, if this entity is a player character.
    #[must_use]
    pub const fn as_player(&self) -> Option<&GameProfile> {
        match &self.kind {
            EntityKind::Player(profile) => Some(profile),
            EntityKind::Creature { .. } => None,
        }
    }

    /// The player this entity acts on behalf of, if any.
    #[must_use]
    pub const fn guarded_player(&self) -> Option<PlayerId> {
        match &self.kind {
            EntityKind::Creature { guarded_player } => *guarded_player,
            EntityKind::Player(_) => None,
        }
    }
}

/// Where a killing blow came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DamageSource {
    /// The entity ultimately responsible (the shooter of an arrow, the owner of a trap).
    pub cause_entity: Option<EntityRef>,
    /// The entity that dealt the damage directly.
    pub source_entity: Option<EntityRef>,
}

impl DamageSource {
    /// Responsible entity: the cause when known, otherwise the direct source.
    #[must_use]
    pub fn responsible(&self) -> Option<&EntityRef> {
        self.cause_entity.as_ref().or(self.source_entity.as_ref())
    }
}

/// Block or item attributes relevant to claim protection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collectible {
    pub code: String,
    /// Tagged as siege equipment: bypasses claim privilege entirely.
    pub siege_equipment: bool,
}

impl Collectible {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            siege_equipment: false,
        }
    }

    #[must_use]
    pub fn siege(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            siege_equipment: true,
        }
    }
}

/// World queries and signals consumed by the stronghold core.
pub trait World {
    /// The block at `pos`, or `None` if it cannot be resolved.
    fn block_at(&self, pos: BlockPos) -> Option<Collectible>;

    /// The item in the player's active hotbar slot.
    fn held_item(&self, player: PlayerId) -> Option<Collectible>;

    /// Current block position of an online player.
    fn player_position(&self, player: PlayerId) -> Option<BlockPos>;

    /// Groups the player belongs to.
    fn player_groups(&self, player: PlayerId) -> Vec<GroupId>;

    /// Resolve a group by its name.
    fn group_by_name(&self, name: &str) -> Option<Group>;

    /// In-game calendar time, in days.
    fn calendar_days(&self) -> f64;

    /// Mark the block entity at `anchor` dirty so its state is saved.
    fn mark_dirty(&self, anchor: BlockPos);

    /// Show an in-game error (by language code) to a player.
    fn send_ingame_error(&self, player: PlayerId, code: &str);

    /// Whether `player` is a member of `group`.
    fn is_member(&self, player: PlayerId, group: GroupId) -> bool {
        self.player_groups(player).contains(&group)
    }
}
