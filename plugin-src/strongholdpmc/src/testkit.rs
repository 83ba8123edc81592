//! In-memory [`World`] for tests and offline tooling.
//!
//! Everything is behind one mutex so the world can be shared with async handlers.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::region::BlockPos;
use crate::world::{Collectible, Group, GroupId, PlayerId, World};

#[derive(Debug, Default)]
struct State {
    blocks: HashMap<BlockPos, Collectible>,
    unloaded: HashSet<BlockPos>,
    held: HashMap<PlayerId, Collectible>,
    positions: HashMap<PlayerId, BlockPos>,
    memberships: HashMap<PlayerId, Vec<GroupId>>,
    groups: Vec<Group>,
    day: f64,
    dirty: Vec<BlockPos>,
    errors: Vec<(PlayerId, String)>,
}

/// A world where every block is plain stone unless set otherwise.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    state: Mutex<State>,
}

impl MemoryWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_block(&self, pos: BlockPos, block: Collectible) {
        let mut state = self.state();
        state.unloaded.remove(&pos);
        state.blocks.insert(pos, block);
    }

    /// Make `pos` unresolvable, as if its chunk were not loaded.
    pub fn unload(&self, pos: BlockPos) {
        self.state().unloaded.insert(pos);
    }

    pub fn set_held_item(&self, player: PlayerId, item: Option<Collectible>) {
        let mut state = self.state();
        match item {
            Some(item) => state.held.insert(player, item),
            None => state.held.remove(&player),
        };
    }

    /// Place an online player. `None` takes them offline.
    pub fn set_position(&self, player: PlayerId, pos: Option<BlockPos>) {
        let mut state = self.state();
        match pos {
            Some(pos) => state.positions.insert(player, pos),
            None => state.positions.remove(&player),
        };
    }

    pub fn add_group(&self, id: GroupId, name: impl Into<String>) {
        self.state().groups.push(Group {
            id,
            name: name.into(),
        });
    }

    pub fn join_group(&self, player: PlayerId, group: GroupId) {
        self.state()
            .memberships
            .entry(player)
            .or_default()
            .push(group);
    }

    pub fn set_day(&self, day: f64) {
        self.state().day = day;
    }

    /// Anchors marked dirty so far, in order.
    #[must_use]
    pub fn dirty_marks(&self) -> Vec<BlockPos> {
        self.state().dirty.clone()
    }

    /// In-game errors shown so far, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<(PlayerId, String)> {
        self.state().errors.clone()
    }
}

impl World for MemoryWorld {
    fn block_at(&self, pos: BlockPos) -> Option<Collectible> {
        let state = self.state();
        if state.unloaded.contains(&pos) {
            return None;
        }
        Some(
            state
                .blocks
                .get(&pos)
                .cloned()
                .unwrap_or_else(|| Collectible::new("game:rock-granite")),
        )
    }

    fn held_item(&self, player: PlayerId) -> Option<Collectible> {
        self.state().held.get(&player).cloned()
    }

    fn player_position(&self, player: PlayerId) -> Option<BlockPos> {
        self.state().positions.get(&player).copied()
    }

    fn player_groups(&self, player: PlayerId) -> Vec<GroupId> {
        self.state()
            .memberships
            .get(&player)
            .cloned()
            .unwrap_or_default()
    }

    fn group_by_name(&self, name: &str) -> Option<Group> {
        self.state().groups.iter().find(|g| g.name == name).cloned()
    }

    fn calendar_days(&self) -> f64 {
        self.state().day
    }

    fn mark_dirty(&self, anchor: BlockPos) {
        self.state().dirty.push(anchor);
    }

    fn send_ingame_error(&self, player: PlayerId, code: &str) {
        self.state().errors.push((player, code.to_owned()));
    }
}
