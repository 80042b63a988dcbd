//! Ledger of enemies that are alive or finishing their death sequence.

use std::collections::BTreeMap;

use plot_defence_core::{AssetHandle, EnemyId, Lane};

/// Lifecycle stage of an enemy tracked by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyStatus {
    /// Walking the lane.
    Alive,
    /// Killed or leaked; still counted until its death sequence completes.
    Dying,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct EnemyRecord {
    pub(crate) asset: AssetHandle,
    pub(crate) lane: Lane,
    pub(crate) status: EnemyStatus,
}

#[derive(Debug, Default)]
pub(crate) struct EnemyLedger {
    entries: BTreeMap<EnemyId, EnemyRecord>,
    next_enemy_id: u32,
}

impl EnemyLedger {
    pub(crate) fn insert(&mut self, asset: AssetHandle, lane: Lane) -> EnemyId {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
        let _ = self.entries.insert(
            id,
            EnemyRecord {
                asset,
                lane,
                status: EnemyStatus::Alive,
            },
        );
        id
    }

    /// Moves an alive enemy into its death sequence. Returns `false` when the
    /// enemy is unknown or already dying.
    pub(crate) fn begin_dying(&mut self, enemy: EnemyId) -> bool {
        match self.entries.get_mut(&enemy) {
            Some(record) if record.status == EnemyStatus::Alive => {
                record.status = EnemyStatus::Dying;
                true
            }
            _ => false,
        }
    }

    /// Removes a dying enemy. Alive enemies are left untouched.
    pub(crate) fn remove_dying(&mut self, enemy: EnemyId) -> bool {
        if self
            .entries
            .get(&enemy)
            .is_some_and(|record| record.status == EnemyStatus::Dying)
        {
            return self.entries.remove(&enemy).is_some();
        }
        false
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EnemyId, EnemyRecord)> + '_ {
        self.entries.iter().map(|(id, record)| (*id, *record))
    }
}
