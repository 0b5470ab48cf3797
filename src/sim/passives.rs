//! Passive items: owned levels and the buff snapshot they produce

use serde::{Deserialize, Serialize};

use super::shop::Upgrade;
use super::stats::BuffSnapshot;
use crate::defs::Definitions;
use crate::error::{CoreError, CoreResult, ItemClass};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveInstance {
    pub id: String,
    pub level: u32,
}

#[derive(Debug, Clone)]
pub struct PassiveSystem {
    /// Acquisition order
    instances: Vec<PassiveInstance>,
    max_slots: usize,
    buffs: BuffSnapshot,
}

impl PassiveSystem {
    pub fn new(max_slots: usize) -> Self {
        Self {
            instances: Vec::new(),
            max_slots,
            buffs: BuffSnapshot::default(),
        }
    }

    pub fn instances(&self) -> &[PassiveInstance] {
        &self.instances
    }

    /// Current level of `id`, 0 if unowned
    pub fn level_of(&self, id: &str) -> u32 {
        self.instances
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.level)
            .unwrap_or(0)
    }

    pub fn slots_full(&self) -> bool {
        self.instances.len() >= self.max_slots
    }

    /// Read-only buff snapshot for the weapon system
    pub fn buffs(&self) -> &BuffSnapshot {
        &self.buffs
    }

    pub fn acquire(&mut self, defs: &Definitions, id: &str) -> CoreResult<()> {
        if defs.passive(id).is_none() {
            return Err(CoreError::not_found(ItemClass::Passive, id));
        }
        if self.level_of(id) > 0 {
            return Err(CoreError::AlreadyOwned { id: id.to_string() });
        }
        if self.slots_full() {
            return Err(CoreError::SlotsFull {
                kind: ItemClass::Passive,
                limit: self.max_slots,
            });
        }
        self.instances.push(PassiveInstance {
            id: id.to_string(),
            level: 1,
        });
        self.rebuild_buffs(defs);
        log::info!("Passive acquired: {}", id);
        Ok(())
    }

    /// Returns the new level
    pub fn level_up(&mut self, defs: &Definitions, id: &str) -> CoreResult<u32> {
        let def = defs
            .passive(id)
            .ok_or_else(|| CoreError::not_found(ItemClass::Passive, id))?;
        let instance = self
            .instances
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(CoreError::InvalidState("cannot level an unowned passive"))?;
        if instance.level >= def.max_level {
            return Err(CoreError::MaxLevel {
                id: id.to_string(),
                max_level: def.max_level,
            });
        }
        instance.level += 1;
        let level = instance.level;
        self.rebuild_buffs(defs);
        log::info!("Passive {} -> level {}", id, level);
        Ok(level)
    }

    pub fn add_or_upgrade(&mut self, defs: &Definitions, id: &str) -> CoreResult<Upgrade> {
        if self.level_of(id) == 0 {
            self.acquire(defs, id).map(|_| Upgrade::Gained)
        } else {
            self.level_up(defs, id).map(Upgrade::Leveled)
        }
    }

    fn rebuild_buffs(&mut self, defs: &Definitions) {
        let mut buffs = BuffSnapshot::with_revision(self.buffs.revision + 1);
        for instance in &self.instances {
            let Some(def) = defs.passive(&instance.id) else {
                continue;
            };
            for effect in &def.effects {
                buffs.add(effect.stat, effect.effect, instance.level as f32);
            }
        }
        self.buffs = buffs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::stats::StatKey;

    fn defs() -> Definitions {
        Definitions::builtin().unwrap()
    }

    #[test]
    fn test_acquire_and_level_scales_buffs() {
        let defs = defs();
        let mut passives = PassiveSystem::new(6);
        passives.acquire(&defs, "might").unwrap();
        assert!((passives.buffs().percent(StatKey::Damage) - 10.0).abs() < 1e-6);
        let rev = passives.buffs().revision;

        assert_eq!(passives.level_up(&defs, "might").unwrap(), 2);
        assert!((passives.buffs().percent(StatKey::Damage) - 20.0).abs() < 1e-6);
        assert!(passives.buffs().revision > rev);
    }

    #[test]
    fn test_unknown_passive_not_found() {
        let defs = defs();
        let mut passives = PassiveSystem::new(6);
        assert!(matches!(
            passives.acquire(&defs, "nope"),
            Err(CoreError::NotFound { .. })
        ));
        assert!(passives.instances().is_empty());
    }

    #[test]
    fn test_max_level_is_failure_without_mutation() {
        let defs = defs();
        let mut passives = PassiveSystem::new(6);
        passives.acquire(&defs, "splitter").unwrap();
        passives.level_up(&defs, "splitter").unwrap();
        let before = passives.buffs().clone();
        assert!(matches!(
            passives.level_up(&defs, "splitter"),
            Err(CoreError::MaxLevel { max_level: 2, .. })
        ));
        assert_eq!(passives.level_of("splitter"), 2);
        assert_eq!(passives.buffs(), &before);
    }

    #[test]
    fn test_slot_limit() {
        let defs = defs();
        let mut passives = PassiveSystem::new(1);
        passives.acquire(&defs, "might").unwrap();
        assert!(matches!(
            passives.acquire(&defs, "haste"),
            Err(CoreError::SlotsFull { limit: 1, .. })
        ));
        assert_eq!(passives.instances().len(), 1);
    }

    #[test]
    fn test_add_or_upgrade_dispatch() {
        let defs = defs();
        let mut passives = PassiveSystem::new(6);
        assert_eq!(passives.add_or_upgrade(&defs, "clover").unwrap(), Upgrade::Gained);
        assert_eq!(
            passives.add_or_upgrade(&defs, "clover").unwrap(),
            Upgrade::Leveled(2)
        );
    }
}
