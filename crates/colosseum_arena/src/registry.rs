//! # Character & Equipment Registry
//!
//! Lifecycle operations over the shared store. The registry borrows a store
//! handle per call batch and accumulates notification signals; authorization
//! for admin-only operations (xp grants, minting) is enforced by the runtime
//! entry points that construct it.

use colosseum_core::{keys, store, Address, CallContext, EntityStore, Notification};
use tracing::info;

use crate::character::{Character, StatKind};
use crate::class::CharacterClass;
use crate::equipment::{EquipRarity, Equipment, EquipmentKind};
use crate::error::{ArenaError, ArenaResult};
use crate::rules::BattleRules;
use crate::skill;

/// Registry engine over a borrowed store.
pub struct CharacterRegistry<'a, S: EntityStore + ?Sized> {
    store: &'a mut S,
    rules: &'a BattleRules,
    signals: Vec<Notification>,
}

impl<'a, S: EntityStore + ?Sized> CharacterRegistry<'a, S> {
    /// Creates a registry over `store` with the given rules.
    pub fn new(store: &'a mut S, rules: &'a BattleRules) -> Self {
        Self {
            store,
            rules,
            signals: Vec::new(),
        }
    }

    /// Consumes the registry and returns the signals it emitted.
    #[must_use]
    pub fn into_signals(self) -> Vec<Notification> {
        self.signals
    }

    /// Creates a character under a unique id with its class base stats.
    ///
    /// # Errors
    ///
    /// `CharacterExists` on a duplicate id.
    pub fn create_character(
        &mut self,
        ctx: &CallContext,
        id: &str,
        class: CharacterClass,
        name: &str,
    ) -> ArenaResult<()> {
        if self.store.has(&keys::character(id)) {
            return Err(ArenaError::CharacterExists(id.to_owned()));
        }
        let character = Character::new(ctx.caller.clone(), name.to_owned(), class);
        character.save(self.store, id);
        store::bump_counter(self.store, keys::CHARACTER_COUNT)?;
        info!(id, class = class.name(), "character created");
        self.signals.push(Notification::CharacterCreated { id: id.to_owned() });
        Ok(())
    }

    /// Spends 100 xp on one stat upgrade. Owner-only.
    ///
    /// # Errors
    ///
    /// Unknown id, wrong owner, insufficient xp, or a capped stat.
    pub fn upgrade(&mut self, ctx: &CallContext, id: &str, stat: StatKind) -> ArenaResult<()> {
        let mut character = Character::load(self.store, id)?;
        character.require_owner(id, &ctx.caller)?;
        character.upgrade(stat, self.rules)?;
        character.save(self.store, id);
        self.signals.push(Notification::CharacterUpgraded {
            id: id.to_owned(),
            stat: stat.as_str().to_owned(),
        });
        Ok(())
    }

    /// Grants xp, auto-levelling with the remainder carried forward.
    /// Admin-only at the runtime boundary.
    ///
    /// # Errors
    ///
    /// Unknown id.
    pub fn grant_xp(&mut self, id: &str, amount: u64) -> ArenaResult<()> {
        let mut character = Character::load(self.store, id)?;
        let level = character.gain_xp(amount, self.rules);
        character.save(self.store, id);
        self.signals.push(Notification::XpGranted {
            id: id.to_owned(),
            amount,
            level,
        });
        Ok(())
    }

    /// Learns a skill for 150 xp. Owner-only.
    ///
    /// # Errors
    ///
    /// Unknown id/skill, wrong owner, duplicate learn, insufficient xp.
    pub fn learn_skill(&mut self, ctx: &CallContext, id: &str, skill_id: u8) -> ArenaResult<()> {
        let mut character = Character::load(self.store, id)?;
        character.require_owner(id, &ctx.caller)?;
        if skill::spec(skill_id).is_none() {
            return Err(ArenaError::UnknownSkill(skill_id));
        }
        if character.learned.contains(skill_id) {
            return Err(ArenaError::SkillAlreadyLearned(skill_id));
        }
        if character.xp < self.rules.learn_cost_xp {
            return Err(ArenaError::InsufficientXp {
                need: self.rules.learn_cost_xp,
                have: character.xp,
            });
        }
        character.xp -= self.rules.learn_cost_xp;
        character.learned.insert(skill_id);
        character.save(self.store, id);
        self.signals.push(Notification::SkillLearned {
            id: id.to_owned(),
            skill: skill_id,
        });
        Ok(())
    }

    /// Places a learned skill into slot 1-3. Owner-only.
    ///
    /// # Errors
    ///
    /// Unknown id, wrong owner, bad slot, unlearned skill.
    pub fn equip_skill(
        &mut self,
        ctx: &CallContext,
        id: &str,
        slot: u8,
        skill_id: u8,
    ) -> ArenaResult<()> {
        let mut character = Character::load(self.store, id)?;
        character.require_owner(id, &ctx.caller)?;
        if !(1..=3).contains(&slot) {
            return Err(ArenaError::InvalidSkillSlot(slot));
        }
        if !character.learned.contains(skill_id) {
            return Err(ArenaError::SkillNotLearned(skill_id));
        }
        character.skill_slots[slot as usize - 1] = skill_id;
        character.save(self.store, id);
        self.signals.push(Notification::SkillEquipped {
            id: id.to_owned(),
            slot,
            skill: skill_id,
        });
        Ok(())
    }

    /// Mints an equipment item. Admin-only at the runtime boundary.
    ///
    /// # Errors
    ///
    /// `EquipmentExists` on a duplicate id.
    pub fn mint_equipment(
        &mut self,
        ctx: &CallContext,
        id: &str,
        owner: &Address,
        kind: EquipmentKind,
        rarity: EquipRarity,
    ) -> ArenaResult<()> {
        if self.store.has(&keys::equipment(id)) {
            return Err(ArenaError::EquipmentExists(id.to_owned()));
        }
        let item = Equipment::new(owner.clone(), kind, rarity, ctx.now);
        item.save(self.store, id);
        store::bump_counter(self.store, keys::EQUIPMENT_COUNT)?;
        self.signals.push(Notification::EquipmentMinted {
            id: id.to_owned(),
            owner: owner.clone(),
        });
        Ok(())
    }

    /// Transfers equipment ownership. Owner-only.
    ///
    /// # Errors
    ///
    /// Unknown id or wrong owner.
    pub fn transfer_equipment(
        &mut self,
        ctx: &CallContext,
        id: &str,
        to: &Address,
    ) -> ArenaResult<()> {
        let mut item = Equipment::load(self.store, id)?;
        if item.owner != ctx.caller {
            return Err(ArenaError::NotOwner {
                entity: id.to_owned(),
                caller: ctx.caller.to_string(),
            });
        }
        item.owner = to.clone();
        item.save(self.store, id);
        self.signals.push(Notification::EquipmentTransferred {
            id: id.to_owned(),
            to: to.clone(),
        });
        Ok(())
    }

    /// Assigns an item into the character slot matching its kind, overwriting
    /// any prior reference. Caller must own both.
    ///
    /// # Errors
    ///
    /// Unknown ids or ownership mismatch on either entity.
    pub fn equip_item(
        &mut self,
        ctx: &CallContext,
        character_id: &str,
        equipment_id: &str,
    ) -> ArenaResult<()> {
        let mut character = Character::load(self.store, character_id)?;
        character.require_owner(character_id, &ctx.caller)?;
        let item = Equipment::load(self.store, equipment_id)?;
        if item.owner != ctx.caller {
            return Err(ArenaError::NotOwner {
                entity: equipment_id.to_owned(),
                caller: ctx.caller.to_string(),
            });
        }
        character.equipment[item.kind.slot()] = equipment_id.to_owned();
        character.save(self.store, character_id);
        self.signals.push(Notification::ItemEquipped {
            character: character_id.to_owned(),
            equipment: equipment_id.to_owned(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colosseum_core::MemoryStore;

    fn ctx(caller: &str) -> CallContext {
        CallContext::new(caller, 1_700_000_000)
    }

    fn setup() -> (MemoryStore, BattleRules) {
        (MemoryStore::new(), BattleRules::default())
    }

    #[test]
    fn test_create_rejects_duplicate_id() {
        let (mut store, rules) = setup();
        let mut reg = CharacterRegistry::new(&mut store, &rules);
        reg.create_character(&ctx("alice"), "c1", CharacterClass::Warrior, "Maximus")
            .unwrap();
        assert!(matches!(
            reg.create_character(&ctx("bob"), "c1", CharacterClass::Mage, "Imp"),
            Err(ArenaError::CharacterExists(_))
        ));
        assert_eq!(
            store::read_counter(reg.store, keys::CHARACTER_COUNT).unwrap(),
            1
        );
    }

    #[test]
    fn test_upgrade_requires_owner() {
        let (mut store, rules) = setup();
        let mut reg = CharacterRegistry::new(&mut store, &rules);
        reg.create_character(&ctx("alice"), "c1", CharacterClass::Warrior, "Maximus")
            .unwrap();
        reg.grant_xp("c1", 100).unwrap();
        assert!(matches!(
            reg.upgrade(&ctx("bob"), "c1", StatKind::Damage),
            Err(ArenaError::NotOwner { .. })
        ));
        reg.upgrade(&ctx("alice"), "c1", StatKind::Damage).unwrap();
        let c = Character::load(reg.store, "c1").unwrap();
        assert_eq!(c.damage_min, 10);
    }

    #[test]
    fn test_learn_and_equip_skill() {
        let (mut store, rules) = setup();
        let mut reg = CharacterRegistry::new(&mut store, &rules);
        reg.create_character(&ctx("alice"), "c1", CharacterClass::Assassin, "Shade")
            .unwrap();
        reg.grant_xp("c1", 150).unwrap();

        assert!(matches!(
            reg.equip_skill(&ctx("alice"), "c1", 1, 3),
            Err(ArenaError::SkillNotLearned(3))
        ));
        reg.learn_skill(&ctx("alice"), "c1", 3).unwrap();
        assert!(matches!(
            reg.learn_skill(&ctx("alice"), "c1", 3),
            Err(ArenaError::SkillAlreadyLearned(3))
        ));
        reg.equip_skill(&ctx("alice"), "c1", 1, 3).unwrap();
        assert!(matches!(
            reg.equip_skill(&ctx("alice"), "c1", 4, 3),
            Err(ArenaError::InvalidSkillSlot(4))
        ));

        let c = Character::load(reg.store, "c1").unwrap();
        assert_eq!(c.skill_slots[0], 3);
        assert_eq!(c.xp, 0);
    }

    #[test]
    fn test_equip_item_matches_kind_slot() {
        let (mut store, rules) = setup();
        let mut reg = CharacterRegistry::new(&mut store, &rules);
        let alice = Address::new("alice");
        reg.create_character(&ctx("alice"), "c1", CharacterClass::Tank, "Wall")
            .unwrap();
        reg.mint_equipment(&ctx("admin"), "w1", &alice, EquipmentKind::Weapon, EquipRarity::Epic)
            .unwrap();
        reg.equip_item(&ctx("alice"), "c1", "w1").unwrap();

        let c = Character::load(reg.store, "c1").unwrap();
        assert_eq!(c.equipment[0], "w1");

        // transfer away, equip now fails ownership
        reg.transfer_equipment(&ctx("alice"), "w1", &Address::new("bob"))
            .unwrap();
        assert!(matches!(
            reg.equip_item(&ctx("alice"), "c1", "w1"),
            Err(ArenaError::NotOwner { .. })
        ));
    }
}
