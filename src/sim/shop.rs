//! Level-up shop: candidate pool, rarity weights and card offers
//!
//! An offer is built fresh on every opening from the authoritative weapon and
//! passive levels. Selecting a card applies it through the owning system's
//! `add_or_upgrade`, so a failed upgrade leaves the shop open and untouched.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::passives::PassiveSystem;
use super::player::PlayerPort;
use super::weapons::WeaponSystem;
use crate::config::ShopConfig;
use crate::defs::Definitions;
use crate::error::{CoreError, CoreResult};
use crate::events::{EventLog, GameEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Roulette order
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeight {
    pub base: f32,
    /// Weight change per point of luck
    pub shift: f32,
}

impl TierWeight {
    fn at(&self, luck: f32) -> f32 {
        (self.base + self.shift * luck).max(0.0)
    }
}

/// Luck-driven weight curve for the four tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RarityTable {
    pub common: TierWeight,
    pub rare: TierWeight,
    pub epic: TierWeight,
    pub legendary: TierWeight,
    /// Common never drops below this raw weight
    pub common_floor: f32,
    /// Legendary never rises above this raw weight
    pub legendary_cap: f32,
}

impl Default for RarityTable {
    fn default() -> Self {
        Self {
            common: TierWeight {
                base: 0.60,
                shift: -0.004,
            },
            rare: TierWeight {
                base: 0.28,
                shift: 0.001,
            },
            epic: TierWeight {
                base: 0.10,
                shift: 0.002,
            },
            legendary: TierWeight {
                base: 0.02,
                shift: 0.001,
            },
            common_floor: 0.20,
            legendary_cap: 0.15,
        }
    }
}

impl RarityTable {
    pub fn validate(&self) -> CoreResult<()> {
        let tiers = [self.common, self.rare, self.epic, self.legendary];
        if tiers
            .iter()
            .any(|t| !t.base.is_finite() || !t.shift.is_finite() || t.base < 0.0)
        {
            return Err(CoreError::Config(
                "rarity tier base weights must be finite and >= 0".into(),
            ));
        }
        if !(self.common_floor > 0.0 && self.common_floor.is_finite()) {
            return Err(CoreError::Config(format!(
                "rarity common_floor must be positive, got {}",
                self.common_floor
            )));
        }
        if !(self.legendary_cap >= 0.0 && self.legendary_cap.is_finite()) {
            return Err(CoreError::Config(format!(
                "rarity legendary_cap must be >= 0, got {}",
                self.legendary_cap
            )));
        }
        Ok(())
    }
}

/// Normalized tier weights for `luck`, indexed by [`Rarity::index`]
pub fn compute_rarity_weights(luck: f32, table: &RarityTable) -> [f32; 4] {
    let luck = if luck.is_finite() { luck } else { 0.0 };
    let mut weights = [
        table.common.at(luck).max(table.common_floor),
        table.rare.at(luck),
        table.epic.at(luck),
        table.legendary.at(luck).min(table.legendary_cap),
    ];

    let total: f32 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return [1.0, 0.0, 0.0, 0.0];
    }
    for w in &mut weights {
        *w /= total;
    }
    weights
}

/// Roulette-wheel tier pick for `u` in [0, 1)
pub fn pick_tier(weights: &[f32; 4], u: f32) -> Rarity {
    let mut cumulative = 0.0;
    for rarity in Rarity::ALL {
        cumulative += weights[rarity.index()];
        if cumulative >= u {
            return rarity;
        }
    }
    Rarity::Common
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Weapon,
    Passive,
}

/// Outcome of `add_or_upgrade` on a weapon or passive system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    Gained,
    Leveled(u32),
}

/// An item the shop could offer, annotated with its current level
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub kind: ItemKind,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    /// 0 when unowned
    pub level: u32,
    pub max_level: u32,
}

impl Candidate {
    pub fn is_new(&self) -> bool {
        self.level == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopCard {
    pub id: String,
    pub kind: ItemKind,
    pub name: String,
    pub description: String,
    pub current_level: u32,
    pub target_level: u32,
    pub is_new: bool,
    pub rarity: Rarity,
}

impl From<Candidate> for ShopCard {
    fn from(c: Candidate) -> Self {
        Self {
            is_new: c.is_new(),
            current_level: c.level,
            target_level: c.level + 1,
            id: c.id,
            kind: c.kind,
            name: c.name,
            description: c.description,
            rarity: c.rarity,
        }
    }
}

/// Every weapon then every passive, in definition order. Items at max level and
/// new items whose slot class is full are left out.
pub fn build_candidate_pool(
    defs: &Definitions,
    weapons: &WeaponSystem,
    passives: &PassiveSystem,
) -> Vec<Candidate> {
    let weapon_candidates = defs.weapons.iter().map(|def| Candidate {
        id: def.id.clone(),
        kind: ItemKind::Weapon,
        name: def.name.clone(),
        description: def.description.clone(),
        rarity: def.rarity,
        level: weapons.level_of(&def.id),
        max_level: def.max_level,
    });
    let passive_candidates = defs.passives.iter().map(|def| Candidate {
        id: def.id.clone(),
        kind: ItemKind::Passive,
        name: def.name.clone(),
        description: def.description.clone(),
        rarity: def.rarity,
        level: passives.level_of(&def.id),
        max_level: def.max_level,
    });

    weapon_candidates
        .chain(passive_candidates)
        .filter(|c| c.level < c.max_level)
        .filter(|c| {
            !c.is_new()
                || match c.kind {
                    ItemKind::Weapon => !weapons.slots_full(),
                    ItemKind::Passive => !passives.slots_full(),
                }
        })
        .collect()
}

/// Draw one candidate: roll a tier, prefer candidates of that rarity, else
/// take from the whole subset. The drawn candidate is removed.
fn draw_candidate(
    subset: &mut Vec<Candidate>,
    weights: &[f32; 4],
    rng: &mut impl Rng,
) -> Option<Candidate> {
    if subset.is_empty() {
        return None;
    }
    let tier = pick_tier(weights, rng.random::<f32>());
    let matching: Vec<usize> = subset
        .iter()
        .enumerate()
        .filter(|(_, c)| c.rarity == tier)
        .map(|(i, _)| i)
        .collect();

    let index = if matching.is_empty() {
        rng.random_range(0..subset.len())
    } else {
        matching[rng.random_range(0..matching.len())]
    };
    Some(subset.remove(index))
}

/// Build up to `count` distinct cards: one rarity-weighted upgrade, one
/// rarity-weighted new item, then a uniform fill from what remains.
pub fn generate_cards(
    candidates: Vec<Candidate>,
    count: usize,
    weights: &[f32; 4],
    rng: &mut impl Rng,
) -> Vec<ShopCard> {
    let (mut fresh, mut upgrades): (Vec<_>, Vec<_>) =
        candidates.into_iter().partition(Candidate::is_new);
    let mut cards = Vec::with_capacity(count);

    if cards.len() < count {
        if let Some(c) = draw_candidate(&mut upgrades, weights, rng) {
            cards.push(ShopCard::from(c));
        }
    }
    if cards.len() < count {
        if let Some(c) = draw_candidate(&mut fresh, weights, rng) {
            cards.push(ShopCard::from(c));
        }
    }

    let mut rest = upgrades;
    rest.append(&mut fresh);
    while cards.len() < count && !rest.is_empty() {
        let c = rest.remove(rng.random_range(0..rest.len()));
        cards.push(ShopCard::from(c));
    }
    cards
}

/// Mutable systems a shop selection can touch
pub struct Inventory<'a> {
    pub defs: &'a Definitions,
    pub weapons: &'a mut WeaponSystem,
    pub passives: &'a mut PassiveSystem,
}

#[derive(Debug, Clone)]
pub struct Shop {
    config: ShopConfig,
    cards: Vec<ShopCard>,
    open: bool,
    log_shop: bool,
}

impl Shop {
    pub fn new(config: ShopConfig, log_shop: bool) -> Self {
        Self {
            config,
            cards: Vec::new(),
            open: false,
            log_shop,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current offer; empty while closed
    pub fn cards(&self) -> &[ShopCard] {
        &self.cards
    }

    fn roll_offer(
        &self,
        defs: &Definitions,
        weapons: &WeaponSystem,
        passives: &PassiveSystem,
        luck: f32,
        rng: &mut impl Rng,
    ) -> Vec<ShopCard> {
        let candidates = build_candidate_pool(defs, weapons, passives);
        let weights = compute_rarity_weights(luck, &self.config.rarity);
        if self.log_shop {
            log::debug!(
                "Shop roll: {} candidates, luck {:.1}, weights {:?}",
                candidates.len(),
                luck,
                weights
            );
        }
        generate_cards(candidates, self.config.card_count, &weights, rng)
    }

    pub fn open(
        &mut self,
        defs: &Definitions,
        weapons: &WeaponSystem,
        passives: &PassiveSystem,
        luck: f32,
        rng: &mut impl Rng,
        events: &mut EventLog,
    ) {
        self.cards = self.roll_offer(defs, weapons, passives, luck, rng);
        self.open = true;
        log::info!("Shop opened with {} cards", self.cards.len());
        events.push(GameEvent::ShopOpened {
            card_count: self.cards.len(),
        });
    }

    /// Apply card `index` and close the shop
    pub fn select(
        &mut self,
        index: usize,
        inventory: Inventory<'_>,
        events: &mut EventLog,
    ) -> CoreResult<Upgrade> {
        if !self.open {
            return Err(CoreError::InvalidState("shop is not open"));
        }
        let Some(card) = self.cards.get(index) else {
            log::warn!(
                "Shop selection {} out of range ({} cards)",
                index,
                self.cards.len()
            );
            return Err(CoreError::InvalidState("card index out of range"));
        };

        let upgrade = match card.kind {
            ItemKind::Weapon => {
                let buffs = inventory.passives.buffs();
                inventory
                    .weapons
                    .add_or_upgrade(inventory.defs, &card.id, buffs)?
            }
            ItemKind::Passive => inventory.passives.add_or_upgrade(inventory.defs, &card.id)?,
        };

        let (id, kind) = (card.id.clone(), card.kind);
        events.push(match upgrade {
            Upgrade::Gained => GameEvent::ItemGained { id, kind },
            Upgrade::Leveled(level) => GameEvent::ItemLeveled { id, kind, level },
        });
        self.close(false, events);
        Ok(upgrade)
    }

    /// Replace the offer, charging the reroll cost first
    pub fn reroll(
        &mut self,
        player: &mut impl PlayerPort,
        defs: &Definitions,
        weapons: &WeaponSystem,
        passives: &PassiveSystem,
        luck: f32,
        rng: &mut impl Rng,
        events: &mut EventLog,
    ) -> CoreResult<()> {
        if !self.open {
            return Err(CoreError::InvalidState("shop is not open"));
        }
        let cost = self.config.reroll_cost;
        if !player.spend(cost) {
            return Err(CoreError::InsufficientFunds {
                cost,
                balance: player.currency(),
            });
        }
        self.cards = self.roll_offer(defs, weapons, passives, luck, rng);
        events.push(GameEvent::ShopRerolled { cost });
        Ok(())
    }

    pub fn skip(&mut self, events: &mut EventLog) -> CoreResult<()> {
        if !self.open {
            return Err(CoreError::InvalidState("shop is not open"));
        }
        self.close(true, events);
        Ok(())
    }

    fn close(&mut self, skipped: bool, events: &mut EventLog) {
        self.cards.clear();
        self.open = false;
        log::info!("Shop closed{}", if skipped { " (skipped)" } else { "" });
        events.push(GameEvent::ShopClosed { skipped });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlayerConfig, WeaponConfig};
    use crate::sim::player::PlayerState;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn defs() -> Definitions {
        Definitions::builtin().unwrap()
    }

    fn candidate(id: &str, level: u32, rarity: Rarity) -> Candidate {
        Candidate {
            id: id.to_string(),
            kind: ItemKind::Passive,
            name: id.to_string(),
            description: String::new(),
            rarity,
            level,
            max_level: 5,
        }
    }

    #[test]
    fn test_weights_sum_to_one_at_zero_luck() {
        let w = compute_rarity_weights(0.0, &RarityTable::default());
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(w[0] > w[1] && w[1] > w[2] && w[2] > w[3]);
    }

    #[test]
    fn test_luck_shifts_toward_rare_tiers() {
        let table = RarityTable::default();
        let low = compute_rarity_weights(0.0, &table);
        let high = compute_rarity_weights(50.0, &table);
        assert!(high[0] < low[0]);
        assert!(high[3] > low[3]);
    }

    #[test]
    fn test_common_floor_and_legendary_cap() {
        let table = RarityTable::default();
        let w = compute_rarity_weights(10_000.0, &table);
        // Raw common is floored at 0.2, raw legendary capped at 0.15
        let raw_rare = table.rare.at(10_000.0);
        let raw_epic = table.epic.at(10_000.0);
        let total = 0.20 + raw_rare + raw_epic + 0.15;
        assert!((w[0] - 0.20 / total).abs() < 1e-6);
        assert!((w[3] - 0.15 / total).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_table_falls_back_to_common() {
        let table = RarityTable {
            common: TierWeight { base: 0.0, shift: 0.0 },
            rare: TierWeight { base: 0.0, shift: 0.0 },
            epic: TierWeight { base: 0.0, shift: 0.0 },
            legendary: TierWeight { base: 0.0, shift: 0.0 },
            common_floor: 0.0,
            legendary_cap: 0.0,
        };
        assert_eq!(compute_rarity_weights(5.0, &table), [1.0, 0.0, 0.0, 0.0]);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_pick_tier_walks_in_order() {
        let w = [0.5, 0.3, 0.15, 0.05];
        assert_eq!(pick_tier(&w, 0.0), Rarity::Common);
        assert_eq!(pick_tier(&w, 0.5), Rarity::Common);
        assert_eq!(pick_tier(&w, 0.6), Rarity::Rare);
        assert_eq!(pick_tier(&w, 0.9), Rarity::Epic);
        assert_eq!(pick_tier(&w, 0.99), Rarity::Legendary);
        // Drift past the total still resolves
        assert_eq!(pick_tier(&[0.0; 4], 0.5), Rarity::Common);
    }

    #[test]
    fn test_fill_slots_ignore_rarity() {
        // Upgrade and new-item slots always take a legendary; the single fill
        // slot picks from one leftover legendary and eight commons.
        let weights = [0.0, 0.0, 0.0, 1.0];
        let mut both_legendary = 0;
        for seed in 0..2000u64 {
            let mut candidates = vec![
                candidate("up", 1, Rarity::Legendary),
                candidate("shine", 1, Rarity::Legendary),
                candidate("new", 0, Rarity::Legendary),
            ];
            for i in 0..8 {
                candidates.push(candidate(&format!("common{}", i), 1, Rarity::Common));
            }
            let mut rng = Pcg32::seed_from_u64(seed);
            let cards = generate_cards(candidates, 3, &weights, &mut rng);
            assert_eq!(cards.len(), 3);
            assert!(cards.iter().any(|c| c.id == "new"));
            let legendary_upgrades = cards
                .iter()
                .filter(|c| c.id == "up" || c.id == "shine")
                .count();
            assert!(legendary_upgrades >= 1);
            if legendary_upgrades == 2 {
                both_legendary += 1;
            }
        }
        // Uniform fill offers the leftover legendary about 1 time in 9
        assert!(
            (120..360).contains(&both_legendary),
            "leftover legendary filled {} / 2000",
            both_legendary
        );
    }

    #[test]
    fn test_candidate_pool_reads_live_levels() {
        let defs = defs();
        let mut weapons = WeaponSystem::new(WeaponConfig::default());
        let passives = PassiveSystem::new(6);
        weapons.acquire(&defs, "wand", passives.buffs()).unwrap();

        let pool = build_candidate_pool(&defs, &weapons, &passives);
        assert_eq!(pool.len(), defs.weapons.len() + defs.passives.len());
        let wand = pool.iter().find(|c| c.id == "wand").unwrap();
        assert_eq!(wand.level, 1);

        weapons.level_up(&defs, "wand", passives.buffs()).unwrap();
        let pool = build_candidate_pool(&defs, &weapons, &passives);
        assert_eq!(pool.iter().find(|c| c.id == "wand").unwrap().level, 2);
    }

    #[test]
    fn test_candidate_pool_excludes_maxed_and_full_slots() {
        let defs = defs();
        let mut weapons = WeaponSystem::new(WeaponConfig {
            max_slots: 1,
            ..Default::default()
        });
        let mut passives = PassiveSystem::new(6);
        weapons.acquire(&defs, "wand", passives.buffs()).unwrap();
        passives.acquire(&defs, "splitter").unwrap();
        passives.level_up(&defs, "splitter").unwrap();

        let pool = build_candidate_pool(&defs, &weapons, &passives);
        assert!(pool.iter().all(|c| c.id != "splitter"));
        let weapon_ids: Vec<_> = pool
            .iter()
            .filter(|c| c.kind == ItemKind::Weapon)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(weapon_ids, vec!["wand"]);
    }

    #[test]
    fn test_cards_include_upgrade_and_new_when_both_exist() {
        let weights = compute_rarity_weights(0.0, &RarityTable::default());
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let candidates = vec![
                candidate("a", 0, Rarity::Common),
                candidate("b", 0, Rarity::Rare),
                candidate("c", 0, Rarity::Epic),
                candidate("d", 0, Rarity::Common),
                candidate("owned", 2, Rarity::Legendary),
            ];
            let cards = generate_cards(candidates, 3, &weights, &mut rng);
            assert_eq!(cards.len(), 3);
            assert_eq!(cards[0].id, "owned");
            assert_eq!(cards[0].target_level, 3);
            assert!(cards.iter().filter(|c| c.is_new).count() >= 1);

            let mut ids: Vec<_> = cards.iter().map(|c| c.id.clone()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), 3);
        }
    }

    #[test]
    fn test_cards_limited_by_candidates() {
        let weights = compute_rarity_weights(0.0, &RarityTable::default());
        let mut rng = Pcg32::seed_from_u64(3);
        let cards = generate_cards(
            vec![candidate("only", 1, Rarity::Common)],
            3,
            &weights,
            &mut rng,
        );
        assert_eq!(cards.len(), 1);
        assert!(generate_cards(Vec::new(), 3, &weights, &mut rng).is_empty());
    }

    #[test]
    fn test_card_carries_definition_rarity() {
        let weights = [0.0, 0.0, 0.0, 1.0];
        let mut rng = Pcg32::seed_from_u64(11);
        let cards = generate_cards(
            vec![
                candidate("plain", 0, Rarity::Common),
                candidate("shiny", 0, Rarity::Legendary),
            ],
            1,
            &weights,
            &mut rng,
        );
        assert_eq!(cards[0].id, "shiny");
        assert_eq!(cards[0].rarity, Rarity::Legendary);
    }

    #[test]
    fn test_select_applies_upgrade_and_closes() {
        let defs = defs();
        let mut weapons = WeaponSystem::new(WeaponConfig::default());
        let mut passives = PassiveSystem::new(6);
        let mut events = EventLog::new();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut shop = Shop::new(ShopConfig::default(), false);

        shop.open(&defs, &weapons, &passives, 0.0, &mut rng, &mut events);
        assert!(shop.is_open());
        assert_eq!(shop.cards().len(), 3);
        let card = shop.cards()[0].clone();

        let upgrade = shop
            .select(
                0,
                Inventory {
                    defs: &defs,
                    weapons: &mut weapons,
                    passives: &mut passives,
                },
                &mut events,
            )
            .unwrap();
        assert_eq!(upgrade, Upgrade::Gained);
        assert!(!shop.is_open());
        let level = match card.kind {
            ItemKind::Weapon => weapons.level_of(&card.id),
            ItemKind::Passive => passives.level_of(&card.id),
        };
        assert_eq!(level, 1);
        assert_eq!(events.count(|e| matches!(e, GameEvent::ItemGained { .. })), 1);
        assert_eq!(
            events.count(|e| matches!(e, GameEvent::ShopClosed { skipped: false })),
            1
        );
    }

    #[test]
    fn test_select_requires_open_shop_and_valid_index() {
        let defs = defs();
        let mut weapons = WeaponSystem::new(WeaponConfig::default());
        let mut passives = PassiveSystem::new(6);
        let mut events = EventLog::new();
        let mut shop = Shop::new(ShopConfig::default(), false);

        let closed = shop.select(
            0,
            Inventory {
                defs: &defs,
                weapons: &mut weapons,
                passives: &mut passives,
            },
            &mut events,
        );
        assert!(matches!(closed, Err(CoreError::InvalidState(_))));

        let mut rng = Pcg32::seed_from_u64(5);
        shop.open(&defs, &weapons, &passives, 0.0, &mut rng, &mut events);
        let stale = shop.select(
            9,
            Inventory {
                defs: &defs,
                weapons: &mut weapons,
                passives: &mut passives,
            },
            &mut events,
        );
        assert!(matches!(stale, Err(CoreError::InvalidState(_))));
        assert!(shop.is_open());
        assert!(weapons.weapons().is_empty());
    }

    #[test]
    fn test_reroll_rejected_without_funds() {
        let defs = defs();
        let weapons = WeaponSystem::new(WeaponConfig::default());
        let passives = PassiveSystem::new(6);
        let mut events = EventLog::new();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut player = PlayerState::new(&PlayerConfig::default());
        let mut shop = Shop::new(ShopConfig::default(), false);

        shop.open(&defs, &weapons, &passives, 0.0, &mut rng, &mut events);
        let before = shop.cards().to_vec();
        player.earn(3);
        let result = shop.reroll(
            &mut player,
            &defs,
            &weapons,
            &passives,
            0.0,
            &mut rng,
            &mut events,
        );
        assert_eq!(
            result,
            Err(CoreError::InsufficientFunds {
                cost: 10,
                balance: 3
            })
        );
        assert_eq!(player.currency, 3);
        assert_eq!(shop.cards(), before.as_slice());

        player.earn(10);
        shop.reroll(
            &mut player,
            &defs,
            &weapons,
            &passives,
            0.0,
            &mut rng,
            &mut events,
        )
        .unwrap();
        assert_eq!(player.currency, 3);
        assert_eq!(events.count(|e| matches!(e, GameEvent::ShopRerolled { .. })), 1);
    }

    #[test]
    fn test_skip_closes_without_upgrade() {
        let defs = defs();
        let weapons = WeaponSystem::new(WeaponConfig::default());
        let passives = PassiveSystem::new(6);
        let mut events = EventLog::new();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut shop = Shop::new(ShopConfig::default(), false);

        assert!(shop.skip(&mut events).is_err());
        shop.open(&defs, &weapons, &passives, 0.0, &mut rng, &mut events);
        shop.skip(&mut events).unwrap();
        assert!(!shop.is_open());
        assert!(shop.cards().is_empty());
        assert_eq!(
            events.count(|e| matches!(e, GameEvent::ShopClosed { skipped: true })),
            1
        );
    }

    proptest! {
        #[test]
        fn prop_rarity_weights_normalized(luck in -1000.0f32..1000.0) {
            let w = compute_rarity_weights(luck, &RarityTable::default());
            prop_assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-6);
            prop_assert!(w.iter().all(|&x| x >= 0.0));
        }

        #[test]
        fn prop_offer_has_no_duplicates(seed in any::<u64>(), count in 1usize..6) {
            let defs = defs();
            let weapons = WeaponSystem::new(WeaponConfig::default());
            let passives = PassiveSystem::new(6);
            let weights = compute_rarity_weights(0.0, &RarityTable::default());
            let mut rng = Pcg32::seed_from_u64(seed);
            let pool = build_candidate_pool(&defs, &weapons, &passives);
            let cards = generate_cards(pool, count, &weights, &mut rng);
            prop_assert_eq!(cards.len(), count);
            let mut ids: Vec<_> = cards.iter().map(|c| c.id.clone()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), count);
        }
    }
}
