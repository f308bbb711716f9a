//! Static game data: classes, powers, paths, path abilities, stances,
//! enhancements, enemies and items.
//!
//! Each table is keyed by id. The catalog is read-only to the simulation;
//! a built-in data set is embedded and validated on load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::error::CatalogError;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

// --- Classes ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub id: String,
    pub name: String,
    pub health: i32,
    pub resource_kind: ResourceKind,
    pub resource_max: i32,
    pub resource_regen: f64,
    pub attack: i32,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    pub variance: f64,
    pub defense: i32,
    pub speed: f64,
    pub attack_interval_ms: f64,
    pub fortune: i32,
    pub gold: u32,
    pub powers: Vec<String>,
    pub paths: Vec<String>,
}

// --- Powers ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerDef {
    pub id: String,
    pub name: String,
    pub cost: i32,
    pub cooldown_ms: f64,
    pub effect: PowerEffect,
}

/// Resolution of a cast power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PowerEffect {
    /// `base + attack × attack_scaling`, variance-rolled, defense-reduced, min 1.
    Damage { base: i32, attack_scaling: f64 },
    /// Flat amount plus a percent of max health, capped at max.
    Heal { amount: i32, percent: f64 },
    /// Timed stat multiplier on the caster.
    Buff {
        stat: BuffStat,
        multiplier: f64,
        duration_ms: f64,
    },
    /// Flat damage plus a crowd-control status on the target.
    Debuff {
        damage: i32,
        status: StatusKind,
        #[serde(default)]
        magnitude: f64,
        #[serde(default)]
        duration_secs: Option<f64>,
    },
}

// --- Paths ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Proc-based abilities fuelled by a path resource.
    Active,
    /// Switchable stances with enhancements.
    Stance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResourceDef {
    pub kind: PathResourceKind,
    pub max: i32,
    pub generation: BTreeMap<Trigger, i32>,
}

/// Flat stat bonus granted by subpaths and items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBonus {
    pub max_health: i32,
    pub attack: i32,
    pub defense: i32,
    pub crit_chance: f64,
    pub speed: f64,
    pub fortune: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubpathDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bonus: StatBonus,
    /// Abilities (active path) or enhancements (stance path) added to the offer pool.
    #[serde(default)]
    pub abilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathDef {
    pub id: String,
    pub name: String,
    pub class_id: String,
    pub kind: PathKind,
    #[serde(default)]
    pub resource: Option<PathResourceDef>,
    /// Base offer pool: path abilities (active) or enhancements (stance).
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Stance ids, first is active on selection.
    #[serde(default)]
    pub stances: Vec<String>,
    #[serde(default)]
    pub subpaths: Vec<SubpathDef>,
}

impl PathDef {
    pub fn subpath(&self, id: &str) -> Option<&SubpathDef> {
        self.subpaths.iter().find(|s| s.id == id)
    }
}

// --- Path abilities ---

/// Extra gate evaluated after the proc roll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityCondition {
    /// Player health below this percent of max.
    HpBelow { percent: f64 },
    /// Enemy health below this percent of max.
    EnemyHpBelow { percent: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityEffect {
    /// Heal the player by a percent of max health.
    Heal { percent: f64 },
    Buff {
        stat: BuffStat,
        multiplier: f64,
        duration_ms: f64,
    },
    /// Damage-over-time or debuff on the enemy.
    EnemyStatus {
        status: StatusKind,
        #[serde(default)]
        damage_per_sec: f64,
        #[serde(default)]
        magnitude: f64,
        duration_secs: f64,
    },
    /// Status on the player (e.g. death immunity).
    SelfStatus { status: StatusKind, duration_secs: f64 },
    /// Shield worth a percent of max health.
    Shield { percent: f64, duration_ms: f64 },
    Stun { duration_secs: f64 },
    Slow { percent: f64, duration_secs: f64 },
    /// Restore path resource (or base resource when the path has none).
    RestoreResource { amount: i32 },
    /// Direct damage to the enemy, `base + attack × attack_scaling`.
    Damage { base: i32, attack_scaling: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathAbilityDef {
    pub id: String,
    pub name: String,
    pub trigger: Trigger,
    #[serde(default = "always")]
    pub chance: f64,
    #[serde(default)]
    pub cooldown_ms: f64,
    #[serde(default)]
    pub condition: Option<AbilityCondition>,
    pub effect: AbilityEffect,
}

fn always() -> f64 {
    1.0
}

// --- Stances ---

/// One stance or enhancement parameter.
///
/// Percent values are whole percents; chances are in `[0, 1]`;
/// thresholds are percent of max health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StanceEffect {
    ArmorPercent { value: f64 },
    PowerPercent { value: f64 },
    SpeedPercent { value: f64 },
    DamageReductionPercent { value: f64 },
    MaxHealthPercent { value: f64 },
    /// Health regenerated per second as percent of max.
    RegenPercent { value: f64 },
    Reflect { percent: f64 },
    Counter { chance: f64, damage_percent: f64 },
    Lifesteal { percent: f64 },
    AutoBlock { chance: f64 },
    DamageAura { damage_per_sec: f64 },
    HexAura { reduction_percent: f64 },
    /// Flat armor below a health threshold.
    LowHpArmor { threshold: f64, bonus: f64 },
    LowHpDamage { threshold: f64, bonus: f64 },
    SurviveLethal,
    MaxDamagePerHit { percent: f64 },
    HealOnHit { chance: f64, percent: f64 },
    DamageStacks { per_stack: f64, max_stacks: u32 },
    NextAttackBonus { percent: f64 },
    ProcBurn {
        chance: f64,
        bonus_damage: f64,
        burn_dps: f64,
        duration_secs: f64,
    },
    BurnAmplify { percent: f64 },
    BurnTickRate { rate: f64 },
    BurnExecute { threshold: f64, bonus_percent: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StanceDef {
    pub id: String,
    pub name: String,
    pub path_id: String,
    pub effects: Vec<StanceEffect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementDef {
    pub id: String,
    pub name: String,
    /// Only active while this stance is.
    pub stance_id: String,
    pub effects: Vec<StanceEffect>,
}

// --- Enemies ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnemyAbilityEffect {
    Enrage { attack_bonus: i32, duration_ms: f64 },
    Fortify { defense_bonus: i32, duration_ms: f64 },
    Heal { percent: f64 },
    PoisonStrike { damage_per_sec: f64, duration_secs: f64 },
}

/// Rolled each time the enemy's attack becomes ready.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyAbility {
    pub chance: f64,
    pub effect: EnemyAbilityEffect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDef {
    pub id: String,
    pub name: String,
    pub tier: EnemyTier,
    pub health: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: f64,
    pub attack_interval_ms: f64,
    #[serde(default)]
    pub crit_chance: f64,
    pub xp: u32,
    pub gold: u32,
    pub min_floor: u32,
    pub max_floor: u32,
    #[serde(default)]
    pub abilities: Vec<EnemyAbility>,
}

// --- Items ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    pub cost: u32,
    /// Enhancement cost per current level.
    pub enhance_cost: u32,
    pub max_level: u32,
    /// Applied on purchase and again per enhancement level.
    pub bonus: StatBonus,
}

/// On-disk layout: one array per table.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    classes: Vec<ClassDef>,
    powers: Vec<PowerDef>,
    paths: Vec<PathDef>,
    #[serde(default)]
    path_abilities: Vec<PathAbilityDef>,
    #[serde(default)]
    stances: Vec<StanceDef>,
    #[serde(default)]
    enhancements: Vec<EnhancementDef>,
    enemies: Vec<EnemyDef>,
    #[serde(default)]
    items: Vec<ItemDef>,
}

/// All static tables, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub classes: BTreeMap<String, ClassDef>,
    pub powers: BTreeMap<String, PowerDef>,
    pub paths: BTreeMap<String, PathDef>,
    pub path_abilities: BTreeMap<String, PathAbilityDef>,
    pub stances: BTreeMap<String, StanceDef>,
    pub enhancements: BTreeMap<String, EnhancementDef>,
    pub enemies: BTreeMap<String, EnemyDef>,
    pub items: BTreeMap<String, ItemDef>,
}

fn index<T>(
    table: &'static str,
    rows: Vec<T>,
    id: impl Fn(&T) -> &str,
) -> Result<BTreeMap<String, T>, CatalogError> {
    let mut map = BTreeMap::new();
    for row in rows {
        let key = id(&row).to_string();
        if map.contains_key(&key) {
            return Err(CatalogError::DuplicateId { table, id: key });
        }
        map.insert(key, row);
    }
    Ok(map)
}

fn require<T>(
    map: &BTreeMap<String, T>,
    table: &'static str,
    owner: &str,
    id: &str,
) -> Result<(), CatalogError> {
    if map.contains_key(id) {
        Ok(())
    } else {
        Err(CatalogError::UnknownReference {
            owner: owner.to_string(),
            table,
            id: id.to_string(),
        })
    }
}

impl Catalog {
    /// Parse and validate a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let catalog = Catalog {
            classes: index("class", file.classes, |c| c.id.as_str())?,
            powers: index("power", file.powers, |p| p.id.as_str())?,
            paths: index("path", file.paths, |p| p.id.as_str())?,
            path_abilities: index("path ability", file.path_abilities, |a| a.id.as_str())?,
            stances: index("stance", file.stances, |s| s.id.as_str())?,
            enhancements: index("enhancement", file.enhancements, |e| e.id.as_str())?,
            enemies: index("enemy", file.enemies, |e| e.id.as_str())?,
            items: index("item", file.items, |i| i.id.as_str())?,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The embedded default data set.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.classes.is_empty() {
            return Err(CatalogError::EmptyTable { table: "class" });
        }
        if self.enemies.is_empty() {
            return Err(CatalogError::EmptyTable { table: "enemy" });
        }

        for class in self.classes.values() {
            for power in &class.powers {
                require(&self.powers, "power", &class.id, power)?;
            }
            for path in &class.paths {
                require(&self.paths, "path", &class.id, path)?;
            }
        }

        for path in self.paths.values() {
            require(&self.classes, "class", &path.id, &path.class_id)?;
            let pool_table = match path.kind {
                PathKind::Active => "path ability",
                PathKind::Stance => "enhancement",
            };
            let pool = path
                .abilities
                .iter()
                .chain(path.subpaths.iter().flat_map(|s| s.abilities.iter()));
            for id in pool {
                match path.kind {
                    PathKind::Active => require(&self.path_abilities, pool_table, &path.id, id)?,
                    PathKind::Stance => require(&self.enhancements, pool_table, &path.id, id)?,
                }
            }
            for stance in &path.stances {
                require(&self.stances, "stance", &path.id, stance)?;
            }
        }

        for stance in self.stances.values() {
            require(&self.paths, "path", &stance.id, &stance.path_id)?;
        }
        for enhancement in self.enhancements.values() {
            require(&self.stances, "stance", &enhancement.id, &enhancement.stance_id)?;
        }
        Ok(())
    }

    pub fn class(&self, id: &str) -> Option<&ClassDef> {
        self.classes.get(id)
    }

    pub fn power(&self, id: &str) -> Option<&PowerDef> {
        self.powers.get(id)
    }

    pub fn path(&self, id: &str) -> Option<&PathDef> {
        self.paths.get(id)
    }

    pub fn path_ability(&self, id: &str) -> Option<&PathAbilityDef> {
        self.path_abilities.get(id)
    }

    pub fn stance(&self, id: &str) -> Option<&StanceDef> {
        self.stances.get(id)
    }

    pub fn enhancement(&self, id: &str) -> Option<&EnhancementDef> {
        self.enhancements.get(id)
    }

    pub fn enemy(&self, id: &str) -> Option<&EnemyDef> {
        self.enemies.get(id)
    }

    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.get(id)
    }

    /// Enemies eligible on `floor`: bosses when `boss` is set, otherwise the rest.
    ///
    /// Falls back to every enemy of the requested kind if none cover the floor,
    /// and to the whole table if that kind is missing entirely.
    pub fn enemies_for(&self, floor: u32, boss: bool) -> Vec<&EnemyDef> {
        let of_kind: Vec<&EnemyDef> = self
            .enemies
            .values()
            .filter(|e| (e.tier == EnemyTier::Boss) == boss)
            .collect();
        let on_floor: Vec<&EnemyDef> = of_kind
            .iter()
            .copied()
            .filter(|e| floor >= e.min_floor && floor <= e.max_floor)
            .collect();
        if !on_floor.is_empty() {
            on_floor
        } else if !of_kind.is_empty() {
            of_kind
        } else {
            self.enemies.values().collect()
        }
    }
}
