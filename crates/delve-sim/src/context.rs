//! Simulation context: the explicit state value every system receives.
//!
//! Created once per session and reset (not recreated) between runs.

use std::collections::VecDeque;
use std::sync::Arc;

use hecs::{Entity, RefMut, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use delve_core::catalog::Catalog;
use delve_core::components::*;
use delve_core::config::DevParams;
use delve_core::constants::*;
use delve_core::enums::*;
use delve_core::events::*;
use delve_core::types::{effective_delta_ms, SimTime};

use crate::schedule::FlowSchedule;

/// An attack that became ready this tick. Consumed by the Combat system.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAttack {
    pub attacker: Entity,
    pub side: Side,
    /// Variance- and crit-rolled damage before any reduction.
    pub damage: i32,
    pub is_crit: bool,
    /// Poison applied to the target if the attack lands: (damage per second, seconds).
    pub poison: Option<(f64, f64)>,
}

/// A power cast requested this tick. Consumed by the Power system.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCast {
    pub caster: Entity,
    pub power_id: String,
}

pub struct SimContext {
    pub world: World,
    pub catalog: Arc<Catalog>,
    pub dev: DevParams,
    pub rng: ChaCha8Rng,
    pub time: SimTime,
    /// Effective milliseconds of the tick being processed.
    pub dt_ms: f64,

    pub game_state: Entity,
    pub player: Option<Entity>,
    pub enemy: Option<Entity>,

    pub pending_attacks: Vec<PendingAttack>,
    pub pending_casts: Vec<PendingCast>,
    pub triggers: Vec<TriggerEvent>,

    pub animations: Vec<AnimationEvent>,
    pub log: VecDeque<LogEntry>,
    pub floating: Vec<FloatingEffect>,
    next_animation_id: u64,
    next_floating_id: u64,

    pub schedule: FlowSchedule,
    pub despawn_buffer: Vec<Entity>,
}

impl SimContext {
    pub fn new(catalog: Arc<Catalog>, dev: DevParams, seed: u64, speed: f64) -> Self {
        let mut world = World::new();
        let game_state = world.spawn((new_game_state(speed),));
        Self {
            world,
            catalog,
            dev,
            rng: ChaCha8Rng::seed_from_u64(seed),
            time: SimTime::default(),
            dt_ms: effective_delta_ms(speed),
            game_state,
            player: None,
            enemy: None,
            pending_attacks: Vec::new(),
            pending_casts: Vec::new(),
            triggers: Vec::new(),
            animations: Vec::new(),
            log: VecDeque::new(),
            floating: Vec::new(),
            next_animation_id: 0,
            next_floating_id: 0,
            schedule: FlowSchedule::default(),
            despawn_buffer: Vec::new(),
        }
    }

    /// Clear all run state. The RNG stream continues.
    pub fn reset(&mut self) {
        let speed = self.game_state().map(|gs| gs.speed).unwrap_or(1.0);
        self.world.clear();
        self.game_state = self.world.spawn((new_game_state(speed),));
        self.player = None;
        self.enemy = None;
        self.time = SimTime::default();
        self.dt_ms = effective_delta_ms(speed);
        self.pending_attacks.clear();
        self.pending_casts.clear();
        self.triggers.clear();
        self.animations.clear();
        self.log.clear();
        self.floating.clear();
        self.schedule.clear();
        self.despawn_buffer.clear();
    }

    pub fn dt_secs(&self) -> f64 {
        self.dt_ms / 1000.0
    }

    pub fn tick(&self) -> u64 {
        self.time.tick
    }

    // --- Game state access ---

    pub fn game_state(&self) -> Option<GameState> {
        self.world
            .get::<&GameState>(self.game_state)
            .ok()
            .map(|gs| (*gs).clone())
    }

    pub fn game_state_mut(&self) -> Option<RefMut<'_, GameState>> {
        self.world.get::<&mut GameState>(self.game_state).ok()
    }

    pub fn phase(&self) -> GamePhase {
        self.world
            .get::<&GameState>(self.game_state)
            .map(|gs| gs.phase)
            .unwrap_or_default()
    }

    pub fn set_phase(&mut self, phase: GamePhase) {
        if let Some(mut gs) = self.game_state_mut() {
            gs.phase = phase;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.world
            .get::<&GameState>(self.game_state)
            .map(|gs| gs.paused)
            .unwrap_or(false)
    }

    /// Combat phase with an engaged enemy: gameplay systems run.
    pub fn combat_engaged(&self) -> bool {
        self.world
            .get::<&GameState>(self.game_state)
            .map(|gs| gs.phase == GamePhase::Combat && gs.combat_stage == CombatStage::Engaged)
            .unwrap_or(false)
    }

    pub fn push_popup(&mut self, popup: Popup) {
        if let Some(mut gs) = self.game_state_mut() {
            gs.popups.push(popup);
        }
    }

    // --- Roles ---

    pub fn entity(&self, side: Side) -> Option<Entity> {
        match side {
            Side::Player => self.player,
            Side::Enemy => self.enemy,
        }
    }

    pub fn side_of(&self, entity: Entity) -> Option<Side> {
        if Some(entity) == self.player {
            Some(Side::Player)
        } else if Some(entity) == self.enemy {
            Some(Side::Enemy)
        } else {
            None
        }
    }

    /// Display name for combat log lines.
    pub fn name_of(&self, entity: Entity) -> String {
        if Some(entity) == self.player {
            return "You".to_string();
        }
        self.world
            .get::<&Enemy>(entity)
            .map(|e| e.name.clone())
            .unwrap_or_else(|_| "Something".to_string())
    }

    // --- Presentation output ---

    pub fn emit(&mut self, kind: AnimationKind) {
        self.next_animation_id += 1;
        self.animations.push(AnimationEvent {
            id: self.next_animation_id,
            tick: self.time.tick,
            kind,
            consumed: false,
        });
    }

    pub fn log(&mut self, category: LogCategory, message: impl Into<String>) {
        self.log.push_back(LogEntry {
            tick: self.time.tick,
            category,
            message: message.into(),
        });
        while self.log.len() > COMBAT_LOG_CAPACITY {
            self.log.pop_front();
        }
    }

    pub fn float(&mut self, side: Side, kind: FloatingKind, value: i32) {
        self.next_floating_id += 1;
        self.floating.push(FloatingEffect {
            id: self.next_floating_id,
            side,
            kind,
            value,
            until_tick: self.time.tick + FLOATING_EFFECT_TICKS,
        });
    }

    /// Attach a short-lived visual marker to a combatant.
    pub fn mark(&mut self, entity: Entity, kind: VisualKind) {
        let until_tick = self.time.tick + HIT_FLASH_TICKS;
        if let Ok(mut markers) = self.world.get::<&mut VisualMarkers>(entity) {
            markers.0.retain(|m| m.kind != kind);
            markers.0.push(VisualMarker { kind, until_tick });
        }
    }

    /// Record a trigger for the path ability and resource generation systems.
    pub fn record(&mut self, trigger: Trigger, payload: TriggerPayload) {
        self.triggers.push(TriggerEvent { trigger, payload });
    }
}

fn new_game_state(speed: f64) -> GameState {
    GameState {
        phase: GamePhase::Menu,
        floor: 1,
        room: 0,
        rooms_per_floor: ROOMS_PER_FLOOR,
        final_floor: FINAL_FLOOR,
        paused: false,
        speed,
        combat_stage: CombatStage::Idle,
        popups: Vec::new(),
    }
}
