//! Item definitions - identity, shape and optional weapon capability

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::shape::{self, Shape};

/// Item identifier referencing the item catalog.
pub type ItemId = u32;

/// Immutable description of an item kind.
///
/// Storages share definitions through `Arc`; only `shape` matters for
/// placement, the remaining fields are carried for the gameplay layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Catalog identifier.
    pub id: ItemId,
    /// Human-readable identifier (e.g., "medkit").
    pub name: String,
    /// Localization key for the display name.
    #[serde(default)]
    pub name_translate_key: String,
    /// Localization key for the description.
    #[serde(default)]
    pub description_translate_key: String,
    /// Sprite asset used by inventory views.
    #[serde(default)]
    pub inventory_sprite: String,
    /// World model asset.
    #[serde(default)]
    pub model: String,
    /// Weight in kilograms.
    #[serde(default)]
    pub weight: f32,
    /// Maximum number of units per stack.
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
    /// Cells covered in the unrotated orientation.
    pub shape: Shape,
    /// Present when the item can be wielded as a weapon.
    #[serde(default)]
    pub weapon: Option<WeaponProperties>,
}

fn default_max_stack() -> u32 {
    1
}

impl ItemDefinition {
    /// Minimal definition with just an id, a name and a shape.
    pub fn new(id: ItemId, name: impl Into<String>, shape: Shape) -> Self {
        Self {
            id,
            name: name.into(),
            name_translate_key: String::new(),
            description_translate_key: String::new(),
            inventory_sprite: String::new(),
            model: String::new(),
            weight: 0.0,
            max_stack: default_max_stack(),
            shape,
            weapon: None,
        }
    }

    /// Attach weapon properties.
    pub fn with_weapon(mut self, weapon: WeaponProperties) -> Self {
        self.weapon = Some(weapon);
        self
    }

    /// Capability check used instead of a type hierarchy.
    pub fn has_weapon_properties(&self) -> bool {
        self.weapon.is_some()
    }

    /// Weapon properties, if any.
    pub fn weapon(&self) -> Option<&WeaponProperties> {
        self.weapon.as_ref()
    }

    /// Number of grid cells this item covers.
    pub fn cell_count(&self) -> usize {
        shape::cell_count(&self.shape)
    }
}

/// How a weapon delivers its attack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShootType {
    /// Does not attack.
    #[default]
    None,
    /// Sphere overlap in front of the wielder (melee).
    Overlap,
    /// Spawns projectiles.
    Projectile,
}

/// Trigger behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomaticType {
    /// Fires while held.
    #[default]
    Automatic,
    /// Fixed number of shots per trigger pull.
    Burst,
    /// One shot per trigger pull.
    SemiAuto,
}

/// Reload behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadType {
    /// Never reloads.
    None,
    /// Reloads one round at a time.
    Bullets,
    /// Swaps whole magazines.
    #[default]
    Magazine,
}

bitflags! {
    /// Damage channels applied on hit.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DamageTypes: u8 {
        /// Direct damage on hit.
        const INSTANT = 0b01;
        /// Applies lingering effects (poison, burning, ...).
        const EFFECTS = 0b10;
    }
}

/// Weapon capability attached to an item by composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponProperties {
    /// Attack delivery.
    pub shoot_type: ShootType,
    /// Reach of overlap attacks.
    pub distance: f32,
    /// Impulse applied to hit bodies.
    pub hit_force: f32,
    /// Damage channels.
    pub damage_types: DamageTypes,
    /// Health damage for instant hits.
    pub damage: f32,
    /// Armor damage for instant hits.
    pub armor_damage: f32,
    /// Armor penetration percentage (0-100).
    pub armor_penetration: f32,
    /// Projectiles spawned per shot.
    pub bullets_per_shot: u32,
    /// Horizontal/vertical spread.
    pub spread: [f32; 2],
    /// Trigger behaviour.
    pub automatic_type: AutomaticType,
    /// Shots per burst (burst mode only).
    pub shots_per_burst: u32,
    /// Seconds between shots inside a burst.
    pub firerate_in_burst: f32,
    /// Seconds after a burst completes.
    pub delay_after_burst: f32,
    /// Seconds between shots.
    pub firerate: f32,
    /// Reload behaviour.
    pub reload_type: ReloadType,
    /// Total ammunition.
    pub ammo: u32,
    /// Rounds per magazine.
    pub ammo_in_magazine: u32,
}

impl Default for WeaponProperties {
    fn default() -> Self {
        Self {
            shoot_type: ShootType::None,
            distance: 1.0,
            hit_force: 400.0,
            damage_types: DamageTypes::INSTANT,
            damage: 25.0,
            armor_damage: 2.0,
            armor_penetration: 50.0,
            bullets_per_shot: 1,
            spread: [0.25, 0.25],
            automatic_type: AutomaticType::Automatic,
            shots_per_burst: 3,
            firerate_in_burst: 0.05,
            delay_after_burst: 0.25,
            firerate: 0.1,
            reload_type: ReloadType::Magazine,
            ammo: 30,
            ammo_in_magazine: 30,
        }
    }
}

impl WeaponProperties {
    /// True when hits deal direct damage through an overlap attack.
    pub fn deals_instant_overlap_damage(&self) -> bool {
        self.shoot_type == ShootType::Overlap && self.damage_types.contains(DamageTypes::INSTANT)
    }

    /// True when the weapon needs reloading at all.
    pub fn reloads(&self) -> bool {
        self.reload_type != ReloadType::None
    }
}
