//! Fixture item definitions shared by tests and the headless harness.

use anyhow::{Context, Result};
use stalway_core::shape::parse_rows;
use stalway_core::{ItemCatalog, ItemDefinition, ReloadType, WeaponProperties};

/// Id of the 1x1 fixture item.
pub const AMMO_BOX: u32 = 1;
/// Id of the 2x2 fixture item.
pub const MEDKIT: u32 = 2;
/// Id of the L-shaped 4x2 weapon.
pub const RIFLE: u32 = 3;
/// Id of the L-shaped 2x2 weapon.
pub const PISTOL: u32 = 4;
/// Id of the 1x2 fixture item.
pub const GRENADE: u32 = 5;
/// Id of the 3x1 fixture item.
pub const CROWBAR: u32 = 6;

const SHAPES: &[(u32, &str, &[&str])] = &[
    (AMMO_BOX, "ammo_box", &["#"]),
    (MEDKIT, "medkit", &["##", "##"]),
    (RIFLE, "rifle", &["####", "#..."]),
    (PISTOL, "pistol", &["##", "#."]),
    (GRENADE, "grenade", &["#", "#"]),
    (CROWBAR, "crowbar", &["###"]),
];

/// Fixture definitions, in id order.
pub fn sample_definitions() -> Result<Vec<ItemDefinition>> {
    SHAPES
        .iter()
        .map(|&(id, name, rows)| {
            let shape =
                parse_rows(rows).with_context(|| format!("fixture shape for {name}"))?;
            let definition = ItemDefinition::new(id, name, shape);
            Ok(match id {
                RIFLE => definition.with_weapon(WeaponProperties::default()),
                PISTOL => definition.with_weapon(WeaponProperties {
                    ammo: 12,
                    ammo_in_magazine: 12,
                    reload_type: ReloadType::Bullets,
                    ..WeaponProperties::default()
                }),
                _ => definition,
            })
        })
        .collect()
}

/// Catalog holding [`sample_definitions`].
pub fn sample_catalog() -> Result<ItemCatalog> {
    Ok(ItemCatalog::from_definitions(sample_definitions()?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_catalog_has_every_fixture() {
        let catalog = sample_catalog().unwrap();
        assert_eq!(catalog.len(), SHAPES.len());
        assert!(catalog.get(RIFLE).unwrap().has_weapon_properties());
        assert!(!catalog.get(MEDKIT).unwrap().has_weapon_properties());
        assert_eq!(catalog.id_by_name("crowbar"), Some(CROWBAR));
    }
}
