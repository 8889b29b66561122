//! Cosmetic item registry.
//!
//! The catalog is an immutable table. Anything that needs it (profile
//! queries, the reward engine) receives an `ItemRegistry` value instead of
//! reaching for a global.

use serde::{Deserialize, Serialize};

/// Cosmetic slot an item occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSlot {
    Hat,
    Face,
    Aura,
    Trail,
}

impl ItemSlot {
    pub const ALL: [ItemSlot; 4] = [ItemSlot::Hat, ItemSlot::Face, ItemSlot::Aura, ItemSlot::Trail];

    pub fn name(&self) -> &'static str {
        match self {
            ItemSlot::Hat => "hat",
            ItemSlot::Face => "face",
            ItemSlot::Aura => "aura",
            ItemSlot::Trail => "trail",
        }
    }
}

/// An unlockable cosmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Item {
    pub id: &'static str,
    pub name: &'static str,
    pub slot: ItemSlot,
    /// Level required to enter the choice pool
    pub min_level: u32,
    /// Granted to every profile, never offered
    pub starter: bool,
}

impl Item {
    pub const fn new(id: &'static str, name: &'static str, slot: ItemSlot, min_level: u32) -> Self {
        Self { id, name, slot, min_level, starter: false }
    }

    pub const fn starter(id: &'static str, name: &'static str, slot: ItemSlot) -> Self {
        Self { id, name, slot, min_level: 1, starter: true }
    }
}

use ItemSlot::{Aura, Face, Hat, Trail};

/// Built-in catalog
pub const ITEM_CATALOG: &[Item] = &[
    // Hats
    Item::starter("wizard", "Wizard Hat", Hat),
    Item::new("party", "Party Hat", Hat, 2),
    Item::new("headphones", "Headphones", Hat, 4),
    Item::new("beret", "Artist Beret", Hat, 6),
    Item::new("tophat", "Top Hat", Hat, 8),
    Item::new("zeus", "Zeus Hair", Hat, 10),
    Item::new("catears", "Cat Ears", Hat, 11),
    Item::new("crown", "Royal Crown", Hat, 14),
    Item::new("propeller", "Propeller Hat", Hat, 17),
    Item::new("pirate", "Pirate Hat", Hat, 20),
    Item::new("viking", "Viking Helmet", Hat, 24),
    Item::new("chef", "Chef Toque", Hat, 28),
    Item::new("halo", "Angel Halo", Hat, 32),
    Item::new("jester", "Jester Cap", Hat, 37),
    Item::new("cowboy", "Cowboy Hat", Hat, 42),
    Item::new("fedora", "Fedora", Hat, 48),
    // Faces
    Item::starter("mustache", "Mustache", Face),
    Item::new("dealwithit", "Deal With It", Face, 3),
    Item::new("monocle", "Monocle", Face, 7),
    Item::new("pipe", "Sherlock Pipe", Face, 10),
    Item::new("borat", "Borat Stache", Face, 13),
    Item::new("eyepatch", "Eye Patch", Face, 18),
    Item::new("glasses3d", "3D Glasses", Face, 23),
    Item::new("groucho", "Groucho Glasses", Face, 30),
    Item::new("bandana", "Ninja Mask", Face, 38),
    Item::new("wizardbeard", "Wizard Beard", Face, 45),
    // Auras
    Item::new("aura_pixel", "Pixel Dust", Aura, 5),
    Item::new("aura_flame", "Flame Aura", Aura, 9),
    Item::new("aura_frost", "Frost Aura", Aura, 15),
    Item::new("aura_electric", "Electric Aura", Aura, 21),
    Item::new("aura_shadow", "Shadow Aura", Aura, 27),
    Item::new("aura_heart", "Heart Aura", Aura, 34),
    Item::new("aura_code", "Matrix Aura", Aura, 40),
    Item::new("aura_rainbow", "Rainbow Aura", Aura, 47),
    // Trails
    Item::new("trail_sparkle", "Sparkle Trail", Trail, 12),
    Item::new("trail_flame", "Flame Trail", Trail, 19),
    Item::new("trail_frost", "Ice Trail", Trail, 26),
    Item::new("trail_hearts", "Heart Trail", Trail, 33),
    Item::new("trail_pixel", "Pixel Trail", Trail, 41),
    Item::new("trail_rainbow", "Rainbow Trail", Trail, 50),
];

/// Immutable item table handed to whoever needs to look items up
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRegistry {
    items: Vec<Item>,
}

impl ItemRegistry {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// The built-in catalog
    pub fn builtin() -> Self {
        Self::new(ITEM_CATALOG.to_vec())
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn starters(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.starter)
    }

    pub fn in_slot(&self, slot: ItemSlot) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |item| item.slot == slot)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
