//! Item catalog, prices and inventories
//!
//! An inventory is a list of item stacks; a stack is one item id plus an
//! amount (and, for planet stock, the prices the planet trades at).

use rand::Rng;
use thiserror::Error;

use crate::engine::{Behavior, Flags, ObjectSpec};

pub const ITEM_MANAGER_ID: &str = "item_manager";

/// Buy prices are marked up, sell prices marked down, from a base price
const BUY_MARKUP: f32 = 1.1;
const SELL_MARKDOWN: f32 = 0.9;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDef {
    pub id: &'static str,
    pub name: &'static str,
    pub min_price: f32,
    pub max_price: f32,
    pub unit_short: &'static str,
    pub unit_full: &'static str,
}

pub const CATALOG: [ItemDef; 2] = [
    ItemDef {
        id: "fuel",
        name: "Fuel",
        min_price: 2.0,
        max_price: 10.0,
        unit_short: "L",
        unit_full: "Liters",
    },
    ItemDef {
        id: "uranium",
        name: "Uranium",
        min_price: 2000.0,
        max_price: 2250.0,
        unit_short: "KG",
        unit_full: "Kilograms",
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub id: &'static str,
    pub name: &'static str,
    pub unit_short: &'static str,
    /// Price a planet sells at, if it sells
    pub buy_price: Option<f32>,
    /// Price a planet buys at, if it buys
    pub sell_price: Option<f32>,
    pub amount: u32,
}

impl ItemStack {
    fn empty(def: &ItemDef) -> Self {
        Self {
            id: def.id,
            name: def.name,
            unit_short: def.unit_short,
            buy_price: None,
            sell_price: None,
            amount: 0,
        }
    }

    /// "Fuel 120 L" plus prices when present
    pub fn describe(&self) -> String {
        let mut line = format!("{} {} {}", self.name, self.amount, self.unit_short);
        if let Some(price) = self.buy_price {
            line.push_str(&format!("  buy {:.2}", price));
        }
        if let Some(price) = self.sell_price {
            line.push_str(&format!("  sell {:.2}", price));
        }
        line
    }
}

pub type Inventory = Vec<ItemStack>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("unknown item `{0}`")]
    UnknownItem(String),
    #[error("no `{0}` in inventory")]
    Missing(String),
    #[error("not enough `{id}`: have {have}, need {want}")]
    Insufficient { id: String, have: u32, want: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanetKind {
    Fuel,
    Mining,
}

impl PlanetKind {
    pub const ALL: [PlanetKind; 2] = [PlanetKind::Fuel, PlanetKind::Mining];

    pub fn label(self) -> &'static str {
        match self {
            PlanetKind::Fuel => "Fuel Planet",
            PlanetKind::Mining => "Mining Planet",
        }
    }
}

/// Catalog holder; other objects read it through the registry
#[derive(Debug, Clone)]
pub struct ItemManager {
    items: Vec<ItemDef>,
}

impl ItemManager {
    pub fn new() -> Self {
        Self {
            items: CATALOG.to_vec(),
        }
    }

    pub fn spec() -> ObjectSpec {
        ObjectSpec::new(ITEM_MANAGER_ID)
            .flags(Flags::ALWAYS_UPDATE)
            .behavior(ItemManager::new())
    }

    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.iter().find(|item| item.id == id)
    }

    fn require(&self, id: &str) -> Result<&ItemDef, InventoryError> {
        self.item(id).ok_or_else(|| InventoryError::UnknownItem(id.to_string()))
    }

    /// Base price somewhere in the item's range
    pub fn generate_price(&self, id: &str, rng: &mut impl Rng) -> Option<f32> {
        let item = self.item(id)?;
        Some(item.min_price + rng.gen::<f32>() * (item.max_price - item.min_price))
    }

    /// A stack with prices derived from a fresh base price
    pub fn generate_item(
        &self,
        id: &str,
        amount: u32,
        buys: bool,
        sells: bool,
        rng: &mut impl Rng,
    ) -> Result<ItemStack, InventoryError> {
        let item = self.require(id)?;
        let base = self.generate_price(id, rng).unwrap_or(item.min_price);
        let round = |p: f32| (p * 100.0).round() / 100.0;
        Ok(ItemStack {
            buy_price: buys.then(|| round(base * BUY_MARKUP)),
            sell_price: sells.then(|| round(base * SELL_MARKDOWN)),
            amount,
            ..ItemStack::empty(item)
        })
    }

    /// Stock a new planet of `kind` trades in
    pub fn generate_planet_resources(&self, kind: PlanetKind, rng: &mut impl Rng) -> Inventory {
        let stock = match kind {
            PlanetKind::Fuel => {
                let amount = rng.gen_range(0..5000);
                self.generate_item("fuel", amount, true, true, rng)
            }
            // Mines sell ore but never buy it back
            PlanetKind::Mining => {
                let amount = rng.gen_range(0..200);
                self.generate_item("uranium", amount, true, false, rng)
            }
        };
        stock.into_iter().collect()
    }

    /// Add to an existing stack, or start a new one
    pub fn add_to_inventory(&self, inventory: &mut Inventory, id: &str, amount: u32) -> Result<(), InventoryError> {
        let item = self.require(id)?;
        match inventory.iter_mut().find(|stack| stack.id == id) {
            Some(stack) => stack.amount = stack.amount.saturating_add(amount),
            None => inventory.push(ItemStack {
                amount,
                ..ItemStack::empty(item)
            }),
        }
        Ok(())
    }

    /// Remove `amount`; an emptied stack is dropped. Nothing changes on error.
    pub fn take_from_inventory(&self, inventory: &mut Inventory, id: &str, amount: u32) -> Result<(), InventoryError> {
        self.require(id)?;
        let index = inventory
            .iter()
            .position(|stack| stack.id == id)
            .ok_or_else(|| InventoryError::Missing(id.to_string()))?;
        let have = inventory[index].amount;
        if have < amount {
            return Err(InventoryError::Insufficient {
                id: id.to_string(),
                have,
                want: amount,
            });
        }
        if have == amount {
            inventory.remove(index);
        } else {
            inventory[index].amount -= amount;
        }
        Ok(())
    }
}

impl Default for ItemManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for ItemManager {}
