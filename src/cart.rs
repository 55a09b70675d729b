use std::collections::HashMap;

use crate::types::{CartEntry, CartLine, Product};

/// Locate the cart line shown at `row` when every cart's lines are listed in order
pub fn line_at(entries: &[CartEntry], row: usize) -> Option<(usize, usize)> {
    let mut remaining = row;
    for (entry_idx, entry) in entries.iter().enumerate() {
        if remaining < entry.products.len() {
            return Some((entry_idx, remaining));
        }
        remaining -= entry.products.len();
    }
    None
}

pub fn line_count(entries: &[CartEntry]) -> usize {
    entries.iter().map(|e| e.products.len()).sum()
}

/// Set a line's quantity. Zero is not a quantity; use [`remove_line`].
pub fn set_quantity(entries: &mut [CartEntry], entry_id: &str, product_id: &str, quantity: u32) {
    if quantity == 0 {
        return;
    }
    if let Some(line) = entries
        .iter_mut()
        .filter(|e| e.id == entry_id)
        .flat_map(|e| e.products.iter_mut())
        .find(|l| l.product_id == product_id)
    {
        line.quantity = quantity;
    }
}

/// Remove a line; a cart left with no lines is removed as well.
pub fn remove_line(entries: &mut Vec<CartEntry>, entry_id: &str, product_id: &str) {
    for entry in entries.iter_mut().filter(|e| e.id == entry_id) {
        entry.products.retain(|l| l.product_id != product_id);
    }
    entries.retain(|e| e.id != entry_id || !e.products.is_empty());
}

pub fn item_count(entry: &CartEntry) -> u32 {
    entry.products.iter().map(|l| l.quantity).sum()
}

/// Price of a cart from known product details. `None` until every line's
/// product has been looked up.
pub fn entry_total(entry: &CartEntry, catalog: &HashMap<String, Product>) -> Option<f64> {
    entry.products.iter().try_fold(0.0, |total, line| {
        let product = catalog.get(&line.product_id)?;
        Some(total + product.price * f64::from(line.quantity))
    })
}
