use uuid::Uuid;

use super::errors::DomainError;
use super::order::OrderItemInput;

pub const MAX_ITEM_QUANTITY: i32 = 99;
pub const MAX_CART_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub variant_id: Uuid,
    pub quantity: i32,
}

/// A shopper's basket. Lines are unique per variant and always hold a
/// quantity in `1..=MAX_ITEM_QUANTITY`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Adds `quantity` of a variant, merging into an existing line.
    pub fn add(&mut self, variant_id: Uuid, quantity: i32) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidInput("quantity must be positive".into()));
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(DomainError::InvalidInput(format!(
                "quantity cannot exceed {MAX_ITEM_QUANTITY}"
            )));
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.variant_id == variant_id) {
            let merged = line.quantity + quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(DomainError::InvalidInput(format!(
                    "quantity cannot exceed {MAX_ITEM_QUANTITY}"
                )));
            }
            line.quantity = merged;
            return Ok(());
        }
        if self.lines.len() >= MAX_CART_LINES {
            return Err(DomainError::InvalidInput(format!(
                "cart cannot hold more than {MAX_CART_LINES} items"
            )));
        }
        self.lines.push(CartLine { variant_id, quantity });
        Ok(())
    }

    pub fn remove(&mut self, variant_id: Uuid) -> Result<(), DomainError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.variant_id != variant_id);
        if self.lines.len() == before {
            return Err(DomainError::NotFound("Cart item"));
        }
        Ok(())
    }

    pub fn increase(&mut self, variant_id: Uuid) -> Result<(), DomainError> {
        let line = self.line_mut(variant_id)?;
        if line.quantity >= MAX_ITEM_QUANTITY {
            return Err(DomainError::InvalidInput(format!(
                "quantity cannot exceed {MAX_ITEM_QUANTITY}"
            )));
        }
        line.quantity += 1;
        Ok(())
    }

    /// Decreasing the last unit removes the line.
    pub fn decrease(&mut self, variant_id: Uuid) -> Result<(), DomainError> {
        let line = self.line_mut(variant_id)?;
        line.quantity -= 1;
        if line.quantity == 0 {
            self.lines.retain(|l| l.variant_id != variant_id);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn to_order_items(&self) -> Vec<OrderItemInput> {
        self.lines
            .iter()
            .map(|l| OrderItemInput {
                variant_id: l.variant_id,
                quantity: l.quantity,
            })
            .collect()
    }

    fn line_mut(&mut self, variant_id: Uuid) -> Result<&mut CartLine, DomainError> {
        self.lines
            .iter_mut()
            .find(|l| l.variant_id == variant_id)
            .ok_or(DomainError::NotFound("Cart item"))
    }
}
