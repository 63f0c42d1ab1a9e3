use std::collections::HashSet;
use std::str::FromStr;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::discount::{Applicability, DiscountCode, DiscountType};
use crate::domain::errors::DomainError;
use crate::domain::ports::DiscountRepository;
use crate::schema::{discount_code_variants, discount_codes};

use super::models::DiscountCodeRow;

/// Loads an active code together with the variants it is restricted to.
/// Shared with the order transaction so checkout sees the same rules.
pub(crate) fn load_active_discount(
    conn: &mut PgConnection,
    code: &str,
) -> Result<Option<DiscountCode>, DomainError> {
    let row = discount_codes::table
        .filter(discount_codes::code.eq(code))
        .filter(discount_codes::is_active.eq(true))
        .select(DiscountCodeRow::as_select())
        .first(conn)
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let applicability = if row.applies_to_all {
        Applicability::All
    } else {
        let variants: Vec<Uuid> = discount_code_variants::table
            .filter(discount_code_variants::discount_code_id.eq(row.id))
            .select(discount_code_variants::variant_id)
            .load(conn)?;
        Applicability::Variants(variants.into_iter().collect::<HashSet<_>>())
    };

    Ok(Some(DiscountCode {
        id: row.id,
        code: row.code,
        discount_type: DiscountType::from_str(&row.discount_type)?,
        amount: row.amount,
        applicability,
        max_uses: row.max_uses,
        times_used: row.times_used,
    }))
}

pub struct DieselDiscountRepository {
    pool: DbPool,
}

impl DieselDiscountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl DiscountRepository for DieselDiscountRepository {
    fn find_by_code(&self, code: &str) -> Result<Option<DiscountCode>, DomainError> {
        let mut conn = self.pool.get()?;
        load_active_discount(&mut conn, code)
    }
}
