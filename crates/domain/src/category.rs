//! The `Category` value type. Categories only ever gate which auctions an
//! anonymous browser sees; they carry no bidding semantics.

use crate::ids::CategoryId;
use serde::{Deserialize, Serialize};

/// Upper bound on `name`, matching the unique `VARCHAR(100)` column.
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}
