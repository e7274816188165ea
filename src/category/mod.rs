//! Labels for grouping transactions, shared through public access levels and
//! addressed by slug rather than row id.

mod core;
mod create_endpoint;
mod get_endpoint;
mod list_endpoint;

pub use core::{
    Category, CategoryAccess, NewCategory, count_categories, create_category,
    create_category_table, get_category_by_slug, get_subcategories, list_categories,
    map_row_to_category,
};
pub use create_endpoint::create_category_endpoint;
pub use get_endpoint::get_category_endpoint;
pub use list_endpoint::list_categories_endpoint;
