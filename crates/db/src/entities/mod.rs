//! `SeaORM` entity definitions.

pub mod budget_sources;
pub mod work_items;
