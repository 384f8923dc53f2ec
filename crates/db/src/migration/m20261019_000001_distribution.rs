//! Budget sources and work items.
//!
//! Allocations are stored as NUMERIC(18,2) so the database never holds a
//! sub-cent amount.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DISTRIBUTION_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS work_items CASCADE;
             DROP TABLE IF EXISTS budget_sources CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const DISTRIBUTION_SQL: &str = r"
-- Budget-holding entities (program / project / activity)
CREATE TABLE budget_sources (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title VARCHAR(255) NOT NULL,
    total_budget NUMERIC(18, 2),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_total_budget_positive CHECK (total_budget IS NULL OR total_budget > 0)
);

-- Units of execution that receive allocations
CREATE TABLE work_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    budget_source_id UUID NOT NULL REFERENCES budget_sources(id) ON DELETE CASCADE,
    parent_id UUID REFERENCES work_items(id) ON DELETE SET NULL,
    title VARCHAR(255) NOT NULL,
    allocated_budget NUMERIC(18, 2),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_allocated_budget_non_negative CHECK (allocated_budget IS NULL OR allocated_budget >= 0)
);

-- Children of a source, read by every rollup and apply
CREATE INDEX idx_work_items_source ON work_items(budget_source_id, id);

-- Nested work items
CREATE INDEX idx_work_items_parent ON work_items(parent_id) WHERE parent_id IS NOT NULL;
";
