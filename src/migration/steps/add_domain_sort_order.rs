use crate::core::ParcelResult;
use crate::migration::context::MigrationContext;
use crate::migration::step::MigrationStep;
use tracing::info;

const TABLE: &str = "domain";
const COLUMN: &str = "sort_order";

/// Wildcard domains are nameless or start with `*`
pub const WILDCARD_CONDITION: &str = "length(domain_name) = 0 OR instr(domain_name, '*') = 1";

/// Gives every domain an explicit, non-null sort order
///
/// Existing domains keep their creation order (`sort_order = id`); wildcard
/// domains sort first with `-1`.
#[derive(Debug, Default)]
pub struct AddDomainSortOrder;

impl MigrationStep for AddDomainSortOrder {
    fn migrate(&mut self, ctx: &mut MigrationContext<'_>) -> ParcelResult<()> {
        if !ctx.column_exists(TABLE, COLUMN)? {
            ctx.execute_batch("ALTER TABLE domain ADD COLUMN sort_order INTEGER")?;
        } else if ctx.column_is_not_null(TABLE, COLUMN)? {
            return Ok(());
        }

        let backfilled = ctx.execute(
            "UPDATE domain SET sort_order = id WHERE sort_order IS NULL",
            [],
        )?;
        let wildcards = ctx.execute(
            &format!("UPDATE domain SET sort_order = -1 WHERE {}", WILDCARD_CONDITION),
            [],
        )?;

        // SQLite cannot tighten a column in place
        ctx.execute_batch(
            "DROP TABLE IF EXISTS domain_rebuild;
             CREATE TABLE domain_rebuild (
                 id               INTEGER PRIMARY KEY AUTOINCREMENT,
                 domain_name      TEXT NOT NULL,
                 root_content_id  INTEGER,
                 sort_order       INTEGER NOT NULL
             );
             INSERT INTO domain_rebuild (id, domain_name, root_content_id, sort_order)
                 SELECT id, domain_name, root_content_id, sort_order FROM domain;
             DROP TABLE domain;
             ALTER TABLE domain_rebuild RENAME TO domain;",
        )?;

        info!(backfilled, wildcards, "Added domain sort order");
        Ok(())
    }
}
