pub mod hash;
pub mod install;
pub mod migrate;
pub mod pack;
pub mod status;
pub mod unpack;

use parcel::config::Config;
use parcel::core::ParcelResult;
use parcel::db::Database;
use parcel::di::{ConfigProvider, ServiceContainer};
use parcel::migration::MigrationRunner;

/// Open the configured database and wire a runner over `services`
pub fn open_runner(config: &Config, services: ServiceContainer) -> ParcelResult<MigrationRunner> {
    let db = Database::open(&config.database_path()?)?;
    Ok(MigrationRunner::new(db, services))
}
