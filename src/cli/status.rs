use super::open_runner;
use parcel::config::Config;
use parcel::core::{ParcelError, ParcelResult};
use parcel::di::ServiceContainer;
use parcel::migration::AppliedPlan;
use serde::Serialize;

#[derive(Serialize)]
struct PackageStatus {
    package_name: String,
    state: String,
    updated_at: String,
    history: Vec<AppliedPlan>,
}

pub fn run(config: Config, json: bool) -> ParcelResult<()> {
    let services = ServiceContainer::from_config(config.clone())?;
    let runner = open_runner(&config, services)?;
    let conn = runner.database().connection();
    let store = &runner.services().installed;

    let mut packages = Vec::new();
    for record in store.all(conn)? {
        let history = store.history(conn, &record.package_name)?;
        packages.push(PackageStatus {
            package_name: record.package_name,
            state: record.state,
            updated_at: record.updated_at,
            history,
        });
    }

    if json {
        let output = serde_json::to_string_pretty(&packages)
            .map_err(|e| ParcelError::Config(format!("Failed to serialize status: {}", e)))?;
        println!("{}", output);
        return Ok(());
    }

    if packages.is_empty() {
        println!("No installed packages.");
        return Ok(());
    }

    println!("Installed packages:");
    for package in &packages {
        println!("  {} {} ({})", package.package_name, package.state, package.updated_at);
        for applied in &package.history {
            println!("    - {} -> {} at {}", applied.plan_name, applied.state, applied.applied_at);
        }
    }
    Ok(())
}
