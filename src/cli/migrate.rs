use super::open_runner;
use parcel::config::Config;
use parcel::core::{ParcelError, ParcelResult};
use parcel::di::{ConfigProvider, ServiceContainer};
use parcel::migration::steps::CORE_PACKAGE;
use parcel::migration::{core_plan, discover_plans, MigrationPlan};

pub fn run(config: Config, package: Option<String>) -> ParcelResult<()> {
    if !config.run_schema_and_content_migrations() {
        println!("Package imports are disabled; plans will be recorded without importing content");
    }

    let services = ServiceContainer::from_config(config.clone())?;
    let resources_dir = config.resources_dir()?;

    let mut plans: Vec<MigrationPlan> = vec![core_plan()?];
    plans.extend(discover_plans(&resources_dir, &services)?);

    if let Some(ref name) = package {
        // The core plan always runs first, whatever package is selected
        plans.retain(|p| p.package_name() == CORE_PACKAGE || p.package_name() == name);
        if name != CORE_PACKAGE && plans.len() == 1 {
            return Err(ParcelError::NotFound(format!(
                "No migration plan for package '{}' in {}",
                name,
                resources_dir.display()
            )));
        }
    }

    let runner = open_runner(&config, services)?;
    let outcomes = runner.run_all(&plans)?;

    let applied = outcomes.iter().filter(|(_, o)| o.was_applied()).count();
    for (package, outcome) in &outcomes {
        if outcome.was_applied() {
            println!("✓ {}: {}", package, outcome);
        } else {
            println!("  {}: {}", package, outcome);
        }
    }

    println!("\n✓ {} plan(s) checked, {} applied", outcomes.len(), applied);
    Ok(())
}
