use parcel::config::Config;
use parcel::core::ParcelResult;
use parcel::di::ServiceContainer;
use parcel::manifest::PlanIdentity;

pub fn run(config: Config, namespace: String) -> ParcelResult<()> {
    let identity = PlanIdentity::new(namespace)?;
    let services = ServiceContainer::from_config(config)?;
    println!("{}", services.resolver().content_hash(&identity)?);
    Ok(())
}
