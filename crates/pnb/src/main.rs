use std::sync::Arc;

use pnb_core::{
    config::Config,
    dispatch::{Dispatcher, Passphrases},
    domain::PackageIdAllocator,
    ports::{NotifierPort, ProfilePort, StorePort},
};
use pnb_messenger::GraphClient;
use pnb_store::PgStore;

#[tokio::main]
async fn main() -> Result<(), pnb_core::Error> {
    pnb_core::logging::init("pnb");

    let cfg = Arc::new(Config::load()?);

    let store: Arc<dyn StorePort> = Arc::new(PgStore::connect(&cfg.store).await?);

    // Must happen before the first package is created: ids continue from
    // whatever the store already holds.
    let ids = Arc::new(PackageIdAllocator::seeded(store.max_package_id().await?));

    let graph = Arc::new(GraphClient::new(
        cfg.graph_api_base.clone(),
        cfg.page_access_token.clone(),
    ));
    let notifier: Arc<dyn NotifierPort> = graph.clone();
    let profiles: Arc<dyn ProfilePort> = graph;

    let dispatcher = Arc::new(Dispatcher::new(
        store,
        notifier,
        profiles,
        ids,
        Passphrases {
            member: cfg.member_passphrase.clone(),
            admin: cfg.admin_passphrase.clone(),
        },
    ));

    pnb_web::router::run(cfg, dispatcher).await
}
