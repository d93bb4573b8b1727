//! Service wiring: store backend, notification bus, and the services on top.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use wholesale_auth::Role;
use wholesale_events::{Event, EventBus, InMemoryEventBus, Notification};
use wholesale_infra::{
    AnyStore, CatalogService, InMemoryStore, Notifier, OrderWorkflow, PartyDirectory, ReportService, ServiceResult,
    SharedBus, StockPolicy, UserDirectory,
};

use crate::config::ApiConfig;

pub type AppServices = Services<AnyStore>;

#[derive(Debug)]
pub struct Services<S> {
    pub catalog: CatalogService<S>,
    pub parties: PartyDirectory<S>,
    pub orders: OrderWorkflow<S>,
    pub reports: ReportService<S>,
    pub users: UserDirectory<S>,
    bus: Arc<InMemoryEventBus<Notification>>,
    backend: &'static str,
}

impl Services<AnyStore> {
    pub fn new(store: AnyStore, policy: StockPolicy) -> Self {
        let backend = store.backend();
        let store = Arc::new(store);
        let bus: Arc<InMemoryEventBus<Notification>> = Arc::new(InMemoryEventBus::new());
        let shared: SharedBus = bus.clone();
        let notifier = Notifier::new(shared, policy);

        Self {
            catalog: CatalogService::new(Arc::clone(&store), notifier.clone()),
            parties: PartyDirectory::new(Arc::clone(&store)),
            orders: OrderWorkflow::new(Arc::clone(&store), notifier),
            reports: ReportService::new(Arc::clone(&store), policy),
            users: UserDirectory::new(store),
            bus,
            backend,
        }
    }

    /// In-memory store (dev/test).
    pub fn in_memory(policy: StockPolicy) -> Self {
        Self::new(InMemoryStore::new().into(), policy)
    }
}

impl<S> Services<S> {
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus<Notification>> {
        &self.bus
    }

    /// Stop notification delivery; open event streams end.
    pub fn shutdown(&self) {
        self.bus.close();
    }
}

/// Pick the store backend from configuration and seed the first admin.
pub async fn build_services(config: &ApiConfig) -> ServiceResult<AppServices> {
    let store: AnyStore = match config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        Some(url) => {
            let pg = wholesale_infra::store::PostgresStore::connect(url, config.db_max_connections).await?;
            pg.ensure_schema().await?;
            pg.into()
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            tracing::warn!("DATABASE_URL is set but postgres support is not compiled in; using in-memory store");
            InMemoryStore::new().into()
        }
        None => InMemoryStore::new().into(),
    };

    tracing::info!(backend = store.backend(), "store ready");
    let services = Services::new(store, config.policy);
    if let Some(seed) = config.admin_seed.clone() {
        services.users.ensure_admin(seed).await?;
    }
    Ok(services)
}

/// Notifications the given role may see, as server-sent events named by type.
pub fn notification_stream<S>(
    services: &Services<S>,
    role: Role,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>> + use<S>> {
    let rx = services.bus.subscribe().into_inner();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(n) if n.audience().admits(role) => {
            let event = SseEvent::default().event(n.event_type()).json_data(&n).ok()?;
            Some(Ok(event))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
