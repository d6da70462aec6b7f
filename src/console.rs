//! The application context.
//!
//! A [`Console`] owns one session, one REST client, one real-time channel
//! and one view coordinator, wired together. Everything the user does goes
//! through it.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::adapters::{ReqwestHttpClient, TungsteniteTransport};
use crate::api::{ApiClient, MutationResponse};
use crate::config::ConsoleConfig;
use crate::discovery::CollectionDiscovery;
use crate::error::{ConsoleError, ConsoleResult};
use crate::notifications::{Notice, NoticeSubscriber, TracingNotifier};
use crate::realtime::RealtimeChannel;
use crate::session::{Session, SharedSession};
use crate::traits::{HttpClient, Notifier, RealtimeTransport, SnapshotRenderer};
use crate::view::{ActiveView, DiscoveryRefresh, ViewCoordinator};

/// Application context.
pub struct Console {
    config: ConsoleConfig,
    api: ApiClient,
    session: SharedSession,
    discovery: CollectionDiscovery,
    channel: RealtimeChannel,
    views: ViewCoordinator,
    notifier: Arc<dyn Notifier>,
}

impl Console {
    /// Wire a console from its collaborators.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(
        config: ConsoleConfig,
        http: Arc<dyn HttpClient>,
        transport: Arc<dyn RealtimeTransport>,
        notifier: Arc<dyn Notifier>,
        renderer: Arc<dyn SnapshotRenderer>,
    ) -> Self {
        let api = ApiClient::new(config.base_url.clone(), http);
        let session = SharedSession::new();
        let discovery = CollectionDiscovery::new(api.clone(), config.discovery.clone());

        let channel = RealtimeChannel::new(
            config.ws_url(),
            config.realtime.clone(),
            transport,
            notifier.clone(),
        );

        let mut builder = ViewCoordinator::builder();
        for view in [
            ActiveView::Dashboard,
            ActiveView::Analytics,
            ActiveView::Collections,
        ] {
            builder = builder.with_refresh(
                view,
                Arc::new(DiscoveryRefresh::new(
                    view,
                    discovery.clone(),
                    session.clone(),
                    renderer.clone(),
                )),
            );
        }
        let views = builder.build();

        channel.subscribe(Arc::new(NoticeSubscriber::new(notifier.clone())));
        views.attach(&channel);

        Self {
            config,
            api,
            session,
            discovery,
            channel,
            views,
            notifier,
        }
    }

    /// Console over reqwest and tokio-tungstenite, with notices logged.
    pub fn with_defaults(
        config: ConsoleConfig,
        renderer: Arc<dyn SnapshotRenderer>,
    ) -> ConsoleResult<Self> {
        let http = ReqwestHttpClient::with_timeout(config.request_timeout)?;
        Ok(Self::new(
            config,
            Arc::new(http),
            Arc::new(TungsteniteTransport::new()),
            Arc::new(TracingNotifier),
            renderer,
        ))
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    pub fn discovery(&self) -> &CollectionDiscovery {
        &self.discovery
    }

    pub fn channel(&self) -> &RealtimeChannel {
        &self.channel
    }

    pub fn views(&self) -> &ViewCoordinator {
        &self.views
    }

    /// Sign in, go live and load the dashboard.
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<()> {
        let session = match self.api.login(username, password).await {
            Ok(session) => session,
            Err(e) => {
                self.notifier.notify(Notice::operation_failed("Sign in", &e));
                return Err(e);
            }
        };
        self.start(session, username).await;
        Ok(())
    }

    /// Create an account, then continue as after [`login`](Console::login).
    pub async fn register(&self, username: &str, email: &str, password: &str) -> ConsoleResult<()> {
        let session = match self.api.register(username, email, password).await {
            Ok(session) => session,
            Err(e) => {
                self.notifier.notify(Notice::operation_failed("Sign up", &e));
                return Err(e);
            }
        };
        self.start(session, username).await;
        Ok(())
    }

    async fn start(&self, session: Session, username: &str) {
        self.session.replace(session);
        info!("Signed in as {}", username);

        self.channel.connect();

        self.views.set_active_view(ActiveView::Dashboard);
        if let Err(e) = self.views.refresh_active().await {
            warn!("Initial dashboard load failed: {}", e);
        }
        self.notifier.notify(Notice::welcome(username));
    }

    /// Go offline and forget the credential.
    pub fn logout(&self) {
        self.channel.disconnect();
        self.session.clear();
        self.views.set_active_view(ActiveView::None);
        info!("Logged out");
    }

    /// Show `view` and load it.
    pub fn switch_view(&self, view: ActiveView) {
        self.views.switch_view(view);
    }

    /// Create or overwrite an item.
    pub async fn save_item(
        &self,
        collection: &str,
        key: &str,
        value: &Value,
    ) -> ConsoleResult<MutationResponse> {
        let result = self
            .api
            .set(&self.session.snapshot(), collection, key, value)
            .await;
        self.report("Save", result, || Notice::item_saved(collection, key))
    }

    /// Delete an item.
    pub async fn delete_item(&self, collection: &str, key: &str) -> ConsoleResult<MutationResponse> {
        let result = self
            .api
            .delete(&self.session.snapshot(), collection, key)
            .await;
        self.report("Delete", result, || Notice::item_deleted(collection, key))
    }

    fn report<T>(
        &self,
        operation: &str,
        result: ConsoleResult<T>,
        success: impl FnOnce() -> Notice,
    ) -> ConsoleResult<T> {
        match &result {
            Ok(_) => self.notifier.notify(success()),
            Err(e) => {
                warn!("{} failed: {}", operation, e);
                self.notifier.notify(Notice::operation_failed(operation, e));
                if matches!(e, ConsoleError::Unauthenticated) && self.session.is_authenticated() {
                    warn!("Credential rejected, signing out");
                    self.logout();
                }
            }
        }
        result
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.channel.disconnect();
    }
}
