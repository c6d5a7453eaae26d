use crate::cache::ResourceCache;
use crate::config::BridgeConfig;
use crate::display;
use crate::error::{BridgeError, Result};
use crate::events::{Highlight, ViewerEvent};
use crate::hub::EventHub;
use crate::proxy::{self, ProxyState, proxied_path};
use crate::ws;
use async_trait::async_trait;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use wikiracer_core::{PathStep, RaceEvent, RaceObserver};
use wikiracer_scanner::page_name;

/// Live browser view of a race.
///
/// Owns both listeners (event channel and content proxy), the pending
/// highlight and the resource cache. Attach it to a navigator as a
/// [`RaceObserver`]; it paces the race so a person can follow along but
/// never changes its outcome. Dropping the bridge stops both listeners and
/// closes the live viewer connection.
pub struct VisualizationBridge {
    config: BridgeConfig,
    hub: Arc<EventHub>,
    highlight: watch::Sender<Option<Highlight>>,
    connected: watch::Receiver<bool>,
    cache: Arc<ResourceCache>,
    proxy_addr: SocketAddr,
    events_addr: SocketAddr,
    total_steps: AtomicUsize,
    tasks: Vec<JoinHandle<()>>,
}

impl VisualizationBridge {
    /// Bind both sockets and start serving. Port 0 picks a free port.
    pub async fn bind(config: BridgeConfig) -> Result<Self> {
        let (highlight, highlight_rx) = watch::channel(None);
        let hub = Arc::new(EventHub::new(highlight_rx));
        let connected = hub.subscribe_connected();
        let cache = Arc::new(ResourceCache::new());

        let (events_listener, events_addr) = bind_listener(&config.bind_host, config.ws_port).await?;
        let (proxy_listener, proxy_addr) = bind_listener(&config.bind_host, config.http_port).await?;
        let state = ProxyState::new(&config, cache.clone(), events_addr.port())?;

        let tasks = vec![
            serve("Event channel", events_listener, ws::router(hub.clone())),
            serve("Content proxy", proxy_listener, proxy::router(state)),
        ];

        info!("Content proxy listening on http://{}", proxy_addr);
        info!("Event channel listening on ws://{}", events_addr);

        Ok(Self {
            config,
            hub,
            highlight,
            connected,
            cache,
            proxy_addr,
            events_addr,
            total_steps: AtomicUsize::new(0),
            tasks,
        })
    }

    /// Bind, open the viewer and wait for it to connect.
    ///
    /// Fails with [`BridgeError::StartupTimeout`] if no viewer shows up
    /// within the configured timeout; callers are expected to carry on
    /// without visualization.
    pub async fn start(config: BridgeConfig) -> Result<Self> {
        let bridge = Self::bind(config).await?;

        if bridge.config.open_browser {
            if let Err(e) = bridge.launch_display() {
                warn!("{}. Open {} manually", e, bridge.viewer_url());
            }
        } else {
            info!("Open {} to watch the race", bridge.viewer_url());
        }

        bridge.await_viewer(bridge.config.connect_timeout()).await?;
        Ok(bridge)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn proxy_addr(&self) -> SocketAddr {
        self.proxy_addr
    }

    pub fn events_addr(&self) -> SocketAddr {
        self.events_addr
    }

    pub fn viewer_url(&self) -> String {
        format!(
            "http://{}:{}/viewer.html",
            self.config.bind_host,
            self.proxy_addr.port()
        )
    }

    pub fn launch_display(&self) -> Result<()> {
        display::open_viewer(&self.viewer_url(), self.config.display_command.as_deref())
    }

    /// Wait until a viewer is connected.
    pub async fn await_viewer(&self, timeout: Duration) -> Result<()> {
        let mut connected = self.connected.clone();
        match tokio::time::timeout(timeout, connected.wait_for(|c| *c)).await {
            Ok(Ok(_)) => {
                info!("Viewer connected");
                Ok(())
            }
            Ok(Err(_)) => Err(BridgeError::Closed),
            Err(_) => Err(BridgeError::StartupTimeout(timeout)),
        }
    }

    pub fn is_viewer_connected(&self) -> bool {
        self.hub.is_connected()
    }

    /// Forget per-race state. The resource cache is kept.
    pub fn reset(&self) {
        self.highlight.send_replace(None);
        self.total_steps.store(0, Ordering::SeqCst);
    }

    pub fn current_highlight(&self) -> Option<Highlight> {
        self.hub.current_highlight()
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    pub fn status(&self, message: impl Into<String>, step: Option<usize>, total: Option<usize>) {
        self.hub.publish(ViewerEvent::Status {
            message: message.into(),
            step,
            total,
        });
    }

    /// Mark `url` as the next hop, then hold for the highlight pacing delay.
    pub async fn highlight_link(&self, url: &str, label: &str) {
        let highlight = Highlight::new(url, label);
        self.highlight.send_replace(Some(highlight.clone()));
        self.hub.publish(highlight.into());
        pause(self.config.highlight_pacing()).await;
    }

    /// Send the viewer to `url` through the proxy, then hold for the
    /// navigate pacing delay. Clears the pending highlight.
    pub async fn navigate_to(&self, url: &str) {
        self.highlight.send_replace(None);
        self.hub.publish(ViewerEvent::Navigate {
            url: proxied_path(url, &self.config.content_host),
        });
        pause(self.config.navigate_pacing()).await;
    }

    pub fn add_path(&self, step: PathStep) {
        self.hub.publish(ViewerEvent::AddPath { step });
    }

    pub fn success(&self, path: Vec<PathStep>) {
        self.hub.publish(ViewerEvent::Success { path });
    }

    pub fn failure(&self, message: impl Into<String>) {
        self.hub.publish(ViewerEvent::Failure {
            message: message.into(),
        });
    }

    /// Stop both listeners and close the live viewer connection.
    pub fn shutdown(self) {}

    fn total(&self) -> Option<usize> {
        match self.total_steps.load(Ordering::SeqCst) {
            0 => None,
            n => Some(n),
        }
    }
}

impl Drop for VisualizationBridge {
    fn drop(&mut self) {
        self.hub.close();
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[async_trait]
impl RaceObserver for VisualizationBridge {
    async fn on_event(&self, event: &RaceEvent) {
        match event {
            RaceEvent::Started {
                start_url,
                target_label,
                max_depth,
                ..
            } => {
                self.reset();
                self.total_steps.store(*max_depth, Ordering::SeqCst);
                self.status(format!("Racing to '{}'", target_label), None, self.total());
                self.navigate_to(start_url).await;
                self.add_path(PathStep::new(0, page_name(start_url), start_url.clone(), false));
            }
            RaceEvent::Fetching { step, url } => {
                self.status(format!("Scanning '{}'", page_name(url)), Some(*step), self.total());
            }
            RaceEvent::PageResolved {
                step,
                title,
                edge_count,
            } => {
                self.status(
                    format!("Found {} links on '{}'", edge_count, title),
                    Some(*step),
                    self.total(),
                );
            }
            RaceEvent::HopChosen { hop, distance } => {
                let message = match distance {
                    Some(d) => format!("Next: '{}' (distance {:.4})", hop.label, d),
                    None => format!("Target '{}' is linked here", hop.label),
                };
                self.status(message, Some(hop.ordinal), self.total());
                self.highlight_link(&hop.url, &hop.label).await;
                self.navigate_to(&hop.url).await;
                self.add_path(hop.clone());
            }
            RaceEvent::Finished { report } => {
                if report.reached {
                    self.success(report.path.clone());
                } else {
                    self.failure(report.termination.to_string());
                }
            }
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

async fn bind_listener(host: &str, port: u16) -> Result<(TcpListener, SocketAddr)> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| BridgeError::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local = listener
        .local_addr()
        .map_err(|source| BridgeError::Bind { addr, source })?;
    Ok((listener, local))
}

fn serve(name: &'static str, listener: TcpListener, app: Router) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!("{} stopped: {}", name, e);
        }
    })
}
