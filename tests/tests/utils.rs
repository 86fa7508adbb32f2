use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static MOCK_ADDR: OnceLock<String> = OnceLock::new();
static METRICS: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::new("loadstat=debug,mock_service=info"))
            .with_test_writer()
            .init();

        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("metrics recorder installs once");
        let _ = METRICS.set(handle);
    });
}

/// Full URL of `path` on the shared mock storefront, started on first use.
///
/// The service gets its own thread and runtime so it outlives the runtime of whichever test
/// started it.
pub fn mock_url(path: &str) -> String {
    let base = MOCK_ADDR.get_or_init(|| {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind mock service");
        let addr = listener.local_addr().expect("mock service address");
        listener
            .set_nonblocking(true)
            .expect("non-blocking listener");

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("mock service runtime");
            rt.block_on(async move {
                let listener = TcpListener::from_std(listener).expect("tokio listener");
                if let Err(err) = mock_service::serve(listener).await {
                    error!("Mock service stopped: {err}");
                }
            });
        });

        format!("http://{addr}")
    });

    format!("{base}{path}")
}

#[allow(unused)]
pub fn rendered_metrics() -> String {
    METRICS.get().map(PrometheusHandle::render).unwrap_or_default()
}
