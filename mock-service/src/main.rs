use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about = "Mock storefront for load testing")]
struct Cli {
    #[arg(short, long, default_value_t = 3002)]
    port: u16,

    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=debug,tower_http=info")),
        )
        .init();

    let args = Cli::parse();
    let addr = SocketAddr::new(args.host, args.port);
    info!("Mock storefront listening on {addr}");

    mock_service::run(addr).await
}
