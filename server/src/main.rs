use clap::Parser;
use log::info;
use server::config::{resolve_max_clients, ServerConfig};
use server::network::Server;
use shared::DEFAULT_PORT;
use std::net::{IpAddr, SocketAddr};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Maximum number of connected clients (at least 2, defaults to 3)
    max_clients: Option<String>,

    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let max_clients = resolve_max_clients(args.max_clients.as_deref())?;
    let config = ServerConfig::new(SocketAddr::new(args.host, args.port), max_clients)?;

    let server = Server::bind(&config).await?;

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
