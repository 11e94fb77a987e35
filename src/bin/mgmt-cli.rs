use clap::{Parser, Subcommand};
use serde_json::json;

use management_server::grpc::proto::management_service_client::ManagementServiceClient;
use management_server::grpc::proto::Empty;

#[derive(Parser)]
#[command(name = "mgmt-cli")]
#[command(about = "Command-line client for the management server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:33073")]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server answers health checks
    Health,
    /// Fetch the server's public key
    ServerKey,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut client = ManagementServiceClient::connect(cli.addr.clone()).await?;

    let output = match cli.command {
        Commands::Health => {
            client.is_healthy(Empty {}).await?;
            json!({ "addr": cli.addr, "healthy": true })
        }
        Commands::ServerKey => {
            let response = client.get_server_key(Empty {}).await?.into_inner();
            json!({
                "addr": cli.addr,
                "key": to_hex(&response.key),
                "expires_at": response.expires_at,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
