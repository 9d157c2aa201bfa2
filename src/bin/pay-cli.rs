use std::str::FromStr;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "pay-cli")]
#[command(about = "Operator CLI for the payment orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a payment through the orchestrator
    Pay {
        /// Route to resolve the provider with
        route_id: String,
        /// Amount to charge
        amount: Decimal,
        /// Three-letter currency code
        #[arg(default_value = "USD")]
        currency: String,
        /// Order id; a random one is generated when omitted
        #[arg(long)]
        order_id: Option<String>,
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Look up a route directly on the routing service
    Route {
        route_id: String,
        #[arg(short, long, default_value = "http://localhost:8081")]
        routing_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Pay {
            route_id,
            amount,
            currency,
            order_id,
            url,
        } => {
            let order_id = order_id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let amount = serde_json::Number::from_str(&amount.to_string())?;
            let res = client
                .post(format!("{}/payments", url.trim_end_matches('/')))
                .json(&json!({
                    "orderId": order_id,
                    "routeId": route_id,
                    "amount": amount,
                    "currency": currency,
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Route {
            route_id,
            routing_url,
        } => {
            let res = client
                .get(format!("{}/routings/{}", routing_url.trim_end_matches('/'), route_id))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
