use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "users-cli")]
#[command(about = "Command-line client for the Users API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    /// Bearer token for protected routes
    #[arg(short, long, env = "USERS_API_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List users, optionally filtered
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        is_customer: Option<bool>,
    },
    /// Show one user
    Get { id: i32 },
    /// Create a user
    Create {
        id: i32,
        first_name: String,
        last_name: String,
        age: i32,
        #[arg(long)]
        customer: bool,
    },
    /// Delete a user
    Delete { id: i32 },
    /// Show per-route request counts
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
    }

    let res = match cli.command {
        Commands::List {
            search,
            is_customer,
        } => {
            let mut query = Vec::new();
            if let Some(search) = search {
                query.push(("search", search));
            }
            if let Some(flag) = is_customer {
                query.push(("isCustomer", flag.to_string()));
            }
            client
                .get(format!("{}/users", cli.url))
                .query(&query)
                .send()
                .await?
        }
        Commands::Get { id } => client.get(format!("{}/users/{id}", cli.url)).send().await?,
        Commands::Create {
            id,
            first_name,
            last_name,
            age,
            customer,
        } => {
            client
                .post(format!("{}/users", cli.url))
                .headers(headers)
                .json(&json!({
                    "id": id,
                    "firstName": first_name,
                    "lastName": last_name,
                    "age": age,
                    "isCustomer": customer,
                }))
                .send()
                .await?
        }
        Commands::Delete { id } => {
            client
                .delete(format!("{}/users/{id}", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Metrics => {
            client
                .get(format!("{}/metrics", cli.url))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Users API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
