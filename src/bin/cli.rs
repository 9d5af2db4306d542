//! ItemKV CLI Client
//!
//! Command-line interface for interacting with an ItemKV server.

use std::collections::HashMap;

use clap::{Parser, Subcommand};
use itemkv::network::Client;
use itemkv::protocol::{Request, Response};
use serde_json::Value;

/// ItemKV CLI
#[derive(Parser, Debug)]
#[command(name = "itemkv-cli")]
#[command(about = "CLI for the ItemKV item store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an item from a JSON object
    Create {
        /// The payload, e.g. '{"foo":"bar"}'
        payload: String,

        /// Idempotency key (becomes the item id)
        #[arg(short = 'k', long)]
        idempotency_key: Option<String>,
    },

    /// Get the latest payload for an id
    Get {
        /// The item id
        id: String,
    },

    /// Send a raw request
    Raw {
        /// Method token (GET, POST, ...)
        #[arg(short, long)]
        method: Option<String>,

        /// Raw body text
        #[arg(short, long)]
        body: Option<String>,

        /// Path id parameter
        #[arg(short, long)]
        id: Option<String>,
    },
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Create { payload, idempotency_key } => match serde_json::from_str::<Value>(&payload) {
            Ok(value) => client.create(value, idempotency_key.as_deref()),
            Err(e) => {
                eprintln!("Payload is not valid JSON: {}", e);
                std::process::exit(2);
            }
        },
        Commands::Get { id } => client.get(&id),
        Commands::Raw { method, body, id } => client.send(&Request {
            body,
            http_method: method,
            path_parameters: id.map(|id| HashMap::from([("id".to_string(), id)])),
        }),
    };

    match result {
        Ok(response) => print_response(&response),
        Err(e) => {
            eprintln!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_response(response: &Response) {
    println!("{}", response.status_code);
    match response.body_json() {
        Ok(body) => println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| response.body.clone())
        ),
        Err(_) => println!("{}", response.body),
    }
    if response.status_code >= 400 {
        std::process::exit(1);
    }
}
