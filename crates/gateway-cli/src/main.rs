//! Helios Gateway CLI
//!
//! Operator tool for the multi-tenant document gateway: connection status,
//! collection listing, record listing, export, import and drop.

mod config;

use std::sync::Arc;

use clap::Parser;
use helios_gateway::core::ArchiveUpload;
use helios_gateway::{Gateway, MongoStore, Params};
use serde::Serialize;
use tracing::info;

use crate::config::{CliConfig, Command};

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "helios_gateway={},helios_gateway_cli={}",
            level, level
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn tenant_params(cli: &CliConfig, tenant: &str) -> Params {
    let params = Params::new(tenant);
    if cli.dedicated { params.dedicated() } else { params }
}

async fn run(cli: &CliConfig, gateway: &Gateway) -> anyhow::Result<()> {
    match &cli.command {
        Command::Status => {
            let report = gateway.check_status().await;
            print_json(&report)?;
            if !report.healthy {
                anyhow::bail!("database is not healthy");
            }
        }
        Command::Collections { tenant } => {
            let params = tenant_params(cli, tenant);
            let collections = gateway.list(&params).await?;
            print_json(&collections)?;
        }
        Command::List {
            tenant,
            entity_type,
            query,
        } => {
            let mut params: Params = serde_json::from_str(query)
                .map_err(|e| anyhow::anyhow!("Invalid --query JSON: {}", e))?;
            params.tenant = Some(tenant.as_str().into());
            params.entity_type = Some(entity_type.clone());
            params.dedicated = params.dedicated || cli.dedicated;
            let records = gateway.list(&params).await?;
            print_json(&records)?;
        }
        Command::Export {
            tenant,
            entity_type,
            format,
            output,
        } => {
            let mut params = tenant_params(cli, tenant);
            params.entity_type = entity_type.clone();
            params.format = format.clone();
            let archive = gateway.export(&params).await?;
            let path = archive.write_to(output)?;
            info!(path = %path.display(), bytes = archive.bytes.len(), "Archive written");
            println!("{}", path.display());
        }
        Command::Import { tenant, files } => {
            let mut params = tenant_params(cli, tenant);
            for file in files {
                params = params.with_file(ArchiveUpload::read(file)?);
            }
            let outcome = gateway.import(&params).await?;
            print_json(&outcome)?;
        }
        Command::Drop {
            tenant,
            entity_type,
        } => {
            let params = tenant_params(cli, tenant).with_type(entity_type.clone());
            let outcome = gateway.drop_collection(&params).await?;
            print_json(&outcome)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    init_logging(&cli.log_level);

    let config = cli.gateway_config()?;
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        database = %config.database.name,
        fan_out = config.fan_out_limit,
        dedicated = cli.dedicated,
        version = %config.version,
        "Starting Helios gateway"
    );

    let store = MongoStore::connect(&config.database).await?;
    let gateway = Gateway::open(Arc::new(store), config).await?;

    let result = run(&cli, &gateway).await;
    gateway.close().await?;
    result
}
