//! medrec - patient records portal CLI
//!
//! Connects the wallet, resolves the caller's role against the records
//! contract, and exposes the matching dashboard as a subcommand group.
//!
//! Usage:
//!   medrec status
//!   medrec watch
//!   medrec admin doctors|stats|check|authorize|revoke ...
//!   medrec doctor records|view|create ...
//!   medrec patient records|view|update|deactivate ...
//!
//! Configuration comes from the environment (MEDREC_RPC_URL,
//! MEDREC_CONTRACT_ADDRESS, MEDREC_PIN_API_KEY, MEDREC_PIN_API_SECRET,
//! MEDREC_CACHE_DIR); `--rpc-url` and `--contract` override it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use web3::transports::Http;
use web3::Web3;

use medrec_chain::{RpcWallet, SessionEvent, WalletSession, Web3Registry};
use medrec_core::{Address, Role};
use medrec_pinning::{PinningClient, PinningConfig};
use medrec_portal::render::{self, OutputFormat};
use medrec_portal::{
    resolve_role, AdminDesk, AdminView, Attachment, DoctorDesk, NewRecord, PatientDesk,
    PortalConfig, RecordCache,
};

#[derive(Parser)]
#[command(name = "medrec")]
#[command(version = "0.1.0")]
#[command(about = "Patient records portal: on-chain records, off-chain payloads", long_about = None)]
struct Cli {
    /// Output format: table or json
    #[arg(short, long, default_value = "table")]
    format: String,

    /// Wallet/chain JSON-RPC endpoint (overrides MEDREC_RPC_URL)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Records contract address (overrides MEDREC_CONTRACT_ADDRESS)
    #[arg(long)]
    contract: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the connected account and its resolved role
    Status,
    /// Follow wallet account/chain changes until disconnected
    Watch,
    /// Administrator dashboard
    #[command(subcommand)]
    Admin(AdminCommands),
    /// Doctor dashboard
    #[command(subcommand)]
    Doctor(DoctorCommands),
    /// Patient dashboard
    #[command(subcommand)]
    Patient(PatientCommands),
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List the authorized doctors
    Doctors,
    /// Show contract statistics
    Stats,
    /// Check whether an address is an authorized doctor
    Check { address: String },
    /// Authorize a doctor
    Authorize { address: String },
    /// Revoke a doctor's authorization
    Revoke { address: String },
}

#[derive(Subcommand)]
enum DoctorCommands {
    /// List records created by the connected doctor
    Records,
    /// Show one record with its off-chain payload
    View { id: u64 },
    /// Create a record for a patient
    Create {
        /// Patient account address
        #[arg(long)]
        patient: String,

        /// Patient name
        #[arg(long)]
        name: String,

        #[arg(long)]
        diagnosis: String,

        #[arg(long)]
        treatment: String,

        /// Additional notes (optional)
        #[arg(long, default_value = "")]
        notes: String,

        /// Visit date YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Attachment file; repeat for several
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PatientCommands {
    /// List the connected patient's records, newest first
    Records,
    /// Show one record with its off-chain payload
    View { id: u64 },
    /// Merge fields into a record as a patient update
    Update {
        id: u64,

        /// Field to merge, as key=value; repeat for several
        #[arg(long = "set", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Deactivate a record (one-way)
    Deactivate { id: u64 },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

fn require_role(actual: Role, needed: Role) -> Result<()> {
    if actual != needed {
        bail!("connected account resolves to {actual}; {needed} commands are unavailable");
    }
    Ok(())
}

fn print_admin_view(view: &AdminView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        OutputFormat::Table => {
            println!("Admin:   {}", view.stats.admin);
            println!("Records: {}", view.stats.total_records);
            println!("Doctors: {}", view.stats.total_doctors);
            print!("{}", render::doctors_table(&view.doctors));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let format: OutputFormat = cli.format.parse().map_err(anyhow::Error::msg)?;
    let config = PortalConfig::from_env(cli.rpc_url.clone(), cli.contract.clone())?;

    let transport = Http::new(&config.chain.rpc_url)
        .with_context(|| format!("invalid RPC endpoint {}", config.chain.rpc_url))?;
    let wallet = RpcWallet::new(transport.clone());
    let mut session = WalletSession::new(wallet, config.chain.clone());
    let account = session.connect().await?;

    let web3 = Web3::new(transport);
    let registry = Web3Registry::new(&web3, config.contract_address)?;
    let role = resolve_role(&registry, account).await;

    match cli.command {
        Commands::Status => match format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "account": account,
                    "role": role,
                    "chain": config.chain.name,
                    "chainId": config.chain.chain_id,
                    "contract": config.contract_address,
                }))?
            ),
            OutputFormat::Table => {
                println!("Account:  {account}");
                println!("Role:     {role}");
                println!(
                    "Network:  {} (chain id {})",
                    config.chain.name, config.chain.chain_id
                );
                println!("Contract: {}", config.contract_address);
            }
        },

        Commands::Watch => {
            let mut events = session.watch(Duration::from_secs(5));
            println!("Watching wallet changes (ctrl-c to stop)...");
            while let Some(event) = events.recv().await {
                match event {
                    SessionEvent::AccountChanged(next) => {
                        let role = resolve_role(&registry, next).await;
                        println!("Account changed: {next} (role: {role})");
                    }
                    SessionEvent::Disconnected => {
                        println!("Wallet disconnected.");
                        break;
                    }
                    SessionEvent::ChainChanged(id) => {
                        println!("Chain changed to 0x{id:x}; session is stale, reconnect.");
                        break;
                    }
                }
            }
            session.disconnect();
        }

        Commands::Admin(cmd) => {
            require_role(role, Role::Admin)?;
            let desk = AdminDesk::new(account, registry);
            match cmd {
                AdminCommands::Doctors | AdminCommands::Stats => {
                    let view = desk.overview().await?;
                    print_admin_view(&view, format)?;
                }
                AdminCommands::Check { address } => {
                    let address: Address = address.parse()?;
                    let authorized = desk.check_status(address).await?;
                    match format {
                        OutputFormat::Json => println!(
                            "{}",
                            serde_json::json!({ "address": address, "authorized": authorized })
                        ),
                        OutputFormat::Table => println!(
                            "{address} is {}",
                            if authorized { "AUTHORIZED" } else { "NOT AUTHORIZED" }
                        ),
                    }
                }
                AdminCommands::Authorize { address } => {
                    let address: Address = address.parse()?;
                    let view = desk.authorize(address).await?;
                    println!("Doctor {address} authorized.");
                    print_admin_view(&view, format)?;
                }
                AdminCommands::Revoke { address } => {
                    let address: Address = address.parse()?;
                    let view = desk.revoke(address).await?;
                    println!("Doctor {address} revoked.");
                    print_admin_view(&view, format)?;
                }
            }
        }

        Commands::Doctor(cmd) => {
            require_role(role, Role::Doctor)?;
            let pins = PinningClient::new(PinningConfig::from_env()?);
            let cache = RecordCache::new(config.cache_dir.clone());
            let desk = DoctorDesk::new(account, registry, pins, cache);
            match cmd {
                DoctorCommands::Records => {
                    let records = desk.my_records().await?;
                    match format {
                        OutputFormat::Json => {
                            println!("{}", serde_json::to_string_pretty(&records)?)
                        }
                        OutputFormat::Table => print!("{}", render::records_table(&records)),
                    }
                }
                DoctorCommands::View { id } => {
                    let view = desk.view_record(id).await?;
                    match format {
                        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                        OutputFormat::Table => print!("{}", render::record_view(&view)),
                    }
                }
                DoctorCommands::Create {
                    patient,
                    name,
                    diagnosis,
                    treatment,
                    notes,
                    date,
                    attachments,
                } => {
                    let patient: Address = patient.parse()?;
                    let mut blobs = Vec::with_capacity(attachments.len());
                    for path in attachments {
                        let bytes = std::fs::read(&path)
                            .with_context(|| format!("reading attachment {}", path.display()))?;
                        let file_name = path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("attachment.bin")
                            .to_string();
                        blobs.push(Attachment {
                            name: file_name,
                            bytes,
                        });
                    }
                    let input = NewRecord {
                        patient,
                        patient_name: name,
                        diagnosis,
                        treatment,
                        notes,
                        visit_date: date.unwrap_or_else(|| {
                            chrono::Utc::now().format("%Y-%m-%d").to_string()
                        }),
                        attachments: blobs,
                    };
                    let created = desk.create_record(input).await?;
                    match format {
                        OutputFormat::Json => println!(
                            "{}",
                            serde_json::json!({
                                "recordId": created.record_id,
                                "manifestCid": created.manifest_cid,
                                "fromEvent": created.from_event,
                            })
                        ),
                        OutputFormat::Table => {
                            println!(
                                "Record #{} created (manifest {}).",
                                created.record_id, created.manifest_cid
                            );
                            if !created.from_event {
                                println!(
                                    "Note: id derived from the record counter, not the creation event."
                                );
                            }
                        }
                    }
                }
            }
        }

        Commands::Patient(cmd) => {
            require_role(role, Role::Patient)?;
            let pins = PinningClient::new(PinningConfig::from_env()?);
            let desk = PatientDesk::new(account, registry, pins);
            match cmd {
                PatientCommands::Records => {
                    let records = desk.my_records().await?;
                    match format {
                        OutputFormat::Json => {
                            println!("{}", serde_json::to_string_pretty(&records)?)
                        }
                        OutputFormat::Table => print!("{}", render::records_table(&records)),
                    }
                }
                PatientCommands::View { id } => {
                    let view = desk.view_record(id).await?;
                    match format {
                        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                        OutputFormat::Table => print!("{}", render::record_view(&view)),
                    }
                }
                PatientCommands::Update { id, fields } => {
                    let fields: BTreeMap<String, String> = fields.into_iter().collect();
                    let new_cid = desk.submit_update(id, fields).await?;
                    println!("Record #{id} updated (new manifest {new_cid}).");
                }
                PatientCommands::Deactivate { id } => {
                    desk.deactivate(id).await?;
                    println!("Record #{id} deactivated.");
                }
            }
        }
    }

    Ok(())
}
