use bridge_core::constants::DEFAULT_CONVERSION_DATA_DIR;
use bridge_core::{Access, ConversionService, CoreConfig};
use clap::{Parser, Subcommand};
use intake_types::ResourceType;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fhir-bridge")]
#[command(about = "FHIR intake conversion CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Caller identity for ownership-scoped operations
    #[arg(long, global = true)]
    caller: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an intake JSON file to a FHIR resource
    Convert {
        /// Target resource type (Patient, Practitioner, Organization)
        resource_type: ResourceType,
        /// Path to the intake payload JSON file
        file: PathBuf,
    },
    /// Replay a stored conversion request from its input snapshot
    Rerun {
        /// Conversion request id
        id: String,
    },
    /// Show a stored conversion request
    Show {
        /// Conversion request id
        id: String,
    },
    /// Print the FHIR resource generated for a conversion request
    Resource {
        /// Conversion request id
        id: String,
    },
    /// List stored conversion requests
    History {
        /// Only list requests for this resource type
        #[arg(long)]
        resource_type: Option<ResourceType>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir = std::env::var("BRIDGE_DATA_DIR")
        .unwrap_or_else(|_| DEFAULT_CONVERSION_DATA_DIR.into());
    let cfg = Arc::new(CoreConfig::new(PathBuf::from(data_dir)));
    let service = ConversionService::new(cfg);
    let caller = cli.caller.as_deref();

    match cli.command {
        Some(Commands::Convert {
            resource_type,
            file,
        }) => {
            let raw = std::fs::read_to_string(&file)?;
            let data: serde_json::Value = serde_json::from_str(&raw)?;

            let outcome = service.convert(resource_type, &data, caller)?;
            if outcome.success {
                println!(
                    "Converted: id={}",
                    outcome.id.map(|id| id.to_string()).unwrap_or_default()
                );
                if let Some(resource) = outcome.fhir_resource {
                    println!("{}", serde_json::to_string_pretty(&resource)?);
                }
            } else {
                println!("Conversion rejected: {}", outcome.message);
                for error in outcome.validation_errors {
                    println!("  - {error}");
                }
            }
        }
        Some(Commands::Rerun { id }) => {
            let outcome = service.rerun(&id, caller)?;
            if outcome.success {
                println!("Re-run completed: id={id}");
            } else {
                println!("Re-run failed: {}", outcome.message);
            }
        }
        Some(Commands::Show { id }) => match service.get_request(&id, caller)? {
            Access::Found(request) => {
                println!("{}", serde_json::to_string_pretty(&request)?);
            }
            Access::Forbidden => println!("Conversion request belongs to another caller"),
            Access::NotFound => println!("Conversion request not found"),
        },
        Some(Commands::Resource { id }) => match service.get_fhir_resource(&id, caller)? {
            Access::Found(record) => {
                let resource: serde_json::Value = serde_json::from_str(&record.fhir_json)?;
                println!("{}", serde_json::to_string_pretty(&resource)?);
            }
            Access::Forbidden => println!("Conversion request belongs to another caller"),
            Access::NotFound => println!("FHIR resource not found"),
        },
        Some(Commands::History { resource_type }) => {
            let requests = match resource_type {
                Some(resource_type) => service.history_for_type(resource_type, caller),
                None => service.history(caller),
            };

            if requests.is_empty() {
                println!("No conversion requests found.");
            } else {
                for request in requests {
                    println!(
                        "ID: {}, Type: {}, Status: {:?}, Created: {}{}",
                        request.id,
                        request.resource_type,
                        request.status,
                        request.created_at.to_rfc3339(),
                        request
                            .error_message
                            .as_deref()
                            .map(|m| format!(", Error: {m}"))
                            .unwrap_or_default()
                    );
                }
            }
        }
        None => {
            println!("No command provided. Use --help for usage.");
        }
    }

    Ok(())
}
