use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::Serialize;
use serde_json::{Value, json};

use apiview_client::{CapabilityKind, McpSession, execute};
use apiview_core::config::{self, ApiviewConfig, CONFIG_FILE_NAME};
use apiview_core::request::{
    Deployment, build_request, default_request_payload, render_preview,
};
use apiview_core::{ApiSpecReader, SpecDialect, create_reader};

#[derive(Parser)]
#[command(
    name = "apiview",
    about = "Explore OpenAPI, GraphQL and MCP specifications",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the operations of a specification, grouped by category
    Operations {
        #[command(flatten)]
        spec: SpecArgs,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Show parameters, responses and definitions of one operation
    Describe {
        /// Operation name, e.g. `get/pets/{petId}` or `query/pet`
        operation: String,

        #[command(flatten)]
        spec: SpecArgs,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Build a request for an operation and preview or send it
    Request {
        /// Operation name
        operation: String,

        #[command(flatten)]
        spec: SpecArgs,

        /// Parameter value as `name=value` (repeatable)
        #[arg(short, long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Request body, replacing the generated sample
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the request body from a file
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Base URL, overriding the configured deployment
        #[arg(long)]
        base_url: Option<String>,

        /// Send the request instead of printing a preview
        #[arg(long)]
        send: bool,
    },

    /// Talk to a live MCP server
    Mcp {
        #[command(subcommand)]
        command: McpCommands,

        /// MCP server URI, overriding the configured one
        #[arg(long, global = true)]
        server: Option<String>,
    },

    /// Initialize a new apiview configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum McpCommands {
    /// List tools, resources or prompts
    List { kind: Capability },

    /// Call a tool
    Call {
        name: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Read a resource
    Read { uri: String },

    /// Render a prompt
    Prompt {
        name: String,

        /// Prompt arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

#[derive(Args)]
struct SpecArgs {
    /// Path to the specification file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// `openapi`, `graphql` or `mcp`; detected from content when omitted
    #[arg(long)]
    dialect: Option<String>,

    /// Declared specification version, e.g. `2.0`
    #[arg(long)]
    spec_version: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Capability {
    Tools,
    Resources,
    Prompts,
}

impl From<Capability> for CapabilityKind {
    fn from(capability: Capability) -> Self {
        match capability {
            Capability::Tools => CapabilityKind::Tools,
            Capability::Resources => CapabilityKind::Resources,
            Capability::Prompts => CapabilityKind::Prompts,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Operations { spec, format } => cmd_operations(spec, format),

        Commands::Describe {
            operation,
            spec,
            format,
        } => cmd_describe(&operation, spec, format),

        Commands::Request {
            operation,
            spec,
            params,
            body,
            body_file,
            base_url,
            send,
        } => {
            let body = match body_file {
                Some(path) => Some(
                    fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                None => body,
            };
            cmd_request(&operation, spec, params, body, base_url, send).await
        }

        Commands::Mcp { command, server } => cmd_mcp(command, server).await,

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "apiview", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<ApiviewConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))?;
    if name.is_empty() {
        return Err(format!("missing parameter name in `{raw}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_json_object(raw: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("invalid JSON arguments: {raw}"))?;
    if !value.is_object() {
        anyhow::bail!("arguments must be a JSON object, got {raw}");
    }
    Ok(value)
}

fn load_reader(args: &SpecArgs, cfg: &ApiviewConfig) -> Result<Box<dyn ApiSpecReader>> {
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.spec.input));
    let content =
        fs::read_to_string(&input).with_context(|| format!("failed to read {}", input.display()))?;

    let dialect = match &args.dialect {
        Some(name) => {
            let version = args.spec_version.as_deref().or(cfg.spec.version.as_deref());
            SpecDialect::from_declared(name, version)?
        }
        None => cfg.spec.dialect_for(&content)?,
    };
    log::debug!("reading {} as {dialect}", input.display());

    let reader = create_reader(dialect, &content)
        .with_context(|| format!("failed to read {} as {dialect}", input.display()))?;
    Ok(reader)
}

fn print_value<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(value)?;
            print!("{}", yaml);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn cmd_operations(spec: SpecArgs, format: OutputFormat) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let reader = load_reader(&spec, &cfg)?;

    let summary = json!({
        "kind": reader.kind(),
        "base_url": reader.base_url(),
        "tags": reader.tag_labels(),
        "categories": reader.operation_categories(),
    });
    print_value(&summary, format)
}

fn cmd_describe(operation: &str, spec: SpecArgs, format: OutputFormat) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let reader = load_reader(&spec, &cfg)?;
    let Some(metadata) = reader.operation(operation) else {
        anyhow::bail!("unknown operation `{operation}`");
    };

    let description = json!({
        "operation": metadata,
        "request": reader.request_metadata(operation),
        "responses": reader.responses_metadata(operation),
        "definitions": reader.operation_definitions(operation),
    });
    print_value(&description, format)
}

async fn cmd_request(
    operation: &str,
    spec: SpecArgs,
    params: Vec<(String, String)>,
    body: Option<String>,
    base_url: Option<String>,
    send: bool,
) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let reader = load_reader(&spec, &cfg)?;
    let Some(metadata) = reader.operation(operation) else {
        anyhow::bail!("unknown operation `{operation}`");
    };
    if metadata.method.is_none() {
        anyhow::bail!("`{operation}` is not an HTTP operation");
    }
    let request_metadata = reader.request_metadata(operation).unwrap_or_default();

    let mut payload = default_request_payload(&metadata, &request_metadata);
    for (name, value) in params {
        if !payload.set(&name, value) {
            anyhow::bail!("`{operation}` has no parameter named `{name}`");
        }
    }
    if body.is_some() {
        payload.body = body;
    }

    let deployment = match base_url.or_else(|| {
        cfg.deployment
            .runtime_uri
            .is_empty()
            .then(|| reader.base_url())
            .flatten()
    }) {
        Some(base) => Deployment {
            runtime_uri: vec![base],
        },
        None => cfg.deployment.clone(),
    };
    let request = build_request(&metadata, &deployment, &payload);

    if !send {
        print!("{}", render_preview(&request)?);
        return Ok(());
    }

    let client = reqwest::Client::new();
    let response = execute(&client, &request, cfg.relay.as_ref()).await?;
    eprintln!("HTTP {}", response.status);
    for header in &response.headers {
        eprintln!("{}: {}", header.name, header.value);
    }
    println!("{}", response.body);
    Ok(())
}

async fn cmd_mcp(command: McpCommands, server: Option<String>) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let mut mcp = cfg.mcp.clone();
    if let Some(server) = server {
        mcp.server_uri = server;
    }

    let session = McpSession::connect(mcp, cfg.relay.clone());
    session
        .ready()
        .await
        .context("failed to initialize MCP session")?;

    let result = match command {
        McpCommands::List { kind } => Value::Array(session.list_capability(kind.into()).await?),
        McpCommands::Call { name, args } => {
            session.call_tool(&name, parse_json_object(&args)?).await?
        }
        McpCommands::Read { uri } => session.read_resource(&uri).await?,
        McpCommands::Prompt { name, args } => {
            session.get_prompt(&name, parse_json_object(&args)?).await?
        }
    };
    session.close();

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
