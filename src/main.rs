//! Command-line interface for modelschema

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use modelschema::{
    GeneratedSchema, GenerationSession, GeneratorConfig, Model, QualifiedNameResolver, Schema,
    SchemaBackend,
};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "modelschema")]
#[command(author, version, about = "Model to XML Schema / JSON Schema compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate one schema per operation of a model
    Generate {
        /// Path to the model file (JSON)
        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,

        /// Interface type selecting the output dialect (e.g. SOAP, REST)
        #[arg(short, long, default_value = "SOAP")]
        interface_type: String,

        /// Base namespace; each operation gets `<namespace>/<operation>`
        #[arg(short, long)]
        namespace: String,

        /// Token bound to operation namespaces
        #[arg(short, long, default_value = "tns")]
        token: String,

        /// Namespace of the shared type library
        #[arg(long)]
        common_namespace: Option<String>,

        /// Token bound to the shared type library
        #[arg(long, default_value = "cmn")]
        common_token: String,

        /// Service name written into headers and bundle file names
        #[arg(long, default_value = "Service")]
        service: String,

        /// Document version
        #[arg(long, default_value = "1.0")]
        schema_version: String,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Merge all operations into a single document
        #[arg(long)]
        bundle: bool,
    },

    /// Print the qualified root class name of every message
    Names {
        /// Path to the model file (JSON)
        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,

        /// Token bound to operation namespaces
        #[arg(short, long, default_value = "tns")]
        token: String,

        /// Token of the shared type library, if one is generated
        #[arg(long)]
        common_token: Option<String>,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the effective configuration to a file
    Config {
        /// Target file
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Configuration file to start from (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            model,
            interface_type,
            namespace,
            token,
            common_namespace,
            common_token,
            service,
            schema_version,
            config,
            output,
            bundle,
        } => cmd_generate(GenerateArgs {
            model,
            interface_type,
            namespace,
            token,
            common_namespace,
            common_token,
            service,
            schema_version,
            config,
            output,
            bundle,
        }),
        Commands::Names {
            model,
            token,
            common_token,
            config,
        } => cmd_names(model, token, common_token, config),
        Commands::Config { path, config } => cmd_config(path, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
struct GenerateArgs {
    model: PathBuf,
    interface_type: String,
    namespace: String,
    token: String,
    common_namespace: Option<String>,
    common_token: String,
    service: String,
    schema_version: String,
    config: Option<PathBuf>,
    output: PathBuf,
    bundle: bool,
}

#[cfg(feature = "cli")]
fn cmd_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = GeneratorConfig::load_from(args.config.as_deref())?;
    let model = Model::from_file(&args.model)?;

    let mut session =
        GenerationSession::new(&model, &config, &args.interface_type, &args.schema_version)?;
    if let Some(ref common_namespace) = args.common_namespace {
        session = session.with_common_schema(common_namespace, &args.common_token)?;
    }
    let extension = session.dialect().extension();
    fs::create_dir_all(&args.output)?;

    let mut bundle: Option<Schema> = None;
    for (operation, messages) in model.operations() {
        let namespace = if args.bundle {
            args.namespace.clone()
        } else {
            format!("{}/{}", args.namespace.trim_end_matches('/'), operation)
        };

        let mut processor = session.processor(operation, &namespace, &args.token)?;
        for message in messages {
            processor.process_message(message)?;
        }
        let generated = processor.finish();
        report(&generated);

        if args.bundle {
            match bundle.as_mut() {
                Some(target) => target.merge(generated.schema)?,
                None => bundle = Some(generated.schema),
            }
        } else {
            let header = session.header(&args.service, operation, "Operation");
            let path = args.output.join(format!("{}.{}", operation, extension));
            write_schema(&generated.schema, &header, &path)?;
        }
    }

    if let Some(mut schema) = bundle {
        schema.sort();
        let header = session.header(&args.service, &args.service, "Service");
        let path = args.output.join(format!("{}.{}", args.service, extension));
        write_schema(&schema, &header, &path)?;
    }

    let header = session.header(&args.service, &args.common_token, "Library");
    if let Some(common) = session.finish_common() {
        let path = args
            .output
            .join(format!("{}.{}", common.namespace_token(), extension));
        write_schema(&common, &header, &path)?;
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn report(generated: &GeneratedSchema) {
    if generated.diagnostics.is_empty() {
        return;
    }
    eprintln!(
        "{}: {} diagnostic(s)",
        generated.operation,
        generated.diagnostics.len()
    );
    for diagnostic in generated.diagnostics.items() {
        eprintln!("  {}: {}", diagnostic.severity, diagnostic);
    }
}

#[cfg(feature = "cli")]
fn write_schema(schema: &Schema, header: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = schema.to_string_with_header(header)?;
    fs::write(path, text)?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_names(
    model_path: PathBuf,
    token: String,
    common_token: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = GeneratorConfig::load_from(config_path.as_deref())?;
    let model = Model::from_file(&model_path)?;

    for message in model.messages() {
        let class = model.require_class(&message.class)?;
        let naming = QualifiedNameResolver::new(
            &config.naming,
            common_token.as_deref(),
            &token,
            &message.role,
        );
        println!(
            "{}\t{}",
            message.role,
            naming.qualified_class_name(class, class.scope)
        );
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_config(path: PathBuf, config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = GeneratorConfig::load_from(config_path.as_deref())?;
    config.save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
