use clap::{Parser, Subcommand};
use ftl::{
    commands::{
        config::{self, ConfigAction},
        init, policy, synth, validate,
    },
    logger, GlobalOpts,
};

#[derive(Parser)]
#[command(name = "ftl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "FTL manifest synthesizer",
    long_about = "FTL turns an application description into a WebAssembly runtime manifest with the MCP gateway and authorizer wired in, and generates access policies."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the runtime manifest for an application
    Synth(synth::SynthCommand),
    /// Check an application description without synthesizing
    Validate(validate::ValidateCommand),
    /// Generate the access policy for an application
    Policy(policy::PolicyCommand),
    /// Create a starter ftl.yaml
    Init {
        /// Optional filename (default: ftl.yaml)
        file: Option<String>,
    },
    /// Show or change ftl settings
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level(), cli.global.quiet) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    ftl::init_tracing(&cli.global);

    let result = match cli.command {
        Commands::Synth(cmd) => synth::handle_synth(cmd, &cli.global),
        Commands::Validate(cmd) => validate::handle_validate(cmd, &cli.global),
        Commands::Policy(cmd) => policy::handle_policy(cmd, &cli.global),
        Commands::Init { file } => init::handle_init(file, cli.global.clone()),
        Commands::Config { action } => config::handle_config(action, &cli.global),
    };

    if let Err(e) = result {
        logger::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
