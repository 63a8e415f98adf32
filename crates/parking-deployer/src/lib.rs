pub mod arguments;
pub mod artifact;
pub mod chain;
pub mod config;
pub mod constructor;
pub mod deployment;
pub mod error;

use {
    arguments::Arguments,
    artifact::{Artifact, CONTRACT_NAME},
    clap::Parser,
    config::Config,
    deployment::{Deployer, Deployment},
    error::DeployError,
    std::{future::Future, process::ExitCode},
};

/// Entry point of the binary: parses arguments, sets up logging, deploys once
/// and maps the outcome to the process exit code.
pub async fn start(args: impl Iterator<Item = String>) -> ExitCode {
    let args = match Arguments::try_parse_from(args) {
        Ok(args) => args,
        // --help and --version
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };
    observe::tracing::initialize(&args.logging.observe_config());
    tracing::info!("running parking-deployer with arguments:\n{}", args);

    match run(args, ctrl_c()).await {
        Ok(deployment) => {
            println!("{deployment}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(kind = err.kind(), "deployment failed: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Validates the configuration and the artifact, then deploys. Nothing goes
/// over the network before both checks passed.
pub async fn run(
    args: Arguments,
    shutdown: impl Future<Output = ()>,
) -> Result<Deployment, DeployError> {
    let config = Config::try_from(args)?;
    tracing::debug!(
        node = config.node_url.host_str().unwrap_or_default(),
        "configuration is valid"
    );
    let artifact = Artifact::load(&config.artifact)?;
    artifact.verify(CONTRACT_NAME, config.compiler_version)?;

    let signer = chain::signer(&config.signing_key)?;
    let node = chain::Node::new(config.node_url.clone(), signer);
    Deployer::new(node, config, artifact).deploy(shutdown).await
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to listen for ctrl-c, cancellation disabled");
        std::future::pending::<()>().await;
    }
}
