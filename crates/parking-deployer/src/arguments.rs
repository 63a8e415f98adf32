use {
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    tracing::level_filters::LevelFilter,
};

pub const DEFAULT_ARTIFACT: &str =
    "artifacts/contracts/SmartParkingReservation.sol/SmartParkingReservation.json";

#[derive(clap::Parser)]
#[clap(name = "parking-deployer", about = "Deploys the SmartParkingReservation contract")]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// JSON-RPC endpoint of the network to deploy to.
    #[clap(long, env = "IOTA_EVM_TESTNET_URL")]
    pub node_url: Option<String>,

    /// Hex encoded private key of the account paying for the deployment.
    #[clap(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Address receiving the reservation payments and penalties.
    #[clap(long, env)]
    pub treasury_address: Option<String>,

    /// Hardhat artifact of the compiled contract.
    #[clap(long, env = "CONTRACT_ARTIFACT", default_value = DEFAULT_ARTIFACT)]
    pub artifact: PathBuf,

    /// Price of a reservation in units of the native token, e.g. "0.1".
    #[clap(long, env, default_value = "0.1")]
    pub base_price: String,

    /// Share of the price kept as a penalty for no-shows, in basis points.
    #[clap(long, env, default_value = "2000")]
    pub penalty_bps: u16,

    /// How long a reservation stays valid before it can be finalized as a
    /// no-show. Must be a whole number of seconds.
    #[clap(
        long,
        env,
        default_value = "15m",
        value_parser = humantime::parse_duration,
    )]
    pub reservation_window: Duration,

    /// Refuse to deploy unless the node reports this chain id (1076 for the
    /// IOTA EVM testnet).
    #[clap(long = "chain-id", env = "CHAIN_ID")]
    pub expected_chain_id: Option<u64>,

    /// Number of blocks the deployment needs to be buried under before it is
    /// considered final.
    #[clap(long, env, default_value = "1")]
    pub confirmations: u64,

    /// Give up waiting for the deployment transaction after this long.
    #[clap(
        long,
        env,
        default_value = "5m",
        value_parser = humantime::parse_duration,
    )]
    pub confirmation_timeout: Duration,
}

#[derive(clap::Parser)]
pub struct LoggingArguments {
    #[clap(long, env, default_value = "warn,parking_deployer=debug,observe=info")]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Emit log events as JSON lines.
    #[clap(long, env)]
    pub use_json_logs: bool,
}

impl LoggingArguments {
    pub fn observe_config(&self) -> observe::Config {
        let config = observe::Config::default().with_env_filter(&self.log_filter);
        let config = match self.log_stderr_threshold.into_level() {
            Some(level) => config.with_stderr_threshold(level),
            // `off` keeps every event on stdout.
            None => config,
        };
        if self.use_json_logs {
            config.with_json_format()
        } else {
            config
        }
    }
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            use_json_logs,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        Ok(())
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            node_url,
            private_key,
            treasury_address,
            artifact,
            base_price,
            penalty_bps,
            reservation_window,
            expected_chain_id,
            confirmations,
            confirmation_timeout,
        } = self;

        write!(f, "{logging}")?;
        // RPC urls regularly embed api keys.
        display_secret_option(f, "node_url", node_url)?;
        display_secret_option(f, "private_key", private_key)?;
        display_option(f, "treasury_address", treasury_address)?;
        writeln!(f, "artifact: {}", artifact.display())?;
        writeln!(f, "base_price: {base_price}")?;
        writeln!(f, "penalty_bps: {penalty_bps}")?;
        writeln!(f, "reservation_window: {reservation_window:?}")?;
        display_option(f, "expected_chain_id", expected_chain_id)?;
        writeln!(f, "confirmations: {confirmations}")?;
        writeln!(f, "confirmation_timeout: {confirmation_timeout:?}")?;
        Ok(())
    }
}

pub fn display_secret_option<T>(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<T>,
) -> fmt::Result {
    display_option(f, name, &option.as_ref().map(|_| "SECRET"))
}

pub fn display_option(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<impl Display>,
) -> fmt::Result {
    write!(f, "{name}: ")?;
    match option {
        Some(display) => writeln!(f, "{display}"),
        None => writeln!(f, "None"),
    }
}
