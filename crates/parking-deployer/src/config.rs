use {
    crate::{arguments::Arguments, error::DeployError},
    alloy::primitives::Address,
    std::{
        fmt::{self, Debug, Formatter},
        path::PathBuf,
        time::Duration,
    },
    url::Url,
};

/// Solidity compiler the contract artifact is expected to be built with.
pub const COMPILER_VERSION: &str = "0.8.24";

pub const NODE_URL_KEY: &str = "IOTA_EVM_TESTNET_URL";
pub const PRIVATE_KEY_KEY: &str = "PRIVATE_KEY";
pub const TREASURY_ADDRESS_KEY: &str = "TREASURY_ADDRESS";
pub const CONFIRMATIONS_KEY: &str = "CONFIRMATIONS";

/// Validated, immutable configuration of a single deployment run.
#[derive(Clone, Debug)]
pub struct Config {
    pub node_url: Url,
    pub signing_key: SigningKey,
    pub compiler_version: &'static str,
    pub treasury: Address,
    pub artifact: PathBuf,
    pub base_price: String,
    pub penalty_bps: u16,
    pub reservation_window: Duration,
    pub expected_chain_id: Option<u64>,
    pub confirmations: u64,
    pub confirmation_timeout: Duration,
}

/// Private key of the deployer. Never printed.
#[derive(Clone)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for SigningKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(SECRET)")
    }
}

impl TryFrom<Arguments> for Config {
    type Error = DeployError;

    fn try_from(args: Arguments) -> Result<Self, Self::Error> {
        let node_url = required(args.node_url, NODE_URL_KEY)?;
        let node_url = node_url
            .parse::<Url>()
            .map_err(|err| DeployError::InvalidConfiguration {
                key: NODE_URL_KEY,
                reason: err.to_string(),
            })?;
        let signing_key = SigningKey(required(args.private_key, PRIVATE_KEY_KEY)?);
        let treasury = parse_treasury(&required(
            args.treasury_address,
            TREASURY_ADDRESS_KEY,
        )?)?;

        if args.confirmations == 0 {
            return Err(DeployError::InvalidConfiguration {
                key: CONFIRMATIONS_KEY,
                reason: "at least one confirmation is required".to_string(),
            });
        }

        Ok(Self {
            node_url,
            signing_key,
            compiler_version: COMPILER_VERSION,
            treasury,
            artifact: args.artifact,
            base_price: args.base_price,
            penalty_bps: args.penalty_bps,
            reservation_window: args.reservation_window,
            expected_chain_id: args.expected_chain_id,
            confirmations: args.confirmations,
            confirmation_timeout: args.confirmation_timeout,
        })
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, DeployError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(DeployError::MissingConfiguration { key }),
    }
}

fn parse_treasury(value: &str) -> Result<Address, DeployError> {
    let invalid = |reason: String| DeployError::InvalidConfiguration {
        key: TREASURY_ADDRESS_KEY,
        reason,
    };
    let address = value
        .parse::<Address>()
        .map_err(|err| invalid(format!("{value:?} is not an address: {err}")))?;
    // Mixed case means the user copied a checksummed address, so a typo
    // shows up as a checksum mismatch.
    let hex = value.strip_prefix("0x").unwrap_or(value);
    let mixed_case = hex.chars().any(|c| c.is_ascii_uppercase())
        && hex.chars().any(|c| c.is_ascii_lowercase());
    if mixed_case && Address::parse_checksummed(value, None).is_err() {
        return Err(invalid(format!("{value:?} has an invalid checksum")));
    }
    if address.is_zero() {
        return Err(invalid("payments to the zero address are lost".to_string()));
    }
    Ok(address)
}
