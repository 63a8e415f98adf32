use {
    crate::{config::Config, error::DeployError},
    alloy::primitives::{Address, U256},
    number::{BasisPoints, units},
    std::time::Duration,
};

/// Arguments of `SmartParkingReservation`'s constructor, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorArgs {
    pub treasury: Address,
    /// Price of a reservation in wei.
    pub base_price_units: U256,
    pub penalty_bps: BasisPoints,
    pub reservation_window_secs: u64,
}

impl ConstructorArgs {
    /// Derives the arguments from the configuration. Deterministic and free of
    /// I/O.
    pub fn compute(config: &Config) -> Result<Self, DeployError> {
        let base_price_units =
            units::parse_ether(&config.base_price).map_err(|err| {
                DeployError::ArgumentComputation {
                    argument: "basePriceWei",
                    reason: err.to_string(),
                }
            })?;
        let penalty_bps = BasisPoints::try_from(config.penalty_bps).map_err(|err| {
            DeployError::ArgumentComputation {
                argument: "penaltyBps",
                reason: err.to_string(),
            }
        })?;

        Ok(Self {
            treasury: config.treasury,
            base_price_units,
            penalty_bps,
            reservation_window_secs: whole_seconds(config.reservation_window)?,
        })
    }
}

/// The contract counts time in whole seconds, anything finer would be
/// silently dropped on chain.
pub fn whole_seconds(window: Duration) -> Result<u64, DeployError> {
    if window.subsec_nanos() != 0 {
        return Err(DeployError::ArgumentComputation {
            argument: "reserveWindowSec",
            reason: format!("{window:?} is not a whole number of seconds"),
        });
    }
    Ok(window.as_secs())
}
