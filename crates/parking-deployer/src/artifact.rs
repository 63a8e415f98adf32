//! Loading of compiled contracts from Hardhat artifacts.
//!
//! Hardhat writes `artifacts/contracts/<File>.sol/<Name>.json` containing the
//! ABI and creation bytecode, next to a `<Name>.dbg.json` pointing at the
//! build info file which records the compiler version.

use {
    crate::{constructor::ConstructorArgs, error::DeployError},
    alloy::{
        dyn_abi::{DynSolValue, JsonAbiExt},
        json_abi::{Constructor, JsonAbi},
        primitives::{Bytes, U256, hex},
    },
    serde::Deserialize,
    std::{
        fs::File,
        io::{BufReader, ErrorKind},
        path::{Path, PathBuf},
    },
};

pub const CONTRACT_NAME: &str = "SmartParkingReservation";

/// Functions the parking operator calls on a deployed instance, each taking a
/// reservation id.
pub const OPERATOR_FUNCTIONS: [&str; 2] = ["confirmArrival", "finalizeNoShow"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    abi: JsonAbi,
    bytecode: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    solc_version: String,
}

/// A compiled contract ready to be deployed.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub path: PathBuf,
    pub contract_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
    /// Compiler version from the build info, if Hardhat left one behind.
    pub solc_version: Option<String>,
}

impl Artifact {
    pub fn load(path: &Path) -> Result<Self, DeployError> {
        let json = std::fs::read_to_string(path)
            .map_err(|err| DeployError::invalid_artifact(path, err))?;
        let mut artifact = Self::from_json(path, &json)?;
        artifact.solc_version = solc_version(path)?;
        Ok(artifact)
    }

    pub fn from_json(path: &Path, json: &str) -> Result<Self, DeployError> {
        let artifact: HardhatArtifact =
            serde_json::from_str(json).map_err(|err| DeployError::invalid_artifact(path, err))?;
        if artifact.bytecode.contains("__$") {
            return Err(DeployError::invalid_artifact(
                path,
                "bytecode contains unlinked library placeholders",
            ));
        }
        let bytecode = hex::decode(&artifact.bytecode)
            .map_err(|err| DeployError::invalid_artifact(path, format!("bytecode: {err}")))?;
        if bytecode.is_empty() {
            return Err(DeployError::invalid_artifact(
                path,
                "bytecode is empty, is the contract abstract?",
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            contract_name: artifact.contract_name,
            abi: artifact.abi,
            bytecode: bytecode.into(),
            solc_version: None,
        })
    }

    /// Makes sure this is the contract we want to deploy, compiled with the
    /// expected compiler and exposing the expected constructor.
    pub fn verify(&self, contract_name: &str, compiler_version: &str) -> Result<(), DeployError> {
        if self.contract_name != contract_name {
            return Err(self.invalid(format!(
                "artifact is for contract {} instead of {contract_name}",
                self.contract_name
            )));
        }

        match &self.solc_version {
            // Build info versions look like "0.8.24" while solc reports
            // "0.8.24+commit.e11b9ed9".
            Some(version) if version.split('+').next() != Some(compiler_version) => {
                return Err(self.invalid(format!(
                    "compiled with solc {version} instead of {compiler_version}"
                )));
            }
            Some(_) => (),
            None => tracing::warn!(
                path = %self.path.display(),
                expected = compiler_version,
                "no build info found, cannot verify compiler version"
            ),
        }

        self.constructor_widths()?;
        self.operator_functions()
    }

    /// Creation bytecode followed by the ABI encoded constructor arguments.
    pub fn creation_code(&self, args: &ConstructorArgs) -> Result<Bytes, DeployError> {
        let [price_bits, penalty_bits, window_bits] = self.constructor_widths()?;
        let constructor = self.constructor()?;

        let out_of_range = |argument: &'static str, bits: usize| {
            DeployError::ArgumentComputation {
                argument,
                reason: format!("value does not fit into uint{bits}"),
            }
        };
        if args.base_price_units.bit_len() > price_bits {
            return Err(out_of_range("basePriceWei", price_bits));
        }
        if !args.penalty_bps.fits_in_bits(penalty_bits) {
            return Err(out_of_range("penaltyBps", penalty_bits));
        }
        if u64::BITS - args.reservation_window_secs.leading_zeros() > window_bits as u32 {
            return Err(out_of_range("reserveWindowSec", window_bits));
        }

        let values = [
            DynSolValue::Address(args.treasury),
            DynSolValue::Uint(args.base_price_units, price_bits),
            DynSolValue::Uint(U256::from(args.penalty_bps.get()), penalty_bits),
            DynSolValue::Uint(U256::from(args.reservation_window_secs), window_bits),
        ];
        let encoded = constructor.abi_encode_input(&values).map_err(|err| {
            DeployError::ArgumentComputation {
                argument: "constructor",
                reason: err.to_string(),
            }
        })?;

        let mut code = self.bytecode.to_vec();
        code.extend_from_slice(&encoded);
        Ok(code.into())
    }

    fn constructor(&self) -> Result<&Constructor, DeployError> {
        self.abi
            .constructor
            .as_ref()
            .ok_or_else(|| self.invalid("ABI declares no constructor"))
    }

    /// Checks the constructor is `(address, uint, uint, uint)` and returns the
    /// bit widths of the three integers.
    fn constructor_widths(&self) -> Result<[usize; 3], DeployError> {
        let inputs = &self.constructor()?.inputs;
        let types = inputs.iter().map(|p| p.ty.as_str()).collect::<Vec<_>>();
        let mismatch = || {
            self.invalid(format!(
                "expected constructor(address,uint,uint,uint) but found constructor({})",
                types.join(",")
            ))
        };

        match types.as_slice() {
            ["address", price, penalty, window] => Ok([
                uint_bits(price).ok_or_else(mismatch)?,
                uint_bits(penalty).ok_or_else(mismatch)?,
                uint_bits(window).ok_or_else(mismatch)?,
            ]),
            _ => Err(mismatch()),
        }
    }

    fn operator_functions(&self) -> Result<(), DeployError> {
        for name in OPERATOR_FUNCTIONS {
            let callable = self
                .abi
                .function(name)
                .into_iter()
                .flatten()
                .any(|function| {
                    matches!(function.inputs.as_slice(), [id] if id.ty == "uint256")
                });
            if !callable {
                return Err(self.invalid(format!("ABI lacks function {name}(uint256)")));
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: impl ToString) -> DeployError {
        DeployError::invalid_artifact(&self.path, reason)
    }
}

/// Width of a Solidity unsigned integer type, `uint` being `uint256`.
fn uint_bits(ty: &str) -> Option<usize> {
    let bits = ty.strip_prefix("uint")?;
    if bits.is_empty() {
        return Some(256);
    }
    let bits = bits.parse::<usize>().ok()?;
    (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(bits)
}

/// Reads the compiler version through the debug file Hardhat writes next to
/// each artifact. Artifacts copied around without it are fine, broken
/// pointers are not.
fn solc_version(artifact: &Path) -> Result<Option<String>, DeployError> {
    let debug_path = artifact.with_extension("dbg.json");
    let file = match File::open(&debug_path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(DeployError::invalid_artifact(&debug_path, err)),
    };
    let debug: DebugFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| DeployError::invalid_artifact(&debug_path, err))?;

    let build_info_path = debug_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&debug.build_info);
    let file = File::open(&build_info_path)
        .map_err(|err| DeployError::invalid_artifact(&build_info_path, err))?;
    let build_info: BuildInfo = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| DeployError::invalid_artifact(&build_info_path, err))?;
    Ok(Some(build_info.solc_version))
}
