//! Deploys against a development node (anvil or `npx hardhat node`) listening
//! on http://localhost:8545 with the default funded accounts.

use {
    parking_deployer::{
        arguments::{Arguments, DEFAULT_ARTIFACT, LoggingArguments},
        run,
    },
    std::{path::Path, time::Duration},
    tracing::level_filters::LevelFilter,
};

const NODE_URL: &str = "http://localhost:8545";
/// First default account of anvil and hardhat.
const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const TREASURY: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

/// Init code returning a single `STOP` byte as runtime code. Appended
/// constructor arguments are ignored.
const ARTIFACT: &str = r#"{
  "_format": "hh-sol-artifact-1",
  "contractName": "SmartParkingReservation",
  "sourceName": "contracts/SmartParkingReservation.sol",
  "abi": [
    {
      "inputs": [
        { "internalType": "address", "name": "_treasury", "type": "address" },
        { "internalType": "uint256", "name": "_basePriceWei", "type": "uint256" },
        { "internalType": "uint16", "name": "_penaltyBps", "type": "uint16" },
        { "internalType": "uint256", "name": "_reserveWindowSec", "type": "uint256" }
      ],
      "stateMutability": "nonpayable",
      "type": "constructor"
    },
    {
      "inputs": [{ "internalType": "uint256", "name": "id", "type": "uint256" }],
      "name": "confirmArrival",
      "outputs": [],
      "stateMutability": "nonpayable",
      "type": "function"
    },
    {
      "inputs": [{ "internalType": "uint256", "name": "id", "type": "uint256" }],
      "name": "finalizeNoShow",
      "outputs": [],
      "stateMutability": "nonpayable",
      "type": "function"
    }
  ],
  "bytecode": "0x6001600c60003960016000f300",
  "deployedBytecode": "0x00",
  "linkReferences": {},
  "deployedLinkReferences": {}
}"#;

fn arguments(artifact: &Path) -> Arguments {
    Arguments {
        logging: LoggingArguments {
            log_filter: "warn,parking_deployer=debug".to_string(),
            log_stderr_threshold: LevelFilter::ERROR,
            use_json_logs: false,
        },
        node_url: Some(NODE_URL.to_string()),
        private_key: Some(PRIVATE_KEY.to_string()),
        treasury_address: Some(TREASURY.to_string()),
        artifact: artifact.to_path_buf(),
        base_price: "0.1".to_string(),
        penalty_bps: 2000,
        reservation_window: Duration::from_secs(900),
        expected_chain_id: None,
        confirmations: 1,
        confirmation_timeout: Duration::from_secs(60),
    }
}

#[tokio::test]
#[ignore]
async fn local_node_deploys_a_new_instance_per_run() {
    observe::tracing::initialize_reentrant("warn,parking_deployer=debug");
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join(
        Path::new(DEFAULT_ARTIFACT)
            .file_name()
            .expect("default artifact has a file name"),
    );
    std::fs::write(&artifact, ARTIFACT).unwrap();

    let first = run(arguments(&artifact), std::future::pending())
        .await
        .unwrap();
    let second = run(arguments(&artifact), std::future::pending())
        .await
        .unwrap();

    assert_ne!(first.contract_address, second.contract_address);
    assert_ne!(first.tx_hash, second.tx_hash);
    assert_eq!(first.deployer, second.deployer);
    assert_eq!(
        first.deployer.to_string(),
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
    );
    for deployment in [first, second] {
        let printed = deployment.to_string();
        let address = printed.strip_prefix("SmartParkingReservation deployed to: ").unwrap();
        assert_eq!(address.len(), 42);
        assert!(address[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
