use {
    crate::{
        artifact::{Artifact, CONTRACT_NAME},
        chain::{Chain, Receipt},
        config::Config,
        constructor::ConstructorArgs,
        error::DeployError,
    },
    alloy::primitives::{Address, TxHash},
    anyhow::anyhow,
    number::units,
    std::{
        fmt::{self, Display, Formatter},
        future::Future,
    },
};

/// Outcome of a successful run. Printed once, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub contract_address: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub deployer: Address,
}

impl Display for Deployment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{CONTRACT_NAME} deployed to: {}", self.contract_address)
    }
}

/// Runs a single deployment: acquire signer, log balance, compute constructor
/// arguments, submit, wait for confirmation. No step is retried.
pub struct Deployer<C> {
    chain: C,
    config: Config,
    artifact: Artifact,
}

impl<C: Chain> Deployer<C> {
    pub fn new(chain: C, config: Config, artifact: Artifact) -> Self {
        Self {
            chain,
            config,
            artifact,
        }
    }

    /// Deploys the contract. `shutdown` resolving while waiting for the
    /// confirmation aborts the wait, not the already broadcast transaction.
    pub async fn deploy(
        &self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<Deployment, DeployError> {
        let deployer = self.acquire_signer().await?;
        self.log_balance(deployer).await;

        let args = ConstructorArgs::compute(&self.config)?;
        let creation_code = self.artifact.creation_code(&args)?;
        tracing::info!(
            treasury = %args.treasury,
            base_price_wei = %args.base_price_units,
            penalty = %args.penalty_bps,
            reservation_window_secs = args.reservation_window_secs,
            "computed constructor arguments"
        );

        let tx_hash = self
            .chain
            .deploy(creation_code)
            .await
            .map_err(DeployError::DeploymentRejected)?;
        tracing::info!(?tx_hash, "submitted deployment transaction");

        let receipt = self.confirm(tx_hash, shutdown).await?;
        if !receipt.success {
            return Err(DeployError::TransactionReverted { tx_hash });
        }
        let contract_address = receipt.contract_address.ok_or_else(|| {
            DeployError::DeploymentRejected(anyhow!(
                "receipt of {tx_hash} does not contain a contract address"
            ))
        })?;

        let deployment = Deployment {
            contract_address,
            tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            deployer,
        };
        tracing::info!(
            contract = %deployment.contract_address,
            block = ?deployment.block_number,
            gas_used = deployment.gas_used,
            "deployment confirmed"
        );
        Ok(deployment)
    }

    /// Makes sure the node is reachable with our signer and on the right
    /// network before anything gets signed.
    async fn acquire_signer(&self) -> Result<Address, DeployError> {
        let deployer = self.chain.deployer();
        let chain_id = self
            .chain
            .chain_id()
            .await
            .map_err(DeployError::SignerUnavailable)?;
        match self.config.expected_chain_id {
            Some(expected) if expected != chain_id => {
                return Err(DeployError::WrongNetwork {
                    expected,
                    actual: chain_id,
                });
            }
            _ => (),
        }
        tracing::info!(%deployer, chain_id, "acquired signer");
        Ok(deployer)
    }

    /// Purely informational, failures are logged and otherwise ignored.
    async fn log_balance(&self, deployer: Address) {
        match self.chain.balance(deployer).await {
            Ok(balance) => tracing::info!(
                %deployer,
                wei = %balance,
                native = %units::format_ether(balance),
                "deployer balance"
            ),
            Err(err) => tracing::warn!(?err, %deployer, "failed to fetch deployer balance"),
        }
    }

    async fn confirm(
        &self,
        tx_hash: TxHash,
        shutdown: impl Future<Output = ()>,
    ) -> Result<Receipt, DeployError> {
        let timeout = self.config.confirmation_timeout;
        let wait = self
            .chain
            .wait_for_receipt(tx_hash, self.config.confirmations);

        tokio::select! {
            result = tokio::time::timeout(timeout, wait) => match result {
                Ok(Ok(receipt)) => Ok(receipt),
                Ok(Err(reason)) => Err(DeployError::ConfirmationUnavailable { tx_hash, reason }),
                Err(_) => Err(DeployError::ConfirmationTimeout { tx_hash, timeout }),
            },
            _ = shutdown => {
                tracing::warn!(?tx_hash, "cancelled while waiting for confirmation");
                Err(DeployError::Cancelled { tx_hash })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            artifact::tests::{BYTECODE, artifact},
            chain::MockChain,
            config::tests::{TREASURY, config},
        },
        alloy::primitives::{B256, Bytes, U256, address, hex},
        mockall::predicate::eq,
        std::time::Duration,
    };

    const DEPLOYER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const CONTRACT: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
    const TX: B256 = B256::repeat_byte(0x42);

    fn receipt(success: bool) -> Receipt {
        Receipt {
            success,
            contract_address: success.then_some(CONTRACT),
            block_number: Some(7),
            gas_used: 21_000,
        }
    }

    /// A node that accepts and reports everything.
    fn healthy_chain() -> MockChain {
        let mut chain = MockChain::new();
        chain.expect_deployer().return_const(DEPLOYER);
        chain.expect_chain_id().returning(|| Ok(1076));
        chain
            .expect_balance()
            .with(eq(DEPLOYER))
            .returning(|_| Ok(U256::from(10u64).pow(U256::from(18u64))));
        chain
    }

    fn never() -> std::future::Pending<()> {
        std::future::pending()
    }

    #[tokio::test]
    async fn deploys_and_reports_contract_address() {
        observe::tracing::initialize_reentrant("parking_deployer=debug");
        let mut chain = healthy_chain();
        let bytecode = hex::decode(BYTECODE).unwrap();
        chain
            .expect_deploy()
            .times(1)
            .withf(move |code: &Bytes| {
                code.starts_with(&bytecode) && code.len() == bytecode.len() + 4 * 32
            })
            .returning(|_| Ok(TX));
        chain
            .expect_wait_for_receipt()
            .with(eq(TX), eq(1))
            .times(1)
            .returning(|_, _| Ok(receipt(true)));

        let deployment = Deployer::new(chain, config(), artifact())
            .deploy(never())
            .await
            .unwrap();

        assert_eq!(
            deployment,
            Deployment {
                contract_address: CONTRACT,
                tx_hash: TX,
                block_number: Some(7),
                gas_used: 21_000,
                deployer: DEPLOYER,
            }
        );
        let printed = deployment.to_string();
        assert_eq!(
            printed,
            "SmartParkingReservation deployed to: 0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
        let address = printed.rsplit(' ').next().unwrap();
        assert_eq!(address.len(), 42);
        assert!(address[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn balance_failure_does_not_abort() {
        let mut chain = MockChain::new();
        chain.expect_deployer().return_const(DEPLOYER);
        chain.expect_chain_id().returning(|| Ok(1076));
        chain
            .expect_balance()
            .times(1)
            .returning(|_| Err(anyhow!("method not supported")));
        chain.expect_deploy().times(1).returning(|_| Ok(TX));
        chain
            .expect_wait_for_receipt()
            .returning(|_, _| Ok(receipt(true)));

        let deployment = Deployer::new(chain, config(), artifact())
            .deploy(never())
            .await
            .unwrap();
        assert_eq!(deployment.contract_address, CONTRACT);
    }

    #[tokio::test]
    async fn unreachable_node_leaves_signer_unavailable() {
        let mut chain = MockChain::new();
        chain.expect_deployer().return_const(DEPLOYER);
        chain
            .expect_chain_id()
            .returning(|| Err(anyhow!("connection refused")));
        chain.expect_balance().never();
        chain.expect_deploy().never();
        chain.expect_wait_for_receipt().never();

        let err = Deployer::new(chain, config(), artifact())
            .deploy(never())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::SignerUnavailable(_)));
        assert_eq!(err.kind(), "SignerUnavailable");
    }

    #[tokio::test]
    async fn refuses_to_deploy_on_unexpected_network() {
        let mut chain = MockChain::new();
        chain.expect_deployer().return_const(DEPLOYER);
        chain.expect_chain_id().returning(|| Ok(1));
        chain.expect_deploy().never();

        let config = Config {
            expected_chain_id: Some(1076),
            ..config()
        };
        let err = Deployer::new(chain, config, artifact())
            .deploy(never())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::WrongNetwork {
                expected: 1076,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn invalid_arguments_are_caught_before_submission() {
        let mut chain = healthy_chain();
        chain.expect_deploy().never();

        let config = Config {
            reservation_window: Duration::from_millis(900_500),
            ..config()
        };
        let err = Deployer::new(chain, config, artifact())
            .deploy(never())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ArgumentComputationError");
    }

    #[tokio::test]
    async fn node_rejection_is_reported() {
        let mut chain = healthy_chain();
        chain
            .expect_deploy()
            .times(1)
            .returning(|_| Err(anyhow!("insufficient funds for gas * price + value")));
        chain.expect_wait_for_receipt().never();

        let err = Deployer::new(chain, config(), artifact())
            .deploy(never())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::DeploymentRejected(_)));
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn reverted_deployment_is_reported() {
        let mut chain = healthy_chain();
        chain.expect_deploy().returning(|_| Ok(TX));
        chain
            .expect_wait_for_receipt()
            .returning(|_, _| Ok(receipt(false)));

        let err = Deployer::new(chain, config(), artifact())
            .deploy(never())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::TransactionReverted { tx_hash } if tx_hash == TX));
    }

    #[tokio::test]
    async fn waiting_errors_are_reported() {
        let mut chain = healthy_chain();
        chain.expect_deploy().returning(|_| Ok(TX));
        chain
            .expect_wait_for_receipt()
            .returning(|_, _| Err(anyhow!("receipt polling failed")));

        let err = Deployer::new(chain, config(), artifact())
            .deploy(never())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ConfirmationUnavailable");
    }

    /// Accepts the transaction but never sees it mined.
    struct StalledNode;

    #[async_trait::async_trait]
    impl Chain for StalledNode {
        fn deployer(&self) -> Address {
            DEPLOYER
        }

        async fn chain_id(&self) -> anyhow::Result<u64> {
            Ok(1076)
        }

        async fn balance(&self, _: Address) -> anyhow::Result<U256> {
            Ok(U256::ZERO)
        }

        async fn deploy(&self, _: Bytes) -> anyhow::Result<TxHash> {
            Ok(TX)
        }

        async fn wait_for_receipt(&self, _: TxHash, _: u64) -> anyhow::Result<Receipt> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_wait_times_out() {
        let err = Deployer::new(StalledNode, config(), artifact())
            .deploy(never())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::ConfirmationTimeout { tx_hash, timeout }
                if tx_hash == TX && timeout == Duration::from_secs(300)
        ));
    }

    #[tokio::test]
    async fn confirmation_wait_can_be_cancelled() {
        let err = Deployer::new(StalledNode, config(), artifact())
            .deploy(async {})
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Cancelled { tx_hash } if tx_hash == TX));
    }

    #[test]
    fn treasury_comes_from_configuration() {
        assert_ne!(TREASURY, DEPLOYER);
        let args = ConstructorArgs::compute(&config()).unwrap();
        assert_eq!(args.treasury, TREASURY);
    }
}
