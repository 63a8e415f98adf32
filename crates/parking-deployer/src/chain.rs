//! Boundary to the network. Everything the deployment runner needs from a node
//! is behind the [`Chain`] trait so the runner can be tested with mocks.

use {
    crate::{config::SigningKey, error::DeployError},
    alloy::{
        network::{EthereumWallet, TransactionBuilder},
        primitives::{Address, Bytes, TxHash, U256},
        providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
        rpc::types::TransactionRequest,
        signers::local::PrivateKeySigner,
    },
    anyhow::{Context, Result, anyhow},
    url::Url,
};

/// What the node reports once the deployment transaction got mined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub success: bool,
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Chain: Send + Sync {
    /// Address of the account signing and paying for the deployment.
    fn deployer(&self) -> Address;

    async fn chain_id(&self) -> Result<u64>;

    async fn balance(&self, address: Address) -> Result<U256>;

    /// Signs and broadcasts a contract creation transaction. Returns as soon
    /// as the node accepted it.
    async fn deploy(&self, creation_code: Bytes) -> Result<TxHash>;

    /// Resolves once the transaction is buried under `confirmations` blocks.
    /// Never times out on its own.
    async fn wait_for_receipt(&self, tx_hash: TxHash, confirmations: u64) -> Result<Receipt>;
}

/// Parses the configured private key. Does not touch the network.
pub fn signer(key: &SigningKey) -> Result<PrivateKeySigner, DeployError> {
    // The parse error could echo parts of the key, so it is dropped.
    key.expose().parse::<PrivateKeySigner>().map_err(|_| {
        DeployError::SignerUnavailable(anyhow!(
            "private key is not a 32 byte hex encoded secp256k1 secret"
        ))
    })
}

/// A JSON-RPC node reached over HTTP with a local signer attached.
pub struct Node {
    provider: DynProvider,
    deployer: Address,
}

impl Node {
    pub fn new(url: Url, signer: PrivateKeySigner) -> Self {
        let deployer = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::new(signer))
            .connect_http(url)
            .erased();
        Self { provider, deployer }
    }
}

#[async_trait::async_trait]
impl Chain for Node {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("failed to fetch chain id")
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address)
            .await
            .context("failed to fetch balance")
    }

    async fn deploy(&self, creation_code: Bytes) -> Result<TxHash> {
        let tx = TransactionRequest::default()
            .from(self.deployer)
            .with_deploy_code(creation_code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .context("failed to send deployment transaction")?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash, confirmations: u64) -> Result<Receipt> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(confirmations)
            .with_timeout(None)
            .get_receipt()
            .await
            .context("failed to get deployment receipt")?;

        Ok(Receipt {
            success: receipt.status(),
            contract_address: receipt.contract_address,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address};

    #[test]
    fn derives_deployer_from_private_key() {
        let key = crate::config::tests::config().signing_key;
        let signer = signer(&key).unwrap();
        assert_eq!(
            signer.address(),
            address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );

        let node = Node::new("http://localhost:8545".parse().unwrap(), signer);
        assert_eq!(
            node.deployer(),
            address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn invalid_keys_leave_the_signer_unavailable() {
        let out_of_range = "f".repeat(64);
        for key in ["x", "0x1234", "not hex at all", out_of_range.as_str()] {
            let args = crate::arguments::Arguments {
                private_key: Some(key.to_string()),
                ..crate::config::tests::arguments()
            };
            let config = crate::config::Config::try_from(args).unwrap();
            let err = signer(&config.signing_key).unwrap_err();
            assert!(matches!(err, DeployError::SignerUnavailable(_)), "{key}");
        }
    }
}
