use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::RpcResult;
use jsonrpsee::server::ServerBuilder;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use meridian_mempool::TransactionPool;
use meridian_state::StateDB;

use crate::handlers::MeridianApiServer;
use crate::types::*;

/// Shared state accessible by all RPC handlers.
pub struct RpcState {
    /// Current blockchain height.
    pub current_height: Arc<RwLock<u64>>,
    /// Number of active validators (placeholder -- real node wires in the ValidatorSetManager).
    pub validator_count: Arc<RwLock<usize>>,
    /// Current base fee from the fee market.
    pub base_fee: Arc<RwLock<u64>>,
    /// Transaction mempool.
    pub mempool: Arc<RwLock<TransactionPool>>,
    /// Account state database.
    pub state_db: Arc<RwLock<StateDB>>,
    /// Committed blocks indexed by height (index 0 = genesis / height 0).
    ///
    /// The validator binary should push new blocks after each commit:
    /// ```ignore
    /// rpc_state.block_store.write().push(block_response);
    /// ```
    /// This should be called in the `apply_commit` function right after updating
    /// `current_height`, so that `block_store.len() == current_height + 1`.
    pub block_store: Arc<RwLock<Vec<BlockResponse>>>,
    /// Real validator info populated from the genesis config.
    pub genesis_validators: Arc<Vec<ValidatorResponse>>,
}

impl RpcState {
    /// Create a new RPC state with the given mempool, state database, and genesis validators.
    pub fn new(
        mempool: Arc<RwLock<TransactionPool>>,
        state_db: Arc<RwLock<StateDB>>,
        genesis_validators: Vec<ValidatorResponse>,
    ) -> Self {
        Self {
            current_height: Arc::new(RwLock::new(0)),
            validator_count: Arc::new(RwLock::new(genesis_validators.len())),
            base_fee: Arc::new(RwLock::new(1)),
            mempool,
            state_db,
            block_store: Arc::new(RwLock::new(Vec::new())),
            genesis_validators: Arc::new(genesis_validators),
        }
    }

    /// Create a mock RPC state for testing (empty mempool, state, and no validators).
    pub fn new_mock() -> Self {
        Self::new(
            Arc::new(RwLock::new(TransactionPool::new(
                meridian_mempool::MempoolConfig::default(),
            ))),
            Arc::new(RwLock::new(StateDB::new())),
            Vec::new(),
        )
    }
}

impl Default for RpcState {
    fn default() -> Self {
        Self::new_mock()
    }
}

/// The Meridian RPC server.
pub struct RpcServer {
    port: u16,
    state: Arc<RpcState>,
}

impl RpcServer {
    /// Create a new RPC server on the given port with shared state.
    pub fn new(port: u16, state: Arc<RpcState>) -> Self {
        Self { port, state }
    }

    /// Start the JSON-RPC HTTP server. Blocks until the server is shut down.
    pub async fn start(self) -> Result<SocketAddr, Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = format!("0.0.0.0:{}", self.port).parse()?;
        let server = ServerBuilder::default().build(addr).await?;

        let rpc_impl = RpcImpl {
            state: self.state.clone(),
        };

        let addr = server.local_addr()?;
        tracing::info!(%addr, "Meridian RPC server starting");

        let handle = server.start(rpc_impl.into_rpc());
        handle.stopped().await;

        Ok(addr)
    }
}

/// Internal implementation of the RPC trait backed by shared state.
struct RpcImpl {
    state: Arc<RpcState>,
}

impl MeridianApiServer for RpcImpl {
    fn get_block(&self, height: u64) -> RpcResult<BlockResponse> {
        let store = self.state.block_store.read();
        if let Some(block) = store.get(height as usize) {
            return Ok(block.clone());
        }
        // No block stored at this height -- return a genesis-style placeholder.
        let current = *self.state.current_height.read();
        if height > current {
            return Err(ErrorObjectOwned::owned(
                -32001,
                format!("block at height {height} not yet committed (current: {current})"),
                None::<()>,
            ));
        }
        // Height is within range but not in store (shouldn't happen once wiring
        // is complete). Return a zero placeholder for backwards compatibility.
        Ok(BlockResponse {
            height,
            timestamp: 0,
            parent_hash: "0".repeat(64),
            proposer: "0".repeat(64),
            tx_count: 0,
            block_hash: "0".repeat(64),
        })
    }

    fn get_latest_block(&self) -> RpcResult<BlockResponse> {
        let store = self.state.block_store.read();
        if let Some(block) = store.last() {
            return Ok(block.clone());
        }
        drop(store);
        // No blocks stored yet -- return genesis placeholder at current height.
        let height = *self.state.current_height.read();
        Ok(BlockResponse {
            height,
            timestamp: 0,
            parent_hash: "0".repeat(64),
            proposer: "0".repeat(64),
            tx_count: 0,
            block_hash: "0".repeat(64),
        })
    }

    fn get_validators(&self) -> RpcResult<Vec<ValidatorResponse>> {
        Ok(self.state.genesis_validators.as_ref().clone())
    }

    fn get_staking_info(&self, pubkey: String) -> RpcResult<StakingInfoResponse> {
        Ok(StakingInfoResponse {
            pubkey,
            total_staked: 0,
            voting_power: 0,
        })
    }

    fn get_fee_info(&self) -> RpcResult<FeeInfoResponse> {
        let base_fee = *self.state.base_fee.read();
        Ok(FeeInfoResponse {
            base_fee,
            target_gas_per_block: 15_000_000,
            max_gas_per_block: 30_000_000,
        })
    }

    fn health(&self) -> RpcResult<HealthResponse> {
        let height = *self.state.current_height.read();
        let validators = *self.state.validator_count.read();
        Ok(HealthResponse {
            status: "ok".to_string(),
            current_height: height,
            validator_count: validators,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    fn submit_transaction(&self, req: SubmitTransactionRequest) -> RpcResult<SubmitTransactionResponse> {
        let from: [u8; 32] = hex::decode(&req.from)
            .map_err(|e| ErrorObjectOwned::owned(-32602, format!("invalid 'from' hex: {e}"), None::<()>))?
            .try_into()
            .map_err(|_| ErrorObjectOwned::owned(-32602, "'from' must be 32 bytes", None::<()>))?;

        let to: [u8; 32] = hex::decode(&req.to)
            .map_err(|e| ErrorObjectOwned::owned(-32602, format!("invalid 'to' hex: {e}"), None::<()>))?
            .try_into()
            .map_err(|_| ErrorObjectOwned::owned(-32602, "'to' must be 32 bytes", None::<()>))?;

        let signature = hex::decode(&req.signature)
            .map_err(|e| ErrorObjectOwned::owned(-32602, format!("invalid 'signature' hex: {e}"), None::<()>))?;

        let data = hex::decode(&req.data)
            .map_err(|e| ErrorObjectOwned::owned(-32602, format!("invalid 'data' hex: {e}"), None::<()>))?;

        let tx = meridian_bft::block::Transaction {
            from,
            to,
            amount: req.amount,
            nonce: req.nonce,
            signature,
            data,
            gas_limit: req.gas_limit,
            gas_price: req.gas_price,
        };

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut mempool = self.state.mempool.write();
        match mempool.add_transaction(tx, true, now) {
            Ok(hash) => Ok(SubmitTransactionResponse {
                tx_hash: hex::encode(hash),
                accepted: true,
            }),
            Err(e) => Err(ErrorObjectOwned::owned(
                -32000,
                format!("transaction rejected: {e}"),
                None::<()>,
            )),
        }
    }

    fn get_account(&self, pubkey: String) -> RpcResult<AccountResponse> {
        let key: [u8; 32] = hex::decode(&pubkey)
            .map_err(|e| ErrorObjectOwned::owned(-32602, format!("invalid pubkey hex: {e}"), None::<()>))?
            .try_into()
            .map_err(|_| ErrorObjectOwned::owned(-32602, "pubkey must be 32 bytes", None::<()>))?;

        let state_db = self.state.state_db.read();
        match state_db.get_account(&key) {
            Some(acct) => Ok(AccountResponse {
                pubkey,
                balance: acct.balance,
                nonce: acct.nonce,
            }),
            None => Ok(AccountResponse {
                pubkey,
                balance: 0,
                nonce: 0,
            }),
        }
    }

    fn get_mempool_size(&self) -> RpcResult<MempoolInfoResponse> {
        let mempool = self.state.mempool.read();
        Ok(MempoolInfoResponse {
            pending_count: mempool.pending_count(),
        })
    }

    fn get_consensus_height(&self) -> RpcResult<u64> {
        Ok(*self.state.current_height.read())
    }
}
