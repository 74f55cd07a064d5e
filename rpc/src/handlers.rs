use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::*;

/// The Meridian JSON-RPC API trait.
///
/// Using jsonrpsee's `#[rpc]` proc macro to generate the server implementation.
/// Each method is prefixed with `meridian_` in the JSON-RPC namespace.
#[rpc(server)]
pub trait MeridianApi {
    /// Get a block at a specific height.
    #[method(name = "meridian_getBlock")]
    fn get_block(&self, height: u64) -> RpcResult<BlockResponse>;

    /// Get the latest (highest) block.
    #[method(name = "meridian_getLatestBlock")]
    fn get_latest_block(&self) -> RpcResult<BlockResponse>;

    /// Get the current active validator set.
    #[method(name = "meridian_getValidators")]
    fn get_validators(&self) -> RpcResult<Vec<ValidatorResponse>>;

    /// Get staking information for a given public key.
    #[method(name = "meridian_getStakingInfo")]
    fn get_staking_info(&self, pubkey: String) -> RpcResult<StakingInfoResponse>;

    /// Get current fee market information.
    #[method(name = "meridian_getFeeInfo")]
    fn get_fee_info(&self) -> RpcResult<FeeInfoResponse>;

    /// Health check endpoint.
    #[method(name = "meridian_health")]
    fn health(&self) -> RpcResult<HealthResponse>;

    /// Submit a signed transaction to the mempool.
    #[method(name = "meridian_submitTransaction")]
    fn submit_transaction(
        &self,
        req: SubmitTransactionRequest,
    ) -> RpcResult<SubmitTransactionResponse>;

    /// Get an account's balance and nonce.
    #[method(name = "meridian_getAccount")]
    fn get_account(&self, pubkey: String) -> RpcResult<AccountResponse>;

    /// Get the number of transactions currently pending in the mempool.
    #[method(name = "meridian_getMempoolSize")]
    fn get_mempool_size(&self) -> RpcResult<MempoolInfoResponse>;

    /// Get the height the node's consensus engine is currently working on.
    #[method(name = "meridian_getConsensusHeight")]
    fn get_consensus_height(&self) -> RpcResult<u64>;
}
