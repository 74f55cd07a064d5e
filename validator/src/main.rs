use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use parking_lot::RwLock as SyncRwLock;
use tokio::signal;
use tokio::sync::RwLock;

use meridian_bft::{BftStateMachine, ConflictingVote, ConsensusMessage, Height, TimeoutConfig, ValidatorId};
use meridian_fees::{FeeConfig, FeeMarket};
use meridian_genesis::GenesisConfig;
use meridian_mempool::{MempoolConfig, TransactionPool};
use meridian_rewards::DeveloperRewards;
use meridian_rpc::server::RpcState;
use meridian_rpc::{RpcServer, ValidatorResponse};
use meridian_slashing::SlashingEngine;
use meridian_staking::StakingPool;
use meridian_state::{AccountState, StateDB};
use meridian_storage::{StorageConfig, TieredStorage};
use meridian_validator_set::{ValidatorSetConfig, ValidatorSetManager};

/// Meridian Validator Node
#[derive(Parser)]
#[command(name = "meridian-validator", version, about = "Meridian validator node")]
struct Args {
    /// Path to the genesis file
    #[arg(long, default_value = "genesis.json")]
    genesis: PathBuf,

    /// Data directory for storage
    #[arg(long, default_value = "/tmp/meridian-data")]
    data_dir: PathBuf,

    /// P2P listen address (libp2p multiaddr format)
    #[arg(long, default_value = "/ip4/0.0.0.0/tcp/30333")]
    listen: String,

    /// JSON-RPC server port
    #[arg(long, default_value = "9944")]
    rpc_port: u16,
}

/// Format a byte slice as a hex string.
fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Turn equivocation evidence surfaced by the BFT state machine into a
/// slashing-engine evidence record.
fn evidence_record_from_equivocation(evidence: &ConflictingVote) -> meridian_slashing::EvidenceRecord {
    meridian_slashing::EvidenceRecord {
        offense: meridian_slashing::SlashingOffense::DoubleSign,
        offender: *evidence.first.validator.as_bytes(),
        height: evidence.first.height.0,
        data: bincode::serialize(evidence).unwrap_or_default(),
        processed: false,
    }
}

/// Drain a batch of `ConsensusMessage`s, forwarding equivocation evidence to
/// the slashing engine. Called on every batch of state machine output;
/// other message kinds are the caller's responsibility (votes to gossip,
/// blocks to commit, timeouts to schedule).
fn handle_consensus_messages(msgs: &[ConsensusMessage], slashing_engine: &mut SlashingEngine) {
    for msg in msgs {
        if let ConsensusMessage::Equivocation(evidence) = msg {
            let record = evidence_record_from_equivocation(evidence);
            match slashing_engine.submit_evidence(record) {
                Ok(hash) => tracing::warn!(
                    offender = %to_hex(evidence.first.validator.as_bytes()),
                    evidence_hash = %to_hex(&hash),
                    "equivocation evidence submitted to slashing engine"
                ),
                Err(e) => tracing::warn!(error = %e, "failed to submit equivocation evidence"),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!("Meridian Validator starting");

    // --- Load genesis configuration ---
    tracing::info!(path = %args.genesis.display(), "loading genesis");
    let genesis = GenesisConfig::from_file(&args.genesis).unwrap_or_else(|e| {
        tracing::warn!("Could not load genesis file: {e}, using default testnet");
        GenesisConfig::default_testnet()
    });

    genesis.validate().unwrap_or_else(|e| {
        tracing::error!("Genesis validation failed: {e}");
        std::process::exit(1);
    });

    let genesis_hash_hex = to_hex(&genesis.genesis_hash);
    tracing::info!(
        chain_id = %genesis.chain_id,
        validators = genesis.validators.len(),
        genesis_hash = %genesis_hash_hex,
        "genesis loaded"
    );

    // --- Initialize storage ---
    let warm_path = args.data_dir.join("warm");
    let cold_path = args.data_dir.join("cold");
    std::fs::create_dir_all(&warm_path)?;
    std::fs::create_dir_all(&cold_path)?;

    let storage_config = StorageConfig {
        lru_capacity: 10_000,
        nvme_path: warm_path.to_string_lossy().into_owned(),
        archive_path: cold_path.to_string_lossy().into_owned(),
        max_ram_bytes: 512 * 1024 * 1024,
    };
    let storage = TieredStorage::new(&storage_config)?;
    tracing::info!("tiered storage initialized");

    // --- Initialize economics ---
    let mut staking_pool = StakingPool::new();
    let fee_market = FeeMarket::new(FeeConfig::default(), genesis.chain_params.base_fee_floor)?;
    let developer_rewards = DeveloperRewards::new();

    tracing::info!(
        base_fee = fee_market.current_base_fee(),
        "fee market initialized"
    );

    // --- Initialize validator set ---
    let validator_set_config = ValidatorSetConfig {
        active_set_cap: genesis.chain_params.max_validators,
        epoch_length: genesis.chain_params.epoch_length,
        min_stake: 1_000_000,
    };
    let mut validator_set = ValidatorSetManager::with_config(validator_set_config);

    // Register genesis validators into the staking pool and validator set.
    for gv in &genesis.validators {
        if let Err(e) =
            staking_pool.stake(gv.pubkey, gv.initial_stake, meridian_staking::LockTier::NoLock)
        {
            tracing::warn!(
                pubkey = %to_hex(&gv.pubkey),
                error = %e,
                "failed to stake genesis validator"
            );
        }
        match validator_set.register_validator(
            gv.pubkey,
            gv.initial_stake,
            gv.commission_rate,
            0,
        ) {
            Ok(status) => {
                tracing::info!(
                    pubkey = %to_hex(&gv.pubkey),
                    ?status,
                    stake = gv.initial_stake,
                    "registered genesis validator"
                );
            }
            Err(e) => {
                tracing::warn!(
                    pubkey = %to_hex(&gv.pubkey),
                    error = %e,
                    "failed to register genesis validator"
                );
            }
        }
    }

    // --- Initialize slashing ---
    let mut slashing_engine = SlashingEngine::new();
    tracing::info!("slashing engine initialized");

    // --- Initialize BFT consensus ---
    // Voting power is weighted by each validator's initial stake (see C2).
    let bft_validators: Vec<meridian_bft::Validator> = genesis
        .validators
        .iter()
        .filter_map(|gv| {
            ed25519_dalek::VerifyingKey::from_bytes(&gv.pubkey)
                .ok()
                .map(|vk| meridian_bft::Validator {
                    id: ValidatorId(vk),
                    power: gv.initial_stake,
                })
        })
        .collect();

    tracing::info!(
        bft_validators = bft_validators.len(),
        "BFT validator set created"
    );

    // This node runs as a non-voting observer by default.
    // To participate in consensus, the operator provides a signing key
    // and the node identifies its index in the validator set.
    let timeout_config = TimeoutConfig::from_chain_params(
        genesis.chain_params.timeout_propose_ms,
        genesis.chain_params.timeout_prevote_ms,
        genesis.chain_params.timeout_precommit_ms,
        genesis.chain_params.timeout_commit_ms,
        genesis.chain_params.timeout_increment_ms,
    );
    let mut bft = BftStateMachine::new(
        Height(0),
        bft_validators,
        None, // observer mode: no validator index
        None, // observer mode: no signing key
        timeout_config,
    );
    tracing::info!("BFT consensus initialized in observer mode");

    // Enter the first round and drain its output through the same
    // evidence-forwarding path consensus message processing will use once
    // the P2P network loop below is wired up (TODO: route on_proposal /
    // on_prevote / on_precommit output from the network through
    // handle_consensus_messages instead of just this initial round entry).
    let initial_msgs = bft.enter_new_round(meridian_bft::Round(0));
    handle_consensus_messages(&initial_msgs, &mut slashing_engine);

    // --- Initialize P2P networking ---
    // The ConsensusNetwork from meridian_net requires libp2p types (Keypair, Multiaddr)
    // which are not direct dependencies of this binary. In a production setup,
    // we would add libp2p to the validator's Cargo.toml or have meridian_net
    // provide a higher-level builder. For now, we log the intended configuration.
    tracing::info!(
        listen = %args.listen,
        "P2P networking configured (deferred initialization)"
    );

    // --- Initialize account state from genesis ---
    let mut state_db = StateDB::new();
    for acct in &genesis.accounts {
        state_db.set_account(acct.pubkey, AccountState::new(acct.balance));
    }
    tracing::info!(accounts = genesis.accounts.len(), "state DB seeded from genesis");

    // --- Initialize mempool, journaling local submissions through storage ---
    let storage = Arc::new(storage);
    let mempool_config = MempoolConfig::from_chain_params(
        genesis.chain_params.mempool_max_tx_bytes,
        genesis.chain_params.mempool_max_size,
        genesis.chain_params.mempool_max_tx_per_account,
        genesis.chain_params.mempool_min_gas_price,
        fee_market.config().max_gas_per_block,
        genesis.chain_params.mempool_tx_lifetime_secs,
    );
    let mempool = TransactionPool::with_storage(mempool_config, storage.clone());

    let genesis_validator_responses: Vec<ValidatorResponse> = genesis
        .validators
        .iter()
        .map(|gv| ValidatorResponse {
            pubkey: to_hex(&gv.pubkey),
            stake: gv.initial_stake,
            commission_rate: gv.commission_rate,
            status: "Active".to_string(),
            performance_score: 10_000,
        })
        .collect();

    // --- Start RPC server ---
    let rpc_state = Arc::new(RpcState::new(
        Arc::new(SyncRwLock::new(mempool)),
        Arc::new(SyncRwLock::new(state_db)),
        genesis_validator_responses,
    ));
    {
        *rpc_state.current_height.write() = 0;
        *rpc_state.base_fee.write() = fee_market.current_base_fee();
    }

    let rpc_server = RpcServer::new(args.rpc_port, rpc_state.clone());
    tracing::info!(port = args.rpc_port, "starting RPC server");

    // Wrap mutable state for concurrent access across async tasks.
    let _staking_pool = Arc::new(RwLock::new(staking_pool));
    let _fee_market = Arc::new(RwLock::new(fee_market));
    let _validator_set = Arc::new(RwLock::new(validator_set));
    let _slashing_engine = Arc::new(RwLock::new(slashing_engine));
    let _developer_rewards = Arc::new(RwLock::new(developer_rewards));
    let _bft = Arc::new(RwLock::new(bft));

    // --- Main event loop ---
    // In production, this would also include:
    // - The P2P network event loop (network.run())
    // - Consensus message processing
    // - Block production
    // - Epoch reward distribution
    // - Periodic state archival
    tokio::select! {
        // Run the RPC server.
        result = rpc_server.start() => {
            match result {
                Ok(addr) => tracing::info!(%addr, "RPC server stopped"),
                Err(e) => tracing::error!(error = %e, "RPC server error"),
            }
        }

        // Wait for shutdown signal (SIGINT/SIGTERM).
        _ = signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
        }
    }

    tracing::info!("Meridian Validator shutting down gracefully");
    Ok(())
}
