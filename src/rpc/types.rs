//! Node payload types
//!
//! Only the fields the dashboard shows are modelled. The node encodes 64-bit
//! integers as JSON strings, so those go through [`string_u64`].

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Helpers
// ============================================================================

/// Accept a u64 encoded either as a JSON string or as a number
pub fn string_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Str(String),
        Num(u64),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Num(n) => Ok(n),
        Repr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Same as [`string_u64`] but tolerant of `null`/absent values
fn string_u64_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "string_u64")] u64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?
        .map(|Wrapper(n)| n)
        .unwrap_or_default())
}

// ============================================================================
// Request/response payloads
// ============================================================================

/// `status` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResult {
    pub node_info: NodeInfo,
    pub sync_info: SyncInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub network: String,
    pub version: String,
    #[serde(default)]
    pub moniker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncInfo {
    #[serde(deserialize_with = "string_u64")]
    pub latest_block_height: u64,
    pub catching_up: bool,
}

/// `net_info` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetInfoResult {
    #[serde(deserialize_with = "string_u64")]
    pub n_peers: u64,
}

/// `validators` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorsResult {
    pub validators: Vec<Validator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    #[serde(default)]
    pub address: String,
    #[serde(deserialize_with = "string_u64")]
    pub voting_power: u64,
}

/// `consensus_params` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusParamsResult {
    pub consensus_params: ConsensusParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub block: BlockParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockParams {
    #[serde(deserialize_with = "string_u64")]
    pub max_bytes: u64,

    /// `-1` means unlimited, so this stays signed
    pub max_gas: String,
}

/// `dump_consensus_state` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConsensusStateResult {
    pub round_state: RoundStateSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStateSummary {
    #[serde(deserialize_with = "string_u64")]
    pub height: u64,
}

// ============================================================================
// Subscription events
// ============================================================================

/// Envelope of every message on the event websocket
///
/// Subscription acknowledgements carry an empty `result` and no `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<EventResult>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventResult {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub data: Option<EventData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: serde_json::Value,
}

/// `tendermint/event/NewBlock`
#[derive(Debug, Clone, Deserialize)]
pub struct NewBlockEvent {
    pub block: Block,
    #[serde(default)]
    pub result_finalize_block: Option<FinalizeBlockResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    #[serde(deserialize_with = "string_u64")]
    pub height: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalizeBlockResult {
    #[serde(default)]
    pub tx_results: Vec<ExecTxResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecTxResult {
    #[serde(default, deserialize_with = "string_u64_or_zero")]
    pub gas_wanted: u64,
    #[serde(default, deserialize_with = "string_u64_or_zero")]
    pub gas_used: u64,
    #[serde(default)]
    pub events: Vec<AbciEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbciEvent {
    #[serde(rename = "type")]
    pub kind: String,
}

/// `tendermint/event/Tx`
#[derive(Debug, Clone, Deserialize)]
pub struct TxEvent {
    #[serde(rename = "TxResult")]
    pub tx_result: TxResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxResult {
    #[serde(deserialize_with = "string_u64")]
    pub height: u64,
    pub result: ExecTxResult,
}

/// `tendermint/event/RoundState`
#[derive(Debug, Clone, Deserialize)]
pub struct RoundStepEvent {
    #[serde(deserialize_with = "string_u64")]
    pub height: u64,
    #[serde(default)]
    pub round: i64,
    pub step: String,
}

/// `tendermint/event/ValidatorSetUpdates`
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorSetUpdatesEvent {
    pub validator_updates: Vec<Validator>,
}
