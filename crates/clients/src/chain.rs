// Path: crates/clients/src/chain.rs
//! Stacks node adapter: tip height and read-only governance parameters.

use crate::{build_client, check_status};
use async_trait::async_trait;
use bridge_api::ChainApi;
use bridge_types::error::BridgeError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "chain";

/// Read-only function every governance parameter contract exposes.
const GET_PARAMETER_FN: &str = "get-parameter";

// Clarity value type prefixes (SIP-005 consensus serialization).
const CLARITY_INT: u8 = 0x00;
const CLARITY_UINT: u8 = 0x01;
const CLARITY_RESPONSE_OK: u8 = 0x07;
const CLARITY_RESPONSE_ERR: u8 = 0x08;
const CLARITY_NONE: u8 = 0x09;
const CLARITY_SOME: u8 = 0x0a;
const CLARITY_STRING_ASCII: u8 = 0x0d;

#[derive(Clone)]
pub struct StacksChain {
    api_url: String,
    client: Client,
}

#[derive(Serialize)]
struct CallReadRequest<'a> {
    sender: &'a str,
    arguments: Vec<String>,
}

#[derive(Deserialize)]
struct CallReadResponse {
    okay: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    cause: Option<String>,
}

#[derive(Deserialize)]
struct NodeInfo {
    stacks_tip_height: u64,
}

impl StacksChain {
    pub fn new(api_url: impl Into<String>) -> Result<Self, BridgeError> {
        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client: build_client(SERVICE, Client::builder())?,
        })
    }
}

/// Splits `<address>.<contract-name>` into its two halves.
fn split_contract(contract: &str) -> Result<(&str, &str), BridgeError> {
    match contract.split_once('.') {
        Some((address, name)) if !address.is_empty() && !name.is_empty() => Ok((address, name)),
        _ => Err(BridgeError::Config(format!(
            "contract '{contract}' is not of the form <address>.<contract-name>"
        ))),
    }
}

/// Serializes `s` as a Clarity `string-ascii` and hex-encodes it with a `0x` prefix.
pub(crate) fn encode_string_ascii(s: &str) -> Result<String, BridgeError> {
    if !s.is_ascii() {
        return Err(BridgeError::Config(format!(
            "parameter key '{s}' is not ASCII"
        )));
    }
    let len = u32::try_from(s.len())
        .map_err(|_| BridgeError::Config("parameter key too long".into()))?;
    let mut buf = Vec::with_capacity(5 + s.len());
    buf.push(CLARITY_STRING_ASCII);
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(format!("0x{}", hex::encode(buf)))
}

/// Decodes a hex Clarity value into an unsigned height/duration, unwrapping any
/// `(ok ..)` and `(some ..)` wrappers around an `int` or `uint`.
pub(crate) fn decode_clarity_u64(value_hex: &str) -> Result<u64, BridgeError> {
    let bytes = hex::decode(value_hex.trim_start_matches("0x"))
        .map_err(|e| BridgeError::external(SERVICE, format!("invalid Clarity hex: {e}")))?;
    let mut rest = bytes.as_slice();
    loop {
        let Some((&prefix, tail)) = rest.split_first() else {
            return Err(BridgeError::external(SERVICE, "empty Clarity value"));
        };
        match prefix {
            CLARITY_RESPONSE_OK | CLARITY_SOME => rest = tail,
            CLARITY_RESPONSE_ERR => {
                return Err(BridgeError::external(
                    SERVICE,
                    "read-only call returned (err ..)",
                ))
            }
            CLARITY_NONE => return Err(BridgeError::NotFound("parameter not set".into())),
            CLARITY_UINT | CLARITY_INT => {
                let raw: [u8; 16] = tail
                    .get(..16)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| BridgeError::external(SERVICE, "truncated Clarity integer"))?;
                let value = if prefix == CLARITY_UINT {
                    u64::try_from(u128::from_be_bytes(raw)).ok()
                } else {
                    u64::try_from(i128::from_be_bytes(raw)).ok()
                };
                return value.ok_or_else(|| {
                    BridgeError::external(SERVICE, "Clarity integer does not fit in u64")
                });
            }
            other => {
                return Err(BridgeError::external(
                    SERVICE,
                    format!("unexpected Clarity type prefix 0x{other:02x}"),
                ))
            }
        }
    }
}

#[async_trait]
impl ChainApi for StacksChain {
    async fn get_parameter(&self, contract: &str, key: &str) -> Result<u64, BridgeError> {
        let (address, name) = split_contract(contract)?;
        let url = format!(
            "{}/v2/contracts/call-read/{}/{}/{}",
            self.api_url, address, name, GET_PARAMETER_FN
        );
        let resp = self
            .client
            .post(&url)
            .json(&CallReadRequest {
                sender: address,
                arguments: vec![encode_string_ascii(key)?],
            })
            .send()
            .await
            .map_err(|e| BridgeError::external(SERVICE, format!("call-read {contract}: {e}")))?;
        let resp = check_status(SERVICE, "call-read", resp).await?;
        let body: CallReadResponse = resp
            .json()
            .await
            .map_err(|e| BridgeError::external(SERVICE, format!("decode call-read: {e}")))?;
        if !body.okay {
            return Err(BridgeError::external(
                SERVICE,
                format!(
                    "call-read {contract}::{GET_PARAMETER_FN}({key}) failed: {}",
                    body.cause.unwrap_or_default()
                ),
            ));
        }
        let result = body
            .result
            .ok_or_else(|| BridgeError::external(SERVICE, "call-read returned no result"))?;
        let value = decode_clarity_u64(&result)?;
        tracing::debug!(target: "chain", contract, key, value, "parameter read");
        Ok(value)
    }

    async fn current_block_height(&self) -> Result<u64, BridgeError> {
        let url = format!("{}/v2/info", self.api_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BridgeError::external(SERVICE, format!("GET /v2/info: {e}")))?;
        let info: NodeInfo = check_status(SERVICE, "/v2/info", resp)
            .await?
            .json()
            .await
            .map_err(|e| BridgeError::external(SERVICE, format!("decode /v2/info: {e}")))?;
        Ok(info.stacks_tip_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, routing::post, Json, Router};
    use serde_json::{json, Value as JsonValue};

    #[test]
    fn test_encode_string_ascii() {
        assert_eq!(encode_string_ascii("ab").unwrap(), "0x0d000000026162");
        assert!(encode_string_ascii("é").is_err());
    }

    #[test]
    fn test_decode_unwraps_ok_and_some() {
        // (ok u50)
        assert_eq!(
            decode_clarity_u64("0x070100000000000000000000000000000032").unwrap(),
            50
        );
        // (some (ok u1440))
        assert_eq!(
            decode_clarity_u64("0a0701000000000000000000000000000005a0").unwrap(),
            1440
        );
        // int 7
        assert_eq!(
            decode_clarity_u64("0x0000000000000000000000000000000007").unwrap(),
            7
        );
    }

    #[test]
    fn test_decode_rejects_err_none_and_garbage() {
        assert!(matches!(
            decode_clarity_u64("0x09"),
            Err(BridgeError::NotFound(_))
        ));
        assert!(decode_clarity_u64("0x080100000000000000000000000000000001").is_err());
        assert!(decode_clarity_u64("0x0100").is_err());
        assert!(decode_clarity_u64("0x03").is_err());
        assert!(decode_clarity_u64("zz").is_err());
        // negative int
        assert!(decode_clarity_u64("0x00ffffffffffffffffffffffffffffffff").is_err());
        // uint above u64::MAX
        assert!(decode_clarity_u64("0x0100000000000000010000000000000000").is_err());
    }

    #[test]
    fn test_split_contract() {
        assert_eq!(
            split_contract("SP3ABC.mega-dao").unwrap(),
            ("SP3ABC", "mega-dao")
        );
        assert!(split_contract("SP3ABC").is_err());
        assert!(split_contract(".name").is_err());
    }

    #[tokio::test]
    async fn test_chain_client_against_stub_node() {
        let app = Router::new()
            .route(
                "/v2/info",
                get(|| async { Json(json!({ "stacks_tip_height": 120, "burn_block_height": 800000 })) }),
            )
            .route(
                "/v2/contracts/call-read/SP3ABC/mega-dao/get-parameter",
                post(|Json(body): Json<JsonValue>| async move {
                    assert_eq!(body["sender"], "SP3ABC");
                    assert_eq!(body["arguments"][0], encode_string_ascii("proposalDuration").unwrap());
                    Json(json!({ "okay": true, "result": "0x070100000000000000000000000000000032" }))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let chain = StacksChain::new(format!("http://{addr}")).unwrap();
        assert_eq!(chain.current_block_height().await.unwrap(), 120);
        assert_eq!(
            chain
                .get_parameter("SP3ABC.mega-dao", "proposalDuration")
                .await
                .unwrap(),
            50
        );
    }
}
