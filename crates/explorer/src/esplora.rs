//! Esplora-backed [`crate::ExplorerClient`]. Talks to a standard Esplora
//! REST API (`/blocks/tip/height`, `/block/:hash`, `/address/:addr/txs`,
//! `/tx/:txid/hex`, `/tx` POST) the way the teacher's `andromeda-esplora`
//! crate's types describe (`PrevOut`/`Vin`/`Vout`/`TxStatus` — see
//! `crates/esplora/src/api.rs` in the reference pack), but over a plain
//! `reqwest::Client` rather than the teacher's private `muon` HTTP
//! transport, since `muon` lives in a registry (`proton_internal`) this
//! workspace can't fetch. `reqwest` is the same crate `andromeda-api`'s own
//! dependency tree pulls in underneath `muon`.
//!
//! Esplora has no stealth-scan endpoint; this wallet assumes the configured
//! explorer additionally serves a darkwallet-compatible `/stealth` endpoint
//! (`?prefix=<hex>&from_height=<n>`), matching the original stealth server
//! the Python daemon talked to.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{BlockHeader, Error, ExplorerClient, HistoryEntry, OutputPoint, StealthEntry, TxHash};

pub struct EsploraClient {
    base_url: String,
    http: reqwest::Client,
}

impl EsploraClient {
    pub fn new(base_url: impl Into<String>, request_timeout: std::time::Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(request_timeout).build().map_err(Error::from)?;
        Ok(Self { base_url: base_url.into(), http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize)]
struct EsploraBlock {
    id: String,
    height: u64,
    previousblockhash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EsploraStatus {
    confirmed: bool,
    block_height: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct EsploraVout {
    scriptpubkey_address: Option<String>,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct EsploraVin {
    txid: String,
    vout: u32,
}

#[derive(Debug, Deserialize)]
struct EsploraTx {
    txid: String,
    vin: Vec<EsploraVin>,
    vout: Vec<EsploraVout>,
    status: EsploraStatus,
}

#[derive(Debug, Deserialize)]
struct EsploraStealthRow {
    ephemeral_key: String,
    address_hash: String,
    tx_hash: String,
}

fn parse_hash(hex_str: &str) -> Result<TxHash, Error> {
    let bytes = hex::decode(hex_str).map_err(|e| Error::Malformed(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(Error::Malformed(format!("expected 32-byte hash, got {}", bytes.len())));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

#[async_trait]
impl ExplorerClient for EsploraClient {
    async fn last_height(&self) -> Result<u64, Error> {
        let text = self.http.get(self.url("/blocks/tip/height")).send().await?.text().await?;
        text.trim().parse::<u64>().map_err(|e| Error::Malformed(e.to_string()))
    }

    async fn block_header(&self, height: u64) -> Result<BlockHeader, Error> {
        let hash_hex = self.http.get(self.url(&format!("/block-height/{height}"))).send().await?.text().await?;
        let hash_hex = hash_hex.trim();

        let block: EsploraBlock =
            self.http.get(self.url(&format!("/block/{hash_hex}"))).send().await?.json().await?;
        let raw = self.http.get(self.url(&format!("/block/{hash_hex}/header"))).send().await?.bytes().await?.to_vec();

        Ok(BlockHeader {
            height: block.height,
            hash: parse_hash(&block.id)?,
            previous_block_hash: parse_hash(block.previousblockhash.as_deref().unwrap_or(&"00".repeat(32)))?,
            raw,
        })
    }

    async fn history(&self, address: &str) -> Result<Vec<HistoryEntry>, Error> {
        let txs: Vec<EsploraTx> =
            self.http.get(self.url(&format!("/address/{address}/txs"))).send().await?.json().await?;

        let mut rows = Vec::new();
        for tx in &txs {
            let tx_hash = parse_hash(&tx.txid)?;
            let height = if tx.status.confirmed { tx.status.block_height } else { None };

            for (index, vout) in tx.vout.iter().enumerate() {
                if vout.scriptpubkey_address.as_deref() != Some(address) {
                    continue;
                }
                let output_point = OutputPoint { hash: tx_hash, index: index as u32 };
                let spend = txs.iter().find_map(|spender| {
                    spender.vin.iter().enumerate().find_map(|(vin_index, vin)| {
                        if vin.txid == tx.txid && vin.vout == index as u32 {
                            Some((spender, vin_index as u32))
                        } else {
                            None
                        }
                    })
                });

                let (spend_point, spend_height) = match spend {
                    Some((spender, _vin_index)) => {
                        let spend_height = if spender.status.confirmed { spender.status.block_height } else { None };
                        (Some(OutputPoint { hash: parse_hash(&spender.txid)?, index: 0 }), spend_height)
                    }
                    None => (None, None),
                };

                rows.push(HistoryEntry { output_point, output_height: height, value: vout.value, spend_point, spend_height });
            }
        }
        Ok(rows)
    }

    async fn transaction(&self, hash: &TxHash) -> Result<Vec<u8>, Error> {
        let txid = hex::encode(hash);
        let hex_body = self.http.get(self.url(&format!("/tx/{txid}/hex"))).send().await?.text().await?;
        hex::decode(hex_body.trim()).map_err(|e| Error::Malformed(e.to_string()))
    }

    async fn stealth(&self, prefix: &[u8], from_height: u64) -> Result<Vec<StealthEntry>, Error> {
        let prefix_hex = hex::encode(prefix);
        let rows: Vec<EsploraStealthRow> = self
            .http
            .get(self.url(&format!("/stealth?prefix={prefix_hex}&from_height={from_height}")))
            .send()
            .await?
            .json()
            .await?;

        rows.into_iter()
            .map(|row| {
                let ephemeral_bytes = hex::decode(&row.ephemeral_key).map_err(|e| Error::Malformed(e.to_string()))?;
                if ephemeral_bytes.len() != 32 {
                    return Err(Error::Malformed("ephemeral key must be 32 bytes".to_string()));
                }
                let address_bytes = hex::decode(&row.address_hash).map_err(|e| Error::Malformed(e.to_string()))?;
                if address_bytes.len() != 20 {
                    return Err(Error::Malformed("address hash must be 20 bytes".to_string()));
                }
                let mut ephemeral_key_x = [0u8; 32];
                ephemeral_key_x.copy_from_slice(&ephemeral_bytes);
                let mut address_hash = [0u8; 20];
                address_hash.copy_from_slice(&address_bytes);

                Ok(StealthEntry { ephemeral_key_x, address_hash, tx_hash: parse_hash(&row.tx_hash)? })
            })
            .collect()
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<(), Error> {
        let response = self.http.post(self.url("/tx")).body(hex::encode(raw_tx)).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::BroadcastRejected(body))
        }
    }
}
