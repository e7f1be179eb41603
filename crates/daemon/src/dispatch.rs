//! Maps `dw_<operation>` command names onto [`dw_wallet::Wallet`]'s
//! operation table (spec §6, §4.H). Owns no socket, no session, no auth —
//! just the name mapping and the JSON value <-> Rust type conversion at the
//! boundary, the same narrow role `darkwallet/wallet_interface.py` plays
//! for the Python original.

use dw_wallet::Wallet;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("parameter {0} missing or the wrong type")]
    BadParams(usize),
    #[error(transparent)]
    Wallet(#[from] dw_wallet::Error),
}

fn string_param(params: &[Value], index: usize) -> Result<String, DispatchError> {
    params.get(index).and_then(Value::as_str).map(str::to_string).ok_or(DispatchError::BadParams(index))
}

fn optional_string_param(params: &[Value], index: usize) -> Option<String> {
    params.get(index).and_then(|v| if v.is_null() { None } else { v.as_str().map(str::to_string) })
}

fn u64_param(params: &[Value], index: usize) -> Result<u64, DispatchError> {
    params.get(index).and_then(Value::as_u64).ok_or(DispatchError::BadParams(index))
}

fn bool_param(params: &[Value], index: usize) -> Result<bool, DispatchError> {
    params.get(index).and_then(Value::as_bool).ok_or(DispatchError::BadParams(index))
}

fn wordlist_param(params: &[Value], index: usize) -> Result<Vec<String>, DispatchError> {
    params
        .get(index)
        .and_then(Value::as_array)
        .map(|words| words.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .ok_or(DispatchError::BadParams(index))
}

fn destinations_param(params: &[Value], index: usize) -> Result<Vec<(String, u64)>, DispatchError> {
    let array = params.get(index).and_then(Value::as_array).ok_or(DispatchError::BadParams(index))?;
    array
        .iter()
        .map(|entry| {
            let address = entry.get(0).and_then(Value::as_str).ok_or(DispatchError::BadParams(index))?;
            let value = entry.get(1).and_then(Value::as_u64).ok_or(DispatchError::BadParams(index))?;
            Ok((address.to_string(), value))
        })
        .collect()
}

/// Runs one command against `wallet` and returns the `result` list the
/// response's `result` field carries. Errors propagate up to the caller,
/// which projects them onto the wire taxonomy (spec §7).
pub async fn handle(wallet: &Wallet, command: &str, params: &[Value]) -> Result<Vec<Value>, DispatchError> {
    match command {
        "dw_create_account" => {
            let name = string_param(params, 0)?;
            let password = string_param(params, 1)?;
            let testnet = bool_param(params, 2)?;
            let words = wallet.create_account(&name, &password, testnet).await?;
            Ok(vec![json!(words)])
        }
        "dw_restore_account" => {
            let name = string_param(params, 0)?;
            let wordlist = wordlist_param(params, 1)?;
            let password = string_param(params, 2)?;
            let testnet = bool_param(params, 3)?;
            wallet.restore_account(&name, wordlist, &password, testnet).await?;
            Ok(vec![])
        }
        "dw_set_account" => {
            let name = string_param(params, 0)?;
            let password = string_param(params, 1)?;
            wallet.set_account(&name, &password).await?;
            Ok(vec![])
        }
        "dw_delete_account" => {
            let name = string_param(params, 0)?;
            wallet.delete_account(&name).await?;
            Ok(vec![])
        }
        "dw_list_accounts" => {
            let (active, names) = wallet.list_accounts().await?;
            Ok(vec![json!(active), json!(names)])
        }
        "dw_seed" => Ok(vec![json!(wallet.seed().await?)]),
        "dw_list_pockets" => Ok(vec![json!(wallet.list_pockets().await?)]),
        "dw_create_pocket" => {
            let name = string_param(params, 0)?;
            wallet.create_pocket(&name).await?;
            Ok(vec![])
        }
        "dw_delete_pocket" => {
            let name = string_param(params, 0)?;
            wallet.delete_pocket(&name).await?;
            Ok(vec![])
        }
        "dw_balance" => {
            let pocket = optional_string_param(params, 0);
            Ok(vec![json!(wallet.balance(pocket.as_deref()).await?)])
        }
        "dw_history" => {
            let pocket = optional_string_param(params, 0);
            let rows = wallet.history(pocket.as_deref()).await?;
            let rows: Vec<Value> = rows
                .into_iter()
                .map(|r| {
                    json!({
                        "address": r.address,
                        "is_output": r.is_output,
                        "hash": hex::encode(r.hash),
                        "index": r.index,
                        "height": r.height,
                        "value": r.value,
                    })
                })
                .collect();
            Ok(vec![json!(rows)])
        }
        "dw_receive" => {
            let pocket = optional_string_param(params, 0);
            Ok(vec![json!(wallet.receive(pocket.as_deref()).await?)])
        }
        "dw_stealth" => {
            let pocket = optional_string_param(params, 0);
            Ok(vec![json!(wallet.stealth(pocket.as_deref()).await?)])
        }
        "dw_send" => {
            let destinations = destinations_param(params, 0)?;
            let pocket = optional_string_param(params, 1);
            let fee = u64_param(params, 2)?;
            let tx_hash = wallet.send(destinations, pocket.as_deref(), fee).await?;
            Ok(vec![json!(hex::encode(tx_hash))])
        }
        "dw_pending_payments" => {
            let pocket = optional_string_param(params, 0);
            let payments = wallet.pending_payments(pocket.as_deref()).await?;
            let payments: Vec<Value> = payments
                .into_iter()
                .map(|p| {
                    json!({
                        "tx_hash": hex::encode(p.tx_hash),
                        "destinations": p.destinations,
                        "created_at": p.created_at,
                    })
                })
                .collect();
            Ok(vec![json!(payments)])
        }
        "dw_get_height" => Ok(vec![json!(wallet.get_height().await?)]),
        "dw_get_setting" => {
            let name = string_param(params, 0)?;
            Ok(vec![json!(wallet.get_setting(&name).await?)])
        }
        "dw_set_setting" => {
            let name = string_param(params, 0)?;
            let value = string_param(params, 1)?;
            wallet.set_setting(&name, &value).await?;
            Ok(vec![])
        }
        "dw_stop" => {
            wallet.stop().await?;
            Ok(vec![])
        }
        other => Err(DispatchError::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_wallet() -> (tempfile::TempDir, Wallet) {
        let dir = tempfile::tempdir().unwrap();
        let wallet = Wallet::open(dir.path().join("accounts"), dir.path().join("settings.toml")).unwrap();
        (dir, wallet)
    }

    #[tokio::test]
    async fn create_account_then_balance_round_trips_through_json() {
        let (_dir, wallet) = test_wallet();

        let create = handle(
            &wallet,
            "dw_create_account",
            &[json!("alice"), json!("correct horse battery staple"), json!(true)],
        )
        .await
        .unwrap();
        assert_eq!(create[0].as_array().unwrap().len(), 12);

        let balance = handle(&wallet, "dw_balance", &[Value::Null]).await.unwrap();
        assert_eq!(balance[0].as_i64().unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_command_has_no_wire_identifier() {
        let (_dir, wallet) = test_wallet();
        let err = handle(&wallet, "dw_not_a_real_command", &[]).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownCommand(_)));
        assert_eq!(err.wire_name(), None);
    }

    #[tokio::test]
    async fn balance_without_an_active_account_is_no_active_account_set() {
        let (_dir, wallet) = test_wallet();
        let err = handle(&wallet, "dw_balance", &[Value::Null]).await.unwrap_err();
        assert_eq!(err.wire_name(), Some("no_active_account_set"));
    }
}

impl DispatchError {
    /// The wire error identifier (spec §7), or `None` for framing-level
    /// failures (unknown command, malformed params) that aren't part of the
    /// taxonomy and get a generic transport-level error string instead.
    pub fn wire_name(&self) -> Option<&'static str> {
        match self {
            DispatchError::Wallet(inner) => inner.wire_name(),
            DispatchError::UnknownCommand(_) | DispatchError::BadParams(_) => None,
        }
    }
}
