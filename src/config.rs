use std::fmt;
use std::fs;
use std::path::Path;

use bitcoin::Network as BitcoinNetwork;
use serde::Deserialize;

use crate::error::AppError;

/// 署名対象トランザクションの宣言的な記述 (入力JSONファイルの内容)
#[derive(Deserialize, Debug)]
pub struct TransactionDescriptor {
    pub testnet: bool,
    pub version: i32,
    pub locktime: u32,
    // 配列の順序がそのままワイヤ上の順序と署名時の入力インデックスになる
    pub input: Vec<InputSpec>,
    pub output: Vec<OutputSpec>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    pub transaction_id: String,
    pub transaction_index: u32,
    pub sequence: u32,
    /// 使用する出力を含む前トランザクション全体の16進数表現
    pub utxo: String,
    pub wif: String,
}

// WIFはログに出さない
impl fmt::Debug for InputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSpec")
            .field("transaction_id", &self.transaction_id)
            .field("transaction_index", &self.transaction_index)
            .field("sequence", &self.sequence)
            .field("utxo_len", &(self.utxo.len() / 2))
            .field("wif", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize, Debug)]
pub struct OutputSpec {
    pub address: String,
    pub value: u64,
}

impl TransactionDescriptor {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// `testnet` フラグからアドレス検証とWIF検証に使うネットワークを決める
    pub fn network(&self) -> BitcoinNetwork {
        if self.testnet {
            BitcoinNetwork::Testnet
        } else {
            BitcoinNetwork::Bitcoin
        }
    }
}

pub fn load_descriptor(path: &Path) -> Result<TransactionDescriptor, AppError> {
    let content = fs::read_to_string(path).map_err(|e| {
        log::error!("入力ファイルの読み込みに失敗しました: {:?}", path);
        AppError::Io {
            file_path: path.to_path_buf(),
            source: e,
        }
    })?;

    let descriptor = TransactionDescriptor::from_json(&content).map_err(|e| {
        log::error!("入力JSONのパースに失敗しました。");
        AppError::JsonParse {
            file_path: path.to_path_buf(),
            source: e,
        }
    })?;
    log::debug!("入力記述子のパース成功: {:?}", descriptor);

    if descriptor.input.is_empty() {
        return Err(AppError::MalformedDescriptor("inputが空です".to_string()));
    }
    if descriptor.output.is_empty() {
        return Err(AppError::MalformedDescriptor("outputが空です".to_string()));
    }

    Ok(descriptor)
}
