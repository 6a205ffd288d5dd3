use std::path::PathBuf;
use bitcoin::address::ParseError as BitcoinAddressError;
use bitcoin::key::FromWifError as BitcoinKeyError; // WIFデコードエラー用
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),

    #[error("I/Oエラー ファイル: {file_path:?}, 詳細: {source}")]
    Io {
        file_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSONパースエラー ファイル: {file_path:?}, 詳細: {source}")]
    JsonParse {
        file_path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("トランザクション記述子が不正です: {0}")]
    MalformedDescriptor(String),

    #[error("無効なアドレスまたはネットワーク不整合 ({address}): {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: BitcoinAddressError,
    },

    #[error("秘密鍵(WIF)のデコードに失敗しました (入力インデックス {input_index}): {source}")]
    WifDecode {
        input_index: usize,
        #[source]
        source: BitcoinKeyError,
    },

    #[error("ネットワーク不整合 (入力インデックス {input_index}): 記述子 ({expected}) vs WIF ({actual})")]
    NetworkMismatch {
        input_index: usize,
        expected: String,
        actual: String,
    },

    #[error("未対応の使用済み出力スクリプト (入力インデックス {input_index}): {script_hex}")]
    UnsupportedPrevout {
        input_index: usize,
        script_hex: String,
    },

    #[error("Sighash計算エラー (入力インデックス {input_index}): {reason}")]
    Sighash {
        input_index: usize,
        reason: String,
    },

    #[error("署名検証に失敗しました (入力インデックス {input_index})")]
    InvalidSignature { input_index: usize },

    #[error("内部エラー (入力インデックス {input_index}): {reason}")]
    Internal {
        input_index: usize,
        reason: String,
    },

    #[error("PSBTエラー: {0}")]
    Psbt(#[from] bitcoin::psbt::Error),
}
