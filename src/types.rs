use bitcoin::{psbt::Psbt, script::ScriptBuf, sighash::EcdsaSighashType, TxOut};
use crate::error::AppError;

/// 署名方式のポリシー
///
/// 現状はレガシー(非segwit)のsighashアルゴリズムとSIGHASH_ALLのみをサポートする。
/// witness入力を追加する場合はここに新しいポリシーを定義すること。
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SigningPolicy {
    pub sighash_type: EcdsaSighashType,
}

impl SigningPolicy {
    pub const LEGACY_SIGHASH_ALL: SigningPolicy = SigningPolicy {
        sighash_type: EcdsaSighashType::All,
    };
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScriptType {
    P2PKH,
}

impl ScriptType {
    pub fn from_script_buf(script: &ScriptBuf, input_index: usize) -> Result<Self, AppError> {
        if script.is_p2pkh() {
            Ok(ScriptType::P2PKH)
        } else {
            // segwit / P2SH などは未対応
            Err(AppError::UnsupportedPrevout {
                input_index,
                script_hex: script.to_hex_string(),
            })
        }
    }
}

/// 入力 `input_index` が使用する前トランザクションの出力を返す
pub fn spent_output(psbt: &Psbt, input_index: usize) -> Result<&TxOut, AppError> {
    let missing = || AppError::MalformedDescriptor(format!(
        "入力 {} の前トランザクション出力が見つかりません",
        input_index
    ));
    let tx_in = psbt.unsigned_tx.input.get(input_index).ok_or_else(missing)?;
    let prev_tx = psbt
        .inputs
        .get(input_index)
        .and_then(|input| input.non_witness_utxo.as_ref())
        .ok_or_else(missing)?;
    prev_tx
        .output
        .get(tx_in.previous_output.vout as usize)
        .ok_or_else(missing)
}
