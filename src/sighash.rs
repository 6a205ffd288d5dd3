use bitcoin::{
    hashes::Hash, secp256k1::Message, sighash::SighashCache, Script, Transaction,
};

use crate::{error::AppError, types::SigningPolicy};

/// レガシーsighashを計算する
///
/// 対象入力のscript_sigを使用済み出力のscript_pubkeyに置き換え、
/// 他の入力のscript_sigを空にしたトランザクション全体を対象とする。
pub fn legacy_sighash(
    tx: &Transaction,
    input_index: usize,
    spent_script: &Script,
    policy: SigningPolicy,
) -> Result<Message, AppError> {
    let cache = SighashCache::new(tx);
    let sighash = cache
        .legacy_signature_hash(input_index, spent_script, policy.sighash_type.to_u32())
        .map_err(|e| AppError::Sighash {
            input_index,
            reason: e.to_string(),
        })?;
    Ok(Message::from_digest(sighash.to_byte_array()))
}
