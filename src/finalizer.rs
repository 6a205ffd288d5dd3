use bitcoin::{
    consensus::encode, psbt::Psbt, script::{Builder, PushBytesBuf}, Transaction,
};

use crate::error::AppError;

/// 検証済みの署名データから最終的なscript_sigを組み立て、トランザクションを取り出す
///
/// script_sig はレガシー形式 `<署名+sighashバイト> <公開鍵>`。
/// 署名用のメタデータは最終化後に取り除く。
pub fn finalize(mut psbt: Psbt) -> Result<Transaction, AppError> {
    for (input_index, psbt_input) in psbt.inputs.iter_mut().enumerate() {
        let (public_key, signature) = psbt_input
            .partial_sigs
            .iter()
            .next()
            .ok_or(AppError::InvalidSignature { input_index })?;

        let sig_push = PushBytesBuf::try_from(signature.to_vec()).map_err(|e| AppError::Internal {
            input_index,
            reason: format!("署名のPushBytes変換に失敗しました: {}", e),
        })?;
        let final_script_sig = Builder::new()
            .push_slice(sig_push)
            .push_key(public_key)
            .into_script();

        psbt_input.final_script_sig = Some(final_script_sig);
        psbt_input.partial_sigs.clear();
        psbt_input.sighash_type = None;
        psbt_input.non_witness_utxo = None;
        log::debug!("入力 {} を最終化しました。", input_index);
    }

    // 手数料はこのツールの関心外なので手数料率チェックなしで取り出す
    let tx = psbt.extract_tx_unchecked_fee_rate();
    log::info!("署名済みトランザクションを生成しました。txid={}", tx.compute_txid());
    Ok(tx)
}

/// 正規のワイヤ形式にシリアライズし、小文字の16進数文字列にする
pub fn serialize(tx: &Transaction) -> String {
    encode::serialize_hex(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builder::build, config::TransactionDescriptor, signer::sign_all,
        types::SigningPolicy,
    };
    use bitcoin::{
        script::Instruction,
        secp256k1::Secp256k1,
        PrivateKey,
    };

    const SINGLE_INPUT: &str = include_str!("../tests/fixtures/single_input.json");

    fn signed_single() -> (TransactionDescriptor, Psbt) {
        let secp = Secp256k1::new();
        let d = TransactionDescriptor::from_json(SINGLE_INPUT).unwrap();
        let network = d.network();
        let mut psbt = build(&d, network).unwrap();
        sign_all(&mut psbt, &d.input, network, SigningPolicy::LEGACY_SIGHASH_ALL, &secp).unwrap();
        (d, psbt)
    }

    #[test]
    fn script_sig_pushes_signature_then_pubkey() {
        let secp = Secp256k1::new();
        let (d, psbt) = signed_single();
        let expected_sig = psbt.inputs[0].partial_sigs.values().next().unwrap().to_vec();
        let tx = finalize(psbt).unwrap();

        let pushes: Vec<Vec<u8>> = tx.input[0]
            .script_sig
            .instructions()
            .map(|ins| match ins.unwrap() {
                Instruction::PushBytes(bytes) => bytes.as_bytes().to_vec(),
                Instruction::Op(op) => panic!("unexpected opcode {op}"),
            })
            .collect();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes[0], expected_sig);
        assert_eq!(*pushes[0].last().unwrap(), 0x01);
        let pk = PrivateKey::from_wif(&d.input[0].wif).unwrap().public_key(&secp);
        assert_eq!(pushes[1], pk.to_bytes());
        assert!(tx.input[0].witness.is_empty());
    }

    #[test]
    fn unsigned_input_cannot_be_finalized() {
        let (_, mut psbt) = signed_single();
        psbt.inputs[0].partial_sigs.clear();
        assert!(matches!(finalize(psbt), Err(AppError::InvalidSignature { input_index: 0 })));
    }

    #[test]
    fn push_conversion_failure_is_internal_error() {
        let err = AppError::Internal {
            input_index: 3,
            reason: "署名のPushBytes変換に失敗しました".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("入力インデックス 3"));
        assert!(!rendered.contains("Sighash"));
    }

    #[test]
    fn serialized_hex_is_lowercase() {
        let (_, psbt) = signed_single();
        let hex = serialize(&finalize(psbt).unwrap());
        assert_eq!(hex, hex.to_lowercase());
        assert!(hex.starts_with("02000000"));
        assert!(hex.ends_with("00000000"));
    }
}
