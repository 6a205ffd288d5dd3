use bitcoin::{
    psbt::Psbt, secp256k1::{All, Secp256k1}, ScriptBuf,
};

use crate::{
    error::AppError,
    sighash::legacy_sighash,
    types::{spent_output, SigningPolicy},
};

/// 添付済みの全署名を検証する
///
/// 失敗した最初の入力インデックスで `InvalidSignature` を返す。
pub fn verify_all(psbt: &Psbt, policy: SigningPolicy, secp: &Secp256k1<All>) -> Result<(), AppError> {
    log::info!("署名の検証を開始します。");
    for input_index in 0..psbt.inputs.len() {
        verify_input(psbt, input_index, policy, secp)?;
        log::debug!("入力 {} の署名検証に成功しました。", input_index);
    }
    log::info!("全ての署名の検証に成功しました。");
    Ok(())
}

fn verify_input(
    psbt: &Psbt,
    input_index: usize,
    policy: SigningPolicy,
    secp: &Secp256k1<All>,
) -> Result<(), AppError> {
    let invalid = || AppError::InvalidSignature { input_index };

    let partial_sigs = &psbt.inputs[input_index].partial_sigs;
    if partial_sigs.len() != 1 {
        log::error!("入力 {} の署名数が不正です: {}", input_index, partial_sigs.len());
        return Err(invalid());
    }
    let Some((public_key, signature)) = partial_sigs.iter().next() else {
        return Err(invalid());
    };
    if signature.sighash_type != policy.sighash_type {
        log::error!("入力 {} のsighashタイプが不正です: {}", input_index, signature.sighash_type);
        return Err(invalid());
    }

    // 公開鍵が使用済み出力のロックスクリプトに対応しているか
    let spent_script = &spent_output(psbt, input_index)?.script_pubkey;
    if *spent_script != ScriptBuf::new_p2pkh(&public_key.pubkey_hash()) {
        log::error!("入力 {} の鍵が使用済み出力のscript_pubkeyと一致しません。", input_index);
        return Err(invalid());
    }

    let message = legacy_sighash(&psbt.unsigned_tx, input_index, spent_script, policy)?;
    secp.verify_ecdsa(&message, &signature.signature, &public_key.inner)
        .map_err(|e| {
            log::error!("入力 {} のECDSA検証に失敗しました: {}", input_index, e);
            invalid()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::build, config::TransactionDescriptor, signer::sign_all};
    use assert_matches::assert_matches;

    const SINGLE_INPUT: &str = include_str!("../tests/fixtures/single_input.json");
    const MULTI_INPUT: &str = include_str!("../tests/fixtures/multi_input.json");
    // 使用済み出力とは無関係なテストネット鍵
    const UNRELATED_WIF: &str = "cUoRrp71uYqFSZxjbmx6p5pU5JgCuGgckVC2unuNQ3T4Yn6vMsPP";

    fn signed(json: &str, tweak: impl FnOnce(&mut TransactionDescriptor)) -> Psbt {
        let secp = Secp256k1::new();
        let mut d = TransactionDescriptor::from_json(json).unwrap();
        tweak(&mut d);
        let network = d.network();
        let mut psbt = build(&d, network).unwrap();
        sign_all(&mut psbt, &d.input, network, SigningPolicy::LEGACY_SIGHASH_ALL, &secp).unwrap();
        psbt
    }

    #[test]
    fn accepts_freshly_signed_inputs() {
        let secp = Secp256k1::new();
        let psbt = signed(MULTI_INPUT, |_| {});
        verify_all(&psbt, SigningPolicy::LEGACY_SIGHASH_ALL, &secp).unwrap();
    }

    #[test]
    fn key_that_does_not_own_prevout_fails() {
        let secp = Secp256k1::new();
        let psbt = signed(MULTI_INPUT, |d| d.input[1].wif = UNRELATED_WIF.to_string());
        assert_matches!(
            verify_all(&psbt, SigningPolicy::LEGACY_SIGHASH_ALL, &secp),
            Err(AppError::InvalidSignature { input_index: 1 })
        );
    }

    #[test]
    fn signature_over_other_transaction_fails() {
        let secp = Secp256k1::new();
        let mut psbt = signed(SINGLE_INPUT, |_| {});
        // 署名後に出力額を改ざんするとsighashが変わる
        psbt.unsigned_tx.output[0].value = bitcoin::Amount::from_sat(1);
        assert_matches!(
            verify_all(&psbt, SigningPolicy::LEGACY_SIGHASH_ALL, &secp),
            Err(AppError::InvalidSignature { input_index: 0 })
        );
    }

    #[test]
    fn missing_signature_fails() {
        let secp = Secp256k1::new();
        let mut psbt = signed(MULTI_INPUT, |_| {});
        psbt.inputs[0].partial_sigs.clear();
        assert_matches!(
            verify_all(&psbt, SigningPolicy::LEGACY_SIGHASH_ALL, &secp),
            Err(AppError::InvalidSignature { input_index: 0 })
        );
    }

    #[test]
    fn wrong_sighash_type_fails() {
        let secp = Secp256k1::new();
        let mut psbt = signed(SINGLE_INPUT, |_| {});
        for sig in psbt.inputs[0].partial_sigs.values_mut() {
            sig.sighash_type = bitcoin::sighash::EcdsaSighashType::None;
        }
        assert_matches!(
            verify_all(&psbt, SigningPolicy::LEGACY_SIGHASH_ALL, &secp),
            Err(AppError::InvalidSignature { input_index: 0 })
        );
    }
}
