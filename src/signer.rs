use bitcoin::{
    ecdsa, network::Network as BitcoinNetwork, psbt::Psbt, secp256k1::{All, Secp256k1},
    NetworkKind, PrivateKey,
};

use crate::{
    config::InputSpec,
    error::AppError,
    sighash::legacy_sighash,
    types::{spent_output, ScriptType, SigningPolicy},
};

/// 全入力に署名し、(署名, sighashタイプ, 公開鍵) を各入力に添付する
///
/// 入力は記述子の順序どおりに処理する。入力 i の署名には入力 i の情報のみを使う。
pub fn sign_all(
    psbt: &mut Psbt,
    inputs: &[InputSpec],
    network: BitcoinNetwork,
    policy: SigningPolicy,
    secp: &Secp256k1<All>,
) -> Result<(), AppError> {
    log::info!("トランザクション署名処理を開始します。");

    for (input_index, spec) in inputs.iter().enumerate() {
        let private_key = decode_wif(input_index, &spec.wif, network)?;
        let public_key = private_key.public_key(secp);

        let spent_script = spent_output(psbt, input_index)?.script_pubkey.clone();
        let script_type = ScriptType::from_script_buf(&spent_script, input_index)?;

        let message = legacy_sighash(&psbt.unsigned_tx, input_index, &spent_script, policy)?;
        let signature = secp.sign_ecdsa(&message, &private_key.inner);

        let psbt_input = &mut psbt.inputs[input_index];
        psbt_input.sighash_type = Some(policy.sighash_type.into());
        psbt_input.partial_sigs.insert(
            public_key,
            ecdsa::Signature {
                signature,
                sighash_type: policy.sighash_type,
            },
        );
        log::debug!("入力 {} ({:?}) の署名を添付しました。pubkey={}", input_index, script_type, public_key);
    }

    log::info!("全ての入力の署名が完了しました。");
    Ok(())
}

fn decode_wif(input_index: usize, wif: &str, network: BitcoinNetwork) -> Result<PrivateKey, AppError> {
    let private_key = PrivateKey::from_wif(wif)
        .map_err(|e| AppError::WifDecode { input_index, source: e })?;
    let expected = NetworkKind::from(network);
    if private_key.network != expected {
        return Err(AppError::NetworkMismatch {
            input_index,
            expected: format!("{:?}", expected),
            actual: format!("{:?}", private_key.network),
        });
    }
    Ok(private_key)
}
