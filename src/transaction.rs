use std::sync::LazyLock;

use bitcoin::secp256k1::{All, Secp256k1};

use crate::{
    builder, config::TransactionDescriptor, error::AppError, finalizer,
    signer, types::SigningPolicy, verifier,
};

/// プロセス全体で共有するsecp256k1コンテキスト (初回使用時に生成)
pub static SECP: LazyLock<Secp256k1<All>> = LazyLock::new(Secp256k1::new);

/// 記述子から署名済みトランザクションの16進数表現を生成する
///
/// 構築 → 署名 → 検証 → 最終化 の順に実行し、途中で失敗した場合は何も出力しない。
pub fn create_and_sign_transaction(
    descriptor: &TransactionDescriptor,
    secp: &Secp256k1<All>,
) -> Result<String, AppError> {
    log::info!("トランザクション構築処理を開始します。");
    let network = descriptor.network();
    let policy = SigningPolicy::LEGACY_SIGHASH_ALL;
    log::debug!("ネットワーク: {:?}, ポリシー: {:?}", network, policy);

    let mut psbt = builder::build(descriptor, network)?;
    signer::sign_all(&mut psbt, &descriptor.input, network, policy, secp)?;
    verifier::verify_all(&psbt, policy, secp)?;
    let signed_tx = finalizer::finalize(psbt)?;

    Ok(finalizer::serialize(&signed_tx))
}
