use bitcoin::{
    absolute::LockTime, consensus::encode, network::Network as BitcoinNetwork, psbt::Psbt,
    transaction::Version, Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn,
    TxOut, Txid, Witness,
};
use std::collections::HashMap;
use std::str::FromStr;

use crate::{
    config::{InputSpec, OutputSpec, TransactionDescriptor},
    error::AppError,
};

/// 未署名のトランザクションの骨格を構築する
///
/// 各入力には前トランザクション全体 (`non_witness_utxo`) を添付する。
/// script_sig はすべて空のまま。
pub fn build(descriptor: &TransactionDescriptor, network: BitcoinNetwork) -> Result<Psbt, AppError> {
    log::info!("未署名トランザクションの構築を開始します。");

    let mut tx_inputs: Vec<TxIn> = Vec::with_capacity(descriptor.input.len());
    let mut prev_txs: Vec<Transaction> = Vec::with_capacity(descriptor.input.len());
    let mut seen: HashMap<OutPoint, usize> = HashMap::with_capacity(descriptor.input.len());
    for (input_index, spec) in descriptor.input.iter().enumerate() {
        let (tx_in, prev_tx) = resolve_input(input_index, spec)?;
        // 同じ出力を二重に使用するトランザクションはコンセンサスで無効
        if let Some(first_index) = seen.insert(tx_in.previous_output, input_index) {
            return Err(AppError::MalformedDescriptor(format!(
                "入力 {} と入力 {} が同じ出力 ({}) を使用しています",
                first_index, input_index, tx_in.previous_output
            )));
        }
        log::debug!(
            "入力追加: index={}, txid={}, vout={}, sequence={:#010x}",
            input_index, tx_in.previous_output.txid, tx_in.previous_output.vout, spec.sequence
        );
        tx_inputs.push(tx_in);
        prev_txs.push(prev_tx);
    }

    let mut outputs: Vec<TxOut> = Vec::with_capacity(descriptor.output.len());
    for output_def in descriptor.output.iter() {
        outputs.push(resolve_output(output_def, network)?);
        log::debug!("出力追加: address={}, value={}", output_def.address, output_def.value);
    }

    let unsigned_tx = Transaction {
        version: Version(descriptor.version),
        lock_time: LockTime::from_consensus(descriptor.locktime),
        input: tx_inputs,
        output: outputs,
    };

    let mut psbt = Psbt::from_unsigned_tx(unsigned_tx)?;
    for (psbt_input, prev_tx) in psbt.inputs.iter_mut().zip(prev_txs) {
        psbt_input.non_witness_utxo = Some(prev_tx);
    }

    log::info!(
        "未署名トランザクションを構築しました (入力 {} 件, 出力 {} 件)。",
        psbt.inputs.len(),
        psbt.outputs.len()
    );
    Ok(psbt)
}

fn resolve_input(input_index: usize, spec: &InputSpec) -> Result<(TxIn, Transaction), AppError> {
    let txid = Txid::from_str(&spec.transaction_id).map_err(|e| {
        AppError::MalformedDescriptor(format!(
            "無効なTXID形式 (入力 {}, {}): {}",
            input_index, spec.transaction_id, e
        ))
    })?;

    let prev_tx_bytes = hex::decode(&spec.utxo).map_err(|e| {
        AppError::MalformedDescriptor(format!("utxoの16進デコード失敗 (入力 {}): {}", input_index, e))
    })?;
    let prev_tx: Transaction = encode::deserialize(&prev_tx_bytes).map_err(|e| {
        AppError::MalformedDescriptor(format!(
            "utxoをトランザクションとして解釈できません (入力 {}): {}",
            input_index, e
        ))
    })?;

    // utxoが参照先のトランザクションそのものであることを確認する
    let prev_txid = prev_tx.compute_txid();
    if prev_txid != txid {
        return Err(AppError::MalformedDescriptor(format!(
            "utxoのTXID ({}) がtransactionId ({}) と一致しません (入力 {})",
            prev_txid, txid, input_index
        )));
    }

    if spec.transaction_index as usize >= prev_tx.output.len() {
        return Err(AppError::MalformedDescriptor(format!(
            "transactionIndex {} は範囲外です (入力 {}, 出力数 {})",
            spec.transaction_index,
            input_index,
            prev_tx.output.len()
        )));
    }

    let tx_in = TxIn {
        previous_output: OutPoint::new(txid, spec.transaction_index),
        script_sig: ScriptBuf::new(), // 署名前は空
        sequence: Sequence(spec.sequence),
        witness: Witness::new(),
    };
    Ok((tx_in, prev_tx))
}

fn resolve_output(output_def: &OutputSpec, network: BitcoinNetwork) -> Result<TxOut, AppError> {
    let address = Address::from_str(&output_def.address)
        .and_then(|addr| addr.require_network(network))
        .map_err(|e| AppError::InvalidAddress {
            address: output_def.address.clone(),
            source: e,
        })?;

    let value = Amount::from_sat(output_def.value);
    if value > Amount::MAX_MONEY {
        return Err(AppError::MalformedDescriptor(format!(
            "出力額 {} sats が上限を超えています ({})",
            output_def.value, output_def.address
        )));
    }

    Ok(TxOut {
        value,
        script_pubkey: address.script_pubkey(),
    })
}
