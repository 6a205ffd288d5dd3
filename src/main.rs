use std::process::ExitCode;

mod builder;
mod cli;
mod config;
mod error;
mod finalizer;
mod sighash;
mod signer;
mod transaction;
mod types;
mod verifier;

use error::AppError;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => {
            log::info!("処理が正常に完了しました。");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("処理に失敗しました: {}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), AppError> {
    let args = cli::parse_args()?;
    log::info!("アプリケーションを開始します。引数: {:?}", args);

    let descriptor = config::load_descriptor(&args.input_file)?;

    let serialized_tx = transaction::create_and_sign_transaction(&descriptor, &transaction::SECP)?;
    log::info!("Raw transaction hex: {}", serialized_tx);

    println!("{}", args.input_file.display());
    println!("{}", serialized_tx);
    Ok(())
}
