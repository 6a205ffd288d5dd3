use clap::{error::ErrorKind, Parser};
use std::ffi::OsString;
use std::path::PathBuf;
use crate::error::AppError;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// トランザクション記述子のJSONファイルへのパス
    #[arg(value_name = "INPUT_JSON")]
    pub input_file: PathBuf,
}

pub fn parse_args() -> Result<CliArgs, AppError> {
    parse_args_from(std::env::args_os())
}

pub fn parse_args_from<I, T>(args: I) -> Result<CliArgs, AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CliArgs::try_parse_from(args).map_err(|e| match e.kind() {
        // --help / --version はclapの既定動作 (exit 0)
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        _ => AppError::Usage(e.render().to_string()),
    })
}
