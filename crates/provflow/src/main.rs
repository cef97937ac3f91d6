mod commands;
mod utils;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "provflow")]
#[command(
    about = "クラウドリソースの収束を待ち、見届ける。",
    long_about = None
)]
struct Cli {
    /// ログを詳しく出力 (-v: info, -vv: debug)。RUST_LOG が優先される
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// リソース種別とステータスの分類を表示
    Kinds {
        /// 種別名（指定しない場合は全種別）
        kind: Option<String>,
    },
    /// シミュレートしたコントロールプレーンで作成（と削除）の待機を試す
    Simulate(commands::simulate::SimulateArgs),
    /// 有効な待機設定を表示
    Config,
    /// バージョン情報を表示
    Version,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdoutはコマンド出力用
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Kinds { kind } => commands::kinds::handle(kind.as_deref())?,
        Commands::Simulate(args) => commands::simulate::handle(args).await?,
        Commands::Config => commands::config::handle()?,
        Commands::Version => {
            println!("provflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
