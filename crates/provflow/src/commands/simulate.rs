use crate::utils;
use clap::Args;
use colored::Colorize;
use provflow_cloud::{
    ApiError, CancellationToken, LifecycleDriver, Operation, PollConfig, ResourceKind,
    ResourceSpec, WaitPolicy,
};
use provflow_config::WaitSettings;
use provflow_resources::{KINDS, KindVisitor, visit_kind};
use provflow_sim::{Fault, SimulatedCloud, parse_script};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// リソース種別 (`provflow kinds` を参照)
    #[arg(short, long)]
    pub kind: String,

    /// 作成後の各取得で返すステータス（最後のものを繰り返す）
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub statuses: Vec<String>,

    /// 削除後、リソースが消えるまでに返すステータス
    #[arg(long, value_delimiter = ',')]
    pub delete_statuses: Vec<String>,

    /// 準備完了後にリソースを削除する
    #[arg(long)]
    pub delete: bool,

    /// ポーリング間隔（ミリ秒）。省略時は設定ファイルの値
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// 各待機の期限（秒）。省略時は種別のタイムアウト
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// 最初の取得をこの回数だけ通信エラーにする
    #[arg(long, default_value_t = 0)]
    pub transient_errors: u32,

    /// 失敗ステータスに付けるエラーメッセージ
    #[arg(long)]
    pub failure_message: Option<String>,
}

pub async fn handle(args: SimulateArgs) -> anyhow::Result<()> {
    let kind = args.kind.clone();
    match visit_kind(&kind, Simulation(args)) {
        Some(simulation) => simulation.await,
        None => anyhow::bail!(
            "リソース種別 '{}' が見つかりません。利用可能な種別: {}",
            kind,
            KINDS.iter().map(|k| k.name).collect::<Vec<_>>().join(", ")
        ),
    }
}

struct Simulation(SimulateArgs);

impl KindVisitor for Simulation {
    type Output = Pin<Box<dyn Future<Output = anyhow::Result<()>>>>;

    fn visit<K: ResourceKind>(self) -> Self::Output {
        Box::pin(simulate::<K>(self.0))
    }
}

async fn simulate<K: ResourceKind>(args: SimulateArgs) -> anyhow::Result<()> {
    let create_script = parse_script::<K::Status, _, _>(K::NAME, &args.statuses)?;
    let delete_script = parse_script::<K::Status, _, _>(K::NAME, &args.delete_statuses)?;

    let loaded = provflow_config::load()?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let create_config = poll_config::<K>(&loaded.settings, Operation::Create, &cancel, &args)?;
    let delete_config = poll_config::<K>(&loaded.settings, Operation::Delete, &cancel, &args)?;

    let mut sim = SimulatedCloud::<K>::new(create_script)?.with_delete_statuses(delete_script);
    if let Some(message) = &args.failure_message {
        sim = sim.with_failure_message(message.clone());
    }
    let sim = Arc::new(sim);
    sim.inject((1..=args.transient_errors).map(|n| {
        Fault::Error(ApiError::Transport(format!(
            "シミュレートされた通信エラー #{}",
            n
        )))
    }))
    .await;

    let driver: LifecycleDriver<K, _> = LifecycleDriver::new(Arc::clone(&sim));

    println!(
        "{} {} (間隔 {}, 期限 {})",
        "作成中".blue(),
        K::NAME.cyan(),
        utils::format_duration(create_config.interval),
        utils::format_timeout(create_config.deadline)
    );

    let started = Instant::now();
    let spec = ResourceSpec::new(format!("sim-{}", K::NAME), serde_json::json!({}));
    let provisioned = match driver
        .create(&spec, &WaitPolicy::Wait(create_config))
        .await
    {
        Ok(provisioned) => provisioned,
        Err(e) => {
            if let Some(handle) = e.handle() {
                println!(
                    "{} {} ({} 経過, 取得 {} 回)",
                    "✗".red(),
                    handle,
                    utils::format_duration(started.elapsed()),
                    sim.fetch_count(handle).await
                );
            }
            return Err(e.into());
        }
    };

    let status = provisioned
        .snapshot
        .as_ref()
        .map(|s| s.status.to_string())
        .unwrap_or_default();
    println!(
        "{} {} が {} になりました ({}, 取得 {} 回)",
        "✓".green(),
        provisioned.handle,
        status.green(),
        utils::format_duration(started.elapsed()),
        sim.fetch_count(&provisioned.handle).await
    );

    if !args.delete {
        return Ok(());
    }

    println!(
        "{} {} (期限 {})",
        "削除中".blue(),
        provisioned.handle.to_string().cyan(),
        utils::format_timeout(delete_config.deadline)
    );

    let started = Instant::now();
    let before = sim.fetch_count(&provisioned.handle).await;
    let mut handle = provisioned.handle.clone();
    driver
        .delete(&mut handle, &WaitPolicy::Wait(delete_config))
        .await?;

    println!(
        "{} {} を削除しました ({}, 取得 {} 回)",
        "✓".green(),
        provisioned.handle,
        utils::format_duration(started.elapsed()),
        sim.fetch_count(&provisioned.handle).await - before
    );

    Ok(())
}

fn poll_config<K: ResourceKind>(
    settings: &WaitSettings,
    operation: Operation,
    cancel: &CancellationToken,
    args: &SimulateArgs,
) -> anyhow::Result<PollConfig> {
    let mut config = PollConfig::for_kind::<K>(settings, operation, cancel.clone())?;
    if let Some(ms) = args.interval_ms {
        config.interval = Duration::from_millis(ms);
    }
    if let Some(secs) = args.timeout_secs {
        config.deadline = Some(Duration::from_secs(secs));
    }
    config.validate()?;
    Ok(config)
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("中断されました。キャンセルします");
            cancel.cancel();
        }
    });
}
