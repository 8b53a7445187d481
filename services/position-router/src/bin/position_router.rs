/// 位置情報振り分けLambda関数
///
/// デバイスから届いた位置情報イベントをフィルタリングモード別のトラッカーに登録する。
/// Lambda関数としても、ローカルスクリプトとしても実行可能。
///
/// # 環境変数
/// - DISTANCE_TRACKER_NAME: Distanceモードの登録先（デフォルト: DistanceFilteringTracker）
/// - TIME_TRACKER_NAME: Timeモードの登録先（デフォルト: TimeFilteringTracker）
/// - ACCURACY_TRACKER_NAME: それ以外の登録先（デフォルト: AccuracyFilteringTracker）
///
/// # ローカル実行
/// ```bash
/// # 振り分け結果のみ確認（AWSを呼び出さない）
/// cargo run --bin position_router -- --event tests/data/distance_event.json --dry-run
///
/// # 標準入力から読み込んで実際に登録
/// cat event.json | cargo run --bin position_router -- --event -
/// ```
use std::io::Read;

use clap::Parser;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use position_router::application::{PositionUpdateHandler, plan_position_update};
use position_router::domain::PositionRouter;
use position_router::infrastructure::{
    AwsLocationTrackerClient, TrackerConfig, TrackerConfigError, init_local_logging, init_logging,
};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// コマンドライン引数（ローカル実行用）
#[derive(Parser, Debug)]
#[command(name = "position_router")]
#[command(about = "位置情報イベントをフィルタリングモード別のトラッカーに登録")]
struct CliArgs {
    /// 位置情報イベントのJSONファイル（"-"で標準入力）
    #[arg(long, short = 'e')]
    event: String,

    /// 振り分け結果を表示するのみでAWSを呼び出さない
    #[arg(long)]
    dry_run: bool,
}

/// ハンドラーの静的インスタンス
///
/// Lambda warm start時にSDKクライアントを再利用するため、一度だけ初期化する。
static HANDLER: OnceCell<PositionUpdateHandler<AwsLocationTrackerClient>> = OnceCell::const_new();

async fn get_handler()
-> Result<&'static PositionUpdateHandler<AwsLocationTrackerClient>, TrackerConfigError> {
    HANDLER
        .get_or_try_init(|| async {
            let config = TrackerConfig::from_env()?;
            let tracker_client = AwsLocationTrackerClient::from_config().await;
            Ok(PositionUpdateHandler::new(
                tracker_client,
                PositionRouter::new(config.tracker_names().clone()),
            ))
        })
        .await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    if std::env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok() {
        init_logging();
        let func = service_fn(handler);
        lambda_runtime::run(func).await?;
    } else {
        init_local_logging();
        run_local(CliArgs::parse()).await?;
    }

    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// 入力エラーとAPI全体の失敗は呼び出しエラーとしてランタイムに返す。
/// レコード単位の拒否は成功扱い。
async fn handler(event: LambdaEvent<Value>) -> Result<(), Error> {
    let request_id = event.context.request_id.clone();

    let position_handler = get_handler().await.map_err(|err| {
        error!(request_id = %request_id, error = %err, "トラッカー設定読み込み失敗");
        err
    })?;

    match position_handler.handle(&event.payload).await {
        Ok(handled) => {
            info!(
                request_id = %request_id,
                tracker_name = %handled.routed.tracker_name,
                submitted = handled.outcome.submitted,
                failed_count = handled.outcome.failed.len(),
                "位置情報の登録完了"
            );
            Ok(())
        }
        Err(err) => {
            error!(request_id = %request_id, error = %err, "位置情報の登録失敗");
            Err(err.into())
        }
    }
}

/// ローカル環境で実行
async fn run_local(args: CliArgs) -> Result<(), Error> {
    let raw = if args.event == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.event)?
    };
    let payload: Value = serde_json::from_str(&raw)?;

    if args.dry_run {
        let config = TrackerConfig::from_env()?;
        let router = PositionRouter::new(config.tracker_names().clone());
        let routed = plan_position_update(&router, &payload)?;
        println!("{}", serde_json::to_string_pretty(&routed)?);
        return Ok(());
    }

    let handled = get_handler().await?.handle(&payload).await?;
    info!(
        tracker_name = %handled.routed.tracker_name,
        submitted = handled.outcome.submitted,
        failed_count = handled.outcome.failed.len(),
        "位置情報の登録完了"
    );
    for failure in &handled.outcome.failed {
        error!(
            device_id = %failure.device_id,
            code = %failure.code,
            message = %failure.message,
            "拒否されたレコード"
        );
    }

    Ok(())
}
