/// 位置情報更新ハンドラー
///
/// Lambdaに渡された位置情報イベントを検証し、フィルタリングモードに応じた
/// トラッカーへ1件の位置更新として登録する。
/// レコード単位の拒否はログに記録するのみで、呼び出しは成功として扱う。
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    FilteringMode, PositionEvent, PositionEventError, PositionRouter, RouteError, RoutedUpdate,
};
use crate::infrastructure::{BatchUpdateOutcome, TrackerClient, TrackerClientError};

/// 位置情報ハンドラーのエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionHandlerError {
    /// イベントの形式が不正
    #[error("invalid position event: {0}")]
    InvalidEvent(#[from] PositionEventError),
    /// ルーティングに必要な値が欠落
    #[error("cannot route position event: {0}")]
    Route(#[from] RouteError),
    /// トラッカーへの登録に失敗
    #[error("tracker update failed: {0}")]
    Tracker(#[from] TrackerClientError),
}

/// ハンドラーの処理結果
#[derive(Debug, Clone, PartialEq)]
pub struct PositionHandled {
    /// ルーティング結果
    pub routed: RoutedUpdate,
    /// トラッカーAPIの応答
    pub outcome: BatchUpdateOutcome,
}

/// イベントを検証してルーティング結果を返す（API呼び出しなし）
pub fn plan_position_update(
    router: &PositionRouter,
    event: &Value,
) -> Result<RoutedUpdate, PositionHandlerError> {
    let event = PositionEvent::from_value(event)?;

    let routed = router.route(&event)?;

    if routed.mode == FilteringMode::Accuracy && !FilteringMode::is_recognized(&event.filtering) {
        debug!(
            device_id = %event.device_id,
            filtering = %event.filtering,
            "未知のフィルタリングモードのためAccuracyトラッカーに振り分け"
        );
    }

    Ok(routed)
}

/// 位置情報イベントを処理するハンドラー
pub struct PositionUpdateHandler<T>
where
    T: TrackerClient,
{
    /// トラッカー操作
    tracker_client: T,
    /// トラッカー振り分け
    router: PositionRouter,
}

impl<T> PositionUpdateHandler<T>
where
    T: TrackerClient,
{
    /// 新しいPositionUpdateHandlerを作成
    pub fn new(tracker_client: T, router: PositionRouter) -> Self {
        Self {
            tracker_client,
            router,
        }
    }

    /// 位置情報イベントを処理
    ///
    /// # 処理フロー
    /// 1. イベントをパースしてフィルタリングモードを判定
    /// 2. 登録先トラッカーと精度を決定し、更新レコードを作成
    /// 3. BatchUpdateDevicePositionを1回だけ呼び出す
    /// 4. 拒否されたレコードがあれば警告ログを出力
    pub async fn handle(&self, event: &Value) -> Result<PositionHandled, PositionHandlerError> {
        let routed = plan_position_update(&self.router, event)?;

        info!(
            device_id = %routed.update.device_id,
            filtering = %routed.update.position_properties.filtering,
            tracker_name = %routed.tracker_name,
            "位置情報を登録"
        );

        let outcome = self
            .tracker_client
            .batch_update_device_position(
                &routed.tracker_name,
                std::slice::from_ref(&routed.update),
            )
            .await?;

        if !outcome.is_complete() {
            for failure in &outcome.failed {
                warn!(
                    tracker_name = %routed.tracker_name,
                    device_id = %failure.device_id,
                    code = %failure.code,
                    message = %failure.message,
                    "位置情報の登録が拒否された"
                );
            }
            warn!(
                tracker_name = %routed.tracker_name,
                failed_count = outcome.failed.len(),
                "一部の位置情報が登録されなかった"
            );
        }

        Ok(PositionHandled { routed, outcome })
    }
}
