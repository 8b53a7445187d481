//! トラッカー操作モジュール
//!
//! Amazon Location ServiceのBatchUpdateDevicePosition APIを呼び出し、
//! デバイス位置をトラッカーに登録する。
//! レスポンスのレコード単位エラーは結果として返すのみで、呼び出し自体は失敗させない。

use async_trait::async_trait;
use aws_sdk_location::Client as LocationClient;
use aws_sdk_location::primitives::DateTime;
use aws_sdk_location::types::{
    BatchUpdateDevicePositionError, DevicePositionUpdate, PositionalAccuracy,
};
use chrono::{NaiveDateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::PositionUpdate;

/// トラッカー操作のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerClientError {
    /// サンプル時刻をタイムスタンプに変換できない
    #[error("invalid sample time: {0}")]
    InvalidSampleTime(String),
    /// リクエストの組み立てに失敗
    #[error("failed to build request: {0}")]
    BuildError(String),
    /// AWS SDK エラー
    #[error("AWS Location APIエラー: {0}")]
    AwsSdkError(String),
}

/// レコード単位で失敗した更新
#[derive(Debug, Clone, PartialEq)]
pub struct FailedUpdate {
    /// デバイスID
    pub device_id: String,
    /// エラーコード（例: "ResourceNotFoundError"）
    pub code: String,
    /// エラーメッセージ
    pub message: String,
}

/// BatchUpdateDevicePositionの結果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchUpdateOutcome {
    /// 送信したレコード数
    pub submitted: usize,
    /// APIが拒否したレコード
    pub failed: Vec<FailedUpdate>,
}

impl BatchUpdateOutcome {
    /// 拒否されたレコードがないかどうか
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// トラッカー操作トレイト（テスト用の抽象化）
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// 位置更新をトラッカーに一括登録する
    ///
    /// # 引数
    /// * `tracker_name` - 登録先トラッカー名
    /// * `updates` - 位置更新レコード
    ///
    /// # 戻り値
    /// * `Ok(BatchUpdateOutcome)` - API呼び出し成功（レコード単位の失敗を含み得る）
    /// * `Err(TrackerClientError)` - リクエスト全体の失敗
    async fn batch_update_device_position(
        &self,
        tracker_name: &str,
        updates: &[PositionUpdate],
    ) -> Result<BatchUpdateOutcome, TrackerClientError>;
}

/// 実際のAWS Location SDKを使用したトラッカー操作実装
#[derive(Debug, Clone)]
pub struct AwsLocationTrackerClient {
    client: LocationClient,
}

impl AwsLocationTrackerClient {
    /// 新しいAwsLocationTrackerClientを作成
    pub fn new(client: LocationClient) -> Self {
        Self { client }
    }

    /// AWS設定からデフォルトのクライアントを作成
    pub async fn from_config() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(LocationClient::new(&config))
    }

    /// ドメインの更新レコードをSDKの型に変換
    pub fn to_sdk_update(
        update: &PositionUpdate,
    ) -> Result<DevicePositionUpdate, TrackerClientError> {
        let sample_time = parse_sample_time(&update.sample_time)?;

        let accuracy = PositionalAccuracy::builder()
            .horizontal(update.accuracy.horizontal)
            .build()
            .map_err(|e| TrackerClientError::BuildError(e.to_string()))?;

        DevicePositionUpdate::builder()
            .device_id(&update.device_id)
            .sample_time(sample_time)
            .set_position(Some(update.position.to_vec()))
            .accuracy(accuracy)
            .position_properties("Filtering", &update.position_properties.filtering)
            .build()
            .map_err(|e| TrackerClientError::BuildError(e.to_string()))
    }
}

#[async_trait]
impl TrackerClient for AwsLocationTrackerClient {
    async fn batch_update_device_position(
        &self,
        tracker_name: &str,
        updates: &[PositionUpdate],
    ) -> Result<BatchUpdateOutcome, TrackerClientError> {
        let sdk_updates = updates
            .iter()
            .map(Self::to_sdk_update)
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            tracker_name = %tracker_name,
            update_count = sdk_updates.len(),
            "BatchUpdateDevicePosition開始"
        );

        let response = self
            .client
            .batch_update_device_position()
            .tracker_name(tracker_name)
            .set_updates(Some(sdk_updates))
            .send()
            .await
            .map_err(|err| {
                warn!(
                    tracker_name = %tracker_name,
                    error = %err,
                    "BatchUpdateDevicePositionエラー"
                );
                TrackerClientError::AwsSdkError(err.to_string())
            })?;

        let failed = collect_failed_updates(response.errors());

        Ok(BatchUpdateOutcome {
            submitted: updates.len(),
            failed,
        })
    }
}

/// レスポンスのレコード単位エラーをFailedUpdateに変換
///
/// コードがない場合は"unknown"、メッセージがない場合は空文字とする。
pub fn collect_failed_updates(errors: &[BatchUpdateDevicePositionError]) -> Vec<FailedUpdate> {
    errors
        .iter()
        .map(|entry| FailedUpdate {
            device_id: entry.device_id().to_string(),
            code: entry
                .error()
                .and_then(|e| e.code())
                .map(|code| code.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            message: entry
                .error()
                .and_then(|e| e.message())
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

/// サンプル時刻文字列をSDKのタイムスタンプに変換
///
/// RFC 3339を優先し、オフセットのない`YYYY-MM-DDTHH:MM:SS[.fff]`はUTCとして扱う。
pub fn parse_sample_time(raw: &str) -> Result<DateTime, TrackerClientError> {
    let utc = chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
        })
        .map_err(|_| TrackerClientError::InvalidSampleTime(raw.to_string()))?;

    Ok(DateTime::from_secs_and_nanos(
        utc.timestamp(),
        utc.timestamp_subsec_nanos(),
    ))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::domain::{PositionAccuracy, PositionProperties};
    use aws_sdk_location::types::{BatchItemError, BatchItemErrorCode};
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    /// テスト用のモックトラッカー操作
    ///
    /// 呼び出しを記録し、次の呼び出しで返すエラーや拒否レコードを設定できる。
    #[derive(Debug, Clone, Default)]
    pub struct MockTrackerClient {
        /// 記録された呼び出し: (tracker_name, updates)
        calls: Arc<Mutex<Vec<(String, Vec<PositionUpdate>)>>>,
        /// 次の呼び出しで返すエラー
        next_error: Arc<Mutex<Option<TrackerClientError>>>,
        /// 次の呼び出しで拒否するレコード
        next_failures: Arc<Mutex<Vec<FailedUpdate>>>,
    }

    impl MockTrackerClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_next_error(&self, error: TrackerClientError) {
            *self.next_error.lock().unwrap() = Some(error);
        }

        pub fn reject_next(&self, failure: FailedUpdate) {
            self.next_failures.lock().unwrap().push(failure);
        }

        pub fn calls(&self) -> Vec<(String, Vec<PositionUpdate>)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TrackerClient for MockTrackerClient {
        async fn batch_update_device_position(
            &self,
            tracker_name: &str,
            updates: &[PositionUpdate],
        ) -> Result<BatchUpdateOutcome, TrackerClientError> {
            self.calls
                .lock()
                .unwrap()
                .push((tracker_name.to_string(), updates.to_vec()));

            if let Some(error) = self.next_error.lock().unwrap().take() {
                return Err(error);
            }

            let failed = std::mem::take(&mut *self.next_failures.lock().unwrap());
            Ok(BatchUpdateOutcome {
                submitted: updates.len(),
                failed,
            })
        }
    }

    fn sample_update(sample_time: &str) -> PositionUpdate {
        PositionUpdate {
            device_id: "ltgAj8Tjc".to_string(),
            sample_time: sample_time.to_string(),
            accuracy: PositionAccuracy { horizontal: 0.0 },
            position: [-94.55351482022044, 39.234025770276254],
            position_properties: PositionProperties {
                filtering: "Distance".to_string(),
            },
        }
    }

    // ==================== サンプル時刻変換テスト ====================

    #[test]
    fn test_parse_sample_time_naive_is_utc() {
        let parsed = parse_sample_time("2022-08-26T15:39:18").unwrap();
        let expected = Utc.with_ymd_and_hms(2022, 8, 26, 15, 39, 18).unwrap();

        assert_eq!(parsed.secs(), expected.timestamp());
        assert_eq!(parsed.subsec_nanos(), 0);
    }

    #[test]
    fn test_parse_sample_time_naive_with_fraction() {
        let parsed = parse_sample_time("2022-08-26T15:39:18.250").unwrap();
        let expected = Utc.with_ymd_and_hms(2022, 8, 26, 15, 39, 18).unwrap();

        assert_eq!(parsed.secs(), expected.timestamp());
        assert_eq!(parsed.subsec_nanos(), 250_000_000);
    }

    #[test]
    fn test_parse_sample_time_rfc3339_with_offset() {
        let parsed = parse_sample_time("2022-08-27T00:39:18+09:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2022, 8, 26, 15, 39, 18).unwrap();

        assert_eq!(parsed.secs(), expected.timestamp());
    }

    #[test]
    fn test_parse_sample_time_rfc3339_zulu() {
        let parsed = parse_sample_time("2022-08-26T15:39:18Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2022, 8, 26, 15, 39, 18).unwrap();

        assert_eq!(parsed.secs(), expected.timestamp());
    }

    #[test]
    fn test_parse_sample_time_invalid() {
        for raw in ["T", "", "2022-08-26", "yesterday"] {
            assert_eq!(
                parse_sample_time(raw).unwrap_err(),
                TrackerClientError::InvalidSampleTime(raw.to_string())
            );
        }
    }

    // ==================== SDK変換テスト ====================

    #[test]
    fn test_to_sdk_update_maps_fields() {
        let update = AwsLocationTrackerClient::to_sdk_update(&sample_update("2022-08-26T15:39:18"))
            .unwrap();

        assert_eq!(update.device_id(), "ltgAj8Tjc");
        assert_eq!(update.position(), &[-94.55351482022044, 39.234025770276254]);
        assert_eq!(update.accuracy().map(|a| a.horizontal()), Some(0.0));
        assert_eq!(
            update
                .position_properties()
                .and_then(|props| props.get("Filtering"))
                .map(String::as_str),
            Some("Distance")
        );
    }

    #[test]
    fn test_to_sdk_update_rejects_bad_sample_time() {
        let result = AwsLocationTrackerClient::to_sdk_update(&sample_update("T"));
        assert_eq!(
            result.unwrap_err(),
            TrackerClientError::InvalidSampleTime("T".to_string())
        );
    }

    // ==================== レコード単位エラー変換テスト ====================

    fn sdk_error_entry(device_id: &str, error: BatchItemError) -> BatchUpdateDevicePositionError {
        BatchUpdateDevicePositionError::builder()
            .device_id(device_id)
            .sample_time(DateTime::from_secs(1_661_528_358))
            .error(error)
            .build()
            .expect("required fields are set")
    }

    #[test]
    fn test_collect_failed_updates_empty() {
        assert!(collect_failed_updates(&[]).is_empty());
    }

    #[test]
    fn test_collect_failed_updates_maps_code_and_message() {
        let entries = vec![sdk_error_entry(
            "ltgAj8Tjc",
            BatchItemError::builder()
                .code(BatchItemErrorCode::from("ResourceNotFoundError"))
                .message("tracker not found")
                .build(),
        )];

        let failed = collect_failed_updates(&entries);

        assert_eq!(
            failed,
            vec![FailedUpdate {
                device_id: "ltgAj8Tjc".to_string(),
                code: "ResourceNotFoundError".to_string(),
                message: "tracker not found".to_string(),
            }]
        );
    }

    #[test]
    fn test_collect_failed_updates_without_code_uses_unknown() {
        let entries = vec![sdk_error_entry(
            "device-1",
            BatchItemError::builder().message("no code").build(),
        )];

        let failed = collect_failed_updates(&entries);

        assert_eq!(failed[0].code, "unknown");
        assert_eq!(failed[0].message, "no code");
    }

    #[test]
    fn test_collect_failed_updates_without_message_is_empty() {
        let entries = vec![sdk_error_entry(
            "device-2",
            BatchItemError::builder()
                .code(BatchItemErrorCode::from("ValidationError"))
                .build(),
        )];

        let failed = collect_failed_updates(&entries);

        assert_eq!(failed[0].device_id, "device-2");
        assert_eq!(failed[0].code, "ValidationError");
        assert_eq!(failed[0].message, "");
    }

    #[test]
    fn test_collect_failed_updates_keeps_entry_order() {
        let entries = vec![
            sdk_error_entry(
                "first",
                BatchItemError::builder()
                    .code(BatchItemErrorCode::from("ThrottlingError"))
                    .build(),
            ),
            sdk_error_entry(
                "second",
                BatchItemError::builder()
                    .code(BatchItemErrorCode::from("InternalServerError"))
                    .build(),
            ),
        ];

        let failed = collect_failed_updates(&entries);

        let device_ids: Vec<&str> = failed.iter().map(|f| f.device_id.as_str()).collect();
        assert_eq!(device_ids, vec!["first", "second"]);
        assert_eq!(failed[0].code, "ThrottlingError");
        assert_eq!(failed[1].code, "InternalServerError");
    }

    // ==================== 結果型テスト ====================

    #[test]
    fn test_outcome_without_failures_is_complete() {
        let outcome = BatchUpdateOutcome {
            submitted: 1,
            failed: Vec::new(),
        };
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_outcome_with_failures_is_not_complete() {
        let outcome = BatchUpdateOutcome {
            submitted: 1,
            failed: vec![FailedUpdate {
                device_id: "d".to_string(),
                code: "ValidationError".to_string(),
                message: "bad".to_string(),
            }],
        };
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            TrackerClientError::InvalidSampleTime("T".to_string()).to_string(),
            "invalid sample time: T"
        );
        assert_eq!(
            TrackerClientError::AwsSdkError("throttled".to_string()).to_string(),
            "AWS Location APIエラー: throttled"
        );
    }

    // ==================== モックテスト ====================

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = MockTrackerClient::new();
        let updates = vec![sample_update("2022-08-26T15:39:18")];

        let outcome = mock
            .batch_update_device_position("DistanceFilteringTracker", &updates)
            .await
            .unwrap();

        assert!(outcome.is_complete());
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.calls()[0].0, "DistanceFilteringTracker");
        assert_eq!(mock.calls()[0].1, updates);
    }

    #[tokio::test]
    async fn test_mock_returns_injected_error_once() {
        let mock = MockTrackerClient::new();
        mock.set_next_error(TrackerClientError::AwsSdkError("boom".to_string()));
        let updates = vec![sample_update("2022-08-26T15:39:18")];

        assert!(mock.batch_update_device_position("t", &updates).await.is_err());
        assert!(mock.batch_update_device_position("t", &updates).await.is_ok());
        assert_eq!(mock.call_count(), 2);
    }
}
