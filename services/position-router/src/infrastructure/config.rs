/// トラッカー名設定
///
/// フィルタリングモードごとの登録先トラッカー名を環境変数から読み込む。
/// 未設定の場合は既定のトラッカー名を使用する。
use thiserror::Error;

use crate::domain::{FilteringMode, TrackerNames};

/// Distanceモードのトラッカー名を上書きする環境変数
pub const DISTANCE_TRACKER_ENV: &str = "DISTANCE_TRACKER_NAME";
/// Timeモードのトラッカー名を上書きする環境変数
pub const TIME_TRACKER_ENV: &str = "TIME_TRACKER_NAME";
/// Accuracyモードのトラッカー名を上書きする環境変数
pub const ACCURACY_TRACKER_ENV: &str = "ACCURACY_TRACKER_NAME";

/// トラッカー設定のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerConfigError {
    #[error("Environment variable is empty: {0}")]
    EmptyValue(String),
}

/// トラッカー設定
///
/// 以下の環境変数から読み込む（すべて任意）:
/// - DISTANCE_TRACKER_NAME: 既定値 "DistanceFilteringTracker"
/// - TIME_TRACKER_NAME: 既定値 "TimeFilteringTracker"
/// - ACCURACY_TRACKER_NAME: 既定値 "AccuracyFilteringTracker"
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerConfig {
    tracker_names: TrackerNames,
}

impl TrackerConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # エラー
    /// 環境変数が設定されているが空白のみの場合はエラーを返す
    pub fn from_env() -> Result<Self, TrackerConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TrackerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |key: &str, mode: FilteringMode| -> Result<String, TrackerConfigError> {
            match lookup(key) {
                Some(value) if value.trim().is_empty() => {
                    Err(TrackerConfigError::EmptyValue(key.to_string()))
                }
                Some(value) => Ok(value.trim().to_string()),
                None => Ok(mode.default_tracker_name().to_string()),
            }
        };

        let distance = resolve(DISTANCE_TRACKER_ENV, FilteringMode::Distance)?;
        let time = resolve(TIME_TRACKER_ENV, FilteringMode::Time)?;
        let accuracy = resolve(ACCURACY_TRACKER_ENV, FilteringMode::Accuracy)?;

        Ok(Self {
            tracker_names: TrackerNames::new(distance, time, accuracy),
        })
    }

    /// 明示的な値で設定を作成（テスト用）
    pub fn new(tracker_names: TrackerNames) -> Self {
        Self { tracker_names }
    }

    /// トラッカー名のマッピングを取得
    pub fn tracker_names(&self) -> &TrackerNames {
        &self.tracker_names
    }
}
