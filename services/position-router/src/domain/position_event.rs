/// 位置情報更新イベントのパース
///
/// Lambdaに渡されるJSONオブジェクトから、ルーティングに必要なフィールドを取り出す。
/// `accuracy`はAccuracyモードでのみ参照されるため、ここでは任意として扱う。
use serde_json::{Map, Value};
use thiserror::Error;

/// 位置情報イベントのパースエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionEventError {
    /// イベントがJSONオブジェクトでない
    #[error("position event must be a JSON object")]
    NotAnObject,
    /// 必須フィールドが欠落
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// フィールドの型が不正
    #[error("{field} must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// デバイスの座標
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// 1回の呼び出しで受け取る位置情報イベント
#[derive(Debug, Clone, PartialEq)]
pub struct PositionEvent {
    /// デバイスID
    pub device_id: String,
    /// フィルタリングモードの生の値（出力にそのままコピーされる）
    pub filtering: String,
    /// デバイスが報告した精度（メートル）。数値でない場合はNone
    pub accuracy: Option<f64>,
    /// 座標
    pub location: Location,
    /// サンプル時刻（ISO-8601文字列、変換しない）
    pub timestamp: String,
}

impl PositionEvent {
    /// JSON値からPositionEventを作成
    ///
    /// チェック内容:
    /// - `deviceId`, `filtering`, `timestamp`が文字列
    /// - `location.latitude`, `location.longitude`が数値
    pub fn from_value(value: &Value) -> Result<Self, PositionEventError> {
        let obj = value.as_object().ok_or(PositionEventError::NotAnObject)?;

        let filtering = required_str(obj, "filtering")?;
        let device_id = required_str(obj, "deviceId")?;
        let timestamp = required_str(obj, "timestamp")?;

        let location = obj
            .get("location")
            .ok_or(PositionEventError::MissingField("location"))?
            .as_object()
            .ok_or(PositionEventError::InvalidField {
                field: "location",
                expected: "an object",
            })?;

        let latitude = required_f64(location, "latitude", "location.latitude")?;
        let longitude = required_f64(location, "longitude", "location.longitude")?;

        // Distance/Timeモードでは参照されないため、欠落や型不正はここではエラーにしない
        let accuracy = obj.get("accuracy").and_then(Value::as_f64);

        Ok(Self {
            device_id: device_id.to_string(),
            filtering: filtering.to_string(),
            accuracy,
            location: Location {
                latitude,
                longitude,
            },
            timestamp: timestamp.to_string(),
        })
    }
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, PositionEventError> {
    obj.get(field)
        .ok_or(PositionEventError::MissingField(field))?
        .as_str()
        .ok_or(PositionEventError::InvalidField {
            field,
            expected: "a string",
        })
}

fn required_f64(
    obj: &Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<f64, PositionEventError> {
    obj.get(key)
        .ok_or(PositionEventError::MissingField(field))?
        .as_f64()
        .ok_or(PositionEventError::InvalidField {
            field,
            expected: "a number",
        })
}
