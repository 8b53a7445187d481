// アプリケーション層モジュール
pub mod position_handler;

// 再エクスポート
pub use position_handler::{
    PositionHandled, PositionHandlerError, PositionUpdateHandler, plan_position_update,
};
