// LumosTouch マルチタッチジェスチャー認識エンジン
// タッチ接点列を離散・継続ジェスチャーイベントへ変換するライブラリ

//! # LumosTouch
//!
//! マルチタッチ入力のためのジェスチャー認識エンジンです。
//!
//! 外部の入力ソースが毎フレーム供給する [`TouchContact`] の配列を、
//! 独立した有限状態機械である各認識器が消費し、タップ・ダブルタップ・
//! 長押し・ドラッグ・2本指ドラッグ・スワイプ・ピンチ・回転を検出します。
//! [`gesture::GestureManager`] が全認識器を所有して毎フレーム更新し、
//! 同じ指で同時に成立し得る継続型ジェスチャーの調停を行います。
//!
//! ```
//! use glam::Vec2;
//! use lumos_touch::gesture::GestureManager;
//! use lumos_touch::input::{FrameClock, TouchContact, TouchPhase};
//!
//! let mut manager = GestureManager::new();
//!
//! // 接地フレーム
//! let touches = [TouchContact::began(1, Vec2::new(100.0, 100.0), 0.0)];
//! manager.update(&touches, FrameClock::new(0.0, 1.0 / 60.0));
//!
//! // 離脱フレーム → タップとして認識される
//! let touches = [TouchContact::new(
//!     1,
//!     TouchPhase::Ended,
//!     Vec2::new(102.0, 101.0),
//!     Vec2::new(100.0, 100.0),
//!     Vec2::new(100.0, 100.0),
//!     0.0,
//! )];
//! manager.update(&touches, FrameClock::new(0.1, 1.0 / 60.0));
//!
//! assert!(manager.tap().was_tapped());
//! ```

pub mod gesture;
pub mod input;

pub use gesture::{GestureKind, GestureManager, GestureRecognizer, GestureState};
pub use input::{FrameClock, TouchContact, TouchPhase};
