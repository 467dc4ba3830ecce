// LumosTouch 入力モジュール
// 外部入力ソースから供給されるタッチ接点とフレーム時刻の型定義

//! 入力モジュール
//!
//! ジェスチャー認識エンジンへの入力となるデータ型を定義します。
//! 低レベルのタッチイベントポンプ自体はこのクレートの対象外で、
//! 組み込み側が毎フレーム [`TouchContact`] の配列と [`FrameClock`] を
//! 構築して [`crate::gesture::GestureManager::update`] に渡します。

pub mod touch;

pub use touch::{find_contact_by_finger_id, FrameClock, TouchContact, TouchPhase};
