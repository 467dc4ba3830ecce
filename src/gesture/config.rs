// LumosTouch ジェスチャー設定
// 各認識器のしきい値とタイムアウトの管理と永続化

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 設定モジュールのエラー型
#[derive(Error, Debug)]
pub enum GestureConfigError {
    /// I/Oエラー
    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    /// JSON解析エラー
    #[error("JSON解析エラー: {0}")]
    Parse(#[from] serde_json::Error),

    /// 不正な設定値
    #[error("不正な設定値: {0}")]
    InvalidValue(String),
}

/// タップ認識の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// 接地点からの許容半径
    pub max_radius: f32,
    /// 接地から離脱までの許容時間（秒）
    pub max_lifetime: f32,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            max_radius: 20.0,
            max_lifetime: 0.6,
        }
    }
}

/// ダブルタップ認識の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleTapConfig {
    /// 1タップ自体の許容半径（タップと同じ基準）
    pub max_radius: f32,
    /// 1タップ自体の許容時間（秒）
    pub max_lifetime: f32,
    /// 1打目の離脱から2打目の離脱までの許容時間（秒）
    pub max_gap_time: f32,
    /// 1打目の位置から2打目までの許容距離
    pub max_drift: f32,
}

impl Default for DoubleTapConfig {
    fn default() -> Self {
        Self {
            max_radius: 20.0,
            max_lifetime: 0.6,
            max_gap_time: 0.5,
            max_drift: 50.0,
        }
    }
}

/// 長押し認識の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchHoldConfig {
    /// 接地点からの許容ドリフト半径
    pub drift_radius_limit: f32,
    /// 長押し成立までの保持時間（秒）
    pub trigger_hold_time: f32,
    /// 「軽い長押し」が発火するまでの保持時間（秒）
    pub slight_hold_time: f32,
}

impl Default for TouchHoldConfig {
    fn default() -> Self {
        Self {
            drift_radius_limit: 20.0,
            trigger_hold_time: 0.75,
            slight_hold_time: 0.15,
        }
    }
}

/// ドラッグ認識の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// ドラッグ開始に必要な累積移動量
    pub min_drag_distance: f32,
    /// 開始前に静止していられる時間（秒）
    pub idle_timeout: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            min_drag_distance: 15.0,
            idle_timeout: 0.5,
        }
    }
}

/// 2本指ドラッグ認識の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleDragConfig {
    /// ドラッグ開始に必要な累積移動量（どちらかの指が超えればよい）
    pub min_drag_distance: f32,
    /// 2本の指が平行とみなされるドット積のしきい値
    pub parallel_dot: f32,
    /// 縦方向ドラッグと分類するドット積のしきい値（上方向軸との比較）
    pub vertical_dot: f32,
    /// 平行でなくなってから終了までの猶予時間（秒）
    pub idle_timeout: f32,
}

impl Default for DoubleDragConfig {
    fn default() -> Self {
        Self {
            min_drag_distance: 15.0,
            parallel_dot: 0.9,
            vertical_dot: 0.8,
            idle_timeout: 0.25,
        }
    }
}

/// スワイプ認識の設定。
///
/// 正しく動作させるには dead_zone < ref_point_change_threshold <
/// swipe_threshold の関係を保つこと
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    /// 方向判定を始める基準点からの距離
    pub dead_zone: f32,
    /// 基準点を現在位置へ進める距離
    pub ref_point_change_threshold: f32,
    /// スワイプ成立に必要な総移動距離
    pub swipe_threshold: f32,
    /// デッドゾーン内で静止していられる時間（秒）
    pub idle_timeout: f32,
    /// 移動中の方向判定の許容偏差。0 で偏差なし、0.5 で約45度
    pub classify_tolerance: f32,
    /// 離脱時に平均速度方向を再検証する際の許容偏差。
    /// 斜め成分を含む払いを離脱時に弾きすぎないよう、移動中の判定より緩い
    pub release_tolerance: f32,
    /// スワイプとみなす最低速度（単位/秒）
    pub min_speed: f32,
    /// 速度係数が最小になる画面比の移動量
    pub min_travel_factor: f32,
    /// 速度係数が最大になる画面比の移動量
    pub max_travel_factor: f32,
    /// 速度係数の正規化に使う画面サイズ
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            dead_zone: 15.0,
            ref_point_change_threshold: 35.0,
            swipe_threshold: 50.0,
            idle_timeout: 0.25,
            classify_tolerance: 0.2,
            release_tolerance: 0.6,
            min_speed: 10.0,
            min_travel_factor: 0.01,
            max_travel_factor: 0.25,
            screen_width: 1280.0,
            screen_height: 800.0,
        }
    }
}

/// ピンチ認識の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    /// 指の移動が2指間の軸に沿っているとみなすドット積のしきい値
    pub movement_along_line_dot: f32,
    /// ピンチ開始後の緩和されたしきい値。回転との同時操作を許容する
    pub movement_along_line_dot_post_begin: f32,
    /// 指ごとの移動量がこの半径を超えるまでは静止扱い
    pub static_dead_zone: f32,
    /// 失敗判定を行うまでに必要な2指間距離の累積変化量
    pub min_delta_distance: f32,
    /// ピンチ方向を切り替える1フレームの距離変化量
    pub min_state_change_distance: f32,
    /// 距離変化が小さいまま Static 状態へ落ちるまでの時間（秒）
    pub static_timeout: f32,
    /// 指が動かないままピンチが失敗するまでの時間（秒）
    pub idle_timeout: f32,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            movement_along_line_dot: 0.75,
            movement_along_line_dot_post_begin: 0.6,
            static_dead_zone: 10.0,
            min_delta_distance: 8.0,
            min_state_change_distance: 2.0,
            static_timeout: 0.125,
            idle_timeout: 0.5,
        }
    }
}

/// 回転認識の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateConfig {
    /// 2本の指が逆方向とみなされるドット積のしきい値。
    /// -1 で完全な逆方向のみ。-1 から 0 の間に保つこと
    pub opposite_dot: f32,
    /// 回転継続とみなす最小回転量（度）
    pub min_rotation_degrees: f32,
    /// 回転開始に必要な累積回転量（度）
    pub min_initial_rotation_degrees: f32,
    /// 回転が止まってから終了までの時間（秒）
    pub no_rotation_timeout: f32,
    /// 出力回転量に掛ける係数
    pub rotation_gain: f32,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            opposite_dot: -0.8,
            min_rotation_degrees: 2.5,
            min_initial_rotation_degrees: 5.0,
            no_rotation_timeout: 0.25,
            rotation_gain: 1.75,
        }
    }
}

/// 全認識器の設定をまとめたもの
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub tap: TapConfig,
    pub double_tap: DoubleTapConfig,
    pub touch_hold: TouchHoldConfig,
    pub drag: DragConfig,
    pub double_drag: DoubleDragConfig,
    pub swipe: SwipeConfig,
    pub pinch: PinchConfig,
    pub rotate: RotateConfig,
}

impl GestureConfig {
    /// 設定値の整合性を検証する
    pub fn validate(&self) -> Result<(), GestureConfigError> {
        fn positive(name: &str, value: f32) -> Result<(), GestureConfigError> {
            if value > 0.0 {
                Ok(())
            } else {
                Err(GestureConfigError::InvalidValue(format!(
                    "{} は正の値でなければなりません: {}",
                    name, value
                )))
            }
        }

        fn dot_range(name: &str, value: f32) -> Result<(), GestureConfigError> {
            if (-1.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(GestureConfigError::InvalidValue(format!(
                    "{} は -1 から 1 の範囲でなければなりません: {}",
                    name, value
                )))
            }
        }

        positive("tap.max_radius", self.tap.max_radius)?;
        positive("tap.max_lifetime", self.tap.max_lifetime)?;

        positive("double_tap.max_radius", self.double_tap.max_radius)?;
        positive("double_tap.max_lifetime", self.double_tap.max_lifetime)?;
        positive("double_tap.max_gap_time", self.double_tap.max_gap_time)?;
        positive("double_tap.max_drift", self.double_tap.max_drift)?;

        positive("touch_hold.drift_radius_limit", self.touch_hold.drift_radius_limit)?;
        positive("touch_hold.trigger_hold_time", self.touch_hold.trigger_hold_time)?;
        positive("touch_hold.slight_hold_time", self.touch_hold.slight_hold_time)?;

        positive("drag.min_drag_distance", self.drag.min_drag_distance)?;
        positive("drag.idle_timeout", self.drag.idle_timeout)?;

        positive("double_drag.min_drag_distance", self.double_drag.min_drag_distance)?;
        dot_range("double_drag.parallel_dot", self.double_drag.parallel_dot)?;
        dot_range("double_drag.vertical_dot", self.double_drag.vertical_dot)?;
        positive("double_drag.idle_timeout", self.double_drag.idle_timeout)?;

        positive("swipe.dead_zone", self.swipe.dead_zone)?;
        positive(
            "swipe.ref_point_change_threshold",
            self.swipe.ref_point_change_threshold,
        )?;
        positive("swipe.swipe_threshold", self.swipe.swipe_threshold)?;
        positive("swipe.idle_timeout", self.swipe.idle_timeout)?;
        positive("swipe.min_speed", self.swipe.min_speed)?;
        positive("swipe.min_travel_factor", self.swipe.min_travel_factor)?;
        positive("swipe.max_travel_factor", self.swipe.max_travel_factor)?;
        positive("swipe.screen_width", self.swipe.screen_width)?;
        positive("swipe.screen_height", self.swipe.screen_height)?;

        if self.swipe.dead_zone >= self.swipe.ref_point_change_threshold
            || self.swipe.ref_point_change_threshold >= self.swipe.swipe_threshold
        {
            return Err(GestureConfigError::InvalidValue(
                "swipe は dead_zone < ref_point_change_threshold < swipe_threshold を満たす必要があります"
                    .to_string(),
            ));
        }

        dot_range("pinch.movement_along_line_dot", self.pinch.movement_along_line_dot)?;
        dot_range(
            "pinch.movement_along_line_dot_post_begin",
            self.pinch.movement_along_line_dot_post_begin,
        )?;
        positive("pinch.static_dead_zone", self.pinch.static_dead_zone)?;
        positive("pinch.min_delta_distance", self.pinch.min_delta_distance)?;
        positive(
            "pinch.min_state_change_distance",
            self.pinch.min_state_change_distance,
        )?;
        positive("pinch.static_timeout", self.pinch.static_timeout)?;
        positive("pinch.idle_timeout", self.pinch.idle_timeout)?;

        if !(-1.0..=0.0).contains(&self.rotate.opposite_dot) {
            return Err(GestureConfigError::InvalidValue(format!(
                "rotate.opposite_dot は -1 から 0 の範囲でなければなりません: {}",
                self.rotate.opposite_dot
            )));
        }
        positive("rotate.min_rotation_degrees", self.rotate.min_rotation_degrees)?;
        positive(
            "rotate.min_initial_rotation_degrees",
            self.rotate.min_initial_rotation_degrees,
        )?;
        positive("rotate.no_rotation_timeout", self.rotate.no_rotation_timeout)?;
        positive("rotate.rotation_gain", self.rotate.rotation_gain)?;

        Ok(())
    }

    /// JSONファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GestureConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// JSONファイルへ設定を保存する
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GestureConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
