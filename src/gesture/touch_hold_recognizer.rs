// LumosTouch 長押し認識器
// 1本指が動かずに接地し続けることを長押しとして認識する

use glam::Vec2;

use crate::gesture::config::TouchHoldConfig;
use crate::gesture::recognizer::{GestureCore, GestureKind, GestureRecognizer, GestureState};
use crate::input::{find_contact_by_finger_id, TouchContact};

/// 長押し認識器。
///
/// 指が離れた時点で失敗する継続型ジェスチャー。保持時間が
/// `trigger_hold_time` を超えても状態は `Changed` のままで、代わりに
/// 内部の成立フラグが立つ。呼び出し側は `was_held` を毎フレーム
/// 問い合わせる。`slight_hold_time` 経過時には一度だけ「軽い長押し」の
/// パルスが発火する
pub struct TouchHoldRecognizer {
    core: GestureCore,
    finger_id: Option<u64>,
    position: Vec2,
    held: bool,
    slight_hold_armed: bool,
    slight_hold_made: bool,
    drift_radius_limit: f32,
    trigger_hold_time: f32,
    slight_hold_time: f32,
}

impl TouchHoldRecognizer {
    pub fn new() -> Self {
        Self::with_config(&TouchHoldConfig::default())
    }

    pub fn with_config(config: &TouchHoldConfig) -> Self {
        Self {
            core: GestureCore::new(),
            finger_id: None,
            position: Vec2::ZERO,
            held: false,
            slight_hold_armed: false,
            slight_hold_made: false,
            drift_radius_limit: config.drift_radius_limit,
            trigger_hold_time: config.trigger_hold_time,
            slight_hold_time: config.slight_hold_time,
        }
    }

    /// 保持時間が `trigger_hold_time` を超えたかどうか。
    /// 指が離れるかドリフトで失敗するまで立ち続ける
    pub fn was_held(&self) -> bool {
        self.held
    }

    /// 「軽い長押し」が発火したフレームだけ true。
    /// 一度発火するとリセットまで再発火しない
    pub fn slight_hold_made(&self) -> bool {
        self.slight_hold_made
    }

    /// 現在の保持位置
    pub fn position(&self) -> Vec2 {
        self.position
    }

    fn tracked_contact<'a>(&self, touches: &'a [TouchContact]) -> Option<&'a TouchContact> {
        self.finger_id
            .and_then(|id| find_contact_by_finger_id(id, touches))
    }
}

impl GestureRecognizer for TouchHoldRecognizer {
    fn kind(&self) -> GestureKind {
        GestureKind::TouchHold
    }

    fn required_touch_count(&self) -> usize {
        1
    }

    fn core(&self) -> &GestureCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GestureCore {
        &mut self.core
    }

    fn on_touch_pressed(&mut self, touches: &[TouchContact]) {
        if touches.len() != self.required_touch_count() {
            self.set_state(GestureState::Failed);
            return;
        }

        self.finger_id = Some(touches[0].finger_id);
        self.position = touches[0].position;
        self.held = false;
        self.slight_hold_armed = true;
        self.slight_hold_made = false;
    }

    fn on_touch_released(&mut self, _touches: &[TouchContact]) {
        // 長押しは指が離れた時点で終わり。認識結果はフラグ側が持つ
        self.set_state(GestureState::Failed);
    }

    fn on_touch_moved(&mut self, touches: &[TouchContact]) {
        self.slight_hold_made = false;

        let Some(tc) = self.tracked_contact(touches) else {
            self.set_state(GestureState::Failed);
            return;
        };

        let drift = tc.position - tc.start_position;
        if drift.length_squared() > self.drift_radius_limit * self.drift_radius_limit {
            self.set_state(GestureState::Failed);
            return;
        }

        self.position = tc.position;

        let elapsed = (self.core.now() - tc.start_time) as f32;

        if self.slight_hold_armed && elapsed >= self.slight_hold_time {
            self.slight_hold_armed = false;
            self.slight_hold_made = true;
        }

        if elapsed >= self.trigger_hold_time {
            self.held = true;
        }

        if self.core.state() == GestureState::Possible {
            self.set_state(GestureState::Began);
        } else {
            self.set_state(GestureState::Changed);
        }
    }

    fn on_reset(&mut self) {
        self.finger_id = None;
        self.held = false;
        self.slight_hold_armed = false;
        self.slight_hold_made = false;
    }
}
