// LumosTouch ダブルタップ認識器
// 近い位置への2回の素早いタップを認識する

use glam::Vec2;

use crate::gesture::config::DoubleTapConfig;
use crate::gesture::recognizer::{GestureCore, GestureKind, GestureRecognizer, GestureState};
use crate::input::{find_contact_by_finger_id, TouchContact};

/// ダブルタップ認識器。
///
/// 1打目が有効なタップであれば「2打目待ち」に入る。2打目の離脱が
/// `max_gap_time` 以内かつ1打目から `max_drift` 以内なら認識する。
/// 待機フラグはリセットをまたいで保持され、猶予時間が過ぎたときだけ
/// 消える
pub struct DoubleTapRecognizer {
    core: GestureCore,
    finger_id: Option<u64>,
    waiting_for_second_tap: bool,
    last_release_time: f64,
    first_tap_position: Vec2,
    position: Vec2,
    max_radius: f32,
    max_lifetime: f32,
    max_gap_time: f32,
    max_drift: f32,
}

impl DoubleTapRecognizer {
    pub fn new() -> Self {
        Self::with_config(&DoubleTapConfig::default())
    }

    pub fn with_config(config: &DoubleTapConfig) -> Self {
        Self {
            core: GestureCore::new(),
            finger_id: None,
            waiting_for_second_tap: false,
            last_release_time: 0.0,
            first_tap_position: Vec2::ZERO,
            position: Vec2::ZERO,
            max_radius: config.max_radius,
            max_lifetime: config.max_lifetime,
            max_gap_time: config.max_gap_time,
            max_drift: config.max_drift,
        }
    }

    /// ダブルタップが完了した位置（2打目の離脱位置）
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// 2打目を待っている最中かどうか
    pub fn is_waiting_for_second_tap(&self) -> bool {
        self.waiting_for_second_tap
    }

    fn tracked_contact<'a>(&self, touches: &'a [TouchContact]) -> Option<&'a TouchContact> {
        self.finger_id
            .and_then(|id| find_contact_by_finger_id(id, touches))
    }

    /// 接点が単独の有効なタップかどうか
    fn is_valid_tap(&self, tc: &TouchContact) -> bool {
        let drift = tc.position - tc.start_position;
        let lifetime = (self.core.now() - tc.start_time) as f32;

        drift.length_squared() <= self.max_radius * self.max_radius && lifetime <= self.max_lifetime
    }
}

impl GestureRecognizer for DoubleTapRecognizer {
    fn kind(&self) -> GestureKind {
        GestureKind::DoubleTap
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
    }

    fn on_touch_released(&mut self, touches: &[TouchContact]) {
        let mut tapped = None;

        if touches.len() == self.required_touch_count() {
            if let Some(tc) = self.tracked_contact(touches) {
                if self.is_valid_tap(tc) {
                    tapped = Some(tc.position);
                }
            }
        }

        let Some(tap_position) = tapped else {
            self.set_state(GestureState::Failed);
            return;
        };

        let now = self.core.now();
        let within_gap = (now - self.last_release_time) as f32 <= self.max_gap_time;
        let within_drift = (tap_position - self.first_tap_position).length_squared()
            <= self.max_drift * self.max_drift;

        if self.waiting_for_second_tap && within_gap && within_drift {
            self.waiting_for_second_tap = false;
            self.position = tap_position;
            self.set_state(GestureState::Recognized);
        } else {
            // 新しい1打目として待機し直す
            self.waiting_for_second_tap = true;
            self.last_release_time = now;
            self.first_tap_position = tap_position;
            self.set_state(GestureState::Failed);
        }
    }

    fn on_touch_moved(&mut self, touches: &[TouchContact]) {
        match self.tracked_contact(touches) {
            Some(tc)
                if (tc.position - tc.start_position).length_squared()
                    <= self.max_radius * self.max_radius => {}
            _ => self.set_state(GestureState::Failed),
        }
    }

    fn on_reset(&mut self) {
        self.finger_id = None;

        // 猶予時間が過ぎた待機フラグだけを消す
        if self.waiting_for_second_tap
            && (self.core.now() - self.last_release_time) as f32 > self.max_gap_time
        {
            self.waiting_for_second_tap = false;
        }
    }
}
