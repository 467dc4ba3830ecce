// LumosTouch タップ認識器
// 1本指の短い接地と離脱をタップとして認識する

use glam::Vec2;

use crate::gesture::config::TapConfig;
use crate::gesture::recognizer::{GestureCore, GestureKind, GestureRecognizer, GestureState};
use crate::input::{find_contact_by_finger_id, TouchContact};

/// タップ認識器。
/// 接地点から `max_radius` 以内、`max_lifetime` 秒以内の離脱を
/// タップとして認識する
pub struct TapRecognizer {
    core: GestureCore,
    finger_id: Option<u64>,
    position: Vec2,
    max_radius: f32,
    max_lifetime: f32,
}

impl TapRecognizer {
    pub fn new() -> Self {
        Self::with_config(&TapConfig::default())
    }

    pub fn with_config(config: &TapConfig) -> Self {
        Self {
            core: GestureCore::new(),
            finger_id: None,
            position: Vec2::ZERO,
            max_radius: config.max_radius,
            max_lifetime: config.max_lifetime,
        }
    }

    /// タップが完了した位置。認識フレームの後も次のタップまで保持される
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// このフレームでタップが完了したかどうか
    pub fn was_tapped(&self) -> bool {
        self.core.was_recognized
    }

    /// タップの認識結果を消費する。
    /// 同じタップに複数のUI層が反応しないよう、消費した側が呼ぶ
    pub fn clear_was_tapped(&mut self) {
        self.core.was_activated = false;
        self.core.was_recognized = false;
        self.core.was_recently_recognized = false;
    }

    fn tracked_contact<'a>(&self, touches: &'a [TouchContact]) -> Option<&'a TouchContact> {
        self.finger_id
            .and_then(|id| find_contact_by_finger_id(id, touches))
    }
}

impl GestureRecognizer for TapRecognizer {
    fn kind(&self) -> GestureKind {
        GestureKind::Tap
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

        // 新しいタッチ列の開始で「直後」フラグを払う
        self.core.was_recently_recognized = false;
        self.core.time_since_recognized = 0.0;
    }

    fn on_touch_released(&mut self, touches: &[TouchContact]) {
        let mut recognized_at = None;

        if touches.len() == self.required_touch_count() {
            if let Some(tc) = self.tracked_contact(touches) {
                let drift = tc.position - tc.start_position;
                let lifetime = (self.core.now() - tc.start_time) as f32;

                if drift.length_squared() <= self.max_radius * self.max_radius
                    && lifetime <= self.max_lifetime
                {
                    recognized_at = Some(tc.position);
                }
            }
        }

        match recognized_at {
            Some(position) => {
                self.position = position;
                self.set_state(GestureState::Recognized);
            }
            None => self.set_state(GestureState::Failed),
        }
    }

    fn on_touch_moved(&mut self, touches: &[TouchContact]) {
        // 半径を超えた移動は離脱を待たずに失敗させる
        match self.tracked_contact(touches) {
            Some(tc)
                if (tc.position - tc.start_position).length_squared()
                    <= self.max_radius * self.max_radius => {}
            _ => self.set_state(GestureState::Failed),
        }
    }

    fn on_reset(&mut self) {
        self.finger_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{FrameClock, TouchPhase};

    fn clock(total: f64) -> FrameClock {
        FrameClock::new(total, 1.0 / 60.0)
    }

    fn contact(id: u64, phase: TouchPhase, pos: Vec2, prev: Vec2, start: Vec2, start_time: f64) -> TouchContact {
        TouchContact::new(id, phase, pos, prev, start, start_time)
    }

    #[test]
    fn test_tap_is_recognized() {
        let mut tap = TapRecognizer::new();
        let start = Vec2::new(100.0, 100.0);

        tap.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));
        assert_eq!(tap.state(), GestureState::Possible);

        let end = Vec2::new(105.0, 103.0);
        tap.update(
            &[contact(1, TouchPhase::Ended, end, start, start, 0.0)],
            clock(0.2),
        );

        assert!(tap.was_tapped());
        assert!(tap.was_recognized());
        assert_eq!(tap.position(), end);

        // フラグは認識フレームのみ
        tap.update(&[], clock(0.216));
        assert!(!tap.was_tapped());
        assert!(tap.was_recently_recognized());
    }

    #[test]
    fn test_tap_fails_on_drift() {
        let mut tap = TapRecognizer::new();
        let start = Vec2::new(100.0, 100.0);

        tap.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));

        // 半径20を超える移動で即失敗
        let moved = Vec2::new(130.0, 100.0);
        tap.update(
            &[contact(1, TouchPhase::Moved, moved, start, start, 0.0)],
            clock(0.05),
        );
        assert_eq!(tap.state(), GestureState::Possible);

        tap.update(
            &[contact(1, TouchPhase::Ended, start, moved, start, 0.0)],
            clock(0.1),
        );
        assert!(!tap.was_tapped());
    }

    #[test]
    fn test_tap_fails_on_lifetime() {
        let mut tap = TapRecognizer::new();
        let start = Vec2::new(50.0, 50.0);

        tap.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));

        // 0.6秒を超えてからの離脱は認識しない
        tap.update(
            &[contact(1, TouchPhase::Ended, start, start, start, 0.0)],
            clock(0.8),
        );
        assert!(!tap.was_tapped());
    }

    #[test]
    fn test_tap_fails_on_extra_fingers() {
        let mut tap = TapRecognizer::new();

        let touches = [
            TouchContact::began(1, Vec2::new(10.0, 10.0), 0.0),
            TouchContact::began(2, Vec2::new(40.0, 40.0), 0.0),
        ];
        tap.update(&touches, clock(0.0));
        assert_eq!(tap.state(), GestureState::Possible);
        assert!(!tap.is_validated());
    }

    #[test]
    fn test_clear_was_tapped() {
        let mut tap = TapRecognizer::new();
        let start = Vec2::new(10.0, 10.0);

        tap.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));
        tap.update(
            &[contact(1, TouchPhase::Ended, start, start, start, 0.0)],
            clock(0.1),
        );
        assert!(tap.was_tapped());

        tap.clear_was_tapped();
        assert!(!tap.was_tapped());
        assert!(!tap.was_recently_recognized());
    }
}
