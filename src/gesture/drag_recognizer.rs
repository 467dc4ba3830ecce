// LumosTouch ドラッグ認識器
// 1本指の持続的な引きずり操作を認識する

use glam::Vec2;

use crate::gesture::config::DragConfig;
use crate::gesture::recognizer::{GestureCore, GestureKind, GestureRecognizer, GestureState};
use crate::input::{find_contact_by_finger_id, TouchContact};

/// ドラッグ認識器。
///
/// 接地中の移動量を累積し、`min_drag_distance` に達した時点で開始する。
/// 開始前に `idle_timeout` 秒動きが止まると失敗する。指が離れると
/// 終了し、開始前であれば失敗として扱う（終端遷移は常に1回だけ）
pub struct DragRecognizer {
    core: GestureCore,
    finger_id: Option<u64>,
    accumulated: Vec2,
    drag_position: Vec2,
    previous_drag_position: Vec2,
    last_activity_time: f64,
    min_drag_distance: f32,
    idle_timeout: f32,
}

impl DragRecognizer {
    pub fn new() -> Self {
        Self::with_config(&DragConfig::default())
    }

    pub fn with_config(config: &DragConfig) -> Self {
        Self {
            core: GestureCore::new(),
            finger_id: None,
            accumulated: Vec2::ZERO,
            drag_position: Vec2::ZERO,
            previous_drag_position: Vec2::ZERO,
            last_activity_time: 0.0,
            min_drag_distance: config.min_drag_distance,
            idle_timeout: config.idle_timeout,
        }
    }

    /// ドラッグが進行中かどうか
    pub fn is_dragging(&self) -> bool {
        matches!(
            self.core.state(),
            GestureState::Began | GestureState::Changed
        )
    }

    /// 現在のドラッグ位置
    pub fn drag_position(&self) -> Vec2 {
        self.drag_position
    }

    /// 前フレームのドラッグ位置
    pub fn previous_drag_position(&self) -> Vec2 {
        self.previous_drag_position
    }

    fn tracked_contact<'a>(&self, touches: &'a [TouchContact]) -> Option<&'a TouchContact> {
        self.finger_id
            .and_then(|id| find_contact_by_finger_id(id, touches))
    }
}

impl GestureRecognizer for DragRecognizer {
    fn kind(&self) -> GestureKind {
        GestureKind::Drag
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

        let tc = &touches[0];
        self.finger_id = Some(tc.finger_id);
        self.accumulated = Vec2::ZERO;
        self.drag_position = tc.position;
        self.previous_drag_position = tc.position;
        self.last_activity_time = self.core.now();
    }

    fn on_touch_released(&mut self, _touches: &[TouchContact]) {
        // 指本数が合わないフレームでも離脱は終端遷移を1回だけ起こす
        if self.is_dragging() {
            self.set_state(GestureState::Ended);
        } else {
            self.set_state(GestureState::Failed);
        }
    }

    fn on_touch_moved(&mut self, touches: &[TouchContact]) {
        let Some(tc) = self.tracked_contact(touches) else {
            self.set_state(GestureState::Failed);
            return;
        };

        self.previous_drag_position = self.drag_position;
        self.drag_position = tc.position;

        if self.core.state() == GestureState::Possible {
            self.accumulated += tc.delta_position();
            if tc.delta_position() != Vec2::ZERO {
                self.last_activity_time = self.core.now();
            }

            if self.accumulated.length_squared()
                >= self.min_drag_distance * self.min_drag_distance
            {
                self.set_state(GestureState::Began);
            } else if (self.core.now() - self.last_activity_time) as f32 > self.idle_timeout {
                self.set_state(GestureState::Failed);
            }
        } else {
            self.set_state(GestureState::Changed);
        }
    }

    fn on_reset(&mut self) {
        self.finger_id = None;
        self.accumulated = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{FrameClock, TouchPhase};

    fn clock(total: f64) -> FrameClock {
        FrameClock::new(total, 1.0 / 60.0)
    }

    fn moved(id: u64, pos: Vec2, prev: Vec2, start: Vec2) -> TouchContact {
        TouchContact::new(id, TouchPhase::Moved, pos, prev, start, 0.0)
    }

    #[test]
    fn test_drag_begins_after_threshold() {
        let mut drag = DragRecognizer::new();
        let start = Vec2::new(100.0, 100.0);

        drag.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));

        // 累積 8 単位ではまだ始まらない
        let p1 = Vec2::new(108.0, 100.0);
        drag.update(&[moved(1, p1, start, start)], clock(0.05));
        assert_eq!(drag.state(), GestureState::Possible);
        assert!(!drag.is_dragging());

        // 累積 16 単位で開始
        let p2 = Vec2::new(116.0, 100.0);
        drag.update(&[moved(1, p2, p1, start)], clock(0.1));
        assert_eq!(drag.state(), GestureState::Began);
        assert!(drag.was_activated());
        assert!(drag.is_dragging());
        assert_eq!(drag.drag_position(), p2);

        // 以降は Changed
        let p3 = Vec2::new(120.0, 104.0);
        drag.update(&[moved(1, p3, p2, start)], clock(0.15));
        assert_eq!(drag.state(), GestureState::Changed);
        assert_eq!(drag.previous_drag_position(), p2);
    }

    #[test]
    fn test_drag_release_single_terminal() {
        let mut drag = DragRecognizer::new();
        let start = Vec2::new(100.0, 100.0);

        drag.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));
        let p1 = Vec2::new(120.0, 100.0);
        drag.update(&[moved(1, p1, start, start)], clock(0.05));
        assert!(drag.is_dragging());

        drag.update(
            &[TouchContact::new(1, TouchPhase::Ended, p1, p1, start, 0.0)],
            clock(0.1),
        );
        // 進行中だったドラッグの離脱は Ended
        assert!(drag.was_recognized());
        assert_eq!(drag.state(), GestureState::Possible);

        // 開始前の離脱は Failed（認識フラグは立たない）
        drag.update(&[TouchContact::began(2, start, 0.2)], clock(0.2));
        drag.update(
            &[TouchContact::new(2, TouchPhase::Ended, start, start, start, 0.2)],
            clock(0.25),
        );
        assert!(!drag.was_recognized());
        assert_eq!(drag.state(), GestureState::Possible);
    }

    #[test]
    fn test_drag_fails_when_idle() {
        let mut drag = DragRecognizer::new();
        let start = Vec2::new(100.0, 100.0);

        drag.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));

        // 動かないまま 0.5 秒を超えると失敗
        drag.update(
            &[TouchContact::new(1, TouchPhase::Stationary, start, start, start, 0.0)],
            clock(0.6),
        );
        assert_eq!(drag.state(), GestureState::Possible);
        assert!(!drag.is_dragging());

        // 失敗後に動いても追跡は切れている
        let p1 = Vec2::new(130.0, 100.0);
        drag.update(&[moved(1, p1, start, start)], clock(0.65));
        assert!(!drag.is_dragging());
    }
}
