// LumosTouch 2本指ドラッグ認識器
// 2本の指が平行に動く引きずり操作を認識する

use glam::Vec2;

use crate::gesture::config::DoubleDragConfig;
use crate::gesture::recognizer::{
    moved_in_same_direction, GestureCore, GestureKind, GestureRecognizer, GestureState,
};
use crate::input::{find_contact_by_finger_id, TouchContact};

/// 2本指ドラッグ認識器。
///
/// どちらかの指の累積移動量がしきい値に達した時点で、2本の累積方向が
/// 平行（ドット積 > `parallel_dot`）であれば開始する。開始後は毎フレーム
/// の移動が平行である限り継続し、平行でなくなると `idle_timeout` 秒の
/// 猶予の後に終了する。開始時の平均移動方向が上下軸に沿っていれば
/// 縦方向ドラッグとして分類される
pub struct DoubleDragRecognizer {
    core: GestureCore,
    finger_ids: [Option<u64>; 2],
    accumulated: [Vec2; 2],
    average_position: Vec2,
    previous_average_position: Vec2,
    last_parallel_time: f64,
    vertical: bool,
    min_drag_distance: f32,
    parallel_dot: f32,
    vertical_dot: f32,
    idle_timeout: f32,
}

impl DoubleDragRecognizer {
    pub fn new() -> Self {
        Self::with_config(&DoubleDragConfig::default())
    }

    pub fn with_config(config: &DoubleDragConfig) -> Self {
        Self {
            core: GestureCore::new(),
            finger_ids: [None; 2],
            accumulated: [Vec2::ZERO; 2],
            average_position: Vec2::ZERO,
            previous_average_position: Vec2::ZERO,
            last_parallel_time: 0.0,
            vertical: false,
            min_drag_distance: config.min_drag_distance,
            parallel_dot: config.parallel_dot,
            vertical_dot: config.vertical_dot,
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

    /// 2本の指の現在の平均位置
    pub fn average_position(&self) -> Vec2 {
        self.average_position
    }

    /// 前フレームの平均位置
    pub fn previous_average_position(&self) -> Vec2 {
        self.previous_average_position
    }

    /// 縦方向のドラッグとして分類されたかどうか
    pub fn is_vertical_drag(&self) -> bool {
        self.vertical
    }

    fn finger_ids_valid(&self) -> bool {
        self.finger_ids[0].is_some() && self.finger_ids[1].is_some()
    }

    fn resolve<'a>(&self, touches: &'a [TouchContact]) -> Option<[&'a TouchContact; 2]> {
        let first = find_contact_by_finger_id(self.finger_ids[0]?, touches)?;
        let second = find_contact_by_finger_id(self.finger_ids[1]?, touches)?;
        Some([first, second])
    }

    fn adopt(&mut self, touches: &[TouchContact]) {
        self.finger_ids = [Some(touches[0].finger_id), Some(touches[1].finger_id)];
        self.accumulated = [Vec2::ZERO; 2];
        self.average_position = (touches[0].position + touches[1].position) * 0.5;
        self.previous_average_position = self.average_position;
        self.last_parallel_time = self.core.now();
    }
}

impl GestureRecognizer for DoubleDragRecognizer {
    fn kind(&self) -> GestureKind {
        GestureKind::DoubleDrag
    }

    fn required_touch_count(&self) -> usize {
        2
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

        self.adopt(touches);
    }

    fn on_touch_released(&mut self, touches: &[TouchContact]) {
        let roster_ok =
            touches.len() == self.required_touch_count() && self.resolve(touches).is_some();

        if roster_ok && self.is_dragging() {
            self.set_state(GestureState::Ended);
        } else {
            self.set_state(GestureState::Failed);
        }
    }

    fn on_touch_moved(&mut self, touches: &[TouchContact]) {
        if touches.len() != self.required_touch_count() {
            self.set_state(GestureState::Failed);
            return;
        }

        let pair = if self.finger_ids_valid() {
            match self.resolve(touches) {
                Some(pair) => pair,
                None => {
                    self.set_state(GestureState::Failed);
                    return;
                }
            }
        } else {
            // まだ指が割り当てられていなければこのフレームの2本を採用する
            self.adopt(touches);
            [&touches[0], &touches[1]]
        };

        let delta0 = pair[0].delta_position();
        let delta1 = pair[1].delta_position();
        let position0 = pair[0].position;
        let position1 = pair[1].position;
        let parallel_now = moved_in_same_direction(pair[0], pair[1], self.parallel_dot);

        self.previous_average_position = self.average_position;
        self.average_position = (position0 + position1) * 0.5;

        if self.core.state() == GestureState::Possible {
            self.accumulated[0] += delta0;
            self.accumulated[1] += delta1;

            let threshold = self.min_drag_distance * self.min_drag_distance;
            if self.accumulated[0].length_squared() >= threshold
                || self.accumulated[1].length_squared() >= threshold
            {
                let dir0 = self.accumulated[0].normalize_or_zero();
                let dir1 = self.accumulated[1].normalize_or_zero();

                if dir0 != Vec2::ZERO && dir1 != Vec2::ZERO && dir0.dot(dir1) > self.parallel_dot {
                    // 開始時の平均移動方向で縦横を分類する
                    let direction =
                        ((self.accumulated[0] + self.accumulated[1]) * 0.5).normalize_or_zero();
                    self.vertical = direction.dot(Vec2::Y).abs() > self.vertical_dot;

                    self.last_parallel_time = self.core.now();
                    self.set_state(GestureState::Began);
                } else {
                    self.set_state(GestureState::Failed);
                }
            }
        } else if parallel_now {
            self.last_parallel_time = self.core.now();
            self.set_state(GestureState::Changed);
        } else if (self.core.now() - self.last_parallel_time) as f32 > self.idle_timeout {
            self.set_state(GestureState::Ended);
        } else {
            // 猶予時間中は継続
            self.set_state(GestureState::Changed);
        }
    }

    fn on_reset(&mut self) {
        self.finger_ids = [None; 2];
        self.accumulated = [Vec2::ZERO; 2];
        self.vertical = false;
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

    fn press_two(recognizer: &mut DoubleDragRecognizer, p0: Vec2, p1: Vec2) {
        let touches = [
            TouchContact::began(1, p0, 0.0),
            TouchContact::began(2, p1, 0.0),
        ];
        recognizer.update(&touches, clock(0.0));
    }

    #[test]
    fn test_parallel_drag_begins() {
        let mut drag = DoubleDragRecognizer::new();
        let start0 = Vec2::new(100.0, 100.0);
        let start1 = Vec2::new(160.0, 100.0);

        press_two(&mut drag, start0, start1);
        assert_eq!(drag.state(), GestureState::Possible);

        // 両指が右へ 16 単位 → 平行に累積しきい値を超える
        let p0 = Vec2::new(116.0, 100.0);
        let p1 = Vec2::new(176.0, 100.0);
        drag.update(
            &[moved(1, p0, start0, start0), moved(2, p1, start1, start1)],
            clock(0.05),
        );
        assert_eq!(drag.state(), GestureState::Began);
        assert!(drag.is_dragging());
        assert!(!drag.is_vertical_drag());
        assert_eq!(drag.average_position(), Vec2::new(146.0, 100.0));

        // 平行に動き続ける限り Changed
        let q0 = Vec2::new(126.0, 100.0);
        let q1 = Vec2::new(186.0, 100.0);
        drag.update(&[moved(1, q0, p0, start0), moved(2, q1, p1, start1)], clock(0.1));
        assert_eq!(drag.state(), GestureState::Changed);
        assert_eq!(drag.previous_average_position(), Vec2::new(146.0, 100.0));
    }

    #[test]
    fn test_vertical_classification() {
        let mut drag = DoubleDragRecognizer::new();
        let start0 = Vec2::new(100.0, 100.0);
        let start1 = Vec2::new(160.0, 100.0);

        press_two(&mut drag, start0, start1);

        let p0 = Vec2::new(100.0, 120.0);
        let p1 = Vec2::new(160.0, 120.0);
        drag.update(
            &[moved(1, p0, start0, start0), moved(2, p1, start1, start1)],
            clock(0.05),
        );
        assert!(drag.is_dragging());
        assert!(drag.is_vertical_drag());
    }

    #[test]
    fn test_opposed_fingers_fail() {
        let mut drag = DoubleDragRecognizer::new();
        let start0 = Vec2::new(100.0, 100.0);
        let start1 = Vec2::new(160.0, 100.0);

        press_two(&mut drag, start0, start1);

        // 互いに離れる動きはピンチであってドラッグではない
        let p0 = Vec2::new(84.0, 100.0);
        let p1 = Vec2::new(176.0, 100.0);
        drag.update(
            &[moved(1, p0, start0, start0), moved(2, p1, start1, start1)],
            clock(0.05),
        );
        assert!(!drag.is_dragging());
        assert_eq!(drag.state(), GestureState::Possible);
    }

    #[test]
    fn test_grace_period_then_end() {
        let mut drag = DoubleDragRecognizer::new();
        let start0 = Vec2::new(100.0, 100.0);
        let start1 = Vec2::new(160.0, 100.0);

        press_two(&mut drag, start0, start1);

        let p0 = Vec2::new(116.0, 100.0);
        let p1 = Vec2::new(176.0, 100.0);
        drag.update(
            &[moved(1, p0, start0, start0), moved(2, p1, start1, start1)],
            clock(0.05),
        );
        assert!(drag.is_dragging());

        // 片方だけが動く（平行でない）フレームが続いても猶予内は継続
        let q0 = Vec2::new(120.0, 100.0);
        drag.update(
            &[
                moved(1, q0, p0, start0),
                TouchContact::new(2, TouchPhase::Stationary, p1, p1, start1, 0.0),
            ],
            clock(0.15),
        );
        assert_eq!(drag.state(), GestureState::Changed);

        // 猶予 0.25 秒を超えると終了
        drag.update(
            &[
                TouchContact::new(1, TouchPhase::Stationary, q0, q0, start0, 0.0),
                TouchContact::new(2, TouchPhase::Stationary, p1, p1, start1, 0.0),
            ],
            clock(0.4),
        );
        assert!(drag.was_recognized());
        assert!(!drag.is_dragging());
    }
}
