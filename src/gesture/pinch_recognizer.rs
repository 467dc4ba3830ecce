// LumosTouch ピンチ認識器
// 2本の指を近づける・遠ざける操作を認識する

use glam::Vec2;

use crate::gesture::config::PinchConfig;
use crate::gesture::recognizer::{GestureCore, GestureKind, GestureRecognizer, GestureState};
use crate::input::{find_contact_by_finger_id, TouchContact};

/// ピンチの進行方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchState {
    /// 2指間の距離が広がっている
    Growing,
    /// 2指間の距離が縮んでいる
    Shrinking,
    /// 指が動いていない
    Static,
    /// ピンチとして有効でない
    Invalid,
}

/// ピンチ認識器。
///
/// 2指間距離のフレーム間変化を累積し、しきい値を超えた時点で各指の
/// 累積移動方向が2指間の軸に沿っているかを検証する。開始後は許容偏差を
/// 緩め、回転と同時のピンチも受け付ける。`scale` は開始時の距離に対する
/// 現在距離の比
pub struct PinchRecognizer {
    core: GestureCore,
    finger_ids: [Option<u64>; 2],
    accumulated: [Vec2; 2],
    previous_positions: [Vec2; 2],
    accumulated_delta_length: f32,
    pinching: bool,
    original_distance: f32,
    scale: f32,
    delta_scale: f32,
    average_position: Vec2,
    idle_time: f64,
    static_time: f32,
    pinch_state: PinchState,
    movement_along_line_dot: f32,
    movement_along_line_dot_post_begin: f32,
    static_dead_zone: f32,
    min_delta_distance: f32,
    min_state_change_distance: f32,
    static_timeout: f32,
    idle_timeout: f32,
}

impl PinchRecognizer {
    pub fn new() -> Self {
        Self::with_config(&PinchConfig::default())
    }

    pub fn with_config(config: &PinchConfig) -> Self {
        Self {
            core: GestureCore::new(),
            finger_ids: [None; 2],
            accumulated: [Vec2::ZERO; 2],
            previous_positions: [Vec2::ZERO; 2],
            accumulated_delta_length: 0.0,
            pinching: false,
            original_distance: 0.0,
            scale: 1.0,
            delta_scale: 0.0,
            average_position: Vec2::ZERO,
            idle_time: 0.0,
            static_time: 0.0,
            pinch_state: PinchState::Invalid,
            movement_along_line_dot: config.movement_along_line_dot,
            movement_along_line_dot_post_begin: config.movement_along_line_dot_post_begin,
            static_dead_zone: config.static_dead_zone,
            min_delta_distance: config.min_delta_distance,
            min_state_change_distance: config.min_state_change_distance,
            static_timeout: config.static_timeout,
            idle_timeout: config.idle_timeout,
        }
    }

    /// ピンチが有効かどうか
    pub fn is_pinching(&self) -> bool {
        self.is_validated()
    }

    /// 開始時の2指間距離に対する現在距離の比
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// 前フレームからのスケール変化量。ピンチ中でなければ 0
    pub fn delta_scale(&self) -> f32 {
        if self.is_pinching() {
            self.delta_scale
        } else {
            0.0
        }
    }

    /// 現在のピンチ進行方向。ピンチ中でなければ Invalid
    pub fn pinch_state(&self) -> PinchState {
        if self.is_pinching() {
            self.pinch_state
        } else {
            PinchState::Invalid
        }
    }

    /// 広がる・縮むのどちらかが確定しているかどうか
    pub fn is_pinch_state_valid(&self) -> bool {
        self.is_pinching()
            && (self.pinch_state == PinchState::Growing
                || self.pinch_state == PinchState::Shrinking)
    }

    /// 最後に有効だったときの2本の指の平均位置
    pub fn average_position(&self) -> Vec2 {
        self.average_position
    }

    fn finger_ids_valid(&self) -> bool {
        self.finger_ids[0].is_some() && self.finger_ids[1].is_some()
    }

    fn resolve<'a>(&self, touches: &'a [TouchContact]) -> Option<[&'a TouchContact; 2]> {
        let first = find_contact_by_finger_id(self.finger_ids[0]?, touches)?;
        let second = find_contact_by_finger_id(self.finger_ids[1]?, touches)?;
        Some([first, second])
    }
}

/// 正規化した2ベクトルのドット積の絶対値で平行かどうかを判定する。
/// 向きの正負は問わない
fn are_vectors_parallel(line0: Vec2, line1: Vec2, dot_threshold: f32) -> bool {
    line0
        .normalize_or_zero()
        .dot(line1.normalize_or_zero())
        .abs()
        > dot_threshold
}

impl GestureRecognizer for PinchRecognizer {
    fn kind(&self) -> GestureKind {
        GestureKind::Pinch
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

        for (i, tc) in touches.iter().enumerate() {
            self.finger_ids[i] = Some(tc.finger_id);
            self.accumulated[i] = Vec2::ZERO;
            self.previous_positions[i] = tc.position;
        }

        self.original_distance = (touches[0].position - touches[1].position).length();
        self.accumulated_delta_length = 0.0;
        self.idle_time = self.core.now();
        self.static_time = 0.0;
        self.scale = 1.0;
        self.delta_scale = 0.0;
    }

    fn on_touch_released(&mut self, touches: &[TouchContact]) {
        let roster_ok = touches.len() == self.required_touch_count()
            && self.finger_ids_valid()
            && self.resolve(touches).is_some();

        if roster_ok {
            self.set_state(GestureState::Ended);
        } else {
            self.set_state(GestureState::Failed);
        }
    }

    fn on_touch_moved(&mut self, touches: &[TouchContact]) {
        let pair = if touches.len() != self.required_touch_count() {
            None
        } else if self.finger_ids_valid() {
            self.resolve(touches)
        } else {
            // 指が未割り当てならこのフレームの2本を採用する
            for (i, tc) in touches.iter().enumerate() {
                self.finger_ids[i] = Some(tc.finger_id);
                self.accumulated[i] = Vec2::ZERO;
                self.previous_positions[i] = tc.position;
            }
            self.idle_time = self.core.now();
            self.accumulated_delta_length = 0.0;
            Some([&touches[0], &touches[1]])
        };

        let mut failed = pair.is_none();

        if let Some(tc) = pair {
            let current_dir = tc[1].position - tc[0].position;
            let prev_dir = self.previous_positions[1] - self.previous_positions[0];

            self.accumulated[0] += tc[0].position - self.previous_positions[0];
            self.accumulated[1] += tc[1].position - self.previous_positions[1];

            self.previous_positions[0] = tc[0].position;
            self.previous_positions[1] = tc[1].position;

            let current_length = current_dir.length();
            let previous_length = prev_dir.length();
            let delta_length = current_length - previous_length;

            // ピンチの進行方向は1フレームの距離変化で判定する。十分大きな
            // 変化だけを採用し、小さいままタイムアウトしたら Static へ落とす
            if delta_length.abs() > self.min_state_change_distance
                && current_length > previous_length
            {
                self.static_time = 0.0;
                self.pinch_state = PinchState::Growing;
            } else if delta_length.abs() > self.min_state_change_distance
                && previous_length > current_length
            {
                self.static_time = 0.0;
                self.pinch_state = PinchState::Shrinking;
            } else if self.pinch_state != PinchState::Static {
                self.static_time += self.core.frame_seconds();
                if self.static_time > self.static_timeout {
                    self.pinch_state = PinchState::Static;
                }
            }

            // 距離変化を累積し、しきい値に達した時点で方向条件を検証する
            self.accumulated_delta_length += delta_length;

            let dead_zone_sq = self.static_dead_zone * self.static_dead_zone;
            let finger0_ok = self.accumulated[0].length_squared() > dead_zone_sq;
            let finger1_ok = self.accumulated[1].length_squared() > dead_zone_sq;

            if self.accumulated_delta_length.abs() > self.min_delta_distance
                && (finger0_ok || finger1_ok)
            {
                if self.core.state() == GestureState::Possible {
                    if !self.pinching {
                        // ここからピンチ開始。指は既に多少動いているので
                        // 基準距離を取り直す
                        self.static_time = 0.0;
                        self.scale = 1.0;
                        self.original_distance = current_length;
                        self.pinching = true;
                    }

                    failed |= finger0_ok
                        && !are_vectors_parallel(
                            prev_dir,
                            self.accumulated[0],
                            self.movement_along_line_dot,
                        );
                    failed |= finger1_ok
                        && !are_vectors_parallel(
                            prev_dir,
                            self.accumulated[1],
                            self.movement_along_line_dot,
                        );
                } else {
                    failed |= finger0_ok
                        && !are_vectors_parallel(
                            prev_dir,
                            self.accumulated[0],
                            self.movement_along_line_dot_post_begin,
                        );
                    failed |= finger1_ok
                        && !are_vectors_parallel(
                            prev_dir,
                            self.accumulated[1],
                            self.movement_along_line_dot_post_begin,
                        );
                }

                self.accumulated = [Vec2::ZERO; 2];
                self.accumulated_delta_length = 0.0;
                self.idle_time = self.core.now();
            } else {
                failed |= (self.core.now() - self.idle_time) as f32 > self.idle_timeout;
            }

            self.delta_scale = self.scale;
            self.scale = if self.original_distance > 0.0 {
                current_length / self.original_distance
            } else {
                1.0
            };
            self.delta_scale = self.scale - self.delta_scale;

            self.average_position = (tc[0].position + tc[1].position) * 0.5;

            if !self.pinching {
                self.pinch_state = PinchState::Invalid;
            }
        }

        if failed {
            self.set_state(GestureState::Failed);
        } else if self.core.state() == GestureState::Possible {
            if self.pinching {
                self.set_state(GestureState::Began);
            }
        } else {
            self.set_state(GestureState::Changed);
        }
    }

    fn on_reset(&mut self) {
        self.finger_ids = [None; 2];
        self.accumulated = [Vec2::ZERO; 2];
        self.previous_positions = [Vec2::ZERO; 2];

        if !self.pinching {
            self.delta_scale = 0.0;
            self.pinch_state = PinchState::Invalid;
        }

        self.pinching = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{FrameClock, TouchPhase};

    const FRAME: f32 = 1.0 / 60.0;

    fn clock(total: f64) -> FrameClock {
        FrameClock::new(total, FRAME)
    }

    fn moved(id: u64, pos: Vec2, prev: Vec2, start: Vec2) -> TouchContact {
        TouchContact::new(id, TouchPhase::Moved, pos, prev, start, 0.0)
    }

    /// 水平に置いた2本の指を毎フレーム step ずつ互いに離していく
    fn spread_fingers(
        pinch: &mut PinchRecognizer,
        start0: Vec2,
        start1: Vec2,
        step: f32,
        frames: usize,
    ) -> (Vec2, Vec2) {
        let touches = [
            TouchContact::began(1, start0, 0.0),
            TouchContact::began(2, start1, 0.0),
        ];
        pinch.update(&touches, clock(0.0));

        let mut p0 = start0;
        let mut p1 = start1;
        for frame in 1..=frames {
            let prev0 = p0;
            let prev1 = p1;
            p0 = start0 - Vec2::new(step * frame as f32, 0.0);
            p1 = start1 + Vec2::new(step * frame as f32, 0.0);
            pinch.update(
                &[moved(1, p0, prev0, start0), moved(2, p1, prev1, start1)],
                clock(frame as f64 * FRAME as f64),
            );
        }
        (p0, p1)
    }

    #[test]
    fn test_pinch_out_begins_and_grows() {
        let mut pinch = PinchRecognizer::new();
        let start0 = Vec2::new(100.0, 100.0);
        let start1 = Vec2::new(140.0, 100.0);

        // 毎フレーム両指が 6 ずつ離れる → 2フレーム目で累積距離変化 24、
        // 指ごとの移動量 12 がデッドゾーン 10 を超えて開始する
        spread_fingers(&mut pinch, start0, start1, 6.0, 2);

        assert!(pinch.is_pinching());
        assert_eq!(pinch.pinch_state(), PinchState::Growing);
        assert!(pinch.is_pinch_state_valid());
        assert_eq!(pinch.average_position(), Vec2::new(120.0, 100.0));

        // 開始時点の距離が基準になるので scale は 1 から始まる
        assert!((pinch.scale() - 1.0).abs() < 1e-5);

        // さらに広げると scale が 1 を超える
        let (p0, p1) = (Vec2::new(82.0, 100.0), Vec2::new(158.0, 100.0));
        pinch.update(
            &[
                moved(1, p0, Vec2::new(88.0, 100.0), start0),
                moved(2, p1, Vec2::new(152.0, 100.0), start1),
            ],
            clock(3.0 * FRAME as f64),
        );
        assert!(pinch.is_pinching());
        assert!(pinch.scale() > 1.0);
        assert!(pinch.delta_scale() > 0.0);
    }

    #[test]
    fn test_pinch_in_shrinks() {
        let mut pinch = PinchRecognizer::new();
        let start0 = Vec2::new(60.0, 200.0);
        let start1 = Vec2::new(260.0, 200.0);

        let touches = [
            TouchContact::began(1, start0, 0.0),
            TouchContact::began(2, start1, 0.0),
        ];
        pinch.update(&touches, clock(0.0));

        let mut p0 = start0;
        let mut p1 = start1;
        for frame in 1..=3 {
            let prev0 = p0;
            let prev1 = p1;
            p0 = start0 + Vec2::new(8.0 * frame as f32, 0.0);
            p1 = start1 - Vec2::new(8.0 * frame as f32, 0.0);
            pinch.update(
                &[moved(1, p0, prev0, start0), moved(2, p1, prev1, start1)],
                clock(frame as f64 * FRAME as f64),
            );
        }

        assert!(pinch.is_pinching());
        assert_eq!(pinch.pinch_state(), PinchState::Shrinking);
        assert!(pinch.scale() < 1.0);
    }

    #[test]
    fn test_pinch_ends_on_release() {
        let mut pinch = PinchRecognizer::new();
        let start0 = Vec2::new(100.0, 100.0);
        let start1 = Vec2::new(140.0, 100.0);

        let (p0, p1) = spread_fingers(&mut pinch, start0, start1, 6.0, 3);
        assert!(pinch.is_pinching());

        pinch.update(
            &[
                TouchContact::new(1, TouchPhase::Ended, p0, p0, start0, 0.0),
                TouchContact::new(2, TouchPhase::Stationary, p1, p1, start1, 0.0),
            ],
            clock(4.0 * FRAME as f64),
        );

        assert!(pinch.was_recognized());
        assert_eq!(pinch.state(), GestureState::Possible);
    }

    #[test]
    fn test_single_finger_never_pinches() {
        let mut pinch = PinchRecognizer::new();
        let start = Vec2::new(100.0, 100.0);

        pinch.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));

        let mut pos = start;
        for frame in 1..=5 {
            let prev = pos;
            pos = start + Vec2::new(12.0 * frame as f32, 0.0);
            pinch.update(&[moved(1, pos, prev, start)], clock(frame as f64 * FRAME as f64));
        }

        assert!(!pinch.is_pinching());
        assert_eq!(pinch.pinch_state(), PinchState::Invalid);
    }
}
