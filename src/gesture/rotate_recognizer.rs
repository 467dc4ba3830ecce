// LumosTouch 回転認識器
// 2本の指をねじる操作を認識する

use glam::Vec2;

use crate::gesture::config::RotateConfig;
use crate::gesture::recognizer::{
    moved_in_opposite_direction, signed_angle, GestureCore, GestureKind, GestureRecognizer,
    GestureState,
};
use crate::input::{find_contact_by_finger_id, TouchContact};

/// 回転認識器。
///
/// 2本の指が概ね逆方向に動きながら、2指間の軸の符号付き角度変化が
/// `min_initial_rotation` を超えた時点で開始する。以降は角度変化を
/// 累積し、回転量が `min_rotation` を下回ったまま `no_rotation_timeout`
/// 秒経過すると終了する。出力には固定の係数が掛かる
pub struct RotateRecognizer {
    core: GestureCore,
    finger_ids: [Option<u64>; 2],
    rotation_delta: f32,
    accumulated_rotation: f32,
    min_rotation_last_time: f64,
    min_rotation_delta: f32,
    average_position: Vec2,
    opposite_dot: f32,
    min_rotation: f32,
    min_initial_rotation: f32,
    no_rotation_timeout: f32,
    rotation_gain: f32,
}

impl RotateRecognizer {
    pub fn new() -> Self {
        Self::with_config(&RotateConfig::default())
    }

    pub fn with_config(config: &RotateConfig) -> Self {
        Self {
            core: GestureCore::new(),
            finger_ids: [None; 2],
            rotation_delta: 0.0,
            accumulated_rotation: 0.0,
            min_rotation_last_time: 0.0,
            min_rotation_delta: 0.0,
            average_position: Vec2::ZERO,
            opposite_dot: config.opposite_dot,
            min_rotation: config.min_rotation_degrees.to_radians(),
            min_initial_rotation: config.min_initial_rotation_degrees.to_radians(),
            no_rotation_timeout: config.no_rotation_timeout,
            rotation_gain: config.rotation_gain,
        }
    }

    /// ジェスチャー開始からの総回転量（ラジアン）
    pub fn total_rotation(&self) -> f32 {
        self.accumulated_rotation * self.rotation_gain
    }

    /// ジェスチャー開始からの総回転量（度）
    pub fn total_rotation_degrees(&self) -> f32 {
        self.total_rotation().to_degrees()
    }

    /// 前回の移動からの回転量（ラジアン）
    pub fn rotation_delta(&self) -> f32 {
        self.rotation_delta * self.rotation_gain
    }

    /// 前回の移動からの回転量（度）
    pub fn rotation_delta_degrees(&self) -> f32 {
        self.rotation_delta().to_degrees()
    }

    /// 回転が進行中で両方の指が接地しているかどうか。
    /// 片方の指が離れるとジェスチャー全体が有効でも回転中ではなくなる
    pub fn is_rotating(&self) -> bool {
        matches!(
            self.core.state(),
            GestureState::Began | GestureState::Changed
        )
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

/// 基準ベクトルから現在ベクトルへの符号付き角度
fn signed_angular_gap(dir: Vec2, ref_dir: Vec2) -> f32 {
    signed_angle(ref_dir.normalize_or_zero(), dir.normalize_or_zero())
}

impl GestureRecognizer for RotateRecognizer {
    fn kind(&self) -> GestureKind {
        GestureKind::Rotate
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
        }
    }

    fn on_touch_released(&mut self, touches: &[TouchContact]) {
        if touches.len() != self.required_touch_count() || !self.finger_ids_valid() {
            self.set_state(GestureState::Failed);
            return;
        }

        self.set_state(GestureState::Ended);
    }

    fn on_touch_moved(&mut self, touches: &[TouchContact]) {
        if touches.len() != self.required_touch_count() {
            self.set_state(GestureState::Failed);
            return;
        }

        let tc = if self.finger_ids_valid() {
            match self.resolve(touches) {
                Some(pair) => pair,
                None => {
                    self.set_state(GestureState::Failed);
                    return;
                }
            }
        } else {
            // まだ指が割り当てられていなければこのフレームの2本を採用する
            for (i, contact) in touches.iter().enumerate() {
                self.finger_ids[i] = Some(contact.finger_id);
            }
            [&touches[0], &touches[1]]
        };

        let current_dir = tc[0].position - tc[1].position;
        let previous_dir = tc[0].previous_position - tc[1].previous_position;

        if self.core.state() == GestureState::Possible {
            // 指が逆方向に動いている間だけ、開始条件の回転量を累積する
            if moved_in_opposite_direction(tc[0], tc[1], self.opposite_dot) {
                let rotation = signed_angular_gap(current_dir, previous_dir);
                self.min_rotation_delta += rotation;

                if self.min_rotation_delta.abs() >= self.min_initial_rotation {
                    self.min_rotation_delta = 0.0;
                    self.min_rotation_last_time = self.core.now();
                    self.average_position = (tc[0].position + tc[1].position) * 0.5;
                    self.set_state(GestureState::Began);
                }
            }
        } else {
            let mut ended = false;

            self.rotation_delta = signed_angular_gap(current_dir, previous_dir);
            self.accumulated_rotation += self.rotation_delta;
            self.min_rotation_delta += self.rotation_delta;

            self.average_position = (tc[0].position + tc[1].position) * 0.5;

            // 回転が遅すぎる状態が続いたらジェスチャーを終える
            if self.min_rotation_delta.abs() < self.min_rotation {
                ended = (self.core.now() - self.min_rotation_last_time) as f32
                    >= self.no_rotation_timeout;
            } else {
                self.min_rotation_last_time = self.core.now();
                self.min_rotation_delta = 0.0;
            }

            if ended {
                self.set_state(GestureState::Ended);
            } else {
                self.set_state(GestureState::Changed);
            }
        }
    }

    fn on_reset(&mut self) {
        self.finger_ids = [None; 2];
        self.min_rotation_last_time = 0.0;
        self.min_rotation_delta = 0.0;
        self.rotation_delta = 0.0;
        self.accumulated_rotation = 0.0;
    }
}
