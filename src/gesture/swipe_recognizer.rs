// LumosTouch スワイプ認識器
// 1本指の素早い直線的な払い操作を認識する

use glam::Vec2;

use crate::gesture::config::SwipeConfig;
use crate::gesture::recognizer::{GestureCore, GestureKind, GestureRecognizer, GestureState};
use crate::input::{find_contact_by_finger_id, TouchContact};

/// スワイプ方向（8方位）。画面座標系で +Y が下方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl SwipeDirection {
    /// 上下方向の純粋なスワイプかどうか。速度係数の正規化軸の選択に使う
    fn is_vertical(self) -> bool {
        matches!(self, SwipeDirection::Up | SwipeDirection::Down)
    }
}

/// 方向ベクトルを8方位のいずれかへ丸める。`dir` は正規化済みであること。
/// `tolerance` は4方位判定の許容偏差で、0 で偏差なし、0.5 で約45度
pub fn classify_swipe_direction(dir: Vec2, tolerance: f32) -> Option<SwipeDirection> {
    // 4方位
    let min_cardinal_dot = (1.0 - tolerance).clamp(0.0, 1.0);

    if dir.dot(Vec2::X) >= min_cardinal_dot {
        return Some(SwipeDirection::Right);
    }
    if dir.dot(-Vec2::X) >= min_cardinal_dot {
        return Some(SwipeDirection::Left);
    }
    if dir.dot(Vec2::Y) >= min_cardinal_dot {
        return Some(SwipeDirection::Down);
    }
    if dir.dot(-Vec2::Y) >= min_cardinal_dot {
        return Some(SwipeDirection::Up);
    }

    // 斜め4方位
    let min_intercardinal_dot = 0.5;

    if dir.dot(Vec2::X) >= min_intercardinal_dot {
        if dir.dot(-Vec2::Y) >= min_intercardinal_dot {
            return Some(SwipeDirection::UpRight);
        }
        if dir.dot(Vec2::Y) >= min_intercardinal_dot {
            return Some(SwipeDirection::DownRight);
        }
    } else if dir.dot(-Vec2::X) >= min_intercardinal_dot {
        if dir.dot(-Vec2::Y) >= min_intercardinal_dot {
            return Some(SwipeDirection::UpLeft);
        }
        if dir.dot(Vec2::Y) >= min_intercardinal_dot {
            return Some(SwipeDirection::DownLeft);
        }
    }

    None
}

/// スワイプ認識器。
///
/// 速度と方向で検証される離散型ジェスチャー。フレームごとの移動量を
/// 保持して平均速度を計算し、基準点からの移動が `dead_zone` を超えた
/// 時点で方向を分類する。方向が変わる・速度が落ちる・静止が続くと
/// 失敗し、離脱時に総移動量と方向を再検証して認識する
pub struct SwipeRecognizer {
    core: GestureCore,
    touch_deltas: Vec<Vec2>,
    average_velocity: Vec2,
    finger_id: Option<u64>,
    dead_zone_idle_time: f64,
    ref_position: Vec2,
    initial_position: Vec2,
    direction: Option<SwipeDirection>,
    speed_factor: f32,
    dead_zone: f32,
    ref_point_change_threshold: f32,
    swipe_threshold: f32,
    idle_timeout: f32,
    classify_tolerance: f32,
    release_tolerance: f32,
    min_speed: f32,
    min_travel_factor: f32,
    max_travel_factor: f32,
    screen_size: Vec2,
}

impl SwipeRecognizer {
    pub fn new() -> Self {
        Self::with_config(&SwipeConfig::default())
    }

    pub fn with_config(config: &SwipeConfig) -> Self {
        Self {
            core: GestureCore::new(),
            touch_deltas: Vec::new(),
            average_velocity: Vec2::ZERO,
            finger_id: None,
            dead_zone_idle_time: 0.0,
            ref_position: Vec2::ZERO,
            initial_position: Vec2::ZERO,
            direction: None,
            speed_factor: 0.0,
            dead_zone: config.dead_zone,
            ref_point_change_threshold: config.ref_point_change_threshold,
            swipe_threshold: config.swipe_threshold,
            idle_timeout: config.idle_timeout,
            classify_tolerance: config.classify_tolerance,
            release_tolerance: config.release_tolerance,
            min_speed: config.min_speed,
            min_travel_factor: config.min_travel_factor,
            max_travel_factor: config.max_travel_factor,
            screen_size: Vec2::new(config.screen_width, config.screen_height),
        }
    }

    /// 速度係数の正規化に使う画面サイズを差し替える
    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen_size = Vec2::new(width, height);
    }

    /// 最後に分類されたスワイプ方向。有効なスワイプが無ければ None
    pub fn swipe_direction(&self) -> Option<SwipeDirection> {
        self.direction
    }

    /// このフレームでスワイプが完了したかどうか
    pub fn was_swiped(&self) -> bool {
        self.direction.is_some() && self.core.was_recognized
    }

    /// スワイプの勢いを 0〜1 に正規化した値。
    /// 画面サイズに対する移動割合から求め、認識時に確定する
    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    /// スワイプの起点（方向が分類された位置）
    pub fn initial_position(&self) -> Vec2 {
        self.initial_position
    }

    /// 追跡中の指が特定されているかどうか
    pub fn identified_finger(&self) -> bool {
        self.finger_id.is_some()
    }

    fn tracked_contact<'a>(&self, touches: &'a [TouchContact]) -> Option<&'a TouchContact> {
        if touches.len() != self.required_touch_count() {
            return None;
        }
        self.finger_id
            .and_then(|id| find_contact_by_finger_id(id, touches))
    }

    fn compute_speed_factor(&mut self) {
        // 平均速度を画面サイズに対する割合へ正規化する
        let mut travel_factor = self.average_velocity.length();

        travel_factor /= match self.direction {
            Some(direction) if direction.is_vertical() => self.screen_size.y,
            _ => self.screen_size.x,
        };

        let travel_factor = travel_factor.clamp(self.min_travel_factor, self.max_travel_factor);
        self.speed_factor = travel_factor / self.max_travel_factor;
    }
}

impl GestureRecognizer for SwipeRecognizer {
    fn kind(&self) -> GestureKind {
        GestureKind::Swipe
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
        self.ref_position = touches[0].position;
        self.initial_position = touches[0].position;
        self.dead_zone_idle_time = self.core.now();
    }

    fn on_touch_released(&mut self, touches: &[TouchContact]) {
        let mut failed = true;

        if let Some(tc) = self.tracked_contact(touches) {
            failed = false;
            failed |= self.direction.is_none();
            failed |= (tc.position - tc.start_position).length_squared()
                < self.swipe_threshold * self.swipe_threshold;

            // 最終的な平均速度の方向が分類済みの方向と一致していること
            if let Some(direction) = self.direction {
                failed |= Some(direction)
                    != classify_swipe_direction(
                        self.average_velocity.normalize_or_zero(),
                        self.release_tolerance,
                    );
            }
        }

        if failed {
            self.set_state(GestureState::Failed);
        } else {
            self.compute_speed_factor();
            self.set_state(GestureState::Recognized);
        }
    }

    fn on_touch_moved(&mut self, touches: &[TouchContact]) {
        let Some(tc) = self.tracked_contact(touches) else {
            self.set_state(GestureState::Failed);
            return;
        };

        let mut failed = false;

        if tc.delta_position() != Vec2::ZERO {
            self.touch_deltas.push(tc.delta_position());
        }

        let ref_delta = tc.position - self.ref_position;
        let ref_length_sq = ref_delta.length_squared();

        if ref_length_sq > self.dead_zone * self.dead_zone {
            // 現在の平均速度を計算する
            self.average_velocity = Vec2::ZERO;
            if !self.touch_deltas.is_empty() {
                let sum = self
                    .touch_deltas
                    .iter()
                    .fold(Vec2::ZERO, |acc, delta| acc + *delta);
                self.average_velocity = sum / self.touch_deltas.len() as f32;

                let elapsed = (self.core.now() - tc.start_time) as f32;
                if elapsed > 0.0 {
                    self.average_velocity /= elapsed;
                }
            }

            // 速度検査
            failed |= self.average_velocity.length_squared() < self.min_speed * self.min_speed;

            if !failed {
                match self.direction {
                    None => {
                        // まだ方向が無ければここで分類する
                        self.direction = classify_swipe_direction(
                            ref_delta.normalize_or_zero(),
                            self.classify_tolerance,
                        );
                        self.initial_position = tc.position;
                    }
                    Some(direction) => {
                        // 分類済みの方向から外れたら失敗
                        failed |= Some(direction)
                            != classify_swipe_direction(
                                ref_delta.normalize_or_zero(),
                                self.classify_tolerance,
                            );

                        if !failed
                            && ref_length_sq
                                > self.ref_point_change_threshold * self.ref_point_change_threshold
                        {
                            self.dead_zone_idle_time = self.core.now();
                            self.ref_position = tc.position;
                        }
                    }
                }
            }
        }

        // デッドゾーン内に留まりすぎたら失敗
        failed |= (self.core.now() - self.dead_zone_idle_time) as f32 > self.idle_timeout;

        if failed {
            // 同一フレームで認識と失敗が両立していたら実装の矛盾
            debug_assert!(!self.core.was_recognized);
            self.set_state(GestureState::Failed);
        }
    }

    fn on_reset(&mut self) {
        // 認識直後のフレームでは方向と速度係数を読めるよう残す
        if !self.core.was_recognized {
            self.speed_factor = 0.0;
            self.direction = None;
        }

        self.average_velocity = Vec2::ZERO;
        self.touch_deltas.clear();
        self.finger_id = None;
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

    /// 1フレームあたり step だけ右へ動くスワイプを frames フレーム分送る
    fn run_straight_swipe(swipe: &mut SwipeRecognizer, step: f32, frames: usize) -> Vec2 {
        let start = Vec2::new(100.0, 100.0);
        swipe.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));

        let mut pos = start;
        for frame in 1..=frames {
            let prev = pos;
            pos = start + Vec2::new(step * frame as f32, 0.0);
            swipe.update(
                &[TouchContact::new(1, TouchPhase::Moved, pos, prev, start, 0.0)],
                clock(frame as f64 * FRAME as f64),
            );
        }
        pos
    }

    #[test]
    fn test_classify_swipe_direction() {
        assert_eq!(
            classify_swipe_direction(Vec2::X, 0.2),
            Some(SwipeDirection::Right)
        );
        assert_eq!(
            classify_swipe_direction(-Vec2::Y, 0.2),
            Some(SwipeDirection::Up)
        );
        assert_eq!(
            classify_swipe_direction(Vec2::new(1.0, 1.0).normalize(), 0.2),
            Some(SwipeDirection::DownRight)
        );
        assert_eq!(
            classify_swipe_direction(Vec2::new(-1.0, -1.0).normalize(), 0.2),
            Some(SwipeDirection::UpLeft)
        );

        // 許容偏差を狭めると軸から外れた方向は丸められなくなる
        let leaning = Vec2::new(1.0, 0.36).normalize();
        assert_eq!(classify_swipe_direction(leaning, 0.05), None);
        assert_eq!(
            classify_swipe_direction(leaning, 0.2),
            Some(SwipeDirection::Right)
        );
    }

    #[test]
    fn test_fast_swipe_is_recognized() {
        let mut swipe = SwipeRecognizer::new();

        // 60fps で毎フレーム 12 単位 → 10 フレームで 120 単位移動
        let end = run_straight_swipe(&mut swipe, 12.0, 10);
        assert_eq!(swipe.swipe_direction(), Some(SwipeDirection::Right));
        assert_eq!(swipe.state(), GestureState::Possible);

        let release_time = 11.0 * FRAME as f64;
        swipe.update(
            &[TouchContact::new(
                1,
                TouchPhase::Ended,
                end,
                end,
                Vec2::new(100.0, 100.0),
                0.0,
            )],
            clock(release_time),
        );

        assert!(swipe.was_swiped());
        assert_eq!(swipe.swipe_direction(), Some(SwipeDirection::Right));
        assert!(swipe.speed_factor() > 0.0);
        assert!(swipe.speed_factor() <= 1.0);
    }

    #[test]
    fn test_short_swipe_fails_on_release() {
        let mut swipe = SwipeRecognizer::new();

        // 方向は分類されるが総移動量が 50 に届かない
        let end = run_straight_swipe(&mut swipe, 10.0, 4);
        assert_eq!(swipe.swipe_direction(), Some(SwipeDirection::Right));

        swipe.update(
            &[TouchContact::new(
                1,
                TouchPhase::Ended,
                end,
                end,
                Vec2::new(100.0, 100.0),
                0.0,
            )],
            clock(5.0 * FRAME as f64),
        );

        assert!(!swipe.was_swiped());
        assert!(!swipe.was_recognized());
    }

    #[test]
    fn test_direction_change_fails() {
        let mut swipe = SwipeRecognizer::new();
        let start = Vec2::new(100.0, 100.0);

        swipe.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));

        // 右へ進んで方向を確定させる
        let mut pos = start;
        for frame in 1..=3 {
            let prev = pos;
            pos = start + Vec2::new(12.0 * frame as f32, 0.0);
            swipe.update(
                &[TouchContact::new(1, TouchPhase::Moved, pos, prev, start, 0.0)],
                clock(frame as f64 * FRAME as f64),
            );
        }
        assert_eq!(swipe.swipe_direction(), Some(SwipeDirection::Right));

        // 急に下方向へ曲がると基準点からの方向が合わなくなり失敗する
        let prev = pos;
        let turned = pos + Vec2::new(0.0, 60.0);
        swipe.update(
            &[TouchContact::new(1, TouchPhase::Moved, turned, prev, start, 0.0)],
            clock(4.0 * FRAME as f64),
        );

        assert_eq!(swipe.state(), GestureState::Possible);
        assert!(swipe.swipe_direction().is_none());
        assert!(!swipe.identified_finger());
    }

    #[test]
    fn test_idle_in_dead_zone_fails() {
        let mut swipe = SwipeRecognizer::new();
        let start = Vec2::new(100.0, 100.0);

        swipe.update(&[TouchContact::began(1, start, 0.0)], clock(0.0));

        // デッドゾーン内で静止し続けると 0.25 秒で失敗する
        swipe.update(
            &[TouchContact::new(1, TouchPhase::Stationary, start, start, start, 0.0)],
            clock(0.3),
        );
        assert!(!swipe.identified_finger());
        assert_eq!(swipe.state(), GestureState::Possible);
    }
}
