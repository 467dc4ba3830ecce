// LumosTouch ジェスチャー状態機械
// 全認識器が共有する状態遷移・フラグ管理と幾何ヘルパー関数

use glam::Vec2;
use log::trace;

use crate::input::{FrameClock, TouchContact, TouchPhase};

/// 離散ジェスチャーの認識完了後、「直後」フラグが残る猶予時間（秒）
pub(crate) const RECENTLY_RECOGNIZED_TIMEOUT: f32 = 0.5;

/// ジェスチャー種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Tap,
    DoubleTap,
    TouchHold,
    Drag,
    DoubleDrag,
    Swipe,
    Pinch,
    Rotate,
}

impl GestureKind {
    /// 継続型（Began → Changed → Ended と遷移する）ジェスチャーかどうか。
    /// 継続型だけがマネージャーの調停キューに入る
    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            GestureKind::Drag | GestureKind::DoubleDrag | GestureKind::Pinch | GestureKind::Rotate
        )
    }
}

/// ジェスチャー状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureState {
    /// ジェスチャーが成立し得る初期状態
    Possible,

    /// 継続型ジェスチャーの開始・変化・終了
    Began,
    Changed,
    Ended,

    /// 離散型ジェスチャー（タップ等）の完了。開始も終了もなく、ただ起きる
    Recognized,

    /// 検証に失敗した。認識器は Possible へ戻る
    Failed,
}

impl GestureState {
    /// この状態でタッチイベントを受け付けるかどうか。
    /// Ended / Recognized / Failed は一時的な状態で、次のフレームには
    /// Possible へ戻っている
    fn accepts_events(self) -> bool {
        matches!(
            self,
            GestureState::Possible | GestureState::Began | GestureState::Changed
        )
    }
}

impl Default for GestureState {
    fn default() -> Self {
        GestureState::Possible
    }
}

/// 各認識器が1つずつ所有する共通の状態機械データ
#[derive(Debug, Clone, Default)]
pub struct GestureCore {
    pub(crate) state: GestureState,
    pub(crate) prev_state: GestureState,
    pub(crate) was_activated: bool,
    pub(crate) was_recognized: bool,
    pub(crate) was_recently_recognized: bool,
    pub(crate) time_since_recognized: f32,
    pub(crate) clock: FrameClock,
}

impl GestureCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn prev_state(&self) -> GestureState {
        self.prev_state
    }

    /// 現フレームの壁時計秒
    pub fn now(&self) -> f64 {
        self.clock.total_seconds
    }

    /// 現フレームの経過秒
    pub fn frame_seconds(&self) -> f32 {
        self.clock.frame_seconds
    }
}

/// 全認識器が実装するトレイト。
///
/// 必須のコールバックは4つ（`on_touch_pressed` / `on_touch_released` /
/// `on_touch_moved` と指本数の申告）。状態遷移とフラグ管理は提供メソッド
/// （`update` / `set_state` / `reset`）が一手に引き受けるので、各認識器は
/// 自分の検証条件の下で `set_state` を呼ぶことだけに責任を持つ
pub trait GestureRecognizer {
    /// この認識器が検出するジェスチャー種類
    fn kind(&self) -> GestureKind;

    /// 認識に必要な指の本数（認識器ごとに固定）
    fn required_touch_count(&self) -> usize;

    fn core(&self) -> &GestureCore;
    fn core_mut(&mut self) -> &mut GestureCore;

    fn on_touch_pressed(&mut self, touches: &[TouchContact]);
    fn on_touch_released(&mut self, touches: &[TouchContact]);
    fn on_touch_moved(&mut self, touches: &[TouchContact]);

    /// Possible へ戻る際の後処理。追跡中の指やバッファを初期状態に戻す
    fn on_reset(&mut self) {}

    /// Began / Changed / Ended / Recognized への遷移直後に呼ばれる。
    /// 平均位置などの派生量を更新するためのフック
    fn on_recognized(&mut self) {}

    /// 毎フレームの更新。
    ///
    /// 同一フレームで指の離脱と別の指の着地が両方起こり得る（指の持ち替え）
    /// ため、released → pressed → moved の固定順で配送し、moved の処理が
    /// 最新の指構成を見られるようにする
    fn update(&mut self, touches: &[TouchContact], clock: FrameClock) {
        {
            let core = self.core_mut();
            core.was_activated = false;
            core.was_recognized = false;
            core.clock = clock;
        }

        let mut did_begin = false;
        let mut did_end = false;
        let mut did_move = false;

        for touch in touches {
            did_begin |= touch.phase == TouchPhase::Began;
            did_end |= touch.phase == TouchPhase::Ended;
            did_move |= touch.phase == TouchPhase::Moved || touch.phase == TouchPhase::Stationary;
        }

        if self.core().state.accepts_events() {
            if did_end {
                self.on_touch_released(touches);
            }
            if did_begin {
                self.on_touch_pressed(touches);
            }
            if did_move {
                self.on_touch_moved(touches);
            }
        }

        // 接点が無いフレーム、または最後の1本が離れたフレームでは必ず
        // Possible へ戻す（必要指本数が2以上の認識器も含めて）
        if touches.is_empty() || (did_end && touches.len() == 1) {
            self.reset();
        }

        if self.core().state != GestureState::Recognized && self.core().was_recently_recognized {
            let core = self.core_mut();
            core.time_since_recognized += clock.frame_seconds;
            if core.time_since_recognized > RECENTLY_RECOGNIZED_TIMEOUT {
                core.was_recently_recognized = false;
            }
        }
    }

    /// 状態遷移。遷移先に応じたフラグ操作と再計算フックの呼び出しを行う
    fn set_state(&mut self, next: GestureState) {
        {
            let core = self.core_mut();
            core.prev_state = core.state;
            core.state = next;

            if next != GestureState::Recognized && core.prev_state == GestureState::Recognized {
                core.was_recently_recognized = true;
            }
        }

        trace!("{:?}: {:?} -> {:?}", self.kind(), self.core().prev_state, next);

        match next {
            // 継続型ジェスチャー
            GestureState::Began => {
                self.core_mut().was_activated = true;
                self.on_recognized();
            }

            GestureState::Changed => {
                self.on_recognized();
            }

            GestureState::Ended => {
                self.core_mut().was_recognized = true;
                self.on_recognized();
                self.reset();
            }

            // 離散型ジェスチャー
            GestureState::Recognized => {
                {
                    let core = self.core_mut();
                    core.was_activated = true;
                    core.was_recognized = true;
                    core.was_recently_recognized = false;
                    core.time_since_recognized = 0.0;
                }
                self.on_recognized();
                self.reset();
            }

            // 全種別共通
            GestureState::Failed => {
                self.reset();
            }

            GestureState::Possible => {}
        }
    }

    /// Possible へ戻す。Recognized から離れる場合は「直後」フラグを立てる
    fn reset(&mut self) {
        {
            let core = self.core_mut();
            core.prev_state = core.state;
            core.state = GestureState::Possible;

            if core.prev_state == GestureState::Recognized {
                core.was_recently_recognized = true;
            }
        }
        self.on_reset();
    }

    fn state(&self) -> GestureState {
        self.core().state
    }

    fn prev_state(&self) -> GestureState {
        self.core().prev_state
    }

    /// ジェスチャーが有効化した最初のフレームだけ true。
    /// 毎フレーム冒頭で基底側がクリアするので、各認識器は条件が満たされた
    /// ときに立てることだけを考えればよい
    fn was_activated(&self) -> bool {
        self.core().was_activated
    }

    /// ジェスチャーが完了した最初のフレームだけ true
    fn was_recognized(&self) -> bool {
        self.core().was_recognized
    }

    /// 離散ジェスチャーの認識後、短い猶予時間だけ残るフラグ。
    /// 1フレーム遅れて反応する依存ロジックのための窓
    fn was_recently_recognized(&self) -> bool {
        self.core().was_recently_recognized
    }

    fn time_since_recognized(&self) -> f32 {
        self.core().time_since_recognized
    }

    /// 有効化から次のリセットまでの間 true。
    /// あるタッチ列が既に特定のジェスチャーとして認識されているとき、
    /// 他のジェスチャーが自分の有効化を抑止できるようにするための問い合わせ
    fn is_validated(&self) -> bool {
        self.core().state == GestureState::Began
            || self.core().state == GestureState::Changed
            || self.core().was_activated
            || self.core().was_recognized
    }
}

/// 2本の指が概ね同じ方向へ動いているかどうか。
/// どちらかが静止しているときは false
pub fn moved_in_same_direction(tc0: &TouchContact, tc1: &TouchContact, max_dot: f32) -> bool {
    if tc0.delta_position() != Vec2::ZERO && tc1.delta_position() != Vec2::ZERO {
        let delta0 = tc0.delta_position().normalize_or_zero();
        let delta1 = tc1.delta_position().normalize_or_zero();
        return delta0.dot(delta1) > max_dot;
    }
    false
}

/// 2本の指が概ね逆方向へ動いているかどうか。
/// 片方でも静止している指があれば逆方向とはみなさない
pub fn moved_in_opposite_direction(tc0: &TouchContact, tc1: &TouchContact, min_dot: f32) -> bool {
    if tc0.delta_position() == Vec2::ZERO || tc1.delta_position() == Vec2::ZERO {
        return false;
    }

    let delta0 = tc0.delta_position().normalize_or_zero();
    let delta1 = tc1.delta_position().normalize_or_zero();
    delta0.dot(delta1) < min_dot
}

/// `from` から `to` への符号付き角度（ラジアン）。同一ベクトルなら 0
pub fn signed_angle(from: Vec2, to: Vec2) -> f32 {
    if from == to {
        return 0.0;
    }
    // 垂直ドット積
    let perp_dot = from.x * to.y - from.y * to.x;
    perp_dot.atan2(from.dot(to))
}

/// 全接点の平均位置。接点が無ければ原点
pub fn average_position(touches: &[TouchContact]) -> Vec2 {
    if touches.is_empty() {
        return Vec2::ZERO;
    }

    let sum = touches
        .iter()
        .fold(Vec2::ZERO, |acc, tc| acc + tc.position);
    sum / touches.len() as f32
}
