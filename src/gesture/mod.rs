// LumosTouch ジェスチャー認識モジュール
// タッチ接点列から各種ジェスチャーを検出する機能を提供します

//! ジェスチャー認識モジュール
//!
//! このモジュールはタッチ接点列からジェスチャーを認識する機能を提供します。
//! 複数の認識器が毎フレーム同じ接点配列を受け取り、それぞれが独立した
//! 状態機械として自分のジェスチャーパターンを検出します。
//! [`GestureManager`] が全認識器を所有し、同じ2本の指で同時に成立し得る
//! 継続型ジェスチャー（ドラッグ・2本指ドラッグ・ピンチ・回転）の調停を
//! 行います。

pub mod config;
pub mod recognizer;
pub mod tap_recognizer;
pub mod double_tap_recognizer;
pub mod touch_hold_recognizer;
pub mod drag_recognizer;
pub mod double_drag_recognizer;
pub mod swipe_recognizer;
pub mod pinch_recognizer;
pub mod rotate_recognizer;

// 主要な型の再エクスポート
pub use config::{GestureConfig, GestureConfigError};
pub use recognizer::{
    average_position, moved_in_opposite_direction, moved_in_same_direction, signed_angle,
    GestureCore, GestureKind, GestureRecognizer, GestureState,
};
pub use tap_recognizer::TapRecognizer;
pub use double_tap_recognizer::DoubleTapRecognizer;
pub use touch_hold_recognizer::TouchHoldRecognizer;
pub use drag_recognizer::DragRecognizer;
pub use double_drag_recognizer::DoubleDragRecognizer;
pub use swipe_recognizer::{classify_swipe_direction, SwipeDirection, SwipeRecognizer};
pub use pinch_recognizer::{PinchRecognizer, PinchState};
pub use rotate_recognizer::RotateRecognizer;

use log::debug;

use crate::input::{FrameClock, TouchContact};

/// 調停キューの対象になる継続型ジェスチャー（固定順）
const CONTINUOUS_KINDS: [GestureKind; 4] = [
    GestureKind::Drag,
    GestureKind::DoubleDrag,
    GestureKind::Pinch,
    GestureKind::Rotate,
];

/// 全認識器を所有するジェスチャーマネージャー。
///
/// 入力ソース1つにつき1個だけ構築し、値として持ち回る。毎フレーム
/// [`GestureManager::update`] に同じ接点配列を渡すと、全認識器を固定順で
/// 更新した後に継続型ジェスチャーの調停キューを整える。キューは有効化の
/// 古い順で、[`GestureManager::get_active_gesture`] が先頭から走査して
/// 競合相手に先を越されたジェスチャーへのアクセスを抑止する
pub struct GestureManager {
    tap: TapRecognizer,
    double_tap: DoubleTapRecognizer,
    touch_hold: TouchHoldRecognizer,
    drag: DragRecognizer,
    double_drag: DoubleDragRecognizer,
    swipe: SwipeRecognizer,
    pinch: PinchRecognizer,
    rotate: RotateRecognizer,
    active_queue: Vec<GestureKind>,
}

impl GestureManager {
    /// 既定の設定でマネージャーを作成
    pub fn new() -> Self {
        Self::with_config(&GestureConfig::default())
    }

    /// 設定を指定してマネージャーを作成
    pub fn with_config(config: &GestureConfig) -> Self {
        Self {
            tap: TapRecognizer::with_config(&config.tap),
            double_tap: DoubleTapRecognizer::with_config(&config.double_tap),
            touch_hold: TouchHoldRecognizer::with_config(&config.touch_hold),
            drag: DragRecognizer::with_config(&config.drag),
            double_drag: DoubleDragRecognizer::with_config(&config.double_drag),
            swipe: SwipeRecognizer::with_config(&config.swipe),
            pinch: PinchRecognizer::with_config(&config.pinch),
            rotate: RotateRecognizer::with_config(&config.rotate),
            active_queue: Vec::with_capacity(CONTINUOUS_KINDS.len()),
        }
    }

    /// 毎フレームの更新。
    /// キューの整備は全認識器の更新が終わった後でなければならない
    pub fn update(&mut self, touches: &[TouchContact], clock: FrameClock) {
        self.tap.update(touches, clock);
        self.double_tap.update(touches, clock);
        self.touch_hold.update(touches, clock);
        self.drag.update(touches, clock);
        self.double_drag.update(touches, clock);
        self.swipe.update(touches, clock);
        self.pinch.update(touches, clock);
        self.rotate.update(touches, clock);

        self.maintain_active_queue();
    }

    /// 有効でなくなった項目を取り除き、新たに有効化した継続型ジェスチャーを
    /// 末尾へ加える
    fn maintain_active_queue(&mut self) {
        let mut queue = std::mem::take(&mut self.active_queue);

        queue.retain(|kind| {
            let keep = self.recognizer(*kind).is_validated();
            if !keep {
                debug!("継続ジェスチャーをキューから除去: {:?}", kind);
            }
            keep
        });

        for kind in CONTINUOUS_KINDS {
            if self.recognizer(kind).is_validated() && !queue.contains(&kind) {
                debug!("継続ジェスチャーをキューへ追加: {:?}", kind);
                queue.push(kind);
            }
        }

        self.active_queue = queue;
    }

    /// 種類から認識器インスタンスを引く固定テーブル
    pub fn recognizer(&self, kind: GestureKind) -> &dyn GestureRecognizer {
        match kind {
            GestureKind::Tap => &self.tap,
            GestureKind::DoubleTap => &self.double_tap,
            GestureKind::TouchHold => &self.touch_hold,
            GestureKind::Drag => &self.drag,
            GestureKind::DoubleDrag => &self.double_drag,
            GestureKind::Swipe => &self.swipe,
            GestureKind::Pinch => &self.pinch,
            GestureKind::Rotate => &self.rotate,
        }
    }

    /// 指定した種類のジェスチャーが今アクティブであれば返す。
    ///
    /// 離散型はキューを介さず、認識器が有効かどうかだけで答える。
    /// 継続型はキューを先頭（最も古く有効化したもの）から走査し、
    /// `kind` より先に `excluded` のいずれかが現れたら None を返す。
    /// 「ピンチや回転が先に成立しているなら、これをドラッグとして
    /// 扱ってよいか」という問い合わせに使う
    pub fn get_active_gesture(
        &self,
        kind: GestureKind,
        excluded: &[GestureKind],
    ) -> Option<&dyn GestureRecognizer> {
        if !kind.is_continuous() {
            let recognizer = self.recognizer(kind);
            return recognizer.is_validated().then_some(recognizer);
        }

        for queued in &self.active_queue {
            if *queued == kind {
                return Some(self.recognizer(kind));
            }
            if excluded.contains(queued) {
                // 先に有効化した競合ジェスチャーが勝つ
                return None;
            }
        }

        None
    }

    /// 認識器のジェスチャー種類を返す
    pub fn gesture_kind_of(&self, recognizer: &dyn GestureRecognizer) -> GestureKind {
        recognizer.kind()
    }

    /// 調停キューの現在の中身（有効化の古い順）
    pub fn active_gesture_kinds(&self) -> &[GestureKind] {
        &self.active_queue
    }

    /// すべての認識器をリセット
    pub fn reset_all(&mut self) {
        self.tap.reset();
        self.double_tap.reset();
        self.touch_hold.reset();
        self.drag.reset();
        self.double_drag.reset();
        self.swipe.reset();
        self.pinch.reset();
        self.rotate.reset();
        self.active_queue.clear();
    }

    pub fn tap(&self) -> &TapRecognizer {
        &self.tap
    }

    pub fn tap_mut(&mut self) -> &mut TapRecognizer {
        &mut self.tap
    }

    pub fn double_tap(&self) -> &DoubleTapRecognizer {
        &self.double_tap
    }

    pub fn touch_hold(&self) -> &TouchHoldRecognizer {
        &self.touch_hold
    }

    pub fn drag(&self) -> &DragRecognizer {
        &self.drag
    }

    pub fn double_drag(&self) -> &DoubleDragRecognizer {
        &self.double_drag
    }

    pub fn swipe(&self) -> &SwipeRecognizer {
        &self.swipe
    }

    pub fn swipe_mut(&mut self) -> &mut SwipeRecognizer {
        &mut self.swipe
    }

    pub fn pinch(&self) -> &PinchRecognizer {
        &self.pinch
    }

    pub fn rotate(&self) -> &RotateRecognizer {
        &self.rotate
    }
}

impl Default for GestureManager {
    fn default() -> Self {
        Self::new()
    }
}
