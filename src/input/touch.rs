// LumosTouch タッチ接点モデル
// 1本の指に対応するフレームごとのスナップショット

use glam::Vec2;

/// タッチ接点の遷移フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// このフレームで指が接地した
    Began,
    /// 前フレームから移動した
    Moved,
    /// 接地したまま動いていない
    Stationary,
    /// このフレームで指が離れた
    Ended,
}

/// 1本の指のフレームごとのスナップショット。
///
/// 指が接地している間、`finger_id` と `start_position` / `start_time` は
/// 変化しません。`previous_position` は常に前フレームの `position` と
/// 一致します。接点配列は各フレームで読み取り専用として全認識器に
/// 貸し出されます。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchContact {
    /// フレームをまたいで安定な指の識別子
    pub finger_id: u64,
    /// このフレームの遷移フェーズ
    pub phase: TouchPhase,
    /// 現在位置
    pub position: Vec2,
    /// 前フレームの位置
    pub previous_position: Vec2,
    /// 接地した位置
    pub start_position: Vec2,
    /// 接地した時刻（壁時計秒）
    pub start_time: f64,
}

impl TouchContact {
    pub fn new(
        finger_id: u64,
        phase: TouchPhase,
        position: Vec2,
        previous_position: Vec2,
        start_position: Vec2,
        start_time: f64,
    ) -> Self {
        Self {
            finger_id,
            phase,
            position,
            previous_position,
            start_position,
            start_time,
        }
    }

    /// 接地フレーム用の接点を作る。3つの位置は全て着地点になる
    pub fn began(finger_id: u64, position: Vec2, time: f64) -> Self {
        Self::new(finger_id, TouchPhase::Began, position, position, position, time)
    }

    /// 前フレームからの移動量
    pub fn delta_position(&self) -> Vec2 {
        self.position - self.previous_position
    }
}

/// 指IDから今フレームの接点を探す。
/// 認識器が記憶している指IDを今フレームの接点配列と再び結び付けるために
/// 全認識器から利用される
pub fn find_contact_by_finger_id(finger_id: u64, touches: &[TouchContact]) -> Option<&TouchContact> {
    touches.iter().find(|tc| tc.finger_id == finger_id)
}

/// フレーム時刻。外部の単調な壁時計から毎フレーム構築される
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    /// 壁時計の累積秒
    pub total_seconds: f64,
    /// 今フレームの経過秒
    pub frame_seconds: f32,
}

impl FrameClock {
    pub fn new(total_seconds: f64, frame_seconds: f32) -> Self {
        Self {
            total_seconds,
            frame_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_position() {
        let tc = TouchContact::new(
            1,
            TouchPhase::Moved,
            Vec2::new(110.0, 95.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 100.0),
            0.5,
        );
        assert_eq!(tc.delta_position(), Vec2::new(10.0, -5.0));
    }

    #[test]
    fn test_began_contact() {
        let tc = TouchContact::began(3, Vec2::new(50.0, 60.0), 1.25);
        assert_eq!(tc.phase, TouchPhase::Began);
        assert_eq!(tc.position, tc.start_position);
        assert_eq!(tc.position, tc.previous_position);
        assert_eq!(tc.delta_position(), Vec2::ZERO);
        assert_eq!(tc.start_time, 1.25);
    }

    #[test]
    fn test_find_contact_by_finger_id() {
        let touches = vec![
            TouchContact::began(1, Vec2::new(10.0, 10.0), 0.0),
            TouchContact::began(7, Vec2::new(20.0, 20.0), 0.0),
        ];

        assert_eq!(find_contact_by_finger_id(7, &touches).unwrap().finger_id, 7);
        assert!(find_contact_by_finger_id(2, &touches).is_none());
        assert!(find_contact_by_finger_id(1, &[]).is_none());
    }
}
