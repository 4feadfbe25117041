//! 세션 이벤트 — 표시 레이어로 전달되는 알림.

use serde::Serialize;

use crate::models::caption::CaptionResult;

/// 세션이 표시 레이어로 브로드캐스트하는 이벤트
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// 활동 로그 한 줄 추가
    Log(String),
    /// 상태 표시줄 갱신
    Status(String),
    /// 캡션 진행 표시 (true = 요청 중, 트리거 비활성)
    Busy(bool),
    /// 미리보기 프레임 갱신
    Preview {
        sequence: u64,
        width: u32,
        height: u32,
    },
    /// 캡션 결과 수신
    CaptionReady(CaptionResult),
    /// 미리보기 종료 및 카메라 해제 완료
    CameraStopped,
}
