//! BLIPCAM 핵심 에러 타입.
//!
//! 어댑터 crate(vision, network, session)는 이 타입을 그대로 반환한다.
//! 어떤 에러도 프로세스를 종료시키지 않으며, 세션 레이어에서
//! 활동 로그 + 상태 표시줄 메시지로 변환된다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 카메라 장치 열기 실패 — 사용자가 다시 시작할 때까지 해당 세션에서 종료 상태
    #[error("카메라 장치 사용 불가: {0}")]
    DeviceUnavailable(String),

    /// 단일 폴링 틱의 프레임 읽기 실패 — 해당 프레임만 스킵
    #[error("프레임 읽기 실패: {0}")]
    ReadError(String),

    /// 장치가 열려 있지 않은 상태에서 읽기 시도
    #[error("카메라가 열려 있지 않음")]
    NotOpen,

    /// 이미지 압축 실패 — 해당 캡션 시도 중단
    #[error("이미지 인코딩 실패: {0}")]
    EncodeError(String),

    /// 캡션 API 연결/응답 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// API가 응답했지만 사용할 수 있는 캡션 필드가 없음.
    /// 메시지는 표시 레이어에 그대로 노출되는 센티넬 문자열이다.
    #[error("{}", crate::models::caption::NO_CAPTION_SENTINEL)]
    NoCaptionProduced,

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 세션을 계속 진행할 수 있는 에러인지 여부 (프레임 스킵 등)
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::ReadError(_))
    }
}
