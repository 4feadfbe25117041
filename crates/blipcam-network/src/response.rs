//! 캡션 API 응답 파싱.
//!
//! 응답 형태는 고정되어 있지 않다 (`{"generated_text": ...}` 또는
//! `[{"generated_text": ...}]`). 전체 스키마 대신 `generated_text` 문자열
//! 하나만 찾는다. 잘못된 JSON, 닫히지 않은 문자열, 키 부재는 모두 `None`.

use serde_json::Value;

/// 캡션 필드 이름
pub const GENERATED_TEXT_KEY: &str = "generated_text";

/// 응답 본문에서 첫 번째 `generated_text` 문자열 값 추출
///
/// 객체/배열을 깊이 우선으로 탐색한다. 빈 문자열도 캡션 값으로 반환한다.
pub fn extract_generated_text(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;
    find_generated_text(&value).map(|text| text.trim().to_string())
}

fn find_generated_text(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get(GENERATED_TEXT_KEY) {
                return Some(text);
            }
            map.values().find_map(find_generated_text)
        }
        Value::Array(items) => items.iter().find_map(find_generated_text),
        _ => None,
    }
}
