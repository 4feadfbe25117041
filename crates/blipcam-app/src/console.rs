//! 콘솔 표시 레이어.
//!
//! 표준 입력 한 줄 = 명령 하나. 세션 이벤트(로그/상태/캡션)는 별도
//! 태스크가 받아 출력한다. 미리보기 프레임 이벤트는 출력하지 않는다.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use blipcam_core::models::event::SessionEvent;
use blipcam_session::{CaptureSession, DispatchError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// 콘솔 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Capture,
    Caption,
    Save,
    Clear,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "s" => Ok(Self::Start),
            "stop" | "x" => Ok(Self::Stop),
            "capture" | "p" => Ok(Self::Capture),
            "caption" | "c" => Ok(Self::Caption),
            "save" | "w" => Ok(Self::Save),
            "clear" => Ok(Self::Clear),
            "status" | "?" => Ok(Self::Status),
            "help" | "h" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("알 수 없는 명령: {other}")),
        }
    }
}

const HELP: &str = "\
명령:
  start   (s)  카메라 시작
  stop    (x)  카메라 정지
  capture (p)  현재 프레임 PNG 저장
  caption (c)  현재 프레임 캡션 요청
  save    (w)  캡션 로그 TXT 저장
  clear        캡션 로그 비우기
  status  (?)  세션 상태
  quit    (q)  종료";

/// 콘솔 루프 실행. `quit`, 입력 종료(EOF), Ctrl+C 중 하나로 끝난다.
pub async fn run(session: Arc<CaptureSession>) -> Result<()> {
    let printer = tokio::spawn(print_events(session.subscribe()));

    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C 수신");
                break;
            }
        };

        let Some(line) = line else {
            debug!("표준 입력 종료");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => execute(&session, command).await,
            Err(e) => println!("{e} (help 입력)"),
        }
    }

    session.shutdown().await;
    printer.abort();
    Ok(())
}

async fn execute(session: &Arc<CaptureSession>, command: Command) {
    match command {
        Command::Start => {
            // 실패는 세션이 로그/상태로 보고
            let _ = session.start_preview().await;
        }
        Command::Stop => session.stop_preview().await,
        Command::Capture => {
            let _ = session.capture_still().await;
        }
        Command::Caption => match session.request_caption() {
            // 결과는 CaptionReady 이벤트로 출력
            Ok(_handle) => {}
            Err(DispatchError::Busy) => println!("캡션 요청 진행 중 — 잠시 후 다시 시도"),
            Err(DispatchError::NoFrame) => {}
        },
        Command::Save => {
            let _ = session.save_log();
        }
        Command::Clear => session.clear_log(),
        Command::Status => match serde_json::to_string_pretty(&session.status()) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!("상태 직렬화 실패: {e}"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

async fn print_events(mut rx: broadcast::Receiver<SessionEvent>) {
    loop {
        match rx.recv().await {
            Ok(SessionEvent::Log(line)) => println!("> {line}"),
            Ok(SessionEvent::Status(status)) => println!("[{status}]"),
            Ok(SessionEvent::Busy(true)) => println!("[캡션 요청 중...]"),
            Ok(SessionEvent::Busy(false)) => {}
            Ok(SessionEvent::CaptionReady(result)) => {
                debug!(
                    "캡션 결과: success={}, attempts={}",
                    result.success, result.attempts
                );
            }
            Ok(SessionEvent::Preview { .. }) | Ok(SessionEvent::CameraStopped) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!("이벤트 {skipped}개 건너뜀");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
