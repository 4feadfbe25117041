//! 웹캠 프레임 소스.
//!
//! nokhwa 기반. 카메라 핸들은 전용 워커 스레드에서 생성/해제되며
//! 요청은 crossbeam 채널로 전달된다. `close` 또는 drop 시
//! 스트림 정지 후 워커를 join하여 장치를 확정적으로 해제한다.

use std::thread::{self, JoinHandle};

use blipcam_core::error::CoreError;
use blipcam_core::models::frame::{Frame, PixelFormat};
use blipcam_core::ports::frame_source::FrameSource;
use crossbeam::channel::{self, Receiver, Sender};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use tracing::{debug, info, warn};

/// 워커 스레드 요청
enum WorkerRequest {
    Read(Sender<Result<Frame, CoreError>>),
    Stop,
}

/// 열린 장치를 소유한 워커
struct Worker {
    device_index: u32,
    requests: Sender<WorkerRequest>,
    handle: JoinHandle<()>,
}

/// nokhwa 웹캠 소스
pub struct NokhwaCamera {
    width: u32,
    height: u32,
    worker: Option<Worker>,
}

impl NokhwaCamera {
    /// 요청 해상도 지정. 장치가 지원하지 않으면 장치 기본 형식으로 연다.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            worker: None,
        }
    }
}

impl FrameSource for NokhwaCamera {
    fn open(&mut self, device_index: u32) -> Result<(), CoreError> {
        if self.worker.is_some() {
            debug!("카메라 이미 열림 — 재오픈 생략");
            return Ok(());
        }

        let (request_tx, request_rx) = channel::unbounded();
        let (ready_tx, ready_rx) = channel::bounded(1);

        let resolution = Resolution::new(self.width, self.height);
        let handle = thread::Builder::new()
            .name(format!("blipcam-camera-{device_index}"))
            .spawn(move || run_worker(device_index, resolution, request_rx, ready_tx))
            .map_err(|e| CoreError::DeviceUnavailable(format!("워커 스레드 생성 실패: {e}")))?;

        let ready = ready_rx.recv().unwrap_or_else(|_| {
            Err(CoreError::DeviceUnavailable(
                "카메라 워커가 초기화 중 종료됨".to_string(),
            ))
        });

        if let Err(e) = ready {
            let _ = handle.join();
            return Err(e);
        }

        info!("카메라 {device_index} 열림");
        self.worker = Some(Worker {
            device_index,
            requests: request_tx,
            handle,
        });
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CoreError> {
        let worker = self.worker.as_ref().ok_or(CoreError::NotOpen)?;

        let (reply_tx, reply_rx) = channel::bounded(1);
        worker
            .requests
            .send(WorkerRequest::Read(reply_tx))
            .map_err(|_| CoreError::ReadError("카메라 워커 종료됨".to_string()))?;

        reply_rx
            .recv()
            .map_err(|_| CoreError::ReadError("카메라 워커 응답 없음".to_string()))?
    }

    fn close(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.requests.send(WorkerRequest::Stop);
            if worker.handle.join().is_err() {
                warn!("카메라 워커 패닉 — 장치 핸들은 스레드 종료와 함께 해제됨");
            }
            info!("카메라 {} 해제", worker.device_index);
        }
    }

    fn is_open(&self) -> bool {
        self.worker.is_some()
    }

    fn name(&self) -> &str {
        "nokhwa"
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.close();
    }
}

/// 워커 루프 — 카메라 핸들은 이 스레드를 벗어나지 않는다
fn run_worker(
    device_index: u32,
    resolution: Resolution,
    requests: Receiver<WorkerRequest>,
    ready: Sender<Result<(), CoreError>>,
) {
    let index = CameraIndex::Index(device_index);
    let opened = Camera::new(index.clone(), requested_format(resolution)).or_else(|e| {
        warn!("카메라 {device_index}: {resolution} 형식 불가 ({e}) — 기본 형식으로 재시도");
        Camera::new(
            index,
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        )
    });

    let mut camera = match opened {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready.send(Err(CoreError::DeviceUnavailable(format!(
                "카메라 {device_index} 열기 실패: {e}"
            ))));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = ready.send(Err(CoreError::DeviceUnavailable(format!(
            "카메라 {device_index} 스트림 시작 실패: {e}"
        ))));
        return;
    }

    debug!("카메라 {device_index} 형식: {}", camera.camera_format());
    let _ = ready.send(Ok(()));

    for request in requests.iter() {
        match request {
            WorkerRequest::Read(reply) => {
                let _ = reply.send(read_rgb_frame(&mut camera));
            }
            WorkerRequest::Stop => break,
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!("카메라 스트림 정지 실패: {e}");
    }
}

/// 설정 해상도를 우선 요청하는 형식
fn requested_format(resolution: Resolution) -> RequestedFormat<'static> {
    RequestedFormat::new::<RgbFormat>(RequestedFormatType::HighestResolution(resolution))
}

fn read_rgb_frame(camera: &mut Camera) -> Result<Frame, CoreError> {
    let buffer = camera
        .frame()
        .map_err(|e| CoreError::ReadError(format!("프레임 수신 실패: {e}")))?;

    let decoded = buffer
        .decode_image::<RgbFormat>()
        .map_err(|e| CoreError::ReadError(format!("프레임 디코딩 실패: {e}")))?;

    let (w, h) = (decoded.width(), decoded.height());
    Frame::new(w, h, PixelFormat::Rgb8, decoded.into_raw())
}
