use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use notify::{Event, RecommendedWatcher, RecursiveMode, Result as NotifyResult, Watcher};
use crate::settings::{Result, SettingsError};
use tracing::{debug, error};

/// 설정 파일 변경 이벤트 타입
#[derive(Debug, PartialEq, Clone)]
pub enum ConfigEvent {
    /// 파일이 수정됨
    Modified(PathBuf),
    /// 파일이 생성됨
    Created(PathBuf),
    /// 파일이 삭제됨
    Deleted(PathBuf),
}

/// 라우트 파일 감시자
///
/// 편집기가 파일을 교체(rename)하는 경우에도 이벤트를 받기 위해 파일이 속한
/// 디렉토리를 감시하고, 대상 파일에 대한 이벤트만 전달합니다.
pub struct ConfigWatcher {
    /// 감시할 파일 경로
    path: PathBuf,
    event_tx: mpsc::Sender<ConfigEvent>,
    event_rx: mpsc::Receiver<ConfigEvent>,
    watcher: Option<RecommendedWatcher>,
}

impl ConfigWatcher {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let (event_tx, event_rx) = mpsc::channel(32);
        Self {
            path: path.into(),
            event_tx,
            event_rx,
            watcher: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 테스트용 이벤트 송신자 반환
    #[cfg(test)]
    pub fn get_sender(&self) -> mpsc::Sender<ConfigEvent> {
        self.event_tx.clone()
    }

    /// 감시 시작
    pub fn start(&mut self) -> Result<()> {
        let event_tx = self.event_tx.clone();
        let target = self.path.file_name().map(|name| name.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: NotifyResult<Event>| {
            match res {
                Ok(event) => {
                    use notify::EventKind::*;

                    for path in event.paths {
                        if path.file_name().map(|name| name.to_os_string()) != target {
                            continue;
                        }
                        let config_event = match event.kind {
                            Modify(_) => ConfigEvent::Modified(path),
                            Create(_) => ConfigEvent::Created(path),
                            Remove(_) => ConfigEvent::Deleted(path),
                            _ => continue,
                        };
                        debug!(event = ?config_event, "라우트 파일 변경 감지");
                        let _ = event_tx.blocking_send(config_event);
                    }
                }
                Err(e) => error!("감시 오류: {}", e),
            }
        }).map_err(|e| SettingsError::WatchError(e.to_string()))?;

        let directory = self.path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        debug!("경로 감시 시작: {}", directory.display());
        watcher.watch(directory, RecursiveMode::NonRecursive)
            .map_err(|e| SettingsError::WatchError(e.to_string()))?;

        self.watcher = Some(watcher);
        Ok(())
    }

    /// 이벤트 수신 대기
    pub async fn watch(&mut self) -> Option<ConfigEvent> {
        self.event_rx.recv().await
    }
}
