use std::process::ExitCode;

use tracing::{error, info};
use vhost_gate::logging::init_logging;
use vhost_gate::server::ServerManager;
use vhost_gate::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = init_logging(&settings.logging);
    info!(version = env!("CARGO_PKG_VERSION"), "vhost_gate 시작");

    let manager = match ServerManager::new(settings) {
        Ok(manager) => manager,
        Err(e) => {
            error!(error = %e, "서버 초기화 실패");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = manager.run().await {
        error!(error = %e, "서버 실행 실패");
        return ExitCode::FAILURE;
    }

    info!("vhost_gate 종료");
    ExitCode::SUCCESS
}
