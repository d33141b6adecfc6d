//! One-shot health audit of the hosted backend

use playlist_cloud::audit::HealthAuditor;
use playlist_cloud::config::BackendConfig;
use playlist_cloud::console::Console;

fn main() {
    playlist_cloud::init_logger();

    let config = BackendConfig::resolve();
    log::debug!("Auditing {} (key from {:?})", config.url, config.key_source);

    let report = HealthAuditor::new(&config).run(&mut Console::stdio());
    log::info!("{} endpoint(s) checked, all healthy: {}", report.results.len(), report.all_healthy());
}
