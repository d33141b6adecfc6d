//! Background agent: deploy, git-status, check-health, setup-env, migration-plan

use std::io;

use playlist_cloud::assistants::deployment_assistant;
use playlist_cloud::console::Console;

fn main() {
    playlist_cloud::init_logger();

    let mut console = Console::stdio();
    if let Err(e) = deployment_assistant().run(io::stdin().lock(), &mut console) {
        log::error!("Reading input failed: {}", e);
    }
}
