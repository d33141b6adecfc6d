//! Development assistant: test, lint, help, exit

use std::io;

use playlist_cloud::assistants::operations_assistant;
use playlist_cloud::console::Console;

fn main() {
    playlist_cloud::init_logger();

    let mut console = Console::stdio();
    if let Err(e) = operations_assistant().run(io::stdin().lock(), &mut console) {
        log::error!("Reading input failed: {}", e);
    }
    std::process::exit(0);
}
