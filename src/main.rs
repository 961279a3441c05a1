mod cli;

use pipio_studio::core::terminal;

#[tokio::main]
async fn main() {
    match cli::run_main().await {
        Ok(()) => {}
        Err(e) if cli::is_cancellation(&e) => terminal::print_goodbye(),
        Err(e) => {
            cli::report_error(&e);
            std::process::exit(1);
        }
    }
}
