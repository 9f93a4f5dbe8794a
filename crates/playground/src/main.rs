use std::env;
use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    match app::bootstrap::build_app(&args) {
        Ok(Some(wiring)) => app::loop_runner::run(wiring),
        Ok(None) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{}", app::bootstrap::usage_text());
            ExitCode::from(2)
        }
    }
}
