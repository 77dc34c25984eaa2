use std::process::ExitCode;

fn main() -> ExitCode {
    match conductord::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("conductord: {error}");
            ExitCode::FAILURE
        }
    }
}
