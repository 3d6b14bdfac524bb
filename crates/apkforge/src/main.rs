use std::process::ExitCode;

fn main() -> ExitCode {
    match apkforge::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
