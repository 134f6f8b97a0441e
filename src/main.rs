use std::process::ExitCode;

fn main() -> ExitCode {
    match gitvendor::cli::run() {
        Ok(code) => code,
        Err(err) => {
            gitvendor::ui::output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
