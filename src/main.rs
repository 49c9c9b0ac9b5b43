use std::process::ExitCode;

fn main() -> ExitCode {
    serialtap_lib::run()
}
