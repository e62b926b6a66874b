use std::process::ExitCode;

fn main() -> ExitCode {
    tabd::lib_main()
}
