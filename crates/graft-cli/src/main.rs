#![forbid(unsafe_code)]

fn main() -> std::process::ExitCode {
    graft_cli::main_entry()
}
