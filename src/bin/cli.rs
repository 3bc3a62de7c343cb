use std::io::{self};
use std::process::ExitCode;
use zugzwang::moves::magic::loader::load_magic_tables;
use zugzwang::uci::run_command_loop;

fn main() -> ExitCode {
    #[cfg(feature = "cli")]
    zugzwang::logger::init_logging("logs/zugzwang.log", "info");

    let magic_tables = load_magic_tables();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    // Malformed FEN or a well-formed-but-illegal move: the protocol layer
    // isn't designed to recover from either, so report and abort rather
    // than silently keeping stale board state.
    match run_command_loop(stdin.lock(), &mut stdout, &magic_tables) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
