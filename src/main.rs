fn main() {
    if let Err(e) = listboard::app::run_cli() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
