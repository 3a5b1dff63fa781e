fn main() {
    if let Err(err) = doc_vouch::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
