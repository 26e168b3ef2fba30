fn main() {
    if let Err(e) = graphjit_drv::run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
