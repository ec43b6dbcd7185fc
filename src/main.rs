fn main() {
    if let Err(err) = customer_cleaner::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
