fn main() {
    if let Err(err) = census_wrangler::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
